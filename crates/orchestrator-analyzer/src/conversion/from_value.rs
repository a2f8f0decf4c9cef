//! Data types of constant values and reflected properties.

use orchestrator_core::{
    ContainerType, DataType, Kind, NATIVE_CLASS_META, NodeId, ObjectRef, PropertyHint, PropertyInfo,
    PropertyUsage, ScriptRef, TypeSource, Variant, VariantType,
};
use orchestrator_parser::{ParserStatus, Tree};
use orchestrator_registry::CachedScript;

use crate::context::Analyzer;
use crate::types::{
    make_builtin_meta_type, make_enum_type, make_global_enum_type, make_native_meta_type, make_script_meta_type,
    type_from_metatype, ENUM_SEPARATOR,
};

impl Analyzer<'_> {
    /// The type of a constant value. Constants are always hard typed.
    pub(crate) fn type_from_variant(&mut self, value: &Variant, source: NodeId) -> DataType {
        let mut result = DataType {
            is_constant: true,
            ..DataType::builtin(value.get_type(), TypeSource::AnnotatedExplicit)
        };

        match value {
            Variant::Array(array) => {
                if let Some(element) = &array.element_type {
                    if let Some(ty) = self.type_from_container(element, source) {
                        result.set_container_element_type(0, ty);
                    }
                }
            }
            Variant::Dictionary(dict) => {
                if let Some(key) = &dict.key_type {
                    if let Some(ty) = self.type_from_container(key, source) {
                        result.set_container_element_type(0, ty);
                    }
                }
                if let Some(value) = &dict.value_type {
                    if let Some(ty) = self.type_from_container(value, source) {
                        result.set_container_element_type(1, ty);
                    }
                }
            }
            Variant::Object(None) => return DataType::default(),
            Variant::Object(Some(object)) => {
                result.kind = Kind::Native;
                result.native_type = object.class_name().to_string();
                match object {
                    ObjectRef::Script(script) => {
                        let mut ty = self.type_from_script_ref(script, source);
                        if ty.kind == Kind::Variant {
                            return ty;
                        }
                        ty.is_constant = true;
                        ty.is_meta_type = true;
                        ty.type_source = TypeSource::AnnotatedExplicit;
                        return ty;
                    }
                    ObjectRef::Resource { .. } | ObjectRef::Instance { .. } => {
                        result.is_meta_type = result.native_type == NATIVE_CLASS_META;
                    }
                }
            }
            _ => {}
        }

        result
    }

    /// Instance type of a typed container's element.
    fn type_from_container(&mut self, container: &ContainerType, source: NodeId) -> Option<DataType> {
        if let Some(script) = &container.script {
            let mut meta = self.type_from_script_ref(script, source);
            meta.is_meta_type = true;
            return Some(type_from_metatype(&meta));
        }
        if !container.class_name.is_empty() {
            return Some(type_from_metatype(&make_native_meta_type(&container.class_name)));
        }
        if container.builtin != VariantType::Nil {
            return Some(type_from_metatype(&make_builtin_meta_type(container.builtin)));
        }
        None
    }

    /// Instance type of the class a script resource defines.
    fn type_from_script_ref(&mut self, script: &ScriptRef, source: NodeId) -> DataType {
        if let Some(foreign) = script.foreign.as_ref().filter(|foreign| !foreign.is_orchestration) {
            return DataType {
                is_meta_type: false,
                is_constant: false,
                ..make_script_meta_type(foreign.clone())
            };
        }

        // Inner classes are addressed by fqcn, `path::Outer::Inner`.
        let path = script.path.split("::").next().unwrap_or(&script.path);
        let parser = if path == self.script().path {
            Some(self.parser)
        } else {
            self.depended_parser_for(path)
        };
        let Some(parser) = parser else {
            self.push_error(format!(r#"Could not find script "{}"."#, script.path), source);
            return DataType {
                kind: Kind::Variant,
                ..Default::default()
            };
        };

        let mut found = None;
        if parser == self.parser || self.raise_status(parser, ParserStatus::InheritanceSolved) {
            if let Some(class) = self.pool[parser].find_class(&script.path) {
                let class = orchestrator_core::ClassRef::new(parser, class);
                if self.resolve_class_inheritance(class, Some(source)).is_ok() {
                    found = Some(class);
                }
            }
        }
        let Some(class) = found else {
            self.push_error(format!(r#"Could not resolve script "{}"."#, script.path), source);
            return DataType {
                kind: Kind::Variant,
                ..Default::default()
            };
        };

        let native_type = self.pool.class(class).data_type.native_type.clone();
        DataType {
            kind: Kind::Class,
            type_source: TypeSource::AnnotatedExplicit,
            builtin_type: VariantType::Object,
            native_type,
            class_type: Some(self.class_handle(class)),
            script_path: self.pool[parser].path.clone(),
            script_type: script.foreign.clone(),
            ..Default::default()
        }
    }

    /// The type described by a reflected property, argument or return value.
    pub(crate) fn type_from_property(&self, property: &PropertyInfo, is_arg: bool, is_read_only: bool) -> DataType {
        let mut result = DataType {
            is_read_only,
            type_source: TypeSource::AnnotatedExplicit,
            ..Default::default()
        };

        if property.ty == VariantType::Nil && (is_arg || property.usage.contains(PropertyUsage::NIL_IS_VARIANT)) {
            result.kind = Kind::Variant;
            return result;
        }

        result.builtin_type = property.ty;

        if property.ty == VariantType::Object {
            if let Some(global) = self.host.project.global_class(&property.class_name) {
                result.kind = Kind::Script;
                result.script_path = global.path.clone();
                result.native_type = global.base.clone();
                result.script_type = self.host.scripts.shallow_script(&global.path).ok();
            } else {
                result.kind = Kind::Native;
                result.native_type = if property.class_name.is_empty() {
                    "Object".to_string()
                } else {
                    property.class_name.clone()
                };
            }
            return result;
        }

        result.kind = Kind::Builtin;
        if property.ty == VariantType::Array && property.hint == PropertyHint::ArrayType {
            if let Some(element) = self.type_from_hint_name(&property.hint_string) {
                result.set_container_element_type(0, element);
            }
        } else if property.ty == VariantType::Dictionary && property.hint == PropertyHint::DictionaryType {
            let mut names = property.hint_string.splitn(2, ';');
            let key = names.next().and_then(|name| self.type_from_hint_name(name));
            let value = names.next().and_then(|name| self.type_from_hint_name(name));
            if let (Some(key), Some(value)) = (key, value) {
                result.set_container_element_type(0, key);
                result.set_container_element_type(1, value);
            }
        } else if property.ty == VariantType::Int
            && property.usage.contains(PropertyUsage::CLASS_IS_ENUM)
            && !property.class_name.is_empty()
        {
            if self.host.classes.global_enum(&property.class_name).is_some() {
                result = make_global_enum_type(&*self.host.classes, &property.class_name, "", false);
                result.is_constant = false;
                result.is_read_only = is_read_only;
            } else if let Some((owner, name)) = property.class_name.split_once(ENUM_SEPARATOR) {
                result = make_enum_type(name, owner, false);
                result.is_constant = false;
                result.is_read_only = is_read_only;
            }
        }
        result
    }

    /// Element type named in a container type hint.
    fn type_from_hint_name(&self, name: &str) -> Option<DataType> {
        let mut element = DataType {
            type_source: TypeSource::AnnotatedExplicit,
            ..Default::default()
        };
        if let Some(ty) = VariantType::from_name(name) {
            element.kind = Kind::Builtin;
            element.builtin_type = ty;
        } else if self.host.classes.class_exists(name) {
            element.kind = Kind::Native;
            element.builtin_type = VariantType::Object;
            element.native_type = name.to_string();
        } else if let Some(global) = self.host.project.global_class(name) {
            element.kind = Kind::Script;
            element.builtin_type = VariantType::Object;
            element.native_type = global.base.clone();
            element.script_path = global.path.clone();
            element.script_type = self.host.scripts.shallow_script(&global.path).ok();
        } else {
            tracing::debug!(name, "unknown container element type in hint");
            return None;
        }
        Some(element)
    }

    /// Meta type of the script at `path`: the head class of an orchestration
    /// or the reflected interface of any other script.
    pub(crate) fn script_meta_type_for_path(&mut self, path: &str, display_name: &str, source: NodeId) -> DataType {
        let unresolved = || DataType {
            kind: Kind::Variant,
            type_source: TypeSource::Undetected,
            ..Default::default()
        };

        let is_source = self.pool.find(path).is_some()
            || matches!(self.host.scripts.load(path), Ok(CachedScript::Source(_)));
        if !is_source {
            return match self.host.scripts.shallow_script(path) {
                Ok(script) => make_script_meta_type(script),
                Err(_) => {
                    self.push_error(format!(r#"Could not find script for class "{display_name}"."#), source);
                    unresolved()
                }
            };
        }

        let Some(parser) = self.depended_parser_for(path) else {
            self.push_error(format!(r#"Could not find script for class "{display_name}"."#), source);
            return unresolved();
        };
        if !self.raise_status(parser, ParserStatus::InheritanceSolved) {
            self.push_error(
                format!(r#"Could not resolve class "{display_name}", because of a parser error."#),
                source,
            );
            return unresolved();
        }

        let head = orchestrator_core::ClassRef::new(parser, Tree::HEAD);
        let ty = self.pool.class(head).data_type.clone();
        if ty.is_set() {
            ty
        } else {
            // Still resolving further up the stack.
            self.make_class_meta_type(head, "")
        }
    }

    /// Meta type of a registered global class.
    pub(crate) fn make_global_class_meta_type(&mut self, class_name: &str, source: NodeId) -> DataType {
        let Some(path) = self.host.project.global_class(class_name).map(|class| class.path.clone()) else {
            self.push_error(format!(r#"Could not find script for class "{class_name}"."#), source);
            return DataType::undetected_variant();
        };
        self.script_meta_type_for_path(&path, class_name, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use orchestrator_core::{Array, Dictionary};
    use orchestrator_parser::{ScriptPool, TreeBuilder};
    use orchestrator_registry::Host;

    fn with_analyzer(f: impl FnOnce(&mut Analyzer<'_>)) {
        let mut pool = ScriptPool::new();
        let id = pool.insert(TreeBuilder::new("res://a.os").build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);
        f(&mut analyzer);
    }

    const NODE: NodeId = NodeId::Class(Tree::HEAD);

    #[test]
    fn scalar_values() {
        with_analyzer(|a| {
            let ty = a.type_from_variant(&Variant::Int(3), NODE);
            assert!(ty.is_builtin(VariantType::Int));
            assert!(ty.is_constant);
            assert!(ty.is_hard_type());
        });
    }

    #[test]
    fn typed_containers() {
        with_analyzer(|a| {
            let mut array = Array::new();
            array.set_typed(ContainerType::builtin(VariantType::String));
            let ty = a.type_from_variant(&Variant::Array(array), NODE);
            assert_eq!(ty.to_string(), "Array[String]");

            let mut dict = Dictionary::new();
            dict.value_type = Some(ContainerType::builtin(VariantType::Int));
            let ty = a.type_from_variant(&Variant::Dictionary(dict), NODE);
            assert_eq!(ty.to_string(), "Dictionary[Variant, int]");
        });
    }

    #[test]
    fn resources_are_native_instances() {
        with_analyzer(|a| {
            let value = Variant::Object(Some(ObjectRef::Resource {
                path: "res://icon.png".into(),
                class_name: "Texture2D".into(),
            }));
            let ty = a.type_from_variant(&value, NODE);
            assert_eq!(ty.kind, Kind::Native);
            assert_eq!(ty.native_type, "Texture2D");
            assert!(!ty.is_meta_type);
        });
    }

    #[test]
    fn properties() {
        with_analyzer(|a| {
            let ty = a.type_from_property(&PropertyInfo::variant("v"), false, false);
            assert_eq!(ty.kind, Kind::Variant);

            let ty = a.type_from_property(&PropertyInfo::object("n", ""), false, false);
            assert_eq!(ty.native_type, "Object");

            let typed = PropertyInfo::new(VariantType::Array, "a").with_hint(PropertyHint::ArrayType, "Node");
            let ty = a.type_from_property(&typed, false, true);
            assert_eq!(ty.to_string(), "Array[Node]");
            assert!(ty.is_read_only);

            let mode = PropertyInfo::enumeration("m", "Node.ProcessMode");
            let ty = a.type_from_property(&mode, false, false);
            assert_eq!(ty.kind, Kind::Enum);
            assert_eq!(ty.native_type, "Node.ProcessMode");

            let error = PropertyInfo::enumeration("e", "Error");
            let ty = a.type_from_property(&error, false, false);
            assert_eq!(ty.native_type, "Error");
            assert!(ty.enum_values.contains_key("OK"));
        });
    }

    #[test]
    fn unknown_global_class() {
        with_analyzer(|a| {
            let ty = a.make_global_class_meta_type("Missing", NODE);
            assert!(ty.is_variant());
            assert_eq!(a.error_count(), 1);
        });
    }
}
