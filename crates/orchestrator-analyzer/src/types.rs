//! Constructors for the data types analysis produces.
//!
//! Enum types use `native_type` to name their owner (`Owner.Enum`), which
//! disambiguates equally named enums of base and outer classes.

use std::sync::Arc;

use orchestrator_core::{
    ClassHandle, ClassRef, DataType, ForeignScript, Kind, MethodInfo, TypeSource, VariantType,
};
use orchestrator_parser::Tree;
use orchestrator_registry::{ClassDb, ValueModel};

use crate::context::Analyzer;

pub(crate) const ENUM_SEPARATOR: &str = ".";
pub(crate) const UNNAMED_ENUM: &str = "<anonymous enum>";

pub fn make_callable_type(info: MethodInfo) -> DataType {
    DataType {
        is_constant: true,
        method_info: info,
        ..DataType::builtin(VariantType::Callable, TypeSource::AnnotatedExplicit)
    }
}

pub fn make_signal_type(info: MethodInfo) -> DataType {
    DataType {
        is_constant: true,
        method_info: info,
        ..DataType::builtin(VariantType::Signal, TypeSource::AnnotatedExplicit)
    }
}

pub fn make_native_meta_type(class_name: &str) -> DataType {
    DataType {
        is_constant: true,
        is_meta_type: true,
        ..DataType::native(class_name, TypeSource::AnnotatedExplicit)
    }
}

pub fn make_script_meta_type(script: Arc<ForeignScript>) -> DataType {
    DataType {
        kind: Kind::Script,
        type_source: TypeSource::AnnotatedExplicit,
        builtin_type: VariantType::Object,
        native_type: script.native_base.clone(),
        script_path: script.path.clone(),
        script_type: Some(script),
        is_constant: true,
        is_meta_type: true,
        ..Default::default()
    }
}

pub fn make_builtin_meta_type(ty: VariantType) -> DataType {
    DataType {
        is_constant: true,
        is_meta_type: true,
        ..DataType::builtin(ty, TypeSource::AnnotatedExplicit)
    }
}

pub fn make_enum_type(enum_name: &str, base_name: &str, meta: bool) -> DataType {
    let native_type = if base_name.is_empty() {
        enum_name.to_string()
    } else {
        format!("{base_name}{ENUM_SEPARATOR}{enum_name}")
    };
    DataType {
        kind: Kind::Enum,
        type_source: TypeSource::AnnotatedExplicit,
        builtin_type: if meta { VariantType::Dictionary } else { VariantType::Int },
        enum_type: enum_name.to_string(),
        native_type,
        is_constant: true,
        is_meta_type: meta,
        ..Default::default()
    }
}

pub fn make_class_enum_type(enum_name: &str, class: ClassHandle, script_path: &str, meta: bool) -> DataType {
    DataType {
        class_type: Some(class.clone()),
        script_path: script_path.to_string(),
        ..make_enum_type(enum_name, &class.fqcn, meta)
    }
}

/// An enum of a native class, named after the class that declares it.
pub fn make_native_enum_type(classes: &dyn ClassDb, enum_name: &str, native_class: &str, meta: bool) -> DataType {
    let declaring = classes
        .ancestry(native_class)
        .into_iter()
        .find(|class| class.enums.contains_key(enum_name));
    let owner = declaring.map_or(native_class, |class| class.name.as_str());

    let mut ty = make_enum_type(enum_name, owner, meta);
    if meta {
        ty.builtin_type = VariantType::Nil;
        ty.is_pseudo_type = true;
    }
    if let Some(values) = declaring.and_then(|class| class.enums.get(enum_name)) {
        ty.enum_values = values.clone();
    }
    ty
}

pub fn make_builtin_enum_type(values: &dyn ValueModel, enum_name: &str, owner: VariantType, meta: bool) -> DataType {
    let mut ty = make_enum_type(enum_name, owner.name(), meta);
    if meta {
        ty.builtin_type = VariantType::Nil;
        ty.is_pseudo_type = true;
    }
    if let Some(enum_values) = values.enum_values(owner, enum_name) {
        ty.enum_values = enum_values.clone();
    }
    ty
}

pub fn make_global_enum_type(classes: &dyn ClassDb, enum_name: &str, base: &str, meta: bool) -> DataType {
    let mut ty = make_enum_type(enum_name, base, meta);
    if meta {
        ty.builtin_type = VariantType::Nil;
        ty.is_pseudo_type = true;
    }
    if let Some(values) = classes.global_enum(&ty.native_type) {
        ty.enum_values = values.clone();
    }
    ty
}

/// The instance type described by a meta type.
pub fn type_from_metatype(meta: &DataType) -> DataType {
    let mut result = meta.clone();
    result.is_meta_type = false;
    result.is_pseudo_type = false;
    if meta.kind == Kind::Enum {
        result.builtin_type = VariantType::Int;
    } else {
        result.is_constant = false;
    }
    result
}

pub fn enum_has_value(ty: &DataType, value: i64) -> bool {
    ty.enum_values.values().any(|v| *v == value)
}

impl Analyzer<'_> {
    pub(crate) fn class_handle(&self, class: ClassRef) -> ClassHandle {
        let node = self.pool.class(class);
        let global_name = if class.id == Tree::HEAD {
            self.pool.tree(class.parser).global_name().to_string()
        } else {
            String::new()
        };
        ClassHandle {
            id: class,
            fqcn: node.fqcn.clone(),
            identifier: node.identifier.as_ref().map(|ident| ident.name.clone()),
            global_name,
        }
    }

    /// The meta type stamped on a class once its base is known.
    pub(crate) fn make_class_meta_type(&self, class: ClassRef, native_base: &str) -> DataType {
        DataType {
            kind: Kind::Class,
            type_source: TypeSource::AnnotatedExplicit,
            builtin_type: VariantType::Object,
            native_type: native_base.to_string(),
            script_path: self.pool[class.parser].path.clone(),
            class_type: Some(self.class_handle(class)),
            is_constant: true,
            is_meta_type: true,
            ..Default::default()
        }
    }

    /// The type of `self` inside the current class.
    pub(crate) fn current_class_instance_type(&self) -> DataType {
        let class = self.current_class_ref();
        let mut ty = self.class_node(class).data_type.clone();
        if !ty.is_set() {
            ty = self.make_class_meta_type(class, "");
        }
        ty.is_meta_type = false;
        ty.is_constant = false;
        ty
    }
}
