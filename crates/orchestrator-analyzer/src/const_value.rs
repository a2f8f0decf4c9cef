//! Materializing runtime values for expressions that are constant only by
//! structure: container literals of constants, subscripts of constant
//! bases and `Array()`/`Dictionary()` conversions.

use orchestrator_core::{
    Array, ContainerType, DataType, Dictionary, ExprId, Kind, ScriptRef, Variant, VariantType, VariableId,
};
use orchestrator_parser::{ExprKind, SubscriptIndex};

use crate::context::Analyzer;

/// Element type stored on a typed container value.
fn container_type_of(data_type: &DataType) -> ContainerType {
    if data_type.builtin_type != VariantType::Object {
        return ContainerType::builtin(data_type.builtin_type);
    }
    let script = match (&data_type.kind, &data_type.class_type) {
        (Kind::Class, Some(class)) => Some(ScriptRef {
            path: class.fqcn.clone(),
            foreign: data_type.script_type.clone(),
        }),
        (Kind::Script, _) => Some(ScriptRef {
            path: data_type.script_path.clone(),
            foreign: data_type.script_type.clone(),
        }),
        _ => None,
    };
    ContainerType {
        builtin: VariantType::Object,
        class_name: data_type.native_type.clone(),
        script,
    }
}

fn typed_array(element: &DataType) -> Array {
    let mut array = Array::new();
    array.set_typed(container_type_of(element));
    array
}

fn typed_dictionary(key: &DataType, value: &DataType) -> Dictionary {
    Dictionary {
        key_type: Some(container_type_of(key)),
        value_type: Some(container_type_of(value)),
        ..Default::default()
    }
}

impl Analyzer<'_> {
    /// The value `expr` evaluates to, when one can be computed without
    /// running the script.
    pub(crate) fn make_expression_reduced_value(&mut self, expr: ExprId) -> Option<Variant> {
        let node = &self.tree()[expr];
        if node.is_constant {
            return Some(node.reduced_value.clone());
        }

        match node.kind.clone() {
            ExprKind::Array(elements) => {
                let data_type = node.data_type.clone();
                let mut array = match data_type.get_container_element_type(0) {
                    Some(element) => typed_array(element),
                    None => Array::new(),
                };
                for element in elements {
                    array.push(self.make_expression_reduced_value(element)?);
                }
                Some(Variant::Array(array).into_read_only())
            }
            ExprKind::Dictionary(pairs) => {
                let data_type = node.data_type.clone();
                let mut dictionary = if data_type.has_container_element_types() {
                    typed_dictionary(
                        &data_type.get_container_element_type_or_variant(0),
                        &data_type.get_container_element_type_or_variant(1),
                    )
                } else {
                    Dictionary::new()
                };
                for (key, value) in pairs {
                    let key = self.make_expression_reduced_value(key)?;
                    let value = self.make_expression_reduced_value(value)?;
                    dictionary.insert(key, value);
                }
                Some(Variant::Dictionary(dictionary).into_read_only())
            }
            ExprKind::Subscript { base, index } => {
                let base_value = self.make_expression_reduced_value(base)?;
                match index {
                    SubscriptIndex::Attribute(attribute) => {
                        let name = self.tree().identifier_name(attribute).to_string();
                        self.host.values.get_named(&base_value, &name)
                    }
                    SubscriptIndex::Index(index) => {
                        let index_value = self.make_expression_reduced_value(index)?;
                        self.host.values.get_indexed(&base_value, &index_value)
                    }
                }
            }
            ExprKind::Call {
                callee: Some(callee),
                arguments,
                function_name,
                ..
            } if self.tree().identifier(callee).is_some() => {
                let ty = match function_name.as_str() {
                    "Array" => VariantType::Array,
                    "Dictionary" => VariantType::Dictionary,
                    _ => return None,
                };
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.make_expression_reduced_value(argument)?);
                }
                match self.host.values.construct(ty, &args) {
                    Ok(value) => Some(value.into_read_only()),
                    Err(error) => {
                        tracing::debug!(?error, "constant container construction failed");
                        self.push_error(format!(r#"Failed to construct "{}"."#, ty.name()), expr);
                        None
                    }
                }
            }
            _ => None,
        }
    }

    /// Value a fresh instance holds in `variable` before any code runs.
    pub(crate) fn make_variable_default_value(&mut self, variable: VariableId) -> Variant {
        let decl = &self.tree()[variable].decl;
        if let Some(initializer) = decl.initializer {
            return self.make_expression_reduced_value(initializer).unwrap_or_default();
        }

        let data_type = decl.data_type.clone();
        if !data_type.is_hard_type() {
            return Variant::Nil;
        }
        match data_type.kind {
            Kind::Builtin if data_type.builtin_type == VariantType::Array && data_type.has_container_element_type(0) => {
                Variant::Array(typed_array(&data_type.get_container_element_type_or_variant(0)))
            }
            Kind::Builtin
                if data_type.builtin_type == VariantType::Dictionary && data_type.has_container_element_types() =>
            {
                Variant::Dictionary(typed_dictionary(
                    &data_type.get_container_element_type_or_variant(0),
                    &data_type.get_container_element_type_or_variant(1),
                ))
            }
            Kind::Builtin if data_type.builtin_type != VariantType::Object => {
                self.host.values.default_value(data_type.builtin_type)
            }
            Kind::Enum => Variant::Int(0),
            _ => Variant::Nil,
        }
    }
}
