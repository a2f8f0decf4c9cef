//! Retyping constants and container literals to the type that receives them.

use orchestrator_core::{DataType, ExprId, Kind, VariantType, WarningCode};
use orchestrator_parser::ExprKind;

use crate::context::Analyzer;
use crate::types::enum_has_value;

impl Analyzer<'_> {
    /// Convert a constant expression to the builtin or enum type `target`.
    ///
    /// `usage` names the operation in diagnostics (`assign`, `pass`,
    /// `return`, `include`, `cast`).
    pub(crate) fn update_const_expression_builtin_type(
        &mut self,
        expr: ExprId,
        target: &DataType,
        usage: &str,
        is_cast: bool,
    ) {
        let expression_type = self.tree()[expr].data_type.clone();
        if expression_type == *target || !matches!(target.kind, Kind::Builtin | Kind::Enum) {
            return;
        }

        let is_enum_cast = is_cast
            && target.kind == Kind::Enum
            && !target.is_meta_type
            && expression_type.builtin_type == VariantType::Int;
        if !is_enum_cast && !self.is_type_compatible(target, &expression_type, true, Some(expr.into())) {
            self.push_error(
                format!(r#"Cannot {usage} a value of type "{expression_type}" as "{target}"."#),
                expr,
            );
            return;
        }

        let value = self.tree()[expr].reduced_value.clone();
        let value_type = self.type_from_variant(&value, expr.into());
        if expression_type.is_variant()
            && !is_enum_cast
            && !self.is_type_compatible(target, &value_type, true, Some(expr.into()))
        {
            self.push_error(format!(r#"Cannot {usage} a value of type "{value_type}" as "{target}"."#), expr);
            return;
        }

        if target.kind == Kind::Enum {
            if let Some(number) = value.as_int() {
                if !enum_has_value(target, number) {
                    let shown_value = value.to_string();
                    let shown_enum = target.to_string();
                    self.push_warning(expr, WarningCode::IntAsEnumWithoutMatch, &[usage, &shown_value, &shown_enum]);
                }
            }
        }

        if value_type.builtin_type == target.builtin_type {
            self.set_expression_type(expr, target.clone());
            return;
        }

        let converted = match self.host.values.construct(target.builtin_type, std::slice::from_ref(&value)) {
            Ok(converted) => converted,
            Err(_) => {
                self.push_error(
                    format!(r#"Failed to convert a value of type "{value_type}" to "{target}"."#),
                    expr,
                );
                return;
            }
        };

        if target.builtin_type == VariantType::Int
            && value_type.builtin_type == VariantType::Float
        {
            self.push_warning(expr, WarningCode::NarrowingConversion, &[]);
        }

        self.tree_mut()[expr].reduced_value = converted;
        self.set_expression_type(expr, target.clone());
    }

    /// Type an array literal as `Array[element]`, checking each element.
    pub(crate) fn update_array_literal_element_type(&mut self, array: ExprId, element: &DataType) {
        let ExprKind::Array(elements) = self.tree()[array].kind.clone() else {
            return;
        };
        // Nested container types are not tracked.
        let mut expected = element.clone();
        expected.clear_container_element_types();

        for element_node in elements {
            if let Err(reported) = self.check_literal_entry(array, element_node, &expected) {
                if reported {
                    return;
                }
                self.push_error(
                    format!(
                        r#"Cannot have an element of type "{}" in an array of type "Array[{expected}]"."#,
                        self.tree()[element_node].data_type
                    ),
                    element_node,
                );
                return;
            }
        }

        self.tree_mut()[array].data_type.set_container_element_type(0, expected);
    }

    /// Type a dictionary literal as `Dictionary[key, value]`.
    pub(crate) fn update_dictionary_literal_element_type(&mut self, dictionary: ExprId, key: &DataType, value: &DataType) {
        let ExprKind::Dictionary(pairs) = self.tree()[dictionary].kind.clone() else {
            return;
        };
        let mut expected_key = key.clone();
        expected_key.clear_container_element_types();
        let mut expected_value = value.clone();
        expected_value.clear_container_element_types();

        for (key_node, value_node) in pairs {
            for (node, expected, what) in [(key_node, &expected_key, "key"), (value_node, &expected_value, "value")] {
                if let Err(reported) = self.check_literal_entry(dictionary, node, expected) {
                    if reported {
                        return;
                    }
                    self.push_error(
                        format!(
                            r#"Cannot have a {what} of type "{}" in a dictionary of type "Dictionary[{expected_key}, {expected_value}]"."#,
                            self.tree()[node].data_type
                        ),
                        node,
                    );
                    return;
                }
            }
        }

        let data_type = &mut self.tree_mut()[dictionary].data_type;
        data_type.clear_container_element_types();
        data_type.set_container_element_type(0, expected_key);
        data_type.set_container_element_type(1, expected_value);
    }

    /// Check one literal entry against its expected type. Weak entries are
    /// marked unsafe. A definite mismatch is `Err`, carrying whether the
    /// entry was already reported while retyping a constant.
    fn check_literal_entry(&mut self, container: ExprId, entry: ExprId, expected: &DataType) -> Result<(), bool> {
        if self.tree()[entry].is_constant {
            let errors_before = self.error_count();
            self.update_const_expression_builtin_type(entry, expected, "include", false);
            if self.error_count() > errors_before {
                return Err(true);
            }
        }
        let entry_type = self.tree()[entry].data_type.clone();
        if entry_type.has_no_type() || entry_type.is_variant() || !entry_type.is_hard_type() {
            self.mark_unsafe(entry);
            return Ok(());
        }
        if self.is_type_compatible(expected, &entry_type, true, Some(container.into())) {
            return Ok(());
        }
        if self.check_type_compatibility(&entry_type, expected, false) {
            // A supertype may hold the right value at runtime.
            self.mark_unsafe(entry);
            return Ok(());
        }
        Err(false)
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_core::{Variant, VariantType, WarningCode};
    use orchestrator_parser::{FuncDecl, ScriptParser, ScriptPool, TreeBuilder, VarDecl};
    use orchestrator_registry::Host;

    use crate::config::AnalyzerConfig;
    use crate::context::Analyzer;

    fn analyze(b: TreeBuilder) -> ScriptParser {
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let _ = Analyzer::new(&mut pool, &host, &config, id).analyze();
        pool[id].clone()
    }

    fn errors(script: &ScriptParser) -> Vec<&str> {
        script.errors.iter().map(|error| error.message.as_str()).collect()
    }

    #[test]
    fn int_constant_becomes_float() {
        let mut b = TreeBuilder::new("res://a.os");
        let float = b.ty("float");
        let one = b.lit(1);
        b.variable(VarDecl::new("speed").typed(float).init(one));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert_eq!(script.tree[one].reduced_value, Variant::float(1.0));
        assert!(script.tree[one].data_type.is_builtin(VariantType::Float));
    }

    #[test]
    fn float_constant_into_int_narrows() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let half = b.lit(2.5);
        b.variable(VarDecl::new("count").typed(int).init(half));
        let script = analyze(b);
        assert!(script.warnings.iter().any(|w| w.code == WarningCode::NarrowingConversion));
        assert_eq!(script.tree[half].reduced_value, Variant::Int(2));
    }

    #[test]
    fn typed_array_literal() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let list_type = b.ty_container("Array", vec![int]);
        let one = b.lit(1);
        let two = b.lit(2);
        let list = b.array(vec![one, two]);
        b.variable(VarDecl::new("numbers").typed(list_type).init(list));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        let element = script.tree[list].data_type.get_container_element_type(0).cloned();
        assert!(element.is_some_and(|element| element.is_builtin(VariantType::Int)));
    }

    #[test]
    fn wrong_element_in_typed_array() {
        let mut b = TreeBuilder::new("res://a.os");
        let node = b.ty("Node");
        let list_type = b.ty_container("Array", vec![node]);
        let one = b.lit(1);
        let list = b.array(vec![one]);
        let suite = b.suite_of(|b| vec![b.local_var(VarDecl::new("_nodes").typed(list_type).init(list))]);
        b.function(FuncDecl::new("f").body(suite));
        let script = analyze(b);
        assert!(errors(&script).contains(&r#"Cannot have an element of type "int" in an array of type "Array[Node]"."#));
    }

    #[test]
    fn mixed_array_into_typed_array_reports_once() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let list_type = b.ty_container("Array", vec![int]);
        let one = b.lit(1);
        let text = b.lit("x");
        let list = b.array(vec![one, text]);
        b.variable(VarDecl::new("numbers").typed(list_type).init(list));
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"Cannot include a value of type "String" as "int"."#]);
    }

    #[test]
    fn wrong_key_in_typed_dictionary() {
        let mut b = TreeBuilder::new("res://a.os");
        let string = b.ty("String");
        let int = b.ty("int");
        let map_type = b.ty_container("Dictionary", vec![string, int]);
        let key = b.lit(Variant::vector2(0.0, 0.0));
        let value = b.lit(1);
        let map = b.dictionary(vec![(key, value)]);
        b.variable(VarDecl::new("lookup").typed(map_type).init(map));
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"Cannot include a value of type "Vector2" as "String"."#]);
    }
}
