//! Control flow statements and match patterns.

use orchestrator_core::{DataType, ExprId, Kind, PatternId, StmtId, SuiteId, TypeSource, Variant, VariantType, WarningCode};
use orchestrator_parser::ast::{MatchBranch, PatternKind, SubscriptIndex};
use orchestrator_parser::{ExprKind, StmtKind};

use super::decide_type;
use crate::context::Analyzer;
use crate::types::type_from_metatype;

const ITERATOR_KIND: &str = r#""for" iterator variable"#;

impl Analyzer<'_> {
    pub(super) fn resolve_if(
        &mut self,
        statement: StmtId,
        condition: ExprId,
        true_block: SuiteId,
        false_block: Option<SuiteId>,
    ) {
        self.reduce_expression(condition, false);

        self.resolve_suite(true_block);
        let mut ty = self.tree()[true_block].data_type.clone();
        if let Some(false_block) = false_block {
            self.resolve_suite(false_block);
            let false_type = self.tree()[false_block].data_type.clone();
            if false_type.is_set() {
                decide_type(&mut ty, &false_type);
            }
        }
        self.tree_mut()[statement].data_type = ty;
    }

    pub(super) fn resolve_for(&mut self, statement: StmtId) {
        let StmtKind::For {
            variable,
            datatype_specifier,
            list,
            body,
            ..
        } = self.tree()[statement].kind.clone()
        else {
            return;
        };

        self.reduce_expression(list, false);

        let is_range = self.range_call_arguments(list).is_some_and(|count| {
            if count == 0 {
                self.push_error(
                    r#"Invalid call for "range()" function. Expected at least 1 argument, none given."#,
                    list,
                );
            } else if count > 3 {
                self.push_error(
                    format!(r#"Invalid call for "range()" function. Expected at most 3 arguments, {count} given."#),
                    list,
                );
            }
            true
        });

        let list_type = self.tree()[list].data_type.clone();
        if !list_type.is_hard_type() {
            self.mark_unsafe(list);
        }
        let variable_type = if is_range {
            DataType::builtin(VariantType::Int, TypeSource::AnnotatedInferred)
        } else {
            self.iterator_type(list, &list_type)
        };

        let name = self.tree().identifier_name(variable).to_string();
        match datatype_specifier {
            Some(specifier) => {
                let specified = type_from_metatype(&self.resolve_datatype(Some(specifier)));
                if !specified.is_variant() {
                    let mut conversion = false;
                    if variable_type.is_variant() || !variable_type.is_hard_type() {
                        self.mark_unsafe(variable);
                        conversion = true;
                    } else if !self.is_type_compatible(&specified, &variable_type, true, Some(variable.into())) {
                        if self.check_type_compatibility(&variable_type, &specified, false) {
                            self.mark_unsafe(variable);
                            conversion = true;
                        } else {
                            self.push_error(
                                format!(
                                    r#"Unable to iterate on value of type "{list_type}" with variable of type "{specified}"."#
                                ),
                                specifier,
                            );
                        }
                    } else if !self.check_type_compatibility(&specified, &variable_type, false) {
                        conversion = true;
                    }
                    if conversion {
                        if let StmtKind::For {
                            use_conversion_assign, ..
                        } = &mut self.tree_mut()[statement].kind
                        {
                            *use_conversion_assign = true;
                        }
                    }
                    match self.tree()[list].kind {
                        ExprKind::Array(_) => self.update_array_literal_element_type(list, &specified),
                        ExprKind::Dictionary(_) => {
                            self.update_dictionary_literal_element_type(list, &specified, &DataType::variant())
                        }
                        _ => {}
                    }
                }
                self.tree_mut()[variable].data_type = specified;
            }
            None => {
                let code = if variable_type.is_hard_type() {
                    WarningCode::InferredDeclaration
                } else {
                    WarningCode::UntypedDeclaration
                };
                self.push_warning(variable, code, &[ITERATOR_KIND, &name]);
                self.tree_mut()[variable].data_type = variable_type;
            }
        }
        self.tree_mut()[variable].reduced = true;

        self.resolve_suite(body);
        let body_type = self.tree()[body].data_type.clone();
        self.tree_mut()[statement].data_type = body_type;

        self.is_shadowing(&name, variable.into(), ITERATOR_KIND, true);
    }

    /// The element type produced by iterating over a value of `list_type`.
    fn iterator_type(&mut self, list: ExprId, list_type: &DataType) -> DataType {
        if list_type.is_variant() {
            self.mark_unsafe(list);
            return DataType::variant();
        }
        if let Some(element) = list_type.get_container_element_type(0) {
            let mut ty = element.clone();
            ty.type_source = list_type.type_source;
            return ty;
        }
        if list_type.is_typed_container_type() {
            let mut ty = list_type.get_typed_container_type();
            ty.type_source = list_type.type_source;
            return ty;
        }
        match list_type.builtin_type {
            VariantType::Int | VariantType::Float | VariantType::String => {
                return DataType::builtin(list_type.builtin_type, list_type.type_source);
            }
            VariantType::Vector2i | VariantType::Vector3i => {
                return DataType::builtin(VariantType::Int, list_type.type_source);
            }
            VariantType::Vector2 | VariantType::Vector3 => {
                return DataType::builtin(VariantType::Float, list_type.type_source);
            }
            VariantType::Object => {
                return match self.get_function_signature(list.into(), false, list_type, "_iter_get") {
                    Some(signature) => {
                        let mut ty = signature.return_type;
                        ty.type_source = list_type.type_source;
                        ty
                    }
                    None if !list_type.is_hard_type() => DataType::variant(),
                    None => {
                        self.push_error(format!(r#"Unable to iterate on object of type "{list_type}"."#), list);
                        DataType::default()
                    }
                };
            }
            _ => {}
        }
        if matches!(list_type.builtin_type, VariantType::Array | VariantType::Dictionary) || !list_type.is_hard_type() {
            return DataType::variant();
        }
        self.push_error(format!(r#"Unable to iterate on value of type "{list_type}"."#), list);
        DataType::default()
    }

    /// The argument count of a `range(...)` call.
    fn range_call_arguments(&self, list: ExprId) -> Option<usize> {
        let tree = self.tree();
        match &tree[list].kind {
            ExprKind::Call {
                callee: Some(callee),
                arguments,
                ..
            } if tree.identifier_name(*callee) == "range" => Some(arguments.len()),
            _ => None,
        }
    }

    pub(super) fn resolve_match(&mut self, statement: StmtId, test: ExprId, branches: &[MatchBranch]) {
        self.reduce_expression(test, false);

        let mut ty = DataType::default();
        for branch in branches {
            for &pattern in &branch.patterns {
                self.resolve_match_pattern(pattern, Some(test));
            }
            if let Some(guard) = branch.guard {
                self.reduce_expression(guard, false);
            }
            self.resolve_suite(branch.block);
            let block_type = self.tree()[branch.block].data_type.clone();
            if block_type.is_set() {
                decide_type(&mut ty, &block_type);
            }
        }
        self.tree_mut()[statement].data_type = ty;
    }

    fn resolve_match_pattern(&mut self, pattern: PatternId, test: Option<ExprId>) {
        let kind = self.tree()[pattern].kind.clone();
        let result = match kind {
            PatternKind::Literal(literal) => {
                self.reduce_expression(literal, false);
                self.tree()[literal].data_type.clone()
            }
            PatternKind::Expression(expr) => {
                self.reduce_expression(expr, false);
                if !self.tree()[expr].is_constant && !self.is_attribute_chain(expr) {
                    self.push_error(
                        r#"Expression in match pattern must be a constant expression, an identifier, or an attribute access ("A.B")."#,
                        expr,
                    );
                }
                self.tree()[expr].data_type.clone()
            }
            PatternKind::Bind(ident) => {
                let ty = match test {
                    Some(test) => self.tree()[test].data_type.clone(),
                    None => DataType::variant(),
                };
                self.is_shadowing(&ident.name, pattern.into(), "pattern bind", true);
                ty
            }
            PatternKind::Array(elements) => {
                let mut ty = DataType::default();
                for element in elements {
                    self.resolve_match_pattern(element, None);
                    let element_type = self.tree()[element].data_type.clone();
                    decide_type(&mut ty, &element_type);
                }
                ty
            }
            PatternKind::Dictionary(entries) => {
                let mut ty = DataType::default();
                for (key, value) in entries {
                    if let Some(key) = key {
                        self.reduce_expression(key, false);
                        if !self.tree()[key].is_constant {
                            self.push_error("Expression in dictionary pattern key must be a constant.", key);
                        }
                    }
                    if let Some(value) = value {
                        self.resolve_match_pattern(value, None);
                        let value_type = self.tree()[value].data_type.clone();
                        decide_type(&mut ty, &value_type);
                    }
                }
                ty
            }
            PatternKind::Rest | PatternKind::Wildcard => DataType::variant(),
        };
        self.tree_mut()[pattern].data_type = result;
    }

    /// `A`, `A.B`, `A.B.C`: identifiers reached through attribute subscripts.
    fn is_attribute_chain(&self, expr: ExprId) -> bool {
        let tree = self.tree();
        let mut current = expr;
        loop {
            match &tree[current].kind {
                ExprKind::Identifier(_) => return true,
                ExprKind::Subscript {
                    base,
                    index: SubscriptIndex::Attribute(_),
                } => current = *base,
                _ => return false,
            }
        }
    }

    pub(super) fn resolve_return(&mut self, statement: StmtId, value: Option<ExprId>) {
        let expected = self.current_function.map(|function| self.tree()[function].data_type.clone());

        let result = match value {
            Some(value) => {
                let is_void_function = expected
                    .as_ref()
                    .is_some_and(|ty| ty.is_hard_type() && ty.is_builtin(VariantType::Nil));
                let is_call = self.tree()[value].is_call();
                if is_void_function && is_call {
                    self.reduce_call_expression(value, false, true);
                } else {
                    self.reduce_expression(value, false);
                }

                if is_void_function {
                    if let StmtKind::Return { void_return, .. } = &mut self.tree_mut()[statement].kind {
                        *void_return = true;
                    }
                    if is_call && !self.tree()[value].data_type.is_hard_type() {
                        let function = self.unreachable_function_name();
                        let called = match &self.tree()[value].kind {
                            ExprKind::Call { function_name, .. } => function_name.clone(),
                            _ => String::new(),
                        };
                        self.push_warning(statement, WarningCode::UnsafeVoidReturn, &[&function, &called]);
                        self.mark_unsafe(statement);
                    } else if !is_call {
                        self.push_error("A void function cannot return a value.", statement);
                    }
                    void_type()
                } else {
                    if let Some(expected) = &expected {
                        match self.tree()[value].kind {
                            ExprKind::Array(_) if expected.has_container_element_type(0) => {
                                let element = expected.get_container_element_type_or_variant(0);
                                self.update_array_literal_element_type(value, &element);
                            }
                            ExprKind::Dictionary(_) if expected.has_container_element_types() => {
                                let key = expected.get_container_element_type_or_variant(0);
                                let element = expected.get_container_element_type_or_variant(1);
                                self.update_dictionary_literal_element_type(value, &key, &element);
                            }
                            _ => {}
                        }
                        if expected.is_hard_type() && self.tree()[value].is_constant {
                            self.update_const_expression_builtin_type(value, expected, "return", false);
                        }
                    }
                    self.tree()[value].data_type.clone()
                }
            }
            None => void_type(),
        };

        if let Some(expected) = expected.filter(|expected| !expected.is_variant()) {
            if result.is_variant() || !result.is_hard_type() {
                self.mark_unsafe(statement);
                if !self.is_type_compatible(&expected, &result, true, Some(statement.into())) {
                    if let Some(value) = value {
                        self.downgrade_node_type_source(value);
                    }
                }
            } else if !self.is_type_compatible(&expected, &result, true, Some(statement.into())) {
                self.mark_unsafe(statement);
                if !self.check_type_compatibility(&result, &expected, false) {
                    self.push_error(
                        format!(r#"Cannot return value of type "{result}" because the function return type is "{expected}"."#),
                        statement,
                    );
                }
            } else if expected.builtin_type == VariantType::Int && result.builtin_type == VariantType::Float {
                self.push_warning(statement, WarningCode::NarrowingConversion, &[]);
            }
        }

        self.tree_mut()[statement].data_type = result;
    }

    pub(super) fn resolve_assert(&mut self, statement: StmtId, condition: ExprId, message: Option<ExprId>) {
        self.reduce_expression(condition, false);
        if let Some(message) = message {
            self.reduce_expression(message, false);
            let ty = &self.tree()[message].data_type;
            if !ty.has_no_type() && !(ty.kind == Kind::Builtin && ty.builtin_type == VariantType::String) {
                self.push_error("Expected string for assert error message.", message);
            }
        }

        let condition_node = &self.tree()[condition];
        let condition_type = condition_node.data_type.clone();
        if condition_node.is_constant {
            if condition_node.reduced_value.booleanize() {
                self.push_warning(condition, WarningCode::AssertAlwaysTrue, &[]);
            } else if !matches!(condition_node.kind, ExprKind::Literal(Variant::Bool(_))) {
                self.push_warning(condition, WarningCode::AssertAlwaysFalse, &[]);
            }
        }
        self.tree_mut()[statement].data_type = condition_type;
    }
}

fn void_type() -> DataType {
    let mut ty = DataType::builtin(VariantType::Nil, TypeSource::AnnotatedExplicit);
    ty.is_constant = true;
    ty
}
