//! Operators, ternaries, type tests, casts, `await` and assignments.

use orchestrator_core::{
    CallError, DataType, ExprId, Kind, NodeId, TypeNodeId, TypeSource, Variant, VariantOperator, VariantType,
    WarningCode,
};
use orchestrator_parser::{AssignOp, BinaryOp, ExprKind, IdentifierSource, UnaryOp};

use crate::context::Analyzer;
use crate::types::type_from_metatype;

impl Analyzer<'_> {
    /// Result type of `a op b`, and whether the operation is valid.
    ///
    /// Operations mixing a weak operand stay valid with a `Variant` result,
    /// since the runtime types may still support them.
    pub(crate) fn get_operation_type(&self, op: VariantOperator, a: &DataType, b: &DataType) -> (DataType, bool) {
        if matches!(op, VariantOperator::And | VariantOperator::Or) {
            // Short-circuiting; any operands.
            return (DataType::builtin(VariantType::Bool, TypeSource::AnnotatedInferred), true);
        }

        let operand_type = |ty: &DataType| match (ty.kind, ty.is_meta_type) {
            (Kind::Enum, true) => VariantType::Dictionary,
            (Kind::Enum, false) => VariantType::Int,
            _ => ty.builtin_type,
        };
        let a_type = operand_type(a);
        let b_type = operand_type(b);

        let hard_operation = a.is_hard_type() && b.is_hard_type();
        let source = if hard_operation {
            TypeSource::AnnotatedInferred
        } else {
            TypeSource::Inferred
        };

        if op == VariantOperator::Add && a_type == VariantType::Array && b_type == VariantType::Array {
            let same_elements = match (a.get_container_element_type(0), b.get_container_element_type(0)) {
                (Some(left), Some(right)) => left == right,
                _ => false,
            };
            if same_elements {
                return (
                    DataType {
                        type_source: source,
                        ..a.clone()
                    },
                    true,
                );
            }
        }

        match self.host.values.operator_return_type(op, a_type, b_type) {
            Some(result) => (DataType::builtin(result, source), true),
            None => (
                DataType {
                    kind: Kind::Variant,
                    ..Default::default()
                },
                !hard_operation,
            ),
        }
    }

    pub(super) fn reduce_binary_op(&mut self, expr: ExprId, op: BinaryOp, left: ExprId, right: ExprId) {
        self.reduce_expression(left, false);
        self.reduce_expression(right, false);

        let left_type = self.tree()[left].data_type.clone();
        let right_type = self.tree()[right].data_type.clone();
        if !left_type.is_set() || !right_type.is_set() {
            return;
        }

        let variant_op = op.variant_op();
        if variant_op == VariantOperator::Divide
            && left_type.builtin_type == VariantType::Int
            && right_type.builtin_type == VariantType::Int
        {
            self.push_warning(expr, WarningCode::IntegerDivision, &[]);
        }

        let (left_node, right_node) = (&self.tree()[left], &self.tree()[right]);
        if left_node.is_constant && right_node.is_constant {
            let a = left_node.reduced_value.clone();
            let b = right_node.reduced_value.clone();
            let value = match self.host.values.evaluate(variant_op, &a, &b) {
                Ok(value) => value,
                Err(CallError::Failed(message)) => {
                    self.push_error(format!("{message} in operator {}.", variant_op.name()), expr);
                    Variant::Nil
                }
                Err(_) => {
                    self.push_error(
                        format!(
                            "Invalid operands to operator {}, {} and {}.",
                            variant_op.name(),
                            a.get_type().name(),
                            b.get_type().name()
                        ),
                        expr,
                    );
                    Variant::Nil
                }
            };
            let data_type = self.type_from_variant(&value, expr.into());
            self.set_constant(expr, value);
            self.set_expression_type(expr, data_type);
            return;
        }

        let is_null = |ty: &DataType| ty.kind == Kind::Builtin && ty.builtin_type == VariantType::Nil;
        let result = if matches!(variant_op, VariantOperator::Equal | VariantOperator::NotEqual)
            && (is_null(&left_type) || is_null(&right_type))
        {
            DataType::builtin(VariantType::Bool, TypeSource::AnnotatedInferred)
        } else if variant_op == VariantOperator::Module && left_type.builtin_type == VariantType::String {
            // `%` on a string formats it.
            DataType::builtin(VariantType::String, left_type.type_source)
        } else if left_type.is_variant() || right_type.is_variant() {
            self.mark_unsafe(expr);
            DataType::variant()
        } else {
            let (result, valid) = self.get_operation_type(variant_op, &left_type, &right_type);
            if !valid {
                self.push_error(
                    format!(
                        r#"Invalid operands "{left_type}" and "{right_type}" for "{}" operator."#,
                        variant_op.name()
                    ),
                    expr,
                );
            } else if !result.is_hard_type() {
                self.mark_unsafe(expr);
            }
            result
        };
        self.set_expression_type(expr, result);
    }

    pub(super) fn reduce_unary_op(&mut self, expr: ExprId, op: UnaryOp, operand: ExprId) {
        self.reduce_expression(operand, false);

        let variant_op = op.variant_op();
        let node = &self.tree()[operand];
        let operand_type = node.data_type.clone();

        if node.is_constant {
            let value = node.reduced_value.clone();
            let folded = self.host.values.evaluate(variant_op, &value, &Variant::Nil).unwrap_or_default();
            self.set_constant(expr, folded);
        }

        let result = if operand_type.is_variant() {
            self.mark_unsafe(expr);
            DataType::variant()
        } else {
            // Unary operators take `Nil` as their second operand.
            let nil = DataType {
                type_source: operand_type.type_source,
                ..DataType::builtin(VariantType::Nil, TypeSource::Undetected)
            };
            let (result, valid) = self.get_operation_type(variant_op, &operand_type, &nil);
            if !valid {
                self.push_error(
                    format!(
                        r#"Invalid operand of type "{operand_type}" for unary operator "{}"."#,
                        variant_op.name()
                    ),
                    expr,
                );
            }
            result
        };
        self.set_expression_type(expr, result);
    }

    pub(super) fn reduce_ternary(
        &mut self,
        expr: ExprId,
        condition: ExprId,
        true_expr: ExprId,
        false_expr: ExprId,
        is_root: bool,
    ) {
        self.reduce_expression(condition, false);
        self.reduce_expression(true_expr, is_root);
        self.reduce_expression(false_expr, is_root);

        let tree = self.tree();
        if tree[condition].is_constant && tree[true_expr].is_constant && tree[false_expr].is_constant {
            let value = if tree[condition].reduced_value.booleanize() {
                tree[true_expr].reduced_value.clone()
            } else {
                tree[false_expr].reduced_value.clone()
            };
            self.set_constant(expr, value);
        }

        let true_type = self.tree()[true_expr].data_type.clone();
        let false_type = self.tree()[false_expr].data_type.clone();
        let mut result = if true_type.is_variant() || false_type.is_variant() {
            DataType::variant()
        } else if self.check_type_compatibility(&true_type, &false_type, false) {
            true_type.clone()
        } else if self.check_type_compatibility(&false_type, &true_type, false) {
            false_type.clone()
        } else {
            self.push_warning(expr, WarningCode::IncompatibleTernary, &[]);
            DataType::variant()
        };
        result.type_source = if true_type.is_hard_type() && false_type.is_hard_type() {
            TypeSource::AnnotatedInferred
        } else {
            TypeSource::Inferred
        };
        self.set_expression_type(expr, result);
    }

    pub(super) fn reduce_type_test(&mut self, expr: ExprId, operand: ExprId, test_type: TypeNodeId) {
        self.set_expression_type(expr, DataType::builtin(VariantType::Bool, TypeSource::AnnotatedInferred));

        self.reduce_expression(operand, false);
        let operand_type = self.tree()[operand].data_type.clone();
        let meta = self.resolve_datatype(Some(test_type));
        let tested = type_from_metatype(&meta);
        if !operand_type.is_set() || !tested.is_set() {
            return;
        }

        let incompatible = format!(r#"Expression is of type "{operand_type}" so it can't be of type "{tested}"."#);
        if self.tree()[operand].is_constant {
            let value = self.tree()[operand].reduced_value.clone();
            let mut result = false;
            if !self.check_type_compatibility(&tested, &operand_type, false) {
                self.push_error(incompatible, operand);
            } else {
                let value_type = self.type_from_variant(&value, operand.into());
                if self.check_type_compatibility(&tested, &value_type, false) {
                    result = tested.builtin_type != VariantType::Object || !value.is_null();
                }
            }
            self.set_constant(expr, Variant::Bool(result));
            return;
        }

        if !self.check_type_compatibility(&tested, &operand_type, false)
            && !self.check_type_compatibility(&operand_type, &tested, false)
        {
            if operand_type.is_hard_type() {
                self.push_error(incompatible, operand);
            } else {
                self.downgrade_node_type_source(operand);
            }
        }
    }

    pub(super) fn reduce_cast(&mut self, expr: ExprId, operand: ExprId, cast_type: TypeNodeId) {
        self.reduce_expression(operand, false);

        let meta = self.resolve_datatype(Some(cast_type));
        let target = type_from_metatype(&meta);
        if !target.is_set() {
            self.mark_unsafe(expr);
            return;
        }
        self.set_expression_type(expr, target.clone());

        if self.tree()[operand].is_constant {
            self.update_const_expression_builtin_type(operand, &target, "cast", true);
            let node = &self.tree()[operand];
            if target.is_variant() || node.data_type == target {
                let value = node.reduced_value.clone();
                self.set_constant(expr, value);
            }
        }

        match self.tree()[operand].kind {
            ExprKind::Array(_) => {
                if let Some(element) = target.get_container_element_type(0) {
                    self.update_array_literal_element_type(operand, element);
                }
            }
            ExprKind::Dictionary(_) if target.has_container_element_types() => {
                let key = target.get_container_element_type_or_variant(0);
                let value = target.get_container_element_type_or_variant(1);
                self.update_dictionary_literal_element_type(operand, &key, &value);
            }
            _ => {}
        }

        if target.is_variant() {
            return;
        }
        let operand_type = self.tree()[operand].data_type.clone();
        if operand_type.is_variant() || !operand_type.is_hard_type() {
            self.mark_unsafe(expr);
            if operand_type.is_variant() && !operand_type.is_hard_type() {
                let shown = target.to_string();
                self.push_warning(expr, WarningCode::UnsafeCast, &[&shown]);
            }
            return;
        }

        let valid = if operand_type.builtin_type == VariantType::Int && target.kind == Kind::Enum {
            self.mark_unsafe(expr);
            true
        } else if operand_type.kind == Kind::Enum && target.builtin_type == VariantType::Int {
            true
        } else if operand_type.kind == Kind::Builtin && target.kind == Kind::Builtin {
            self.host.values.can_convert(operand_type.builtin_type, target.builtin_type)
        } else if operand_type.kind != Kind::Builtin && target.kind != Kind::Builtin {
            self.check_type_compatibility(&target, &operand_type, false)
                || self.check_type_compatibility(&operand_type, &target, false)
        } else {
            false
        };
        if !valid {
            self.push_error(
                format!(r#"Invalid cast. Cannot convert from "{operand_type}" to "{target}"."#),
                NodeId::Type(cast_type),
            );
        }
    }

    pub(super) fn reduce_await(&mut self, expr: ExprId, operand: ExprId) {
        if self.tree()[operand].is_call() {
            self.reduce_call_expression(operand, true, false);
        } else {
            self.reduce_expression(operand, false);
        }

        let awaited = self.tree()[operand].data_type.clone();
        let mut result = awaited.clone();
        if awaited.is_hard_type() && awaited.kind == Kind::Builtin && awaited.builtin_type == VariantType::Signal {
            // The values a signal carries are not known statically.
            result = DataType::undetected_variant();
        } else if self.tree()[operand].is_constant {
            let value = self.tree()[operand].reduced_value.clone();
            self.set_constant(expr, value);
        }
        result.is_coroutine = false;
        self.set_expression_type(expr, result);

        if !awaited.is_coroutine && !awaited.is_variant() && awaited.builtin_type != VariantType::Signal {
            self.push_warning(expr, WarningCode::RedundantAwait, &[]);
        }
    }

    pub(super) fn reduce_assignment(&mut self, expr: ExprId) {
        let ExprKind::Assignment {
            op,
            assignee,
            assigned_value,
            ..
        } = self.tree()[expr].kind
        else {
            return;
        };

        self.reduce_expression(assigned_value, false);
        if self.tree()[assignee].is_identifier() {
            self.reduce_identifier_expression(assignee, false, true);
        } else {
            self.reduce_expression(assignee, false);
        }

        self.check_capture_reassignment(expr, assignee);
        if op.is_compound() {
            self.check_unassigned_op_assign(expr, op, assignee);
        }

        let assignee_type = self.tree()[assignee].data_type.clone();
        if let Some(message) = self.assignment_target_error(assignee, &assignee_type) {
            self.push_error(message, assignee);
            return;
        }

        // Container literals take the element types of the target.
        if assignee_type.is_hard_type() {
            match self.tree()[assigned_value].kind {
                ExprKind::Array(_) => {
                    if let Some(element) = assignee_type.get_container_element_type(0) {
                        self.update_array_literal_element_type(assigned_value, element);
                    }
                }
                ExprKind::Dictionary(_) if assignee_type.has_container_element_types() => {
                    let key = assignee_type.get_container_element_type_or_variant(0);
                    let value = assignee_type.get_container_element_type_or_variant(1);
                    self.update_dictionary_literal_element_type(assigned_value, &key, &value);
                }
                _ => {}
            }
        }

        if !op.is_compound() && assignee_type.is_hard_type() && self.tree()[assigned_value].is_constant {
            self.update_const_expression_builtin_type(assigned_value, &assignee_type, "assign", false);
        }

        let assigned_type = self.tree()[assigned_value].data_type.clone();
        let assignee_is_variant = assignee_type.is_variant();
        let assignee_is_hard = assignee_type.is_hard_type();
        let mut downgrades_assignee = false;
        let mut downgrades_assigned = false;
        let mut use_conversion_assign = false;

        let mut op_type = assigned_type.clone();
        if let (Some(variant_op), false) = (op.variant_op(), assigned_type.is_variant()) {
            let (result, compatible) = self.get_operation_type(variant_op, &assignee_type, &assigned_type);
            op_type = result;
            if assignee_is_variant {
                self.mark_unsafe(expr);
            } else if !compatible {
                if assignee_is_hard && assigned_type.is_hard_type() {
                    self.push_error(
                        format!(r#"Invalid operands "{assignee_type}" and "{assigned_type}" for assignment operator."#),
                        expr,
                    );
                } else {
                    downgrades_assignee = !assignee_is_hard;
                    downgrades_assigned = !assigned_type.is_hard_type();
                }
            }
        }

        if assignee_is_hard && !assignee_is_variant && op_type.is_hard_type() && !op_type.is_variant() {
            let compatible = self.is_type_compatible(&assignee_type, &op_type, true, Some(assigned_value.into()));
            if !compatible {
                // A supertype may still hold a valid subtype.
                if self.check_type_compatibility(&op_type, &assignee_type, false) {
                    self.mark_unsafe(expr);
                    use_conversion_assign = true;
                } else {
                    self.push_error(
                        format!(
                            r#"Value of type "{assigned_type}" cannot be assigned to a variable of type "{assignee_type}"."#
                        ),
                        assigned_value,
                    );
                }
            } else if assignee_type.builtin_type != op_type.builtin_type || assignee_type.kind != op_type.kind {
                use_conversion_assign = true;
            }
        } else if assignee_is_hard && !assignee_is_variant {
            // The value is only known at runtime.
            self.mark_unsafe(expr);
            use_conversion_assign = true;
        }

        if downgrades_assignee {
            self.downgrade_node_type_source(assignee);
        }
        if downgrades_assigned {
            self.downgrade_node_type_source(assigned_value);
        }

        if assignee_is_hard
            && assignee_type.builtin_type == VariantType::Int
            && assigned_type.builtin_type == VariantType::Float
        {
            self.push_warning(assigned_value, WarningCode::NarrowingConversion, &[]);
        }

        if let ExprKind::Assignment {
            use_conversion_assign: flag,
            ..
        } = &mut self.tree_mut()[expr].kind
        {
            *flag = use_conversion_assign;
        }
        self.set_expression_type(expr, op_type);
    }

    /// Why `assignee` cannot be written, if it cannot.
    fn assignment_target_error(&self, assignee: ExprId, assignee_type: &DataType) -> Option<&'static str> {
        const CONSTANT: &str = "Cannot assign a new value to a constant.";
        const READ_ONLY: &str = "Cannot assign a new value to a read-only property.";

        if assignee_type.is_constant {
            return Some(CONSTANT);
        }
        let tree = self.tree();
        if let ExprKind::Subscript { base, .. } = tree[assignee].kind {
            let base_node = &tree[base];
            // Static variables of a class are reached through a constant meta type.
            if base_node.is_constant && !matches!(base_node.data_type.kind, Kind::Script | Kind::Class) {
                return Some(CONSTANT);
            }
        }
        if assignee_type.is_read_only {
            return Some(READ_ONLY);
        }

        let mut current = assignee;
        while let ExprKind::Subscript { base, .. } = tree[current].kind {
            let base_type = &tree[base].data_type;
            if !(base_type.is_hard_type() && base_type.is_read_only) {
                break;
            }
            if base_type.kind == Kind::Builtin && !base_type.builtin_type.is_shared() {
                return Some(READ_ONLY);
            }
            current = base;
        }
        None
    }

    /// Writing to a captured local inside a lambda does not reach the
    /// enclosing function's variable.
    fn check_capture_reassignment(&mut self, expr: ExprId, assignee: ExprId) {
        let Some(lambda) = self.current_lambda else {
            return;
        };
        let tree = self.tree();
        let mut is_subscript = false;
        let mut base = assignee;
        while let ExprKind::Subscript { base: inner, .. } = tree[base].kind {
            is_subscript = true;
            base = inner;
        }
        let Some(identifier) = tree.identifier(base) else {
            return;
        };
        if !tree[lambda].has_capture(&identifier.name) {
            return;
        }

        let need_warn = if is_subscript {
            let ty = &tree[base].data_type;
            ty.is_hard_type()
                && match ty.kind {
                    // Value types are copied into the capture.
                    Kind::Builtin => !ty.builtin_type.is_shared(),
                    Kind::Enum => true,
                    _ => false,
                }
        } else {
            true
        };
        if need_warn {
            let name = identifier.name.clone();
            self.push_warning(expr, WarningCode::ConfusableCaptureReassignment, &[&name]);
        }
    }

    fn check_unassigned_op_assign(&mut self, expr: ExprId, op: AssignOp, assignee: ExprId) {
        let Some(identifier) = self.tree().identifier(assignee) else {
            return;
        };
        let IdentifierSource::LocalVariable(variable) = identifier.source else {
            return;
        };
        let name = identifier.name.clone();
        if self.tree()[variable].assignments > 0 {
            return;
        }
        let symbol = op.variant_op().map_or("", |op| op.name());
        self.push_warning(expr, WarningCode::UnassignedVariableOpAssign, &[&name, symbol]);
        // Reported once per variable.
        self.tree_mut()[variable].assignments = 1;
    }
}


#[cfg(test)]
mod tests {
    use orchestrator_core::{Kind, Variant, VariantType, WarningCode};
    use orchestrator_parser::{AssignOp, BinaryOp, FuncDecl, ParamDecl, ScriptParser, ScriptPool, TreeBuilder, VarDecl};
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

    fn has_warning(script: &ScriptParser, code: WarningCode) -> bool {
        script.warnings.iter().any(|warning| warning.code == code)
    }

    /// A function `f(a: A, b: B)` returning `body(a, b)`.
    fn with_params(
        a: &str,
        b_type: &str,
        body: impl FnOnce(&mut TreeBuilder, orchestrator_core::ExprId, orchestrator_core::ExprId) -> orchestrator_core::ExprId,
    ) -> (ScriptParser, orchestrator_core::ExprId) {
        let mut b = TreeBuilder::new("res://a.os");
        let a_type = b.ty(a);
        let b_ty = b.ty(b_type);
        let left = b.ident("a");
        let right = b.ident("b");
        let result = body(&mut b, left, right);
        let suite = b.suite_of(|b| vec![b.ret(Some(result))]);
        b.function(
            FuncDecl::new("f")
                .param(ParamDecl::new("a").typed(a_type))
                .param(ParamDecl::new("b").typed(b_ty))
                .body(suite),
        );
        (analyze(b), result)
    }

    #[test]
    fn constant_operands_fold() {
        let mut b = TreeBuilder::new("res://a.os");
        let two = b.lit(2);
        let three = b.lit(3);
        let sum = b.binary(BinaryOp::Add, two, three);
        b.constant(VarDecl::new("FIVE").init(sum));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert_eq!(script.tree[sum].reduced_value, Variant::Int(5));
        assert!(script.tree[sum].data_type.is_builtin(VariantType::Int));
    }

    #[test]
    fn integer_division_warns() {
        let (script, quotient) = with_params("int", "int", |b, a, c| b.binary(BinaryOp::Div, a, c));
        assert!(has_warning(&script, WarningCode::IntegerDivision));
        assert!(script.tree[quotient].data_type.is_builtin(VariantType::Int));
    }

    #[test]
    fn invalid_operands() {
        let (script, _) = with_params("int", "String", |b, a, c| b.binary(BinaryOp::Sub, a, c));
        assert_eq!(errors(&script), vec![r#"Invalid operands "int" and "String" for "-" operator."#]);
    }

    #[test]
    fn comparing_with_null_is_bool() {
        let mut b = TreeBuilder::new("res://a.os");
        let node_type = b.ty("Node");
        let node = b.ident("node");
        let null = b.null();
        let test = b.binary(BinaryOp::Equal, node, null);
        let suite = b.suite_of(|b| vec![b.ret(Some(test))]);
        b.function(FuncDecl::new("f").param(ParamDecl::new("node").typed(node_type)).body(suite));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert!(script.tree[test].data_type.is_builtin(VariantType::Bool));
    }

    #[test]
    fn incompatible_ternary_is_variant() {
        let (script, ternary) = with_params("int", "String", |b, a, c| {
            let condition = b.lit(true);
            b.ternary(condition, a, c)
        });
        assert!(has_warning(&script, WarningCode::IncompatibleTernary));
        assert_eq!(script.tree[ternary].data_type.kind, Kind::Variant);
    }

    #[test]
    fn invalid_cast() {
        let mut b = TreeBuilder::new("res://a.os");
        let string = b.ty("String");
        let node = b.ty("Node");
        let text = b.ident("text");
        let cast = b.cast(text, node);
        let suite = b.suite_of(|b| vec![b.ret(Some(cast))]);
        b.function(FuncDecl::new("f").param(ParamDecl::new("text").typed(string)).body(suite));
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"Invalid cast. Cannot convert from "String" to "Node"."#]);
    }

    #[test]
    fn constant_type_test_against_unrelated_type() {
        let mut b = TreeBuilder::new("res://a.os");
        let node = b.ty("Node");
        let one = b.lit(1);
        let test = b.is_type(one, node);
        let suite = b.suite_of(|b| vec![b.ret(Some(test))]);
        b.function(FuncDecl::new("f").body(suite));
        let script = analyze(b);
        assert_eq!(errors(&script), vec![r#"Expression is of type "int" so it can't be of type "Node"."#]);
    }

    #[test]
    fn assigning_to_a_constant() {
        let mut b = TreeBuilder::new("res://a.os");
        let one = b.lit(1);
        b.constant(VarDecl::new("LIMIT").init(one));
        let target = b.ident("LIMIT");
        let two = b.lit(2);
        let assign = b.assign(target, two);
        let suite = b.suite_of(|b| vec![b.expr_stmt(assign)]);
        b.function(FuncDecl::new("f").body(suite));
        let script = analyze(b);
        assert_eq!(errors(&script), vec!["Cannot assign a new value to a constant."]);
    }

    #[test]
    fn assigning_an_incompatible_value() {
        let mut b = TreeBuilder::new("res://a.os");
        let node_type = b.ty("Node");
        let string = b.ty("String");
        b.variable(VarDecl::new("target").typed(node_type));
        let target = b.ident("target");
        let text = b.ident("text");
        let assign = b.assign(target, text);
        let suite = b.suite_of(|b| vec![b.expr_stmt(assign)]);
        b.function(FuncDecl::new("f").param(ParamDecl::new("text").typed(string)).body(suite));
        let script = analyze(b);
        assert_eq!(
            errors(&script),
            vec![r#"Value of type "String" cannot be assigned to a variable of type "Node"."#]
        );
    }

    #[test]
    fn compound_assignment_before_any_value() {
        let mut b = TreeBuilder::new("res://a.os");
        let target = b.ident("total");
        let one = b.lit(1);
        let add = b.assign_op(AssignOp::AddAssign, target, one);
        let suite = b.suite_of(|b| vec![b.local_var(VarDecl::new("total")), b.expr_stmt(add)]);
        b.function(FuncDecl::new("f").body(suite));
        let script = analyze(b);
        let count = script
            .warnings
            .iter()
            .filter(|warning| warning.code == WarningCode::UnassignedVariableOpAssign)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn awaiting_a_plain_value_is_redundant() {
        let mut b = TreeBuilder::new("res://a.os");
        let one = b.lit(1);
        let wait = b.await_(one);
        let suite = b.suite_of(|b| vec![b.expr_stmt(wait)]);
        b.function(FuncDecl::new("f").body(suite));
        let script = analyze(b);
        assert!(has_warning(&script, WarningCode::RedundantAwait));
        assert!(!script.tree[wait].data_type.is_coroutine);
    }
}
