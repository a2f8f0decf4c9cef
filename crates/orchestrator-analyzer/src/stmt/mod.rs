//! Suites and statements.
//!
//! A suite's type is decided from the statements that carry one (returns and
//! nested control flow); mixed types collapse to an undetected `Variant`.
//! Return-path analysis runs alongside so function bodies know whether every
//! path returns.

mod assignable;
mod control;

use orchestrator_core::{DataType, Kind, StmtId, SuiteId, TypeSource, WarningCode};
use orchestrator_parser::{ExprKind, StmtKind};

use crate::context::Analyzer;

pub(crate) use assignable::AssignableId;

/// Merge a statement type into an accumulated block type.
pub(crate) fn decide_type(target: &mut DataType, statement: &DataType) {
    if target.is_set() && target != statement {
        target.kind = Kind::Variant;
        target.type_source = TypeSource::Undetected;
    } else {
        *target = statement.clone();
        target.type_source = TypeSource::Inferred;
    }
}

impl Analyzer<'_> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn resolve_suite(&mut self, suite: SuiteId) {
        let statements = self.tree()[suite].statements.clone();
        let mut ends_flow = false;
        for statement in statements {
            if ends_flow && !self.tree()[suite].has_unreachable_code {
                self.tree_mut()[suite].has_unreachable_code = true;
                let function = self.unreachable_function_name();
                self.push_warning(statement, WarningCode::UnreachableCode, &[&function]);
            }

            self.resolve_statement(suite, statement);
            self.resolve_pending_lambdas();

            if is_decided(&self.tree()[statement].kind) {
                let statement_type = self.tree()[statement].data_type.clone();
                decide_type(&mut self.tree_mut()[suite].data_type, &statement_type);
            }

            match &self.tree()[statement].kind {
                StmtKind::Break => ends_flow = true,
                StmtKind::Continue => {
                    self.tree_mut()[suite].has_continue = true;
                    ends_flow = true;
                }
                _ => {}
            }
            if self.statement_returns(statement) {
                self.tree_mut()[suite].has_return = true;
                ends_flow = true;
            }
        }
    }

    fn unreachable_function_name(&self) -> String {
        self.current_function
            .map(|function| self.tree()[function].name().to_string())
            .unwrap_or_default()
    }

    /// Whether every path through `statement` returns.
    fn statement_returns(&self, statement: StmtId) -> bool {
        let tree = self.tree();
        match &tree[statement].kind {
            StmtKind::Return { .. } => true,
            StmtKind::If {
                true_block,
                false_block: Some(false_block),
                ..
            } => tree[*true_block].has_return && tree[*false_block].has_return,
            StmtKind::Match { branches, .. } => {
                !branches.is_empty()
                    && branches.iter().any(|branch| branch.has_wildcard && branch.guard.is_none())
                    && branches.iter().all(|branch| tree[branch.block].has_return)
            }
            _ => false,
        }
    }

    fn resolve_statement(&mut self, suite: SuiteId, statement: StmtId) {
        let kind = self.tree()[statement].kind.clone();
        match kind {
            StmtKind::Expression(expr) => {
                self.reduce_expression(expr, true);
                self.check_standalone_expression(expr);
            }
            StmtKind::Variable(variable) => {
                let name = self.tree()[variable].decl.name().to_string();
                self.check_confusable_declaration(suite, &name, variable.into());
                self.resolve_variable(variable, true);
            }
            StmtKind::Constant(constant) => {
                let name = self.tree()[constant].decl.name().to_string();
                self.check_confusable_declaration(suite, &name, constant.into());
                self.resolve_constant(constant, true);
            }
            StmtKind::If {
                condition,
                true_block,
                false_block,
            } => self.resolve_if(statement, condition, true_block, false_block),
            StmtKind::For { .. } => self.resolve_for(statement),
            StmtKind::While { condition, body } => {
                self.reduce_expression(condition, false);
                self.resolve_suite(body);
                let body_type = self.tree()[body].data_type.clone();
                self.tree_mut()[statement].data_type = body_type;
            }
            StmtKind::Match { test, branches } => self.resolve_match(statement, test, &branches),
            StmtKind::Return { value, .. } => self.resolve_return(statement, value),
            StmtKind::Assert { condition, message } => self.resolve_assert(statement, condition, message),
            StmtKind::Pass | StmtKind::Break | StmtKind::Continue | StmtKind::Breakpoint => {}
        }
    }

    fn check_standalone_expression(&mut self, expr: orchestrator_core::ExprId) {
        match self.tree()[expr].kind {
            ExprKind::Call { .. } | ExprKind::Assignment { .. } | ExprKind::Await(_) | ExprKind::Lambda(_) => {}
            ExprKind::Ternary { .. } => self.push_warning(expr, WarningCode::StandaloneTernary, &[]),
            _ => self.push_warning(expr, WarningCode::StandaloneExpression, &[]),
        }
    }

    /// A local declared in a nested block while the enclosing block declares
    /// the same name further down.
    fn check_confusable_declaration(&mut self, suite: SuiteId, name: &str, node: orchestrator_core::NodeId) {
        let Some(parent) = self.tree()[suite].parent_block else {
            return;
        };
        let Some(kind) = self.tree()[parent].get_local(name).map(|local| local.kind.type_name()) else {
            return;
        };
        self.push_warning(node, WarningCode::ConfusableLocalDeclaration, &[kind, name]);
    }
}

fn is_decided(kind: &StmtKind) -> bool {
    matches!(
        kind,
        StmtKind::If { .. } | StmtKind::For { .. } | StmtKind::Match { .. } | StmtKind::Return { .. } | StmtKind::While { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator_core::VariantType;
    use orchestrator_parser::{BinaryOp, FuncDecl, ScriptParser, ScriptPool, TreeBuilder, VarDecl};
    use orchestrator_registry::Host;

    use crate::config::AnalyzerConfig;

    fn analyze(b: TreeBuilder) -> ScriptParser {
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let _ = Analyzer::new(&mut pool, &host, &config, id).analyze();
        pool[id].clone()
    }

    fn has_warning(script: &ScriptParser, code: WarningCode) -> bool {
        script.warnings.iter().any(|warning| warning.code == code)
    }

    #[test]
    fn decide_type_merges() {
        let int = DataType::builtin(VariantType::Int, TypeSource::AnnotatedInferred);
        let text = DataType::builtin(VariantType::String, TypeSource::AnnotatedInferred);
        let mut block = DataType::default();
        decide_type(&mut block, &int);
        assert!(block.is_builtin(VariantType::Int));
        assert_eq!(block.type_source, TypeSource::Inferred);
        // An inferred block type compares equal to anything and is replaced.
        decide_type(&mut block, &text);
        assert!(block.is_builtin(VariantType::String));
        assert_eq!(block.type_source, TypeSource::Inferred);

        let mut annotated = int.clone();
        decide_type(&mut annotated, &text);
        assert_eq!(annotated.kind, Kind::Variant);
        assert_eq!(annotated.type_source, TypeSource::Undetected);
    }

    #[test]
    fn both_branches_returning_is_a_return() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let condition = b.lit(true);
        let one = b.lit(1);
        let two = b.lit(2);
        let then_block = b.suite_of(|b| vec![b.ret(Some(one))]);
        let else_block = b.suite_of(|b| vec![b.ret(Some(two))]);
        let body = b.suite_of(|b| vec![b.if_(condition, then_block, Some(else_block))]);
        let f = b.function(FuncDecl::new("pick").returns(int).body(body));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert!(script.tree[body].has_return);
        assert!(script.tree[f].data_type.is_builtin(VariantType::Int));
    }

    #[test]
    fn code_after_return_is_unreachable() {
        let mut b = TreeBuilder::new("res://a.os");
        let body = b.suite_of(|b| vec![b.ret(None), b.pass(), b.pass()]);
        b.function(FuncDecl::new("stop").body(body));
        let script = analyze(b);
        let unreachable: Vec<_> = script
            .warnings
            .iter()
            .filter(|warning| warning.code == WarningCode::UnreachableCode)
            .collect();
        assert_eq!(unreachable.len(), 1);
        assert_eq!(unreachable[0].message, r#"Unreachable code (statement after return) in function "stop()"."#);
    }

    #[test]
    fn standalone_expressions_warn() {
        let mut b = TreeBuilder::new("res://a.os");
        let one = b.lit(1);
        let two = b.lit(2);
        let sum = b.binary(BinaryOp::Add, one, two);
        let condition = b.lit(true);
        let x = b.lit(1);
        let y = b.lit(2);
        let ternary = b.ternary(condition, x, y);
        let body = b.suite_of(|b| vec![b.expr_stmt(sum), b.expr_stmt(ternary)]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(has_warning(&script, WarningCode::StandaloneExpression));
        assert!(has_warning(&script, WarningCode::StandaloneTernary));
    }

    #[test]
    fn untyped_function_return_is_inferred_from_returns() {
        let mut b = TreeBuilder::new("res://a.os");
        let text = b.lit("hi");
        let body = b.suite_of(|b| vec![b.ret(Some(text))]);
        let f = b.function(FuncDecl::new("greet").body(body));
        let script = analyze(b);
        let ty = &script.tree[f].data_type;
        assert!(ty.is_builtin(VariantType::String));
        assert!(!ty.is_hard_type());
    }

    #[test]
    fn confusable_declaration_in_nested_block() {
        let mut b = TreeBuilder::new("res://a.os");
        let condition = b.lit(true);
        let one = b.lit(1);
        let two = b.lit(2);
        let inner = b.suite_of(|b| vec![b.local_var(VarDecl::new("_value").init(one))]);
        let body = b.suite_of(|b| {
            vec![
                b.if_(condition, inner, None),
                b.local_var(VarDecl::new("_value").init(two)),
            ]
        });
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        assert!(has_warning(&script, WarningCode::ConfusableLocalDeclaration));
    }
}
