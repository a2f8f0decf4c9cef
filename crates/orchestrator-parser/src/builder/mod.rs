//! Programmatic construction of script trees.
//!
//! Orchestrations are authored as graphs, so trees are produced by walking the
//! graph and calling [`TreeBuilder`] rather than by parsing text. The builder
//! creates every node with a fresh line span and, when finished, binds local
//! identifiers to their declarations.
//!
//! # Example
//!
//! ```ignore
//! let mut b = TreeBuilder::new("res://player.os");
//! b.class_name("Player").extends(&["Node"]);
//! let x = b.ident("x");
//! let body = b.suite_of(|b| vec![b.ret(Some(x))]);
//! let int = b.ty("int");
//! b.function(FuncDecl::new("f").param(ParamDecl::new("x").typed(int)).returns(int).body(body));
//! let parser = b.build();
//! ```

mod binder;
mod decls;
mod scope;

pub use decls::{AccessorDecl, BranchDecl, FuncDecl, ParamDecl, VarDecl};
pub use scope::{LocalScope, Redeclaration};

use orchestrator_core::{
    AnnotationId, ClassId, ConstantId, Diagnostic, EnumId, ExprId, FunctionId, ParameterId, PatternId,
    SignalId, Span, StmtId, SuiteId, TypeNodeId, Variant, VariableId,
};

use crate::annotation::AnnotationNode;
use crate::ast::{
    AssignOp, Assignable, BinaryOp, ClassNode, ConstantNode, EnumNode, EnumValue, ExprKind, ExprNode,
    FunctionNode, Ident, IdentifierExpr, LambdaNode, MatchBranch, Member, ParameterNode, PatternKind,
    PatternNode, PropertyStyle, SignalNode, StmtKind, StmtNode, SubscriptIndex, SuiteNode, Tree, TypeNode,
    UnaryOp, VariableNode,
};
use crate::parser::ScriptParser;

use binder::Binder;

pub struct TreeBuilder {
    path: String,
    tree: Tree,
    /// Classes being declared, innermost last. Never empty.
    class_stack: Vec<ClassId>,
    next_line: u32,
    next_group: u32,
}

impl TreeBuilder {
    /// Start a script whose head class is identified by `path`.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let mut tree = Tree::default();
        let head = tree.add_class(ClassNode {
            fqcn: path.clone(),
            span: Span::line(1),
            ..Default::default()
        });
        Self {
            path,
            tree,
            class_stack: vec![head],
            next_line: 1,
            next_group: 0,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The class members are currently added to.
    pub fn current_class(&self) -> ClassId {
        self.class_stack.last().copied().unwrap_or(Tree::HEAD)
    }

    fn span(&mut self) -> Span {
        self.next_line += 1;
        Span::line(self.next_line)
    }

    fn name(&mut self, name: impl Into<String>) -> Ident {
        let span = self.span();
        Ident::new(name, span)
    }

    fn class_mut(&mut self) -> &mut ClassNode {
        let class = self.current_class();
        &mut self.tree[class]
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// Register the script under a global class name.
    pub fn class_name(&mut self, name: &str) -> &mut Self {
        let ident = self.name(name);
        self.tree[Tree::HEAD].identifier = Some(ident);
        self
    }

    /// `extends A.B.C` on the current class.
    pub fn extends(&mut self, chain: &[&str]) -> &mut Self {
        let chain: Vec<_> = chain.iter().map(|segment| self.name(*segment)).collect();
        let class = self.class_mut();
        class.extends = chain;
        class.extends_used = true;
        self
    }

    /// `extends "res://..."`, optionally followed by a subclass chain.
    pub fn extends_path(&mut self, path: &str) -> &mut Self {
        let class = self.class_mut();
        class.extends_path = Some(path.to_string());
        class.extends_used = true;
        self
    }

    pub fn abstract_class(&mut self) -> &mut Self {
        self.class_mut().is_abstract = true;
        self
    }

    /// Open a nested class; members go to it until [`end_class`](Self::end_class).
    pub fn begin_class(&mut self, name: &str) -> ClassId {
        let outer = self.current_class();
        let ident = self.name(name);
        let fqcn = format!("{}::{}", self.tree[outer].fqcn, name);
        let span = ident.span;
        let class = self.tree.add_class(ClassNode {
            identifier: Some(ident),
            fqcn,
            outer: Some(outer),
            span,
            ..Default::default()
        });
        self.tree[outer].add_member(Some(name), Member::Class(class));
        self.class_stack.push(class);
        class
    }

    pub fn end_class(&mut self) -> &mut Self {
        if self.class_stack.len() > 1 {
            self.class_stack.pop();
        }
        self
    }

    fn annotation(&mut self, name: String, arguments: Vec<ExprId>) -> AnnotationId {
        let span = self.span();
        let mut node = AnnotationNode::new(name, span);
        node.arguments = arguments;
        self.tree.add_annotation(node)
    }

    /// Attach an annotation to the current class.
    pub fn annotate_class(&mut self, name: &str, arguments: Vec<ExprId>) -> AnnotationId {
        let annotation = self.annotation(name.to_string(), arguments);
        self.class_mut().annotations.push(annotation);
        annotation
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn assignable(&mut self, name: String, datatype: Option<TypeNodeId>, initializer: Option<ExprId>, infer: bool) -> Assignable {
        let mut decl = Assignable::new(self.name(name));
        decl.datatype_specifier = datatype;
        decl.initializer = initializer;
        decl.infer_datatype = infer;
        decl
    }

    fn variable_node(&mut self, decl: VarDecl) -> VariableNode {
        let VarDecl {
            name,
            datatype,
            initializer,
            infer,
            is_static,
            onready,
            accessors,
            annotations,
        } = decl;

        let mut node = VariableNode {
            decl: self.assignable(name, datatype, initializer, infer),
            is_static,
            onready,
            ..Default::default()
        };
        node.assignments = u32::from(initializer.is_some());
        node.style = match accessors {
            AccessorDecl::None => PropertyStyle::None,
            AccessorDecl::Inline { getter, setter } => PropertyStyle::Inline {
                getter: getter.map(|getter| self.function_node(*getter)),
                setter: setter.map(|setter| self.function_node(*setter)),
            },
            AccessorDecl::SetGet { getter, setter } => PropertyStyle::SetGet {
                getter: getter.map(|name| self.name(name)),
                setter: setter.map(|name| self.name(name)),
            },
        };
        node.annotations = annotations
            .into_iter()
            .map(|(name, arguments)| self.annotation(name, arguments))
            .collect();
        node
    }

    /// A member variable of the current class.
    pub fn variable(&mut self, decl: VarDecl) -> VariableId {
        let node = self.variable_node(decl);
        let name = node.decl.identifier.name.clone();
        let (is_static, onready) = (node.is_static, node.onready);
        let id = self.tree.add_variable(node);
        let class = self.class_mut();
        class.has_static_data |= is_static;
        class.onready_used |= onready;
        class.add_member(Some(&name), Member::Variable(id));
        id
    }

    /// A member constant of the current class.
    pub fn constant(&mut self, decl: VarDecl) -> ConstantId {
        let name = decl.name.clone();
        let node = ConstantNode {
            decl: self.assignable(decl.name, decl.datatype, decl.initializer, decl.infer),
        };
        let id = self.tree.add_constant(node);
        self.class_mut().add_member(Some(&name), Member::Constant(id));
        id
    }

    fn parameter(&mut self, parameter: ParamDecl) -> ParameterId {
        let decl = self.assignable(parameter.name, parameter.datatype, parameter.default, parameter.infer);
        self.tree.add_parameter(ParameterNode { decl })
    }

    pub fn signal(&mut self, name: &str, parameters: Vec<ParamDecl>) -> SignalId {
        let identifier = self.name(name);
        let span = identifier.span;
        let mut node = SignalNode {
            identifier,
            span,
            ..Default::default()
        };
        for parameter in parameters {
            let parameter_name = parameter.name.clone();
            let id = self.parameter(parameter);
            node.parameters_indices.insert(parameter_name, node.parameters.len());
            node.parameters.push(id);
        }
        let id = self.tree.add_signal(node);
        self.class_mut().add_member(Some(name), Member::Signal(id));
        id
    }

    /// An enum. Values of an unnamed enum become members of the class.
    pub fn enumeration(&mut self, name: Option<&str>, values: &[(&str, Option<ExprId>)]) -> EnumId {
        let identifier = name.map(|name| self.name(name));
        let span = identifier.as_ref().map_or_else(|| self.span(), |ident| ident.span);
        let id = EnumId::from(self.tree.enums.len());
        let values: Vec<EnumValue> = values
            .iter()
            .enumerate()
            .map(|(index, (value_name, custom_value))| EnumValue {
                identifier: self.name(*value_name),
                custom_value: *custom_value,
                parent_enum: Some(id),
                index,
                ..Default::default()
            })
            .collect();
        let value_names: Vec<String> = values.iter().map(|value| value.identifier.name.clone()).collect();
        let added = self.tree.add_enum(EnumNode {
            identifier,
            values,
            span,
            ..Default::default()
        });
        debug_assert_eq!(added, id);

        let class = self.class_mut();
        match name {
            Some(name) => class.add_member(Some(name), Member::Enum(id)),
            None => {
                for (index, value_name) in value_names.iter().enumerate() {
                    class.add_member(Some(value_name), Member::EnumValue(id, index));
                }
            }
        }
        id
    }

    fn function_node(&mut self, decl: FuncDecl) -> FunctionId {
        let FuncDecl {
            name,
            parameters,
            rest,
            return_type,
            body,
            is_static,
            is_abstract,
            annotations,
        } = decl;

        let identifier = (!name.is_empty()).then(|| self.name(name));
        let span = identifier.as_ref().map_or_else(|| self.span(), |ident| ident.span);
        let mut node = FunctionNode {
            identifier,
            return_type,
            body,
            is_static,
            is_abstract,
            span,
            ..Default::default()
        };
        node.info.name = node.name().to_string();
        for parameter in parameters {
            let parameter_name = parameter.name.clone();
            let id = self.parameter(parameter);
            node.parameters_indices.insert(parameter_name, node.parameters.len());
            node.parameters.push(id);
        }
        node.rest_parameter = rest.map(|rest| self.parameter(rest));
        node.annotations = annotations
            .into_iter()
            .map(|(name, arguments)| self.annotation(name, arguments))
            .collect();
        self.tree.add_function(node)
    }

    /// A member function of the current class.
    pub fn function(&mut self, decl: FuncDecl) -> FunctionId {
        let name = decl.name.clone();
        let id = self.function_node(decl);
        self.class_mut().add_member(Some(&name), Member::Function(id));
        id
    }

    /// An editor grouping marker.
    pub fn group(&mut self) -> &mut Self {
        let group = self.next_group;
        self.next_group += 1;
        self.class_mut().add_member(None, Member::Group(group));
        self
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// A type written as a dotted chain, e.g. `int` or `Node.ProcessMode`.
    pub fn ty(&mut self, name: &str) -> TypeNodeId {
        self.ty_container(name, Vec::new())
    }

    /// A container type such as `Array[int]` or `Dictionary[String, int]`.
    pub fn ty_container(&mut self, name: &str, container_types: Vec<TypeNodeId>) -> TypeNodeId {
        let span = self.span();
        // `void` is the empty chain.
        let type_chain = match name {
            "void" => Vec::new(),
            _ => name.split('.').map(|segment| Ident::new(segment, span)).collect(),
        };
        self.tree.add_type(TypeNode {
            type_chain,
            container_types,
            span,
            ..Default::default()
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expr(&mut self, kind: ExprKind) -> ExprId {
        let span = self.span();
        self.tree.add_expr(ExprNode::new(kind, span))
    }

    pub fn lit(&mut self, value: impl Into<Variant>) -> ExprId {
        self.expr(ExprKind::Literal(value.into()))
    }

    pub fn null(&mut self) -> ExprId {
        self.expr(ExprKind::Literal(Variant::Nil))
    }

    pub fn ident(&mut self, name: &str) -> ExprId {
        self.expr(ExprKind::Identifier(IdentifierExpr::new(name)))
    }

    pub fn self_(&mut self) -> ExprId {
        self.expr(ExprKind::SelfRef)
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.expr(ExprKind::Binary { op, left, right })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary { op, operand })
    }

    /// `name(args)`: a builtin constructor, utility, global class or own method.
    pub fn call(&mut self, name: &str, arguments: Vec<ExprId>) -> ExprId {
        let callee = self.ident(name);
        self.expr(ExprKind::Call {
            callee: Some(callee),
            arguments,
            function_name: name.to_string(),
            is_super: false,
            is_static: false,
        })
    }

    /// `base.name(args)`.
    pub fn method_call(&mut self, base: ExprId, name: &str, arguments: Vec<ExprId>) -> ExprId {
        let callee = self.attribute(base, name);
        self.expr(ExprKind::Call {
            callee: Some(callee),
            arguments,
            function_name: name.to_string(),
            is_super: false,
            is_static: false,
        })
    }

    /// `super.name(args)`, or `super(args)` when `name` is empty.
    pub fn super_call(&mut self, name: &str, arguments: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Call {
            callee: None,
            arguments,
            function_name: name.to_string(),
            is_super: true,
            is_static: false,
        })
    }

    /// `base.name`.
    pub fn attribute(&mut self, base: ExprId, name: &str) -> ExprId {
        let attribute = self.ident(name);
        self.expr(ExprKind::Subscript {
            base,
            index: SubscriptIndex::Attribute(attribute),
        })
    }

    /// `base[index]`.
    pub fn index(&mut self, base: ExprId, index: ExprId) -> ExprId {
        self.expr(ExprKind::Subscript {
            base,
            index: SubscriptIndex::Index(index),
        })
    }

    pub fn array(&mut self, elements: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Array(elements))
    }

    pub fn dictionary(&mut self, pairs: Vec<(ExprId, ExprId)>) -> ExprId {
        self.expr(ExprKind::Dictionary(pairs))
    }

    /// `operand as cast_type`.
    pub fn cast(&mut self, operand: ExprId, cast_type: TypeNodeId) -> ExprId {
        self.expr(ExprKind::Cast { operand, cast_type })
    }

    /// `operand is test_type`.
    pub fn is_type(&mut self, operand: ExprId, test_type: TypeNodeId) -> ExprId {
        self.expr(ExprKind::TypeTest { operand, test_type })
    }

    pub fn ternary(&mut self, condition: ExprId, true_expr: ExprId, false_expr: ExprId) -> ExprId {
        self.expr(ExprKind::Ternary {
            condition,
            true_expr,
            false_expr,
        })
    }

    pub fn await_(&mut self, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Await(operand))
    }

    /// `preload("path")`.
    pub fn preload(&mut self, path: &str) -> ExprId {
        let path = self.lit(path);
        self.expr(ExprKind::Preload {
            path,
            resolved_path: String::new(),
            resource: Variant::Nil,
        })
    }

    /// `$Path`.
    pub fn get_node(&mut self, full_path: &str) -> ExprId {
        self.expr(ExprKind::GetNode {
            full_path: full_path.to_string(),
        })
    }

    pub fn assign(&mut self, assignee: ExprId, assigned_value: ExprId) -> ExprId {
        self.assign_op(AssignOp::Assign, assignee, assigned_value)
    }

    pub fn assign_op(&mut self, op: AssignOp, assignee: ExprId, assigned_value: ExprId) -> ExprId {
        self.expr(ExprKind::Assignment {
            op,
            assignee,
            assigned_value,
            use_conversion_assign: false,
        })
    }

    /// A lambda expression. The function is not a member of any class.
    pub fn lambda(&mut self, decl: FuncDecl) -> ExprId {
        let function = self.function_node(decl);
        let lambda = self.tree.add_lambda(LambdaNode::new(function));
        self.tree[function].source_lambda = Some(lambda);
        self.expr(ExprKind::Lambda(lambda))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn stmt(&mut self, kind: StmtKind) -> StmtId {
        let span = self.span();
        self.tree.add_stmt(StmtNode::new(kind, span))
    }

    pub fn suite(&mut self, statements: Vec<StmtId>) -> SuiteId {
        let span = self.span();
        self.tree.add_suite(SuiteNode {
            statements,
            span,
            ..Default::default()
        })
    }

    /// Build the statements with the closure, then wrap them in a suite.
    pub fn suite_of(&mut self, statements: impl FnOnce(&mut Self) -> Vec<StmtId>) -> SuiteId {
        let statements = statements(self);
        self.suite(statements)
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expression(expr))
    }

    pub fn local_var(&mut self, decl: VarDecl) -> StmtId {
        let node = self.variable_node(decl);
        let id = self.tree.add_variable(node);
        self.stmt(StmtKind::Variable(id))
    }

    pub fn local_const(&mut self, decl: VarDecl) -> StmtId {
        let node = ConstantNode {
            decl: self.assignable(decl.name, decl.datatype, decl.initializer, decl.infer),
        };
        let id = self.tree.add_constant(node);
        self.stmt(StmtKind::Constant(id))
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Return {
            value,
            void_return: false,
        })
    }

    pub fn if_(&mut self, condition: ExprId, true_block: SuiteId, false_block: Option<SuiteId>) -> StmtId {
        self.stmt(StmtKind::If {
            condition,
            true_block,
            false_block,
        })
    }

    pub fn while_(&mut self, condition: ExprId, body: SuiteId) -> StmtId {
        self.stmt(StmtKind::While { condition, body })
    }

    /// `for variable in list:`.
    pub fn for_(&mut self, variable: &str, list: ExprId, body: SuiteId) -> StmtId {
        self.for_typed(variable, None, list, body)
    }

    /// `for variable: datatype in list:`.
    pub fn for_typed(&mut self, variable: &str, datatype: Option<TypeNodeId>, list: ExprId, body: SuiteId) -> StmtId {
        let variable = self.ident(variable);
        self.stmt(StmtKind::For {
            variable,
            datatype_specifier: datatype,
            use_conversion_assign: false,
            list,
            body,
        })
    }

    pub fn match_(&mut self, test: ExprId, branches: Vec<BranchDecl>) -> StmtId {
        let branches = branches
            .into_iter()
            .map(|branch| {
                let has_wildcard = branch
                    .patterns
                    .iter()
                    .any(|pattern| matches!(self.tree[*pattern].kind, PatternKind::Wildcard));
                MatchBranch {
                    patterns: branch.patterns,
                    block: branch.block,
                    guard: branch.guard,
                    has_wildcard,
                    span: self.tree[branch.block].span,
                }
            })
            .collect();
        self.stmt(StmtKind::Match { test, branches })
    }

    pub fn assert_(&mut self, condition: ExprId, message: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Assert { condition, message })
    }

    pub fn pass(&mut self) -> StmtId {
        self.stmt(StmtKind::Pass)
    }

    pub fn break_(&mut self) -> StmtId {
        self.stmt(StmtKind::Break)
    }

    pub fn continue_(&mut self) -> StmtId {
        self.stmt(StmtKind::Continue)
    }

    pub fn breakpoint(&mut self) -> StmtId {
        self.stmt(StmtKind::Breakpoint)
    }

    // ========================================================================
    // Patterns
    // ========================================================================

    fn pattern(&mut self, kind: PatternKind) -> PatternId {
        let span = self.span();
        self.tree.add_pattern(PatternNode::new(kind, span))
    }

    pub fn pat_literal(&mut self, literal: ExprId) -> PatternId {
        self.pattern(PatternKind::Literal(literal))
    }

    pub fn pat_expr(&mut self, expr: ExprId) -> PatternId {
        self.pattern(PatternKind::Expression(expr))
    }

    /// `var name` inside a pattern.
    pub fn pat_bind(&mut self, name: &str) -> PatternId {
        let ident = self.name(name);
        self.pattern(PatternKind::Bind(ident))
    }

    pub fn pat_array(&mut self, elements: Vec<PatternId>) -> PatternId {
        self.pattern(PatternKind::Array(elements))
    }

    pub fn pat_dict(&mut self, entries: Vec<(Option<ExprId>, Option<PatternId>)>) -> PatternId {
        self.pattern(PatternKind::Dictionary(entries))
    }

    /// `..`.
    pub fn pat_rest(&mut self) -> PatternId {
        self.pattern(PatternKind::Rest)
    }

    /// `_`.
    pub fn pat_wildcard(&mut self) -> PatternId {
        self.pattern(PatternKind::Wildcard)
    }

    // ========================================================================
    // Finishing
    // ========================================================================

    /// Bind locals and return the tree with any redeclaration errors.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn finish(mut self) -> (Tree, Vec<Diagnostic>) {
        let errors = Binder::new(&mut self.tree).bind();
        tracing::trace!(path = %self.path, errors = errors.len(), "tree built");
        (self.tree, errors)
    }

    /// Bind locals and wrap the tree in a parser.
    pub fn build(self) -> ScriptParser {
        let path = self.path.clone();
        let (tree, errors) = self.finish();
        let mut parser = ScriptParser::new(path, tree);
        parser.errors = errors;
        parser
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::IdentifierSource;

    fn ident_source(tree: &Tree, expr: ExprId) -> IdentifierSource {
        tree.identifier(expr).map(|identifier| identifier.source).unwrap_or_default()
    }

    #[test]
    fn head_class_and_members() {
        let mut b = TreeBuilder::new("res://player.os");
        b.class_name("Player").extends(&["Node"]);
        let speed = b.lit(4);
        b.variable(VarDecl::new("speed").inferred(speed));
        b.signal("died", vec![ParamDecl::new("cause")]);
        b.group();
        let (tree, errors) = b.finish();

        assert!(errors.is_empty());
        let head = tree.head();
        assert_eq!(head.fqcn, "res://player.os");
        assert_eq!(head.name(), "Player");
        assert_eq!(head.extends.len(), 1);
        assert_eq!(head.members.len(), 3);
        assert!(head.has_member("speed"));
        assert!(matches!(head.get_member("died"), Some(Member::Signal(_))));
    }

    #[test]
    fn nested_class_fqcn() {
        let mut b = TreeBuilder::new("res://a.os");
        let inner = b.begin_class("Inner");
        let value = b.lit(1);
        b.constant(VarDecl::new("K").init(value));
        b.end_class();
        let (tree, _) = b.finish();

        assert_eq!(tree[inner].fqcn, "res://a.os::Inner");
        assert_eq!(tree[inner].outer, Some(Tree::HEAD));
        assert!(tree[inner].has_member("K"));
        assert!(!tree.head().has_member("K"));
        assert_eq!(tree.find_class("res://a.os::Inner"), Some(inner));
    }

    #[test]
    fn unnamed_enum_values_are_members() {
        let mut b = TreeBuilder::new("res://a.os");
        b.enumeration(None, &[("A", None), ("B", None)]);
        let named = b.enumeration(Some("Mode"), &[("X", None)]);
        let (tree, _) = b.finish();

        assert!(matches!(tree.head().get_member("B"), Some(Member::EnumValue(_, 1))));
        assert!(matches!(tree.head().get_member("Mode"), Some(Member::Enum(id)) if id == named));
        assert!(!tree.head().has_member("X"));
        assert_eq!(tree[named].values[0].parent_enum, Some(named));
    }

    #[test]
    fn parameters_bind_in_body() {
        let mut b = TreeBuilder::new("res://a.os");
        let x = b.ident("x");
        let y = b.ident("y");
        let body = b.suite_of(|b| {
            let sum = b.binary(BinaryOp::Add, x, y);
            vec![b.ret(Some(sum))]
        });
        let f = b.function(FuncDecl::new("f").param(ParamDecl::new("x")).body(body));
        let (tree, errors) = b.finish();

        assert!(errors.is_empty());
        let param = tree[f].parameters[0];
        assert_eq!(ident_source(&tree, x), IdentifierSource::FunctionParameter(param));
        assert_eq!(ident_source(&tree, y), IdentifierSource::Undefined);
        assert_eq!(tree[param].decl.usages, 1);
        assert_eq!(tree.identifier(x).and_then(|i| i.source_function), Some(f));
        assert!(tree[body].has_local("x"));
        assert_eq!(tree[body].parent_function, Some(f));
    }

    #[test]
    fn locals_are_visible_after_declaration() {
        let mut b = TreeBuilder::new("res://a.os");
        let early = b.ident("v");
        let late = b.ident("v");
        let body = b.suite_of(|b| {
            let first = b.expr_stmt(early);
            let one = b.lit(1);
            let decl = b.local_var(VarDecl::new("v").init(one));
            let second = b.expr_stmt(late);
            vec![first, decl, second]
        });
        b.function(FuncDecl::new("f").body(body));
        let (tree, _) = b.finish();

        assert_eq!(ident_source(&tree, early), IdentifierSource::Undefined);
        assert!(matches!(ident_source(&tree, late), IdentifierSource::LocalVariable(_)));
    }

    #[test]
    fn redeclaration_in_same_block_is_an_error() {
        let mut b = TreeBuilder::new("res://a.os");
        let body = b.suite_of(|b| vec![b.local_var(VarDecl::new("v")), b.local_var(VarDecl::new("v"))]);
        b.function(FuncDecl::new("f").body(body));
        let (_, errors) = b.finish();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, r#"There is already a variable named "v" declared in this scope."#);
    }

    #[test]
    fn nested_block_shadowing_is_allowed() {
        let mut b = TreeBuilder::new("res://a.os");
        let inner = b.suite_of(|b| vec![b.local_var(VarDecl::new("v"))]);
        let body = b.suite_of(|b| {
            let decl = b.local_var(VarDecl::new("v"));
            let cond = b.lit(true);
            vec![decl, b.if_(cond, inner, None)]
        });
        b.function(FuncDecl::new("f").body(body));
        let (tree, errors) = b.finish();

        assert!(errors.is_empty());
        assert_eq!(tree[inner].parent_block, Some(body));
    }

    #[test]
    fn for_iterator_and_loop_flag() {
        let mut b = TreeBuilder::new("res://a.os");
        let use_i = b.ident("i");
        let loop_body = b.suite_of(|b| vec![b.expr_stmt(use_i)]);
        let body = b.suite_of(|b| {
            let list = b.array(vec![]);
            vec![b.for_("i", list, loop_body)]
        });
        b.function(FuncDecl::new("f").body(body));
        let (tree, _) = b.finish();

        assert!(matches!(ident_source(&tree, use_i), IdentifierSource::LocalIterator(_)));
        assert!(tree[loop_body].is_in_loop);
        assert!(!tree[body].is_in_loop);
    }

    #[test]
    fn match_binds_are_visible_in_branch() {
        let mut b = TreeBuilder::new("res://a.os");
        let use_bound = b.ident("n");
        let block = b.suite_of(|b| vec![b.expr_stmt(use_bound)]);
        let bind = b.pat_bind("n");
        let array = b.pat_array(vec![bind]);
        let body = b.suite_of(|b| {
            let test = b.array(vec![]);
            vec![b.match_(test, vec![BranchDecl::new(vec![array], block)])]
        });
        b.function(FuncDecl::new("f").body(body));
        let (tree, _) = b.finish();

        assert_eq!(ident_source(&tree, use_bound), IdentifierSource::LocalBind(bind));
        assert!(tree[array].binds.contains_key("n"));
    }

    #[test]
    fn lambdas_see_enclosing_locals_and_mark_coroutines() {
        let mut b = TreeBuilder::new("res://a.os");
        let captured = b.ident("outer");
        let awaited = b.ident("sig");
        let lambda_body = b.suite_of(|b| {
            let wait = b.await_(awaited);
            vec![b.expr_stmt(wait), b.expr_stmt(captured)]
        });
        let lambda = b.lambda(FuncDecl::new("").body(lambda_body));
        let body = b.suite_of(|b| {
            let zero = b.lit(0);
            vec![b.local_var(VarDecl::new("outer").init(zero)), b.expr_stmt(lambda)]
        });
        let f = b.function(FuncDecl::new("f").body(body));
        let (tree, _) = b.finish();

        let ExprKind::Lambda(lambda_id) = tree[lambda].kind else {
            panic!("expected a lambda");
        };
        let lambda_fn = tree[lambda_id].function;
        assert_eq!(tree[lambda_id].parent_function, Some(f));
        assert!(tree[lambda_fn].is_coroutine);
        assert!(!tree[f].is_coroutine);
        assert!(matches!(ident_source(&tree, captured), IdentifierSource::LocalVariable(_)));
        assert_eq!(tree.identifier(captured).and_then(|i| i.source_function), Some(f));
        assert!(!tree.head().has_member(""));
    }

    #[test]
    fn build_carries_errors_into_parser() {
        let mut b = TreeBuilder::new("res://a.os");
        let body = b.suite_of(|b| vec![b.local_const(VarDecl::new("c")), b.local_var(VarDecl::new("c"))]);
        b.function(FuncDecl::new("f").body(body));
        let parser = b.build();
        assert_eq!(parser.error_count(), 1);
        assert!(parser.errors[0].message.contains("constant"));
    }
}
