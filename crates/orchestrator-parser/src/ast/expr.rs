//! Expression nodes.
//!
//! Every expression carries the reduction cache written by the analyzer:
//! `reduced` guards re-entry, `is_constant`/`reduced_value` hold the folded
//! value and `data_type` the static type.

use orchestrator_core::{
    ClassRef, ConstantId, DataType, ExprId, FunctionId, LambdaId, NodeRef, ParameterId, PatternId,
    SignalId, Span, SuiteId, TypeNodeId, Variant, VariableId,
};
use rustc_hash::FxHashMap;

use super::ops::{AssignOp, BinaryOp, UnaryOp};

/// Where an identifier's declaration lives.
///
/// Local sources are assigned when the tree is built; member and global
/// sources are assigned by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdentifierSource {
    #[default]
    Undefined,
    FunctionParameter(ParameterId),
    LocalVariable(VariableId),
    LocalConstant(ConstantId),
    /// The iterator of a `for` statement; points at its identifier.
    LocalIterator(ExprId),
    LocalBind(PatternId),
    MemberVariable(NodeRef<VariableId>),
    MemberConstant(NodeRef<ConstantId>),
    MemberFunction(NodeRef<FunctionId>),
    MemberSignal(NodeRef<SignalId>),
    MemberClass(ClassRef),
    StaticVariable(NodeRef<VariableId>),
    /// A member inherited from a native or foreign base.
    InheritedVariable,
    NativeClass,
}

impl IdentifierSource {
    /// Sources that live on the stack of the enclosing function.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            IdentifierSource::FunctionParameter(_)
                | IdentifierSource::LocalVariable(_)
                | IdentifierSource::LocalConstant(_)
                | IdentifierSource::LocalIterator(_)
                | IdentifierSource::LocalBind(_)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdentifierExpr {
    pub name: String,
    /// Suite the identifier was written in.
    pub suite: Option<SuiteId>,
    pub source: IdentifierSource,
    /// Function that declared the local this identifier binds to.
    pub source_function: Option<FunctionId>,
    pub function_source_is_static: bool,
}

impl IdentifierExpr {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// The right side of a subscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptIndex {
    /// `base.name`; the id points at an identifier expression.
    Attribute(ExprId),
    /// `base[index]`.
    Index(ExprId),
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Array(Vec<ExprId>),
    Assignment {
        op: AssignOp,
        assignee: ExprId,
        assigned_value: ExprId,
        use_conversion_assign: bool,
    },
    Await(ExprId),
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Call {
        /// `None` for `super()` calls.
        callee: Option<ExprId>,
        arguments: Vec<ExprId>,
        function_name: String,
        is_super: bool,
        is_static: bool,
    },
    Cast {
        operand: ExprId,
        cast_type: TypeNodeId,
    },
    Dictionary(Vec<(ExprId, ExprId)>),
    /// `$Path` shorthand.
    GetNode {
        full_path: String,
    },
    Identifier(IdentifierExpr),
    Lambda(LambdaId),
    Literal(Variant),
    Preload {
        path: ExprId,
        resolved_path: String,
        resource: Variant,
    },
    SelfRef,
    Subscript {
        base: ExprId,
        index: SubscriptIndex,
    },
    Ternary {
        condition: ExprId,
        true_expr: ExprId,
        false_expr: ExprId,
    },
    TypeTest {
        operand: ExprId,
        test_type: TypeNodeId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
}

impl ExprKind {
    /// Node name used by diagnostics and tracing.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExprKind::Array(_) => "array",
            ExprKind::Assignment { .. } => "assignment",
            ExprKind::Await(_) => "await",
            ExprKind::Binary { .. } => "binary operator",
            ExprKind::Call { .. } => "call",
            ExprKind::Cast { .. } => "cast",
            ExprKind::Dictionary(_) => "dictionary",
            ExprKind::GetNode { .. } => "get node",
            ExprKind::Identifier(_) => "identifier",
            ExprKind::Lambda(_) => "lambda",
            ExprKind::Literal(_) => "literal",
            ExprKind::Preload { .. } => "preload",
            ExprKind::SelfRef => "self",
            ExprKind::Subscript { .. } => "subscript",
            ExprKind::Ternary { .. } => "ternary operator",
            ExprKind::TypeTest { .. } => "type test",
            ExprKind::Unary { .. } => "unary operator",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub span: Span,
    pub reduced: bool,
    pub is_constant: bool,
    pub reduced_value: Variant,
    pub data_type: DataType,
}

impl ExprNode {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            reduced: false,
            is_constant: false,
            reduced_value: Variant::Nil,
            data_type: DataType::default(),
        }
    }

    pub fn identifier(&self) -> Option<&IdentifierExpr> {
        match &self.kind {
            ExprKind::Identifier(identifier) => Some(identifier),
            _ => None,
        }
    }

    pub fn identifier_mut(&mut self) -> Option<&mut IdentifierExpr> {
        match &mut self.kind {
            ExprKind::Identifier(identifier) => Some(identifier),
            _ => None,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, ExprKind::Identifier(_))
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. })
    }
}

/// A lambda expression.
///
/// `captures` lists identifiers of enclosing locals referenced in the body,
/// in first-use order and de-duplicated by name.
#[derive(Debug, Clone)]
pub struct LambdaNode {
    pub function: FunctionId,
    pub parent_function: Option<FunctionId>,
    pub parent_lambda: Option<LambdaId>,
    pub captures: Vec<ExprId>,
    pub captures_indices: FxHashMap<String, usize>,
    pub use_self: bool,
}

impl LambdaNode {
    pub fn new(function: FunctionId) -> Self {
        Self {
            function,
            parent_function: None,
            parent_lambda: None,
            captures: Vec::new(),
            captures_indices: FxHashMap::default(),
            use_self: false,
        }
    }

    pub fn has_capture(&self, name: &str) -> bool {
        self.captures_indices.contains_key(name)
    }

    /// Record a capture; the first identifier with a name wins.
    pub fn add_capture(&mut self, name: &str, identifier: ExprId) {
        if !self.captures_indices.contains_key(name) {
            self.captures_indices.insert(name.to_string(), self.captures.len());
            self.captures.push(identifier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_deduplicate_by_name() {
        let mut lambda = LambdaNode::new(FunctionId::new(0));
        lambda.add_capture("x", ExprId::new(1));
        lambda.add_capture("y", ExprId::new(2));
        lambda.add_capture("x", ExprId::new(3));
        assert_eq!(lambda.captures, vec![ExprId::new(1), ExprId::new(2)]);
        assert!(lambda.has_capture("y"));
    }

    #[test]
    fn local_sources() {
        assert!(IdentifierSource::LocalVariable(VariableId::new(0)).is_local());
        assert!(!IdentifierSource::NativeClass.is_local());
        assert!(!IdentifierSource::Undefined.is_local());
    }

    #[test]
    fn new_expression_is_unreduced() {
        let node = ExprNode::new(ExprKind::Literal(Variant::Int(1)), Span::default());
        assert!(!node.reduced);
        assert!(!node.data_type.is_set());
        assert_eq!(node.kind.kind_name(), "literal");
    }
}
