//! Statements, suites and match patterns.

use orchestrator_core::{
    ConstantId, DataType, ExprId, FunctionId, ParameterId, PatternId, Span, StmtId, SuiteId, TypeNodeId,
    VariableId,
};
use rustc_hash::FxHashMap;

use super::types::Ident;

#[derive(Debug, Clone)]
pub struct MatchBranch {
    pub patterns: Vec<PatternId>,
    pub block: SuiteId,
    pub guard: Option<ExprId>,
    pub has_wildcard: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expression(ExprId),
    Variable(VariableId),
    Constant(ConstantId),
    If {
        condition: ExprId,
        true_block: SuiteId,
        false_block: Option<SuiteId>,
    },
    For {
        /// Identifier expression naming the iterator; its type is the
        /// iterator type.
        variable: ExprId,
        datatype_specifier: Option<TypeNodeId>,
        use_conversion_assign: bool,
        list: ExprId,
        body: SuiteId,
    },
    While {
        condition: ExprId,
        body: SuiteId,
    },
    Match {
        test: ExprId,
        branches: Vec<MatchBranch>,
    },
    Return {
        value: Option<ExprId>,
        /// The returned value is a call to a void function.
        void_return: bool,
    },
    Assert {
        condition: ExprId,
        message: Option<ExprId>,
    },
    Pass,
    Break,
    Continue,
    Breakpoint,
}

#[derive(Debug, Clone)]
pub struct StmtNode {
    pub kind: StmtKind,
    pub span: Span,
    pub data_type: DataType,
}

impl StmtNode {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self {
            kind,
            span,
            data_type: DataType::default(),
        }
    }
}

// ============================================================================
// Suites
// ============================================================================

/// What a suite-level local refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalKind {
    Constant(ConstantId),
    Variable(VariableId),
    Parameter(ParameterId),
    /// The identifier expression of a `for` iterator.
    ForVariable(ExprId),
    PatternBind(PatternId),
}

impl LocalKind {
    /// Kind name used by shadowing diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            LocalKind::Constant(_) => "constant",
            LocalKind::Variable(_) => "variable",
            LocalKind::Parameter(_) => "parameter",
            LocalKind::ForVariable(_) => "for loop iterator",
            LocalKind::PatternBind(_) => "pattern bind",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
    pub kind: LocalKind,
    pub name: String,
    pub span: Span,
    pub source_function: Option<FunctionId>,
}

#[derive(Debug, Clone, Default)]
pub struct SuiteNode {
    pub statements: Vec<StmtId>,
    pub parent_block: Option<SuiteId>,
    pub parent_function: Option<FunctionId>,
    pub locals: Vec<Local>,
    pub locals_indices: FxHashMap<String, usize>,
    pub has_return: bool,
    pub has_continue: bool,
    pub has_unreachable_code: bool,
    pub is_in_loop: bool,
    pub data_type: DataType,
    pub span: Span,
}

impl SuiteNode {
    pub fn has_local(&self, name: &str) -> bool {
        self.locals_indices.contains_key(name)
    }

    pub fn get_local(&self, name: &str) -> Option<&Local> {
        self.locals_indices.get(name).map(|&index| &self.locals[index])
    }

    pub fn add_local(&mut self, local: Local) {
        self.locals_indices.insert(local.name.clone(), self.locals.len());
        self.locals.push(local);
    }
}

// ============================================================================
// Patterns
// ============================================================================

#[derive(Debug, Clone)]
pub enum PatternKind {
    Literal(ExprId),
    Expression(ExprId),
    Bind(Ident),
    Array(Vec<PatternId>),
    /// Key and optional sub-pattern; a `None` key is the rest pattern `..`.
    Dictionary(Vec<(Option<ExprId>, Option<PatternId>)>),
    Rest,
    Wildcard,
}

#[derive(Debug, Clone)]
pub struct PatternNode {
    pub kind: PatternKind,
    pub span: Span,
    pub data_type: DataType,
    /// Bind names introduced by this pattern and its sub-patterns.
    pub binds: FxHashMap<String, PatternId>,
}

impl PatternNode {
    pub fn new(kind: PatternKind, span: Span) -> Self {
        Self {
            kind,
            span,
            data_type: DataType::default(),
            binds: FxHashMap::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_locals() {
        let mut suite = SuiteNode::default();
        suite.add_local(Local {
            kind: LocalKind::Variable(VariableId::new(3)),
            name: "count".into(),
            span: Span::default(),
            source_function: None,
        });
        assert!(suite.has_local("count"));
        assert_eq!(suite.get_local("count").map(|l| l.kind.type_name()), Some("variable"));
        assert!(suite.get_local("other").is_none());
    }
}
