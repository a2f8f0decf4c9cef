//! Declaration descriptions consumed by [`TreeBuilder`](super::TreeBuilder).
//!
//! These are plain values: a description is filled with chained setters and
//! handed to the builder, which creates the nodes.

use orchestrator_core::{ExprId, PatternId, SuiteId, TypeNodeId};

/// Accessors of a member variable.
#[derive(Debug, Clone, Default)]
pub enum AccessorDecl {
    #[default]
    None,
    /// `get:` / `set(value):` blocks.
    Inline {
        getter: Option<Box<FuncDecl>>,
        setter: Option<Box<FuncDecl>>,
    },
    /// `set = name, get = name`.
    SetGet {
        getter: Option<String>,
        setter: Option<String>,
    },
}

/// A variable or constant declaration.
#[derive(Debug, Clone, Default)]
pub struct VarDecl {
    pub name: String,
    pub datatype: Option<TypeNodeId>,
    pub initializer: Option<ExprId>,
    pub infer: bool,
    pub is_static: bool,
    pub onready: bool,
    pub accessors: AccessorDecl,
    pub annotations: Vec<(String, Vec<ExprId>)>,
}

impl VarDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn typed(mut self, datatype: TypeNodeId) -> Self {
        self.datatype = Some(datatype);
        self
    }

    pub fn init(mut self, initializer: ExprId) -> Self {
        self.initializer = Some(initializer);
        self
    }

    /// Declared with `:=`.
    pub fn inferred(mut self, initializer: ExprId) -> Self {
        self.initializer = Some(initializer);
        self.infer = true;
        self
    }

    pub fn statik(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn onready(mut self) -> Self {
        self.onready = true;
        self
    }

    pub fn exported(self) -> Self {
        self.annotate("@export", Vec::new())
    }

    pub fn annotate(mut self, name: impl Into<String>, arguments: Vec<ExprId>) -> Self {
        self.annotations.push((name.into(), arguments));
        self
    }

    pub fn getter(mut self, getter: FuncDecl) -> Self {
        match &mut self.accessors {
            AccessorDecl::Inline { getter: slot, .. } => *slot = Some(Box::new(getter)),
            _ => {
                self.accessors = AccessorDecl::Inline {
                    getter: Some(Box::new(getter)),
                    setter: None,
                }
            }
        }
        self
    }

    pub fn setter(mut self, setter: FuncDecl) -> Self {
        match &mut self.accessors {
            AccessorDecl::Inline { setter: slot, .. } => *slot = Some(Box::new(setter)),
            _ => {
                self.accessors = AccessorDecl::Inline {
                    getter: None,
                    setter: Some(Box::new(setter)),
                }
            }
        }
        self
    }

    /// Accessors pointing at member functions by name.
    pub fn setget(mut self, getter: Option<&str>, setter: Option<&str>) -> Self {
        self.accessors = AccessorDecl::SetGet {
            getter: getter.map(str::to_string),
            setter: setter.map(str::to_string),
        };
        self
    }
}

/// A function or signal parameter.
#[derive(Debug, Clone, Default)]
pub struct ParamDecl {
    pub name: String,
    pub datatype: Option<TypeNodeId>,
    pub default: Option<ExprId>,
    pub infer: bool,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn typed(mut self, datatype: TypeNodeId) -> Self {
        self.datatype = Some(datatype);
        self
    }

    pub fn default_value(mut self, default: ExprId) -> Self {
        self.default = Some(default);
        self
    }

    /// `name := default`.
    pub fn inferred(mut self, default: ExprId) -> Self {
        self.default = Some(default);
        self.infer = true;
        self
    }
}

/// A function, accessor or lambda body.
#[derive(Debug, Clone, Default)]
pub struct FuncDecl {
    /// Empty for lambdas.
    pub name: String,
    pub parameters: Vec<ParamDecl>,
    pub rest: Option<ParamDecl>,
    pub return_type: Option<TypeNodeId>,
    pub body: Option<SuiteId>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub annotations: Vec<(String, Vec<ExprId>)>,
}

impl FuncDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn param(mut self, parameter: ParamDecl) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// `...name` collecting extra arguments.
    pub fn rest(mut self, parameter: ParamDecl) -> Self {
        self.rest = Some(parameter);
        self
    }

    pub fn returns(mut self, return_type: TypeNodeId) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn body(mut self, body: SuiteId) -> Self {
        self.body = Some(body);
        self
    }

    pub fn statik(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn annotate(mut self, name: impl Into<String>, arguments: Vec<ExprId>) -> Self {
        self.annotations.push((name.into(), arguments));
        self
    }
}

/// One branch of a `match` statement.
#[derive(Debug, Clone)]
pub struct BranchDecl {
    pub patterns: Vec<PatternId>,
    pub guard: Option<ExprId>,
    pub block: SuiteId,
}

impl BranchDecl {
    pub fn new(patterns: Vec<PatternId>, block: SuiteId) -> Self {
        Self {
            patterns,
            guard: None,
            block,
        }
    }

    pub fn when(mut self, guard: ExprId) -> Self {
        self.guard = Some(guard);
        self
    }
}
