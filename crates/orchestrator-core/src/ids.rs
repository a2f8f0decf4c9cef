//! Arena identifiers for script trees and parser pools.
//!
//! Every node of a parsed script lives in a per-file arena and is addressed by
//! a typed index. Indices are only meaningful for the tree that minted them;
//! links that may cross file boundaries carry the owning [`ParserId`] through
//! [`NodeRef`].

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Create an identifier from a raw arena index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// The arena slot this identifier points at.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

define_id!(
    /// Identifies one parsed script inside a pool.
    ParserId,
    "parser"
);
define_id!(
    /// A class declaration (the script head or a nested class).
    ClassId,
    "class"
);
define_id!(FunctionId, "func");
define_id!(VariableId, "var");
define_id!(ConstantId, "const");
define_id!(ParameterId, "param");
define_id!(SignalId, "signal");
define_id!(EnumId, "enum");
define_id!(
    /// An expression node.
    ExprId,
    "expr"
);
define_id!(SuiteId, "suite");
define_id!(StmtId, "stmt");
define_id!(
    /// A type annotation such as `Array[int]`.
    TypeNodeId,
    "type"
);
define_id!(AnnotationId, "annotation");
define_id!(PatternId, "pattern");
define_id!(LambdaId, "lambda");

/// A node id qualified by the parser whose tree owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef<T> {
    pub parser: ParserId,
    pub id: T,
}

impl<T> NodeRef<T> {
    #[inline]
    pub const fn new(parser: ParserId, id: T) -> Self {
        Self { parser, id }
    }
}

impl<T: fmt::Display> fmt::Display for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.parser, self.id)
    }
}

/// Reference to a class node in any tree of the pool.
pub type ClassRef = NodeRef<ClassId>;

/// Any node a diagnostic or an unsafe mark can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Class(ClassId),
    Function(FunctionId),
    Variable(VariableId),
    Constant(ConstantId),
    Parameter(ParameterId),
    Signal(SignalId),
    Enum(EnumId),
    EnumValue(EnumId, usize),
    Expr(ExprId),
    Suite(SuiteId),
    Stmt(StmtId),
    Type(TypeNodeId),
    Annotation(AnnotationId),
    Pattern(PatternId),
}

macro_rules! impl_node_id_from {
    ($($id:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$id> for NodeId {
                fn from(id: $id) -> Self {
                    NodeId::$variant(id)
                }
            }
        )*
    };
}

impl_node_id_from!(
    ClassId => Class,
    FunctionId => Function,
    VariableId => Variable,
    ConstantId => Constant,
    ParameterId => Parameter,
    SignalId => Signal,
    EnumId => Enum,
    ExprId => Expr,
    SuiteId => Suite,
    StmtId => Stmt,
    TypeNodeId => Type,
    AnnotationId => Annotation,
    PatternId => Pattern,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display() {
        assert_eq!(ExprId::new(7).to_string(), "expr_7");
        assert_eq!(NodeRef::new(ParserId::new(1), ClassId::new(2)).to_string(), "parser_1:class_2");
    }

    #[test]
    fn id_index_round_trip() {
        let id = FunctionId::from(12usize);
        assert_eq!(id.index(), 12);
        assert_eq!(id, FunctionId::new(12));
    }

    #[test]
    fn node_id_from() {
        assert_eq!(NodeId::from(ExprId::new(3)), NodeId::Expr(ExprId::new(3)));
    }
}
