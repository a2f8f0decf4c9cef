//! Abstract syntax tree for orchestration scripts.
//!
//! A script is a [`Tree`]: one arena per node category, addressed by the typed
//! ids of `orchestrator_core::ids`. Nodes are created once by the builder and
//! never replaced; the analyzer writes only their `data_type` caches and
//! resolution flags.
//!
//! ```text
//! Tree
//! ├── classes      ClassNode (head at `head`, nested classes via Member::Class)
//! ├── functions    FunctionNode (members, accessors and lambda bodies)
//! ├── variables    VariableNode (members and locals)
//! ├── constants / parameters / signals / enums
//! ├── suites / stmts / patterns
//! ├── exprs        ExprNode
//! ├── types        TypeNode
//! ├── annotations  AnnotationNode
//! └── lambdas      LambdaNode
//! ```

pub mod decl;
pub mod expr;
pub mod ops;
pub mod stmt;
pub mod types;

use std::ops::{Index, IndexMut};

use orchestrator_core::{
    AnnotationId, ClassId, ConstantId, DataType, EnumId, ExprId, FunctionId, LambdaId, ParameterId,
    PatternId, SignalId, Span, StmtId, SuiteId, TypeNodeId, VariableId,
};

use crate::annotation::AnnotationNode;

pub use decl::*;
pub use expr::*;
pub use ops::*;
pub use stmt::*;
pub use types::*;

/// Arena storage of one script.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    pub classes: Vec<ClassNode>,
    pub functions: Vec<FunctionNode>,
    pub variables: Vec<VariableNode>,
    pub constants: Vec<ConstantNode>,
    pub parameters: Vec<ParameterNode>,
    pub signals: Vec<SignalNode>,
    pub enums: Vec<EnumNode>,
    pub exprs: Vec<ExprNode>,
    pub suites: Vec<SuiteNode>,
    pub stmts: Vec<StmtNode>,
    pub types: Vec<TypeNode>,
    pub annotations: Vec<AnnotationNode>,
    pub patterns: Vec<PatternNode>,
    pub lambdas: Vec<LambdaNode>,
}

macro_rules! arena {
    ($($field:ident: $id:ty => $node:ty, $add:ident;)*) => {
        $(
            impl Index<$id> for Tree {
                type Output = $node;

                #[inline]
                fn index(&self, id: $id) -> &$node {
                    &self.$field[id.index()]
                }
            }

            impl IndexMut<$id> for Tree {
                #[inline]
                fn index_mut(&mut self, id: $id) -> &mut $node {
                    &mut self.$field[id.index()]
                }
            }
        )*

        impl Tree {
            $(
                pub fn $add(&mut self, node: $node) -> $id {
                    let id = <$id>::from(self.$field.len());
                    self.$field.push(node);
                    id
                }
            )*
        }
    };
}

arena! {
    classes: ClassId => ClassNode, add_class;
    functions: FunctionId => FunctionNode, add_function;
    variables: VariableId => VariableNode, add_variable;
    constants: ConstantId => ConstantNode, add_constant;
    parameters: ParameterId => ParameterNode, add_parameter;
    signals: SignalId => SignalNode, add_signal;
    enums: EnumId => EnumNode, add_enum;
    exprs: ExprId => ExprNode, add_expr;
    suites: SuiteId => SuiteNode, add_suite;
    stmts: StmtId => StmtNode, add_stmt;
    types: TypeNodeId => TypeNode, add_type;
    annotations: AnnotationId => AnnotationNode, add_annotation;
    patterns: PatternId => PatternNode, add_pattern;
    lambdas: LambdaId => LambdaNode, add_lambda;
}

impl Tree {
    /// The script's top-level class.
    pub const HEAD: ClassId = ClassId::new(0);

    pub fn head(&self) -> &ClassNode {
        &self[Self::HEAD]
    }

    /// The registered global class name, empty when the script has none.
    pub fn global_name(&self) -> &str {
        self.classes.first().map_or("", ClassNode::name)
    }

    pub fn find_class(&self, fqcn: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .position(|class| class.fqcn == fqcn)
            .map(ClassId::from)
    }

    // ------------------------------------------------------------------------
    // Member accessors
    // ------------------------------------------------------------------------

    pub fn member_name(&self, member: Member) -> &str {
        match member {
            Member::Class(id) => self[id].name(),
            Member::Constant(id) => self[id].decl.name(),
            Member::Function(id) => self[id].name(),
            Member::Signal(id) => &self[id].identifier.name,
            Member::Variable(id) => self[id].decl.name(),
            Member::Enum(id) => self[id].name(),
            Member::EnumValue(id, index) => &self[id].values[index].identifier.name,
            Member::Group(_) => "",
        }
    }

    pub fn member_span(&self, member: Member) -> Span {
        match member {
            Member::Class(id) => self[id].span,
            Member::Constant(id) => self[id].decl.span,
            Member::Function(id) => self[id].span,
            Member::Signal(id) => self[id].span,
            Member::Variable(id) => self[id].decl.span,
            Member::Enum(id) => self[id].span,
            Member::EnumValue(id, index) => self[id].values[index].identifier.span,
            Member::Group(_) => Span::default(),
        }
    }

    /// The cached type of a member, `None` for groups.
    pub fn member_data_type(&self, member: Member) -> Option<&DataType> {
        Some(match member {
            Member::Class(id) => &self[id].data_type,
            Member::Constant(id) => &self[id].decl.data_type,
            Member::Function(id) => &self[id].data_type,
            Member::Signal(id) => &self[id].data_type,
            Member::Variable(id) => &self[id].decl.data_type,
            Member::Enum(id) => &self[id].data_type,
            Member::EnumValue(id, _) => &self[id].data_type,
            Member::Group(_) => return None,
        })
    }

    // ------------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------------

    /// Find a local visible from `suite`, walking enclosing blocks.
    pub fn find_local(&self, suite: SuiteId, name: &str) -> Option<&Local> {
        let mut current = Some(suite);
        while let Some(id) = current {
            let node = &self[id];
            if let Some(local) = node.get_local(name) {
                return Some(local);
            }
            current = node.parent_block;
        }
        None
    }

    /// The identifier payload of an expression, if it is one.
    pub fn identifier(&self, expr: ExprId) -> Option<&IdentifierExpr> {
        self[expr].identifier()
    }

    /// The name of an identifier expression, or an empty string.
    pub fn identifier_name(&self, expr: ExprId) -> &str {
        self.identifier(expr).map_or("", |identifier| identifier.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator_core::Variant;

    #[test]
    fn arena_round_trip() {
        let mut tree = Tree::default();
        let expr = tree.add_expr(ExprNode::new(ExprKind::Literal(Variant::Int(4)), Span::default()));
        assert_eq!(expr, ExprId::new(0));
        assert!(matches!(tree[expr].kind, ExprKind::Literal(Variant::Int(4))));
        tree[expr].reduced = true;
        assert!(tree[expr].reduced);
    }

    #[test]
    fn find_local_walks_parents() {
        let mut tree = Tree::default();
        let outer = tree.add_suite(SuiteNode::default());
        let inner = tree.add_suite(SuiteNode {
            parent_block: Some(outer),
            ..Default::default()
        });
        tree[outer].add_local(Local {
            kind: LocalKind::Variable(VariableId::new(0)),
            name: "a".into(),
            span: Span::default(),
            source_function: None,
        });
        assert!(tree.find_local(inner, "a").is_some());
        assert!(tree.find_local(inner, "b").is_none());
    }

    #[test]
    fn find_class_by_fqcn() {
        let mut tree = Tree::default();
        tree.add_class(ClassNode {
            fqcn: "res://a.os".into(),
            ..Default::default()
        });
        let inner = tree.add_class(ClassNode {
            fqcn: "res://a.os::Inner".into(),
            ..Default::default()
        });
        assert_eq!(tree.find_class("res://a.os::Inner"), Some(inner));
        assert_eq!(tree.find_class("res://b.os"), None);
    }
}
