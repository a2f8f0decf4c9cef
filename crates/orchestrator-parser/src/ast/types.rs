//! Type annotations.

use orchestrator_core::{DataType, Span, TypeNodeId};

/// An identifier with its position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A written type such as `int`, `Node.ProcessMode` or `Array[Node]`.
///
/// `type_chain` holds the dotted segments; `container_types` the bracketed
/// element types.
#[derive(Debug, Clone, Default)]
pub struct TypeNode {
    pub type_chain: Vec<Ident>,
    pub container_types: Vec<TypeNodeId>,
    pub span: Span,
    pub data_type: DataType,
}

impl TypeNode {
    /// The chain joined with dots.
    pub fn qualified_name(&self) -> String {
        self.type_chain
            .iter()
            .map(|ident| ident.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The first segment, or an empty string for an empty chain.
    pub fn first(&self) -> &str {
        self.type_chain.first().map_or("", |ident| ident.name.as_str())
    }

    pub fn container_type(&self, index: usize) -> Option<TypeNodeId> {
        self.container_types.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_joins_chain() {
        let node = TypeNode {
            type_chain: vec![Ident::new("Node", Span::default()), Ident::new("ProcessMode", Span::default())],
            ..Default::default()
        };
        assert_eq!(node.qualified_name(), "Node.ProcessMode");
        assert_eq!(node.first(), "Node");
        assert_eq!(node.container_type(0), None);
    }
}
