//! Annotations and the table of known annotations.
//!
//! The tree only records which annotation was written where. Resolving the
//! arguments and applying the effect is analysis work: an annotation resolves
//! at most once (`is_resolved`) and applies at most once (`is_applied`).

use bitflags::bitflags;
use orchestrator_core::{ExprId, PropertyInfo, Span, Variant};

bitflags! {
    /// Declarations an annotation may be attached to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnnotationTarget: u32 {
        const SCRIPT = 1 << 0;
        const CLASS = 1 << 1;
        const VARIABLE = 1 << 2;
        const CONSTANT = 1 << 3;
        const SIGNAL = 1 << 4;
        const FUNCTION = 1 << 5;
        const STATEMENT = 1 << 6;
        const STANDALONE = 1 << 7;
        const CLASS_LEVEL = Self::SCRIPT.bits() | Self::CLASS.bits();
    }
}

/// Static description of a known annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationInfo {
    pub name: &'static str,
    pub target_kind: AnnotationTarget,
    /// Number of arguments that must be supplied.
    pub required_arguments: usize,
    pub is_vararg: bool,
}

const ANNOTATIONS: &[AnnotationInfo] = &[AnnotationInfo {
    name: "@export",
    target_kind: AnnotationTarget::VARIABLE,
    required_arguments: 0,
    is_vararg: false,
}];

/// Look up a registered annotation by name, including the `@`.
pub fn lookup_annotation(name: &str) -> Option<&'static AnnotationInfo> {
    ANNOTATIONS.iter().find(|info| info.name == name)
}

pub fn is_annotation(name: &str) -> bool {
    lookup_annotation(name).is_some()
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationNode {
    pub name: String,
    pub arguments: Vec<ExprId>,
    pub resolved_arguments: Vec<Variant>,
    pub export_info: PropertyInfo,
    pub is_resolved: bool,
    pub is_applied: bool,
    pub span: Span,
}

impl AnnotationNode {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            ..Default::default()
        }
    }

    pub fn info(&self) -> Option<&'static AnnotationInfo> {
        lookup_annotation(&self.name)
    }

    pub fn applies_to(&self, target: AnnotationTarget) -> bool {
        self.info().is_some_and(|info| info.target_kind.intersects(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_targets_variables() {
        let annotation = AnnotationNode::new("@export", Span::default());
        assert!(annotation.applies_to(AnnotationTarget::VARIABLE));
        assert!(!annotation.applies_to(AnnotationTarget::CLASS_LEVEL));
    }

    #[test]
    fn unknown_annotation() {
        assert!(!is_annotation("@tool_button"));
        assert!(AnnotationNode::new("@nope", Span::default()).info().is_none());
    }
}
