//! Error types shared by the orchestration crates.
//!
//! ## Error Hierarchy
//!
//! ```text
//! Diagnostic     - a collected, node-attached analysis error (never thrown)
//! AnalysisError  - outcome of running a pass over a script
//! CallError      - failure of a host construct/call during constant folding
//! ```
//!
//! Analysis keeps going after a [`Diagnostic`] is pushed; only the entry
//! points turn a non-empty error list into an [`AnalysisError`].

use std::fmt;

use thiserror::Error;

use crate::ids::NodeId;
use crate::span::Span;

// ============================================================================
// Diagnostics
// ============================================================================

/// An analysis error attached to the node that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub node: Option<NodeId>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span, node: Option<NodeId>) -> Self {
        Self {
            message: message.into(),
            span,
            node,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

// ============================================================================
// Analysis Errors
// ============================================================================

/// Result of an analysis entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The script has at least one error diagnostic.
    #[error("script '{path}' has {count} error(s)")]
    ParseError { path: String, count: usize },

    /// A script could not be found by the script cache.
    #[error("script '{path}' does not exist")]
    ScriptNotFound { path: String },

    /// A script exists but could not be loaded.
    #[error("cannot open script '{path}': {reason}")]
    CantOpen { path: String, reason: String },
}

// ============================================================================
// Call Errors
// ============================================================================

/// Why a host construct or utility call rejected its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Argument `index` (0-based) cannot be converted to `expected`.
    #[error("invalid argument {index}, expected {expected}")]
    InvalidArgument { index: usize, expected: String },

    /// No overload accepts the arguments.
    #[error("invalid method")]
    InvalidMethod,

    #[error("too many arguments, expected {expected}")]
    TooManyArguments { expected: usize },

    #[error("too few arguments, expected {expected}")]
    TooFewArguments { expected: usize },

    /// The call itself failed for a reason reported by the host.
    #[error("{0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let diag = Diagnostic::new("Cyclic reference.", Span::new(4, 2, 1), None);
        assert_eq!(diag.to_string(), "4:2: Cyclic reference.");
    }

    #[test]
    fn analysis_error_display() {
        let err = AnalysisError::ParseError {
            path: "res://a.os".into(),
            count: 2,
        };
        assert_eq!(err.to_string(), "script 'res://a.os' has 2 error(s)");
    }
}
