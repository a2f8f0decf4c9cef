//! Source positions for diagnostics.
//!
//! Orchestrations are authored as node graphs, but the script tree still maps
//! every node back to a line/column pair so diagnostics can point at the
//! graph node that produced them.

use std::fmt;

/// Position of a node in its script.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed, 0 when unknown).
    pub line: u32,
    /// Column number (1-indexed).
    pub col: u32,
    /// Length in columns.
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// A zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// A span on the given line without a column.
    #[inline]
    pub fn line(line: u32) -> Self {
        Self { line, col: 1, len: 0 }
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        self.line > 0
    }

    /// Extend `self` so it also covers `other`.
    ///
    /// Spans on different lines keep the start of `self` and drop the length.
    pub fn merge(self, other: Span) -> Span {
        if self.line != other.line {
            return Span::point(self.line, self.col);
        }
        let start = self.col.min(other.col);
        let end = (self.col + self.len).max(other.col + other.len);
        Span::new(self.line, start, end - start)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_same_line() {
        let merged = Span::new(3, 5, 2).merge(Span::new(3, 10, 4));
        assert_eq!(merged, Span::new(3, 5, 9));
    }

    #[test]
    fn merge_other_line_keeps_start() {
        let merged = Span::new(3, 5, 2).merge(Span::new(4, 1, 4));
        assert_eq!(merged, Span::point(3, 5));
    }

    #[test]
    fn display_format() {
        assert_eq!(Span::new(12, 4, 1).to_string(), "12:4");
        assert!(!Span::default().is_known());
    }
}
