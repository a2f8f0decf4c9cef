//! Operators understood by the host value model.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// A variant operator, numbered as the engine numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum VariantOperator {
    // comparison
    Equal = 0,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    // mathematic
    Add,
    Subtract,
    Multiply,
    Divide,
    Negate,
    Positive,
    Module,
    Power,
    // bitwise
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    BitNegate,
    // logic
    And,
    Or,
    Xor,
    Not,
    // containment
    In,
}

impl VariantOperator {
    /// Engine name of the operator, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Negate => "unary-",
            Self::Positive => "unary+",
            Self::Module => "%",
            Self::Power => "**",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BitNegate => "~",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Not => "not",
            Self::In => "in",
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Self::Negate | Self::Positive | Self::BitNegate | Self::Not)
    }

    pub fn is_comparison(self) -> bool {
        (self as u8) <= (Self::GreaterEqual as u8)
    }
}

impl fmt::Display for VariantOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_names() {
        assert_eq!(VariantOperator::Add.to_string(), "+");
        assert_eq!(VariantOperator::Negate.name(), "unary-");
        assert!(VariantOperator::Not.is_unary());
        assert!(VariantOperator::LessEqual.is_comparison());
        assert!(!VariantOperator::Add.is_comparison());
    }

    #[test]
    fn discriminants() {
        assert_eq!(VariantOperator::try_from(24u8).ok(), Some(VariantOperator::In));
    }
}
