//! Operator definitions for script expressions.
//!
//! Every operator maps onto a [`VariantOperator`] so constant folding and the
//! static operator table can be shared with the host value model.

use std::fmt;

use orchestrator_core::VariantOperator;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `and`
    LogicAnd,
    /// `or`
    LogicOr,
    /// `in`
    ContentTest,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
}

impl BinaryOp {
    /// The host operator evaluating this operation.
    pub fn variant_op(self) -> VariantOperator {
        use BinaryOp::*;
        match self {
            Add => VariantOperator::Add,
            Sub => VariantOperator::Subtract,
            Mul => VariantOperator::Multiply,
            Div => VariantOperator::Divide,
            Mod => VariantOperator::Module,
            Pow => VariantOperator::Power,
            ShiftLeft => VariantOperator::ShiftLeft,
            ShiftRight => VariantOperator::ShiftRight,
            BitAnd => VariantOperator::BitAnd,
            BitOr => VariantOperator::BitOr,
            BitXor => VariantOperator::BitXor,
            LogicAnd => VariantOperator::And,
            LogicOr => VariantOperator::Or,
            ContentTest => VariantOperator::In,
            Equal => VariantOperator::Equal,
            NotEqual => VariantOperator::NotEqual,
            Less => VariantOperator::Less,
            LessEqual => VariantOperator::LessEqual,
            Greater => VariantOperator::Greater,
            GreaterEqual => VariantOperator::GreaterEqual,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.variant_op().is_comparison()
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinaryOp::*;
        let s = match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "**",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            LogicAnd => "and",
            LogicOr => "or",
            ContentTest => "in",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
        };
        f.write_str(s)
    }
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `+`
    Positive,
    /// `-`
    Negative,
    /// `~`
    Complement,
    /// `not`
    LogicNot,
}

impl UnaryOp {
    pub fn variant_op(self) -> VariantOperator {
        match self {
            UnaryOp::Positive => VariantOperator::Positive,
            UnaryOp::Negative => VariantOperator::Negate,
            UnaryOp::Complement => VariantOperator::BitNegate,
            UnaryOp::LogicNot => VariantOperator::Not,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Positive => "+",
            UnaryOp::Negative => "-",
            UnaryOp::Complement => "~",
            UnaryOp::LogicNot => "not",
        };
        f.write_str(s)
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
    /// `**=`
    PowAssign,
    /// `<<=`
    ShlAssign,
    /// `>>=`
    ShrAssign,
    /// `&=`
    AndAssign,
    /// `|=`
    OrAssign,
    /// `^=`
    XorAssign,
}

impl AssignOp {
    /// The operator applied before storing, `None` for a plain assignment.
    pub fn variant_op(self) -> Option<VariantOperator> {
        use AssignOp::*;
        Some(match self {
            Assign => return None,
            AddAssign => VariantOperator::Add,
            SubAssign => VariantOperator::Subtract,
            MulAssign => VariantOperator::Multiply,
            DivAssign => VariantOperator::Divide,
            ModAssign => VariantOperator::Module,
            PowAssign => VariantOperator::Power,
            ShlAssign => VariantOperator::ShiftLeft,
            ShrAssign => VariantOperator::ShiftRight,
            AndAssign => VariantOperator::BitAnd,
            OrAssign => VariantOperator::BitOr,
            XorAssign => VariantOperator::BitXor,
        })
    }

    pub fn is_compound(self) -> bool {
        self != AssignOp::Assign
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AssignOp::*;
        let s = match self {
            Assign => "=",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            DivAssign => "/=",
            ModAssign => "%=",
            PowAssign => "**=",
            ShlAssign => "<<=",
            ShrAssign => ">>=",
            AndAssign => "&=",
            OrAssign => "|=",
            XorAssign => "^=",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_ops_map_to_variant_ops() {
        assert_eq!(BinaryOp::Mod.variant_op(), VariantOperator::Module);
        assert_eq!(BinaryOp::ContentTest.variant_op(), VariantOperator::In);
        assert!(BinaryOp::LessEqual.is_comparison());
        assert!(!BinaryOp::Add.is_comparison());
    }

    #[test]
    fn compound_assignments() {
        assert_eq!(AssignOp::Assign.variant_op(), None);
        assert_eq!(AssignOp::ShlAssign.variant_op(), Some(VariantOperator::ShiftLeft));
        assert!(AssignOp::XorAssign.is_compound());
    }

    #[test]
    fn display() {
        assert_eq!(BinaryOp::LogicAnd.to_string(), "and");
        assert_eq!(UnaryOp::Complement.to_string(), "~");
        assert_eq!(AssignOp::PowAssign.to_string(), "**=");
    }
}
