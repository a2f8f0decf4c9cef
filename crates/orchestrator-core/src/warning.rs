//! Warning catalogue.
//!
//! Each [`WarningCode`] owns a message template whose `%s` placeholders are
//! filled, in order, with the symbols supplied at the push site.

use std::fmt;

use crate::ids::NodeId;
use crate::span::Span;

/// How a warning is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningLevel {
    Ignore,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WarningCode {
    UnassignedVariable,
    UnassignedVariableOpAssign,
    UnusedVariable,
    UnusedLocalConstant,
    UnusedPrivateClassVariable,
    UnusedParameter,
    UnusedSignal,
    ShadowedVariable,
    ShadowedVariableBaseClass,
    ShadowedGlobalIdentifier,
    UnreachableCode,
    StandaloneExpression,
    StandaloneTernary,
    IncompatibleTernary,
    UntypedDeclaration,
    InferredDeclaration,
    UnsafePropertyAccess,
    UnsafeMethodAccess,
    UnsafeCast,
    UnsafeCallArgument,
    UnsafeVoidReturn,
    ReturnValueDiscarded,
    StaticCalledOnInstance,
    MissingAwait,
    RedundantAwait,
    AssertAlwaysTrue,
    AssertAlwaysFalse,
    IntegerDivision,
    NarrowingConversion,
    IntAsEnumWithoutCast,
    IntAsEnumWithoutMatch,
    EnumVariableWithoutDefault,
    ConfusableLocalDeclaration,
    ConfusableLocalUsage,
    ConfusableCaptureReassignment,
    InferenceOnVariant,
    NativeMethodOverride,
    GetNodeDefaultWithoutOnready,
}

impl WarningCode {
    pub const ALL: &'static [WarningCode] = &[
        Self::UnassignedVariable,
        Self::UnassignedVariableOpAssign,
        Self::UnusedVariable,
        Self::UnusedLocalConstant,
        Self::UnusedPrivateClassVariable,
        Self::UnusedParameter,
        Self::UnusedSignal,
        Self::ShadowedVariable,
        Self::ShadowedVariableBaseClass,
        Self::ShadowedGlobalIdentifier,
        Self::UnreachableCode,
        Self::StandaloneExpression,
        Self::StandaloneTernary,
        Self::IncompatibleTernary,
        Self::UntypedDeclaration,
        Self::InferredDeclaration,
        Self::UnsafePropertyAccess,
        Self::UnsafeMethodAccess,
        Self::UnsafeCast,
        Self::UnsafeCallArgument,
        Self::UnsafeVoidReturn,
        Self::ReturnValueDiscarded,
        Self::StaticCalledOnInstance,
        Self::MissingAwait,
        Self::RedundantAwait,
        Self::AssertAlwaysTrue,
        Self::AssertAlwaysFalse,
        Self::IntegerDivision,
        Self::NarrowingConversion,
        Self::IntAsEnumWithoutCast,
        Self::IntAsEnumWithoutMatch,
        Self::EnumVariableWithoutDefault,
        Self::ConfusableLocalDeclaration,
        Self::ConfusableLocalUsage,
        Self::ConfusableCaptureReassignment,
        Self::InferenceOnVariant,
        Self::NativeMethodOverride,
        Self::GetNodeDefaultWithoutOnready,
    ];

    /// The project-setting style name, e.g. `UNUSED_VARIABLE`.
    pub fn name(self) -> &'static str {
        match self {
            Self::UnassignedVariable => "UNASSIGNED_VARIABLE",
            Self::UnassignedVariableOpAssign => "UNASSIGNED_VARIABLE_OP_ASSIGN",
            Self::UnusedVariable => "UNUSED_VARIABLE",
            Self::UnusedLocalConstant => "UNUSED_LOCAL_CONSTANT",
            Self::UnusedPrivateClassVariable => "UNUSED_PRIVATE_CLASS_VARIABLE",
            Self::UnusedParameter => "UNUSED_PARAMETER",
            Self::UnusedSignal => "UNUSED_SIGNAL",
            Self::ShadowedVariable => "SHADOWED_VARIABLE",
            Self::ShadowedVariableBaseClass => "SHADOWED_VARIABLE_BASE_CLASS",
            Self::ShadowedGlobalIdentifier => "SHADOWED_GLOBAL_IDENTIFIER",
            Self::UnreachableCode => "UNREACHABLE_CODE",
            Self::StandaloneExpression => "STANDALONE_EXPRESSION",
            Self::StandaloneTernary => "STANDALONE_TERNARY",
            Self::IncompatibleTernary => "INCOMPATIBLE_TERNARY",
            Self::UntypedDeclaration => "UNTYPED_DECLARATION",
            Self::InferredDeclaration => "INFERRED_DECLARATION",
            Self::UnsafePropertyAccess => "UNSAFE_PROPERTY_ACCESS",
            Self::UnsafeMethodAccess => "UNSAFE_METHOD_ACCESS",
            Self::UnsafeCast => "UNSAFE_CAST",
            Self::UnsafeCallArgument => "UNSAFE_CALL_ARGUMENT",
            Self::UnsafeVoidReturn => "UNSAFE_VOID_RETURN",
            Self::ReturnValueDiscarded => "RETURN_VALUE_DISCARDED",
            Self::StaticCalledOnInstance => "STATIC_CALLED_ON_INSTANCE",
            Self::MissingAwait => "MISSING_AWAIT",
            Self::RedundantAwait => "REDUNDANT_AWAIT",
            Self::AssertAlwaysTrue => "ASSERT_ALWAYS_TRUE",
            Self::AssertAlwaysFalse => "ASSERT_ALWAYS_FALSE",
            Self::IntegerDivision => "INTEGER_DIVISION",
            Self::NarrowingConversion => "NARROWING_CONVERSION",
            Self::IntAsEnumWithoutCast => "INT_AS_ENUM_WITHOUT_CAST",
            Self::IntAsEnumWithoutMatch => "INT_AS_ENUM_WITHOUT_MATCH",
            Self::EnumVariableWithoutDefault => "ENUM_VARIABLE_WITHOUT_DEFAULT",
            Self::ConfusableLocalDeclaration => "CONFUSABLE_LOCAL_DECLARATION",
            Self::ConfusableLocalUsage => "CONFUSABLE_LOCAL_USAGE",
            Self::ConfusableCaptureReassignment => "CONFUSABLE_CAPTURE_REASSIGNMENT",
            Self::InferenceOnVariant => "INFERENCE_ON_VARIANT",
            Self::NativeMethodOverride => "NATIVE_METHOD_OVERRIDE",
            Self::GetNodeDefaultWithoutOnready => "GET_NODE_DEFAULT_WITHOUT_ONREADY",
        }
    }

    pub fn from_name(name: &str) -> Option<WarningCode> {
        Self::ALL.iter().copied().find(|code| code.name() == name)
    }

    /// Level used when the configuration does not override it.
    pub fn default_level(self) -> WarningLevel {
        match self {
            Self::UntypedDeclaration
            | Self::InferredDeclaration
            | Self::UnsafePropertyAccess
            | Self::UnsafeMethodAccess
            | Self::UnsafeCast
            | Self::UnsafeCallArgument
            | Self::ReturnValueDiscarded => WarningLevel::Ignore,
            Self::InferenceOnVariant
            | Self::NativeMethodOverride
            | Self::GetNodeDefaultWithoutOnready => WarningLevel::Error,
            _ => WarningLevel::Warn,
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::UnassignedVariable => r#"The variable "%s" was used before being assigned a value."#,
            Self::UnassignedVariableOpAssign => {
                r#"The variable "%s" is modified with the compound-assignment operator "%s=" but was not previously initialized."#
            }
            Self::UnusedVariable => {
                r#"The local variable "%s" is declared but never used in the block. If this is intended, prefix it with an underscore: "_%s"."#
            }
            Self::UnusedLocalConstant => {
                r#"The local constant "%s" is declared but never used in the block. If this is intended, prefix it with an underscore: "_%s"."#
            }
            Self::UnusedPrivateClassVariable => {
                r#"The class variable "%s" is declared but never used in the class."#
            }
            Self::UnusedParameter => {
                r#"The parameter "%s" is never used in the function "%s()". If this is intended, prefix it with an underscore: "_%s"."#
            }
            Self::UnusedSignal => r#"The signal "%s" is declared but never explicitly used in the class."#,
            Self::ShadowedVariable => {
                r#"The local %s "%s" is shadowing an already-declared %s at line %s in the current class."#
            }
            Self::ShadowedVariableBaseClass => {
                r#"The local %s "%s" is shadowing an already-declared %s in the base class "%s"."#
            }
            Self::ShadowedGlobalIdentifier => r#"The %s "%s" has the same name as a %s."#,
            Self::UnreachableCode => r#"Unreachable code (statement after return) in function "%s()"."#,
            Self::StandaloneExpression => "Standalone expression (the line may have no effect).",
            Self::StandaloneTernary => "Standalone ternary operator (the return value is being discarded).",
            Self::IncompatibleTernary => "Values of the ternary operator are not mutually compatible.",
            Self::UntypedDeclaration => r#"%s "%s" has no static type."#,
            Self::InferredDeclaration => r#"%s "%s" has an implicitly inferred static type."#,
            Self::UnsafePropertyAccess => {
                r#"The property "%s" is not present on the inferred type "%s" (but may be present on a subtype)."#
            }
            Self::UnsafeMethodAccess => {
                r#"The method "%s()" is not present on the inferred type "%s" (but may be present on a subtype)."#
            }
            Self::UnsafeCast => r#"Casting "Variant" to "%s" is unsafe."#,
            Self::UnsafeCallArgument => {
                r#"The argument %s of the %s requires the subtype "%s" but the supertype "%s" was provided."#
            }
            Self::UnsafeVoidReturn => {
                r#"The method "%s()" returns "void" but it's trying to return a call to "%s()" that can't be ensured to also be "void"."#
            }
            Self::ReturnValueDiscarded => {
                r#"The function "%s()" returns a value that will be discarded if not used."#
            }
            Self::StaticCalledOnInstance => {
                r#"The function "%s()" is a static function but was called from an instance. Instead, it should be directly called from the type: "%s.%s()"."#
            }
            Self::MissingAwait => r#"The function "%s()" is a coroutine, so it must be called with "await"."#,
            Self::RedundantAwait => {
                r#""await" keyword is unnecessary because the expression isn't a coroutine nor a signal."#
            }
            Self::AssertAlwaysTrue => "Assert statement is redundant because the expression is always true.",
            Self::AssertAlwaysFalse => {
                "Assert statement will raise an error because the expression is always false."
            }
            Self::IntegerDivision => "Integer division. Decimal part will be discarded.",
            Self::NarrowingConversion => {
                "Narrowing conversion (float is converted to int and loses precision)."
            }
            Self::IntAsEnumWithoutCast => {
                r#"Integer used when an enum value is expected. If this is intended, cast the integer to the enum type using the "as" keyword."#
            }
            Self::IntAsEnumWithoutMatch => {
                r#"Cannot %s %s as Enum "%s": no enum member has matching value."#
            }
            Self::EnumVariableWithoutDefault => {
                r#"The variable "%s" has an enum type and does not set an explicit default value. The default will be set to "0"."#
            }
            Self::ConfusableLocalDeclaration => r#"The %s "%s" is declared below in the parent block."#,
            Self::ConfusableLocalUsage => r#"The identifier "%s" will be shadowed below in the block."#,
            Self::ConfusableCaptureReassignment => {
                r#"Reassigning lambda capture does not modify the outer local "%s"."#
            }
            Self::InferenceOnVariant => {
                "The %s type is being inferred from a Variant value, so it will be typed as Variant."
            }
            Self::NativeMethodOverride => {
                r#"The method "%s()" overrides a method from native class "%s". This won't be called by the engine and may not work as expected."#
            }
            Self::GetNodeDefaultWithoutOnready => {
                r#"The default value uses "%s" which won't return nodes in the scene tree before "_ready()" is called."#
            }
        }
    }

    /// Render the message for the given symbols.
    ///
    /// Placeholders without a matching symbol are left empty.
    pub fn message(self, symbols: &[String]) -> String {
        let mut out = String::new();
        let mut symbols = symbols.iter();
        let mut rest = self.template();
        while let Some(pos) = rest.find("%s") {
            out.push_str(&rest[..pos]);
            if let Some(symbol) = symbols.next() {
                out.push_str(symbol);
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A warning attached to a node of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub code: WarningCode,
    pub symbols: Vec<String>,
    pub message: String,
    pub span: Span,
    pub node: Option<NodeId>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ({}) {}", self.span, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_fills_symbols_in_order() {
        let msg = WarningCode::UnusedParameter.message(&["speed".into(), "move".into(), "speed".into()]);
        assert_eq!(
            msg,
            r#"The parameter "speed" is never used in the function "move()". If this is intended, prefix it with an underscore: "_speed"."#
        );
    }

    #[test]
    fn message_without_placeholders() {
        assert_eq!(
            WarningCode::IntegerDivision.message(&[]),
            "Integer division. Decimal part will be discarded."
        );
    }

    #[test]
    fn names_round_trip() {
        for code in WarningCode::ALL {
            assert_eq!(WarningCode::from_name(code.name()), Some(*code));
        }
    }

    #[test]
    fn unsafe_warnings_are_opt_in() {
        assert_eq!(WarningCode::UnsafeCast.default_level(), WarningLevel::Ignore);
        assert_eq!(WarningCode::IntegerDivision.default_level(), WarningLevel::Warn);
    }
}
