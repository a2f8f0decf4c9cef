//! Declaration nodes: classes, functions, variables, constants, parameters,
//! signals and enums.
//!
//! Declarations are stored in the arenas of a [`Tree`](super::Tree) and
//! reference each other through typed ids. The analyzer only writes the
//! `data_type` caches and the resolution flags.

use indexmap::IndexMap;
use orchestrator_core::{
    AnnotationId, ClassId, ConstantId, DataType, Dictionary, EnumId, ExprId, FunctionId, LambdaId,
    MethodInfo, ParameterId, PropertyInfo, SignalId, Span, SuiteId, TypeNodeId, Variant, VariableId,
};
use rustc_hash::FxHashMap;

use super::types::Ident;

/// Name reported for functions without an identifier.
pub const ANONYMOUS_LAMBDA: &str = "<anonymous lambda>";

// ============================================================================
// Assignables
// ============================================================================

/// The shape shared by variables, constants and parameters.
#[derive(Debug, Clone, Default)]
pub struct Assignable {
    pub identifier: Ident,
    pub initializer: Option<ExprId>,
    pub datatype_specifier: Option<TypeNodeId>,
    /// Declared with `:=`.
    pub infer_datatype: bool,
    /// The initializer needs a conversion on assignment.
    pub use_conversion_assign: bool,
    pub usages: u32,
    pub data_type: DataType,
    pub span: Span,
}

impl Assignable {
    pub fn new(identifier: Ident) -> Self {
        let span = identifier.span;
        Self {
            identifier,
            span,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.identifier.name
    }
}

/// Accessor declaration of a property.
#[derive(Debug, Clone, Default)]
pub enum PropertyStyle {
    #[default]
    None,
    /// Accessors with their own bodies.
    Inline {
        getter: Option<FunctionId>,
        setter: Option<FunctionId>,
    },
    /// Accessors pointing at member functions by name.
    SetGet {
        getter: Option<Ident>,
        setter: Option<Ident>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct VariableNode {
    pub decl: Assignable,
    pub style: PropertyStyle,
    pub exported: bool,
    pub onready: bool,
    pub export_info: PropertyInfo,
    /// Value a fresh instance starts with, filled in by the analyzer.
    pub default_value: Variant,
    pub assignments: u32,
    pub is_static: bool,
    pub annotations: Vec<AnnotationId>,
}

impl VariableNode {
    pub fn new(identifier: Ident) -> Self {
        Self {
            decl: Assignable::new(identifier),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstantNode {
    pub decl: Assignable,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterNode {
    pub decl: Assignable,
}

// ============================================================================
// Signals and enums
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SignalNode {
    pub identifier: Ident,
    pub parameters: Vec<ParameterId>,
    pub parameters_indices: FxHashMap<String, usize>,
    pub method_info: MethodInfo,
    pub usages: u32,
    pub data_type: DataType,
    pub span: Span,
}

/// One member of an enum.
#[derive(Debug, Clone, Default)]
pub struct EnumValue {
    pub identifier: Ident,
    pub custom_value: Option<ExprId>,
    pub parent_enum: Option<EnumId>,
    pub index: usize,
    pub resolving: bool,
    pub resolved: bool,
    pub value: i64,
}

#[derive(Debug, Clone, Default)]
pub struct EnumNode {
    /// `None` for an unnamed enum whose values land in the class scope.
    pub identifier: Option<Ident>,
    pub values: Vec<EnumValue>,
    /// Read-only `name -> value` snapshot built once every value resolved.
    pub dictionary: Dictionary,
    pub data_type: DataType,
    pub span: Span,
}

impl EnumNode {
    pub fn name(&self) -> &str {
        self.identifier.as_ref().map_or("", |ident| ident.name.as_str())
    }
}

// ============================================================================
// Functions
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FunctionNode {
    /// `None` for lambdas.
    pub identifier: Option<Ident>,
    pub parameters: Vec<ParameterId>,
    pub parameters_indices: FxHashMap<String, usize>,
    pub rest_parameter: Option<ParameterId>,
    pub return_type: Option<TypeNodeId>,
    pub body: Option<SuiteId>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_coroutine: bool,
    pub info: MethodInfo,
    pub default_arg_values: Vec<Variant>,
    pub source_lambda: Option<LambdaId>,
    pub resolved_signature: bool,
    pub resolved_body: bool,
    pub usages: u32,
    pub data_type: DataType,
    pub annotations: Vec<AnnotationId>,
    pub span: Span,
}

impl FunctionNode {
    pub fn name(&self) -> &str {
        self.identifier.as_ref().map_or(ANONYMOUS_LAMBDA, |ident| ident.name.as_str())
    }

    pub fn is_vararg(&self) -> bool {
        self.rest_parameter.is_some()
    }
}

// ============================================================================
// Classes
// ============================================================================

/// A class member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    Class(ClassId),
    Constant(ConstantId),
    Function(FunctionId),
    Signal(SignalId),
    Variable(VariableId),
    Enum(EnumId),
    /// A value of an unnamed enum, exposed directly in the class scope.
    EnumValue(EnumId, usize),
    /// An editor grouping marker; carries no type.
    Group(u32),
}

impl Member {
    /// The kind name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Member::Class(_) => "class",
            Member::Constant(_) => "constant",
            Member::Function(_) => "function",
            Member::Signal(_) => "signal",
            Member::Variable(_) => "variable",
            Member::Enum(_) => "enum",
            Member::EnumValue(..) => "enum value",
            Member::Group(_) => "group",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassNode {
    /// The `class_name` of a script head, or the name of a nested class.
    pub identifier: Option<Ident>,
    /// Fully qualified class name, e.g. `res://player.os::Inventory`.
    pub fqcn: String,
    pub outer: Option<ClassId>,
    pub extends_path: Option<String>,
    pub extends: Vec<Ident>,
    pub extends_used: bool,
    pub members: Vec<Member>,
    pub members_indices: IndexMap<String, usize>,
    pub base_type: DataType,
    pub data_type: DataType,
    pub is_abstract: bool,
    pub has_static_data: bool,
    pub onready_used: bool,
    pub resolved_interface: bool,
    pub resolved_body: bool,
    pub annotations: Vec<AnnotationId>,
    pub span: Span,
}

impl ClassNode {
    pub fn name(&self) -> &str {
        self.identifier.as_ref().map_or("", |ident| ident.name.as_str())
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members_indices.contains_key(name)
    }

    pub fn get_member(&self, name: &str) -> Option<Member> {
        self.members_indices.get(name).map(|&index| self.members[index])
    }

    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members_indices.get(name).copied()
    }

    /// Append a member. Groups are unnamed and never indexed.
    pub fn add_member(&mut self, name: Option<&str>, member: Member) {
        if let Some(name) = name {
            self.members_indices.insert(name.to_string(), self.members.len());
        }
        self.members.push(member);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_member_lookup() {
        let mut class = ClassNode::default();
        class.add_member(Some("speed"), Member::Variable(VariableId::new(0)));
        class.add_member(None, Member::Group(0));
        class.add_member(Some("run"), Member::Function(FunctionId::new(0)));

        assert!(class.has_member("speed"));
        assert_eq!(class.member_index("run"), Some(2));
        assert_eq!(class.get_member("run").map(|m| m.type_name()), Some("function"));
        assert!(class.get_member("missing").is_none());
    }

    #[test]
    fn lambda_name() {
        let function = FunctionNode::default();
        assert_eq!(function.name(), ANONYMOUS_LAMBDA);
    }
}
