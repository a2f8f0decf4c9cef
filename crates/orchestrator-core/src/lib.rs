//! Core types for the orchestration script analyzer.
//!
//! This crate holds the vocabulary every other crate speaks:
//!
//! - [`Variant`] / [`VariantType`]: the host value model
//! - [`DataType`]: the type descriptor computed for every node
//! - [`PropertyInfo`] / [`MethodInfo`]: the reflection output contract
//! - typed arena ids ([`ExprId`], [`ClassRef`], ...)
//! - diagnostics, warnings and error enums

pub mod data_type;
pub mod error;
pub mod ids;
pub mod operator;
pub mod property_info;
pub mod script;
pub mod span;
pub mod variant;
pub mod warning;

pub use data_type::{ClassHandle, DataType, Kind, NATIVE_CLASS_META, SCRIPT_CLASS_META, TypeSource};
pub use error::{AnalysisError, CallError, Diagnostic};
pub use ids::{
    AnnotationId, ClassId, ClassRef, ConstantId, EnumId, ExprId, FunctionId, LambdaId, NodeId,
    NodeRef, ParameterId, ParserId, PatternId, SignalId, StmtId, SuiteId, TypeNodeId, VariableId,
};
pub use operator::VariantOperator;
pub use property_info::{MethodFlags, MethodInfo, PropertyHint, PropertyInfo, PropertyUsage};
pub use script::ForeignScript;
pub use span::Span;
pub use variant::{
    Array, CallableRef, ContainerType, Dictionary, ObjectRef, PackedArray, Real, ScriptRef,
    SignalRef, Variant, VariantType, format_real,
};
pub use warning::{Warning, WarningCode, WarningLevel};
