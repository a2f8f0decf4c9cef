//! Variables, constants and parameters.

use orchestrator_core::{ConstantId, DataType, Kind, NodeId, ParameterId, TypeSource, VariableId, VariantType, WarningCode};
use orchestrator_parser::ExprKind;
use orchestrator_parser::ast::Assignable;

use crate::context::Analyzer;
use crate::types::type_from_metatype;

/// A declaration sharing the [`Assignable`] shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssignableId {
    Variable(VariableId),
    Constant(ConstantId),
    Parameter(ParameterId),
}

impl AssignableId {
    fn kind(self) -> &'static str {
        match self {
            AssignableId::Variable(_) => "variable",
            AssignableId::Constant(_) => "constant",
            AssignableId::Parameter(_) => "parameter",
        }
    }

    fn declaration_name(self) -> &'static str {
        match self {
            AssignableId::Variable(_) => "Variable",
            AssignableId::Constant(_) => "Constant",
            AssignableId::Parameter(_) => "Parameter",
        }
    }

    fn node(self) -> NodeId {
        match self {
            AssignableId::Variable(id) => id.into(),
            AssignableId::Constant(id) => id.into(),
            AssignableId::Parameter(id) => id.into(),
        }
    }
}

impl Analyzer<'_> {
    fn assignable(&self, id: AssignableId) -> &Assignable {
        let tree = self.tree();
        match id {
            AssignableId::Variable(id) => &tree[id].decl,
            AssignableId::Constant(id) => &tree[id].decl,
            AssignableId::Parameter(id) => &tree[id].decl,
        }
    }

    fn assignable_mut(&mut self, id: AssignableId) -> &mut Assignable {
        let tree = self.tree_mut();
        match id {
            AssignableId::Variable(id) => &mut tree[id].decl,
            AssignableId::Constant(id) => &mut tree[id].decl,
            AssignableId::Parameter(id) => &mut tree[id].decl,
        }
    }

    /// Type a declaration from its specifier and initializer.
    ///
    /// A specified type wins; the initializer is checked against it, and
    /// weakly typed initializers mark the node unsafe and request a
    /// conversion on assignment.
    pub(crate) fn resolve_assignable(&mut self, id: AssignableId) {
        let kind = id.kind();
        let is_constant = matches!(id, AssignableId::Constant(_));
        let decl = self.assignable(id);
        let name = decl.name().to_string();
        let specifier = decl.datatype_specifier;
        let initializer = decl.initializer;
        let infer = decl.infer_datatype;

        let specified_type = specifier.map(|_| type_from_metatype(&self.resolve_datatype(specifier)));
        let mut ty = specified_type.clone().unwrap_or_else(DataType::variant);

        if let Some(initializer) = initializer {
            self.reduce_expression(initializer, false);

            if let Some(specified) = &specified_type {
                match self.tree()[initializer].kind {
                    ExprKind::Array(_) if specified.has_container_element_type(0) => {
                        let element = specified.get_container_element_type_or_variant(0);
                        self.update_array_literal_element_type(initializer, &element);
                    }
                    ExprKind::Dictionary(_) if specified.has_container_element_types() => {
                        let key = specified.get_container_element_type_or_variant(0);
                        let value = specified.get_container_element_type_or_variant(1);
                        self.update_dictionary_literal_element_type(initializer, &key, &value);
                    }
                    _ => {}
                }
            }

            if is_constant && !self.tree()[initializer].is_constant {
                match self.make_expression_reduced_value(initializer) {
                    Some(value) => {
                        let expr = &mut self.tree_mut()[initializer];
                        expr.is_constant = true;
                        expr.reduced_value = value;
                    }
                    None => self.push_error(
                        format!(r#"Assigned value for {kind} "{name}" isn't a constant expression."#),
                        initializer,
                    ),
                }
            }

            if let Some(specified) = &specified_type {
                if self.tree()[initializer].is_constant {
                    self.update_const_expression_builtin_type(initializer, specified, "assign", false);
                }
            }

            let initializer_type = self.tree()[initializer].data_type.clone();
            if infer {
                if !initializer_type.is_set() || initializer_type.has_no_type() || !initializer_type.is_hard_type() {
                    self.push_error(
                        format!(r#"Cannot infer the type of "{name}" {kind} because the value doesn't have a set type."#),
                        initializer,
                    );
                } else if initializer_type.is_builtin(VariantType::Nil) && !is_constant {
                    self.push_error(
                        format!(r#"Cannot infer the type of "{name}" {kind} because the value is "null"."#),
                        initializer,
                    );
                }
                if initializer_type.is_hard_type() && initializer_type.is_variant() {
                    self.push_warning(id.node(), WarningCode::InferenceOnVariant, &[kind]);
                }
            } else if !initializer_type.is_set() {
                self.push_error(format!(r#"Could not resolve type for {kind} "{name}"."#), initializer);
            }

            match &specified_type {
                None => {
                    ty = initializer_type;
                    if !ty.is_set() || (ty.is_hard_type() && ty.is_builtin(VariantType::Nil) && !is_constant) {
                        ty.kind = Kind::Variant;
                    }
                    ty.type_source = if infer || is_constant {
                        TypeSource::AnnotatedInferred
                    } else {
                        TypeSource::Inferred
                    };
                }
                Some(specified) if !specified.is_variant() => {
                    self.check_initializer(id, initializer, specified, &initializer_type, is_constant, &name);
                }
                Some(_) => {}
            }
        }

        match &specified_type {
            None => {
                let declaration = id.declaration_name();
                if infer || is_constant {
                    let is_type_import = is_constant && initializer.is_some_and(|init| self.tree()[init].data_type.is_meta_type);
                    if !is_type_import {
                        self.push_warning(id.node(), WarningCode::InferredDeclaration, &[declaration, &name]);
                    }
                } else {
                    self.push_warning(id.node(), WarningCode::UntypedDeclaration, &[declaration, &name]);
                }
            }
            Some(specified)
                if !matches!(id, AssignableId::Parameter(_))
                    && specified.kind == Kind::Enum
                    && initializer.is_none()
                    && !specified.enum_values.values().any(|value| *value == 0) =>
            {
                self.push_warning(id.node(), WarningCode::EnumVariableWithoutDefault, &[&name]);
            }
            Some(_) => {}
        }

        ty.is_constant = is_constant;
        ty.is_read_only = false;
        self.assignable_mut(id).data_type = ty;
    }

    fn check_initializer(
        &mut self,
        id: AssignableId,
        initializer: orchestrator_core::ExprId,
        specified: &DataType,
        initializer_type: &DataType,
        is_constant: bool,
        name: &str,
    ) {
        if initializer_type.is_variant() || !initializer_type.is_hard_type() {
            self.mark_unsafe(initializer);
            self.assignable_mut(id).use_conversion_assign = true;
            if !initializer_type.is_variant()
                && !self.is_type_compatible(specified, initializer_type, true, Some(initializer.into()))
            {
                self.downgrade_node_type_source(initializer);
            }
        } else if !self.is_type_compatible(specified, initializer_type, true, Some(initializer.into())) {
            if !is_constant && self.is_type_compatible(initializer_type, specified, false, None) {
                self.mark_unsafe(initializer);
                self.assignable_mut(id).use_conversion_assign = true;
            } else {
                self.push_error(
                    format!(
                        r#"Cannot assign a value of type {initializer_type} to {} "{name}" with specified type {specified}."#,
                        id.kind()
                    ),
                    initializer,
                );
            }
        } else if (specified.has_container_element_type(0) && !initializer_type.has_container_element_type(0))
            || (specified.has_container_element_type(1) && !initializer_type.has_container_element_type(1))
        {
            self.mark_unsafe(initializer);
        } else if specified.builtin_type == VariantType::Int && initializer_type.builtin_type == VariantType::Float {
            self.push_warning(initializer, WarningCode::NarrowingConversion, &[]);
        }
    }

    pub(crate) fn resolve_variable(&mut self, variable: VariableId, is_local: bool) {
        self.resolve_assignable(AssignableId::Variable(variable));
        let decl = &self.tree()[variable].decl;
        let name = decl.name().to_string();
        if is_local && decl.usages == 0 && !name.starts_with('_') {
            self.push_warning(variable, WarningCode::UnusedVariable, &[&name, &name]);
        }
        self.is_shadowing(&name, variable.into(), "variable", is_local);
    }

    pub(crate) fn resolve_constant(&mut self, constant: ConstantId, is_local: bool) {
        self.resolve_assignable(AssignableId::Constant(constant));
        let decl = &self.tree()[constant].decl;
        let name = decl.name().to_string();
        if is_local && decl.usages == 0 && !name.starts_with('_') {
            self.push_warning(constant, WarningCode::UnusedLocalConstant, &[&name, &name]);
        }
        self.is_shadowing(&name, constant.into(), "constant", is_local);
    }

    pub(crate) fn resolve_parameter(&mut self, parameter: ParameterId) {
        self.resolve_assignable(AssignableId::Parameter(parameter));
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_core::{TypeSource, VariantType, WarningCode};
    use orchestrator_parser::{FuncDecl, ScriptParser, ScriptPool, TreeBuilder, VarDecl};
    use orchestrator_registry::Host;

    use crate::config::AnalyzerConfig;
    use crate::context::Analyzer;

    fn analyze(b: TreeBuilder) -> ScriptParser {
        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let _ = Analyzer::new(&mut pool, &host, &config, id).analyze();
        pool[id].clone()
    }

    #[test]
    fn inferred_variable_takes_initializer_type() {
        let mut b = TreeBuilder::new("res://a.os");
        let value = b.lit(1.5);
        let id = b.variable(VarDecl::new("speed").inferred(value));
        let script = analyze(b);
        let ty = &script.tree[id].decl.data_type;
        assert_eq!(ty.builtin_type, VariantType::Float);
        assert_eq!(ty.type_source, TypeSource::AnnotatedInferred);
    }

    #[test]
    fn incompatible_initializer_is_an_error() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let text = b.lit("x");
        b.variable(VarDecl::new("count").typed(int).init(text));
        let script = analyze(b);
        assert_eq!(
            script.errors[0].message,
            r#"Cannot assign a value of type "String" as "int"."#
        );
    }

    #[test]
    fn inferring_from_null_is_an_error() {
        let mut b = TreeBuilder::new("res://a.os");
        let null = b.null();
        b.variable(VarDecl::new("thing").inferred(null));
        let script = analyze(b);
        assert_eq!(
            script.errors[0].message,
            r#"Cannot infer the type of "thing" variable because the value is "null"."#
        );
    }

    #[test]
    fn float_into_int_narrows() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let value = b.lit(2.5);
        let id = b.variable(VarDecl::new("count").typed(int).init(value));
        let script = analyze(b);
        assert!(script.errors.is_empty(), "{:?}", script.errors);
        assert!(script.warnings.iter().any(|w| w.code == WarningCode::NarrowingConversion));
        assert_eq!(script.tree[id].decl.data_type.builtin_type, VariantType::Int);
    }

    #[test]
    fn unused_local_variable_warns() {
        let mut b = TreeBuilder::new("res://a.os");
        let one = b.lit(1);
        let body = b.suite_of(|b| vec![b.local_var(VarDecl::new("unused").init(one)), b.pass()]);
        b.function(FuncDecl::new("f").body(body));
        let script = analyze(b);
        let unused: Vec<_> = script
            .warnings
            .iter()
            .filter(|w| w.code == WarningCode::UnusedVariable)
            .collect();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].symbols[0], "unused");
    }

    #[test]
    fn non_constant_constant_initializer() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        b.variable(VarDecl::new("x").typed(int));
        let x = b.ident("x");
        b.constant(VarDecl::new("Y").init(x));
        let script = analyze(b);
        assert!(script
            .errors
            .iter()
            .any(|e| e.message == r#"Assigned value for constant "Y" isn't a constant expression."#));
    }
}
