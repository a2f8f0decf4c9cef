//! Integration tests running whole projects through the analyzer.
//!
//! Scripts are built with `TreeBuilder`; dependencies are served by the
//! fixture host in `common`.

mod common;

use common::{error_messages, project_with};
use orchestrator::parser::{AssignOp, BinaryOp};
use orchestrator::prelude::*;

// =============================================================================
// Cross-file resolution
// =============================================================================

#[test]
fn test_global_class_base_from_cache() {
    let mut b = TreeBuilder::new("res://player.os");
    b.extends(&["Weapon"]);
    let int = b.ty("int");
    let call = b.call("damage", vec![]);
    let body = b.suite_of(|b| vec![b.ret(Some(call))]);
    b.function(FuncDecl::new("total").returns(int).body(body));

    let mut project = project_with(vec![]);
    let id = project.add_script(b.build());
    assert_eq!(project.analyze(id), Ok(()), "{:?}", error_messages(&project));

    assert!(project.find("res://weapon.os").is_some());
    let call_type = &project.script(id).tree[call].data_type;
    assert!(call_type.is_builtin(VariantType::Int));
}

#[test]
fn test_singleton_autoload_members() {
    let mut b = TreeBuilder::new("res://hud.os");
    b.extends(&["Node"]);
    let int = b.ty("int");
    let game = b.ident("Game");
    let score = b.attribute(game, "score");
    let one = b.lit(1);
    let next = b.binary(BinaryOp::Add, score, one);
    let body = b.suite_of(|b| vec![b.ret(Some(next))]);
    b.function(FuncDecl::new("next_score").returns(int).body(body));

    let mut project = project_with(vec![]);
    let id = project.add_script(b.build());
    assert_eq!(project.analyze(id), Ok(()), "{:?}", error_messages(&project));

    let tree = &project.script(id).tree;
    assert_eq!(tree[game].data_type.kind, Kind::Class);
    assert!(tree[score].data_type.is_builtin(VariantType::Int));
}

#[test]
fn test_dependencies_are_analyzed_once() {
    let mut b = TreeBuilder::new("res://sword.os");
    b.extends(&["Weapon"]);
    let mut c = TreeBuilder::new("res://axe.os");
    c.extends(&["Weapon"]);

    let mut project = project_with(vec![]);
    project.add_script(b.build());
    project.add_script(c.build());
    assert!(project.analyze_all().is_empty(), "{:?}", error_messages(&project));

    // Two entry scripts plus the shared base.
    assert_eq!(project.pool().len(), 3);
    for (_, script) in project.pool().iter() {
        assert_eq!(script.status, ParserStatus::FullySolved);
    }
}

#[test]
fn test_cyclic_extends_paths() {
    let mut a = TreeBuilder::new("res://a.os");
    a.extends_path("res://b.os");
    let mut b = TreeBuilder::new("res://b.os");
    b.extends_path("res://a.os");

    let mut project = project_with(vec![a.build(), b.build()]);
    let id = project.load("res://a.os").unwrap();
    assert!(project.analyze(id).is_err());
    assert_eq!(cyclic_errors(&project), 1, "{:?}", error_messages(&project));
}

#[test]
fn test_three_script_extends_cycle() {
    let mut a = TreeBuilder::new("res://a.os");
    a.extends_path("res://b.os");
    let mut b = TreeBuilder::new("res://b.os");
    b.extends_path("res://c.os");
    let mut c = TreeBuilder::new("res://c.os");
    c.extends_path("res://a.os");

    let mut project = project_with(vec![a.build(), b.build(), c.build()]);
    let id = project.load("res://a.os").unwrap();
    assert!(project.analyze(id).is_err());
    assert_eq!(cyclic_errors(&project), 1, "{:?}", error_messages(&project));
}

#[test]
fn test_missing_super_class_path() {
    let mut b = TreeBuilder::new("res://orphan.os");
    b.extends_path("res://nope.os");

    let mut project = project_with(vec![]);
    let id = project.add_script(b.build());
    let result = project.analyze(id);
    assert!(matches!(result, Err(AnalysisError::ParseError { .. })));
    assert!(error_messages(&project).contains(&r#"Could not resolve super class path "res://nope.os"."#.to_string()));
}

#[test]
fn test_foreign_script_base() {
    let mut b = TreeBuilder::new("res://wrapper.os");
    b.extends_path("res://helper.gd");
    let count = b.call("get_child_count", vec![]);
    let body = b.suite_of(|b| vec![b.ret(Some(count))]);
    b.function(FuncDecl::new("children").body(body));

    let mut project = project_with(vec![]);
    let id = project.add_script(b.build());
    assert_eq!(project.analyze(id), Ok(()), "{:?}", error_messages(&project));
    assert!(project.script(id).tree[count].data_type.is_builtin(VariantType::Int));
}

#[test]
fn test_super_call_into_script_base() {
    let mut b = TreeBuilder::new("res://sword.os");
    b.extends(&["Weapon"]);
    let int = b.ty("int");
    let base_damage = b.super_call("damage", vec![]);
    let two = b.lit(2);
    let doubled = b.binary(BinaryOp::Mul, base_damage, two);
    let body = b.suite_of(|b| vec![b.ret(Some(doubled))]);
    b.function(FuncDecl::new("damage").returns(int).body(body));

    let mut project = project_with(vec![]);
    let id = project.add_script(b.build());
    assert_eq!(project.analyze(id), Ok(()), "{:?}", error_messages(&project));
    assert!(project.script(id).tree[base_damage].data_type.is_builtin(VariantType::Int));
}

fn cyclic_errors(project: &Project) -> usize {
    error_messages(project)
        .iter()
        .filter(|message| message.contains("Cyclic"))
        .count()
}

// =============================================================================
// Container literals
// =============================================================================

#[test]
fn test_untyped_literal_narrows_to_declared_array() {
    let mut b = TreeBuilder::new("res://inventory.os");
    let int = b.ty("int");
    let list_type = b.ty_container("Array", vec![int]);
    let elements = vec![b.lit(1), b.lit(2), b.lit(3)];
    let list = b.array(elements);
    b.variable(VarDecl::new("slots").typed(list_type).init(list));

    let mut project = project_with(vec![]);
    let id = project.add_script(b.build());
    assert_eq!(project.analyze(id), Ok(()), "{:?}", error_messages(&project));
    let element = project.script(id).tree[list].data_type.get_container_element_type(0).cloned();
    assert!(element.is_some_and(|element| element.is_builtin(VariantType::Int)));
}

#[test]
fn test_mismatched_literal_element_reports_once() {
    let mut b = TreeBuilder::new("res://inventory.os");
    let int = b.ty("int");
    let list_type = b.ty_container("Array", vec![int]);
    let one = b.lit(1);
    let text = b.lit("x");
    let list = b.array(vec![one, text]);
    b.variable(VarDecl::new("slots").typed(list_type).init(list));

    let mut project = project_with(vec![]);
    let id = project.add_script(b.build());
    assert!(project.analyze(id).is_err());
    assert_eq!(
        error_messages(&project),
        vec![r#"Cannot include a value of type "String" as "int"."#.to_string()]
    );
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn test_loops_and_patterns() {
    let mut b = TreeBuilder::new("res://loop.os");
    let int = b.ty("int");
    let array = b.ty("Array");
    let zero = b.lit(0);
    let count_read = b.ident("count");
    let limit = b.lit(3);
    let condition = b.binary(BinaryOp::Less, count_read, limit);
    let count_write = b.ident("count");
    let one = b.lit(1);
    let step = b.assign_op(AssignOp::AddAssign, count_write, one);
    let count_check = b.ident("count");
    let two = b.lit(2);
    let is_two = b.binary(BinaryOp::Equal, count_check, two);
    let values = b.ident("values");
    let first = b.lit(1);
    let key = b.lit("kind");
    let body = b.suite_of(|b| {
        let stop = b.suite_of(|b| vec![b.break_()]);
        let loop_body = b.suite_of(|b| vec![b.expr_stmt(step), b.if_(is_two, stop, None), b.continue_()]);
        let head = b.pat_literal(first);
        let rest = b.pat_rest();
        let leading_one = b.pat_array(vec![head, rest]);
        let any_kind = b.pat_wildcard();
        let with_kind = b.pat_dict(vec![(Some(key), Some(any_kind))]);
        let fallback = b.pat_wildcard();
        let first_block = b.suite_of(|b| vec![b.pass()]);
        let second_block = b.suite_of(|b| vec![b.pass()]);
        let third_block = b.suite_of(|b| vec![b.pass()]);
        vec![
            b.local_var(VarDecl::new("count").typed(int).init(zero)),
            b.while_(condition, loop_body),
            b.breakpoint(),
            b.match_(
                values,
                vec![
                    BranchDecl::new(vec![leading_one], first_block),
                    BranchDecl::new(vec![with_kind], second_block),
                    BranchDecl::new(vec![fallback], third_block),
                ],
            ),
        ]
    });
    b.function(
        FuncDecl::new("tick")
            .param(ParamDecl::new("values").typed(array))
            .body(body),
    );

    let mut project = project_with(vec![]);
    let id = project.add_script(b.build());
    assert_eq!(project.analyze(id), Ok(()), "{:?}", error_messages(&project));
    let tree = &project.script(id).tree;
    assert!(tree[condition].data_type.is_builtin(VariantType::Bool));
    assert!(tree[step].data_type.is_builtin(VariantType::Int));
}

// =============================================================================
// Preload
// =============================================================================

#[test]
fn test_relative_preload_resolves_against_script_dir() {
    let mut b = TreeBuilder::new("res://scenes/main.os");
    let icon = b.preload("../icon.png");
    b.constant(VarDecl::new("ICON").init(icon));

    let mut project = project_with(vec![]);
    let id = project.add_script(b.build());
    assert_eq!(project.analyze(id), Ok(()), "{:?}", error_messages(&project));

    let ty = &project.script(id).tree[icon].data_type;
    assert_eq!(ty.kind, Kind::Native);
    assert_eq!(ty.native_type, "Texture2D");
}

#[test]
fn test_missing_preload() {
    let mut b = TreeBuilder::new("res://main.os");
    let missing = b.preload("res://missing.png");
    b.constant(VarDecl::new("MISSING").init(missing));

    let mut project = project_with(vec![]);
    let id = project.add_script(b.build());
    assert!(project.analyze(id).is_err());
    assert!(error_messages(&project).contains(&r#"Preload file "res://missing.png" does not exist."#.to_string()));
}

// =============================================================================
// Configuration
// =============================================================================

fn integer_division_script(path: &str) -> ScriptParser {
    let mut b = TreeBuilder::new(path);
    let int = b.ty("int");
    let seven = b.lit(7);
    let two = b.lit(2);
    let half = b.binary(BinaryOp::Div, seven, two);
    let body = b.suite_of(|b| vec![b.ret(Some(half))]);
    b.function(FuncDecl::new("half").returns(int).body(body));
    b.build()
}

#[test]
fn test_warnings_reported_by_default() {
    let mut project = project_with(vec![]);
    let id = project.add_script(integer_division_script("res://math.os"));
    assert_eq!(project.analyze(id), Ok(()));
    assert!(project.warnings().any(|(_, warning)| warning.code == WarningCode::IntegerDivision));
}

#[test]
fn test_warnings_as_errors() {
    let config = AnalyzerConfig::default().with_warnings_as_errors(true);
    let mut project = Project::new(common::host_fixture(vec![]), config);
    let id = project.add_script(integer_division_script("res://math.os"));
    assert!(project.analyze(id).is_err());
    assert!(error_messages(&project).contains(&"Integer division. Decimal part will be discarded.".to_string()));
}

#[test]
fn test_ignored_paths_and_release_config() {
    let config = AnalyzerConfig::default().with_ignored_path("res://addons/");
    let mut project = Project::new(common::host_fixture(vec![]), config);
    let id = project.add_script(integer_division_script("res://addons/tool/math.os"));
    assert_eq!(project.analyze(id), Ok(()));
    assert_eq!(project.warnings().count(), 0);

    let mut project = Project::new(common::host_fixture(vec![]), AnalyzerConfig::release());
    let id = project.add_script(integer_division_script("res://math.os"));
    assert_eq!(project.analyze(id), Ok(()));
    assert_eq!(project.warnings().count(), 0);
    assert!(project.script(id).unsafe_nodes.is_empty());
}

#[test]
fn test_level_override() {
    let config = AnalyzerConfig::default().with_warning_level(WarningCode::IntegerDivision, WarningLevel::Ignore);
    let mut project = Project::new(common::host_fixture(vec![]), config);
    let id = project.add_script(integer_division_script("res://math.os"));
    assert_eq!(project.analyze(id), Ok(()));
    assert_eq!(project.warnings().count(), 0);
}
