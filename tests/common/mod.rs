//! Shared fixtures for the integration tests.
//!
//! The fixture project has:
//! - `Weapon`, a global class at `res://weapon.os` with `damage() -> int`
//! - `Game`, a singleton autoload at `res://game.os` with `var score: int`
//! - `res://icon.png`, a `Texture2D` resource
//! - `res://helper.gd`, a foreign script extending `Node`

#![allow(dead_code)]

use orchestrator::core::ForeignScript;
use orchestrator::prelude::*;

/// Install a test-writer subscriber; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn weapon_script() -> ScriptParser {
    let mut b = TreeBuilder::new("res://weapon.os");
    b.class_name("Weapon").extends(&["Node"]);
    let int = b.ty("int");
    let five = b.lit(5);
    let body = b.suite_of(|b| vec![b.ret(Some(five))]);
    b.function(FuncDecl::new("damage").returns(int).body(body));
    b.build()
}

pub fn game_script() -> ScriptParser {
    let mut b = TreeBuilder::new("res://game.os");
    b.extends(&["Node"]);
    let int = b.ty("int");
    let zero = b.lit(0);
    b.variable(VarDecl::new("score").typed(int).init(zero));
    b.build()
}

/// A host whose script cache serves the fixture scripts plus `extra`.
pub fn host_fixture(extra: Vec<ScriptParser>) -> Host {
    let mut project = ProjectRegistry::new();
    project
        .add_global_class("Weapon", "res://weapon.os", "Node")
        .add_autoload("Game", "res://game.os", true);

    let mut scripts = MemoryScriptCache::new();
    scripts
        .insert_source(weapon_script())
        .insert_source(game_script())
        .insert_resource("res://icon.png", "Texture2D")
        .insert_foreign(ForeignScript::new("res://helper.gd", "Node"));
    for script in extra {
        scripts.insert_source(script);
    }

    Host::standard().with_project(project).with_scripts(scripts)
}

pub fn project_with(extra: Vec<ScriptParser>) -> Project {
    init_tracing();
    Project::new(host_fixture(extra), AnalyzerConfig::default())
}

pub fn error_messages(project: &Project) -> Vec<String> {
    project.errors().map(|(_, error)| error.message.clone()).collect()
}
