//! Analysis passes.
//!
//! - [`inheritance`]: base types of every class, cycle detection
//! - [`members`]: the declared type of each class member
//! - [`interface`]: every member of every class, in declaration order
//! - [`body`]: function bodies, accessors and class-level checks
//! - [`signature`]: function signatures and override validation
//!
//! Each pass is memoized per node, so passes may re-enter each other (and
//! other scripts through the pool) in any order.

mod body;
mod inheritance;
mod interface;
mod members;
mod signature;

use orchestrator_core::AnalysisError;
use orchestrator_parser::{ParserStatus, Tree};

use crate::context::Analyzer;

impl Analyzer<'_> {
    pub(crate) fn parse_error(&self) -> AnalysisError {
        let script = self.script();
        AnalysisError::ParseError {
            path: script.path.clone(),
            count: script.error_count().max(1),
        }
    }

    /// Resolve the base type of every class of the script.
    pub fn resolve_inheritance(&mut self) -> Result<(), AnalysisError> {
        tracing::debug!(path = %self.script().path, "resolving inheritance");
        let head = self.class_ref(Tree::HEAD);
        self.resolve_class_inheritance_recursive(head)
    }

    /// Resolve the type of every member of every class.
    pub fn resolve_interface(&mut self) -> Result<(), AnalysisError> {
        tracing::debug!(path = %self.script().path, "resolving interface");
        let head = self.class_ref(Tree::HEAD);
        self.resolve_class_interface_recursive(head);
        self.result()
    }

    /// Resolve every function body and run the class-level checks.
    pub fn resolve_body(&mut self) -> Result<(), AnalysisError> {
        tracing::debug!(path = %self.script().path, "resolving bodies");
        let head = self.class_ref(Tree::HEAD);
        self.resolve_class_body_recursive(head);
        self.result()
    }

    /// Bring every script this one depends on to at least inheritance.
    pub fn resolve_dependencies(&mut self) -> Result<(), AnalysisError> {
        let dependencies: Vec<_> = self.script().depended_parsers.values().copied().collect();
        tracing::debug!(path = %self.script().path, count = dependencies.len(), "resolving dependencies");
        for parser in dependencies {
            self.raise_status(parser, ParserStatus::InheritanceSolved);
        }
        self.result()
    }

    /// Run every pass. Diagnostics recorded before the call are kept.
    ///
    /// The status ladder is bumped ahead of each pass so that scripts reached
    /// through a dependency cycle see this one as already in progress.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn analyze(&mut self) -> Result<(), AnalysisError> {
        self.bump_status(ParserStatus::InheritanceSolved);
        self.resolve_inheritance()?;

        self.bump_status(ParserStatus::InterfaceSolved);
        // Interface errors do not stop body analysis.
        let _ = self.resolve_interface();

        self.bump_status(ParserStatus::FullySolved);
        self.resolve_body()?;
        self.resolve_dependencies()
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_parser::{FuncDecl, ScriptPool, TreeBuilder, VarDecl};
    use orchestrator_registry::Host;

    use crate::config::AnalyzerConfig;
    use crate::context::Analyzer;

    fn run_twice(
        analyzer: &mut Analyzer<'_>,
        pass: impl Fn(&mut Analyzer<'_>) -> Result<(), orchestrator_core::AnalysisError>,
    ) -> (usize, usize) {
        let _ = pass(analyzer);
        let first = analyzer.error_count();
        let _ = pass(analyzer);
        (first, analyzer.error_count())
    }

    #[test]
    fn passes_do_not_repeat_diagnostics() {
        let mut b = TreeBuilder::new("res://a.os");
        let int = b.ty("int");
        let text = b.lit("x");
        b.variable(VarDecl::new("count").typed(int).init(text));
        let returns = b.ty("int");
        let other_text = b.lit("y");
        let body = b.suite_of(|b| vec![b.ret(Some(other_text))]);
        b.function(FuncDecl::new("total").returns(returns).body(body));

        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);

        let (first, second) = run_twice(&mut analyzer, |a| a.resolve_inheritance());
        assert_eq!((first, second), (0, 0));
        let (interface, again) = run_twice(&mut analyzer, |a| a.resolve_interface());
        assert!(interface > 0);
        assert_eq!(again, interface);
        let (body, again) = run_twice(&mut analyzer, |a| a.resolve_body());
        assert!(body > interface);
        assert_eq!(again, body);
    }

    #[test]
    fn failed_inheritance_is_reported_once() {
        let mut b = TreeBuilder::new("res://a.os");
        b.extends_path("res://missing.os");

        let mut pool = ScriptPool::new();
        let id = pool.insert(b.build());
        let host = Host::standard();
        let config = AnalyzerConfig::default();
        let mut analyzer = Analyzer::new(&mut pool, &host, &config, id);

        let (first, second) = run_twice(&mut analyzer, |a| a.resolve_inheritance());
        assert_eq!(first, 1);
        assert_eq!(second, first);
    }
}
