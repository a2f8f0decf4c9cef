//! Analyzer state, diagnostic plumbing and cross-file delegation.
//!
//! An [`Analyzer`] works on one parser of the pool at a time. Work on a class
//! owned by another parser is delegated to a fresh analyzer over the same pool,
//! so every tree is only ever mutated by the analyzer responsible for it.

use orchestrator_core::{
    AnalysisError, ClassId, ClassRef, EnumId, FunctionId, LambdaId, NodeId, ParserId, Span, Warning,
    WarningCode, WarningLevel,
};
use orchestrator_parser::{ClassNode, ParserStatus, ScriptParser, ScriptPool, Tree};
use orchestrator_registry::{CachedScript, Host};

use crate::config::AnalyzerConfig;

/// Multi-pass semantic analyzer for one script of a [`ScriptPool`].
pub struct Analyzer<'a> {
    pub(crate) pool: &'a mut ScriptPool,
    pub(crate) host: &'a Host,
    pub(crate) config: &'a AnalyzerConfig,
    pub(crate) parser: ParserId,
    pub(crate) current_class: ClassId,
    pub(crate) current_function: Option<FunctionId>,
    pub(crate) current_lambda: Option<LambdaId>,
    pub(crate) current_enum: Option<EnumId>,
    pub(crate) static_context: bool,
    /// Lambdas whose signature resolved but whose body has not.
    pub(crate) pending_lambdas: Vec<LambdaId>,
}

impl<'a> Analyzer<'a> {
    pub fn new(pool: &'a mut ScriptPool, host: &'a Host, config: &'a AnalyzerConfig, parser: ParserId) -> Self {
        Self {
            pool,
            host,
            config,
            parser,
            current_class: Tree::HEAD,
            current_function: None,
            current_lambda: None,
            current_enum: None,
            static_context: false,
            pending_lambdas: Vec::new(),
        }
    }

    pub fn parser_id(&self) -> ParserId {
        self.parser
    }

    // ------------------------------------------------------------------------
    // Tree access
    // ------------------------------------------------------------------------

    #[inline]
    pub(crate) fn script(&self) -> &ScriptParser {
        &self.pool[self.parser]
    }

    #[inline]
    pub(crate) fn script_mut(&mut self) -> &mut ScriptParser {
        &mut self.pool[self.parser]
    }

    #[inline]
    pub(crate) fn tree(&self) -> &Tree {
        &self.pool[self.parser].tree
    }

    #[inline]
    pub(crate) fn tree_mut(&mut self) -> &mut Tree {
        &mut self.pool[self.parser].tree
    }

    #[inline]
    pub(crate) fn class_ref(&self, class: ClassId) -> ClassRef {
        ClassRef::new(self.parser, class)
    }

    #[inline]
    pub(crate) fn owns(&self, class: ClassRef) -> bool {
        class.parser == self.parser
    }

    pub(crate) fn class_node(&self, class: ClassRef) -> &ClassNode {
        self.pool.class(class)
    }

    pub(crate) fn current_class_ref(&self) -> ClassRef {
        self.class_ref(self.current_class)
    }

    /// Run `f` with an analyzer responsible for `parser`.
    pub(crate) fn delegate<R>(&mut self, parser: ParserId, f: impl FnOnce(&mut Analyzer<'_>) -> R) -> R {
        tracing::trace!(from = %self.parser, to = %parser, "delegating");
        let mut other = Analyzer::new(&mut *self.pool, self.host, self.config, parser);
        f(&mut other)
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    pub(crate) fn span_of(&self, node: NodeId) -> Span {
        let tree = self.tree();
        match node {
            NodeId::Class(id) => tree[id].span,
            NodeId::Function(id) => tree[id].span,
            NodeId::Variable(id) => tree[id].decl.span,
            NodeId::Constant(id) => tree[id].decl.span,
            NodeId::Parameter(id) => tree[id].decl.span,
            NodeId::Signal(id) => tree[id].span,
            NodeId::Enum(id) => tree[id].span,
            NodeId::EnumValue(id, index) => tree[id]
                .values
                .get(index)
                .map_or(tree[id].span, |value| value.identifier.span),
            NodeId::Expr(id) => tree[id].span,
            NodeId::Suite(id) => tree[id].span,
            NodeId::Stmt(id) => tree[id].span,
            NodeId::Type(id) => tree[id].span,
            NodeId::Annotation(id) => tree[id].span,
            NodeId::Pattern(id) => tree[id].span,
        }
    }

    /// Record an error on `node`; the node is also marked unsafe.
    pub(crate) fn push_error(&mut self, message: impl Into<String>, node: impl Into<NodeId>) {
        let node = node.into();
        self.mark_unsafe(node);
        let span = self.span_of(node);
        self.script_mut().push_error(message, span, Some(node));
    }

    pub(crate) fn mark_unsafe(&mut self, node: impl Into<NodeId>) {
        if self.config.debug {
            let node = node.into();
            self.script_mut().mark_unsafe(node);
        }
    }

    pub(crate) fn push_warning(&mut self, node: impl Into<NodeId>, code: WarningCode, symbols: &[&str]) {
        if !self.config.debug || self.config.is_path_ignored(&self.script().path) {
            return;
        }
        let node = node.into();
        let level = self.config.warning_level(code);
        if level == WarningLevel::Ignore {
            return;
        }
        let symbols: Vec<String> = symbols.iter().map(|symbol| symbol.to_string()).collect();
        let message = code.message(&symbols);
        let span = self.span_of(node);
        if level == WarningLevel::Error {
            self.script_mut().push_error(message, span, Some(node));
        } else {
            self.script_mut().push_warning(Warning {
                code,
                symbols,
                message,
                span,
                node: Some(node),
            });
        }
    }

    pub(crate) fn error_count(&self) -> usize {
        self.script().error_count()
    }

    pub(crate) fn result(&self) -> Result<(), AnalysisError> {
        let script = self.script();
        if script.has_errors() {
            Err(AnalysisError::ParseError {
                path: script.path.clone(),
                count: script.error_count(),
            })
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------------
    // Dependencies
    // ------------------------------------------------------------------------

    /// The parser of the orchestration script at `path`, loading it through
    /// the script cache when the pool does not know it yet.
    pub(crate) fn depended_parser_for(&mut self, path: &str) -> Option<ParserId> {
        if let Some(&parser) = self.script().depended_parsers.get(path) {
            return Some(parser);
        }
        let parser = match self.pool.find(path) {
            Some(parser) => parser,
            None => match self.host.scripts.load(path) {
                Ok(CachedScript::Source(script)) => {
                    tracing::debug!(path, "loaded dependency");
                    self.pool.insert(script)
                }
                Ok(_) => return None,
                Err(err) => {
                    tracing::debug!(path, %err, "dependency unavailable");
                    return None;
                }
            },
        };
        self.script_mut().add_dependency(path, parser);
        Some(parser)
    }

    /// Raise `parser` to `target`, running the passes in between.
    ///
    /// The status is bumped before a pass runs, so re-entrant raises are
    /// no-ops. Returns whether the parser is free of errors.
    pub(crate) fn raise_status(&mut self, parser: ParserId, target: ParserStatus) -> bool {
        loop {
            let status = self.pool[parser].status;
            if status >= target {
                break;
            }
            let next = next_status(status);
            self.pool[parser].status = next;
            tracing::debug!(path = %self.pool[parser].path, status = %next, "raising status");
            self.delegate(parser, |analyzer| match next {
                ParserStatus::InheritanceSolved => {
                    let _ = analyzer.resolve_inheritance();
                }
                ParserStatus::InterfaceSolved => {
                    let _ = analyzer.resolve_interface();
                }
                ParserStatus::FullySolved => {
                    let _ = analyzer.resolve_body();
                    let _ = analyzer.resolve_dependencies();
                }
                ParserStatus::Empty | ParserStatus::Parsed => {}
            });
        }
        !self.pool[parser].has_errors()
    }

    /// Bump this parser's status without running anything.
    pub(crate) fn bump_status(&mut self, status: ParserStatus) {
        let script = self.script_mut();
        if script.status < status {
            script.status = status;
        }
    }
}

fn next_status(status: ParserStatus) -> ParserStatus {
    match status {
        ParserStatus::Empty => ParserStatus::Parsed,
        ParserStatus::Parsed => ParserStatus::InheritanceSolved,
        ParserStatus::InheritanceSolved => ParserStatus::InterfaceSolved,
        ParserStatus::InterfaceSolved | ParserStatus::FullySolved => ParserStatus::FullySolved,
    }
}
