//! Analyzer settings.
//!
//! Warnings are filtered when they are pushed: a disabled channel, an ignored
//! path or an `Ignore` level drops the warning, an `Error` level turns it into
//! an error diagnostic carrying the warning's message.

use orchestrator_core::{WarningCode, WarningLevel};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Master switch for the warning channel.
    pub warnings_enabled: bool,
    /// Report every emitted warning as an error.
    pub treat_warnings_as_errors: bool,
    /// Per-warning overrides of [`WarningCode::default_level`].
    pub warning_levels: FxHashMap<WarningCode, WarningLevel>,
    /// Scripts whose path starts with one of these never receive warnings.
    pub ignored_path_prefixes: Vec<String>,
    /// Track unsafe nodes and emit warnings.
    pub debug: bool,
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self {
            warnings_enabled: true,
            treat_warnings_as_errors: false,
            warning_levels: FxHashMap::default(),
            ignored_path_prefixes: Vec::new(),
            debug: true,
        }
    }

    /// No warnings and no unsafe-node tracking.
    pub fn release() -> Self {
        Self {
            warnings_enabled: false,
            debug: false,
            ..Self::new()
        }
    }

    pub fn with_warning_level(mut self, code: WarningCode, level: WarningLevel) -> Self {
        self.warning_levels.insert(code, level);
        self
    }

    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.treat_warnings_as_errors = enabled;
        self
    }

    pub fn with_ignored_path(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_path_prefixes.push(prefix.into());
        self
    }

    /// Effective level of a warning, before path filtering.
    pub fn warning_level(&self, code: WarningCode) -> WarningLevel {
        if !self.warnings_enabled {
            return WarningLevel::Ignore;
        }
        let level = self
            .warning_levels
            .get(&code)
            .copied()
            .unwrap_or_else(|| code.default_level());
        match level {
            WarningLevel::Warn if self.treat_warnings_as_errors => WarningLevel::Error,
            other => other,
        }
    }

    pub fn is_path_ignored(&self, path: &str) -> bool {
        self.ignored_path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_levels_come_from_the_catalogue() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.warning_level(WarningCode::IntegerDivision), WarningLevel::Warn);
        assert_eq!(config.warning_level(WarningCode::UnsafeCast), WarningLevel::Ignore);
    }

    #[test]
    fn overrides_and_escalation() {
        let config = AnalyzerConfig::new()
            .with_warning_level(WarningCode::UnsafeCast, WarningLevel::Warn)
            .with_warnings_as_errors(true);
        assert_eq!(config.warning_level(WarningCode::UnsafeCast), WarningLevel::Error);
        assert_eq!(config.warning_level(WarningCode::UntypedDeclaration), WarningLevel::Ignore);
    }

    #[test]
    fn release_disables_warnings() {
        let config = AnalyzerConfig::release();
        assert!(!config.debug);
        assert_eq!(config.warning_level(WarningCode::UnusedVariable), WarningLevel::Ignore);
    }

    #[test]
    fn ignored_paths() {
        let config = AnalyzerConfig::new().with_ignored_path("res://addons/");
        assert!(config.is_path_ignored("res://addons/tool/a.os"));
        assert!(!config.is_path_ignored("res://main.os"));
    }
}
