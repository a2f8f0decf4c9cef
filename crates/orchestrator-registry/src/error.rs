//! Errors raised by the host oracles.

use thiserror::Error;

/// Why the script cache could not serve a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("file not found: '{0}'")]
    NotFound(String),

    /// The file exists but is neither a script nor a known resource.
    #[error("unrecognized resource: '{0}'")]
    Unrecognized(String),

    /// The script exists but its tree could not be produced.
    #[error("could not parse '{path}': {reason}")]
    Parse { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(CacheError::NotFound("res://a.os".into()).to_string(), "file not found: 'res://a.os'");
        let err = CacheError::Parse {
            path: "res://b.os".into(),
            reason: "bad graph".into(),
        };
        assert_eq!(err.to_string(), "could not parse 'res://b.os': bad graph");
    }
}
