//! Error Types

use std::path::PathBuf;

/// Errors surfaced by the quarantine policy engine.
///
/// Move and directory-lookup failures are deliberately NOT represented
/// here; those downgrade to result variants
/// ([`crate::QuarantineResult::NotMoved`], [`crate::ResolveOutcome::NotFound`])
/// and callers branch on them. This enum covers the structural failures
/// that terminate a run.
#[derive(Debug, thiserror::Error)]
pub enum DarqError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed incident document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("incident document is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("unparseable {field} value '{value}'")]
    BadField { field: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("mail delivery failed: {0}")]
    Mail(String),
}

impl DarqError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
