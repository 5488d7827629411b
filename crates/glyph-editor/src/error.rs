//! Engine error types.

use glyph_core::GlyphError;
use thiserror::Error;

/// Failures of the transactional edit layer.
///
/// Misuse of the preview/batch protocol (reentrant begin, commit without
/// begin) is a programming error: it is reported, never silently ignored,
/// and never leaves the document half-changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("a preview transaction is already open")]
    PreviewAlreadyOpen,
    #[error("no preview transaction is open")]
    NoPreviewOpen,
    #[error("cannot undo or redo while a preview transaction is open")]
    PreviewInProgress,
    #[error("a command batch is already open")]
    BatchAlreadyOpen,
    #[error("no command batch is open")]
    NoBatchOpen,
    #[error(transparent)]
    Glyph(#[from] GlyphError),
}

/// Failure to load an [`EditorConfig`](crate::config::EditorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid editor config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid editor config: {0}")]
    Invalid(String),
}
