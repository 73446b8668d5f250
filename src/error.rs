//! Error types for rendering, diffing and reconciling VRP configuration.
//!
//! Every operation in this crate either returns a complete result or fails
//! before any command is produced. None of these errors are retried here.

use thiserror::Error;

/// Errors that can occur while turning intents into VRP commands.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A line of captured running configuration was absent.
    ///
    /// This usually points at a capture bug in the transport layer.
    #[error("running config line {index} is absent")]
    Normalization { index: usize },

    /// No renderer is registered for the intent kind.
    #[error("unsupported intent kind '{kind}'")]
    UnsupportedIntent { kind: String },

    /// Removal was requested for state whose command has no undo form.
    ///
    /// The attribute can only be replaced with another value, not cleared.
    #[error("intent '{kind}' cannot be removed: '{command}' has no undo form")]
    UndoUnsupported { kind: String, command: String },

    /// The intent parameters do not fit the kind's parameter shape.
    #[error("invalid parameters for intent '{kind}': {reason}")]
    InvalidIntent { kind: String, reason: String },

    /// An undo override pattern failed to compile.
    #[error("invalid undo pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A command script violates its invariants.
    #[error("invalid command script: {0}")]
    InvalidScript(String),

    /// Reading or writing a backup file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a schema or report failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}
