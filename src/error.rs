//! Centralized error types for maildoc.
//!
//! Message parsing itself never fails; these errors come from the I/O-facing
//! parts of the crate (message sources, export, configuration).

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the maildoc library.
#[derive(Error, Debug)]
pub enum MaildocError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file or directory does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The directory is not a Maildir (missing `cur/` or `new/`).
    #[error("Not a Maildir directory: {0}")]
    InvalidMaildir(PathBuf),

    /// No message with this sequence number exists in the source.
    #[error("No message with id {0}")]
    MessageNotFound(u32),

    /// A message length that cannot be addressed in memory on this platform.
    #[error("Message of {0} bytes is too large to load")]
    MessageTooLarge(u64),

    /// An export operation failed.
    #[error("Export error: {0}")]
    ExportError(String),
}

/// Convenience alias for `Result<T, MaildocError>`.
pub type Result<T> = std::result::Result<T, MaildocError>;

impl MaildocError {
    /// Create an `Io` variant from a path and an `io::Error`.
    ///
    /// `NotFound` errors are mapped to [`MaildocError::FileNotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::FileNotFound(path);
        }
        Self::Io { path, source }
    }
}
