//! Unified error type for the reelshelf application.
//!
//! All modules funnel their failures into [`Error`], which carries enough
//! context for HTTP handlers to derive a status code via
//! [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in reelshelf.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A user-supplied path resolved outside the library root.
    ///
    /// This is a security boundary, never silently corrected.
    #[error("invalid path: must be within the library root")]
    InvalidPath,

    /// A `Range` header was malformed or out of bounds for the file.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Request data failed validation (missing parameter, wrong target kind).
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "file", "subtitle track").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Media probing failed or timed out.
    #[error("probe error: {0}")]
    Probe(String),

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidPath => 400,
            Error::InvalidRange(_) => 400,
            Error::Validation(_) => 400,
            Error::NotFound { .. } => 404,
            Error::Probe(_) => 500,
            Error::Tool { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
