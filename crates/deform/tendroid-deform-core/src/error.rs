//! Error types for the deformation engine.
//!
//! Kernel and buffer-shape errors are surfaced to the caller unchanged. Errors raised
//! by the host document are wrapped so the offending identifier travels with them;
//! the engine absorbs those into boolean results at the registry/bridge boundary.

use crate::document::DocumentError;

/// Deformation core result type.
pub type Result<T> = core::result::Result<T, DeformError>;

/// Errors produced by the deformation core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DeformError {
    /// Buffer length mismatch, descriptor out of bounds or malformed buffer shape.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A registry or bridge call was issued before a document was attached.
    #[error("No document attached")]
    NotAttached,

    /// Bridge write against an identifier with no registry entry.
    #[error("Unknown identifier: {identifier}")]
    UnknownIdentifier { identifier: String },

    /// The document could not resolve an identifier into a writable attribute.
    #[error("Failed to resolve '{identifier}': {source}")]
    ExternalResolution {
        identifier: String,
        source: DocumentError,
    },

    /// The document rejected a commit.
    #[error("Failed to commit '{identifier}': {source}")]
    ExternalCommit {
        identifier: String,
        source: DocumentError,
    },
}

impl DeformError {
    /// Shorthand for an [`DeformError::InvalidArgument`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Whether the host may reasonably retry or skip and carry on.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidArgument { .. })
    }

    /// Error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "validation",
            Self::NotAttached | Self::UnknownIdentifier { .. } => "registry",
            Self::ExternalResolution { .. } | Self::ExternalCommit { .. } => "document",
        }
    }
}
