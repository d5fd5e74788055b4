//! Host document boundary.
//!
//! The core never touches host scene types. Adapters implement [`Document`] to turn a
//! shape identifier (a path such as `/World/Tendroids/T_00`) into an opaque
//! [`AttributeHandle`] once, and to commit point arrays against that handle every
//! frame. The registry stores only identifiers and handles; lifetime of the host
//! objects behind a handle stays with the adapter.

pub mod memory;

pub use memory::MemoryDocument;

use serde::{Deserialize, Serialize};

/// Opaque token minted by a [`Document`] for one writable points attribute.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AttributeHandle(pub u64);

/// Failures reported by a host document.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("no prim at '{identifier}'")]
    NotFound { identifier: String },

    #[error("prim '{identifier}' has no writable points attribute")]
    MissingAttribute { identifier: String },

    #[error("attribute handle {0:?} is not valid")]
    InvalidHandle(AttributeHandle),

    #[error("document is closed")]
    Closed,

    #[error("write rejected: {reason}")]
    Rejected { reason: String },
}

/// Capability interface onto the host's scene document.
///
/// Implementations must never leave host state half-written: a failed `commit` keeps
/// whatever the attribute held before.
pub trait Document {
    /// Whether the document can currently serve requests. Attaching an invalid
    /// document fails.
    fn is_valid(&self) -> bool {
        true
    }

    /// Resolve a shape identifier to its writable points attribute.
    fn resolve(&mut self, identifier: &str) -> Result<AttributeHandle, DocumentError>;

    /// Replace the attribute's points.
    fn commit(&mut self, attribute: AttributeHandle, points: &[[f32; 3]])
        -> Result<(), DocumentError>;
}

impl<D: Document + ?Sized> Document for Box<D> {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn resolve(&mut self, identifier: &str) -> Result<AttributeHandle, DocumentError> {
        (**self).resolve(identifier)
    }

    fn commit(
        &mut self,
        attribute: AttributeHandle,
        points: &[[f32; 3]],
    ) -> Result<(), DocumentError> {
        (**self).commit(attribute, points)
    }
}
