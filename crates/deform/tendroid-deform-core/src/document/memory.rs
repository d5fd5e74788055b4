//! Headless in-process document.
//!
//! Stands in for a host scene when running without one (benchmarks, tools, tests).
//! Clones share the same storage, so a caller can attach one clone to an engine and
//! inspect committed points through another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{AttributeHandle, Document, DocumentError};

#[derive(Debug, Default)]
struct Prim {
    /// `None` models a prim without a points attribute.
    points: Option<Vec<[f32; 3]>>,
    read_only: bool,
}

#[derive(Debug, Default)]
struct Inner {
    prims: hashbrown::HashMap<String, Prim>,
    handles: hashbrown::HashMap<String, AttributeHandle>,
    /// Handle index -> identifier.
    slots: Vec<String>,
    commits: u64,
    closed: bool,
}

/// Shared, cloneable in-memory [`Document`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add (or replace) a mesh prim with the given points.
    pub fn add_mesh(&self, identifier: impl Into<String>, points: Vec<[f32; 3]>) {
        self.lock().prims.insert(
            identifier.into(),
            Prim {
                points: Some(points),
                read_only: false,
            },
        );
    }

    /// Add a prim that has no points attribute.
    pub fn add_prim(&self, identifier: impl Into<String>) {
        self.lock().prims.insert(identifier.into(), Prim::default());
    }

    /// Delete a prim. Handles previously resolved for it become invalid.
    pub fn remove_prim(&self, identifier: &str) -> bool {
        self.lock().prims.remove(identifier).is_some()
    }

    /// Make commits against a prim fail.
    pub fn set_read_only(&self, identifier: &str, read_only: bool) {
        if let Some(prim) = self.lock().prims.get_mut(identifier) {
            prim.read_only = read_only;
        }
    }

    /// Close the document; every later request fails and attaching it is refused.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// Current points of a prim, if it has any.
    pub fn points(&self, identifier: &str) -> Option<Vec<[f32; 3]>> {
        self.lock()
            .prims
            .get(identifier)
            .and_then(|p| p.points.clone())
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> u64 {
        self.lock().commits
    }
}

impl Document for MemoryDocument {
    fn is_valid(&self) -> bool {
        !self.lock().closed
    }

    fn resolve(&mut self, identifier: &str) -> Result<AttributeHandle, DocumentError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(DocumentError::Closed);
        }
        match inner.prims.get(identifier) {
            None => {
                return Err(DocumentError::NotFound {
                    identifier: identifier.to_string(),
                })
            }
            Some(prim) if prim.points.is_none() => {
                return Err(DocumentError::MissingAttribute {
                    identifier: identifier.to_string(),
                })
            }
            Some(_) => {}
        }
        if let Some(handle) = inner.handles.get(identifier) {
            return Ok(*handle);
        }
        let handle = AttributeHandle(inner.slots.len() as u64);
        inner.slots.push(identifier.to_string());
        inner.handles.insert(identifier.to_string(), handle);
        Ok(handle)
    }

    fn commit(
        &mut self,
        attribute: AttributeHandle,
        points: &[[f32; 3]],
    ) -> Result<(), DocumentError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(DocumentError::Closed);
        }
        let identifier = usize::try_from(attribute.0)
            .ok()
            .and_then(|idx| inner.slots.get(idx))
            .cloned()
            .ok_or(DocumentError::InvalidHandle(attribute))?;
        let prim = inner
            .prims
            .get_mut(&identifier)
            .filter(|p| p.points.is_some())
            .ok_or(DocumentError::InvalidHandle(attribute))?;
        if prim.read_only {
            return Err(DocumentError::Rejected {
                reason: format!("'{identifier}' is read-only"),
            });
        }
        prim.points = Some(points.to_vec());
        inner.commits += 1;
        Ok(())
    }
}
