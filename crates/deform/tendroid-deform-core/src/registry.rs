//! Shape identifier -> attribute handle registry.
//!
//! Identifiers are resolved against the attached document once, at registration;
//! bridge writes reuse the cached handle. Entries iterate in first-registration order,
//! which is the order batch writes slice the vertex buffer in.

use indexmap::IndexMap;
use log::{debug, warn};

use crate::document::{AttributeHandle, Document};
use crate::error::{DeformError, Result};

/// One live registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegistryEntry<'a> {
    pub identifier: &'a str,
    pub attribute: AttributeHandle,
}

/// Owns the attached document and the cached handles resolved from it.
#[derive(Debug)]
pub struct MeshRegistry<D> {
    document: Option<D>,
    entries: IndexMap<String, AttributeHandle>,
}

impl<D> Default for MeshRegistry<D> {
    fn default() -> Self {
        Self {
            document: None,
            entries: IndexMap::new(),
        }
    }
}

impl<D: Document> MeshRegistry<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a document. Refused (returns `false`) when the document reports itself
    /// invalid. Attaching over a previous document drops the handles resolved from it.
    pub fn attach(&mut self, document: D) -> bool {
        if !document.is_valid() {
            warn!("attach: document is not valid");
            return false;
        }
        if self.document.replace(document).is_some() && !self.entries.is_empty() {
            debug!(
                "attach: replaced document, dropping {} stale registrations",
                self.entries.len()
            );
            self.entries.clear();
        }
        debug!("attach: document attached");
        true
    }

    /// Hand the document back to the host, dropping all registrations.
    pub fn detach(&mut self) -> Option<D> {
        self.entries.clear();
        self.document.take()
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.document.is_some()
    }

    /// Resolve `identifier` and store (or overwrite) its entry.
    ///
    /// A failed resolution leaves any existing entry for `identifier` in place.
    pub fn try_register(&mut self, identifier: &str) -> Result<AttributeHandle> {
        let document = self.document.as_mut().ok_or(DeformError::NotAttached)?;
        let attribute =
            document
                .resolve(identifier)
                .map_err(|source| DeformError::ExternalResolution {
                    identifier: identifier.to_string(),
                    source,
                })?;
        match self.entries.get_mut(identifier) {
            Some(slot) => *slot = attribute,
            None => {
                self.entries.insert(identifier.to_string(), attribute);
            }
        }
        Ok(attribute)
    }

    /// [`try_register`](Self::try_register) with the error logged and absorbed.
    pub fn register(&mut self, identifier: &str) -> bool {
        match self.try_register(identifier) {
            Ok(attribute) => {
                debug!("register: '{identifier}' -> {attribute:?}");
                true
            }
            Err(err) => {
                warn!("register: {err}");
                false
            }
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Remove every entry; the document stays attached.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Exact-match lookup.
    pub fn get(&self, identifier: &str) -> Option<AttributeHandle> {
        self.entries.get(identifier).copied()
    }

    pub fn is_registered(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Entries in registration order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = RegistryEntry<'_>> + '_ {
        self.entries.iter().map(|(identifier, attribute)| RegistryEntry {
            identifier: identifier.as_str(),
            attribute: *attribute,
        })
    }

    /// Document and entries borrowed together for bridge writes.
    pub(crate) fn split_mut(&mut self) -> Result<(&mut D, &IndexMap<String, AttributeHandle>)> {
        let document = self.document.as_mut().ok_or(DeformError::NotAttached)?;
        Ok((document, &self.entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;

    fn doc_with(ids: &[&str]) -> MemoryDocument {
        let doc = MemoryDocument::new();
        for id in ids {
            doc.add_mesh(*id, vec![[0.0; 3]; 4]);
        }
        doc
    }

    #[test]
    fn register_before_attach_fails() {
        let mut reg: MeshRegistry<MemoryDocument> = MeshRegistry::new();
        assert!(!reg.register("/World/T_00"));
        assert_eq!(reg.try_register("/World/T_00"), Err(DeformError::NotAttached));
        assert_eq!(reg.count(), 0);
    }

    #[test]
    fn attach_refuses_invalid_document() {
        let doc = doc_with(&["/World/T_00"]);
        doc.close();
        let mut reg = MeshRegistry::new();
        assert!(!reg.attach(doc));
        assert!(!reg.is_attached());
    }

    #[test]
    fn register_count_and_clear() {
        let mut reg = MeshRegistry::new();
        assert!(reg.attach(doc_with(&["/World/T_00", "/World/T_01"])));
        assert!(reg.register("/World/T_00"));
        assert!(reg.register("/World/T_01"));
        assert!(!reg.register("/World/T_02"));
        assert_eq!(reg.count(), 2);
        reg.clear();
        assert_eq!(reg.count(), 0);
        assert!(reg.is_attached());
    }

    #[test]
    fn reregister_overwrites_and_keeps_order() {
        let mut reg = MeshRegistry::new();
        reg.attach(doc_with(&["/a", "/b"]));
        reg.register("/a");
        reg.register("/b");
        reg.register("/a");
        assert_eq!(reg.count(), 2);
        let order: Vec<&str> = reg.entries().map(|e| e.identifier).collect();
        assert_eq!(order, ["/a", "/b"]);
    }

    #[test]
    fn failed_reregister_keeps_entry() {
        let doc = doc_with(&["/a"]);
        let mut reg = MeshRegistry::new();
        reg.attach(doc.clone());
        reg.register("/a");
        let before = reg.get("/a");
        doc.remove_prim("/a");
        assert!(matches!(
            reg.try_register("/a"),
            Err(DeformError::ExternalResolution { .. })
        ));
        assert_eq!(reg.get("/a"), before);
        assert_eq!(reg.count(), 1);
    }

    #[test]
    fn lookup_is_exact() {
        let mut reg = MeshRegistry::new();
        reg.attach(doc_with(&["/World/T_00"]));
        reg.register("/World/T_00");
        assert!(reg.is_registered("/World/T_00"));
        assert!(!reg.is_registered("/World/T_0"));
        assert!(reg.get("/World").is_none());
    }

    #[test]
    fn detach_returns_document_and_drops_entries() {
        let mut reg = MeshRegistry::new();
        reg.attach(doc_with(&["/a"]));
        reg.register("/a");
        assert!(reg.detach().is_some());
        assert!(!reg.is_attached());
        assert_eq!(reg.count(), 0);
    }

    #[test]
    fn reattach_drops_stale_entries() {
        let first = doc_with(&["/a", "/b", "/c"]);
        let mut reg = MeshRegistry::new();
        assert!(reg.attach(first));
        for id in ["/a", "/b", "/c"] {
            assert!(reg.register(id));
        }
        assert_eq!(reg.count(), 3);

        assert!(reg.attach(doc_with(&["/a"])));
        assert!(reg.is_attached());
        assert_eq!(reg.count(), 0);
        assert!(!reg.is_registered("/a"));

        // handles now resolve against the new document
        assert!(reg.register("/a"));
        assert_eq!(reg.count(), 1);
        assert!(!reg.register("/b"));
    }

    #[test]
    fn rejected_reattach_keeps_current_document() {
        let mut reg = MeshRegistry::new();
        reg.attach(doc_with(&["/a"]));
        reg.register("/a");
        let closed = doc_with(&["/a"]);
        closed.close();
        assert!(!reg.attach(closed));
        assert!(reg.is_attached());
        assert_eq!(reg.count(), 1);
    }
}
