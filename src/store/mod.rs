//! Shared document store used to hydrate adapter-returned ids

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::types::Document;

/// Resolves document ids to full documents
///
/// The vector adapter only guarantees id and score; everything else is
/// looked up here. An unresolvable id is not an error at this boundary —
/// callers drop the candidate and log it as a data-integrity signal.
pub trait DocumentStore: Send + Sync {
    fn resolve(&self, doc_id: &str) -> Option<Arc<Document>>;
}

/// HashMap-backed store for corpora that fit in memory
#[derive(Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<HashMap<String, Arc<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one document, replacing any previous entry with the same id
    pub fn insert(&self, document: Document) {
        let mut docs = self.docs.write().unwrap();
        docs.insert(document.id.clone(), Arc::new(document));
    }

    /// Insert a batch of documents
    pub fn insert_all(&self, documents: Vec<Document>) {
        let mut docs = self.docs.write().unwrap();
        for document in documents {
            docs.insert(document.id.clone(), Arc::new(document));
        }
    }

    /// Snapshot of every stored document, for index rebuilds
    pub fn all(&self) -> Vec<Arc<Document>> {
        let docs = self.docs.read().unwrap();
        let mut all: Vec<Arc<Document>> = docs.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn resolve(&self, doc_id: &str) -> Option<Arc<Document>> {
        self.docs.read().unwrap().get(doc_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_resolve() {
        let store = InMemoryDocumentStore::new();
        store.insert(Document::new("d1", "first"));

        let doc = store.resolve("d1").unwrap();
        assert_eq!(doc.content, "first");
        assert!(store.resolve("missing").is_none());
    }

    #[test]
    fn test_insert_replaces_existing() {
        let store = InMemoryDocumentStore::new();
        store.insert(Document::new("d1", "old"));
        store.insert(Document::new("d1", "new"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve("d1").unwrap().content, "new");
    }

    #[test]
    fn test_all_is_sorted_by_id() {
        let store = InMemoryDocumentStore::new();
        store.insert_all(vec![
            Document::new("c", ""),
            Document::new("a", ""),
            Document::new("b", ""),
        ]);

        let docs = store.all();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
