// In-memory document store for development and tests
use crate::document::DocumentStore;
use crate::error::{DatabaseError, DatabaseResult};
use crate::query::{Filter, FindOptions};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct StoredDocument {
    /// Insertion order, used as the final sort key
    seq: u64,
    data: Value,
}

/// DashMap-backed store keyed by `(collection, id)`
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<(String, String), StoredDocument>,
    sequences: DashMap<String, u64>,
    inserted: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(collection: &str, id: &str) -> (String, String) {
        (collection.to_string(), id.to_string())
    }

    fn matching(&self, collection: &str, filter: &Filter) -> Vec<StoredDocument> {
        self.documents
            .iter()
            .filter(|entry| entry.key().0 == collection && filter.matches(&entry.value().data))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, id: &str, document: Value) -> DatabaseResult<()> {
        match self.documents.entry(Self::key(collection, id)) {
            Entry::Occupied(_) => Err(DatabaseError::DuplicateKey {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            Entry::Vacant(slot) => {
                let seq = self.inserted.fetch_add(1, Ordering::SeqCst);
                slot.insert(StoredDocument { seq, data: document });
                Ok(())
            }
        }
    }

    async fn get(&self, collection: &str, id: &str) -> DatabaseResult<Option<Value>> {
        Ok(self
            .documents
            .get(&Self::key(collection, id))
            .map(|entry| entry.data.clone()))
    }

    async fn replace(&self, collection: &str, id: &str, document: Value) -> DatabaseResult<()> {
        match self.documents.get_mut(&Self::key(collection, id)) {
            Some(mut entry) => {
                entry.data = document;
                Ok(())
            }
            None => Err(DatabaseError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> DatabaseResult<bool> {
        Ok(self.documents.remove(&Self::key(collection, id)).is_some())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> DatabaseResult<Vec<Value>> {
        let mut found = self.matching(collection, filter);
        found.sort_by(|a, b| options.compare(&a.data, &b.data).then(a.seq.cmp(&b.seq)));

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        Ok(found
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| doc.data)
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> DatabaseResult<u64> {
        Ok(self.matching(collection, filter).len() as u64)
    }

    async fn next_sequence(&self, name: &str) -> DatabaseResult<u64> {
        // The entry guard holds the shard lock for the whole increment.
        let mut counter = self.sequences.entry(name.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
