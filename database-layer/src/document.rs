use crate::error::{DatabaseError, DatabaseResult};
use crate::query::{Filter, FindOptions};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed document stored in its own collection
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Collection name, one per entity
    const COLLECTION: &'static str;

    /// Storage key of this document
    fn document_id(&self) -> String;
}

/// Untyped document storage
///
/// Implementations must make `insert` fail with [`DatabaseError::DuplicateKey`]
/// when the key is taken and must make `next_sequence` atomic across
/// concurrent callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, id: &str, document: Value) -> DatabaseResult<()>;
    async fn get(&self, collection: &str, id: &str) -> DatabaseResult<Option<Value>>;
    async fn replace(&self, collection: &str, id: &str, document: Value) -> DatabaseResult<()>;
    async fn delete(&self, collection: &str, id: &str) -> DatabaseResult<bool>;
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> DatabaseResult<Vec<Value>>;
    async fn count(&self, collection: &str, filter: &Filter) -> DatabaseResult<u64>;

    /// Increment and return the named counter, starting at 1
    async fn next_sequence(&self, name: &str) -> DatabaseResult<u64>;

    async fn is_healthy(&self) -> bool;
}

/// Typed view over one collection of a [`DocumentStore`]
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn insert(&self, document: &T) -> DatabaseResult<()> {
        let value = serde_json::to_value(document)?;
        self.store
            .insert(T::COLLECTION, &document.document_id(), value)
            .await
    }

    pub async fn get(&self, id: &str) -> DatabaseResult<Option<T>> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Like [`Collection::get`] but absence is an error
    pub async fn require(&self, id: &str) -> DatabaseResult<T> {
        self.get(id).await?.ok_or_else(|| DatabaseError::NotFound {
            collection: T::COLLECTION.to_string(),
            id: id.to_string(),
        })
    }

    pub async fn replace(&self, document: &T) -> DatabaseResult<()> {
        let value = serde_json::to_value(document)?;
        self.store
            .replace(T::COLLECTION, &document.document_id(), value)
            .await
    }

    pub async fn delete(&self, id: &str) -> DatabaseResult<bool> {
        self.store.delete(T::COLLECTION, id).await
    }

    pub async fn find(&self, filter: &Filter, options: &FindOptions) -> DatabaseResult<Vec<T>> {
        self.store
            .find(T::COLLECTION, filter, options)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(DatabaseError::from))
            .collect()
    }

    pub async fn find_one(&self, filter: &Filter) -> DatabaseResult<Option<T>> {
        let options = FindOptions {
            limit: Some(1),
            ..FindOptions::default()
        };
        Ok(self.find(filter, &options).await?.into_iter().next())
    }

    pub async fn count(&self, filter: &Filter) -> DatabaseResult<u64> {
        self.store.count(T::COLLECTION, filter).await
    }

    /// Atomic counter shared with the underlying store
    pub async fn next_sequence(&self, name: &str) -> DatabaseResult<u64> {
        self.store.next_sequence(name).await
    }
}
