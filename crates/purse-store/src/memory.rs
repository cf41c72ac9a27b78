//! In-memory storage implementation.
//!
//! Documents are kept in a `BTreeMap` keyed by path, so a collection's documents
//! are a contiguous key range.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::paths::{CollectionPath, DocPath};
use crate::{apply_updates, Document, DocumentStore, FieldUpdate, Snapshot};

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, Document>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        Ok(self.documents.read().await.get(path.as_str()).cloned())
    }

    async fn set(&self, path: &DocPath, document: Document) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(path.as_str().to_string(), document);
        Ok(())
    }

    async fn create(&self, path: &DocPath, document: Document) -> Result<()> {
        match self.documents.write().await.entry(path.as_str().to_string()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(path.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(document);
                Ok(())
            }
        }
    }

    async fn update(&self, path: &DocPath, fields: Vec<(String, FieldUpdate)>) -> Result<()> {
        let mut documents = self.documents.write().await;
        let mut document = documents.get(path.as_str()).cloned().unwrap_or_default();
        apply_updates(&mut document, fields)?;
        documents.insert(path.as_str().to_string(), document);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<()> {
        self.documents.write().await.remove(path.as_str());
        Ok(())
    }

    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Snapshot>> {
        let prefix = format!("{collection}/");
        let documents = self.documents.read().await;

        let matches = documents
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .filter(|(_, document)| document.get(field) == Some(value))
            .map(|(key, document)| Snapshot {
                path: collection.doc(&key[prefix.len()..]),
                data: document.clone(),
            })
            .collect();

        Ok(matches)
    }
}
