//! `RocksDB` storage implementation.
//!
//! Documents live in a single column family keyed by their full path, so the
//! documents of a collection share the key prefix `{collection}/`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options,
};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{Result, StoreError};
use crate::paths::{CollectionPath, DocPath};
use crate::schema::{all_column_families, cf};
use crate::{apply_updates, Document, DocumentStore, FieldUpdate, Snapshot};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes writes so read-modify-write updates are atomic per document.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a document using CBOR.
    fn serialize(document: &Document) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(document, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a document from CBOR.
    fn deserialize(data: &[u8]) -> Result<Document> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn read(&self, path: &DocPath) -> Result<Option<Document>> {
        let cf = self.cf(cf::DOCUMENTS)?;

        self.db
            .get_cf(&cf, path.as_str().as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn write(&self, path: &DocPath, document: &Document) -> Result<()> {
        let cf = self.cf(cf::DOCUMENTS)?;
        let value = Self::serialize(document)?;

        self.db
            .put_cf(&cf, path.as_str().as_bytes(), value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for RocksStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        self.read(path)
    }

    async fn set(&self, path: &DocPath, document: Document) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(path, &document)
    }

    async fn create(&self, path: &DocPath, document: Document) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if self.read(path)?.is_some() {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        self.write(path, &document)
    }

    async fn update(&self, path: &DocPath, fields: Vec<(String, FieldUpdate)>) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read(path)?.unwrap_or_default();
        apply_updates(&mut document, fields)?;
        self.write(path, &document)
    }

    async fn delete(&self, path: &DocPath) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let cf = self.cf(cf::DOCUMENTS)?;

        self.db
            .delete_cf(&cf, path.as_str().as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Snapshot>> {
        let cf = self.cf(cf::DOCUMENTS)?;
        let prefix = format!("{collection}/");

        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward));

        let mut matches = Vec::new();
        for item in iter {
            let (key, data) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(prefix.as_bytes()) {
                break;
            }

            let key = std::str::from_utf8(&key)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            let id = &key[prefix.len()..];
            if id.contains('/') {
                continue;
            }

            let document = Self::deserialize(&data)?;
            if document.get(field) == Some(value) {
                matches.push(Snapshot {
                    path: collection.doc(id),
                    data: document,
                });
            }
        }

        tracing::trace!(collection = %collection, field, matches = matches.len(), "Query executed");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths;
    use crate::DocumentStoreExt;
    use purse_core::{AccountId, Balance, TransactionId};
    use serde_json::json;
    use tempfile::TempDir;

    fn open() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn documents_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let account = AccountId::new("acct").unwrap();
        {
            let store = RocksStore::open(dir.path()).unwrap();
            store
                .update(
                    &paths::balance(&account),
                    vec![("balance".into(), FieldUpdate::Increment(50))],
                )
                .await
                .unwrap();
        }

        let store = RocksStore::open(dir.path()).unwrap();
        let balance: Balance = store.get_as(&paths::balance(&account)).await.unwrap().unwrap();
        assert_eq!(balance.balance, 50);
    }

    #[tokio::test]
    async fn create_rejects_existing_document() {
        let (store, _dir) = open();
        let path = paths::balance(&AccountId::new("acct").unwrap());

        let first = crate::to_document(&json!({ "balance": 1 })).unwrap();
        store.create(&path, first).await.unwrap();

        let second = crate::to_document(&json!({ "balance": 2 })).unwrap();
        let err = store.create(&path, second).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));

        let balance: Balance = store.get_as(&path).await.unwrap().unwrap();
        assert_eq!(balance.balance, 1);
    }

    #[tokio::test]
    async fn query_and_delete() {
        let (store, _dir) = open();
        let account = AccountId::new("acct").unwrap();

        for (tx, active) in [("a", true), ("b", false)] {
            let path = paths::subscription(&account, &TransactionId::new(tx).unwrap());
            store.set_as(&path, &json!({ "isActive": active })).await.unwrap();
        }

        let subs = paths::subscriptions(&account);
        let found = store.query_eq(&subs, "isActive", &json!(true)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.id(), "a");

        store.delete(&found[0].path).await.unwrap();
        let found = store.query_eq(&subs, "isActive", &json!(true)).await.unwrap();
        assert!(found.is_empty());
    }
}
