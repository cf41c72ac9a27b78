//! Document storage layer for purse.
//!
//! Storage is a path-addressed document store: documents are JSON objects living at
//! paths such as `users/{account}/wallet/balance` (see [`paths`]). The interface is
//! deliberately narrow - get, set, merge-update (including atomic increments),
//! delete, and equality queries over a single collection. There are no
//! multi-document transactions; callers that touch several documents use
//! `purse_core::Saga` for ordering and compensation.
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process, used in tests and local development
//! - `RocksStore`: persistent, behind the `rocksdb-backend` feature
//!
//! # Example
//!
//! ```no_run
//! use purse_core::{AccountId, Balance};
//! use purse_store::{paths, DocumentStore, DocumentStoreExt, FieldUpdate, MemoryStore};
//!
//! # async fn example() -> purse_store::Result<()> {
//! let store = MemoryStore::new();
//! let account = AccountId::new("user-1").unwrap();
//!
//! store
//!     .update(&paths::balance(&account), vec![("balance".into(), FieldUpdate::Increment(50))])
//!     .await?;
//!
//! let balance: Option<Balance> = store.get_as(&paths::balance(&account)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod memory;
pub mod paths;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use paths::{CollectionPath, DocPath};
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// A change to a single top-level field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace the field's value.
    Set(Value),
    /// Add to a numeric field atomically; a missing field counts as zero.
    Increment(i64),
}

/// A document returned by a query, with its path.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Where the document lives.
    pub path: DocPath,
    /// The document contents.
    pub data: Document,
}

/// The storage trait defining all database operations.
///
/// Every operation is atomic for the single document it touches.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get(&self, path: &DocPath) -> Result<Option<Document>>;

    /// Create or replace a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn set(&self, path: &DocPath, document: Document) -> Result<()>;

    /// Create a document that must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] when a document is already stored at
    /// `path`, or an error if the database operation fails.
    async fn create(&self, path: &DocPath, document: Document) -> Result<()>;

    /// Merge field updates into a document, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUpdate`] when incrementing a non-numeric field,
    /// or an error if the database operation fails.
    async fn update(&self, path: &DocPath, fields: Vec<(String, FieldUpdate)>) -> Result<()>;

    /// Delete a document. Deleting a missing document succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn delete(&self, path: &DocPath) -> Result<()>;

    /// All documents directly inside `collection` whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Snapshot>>;
}

/// Typed helpers over [`DocumentStore`].
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Read and deserialize a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the document does not match `T`.
    async fn get_as<T: DeserializeOwned + Send>(&self, path: &DocPath) -> Result<Option<T>> {
        self.get(path).await?.map(from_document).transpose()
    }

    /// Serialize and write a document.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a JSON object or the write fails.
    async fn set_as<T: Serialize + Sync>(&self, path: &DocPath, value: &T) -> Result<()> {
        let document = to_document(value)?;
        self.set(path, document).await
    }

    /// Run an equality query and deserialize the results.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a document does not match `T`.
    async fn query_eq_as<T: DeserializeOwned + Send>(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(DocPath, T)>> {
        self.query_eq(collection, field, value)
            .await?
            .into_iter()
            .map(|snapshot| Ok((snapshot.path, from_document(snapshot.data)?)))
            .collect()
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

/// Serialize a value into a document.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if `value` does not serialize to an object.
pub fn to_document<T: Serialize + ?Sized>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::Serialization(format!(
            "documents must be objects, got {other}"
        ))),
    }
}

/// Deserialize a document.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the document does not match `T`.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Apply field updates to a document in place.
///
/// Shared by every backend so increments behave identically.
///
/// # Errors
///
/// Returns [`StoreError::InvalidUpdate`] when incrementing a non-numeric field or
/// overflowing an integer field.
pub fn apply_updates(document: &mut Document, fields: Vec<(String, FieldUpdate)>) -> Result<()> {
    for (field, update) in fields {
        let next = match update {
            FieldUpdate::Set(value) => value,
            FieldUpdate::Increment(delta) => increment(&field, document.get(&field), delta)?,
        };
        document.insert(field, next);
    }
    Ok(())
}

fn increment(field: &str, current: Option<&Value>, delta: i64) -> Result<Value> {
    let invalid = |reason: &str| StoreError::InvalidUpdate {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    match current {
        None | Some(Value::Null) => Ok(Value::from(delta)),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i.checked_add(delta)
                    .map(Value::from)
                    .ok_or_else(|| invalid("integer overflow"))
            } else {
                #[allow(clippy::cast_precision_loss)]
                let sum = n.as_f64().unwrap_or_default() + delta as f64;
                Number::from_f64(sum)
                    .map(Value::Number)
                    .ok_or_else(|| invalid("result is not a finite number"))
            }
        }
        Some(_) => Err(invalid("field is not numeric")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn increment_missing_field_starts_at_zero() {
        let mut document = Document::new();
        apply_updates(&mut document, vec![("balance".into(), FieldUpdate::Increment(50))]).unwrap();
        assert_eq!(document["balance"], 50);
    }

    #[test]
    fn increment_adds_signed_delta() {
        let mut document = doc(json!({ "balance": 50 }));
        apply_updates(&mut document, vec![("balance".into(), FieldUpdate::Increment(-80))]).unwrap();
        assert_eq!(document["balance"], -30);
    }

    #[test]
    fn increment_float_field() {
        let mut document = doc(json!({ "balance": 1.5 }));
        apply_updates(&mut document, vec![("balance".into(), FieldUpdate::Increment(2))]).unwrap();
        assert_eq!(document["balance"], 3.5);
    }

    #[test]
    fn increment_rejects_non_numeric() {
        let mut document = doc(json!({ "balance": "lots" }));
        let err = apply_updates(&mut document, vec![("balance".into(), FieldUpdate::Increment(1))])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidUpdate { .. }));
    }

    #[test]
    fn set_keeps_other_fields() {
        let mut document = doc(json!({ "refunded": false, "success": true }));
        apply_updates(
            &mut document,
            vec![("refunded".into(), FieldUpdate::Set(Value::Bool(true)))],
        )
        .unwrap();
        assert_eq!(document["refunded"], true);
        assert_eq!(document["success"], true);
    }

    #[test]
    fn to_document_rejects_scalars() {
        assert!(to_document(&42).is_err());
        assert!(to_document(&json!({ "a": 1 })).is_ok());
    }
}
