//! Identifier types for purse.
//!
//! Account, transaction and product identifiers arrive from external providers as
//! opaque strings and are used verbatim as document path segments, so they are
//! validated once at the edge and carried as newtypes afterwards.
//!
//! # Macro-based ID Types
//!
//! The `segment_id_type!` macro reduces boilerplate for string identifiers,
//! ensuring consistent implementation of serialization, parsing, and display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Longest identifier accepted as a document path segment, in bytes.
pub const MAX_SEGMENT_LEN: usize = 1500;

/// Validate that `value` can be used as a single document path segment.
fn validate_segment(value: &str) -> Result<(), IdError> {
    if value.trim().is_empty() {
        return Err(IdError::Empty);
    }
    if value.len() > MAX_SEGMENT_LEN {
        return Err(IdError::TooLong { len: value.len() });
    }
    if value.contains('/') {
        return Err(IdError::ContainsSeparator);
    }
    if value == "." || value == ".." {
        return Err(IdError::Reserved);
    }
    Ok(())
}

/// Macro to define a string identifier usable as a document path segment.
///
/// This macro generates a newtype wrapper around `String` with implementations for:
/// - `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `Serialize`, `Deserialize` (as string, validated)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`
/// - `AsRef<str>`
///
/// # Example
///
/// ```ignore
/// segment_id_type!(MyId, "A custom identifier type.");
/// let id: MyId = "abc".parse().unwrap();
/// ```
macro_rules! segment_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, validating it as a path segment.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is empty, too long, contains `/`,
            /// or is a reserved segment.
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                validate_segment(&value)?;
                Ok(Self(value))
            }

            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

segment_id_type!(AccountId, "An account identifier.\n\nAccount ids are the app-user ids assigned by the identity provider; every per-user document lives under `users/{account}`.");
segment_id_type!(TransactionId, "A store or processor transaction identifier.\n\nTogether with an [`AccountId`] this forms the idempotency key for wallet mutations.");
segment_id_type!(ProductId, "A store product identifier.\n\nTop-up products encode their credit amount as the leading token, e.g. `50_topup_v1`.");

/// A reconciliation record identifier using ULID for time-ordering.
///
/// Reconciliation records are written when a compensation fails, so ordering by id
/// gives the order in which manual repairs became necessary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReconciliationId(Ulid);

impl ReconciliationId {
    /// Generate a new `ReconciliationId` with the current timestamp.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Return the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> &Ulid {
        &self.0
    }
}

impl FromStr for ReconciliationId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for ReconciliationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReconciliationId({})", self.0)
    }
}

impl fmt::Display for ReconciliationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ReconciliationId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReconciliationId> for String {
    fn from(id: ReconciliationId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier is empty or whitespace.
    #[error("identifier is empty")]
    Empty,

    /// The identifier exceeds [`MAX_SEGMENT_LEN`].
    #[error("identifier is too long ({len} bytes)")]
    TooLong {
        /// Length of the rejected identifier in bytes.
        len: usize,
    },

    /// The identifier contains the path separator.
    #[error("identifier must not contain '/'")]
    ContainsSeparator,

    /// The identifier is `.` or `..`.
    #[error("identifier is a reserved path segment")]
    Reserved,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,
}
