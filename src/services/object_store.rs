//! The object store seen by the website: metadata lookups and content fetches,
//! with "absent" kept apart from "failed".

use crate::models::object::{ObjectContent, ObjectKey, ObjectMetadata};
use async_trait::async_trait;
use std::io;
use thiserror::Error;

/// Result of a lookup that completed. Absence is an expected outcome, not an error.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    Absent,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request for object `{key}` failed: {message}")]
    Request { key: String, message: String },
    #[error("reading body of object `{key}` failed: {source}")]
    Body {
        key: String,
        #[source]
        source: io::Error,
    },
}

pub type StoreResult<T> = Result<Lookup<T>, StoreError>;

/// An already-configured handle to the bucket holding the website.
///
/// Implementations must report a missing object as [`Lookup::Absent`] and
/// reserve [`StoreError`] for transport, permission and other failures.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch only the metadata for `key`.
    async fn head_metadata(&self, key: &ObjectKey) -> StoreResult<ObjectMetadata>;

    /// Fetch metadata and a body stream for `key`.
    async fn fetch_content(&self, key: &ObjectKey) -> StoreResult<ObjectContent>;
}
