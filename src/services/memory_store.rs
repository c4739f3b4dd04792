//! In-memory [`ObjectStore`] used by the test suites. Counts every call and can
//! be told to fail for selected keys.

use crate::models::object::{ObjectContent, ObjectKey, ObjectMetadata};
use crate::services::object_store::{Lookup, ObjectStore, StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use futures::{StreamExt, stream};
use std::{
    collections::{HashMap, HashSet},
    io,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: HashMap<String, (ObjectMetadata, Bytes)>,
    failing: HashSet<String>,
    broken_bodies: HashSet<String>,
    head_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    heads: Mutex<Vec<String>>,
}

/// Fixed modification time so tests can build `If-Modified-Since` values.
pub fn test_last_modified() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object with the given content type and no cache-control.
    pub fn with_object(self, key: &str, content_type: Option<&str>, body: &[u8]) -> Self {
        let metadata = ObjectMetadata {
            content_type: content_type.map(str::to_owned),
            content_length: Some(body.len() as i64),
            last_modified: Some(test_last_modified()),
            cache_control: None,
        };
        self.with_metadata(key, metadata, body)
    }

    pub fn with_metadata(mut self, key: &str, metadata: ObjectMetadata, body: &[u8]) -> Self {
        self.objects
            .insert(key.to_owned(), (metadata, Bytes::copy_from_slice(body)));
        self
    }

    /// Every call for `key` fails with a request error.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_owned());
        self
    }

    /// Fetching `key` succeeds but the body stream errors after the first chunk.
    pub fn broken_body(mut self, key: &str) -> Self {
        self.broken_bodies.insert(key.to_owned());
        self
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Keys passed to `head_metadata`, in call order.
    pub fn heads(&self) -> Vec<String> {
        self.heads.lock().unwrap().clone()
    }

    fn check_failure(&self, key: &ObjectKey) -> Result<(), StoreError> {
        if self.failing.contains(key.as_str()) {
            return Err(StoreError::Request {
                key: key.to_string(),
                message: "AccessDenied: simulated failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn head_metadata(&self, key: &ObjectKey) -> StoreResult<ObjectMetadata> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        self.heads.lock().unwrap().push(key.to_string());
        self.check_failure(key)?;

        Ok(match self.objects.get(key.as_str()) {
            Some((metadata, _)) => Lookup::Found(metadata.clone()),
            None => Lookup::Absent,
        })
    }

    async fn fetch_content(&self, key: &ObjectKey) -> StoreResult<ObjectContent> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(key)?;

        let Some((metadata, data)) = self.objects.get(key.as_str()) else {
            return Ok(Lookup::Absent);
        };

        // Hand the body out in small chunks so collection is exercised.
        let mut chunks: Vec<io::Result<Bytes>> = data
            .chunks(7)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        if self.broken_bodies.contains(key.as_str()) {
            chunks.truncate(1);
            chunks.push(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }

        Ok(Lookup::Found(ObjectContent {
            metadata: metadata.clone(),
            body: stream::iter(chunks).boxed(),
        }))
    }
}
