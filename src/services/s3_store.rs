//! src/services/s3_store.rs
//!
//! S3ObjectStore — the production [`ObjectStore`] backed by `aws-sdk-s3`.
//! HEAD `NotFound` and GET `NoSuchKey` become [`Lookup::Absent`]; every other
//! failure (service, dispatch, timeout) is surfaced as [`StoreError::Request`].

use crate::models::object::{ObjectContent, ObjectKey, ObjectMetadata};
use crate::services::object_store::{Lookup, ObjectStore, StoreError, StoreResult};
use async_trait::async_trait;
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::DateTime as AwsDateTime};
use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use std::io;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn head_metadata(&self, key: &ObjectKey) -> StoreResult<ObjectMetadata> {
        debug!(bucket = %self.bucket, %key, "HeadObject");
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await;

        match result {
            Ok(out) => Ok(Lookup::Found(ObjectMetadata {
                content_type: out.content_type().map(str::to_owned),
                content_length: out.content_length(),
                last_modified: out.last_modified().and_then(to_chrono),
                cache_control: out.cache_control().map(str::to_owned),
            })),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_not_found() {
                    Ok(Lookup::Absent)
                } else {
                    Err(StoreError::Request {
                        key: key.to_string(),
                        message: DisplayErrorContext(&err).to_string(),
                    })
                }
            }
        }
    }

    async fn fetch_content(&self, key: &ObjectKey) -> StoreResult<ObjectContent> {
        debug!(bucket = %self.bucket, %key, "GetObject");
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await;

        let out = match result {
            Ok(out) => out,
            Err(err) => {
                let err = err.into_service_error();
                if err.is_no_such_key() {
                    return Ok(Lookup::Absent);
                }
                return Err(StoreError::Request {
                    key: key.to_string(),
                    message: DisplayErrorContext(&err).to_string(),
                });
            }
        };

        let metadata = ObjectMetadata {
            content_type: out.content_type().map(str::to_owned),
            content_length: out.content_length(),
            last_modified: out.last_modified().and_then(to_chrono),
            cache_control: out.cache_control().map(str::to_owned),
        };

        let body = stream::unfold(out.body, |mut body| async move {
            body.next()
                .await
                .map(|chunk| (chunk.map_err(io::Error::other), body))
        })
        .boxed();

        Ok(Lookup::Found(ObjectContent { metadata, body }))
    }
}

fn to_chrono(value: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}
