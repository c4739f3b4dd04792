//! Turns a fetched object into the representation sent to the client.
//!
//! The whole body is buffered before anything is written: gzip and the ETag
//! digest both need the complete object, so memory use per request is
//! proportional to the object size.

use crate::models::object::{ByteStream, ObjectContent, ObjectKey};
use crate::services::object_store::{Lookup, ObjectStore, StoreError};
use axum::http::{
    HeaderMap, HeaderValue,
    header::{self, InvalidHeaderValue},
};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use flate2::{Compression, write::GzEncoder};
use futures::StreamExt;
use sha1::{Digest, Sha1};
use std::{collections::HashSet, io::Write, sync::LazyLock};
use thiserror::Error;
use tracing::debug;

/// Freshness applied when the object carries no `Cache-Control` of its own.
pub const DEFAULT_CACHE_CONTROL: &str = "max-age=60";

/// MIME types worth compressing on the fly: text formats, fonts and a few
/// text-based application types.
pub static COMPRESSIBLE_TYPES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "application/eot",
        "application/font",
        "application/font-sfnt",
        "application/javascript",
        "application/json",
        "application/opentype",
        "application/otf",
        "application/pkcs7-mime",
        "application/truetype",
        "application/ttf",
        "application/vnd.ms-fontobject",
        "application/x-font-opentype",
        "application/x-font-truetype",
        "application/x-font-ttf",
        "application/x-httpd-cgi",
        "application/x-javascript",
        "application/x-mpegurl",
        "application/x-opentype",
        "application/x-otf",
        "application/x-perl",
        "application/x-ttf",
        "application/xhtml+xml",
        "application/xml",
        "application/xml+rss",
        "font/eot",
        "font/opentype",
        "font/otf",
        "font/ttf",
        "image/svg+xml",
        "text/css",
        "text/csv",
        "text/html",
        "text/javascript",
        "text/js",
        "text/plain",
        "text/richtext",
        "text/tab-separated-values",
        "text/x-component",
        "text/x-java-source",
        "text/x-script",
        "text/xml",
    ])
});

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("gzip compression failed: {0}")]
    Gzip(#[from] std::io::Error),
    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// A fully produced representation, ready to be handed to the conditional
/// response logic.
#[derive(Clone, Debug)]
pub struct PreparedObject {
    /// Exactly the bytes to transmit (gzip-encoded when `gzip` is set).
    pub body: Bytes,
    pub content_type: Option<String>,
    pub gzip: bool,
    /// Quoted base64 SHA-1 of `body`.
    pub etag: String,
    pub cache_control: String,
    pub last_modified: Option<DateTime<Utc>>,
}

impl PreparedObject {
    /// Representation headers for a successful response.
    pub fn headers(&self) -> Result<HeaderMap, EncodingError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ETAG, HeaderValue::from_str(&self.etag)?);
        if self.gzip {
            headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));
        }
        if let Some(content_type) = &self.content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        }
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_str(&self.cache_control)?,
        );
        Ok(headers)
    }
}

pub struct ResponseBuilder<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> ResponseBuilder<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Fetch `key` and produce its representation. `gzip_accepted` is the
    /// outcome of [`accepts_gzip`] for the current request.
    pub async fn prepare(
        &self,
        key: &ObjectKey,
        gzip_accepted: bool,
    ) -> Result<Lookup<PreparedObject>, BuildError> {
        let content = match self.store.fetch_content(key).await? {
            Lookup::Found(content) => content,
            Lookup::Absent => return Ok(Lookup::Absent),
        };
        let ObjectContent { metadata, body } = content;

        let data = collect_body(key, body, metadata.content_length).await?;

        let content_type = metadata
            .content_type
            .filter(|value| !value.is_empty())
            .or_else(|| {
                mime_guess::from_path(key.as_str())
                    .first_raw()
                    .map(str::to_owned)
            });

        let gzip = gzip_accepted && content_type.as_deref().is_some_and(is_compressible);
        let body = if gzip {
            Bytes::from(gzip_encode(&data)?)
        } else {
            Bytes::from(data)
        };

        let etag = etag_for(&body);

        let cache_control = metadata
            .cache_control
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_CACHE_CONTROL.to_owned());

        debug!(
            %key,
            bytes = body.len(),
            gzip,
            content_type = content_type.as_deref().unwrap_or("-"),
            "prepared object"
        );

        Ok(Lookup::Found(PreparedObject {
            body,
            content_type,
            gzip,
            etag,
            cache_control,
            last_modified: metadata.last_modified,
        }))
    }
}

async fn collect_body(
    key: &ObjectKey,
    mut body: ByteStream,
    content_length: Option<i64>,
) -> Result<Vec<u8>, StoreError> {
    let capacity = content_length
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0);
    let mut data = Vec::with_capacity(capacity);
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|source| StoreError::Body {
            key: key.to_string(),
            source,
        })?;
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// Whether the request's `Accept-Encoding` lists the `gzip` token.
///
/// Tokens are compared case-sensitively after trimming; parameters such as
/// `;q=` are not interpreted.
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.split(',').any(|token| token.trim() == "gzip"))
}

/// Membership in [`COMPRESSIBLE_TYPES`], ignoring any `;` parameters.
pub fn is_compressible(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default();
    COMPRESSIBLE_TYPES.contains(essence)
}

fn gzip_encode(data: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len()), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Quoted, unpadded base64 SHA-1 of `body`.
pub fn etag_for(body: &[u8]) -> String {
    let digest = Sha1::digest(body);
    format!("\"{}\"", general_purpose::STANDARD_NO_PAD.encode(digest))
}
