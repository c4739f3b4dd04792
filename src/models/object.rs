//! Represents an object (file) stored in the website bucket.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use percent_encoding::percent_decode_str;
use std::{fmt, io};

/// Name of the document served for directory-style paths.
pub const INDEX_DOCUMENT: &str = "index.html";

/// Store-side identifier for a piece of content, derived from a URL path.
///
/// The key is the percent-decoded request path without its leading `/`, so
/// `/docs/intro.html` maps to `docs/intro.html`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Derive the key addressed verbatim by a request path.
    pub fn from_request_path(path: &str) -> Self {
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        Self(decoded.trim_start_matches('/').to_owned())
    }

    /// Key of the index document inside the "directory" this key names.
    ///
    /// `docs/` becomes `docs/index.html`, `docs` becomes `docs/index.html` and
    /// the empty root key becomes `index.html`.
    pub fn index_document(&self) -> Self {
        if self.0.is_empty() || self.0.ends_with('/') {
            Self(format!("{}{INDEX_DOCUMENT}", self.0))
        } else {
            Self(format!("{}/{INDEX_DOCUMENT}", self.0))
        }
    }

    /// Whether the decoded path named a directory: the bucket root or
    /// anything ending in `/`, including an encoded `%2F`.
    pub fn names_directory(&self) -> bool {
        self.0.is_empty() || self.0.ends_with('/')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

/// Attributes the store reports for an object. Retrieved per request and never
/// cached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Content type (MIME type) recorded with the object.
    pub content_type: Option<String>,

    /// Size in bytes.
    pub content_length: Option<i64>,

    /// Timestamp when object was last modified.
    pub last_modified: Option<DateTime<Utc>>,

    /// `Cache-Control` directive recorded with the object.
    pub cache_control: Option<String>,
}

/// Chunked object body as delivered by the store.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Body and metadata of a fetched object, owned by a single request.
pub struct ObjectContent {
    pub metadata: ObjectMetadata,
    pub body: ByteStream,
}

impl fmt::Debug for ObjectContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectContent")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_strips_leading_slash_and_decodes() {
        assert_eq!(
            ObjectKey::from_request_path("/docs/My%20Page.html").as_str(),
            "docs/My Page.html"
        );
        assert_eq!(ObjectKey::from_request_path("/").as_str(), "");
    }

    #[test]
    fn directory_is_decided_on_the_decoded_path() {
        assert!(ObjectKey::from_request_path("/").names_directory());
        assert!(ObjectKey::from_request_path("/docs/").names_directory());
        assert!(ObjectKey::from_request_path("/docs%2F").names_directory());
        assert!(ObjectKey::from_request_path("/docs%2f").names_directory());
        assert!(!ObjectKey::from_request_path("/docs").names_directory());
        assert!(!ObjectKey::from_request_path("/docs%2Fa.html").names_directory());
    }

    #[test]
    fn index_document_for_directory_and_bare_keys() {
        assert_eq!(
            ObjectKey::from_request_path("/").index_document().as_str(),
            "index.html"
        );
        assert_eq!(
            ObjectKey::from_request_path("/blog/").index_document().as_str(),
            "blog/index.html"
        );
        assert_eq!(
            ObjectKey::from_request_path("/about").index_document().as_str(),
            "about/index.html"
        );
    }
}
