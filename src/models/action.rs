//! Outcome of mapping a request path onto the bucket.

use super::object::ObjectKey;

/// What to do with a request. Exactly one variant is produced per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedAction {
    /// Fetch and return the object stored under this key.
    Serve(ObjectKey),

    /// Temporary redirect to the given location (directory path with trailing `/`).
    RedirectTo(String),

    /// Nothing in the bucket answers to the path.
    NotFound,
}
