//! Maps a request path onto the bucket with index-document semantics.
//!
//! Resolution order, first match wins:
//! 1. decoded path ends with `/` -> serve `{path}index.html` (no lookup, absence shows up on fetch)
//! 2. `{path}` exists     -> serve it
//! 3. `{path}/index.html` exists -> 302 to `{path}/`
//! 4. otherwise           -> not found
//!
//! At most two metadata lookups are issued per request.

use crate::models::{action::ResolvedAction, object::ObjectKey};
use crate::services::object_store::{ObjectStore, StoreError};
use tracing::debug;

pub struct WebsiteResolver<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> WebsiteResolver<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Decide what to do for `path`. Store failures abort resolution; they are
    /// never folded into [`ResolvedAction::NotFound`].
    pub async fn resolve(&self, path: &str) -> Result<ResolvedAction, StoreError> {
        let key = ObjectKey::from_request_path(path);

        if key.names_directory() {
            return Ok(ResolvedAction::Serve(key.index_document()));
        }

        if self.store.head_metadata(&key).await?.is_found() {
            return Ok(ResolvedAction::Serve(key));
        }

        let index = key.index_document();
        if self.store.head_metadata(&index).await?.is_found() {
            debug!("{key} is a directory, redirecting");
            return Ok(ResolvedAction::RedirectTo(format!("{path}/")));
        }

        Ok(ResolvedAction::NotFound)
    }
}
