//! Defines the website router.
//!
//! Every request, whatever its method or path, goes to `serve_object`: the
//! bucket owns the whole URL space, so no other routes are mounted.

use crate::handlers::object_handlers::{WebsiteState, serve_object};
use axum::Router;

/// Build and return the website router carrying `WebsiteState`.
pub fn routes() -> Router<WebsiteState> {
    Router::new().fallback(serve_object)
}
