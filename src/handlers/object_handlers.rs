//! HTTP handler serving website objects.
//! Resolves the request path against the bucket and delegates content
//! handling to `ResponseBuilder` and the conditional response logic.

use crate::{
    errors::AppError,
    models::action::ResolvedAction,
    services::{
        conditional,
        object_store::{Lookup, ObjectStore},
        resolver::WebsiteResolver,
        response_builder::{EncodingError, ResponseBuilder, accepts_gzip},
    },
};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct WebsiteState {
    pub store: Arc<dyn ObjectStore>,
}

impl WebsiteState {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

/// Serve any request path from the bucket.
///
/// Status and headers are only produced once the whole body is ready, so a
/// failure at any step yields a clean error response.
#[instrument(skip_all, fields(%method, path = %uri.path()))]
pub async fn serve_object(
    State(state): State<WebsiteState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let path = uri.path();
    let store = state.store.as_ref();

    let action = WebsiteResolver::new(store).resolve(path).await?;
    debug!(?action, "resolved request path");

    match action {
        ResolvedAction::Serve(key) => {
            let prepared = match ResponseBuilder::new(store)
                .prepare(&key, accepts_gzip(&headers))
                .await?
            {
                Lookup::Found(prepared) => prepared,
                Lookup::Absent => {
                    return Err(AppError::not_found(format!("object `{key}` not found")));
                }
            };
            Ok(conditional::respond(&method, &headers, prepared)?)
        }
        ResolvedAction::RedirectTo(location) => Ok(redirect_found(&location)?),
        ResolvedAction::NotFound => Err(AppError::not_found(format!("no object for `{path}`"))),
    }
}

/// `302 Found` pointing at `location`.
fn redirect_found(location: &str) -> Result<Response, EncodingError> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::FOUND;
    response
        .headers_mut()
        .insert(header::LOCATION, HeaderValue::from_str(location)?);
    Ok(response)
}
