use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use handlers::object_handlers::WebsiteState;
use services::s3_store::S3ObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting s3-website with config: {:?}", cfg);

    // --- Initialize store client ---
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .profile_name(&cfg.profile)
        .region(Region::new(cfg.region.clone()))
        .load()
        .await;

    let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
    if let Some(endpoint) = &cfg.endpoint_url {
        tracing::info!("Using custom endpoint {} with path-style addressing", endpoint);
        s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
    }
    let client = aws_sdk_s3::Client::from_conf(s3_config.build());

    let store = S3ObjectStore::new(client, cfg.bucket.clone());

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(WebsiteState::new(Arc::new(store)));

    // --- Start server ---
    let listener = TcpListener::bind(&cfg.addr)
        .await
        .with_context(|| format!("binding to {}", cfg.addr))?;

    tracing::info!(
        "Serving bucket {} on http://{}",
        cfg.bucket,
        listener.local_addr()?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
