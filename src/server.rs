// ABOUTME: HTTP server assembly and lifecycle: router composition, layers, and graceful shutdown
// ABOUTME: Puts every /api route behind the session guard and serves until ctrl-c or SIGTERM
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware::from_fn_with_state;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::middleware::{create_request_span, require_session, setup_cors};
use crate::resources::ServerResources;
use crate::routes::{ChatRoutes, FinanzasRoutes, HealthRoutes, MarketingRoutes, OperativoRoutes};

/// Build the full application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let api = Router::new()
        .merge(ChatRoutes::routes(Arc::clone(&resources)))
        .merge(FinanzasRoutes::routes(Arc::clone(&resources)))
        .merge(MarketingRoutes::routes(Arc::clone(&resources)))
        .merge(OperativoRoutes::routes(Arc::clone(&resources)))
        .route_layer(from_fn_with_state(Arc::clone(&resources), require_session));

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(api)
        .layer(TraceLayer::new_for_http().make_span_with(create_request_span))
        .layer(setup_cors(&resources.config.cors))
}

/// Bind the configured address and serve until a shutdown signal arrives
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        resources.config.host, resources.config.http_port
    )
    .parse()
    .with_context(|| format!("Invalid listen address {}", resources.config.host))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, build_router(resources))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}

/// Resolve on ctrl-c or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
