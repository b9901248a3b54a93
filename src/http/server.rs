//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the inspection handler
//! - Wire up middleware (trust resolution, timeout, tracing)
//! - Bind server to listener with connect info
//! - Apply configuration updates to the shared trust snapshot

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::Extension,
    http::Request,
    middleware,
    routing::any,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ServiceConfig, TrustedProxiesConfig};
use crate::http::middleware::{trusted_proxies_middleware, TrustState};
use crate::http::report::TrustReport;
use crate::trust::{PolicySource, ResolvedTrust};

/// HTTP server reporting the trusted view of each request.
pub struct HttpServer {
    router: Router,
    state: TrustState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let state = TrustState::new(config.trusted_proxies.clone());
        let router = Self::build_router(&config, state.clone());

        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: TrustState) -> Router {
        Router::new()
            .route("/{*path}", any(inspect_handler))
            .route("/", any(inspect_handler))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(middleware::from_fn_with_state(state, trusted_proxies_middleware)),
            )
    }

    /// The router, for serving or driving directly in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared trust state; storing into it affects subsequent requests.
    pub fn state(&self) -> &TrustState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<TrustedProxiesConfig>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shared = self.state.config.clone();
        tokio::spawn(async move {
            while let Some(trusted_proxies) = config_updates.recv().await {
                shared.store(Arc::new(trusted_proxies));
                tracing::info!("Trusted proxies configuration reloaded");
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Report the policy and trusted view the middleware attached.
async fn inspect_handler(
    Extension(policy): Extension<PolicySource>,
    Extension(trust): Extension<ResolvedTrust>,
    request: Request<Body>,
) -> Json<TrustReport> {
    Json(TrustReport::new(&request, policy, trust))
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
