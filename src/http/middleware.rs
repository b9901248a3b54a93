//! Trusted proxies middleware.
//!
//! Runs policy selection and chain resolution on every request, leaving the
//! rewritten forwarded headers on the request and the results in its
//! extensions (`PolicySource`, `ResolvedTrust`).

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::config::schema::TrustedProxiesConfig;
use crate::trust;

/// State required by the trust middleware.
#[derive(Clone)]
pub struct TrustState {
    /// Current trusted proxies configuration; swapped on reload.
    pub config: Arc<ArcSwap<TrustedProxiesConfig>>,
}

impl TrustState {
    pub fn new(config: TrustedProxiesConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
        }
    }
}

pub async fn trusted_proxies_middleware(
    State(state): State<TrustState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // one snapshot per request, released before the inner service runs
    let (source, resolved) = {
        let config = state.config.load();
        trust::evaluate(&config, &mut req)
    };

    req.extensions_mut().insert(source);
    req.extensions_mut().insert(resolved);
    next.run(req).await
}
