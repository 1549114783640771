//! # educert-api: HTTP Service for EduCert
//!
//! Exposes the credential contract over HTTP. Caller identity arrives in
//! `x-caller-*` headers set by the gateway; the optional bearer token
//! authenticates the gateway itself.
//!
//! ## API Surface
//!
//! | Prefix               | Module                    | Domain                 |
//! |----------------------|---------------------------|------------------------|
//! | `/v1/schemas/*`      | [`routes::schemas`]       | Schema registry        |
//! | `/v1/issuers/*`      | [`routes::issuers`]       | Issuer registration    |
//! | `/v1/credentials/*`  | [`routes::credentials`]   | Issuance, revocation   |
//! | `/v1/proofs/*`       | [`routes::proofs`]        | Disclosure verification|
//! | `/v1/ledger`         | [`routes::ledger`]        | Admin listing          |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the application router.
///
/// The liveness check is mounted outside the auth middleware so it stays
/// reachable without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::schemas::router())
        .merge(routes::issuers::router())
        .merge(routes::credentials::router())
        .merge(routes::proofs::router())
        .merge(routes::ledger::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    let health = Router::new().route("/health/liveness", axum::routing::get(liveness));

    Router::new().merge(health).merge(api)
}

/// Liveness check. Always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}
