//! # Issuer API
//!
//! An issuer profile binds a university name, its P-256 public key and
//! the contact attribute of the registering caller. All three are unique.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use educert_contract::{IssuerProfile, RegisterIssuerRequest};
use educert_core::IssuerName;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Build the issuers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/issuers", post(register_issuer))
        .route("/v1/issuers/:name", get(get_issuer))
}

/// Register the caller as an issuing university (`POST /v1/issuers`).
async fn register_issuer(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<RegisterIssuerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuerProfile>), AppError> {
    let req = extract_json(body)?;
    let profile = state.contract().register_issuer(&caller, req)?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Read an issuer profile (`GET /v1/issuers/:name`).
async fn get_issuer(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<IssuerProfile>, AppError> {
    let name = IssuerName::new(name)?;
    Ok(Json(state.contract().get_issuer_profile(&name)?))
}
