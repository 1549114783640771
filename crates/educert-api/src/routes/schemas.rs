//! # Schema API
//!
//! Schemas are append-only: a version is published once and never
//! changes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use educert_contract::Schema;
use educert_core::SchemaVersion;
use serde::Deserialize;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Request to publish a schema version.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublishSchemaRequest {
    pub id: String,
    pub version: SchemaVersion,
    /// Attribute names in leaf order.
    pub ordering: Vec<String>,
}

/// Build the schemas router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/schemas", post(publish_schema))
        .route("/v1/schemas/:version", get(get_schema))
}

/// Publish a schema version (`POST /v1/schemas`).
async fn publish_schema(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<PublishSchemaRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Schema>), AppError> {
    let req = extract_json(body)?;
    let schema = Schema::new(req.id, req.version, req.ordering)?;
    let published = state.contract().publish_schema(&caller, schema)?;
    Ok((StatusCode::CREATED, Json(published.as_ref().clone())))
}

/// Read a published schema (`GET /v1/schemas/:version`).
async fn get_schema(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> Result<Json<Schema>, AppError> {
    let version = SchemaVersion::new(version)?;
    let schema = state.contract().get_schema(&version)?;
    Ok(Json(schema.as_ref().clone()))
}
