//! # Credential API
//!
//! Issuance takes the signed ledger request together with the full
//! attribute values; the values are checked against the commitment and
//! projected to the attribute store after the ledger commit. Listing
//! filters by exactly one of holder key, issuer key or schema version.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use educert_contract::{CredentialPage, CredentialRecord, IssueRequest, ProofBundle};
use educert_core::{CredentialId, EncodedPublicKey, SchemaVersion};
use serde::Deserialize;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

const MAX_REASON_LEN: usize = 1024;

/// Issuance request: the ledger request plus the attribute values it
/// commits to.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssueCredentialRequest {
    pub credential: IssueRequest,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevokeRequest {
    pub reason: String,
}

impl Validate for RevokeRequest {
    fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("reason must not be empty".to_string());
        }
        if self.reason.len() > MAX_REASON_LEN {
            return Err(format!("reason must not exceed {MAX_REASON_LEN} bytes"));
        }
        Ok(())
    }
}

/// Attribute names to disclose.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProofRequest {
    pub attributes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub holder: Option<String>,
    pub issuer: Option<String>,
    pub schema: Option<String>,
    pub bookmark: Option<String>,
}

/// Build the credentials router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/credentials", post(issue_credential).get(list_credentials))
        .route("/v1/credentials/:id", get(get_credential))
        .route("/v1/credentials/:id/revoke", post(revoke_credential))
        .route("/v1/credentials/:id/proof", post(generate_proof))
}

fn parse_id(raw: &str) -> Result<CredentialId, AppError> {
    Ok(CredentialId::parse(raw)?)
}

/// Issue a credential and project its attributes (`POST /v1/credentials`).
async fn issue_credential(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<IssueCredentialRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CredentialRecord>), AppError> {
    let req = extract_json(body)?;
    let record = state
        .service
        .issue_with_attributes(&caller, req.credential, req.attributes)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Read a credential record visible to the caller (`GET /v1/credentials/:id`).
async fn get_credential(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<CredentialRecord>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.contract().get_credential(&caller, &id)?))
}

/// Revoke a credential (`POST /v1/credentials/:id/revoke`).
async fn revoke_credential(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<RevokeRequest>, JsonRejection>,
) -> Result<Json<CredentialRecord>, AppError> {
    let id = parse_id(&id)?;
    let req = extract_validated_json(body)?;
    let record = state
        .contract()
        .revoke_credential(&caller, &id, req.reason.trim())?;
    Ok(Json(record))
}

/// List credentials visible to the caller (`GET /v1/credentials`).
async fn list_credentials(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<ListQuery>,
) -> Result<Json<CredentialPage>, AppError> {
    let contract = state.contract();
    let bookmark = query.bookmark.as_deref();
    let page = match (query.holder, query.issuer, query.schema) {
        (Some(holder), None, None) => {
            contract.list_credentials_by_holder(&caller, &EncodedPublicKey::new(holder)?, bookmark)?
        }
        (None, Some(issuer), None) => {
            contract.list_credentials_by_issuer(&caller, &EncodedPublicKey::new(issuer)?, bookmark)?
        }
        (None, None, Some(schema)) => contract.list_credentials_by_schema_version(
            &caller,
            &SchemaVersion::new(schema)?,
            bookmark,
        )?,
        _ => {
            return Err(AppError::BadRequest(
                "exactly one of holder, issuer or schema must be given".to_string(),
            ))
        }
    };
    Ok(Json(page))
}

/// Generate a selective-disclosure proof (`POST /v1/credentials/:id/proof`).
async fn generate_proof(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<ProofRequest>, JsonRejection>,
) -> Result<Json<ProofBundle>, AppError> {
    let id = parse_id(&id)?;
    let req = extract_json(body)?;
    let bundle = state
        .service
        .generate_disclosure_proof(&caller, &id, &req.attributes)?;
    Ok(Json(bundle))
}
