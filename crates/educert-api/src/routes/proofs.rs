//! # Proof Verification API
//!
//! Anyone holding a proof bundle may check it. The answer is a verdict,
//! never an error: malformed or mismatched bundles are `REJECTED`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use educert_contract::{DisclosureVerdict, ProofBundle};

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Build the proofs router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/proofs/verify", post(verify_proof))
}

/// Check a disclosure proof against the ledger (`POST /v1/proofs/verify`).
async fn verify_proof(
    State(state): State<AppState>,
    body: Result<Json<ProofBundle>, JsonRejection>,
) -> Result<Json<DisclosureVerdict>, AppError> {
    let bundle = extract_json(body)?;
    let verdict = state.service.check_disclosure(&bundle);
    tracing::info!(credential_id = %bundle.credential_id, verdict = ?verdict, "disclosure proof checked");
    Ok(Json(verdict))
}
