//! # Ledger API
//!
//! Raw key/value listing of the whole ledger, one page of
//! [`QUERY_PAGE_SIZE`](educert_contract::QUERY_PAGE_SIZE) entries at a
//! time. Administrator only.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use educert_contract::LedgerPage;
use serde::Deserialize;

use crate::auth::Caller;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub bookmark: Option<String>,
}

/// Build the ledger router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/ledger", get(list_all))
}

/// List every ledger entry (`GET /v1/ledger`).
async fn list_all(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<PageQuery>,
) -> Result<Json<LedgerPage>, AppError> {
    let page = state
        .contract()
        .list_all(&caller, query.bookmark.as_deref())?;
    Ok(Json(page))
}
