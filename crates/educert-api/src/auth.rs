//! # Authentication & Caller Identity
//!
//! Two layers guard the API.
//!
//! The bearer token middleware admits requests from the gateway. When
//! `AUTH_TOKEN` is set every request must carry `Authorization: Bearer
//! <token>`; the comparison is constant-time. Without a token
//! authentication is disabled (development mode).
//!
//! The [`Caller`] extractor turns the identity attributes the gateway
//! forwards into a [`CallerContext`]:
//!
//! | Header                | Field                | Required |
//! |-----------------------|----------------------|----------|
//! | `x-caller-org`        | organization         | yes      |
//! | `x-caller-contact`    | contact attribute    | no       |
//! | `x-caller-public-key` | claimed public key   | no       |

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use educert_contract::CallerContext;
use educert_core::{ContactAttribute, EncodedPublicKey, OrganizationId};
use subtle::ConstantTimeEq;

use crate::error::{AppError, ErrorBody, ErrorDetail};

pub const CALLER_ORG_HEADER: &str = "x-caller-org";
pub const CALLER_CONTACT_HEADER: &str = "x-caller-contact";
pub const CALLER_PUBLIC_KEY_HEADER: &str = "x-caller-public-key";

// ── Caller ──────────────────────────────────────────────────────────────────

/// The policy identity of the caller, read from the forwarded headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub CallerContext);

impl Caller {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let organization = header_str(headers, CALLER_ORG_HEADER)?
            .ok_or_else(|| AppError::Unauthorized(format!("missing {CALLER_ORG_HEADER} header")))?;
        let mut context = CallerContext::new(OrganizationId::new(organization)?);

        if let Some(contact) = header_str(headers, CALLER_CONTACT_HEADER)? {
            context = context.with_contact(ContactAttribute::new(contact)?);
        }
        if let Some(key) = header_str(headers, CALLER_PUBLIC_KEY_HEADER)? {
            context = context.with_public_key(EncodedPublicKey::new(key)?);
        }
        Ok(Self(context))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|s| Some(s.trim()).filter(|s| !s.is_empty()))
            .map_err(|_| AppError::BadRequest(format!("{name} header is not valid ASCII"))),
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of bearer tokens. Differing lengths still
/// perform a comparison before returning `false`.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Check the Bearer token against the configured one. Passes everything
/// through when no token is configured.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|config| config.token.clone());

    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(provided) if constant_time_token_eq(provided, &expected) => {
                next.run(request).await
            }
            Some(_) => {
                tracing::warn!("authentication failed: invalid bearer token");
                unauthorized_response("invalid bearer token")
            }
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                unauthorized_response("authorization header must use Bearer scheme")
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            unauthorized_response("missing authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
