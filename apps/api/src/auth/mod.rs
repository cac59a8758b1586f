//! Identity verification.
//!
//! Every protected route takes an [`AuthenticatedUser`] extractor, which pulls
//! the bearer token from the request and resolves it through the
//! `Arc<dyn IdentityVerifier>` carried in `AppState`. Verification happens
//! before the handler body runs, so a rejected request never reaches the store.

pub mod session;

use std::fmt;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::state::AppState;

pub use session::RemoteSessionVerifier;

/// Stable identifier of a verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reasons a credential could not be turned into a [`UserId`].
/// Logged server-side only; clients always see a plain 401.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("credential is malformed")]
    Malformed,

    #[error("session verification timed out")]
    Timeout,

    /// Built only through `session::transport_error`, which drops the URL.
    #[error("session verification request failed: {0}")]
    Transport(reqwest::Error),

    #[error("session verification rejected (status {0})")]
    Rejected(u16),

    #[error("session is not active (status {0})")]
    InactiveSession(String),

    #[error("unparsable session verification response: {0}")]
    InvalidResponse(String),
}

/// Resolves an inbound credential to the identity it proves.
///
/// Carried in `AppState` as `Arc<dyn IdentityVerifier>`.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserId, VerifyError>;
}

/// The verified caller of a protected route.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            debug!("Rejecting request without a bearer token");
            return Err(AppError::Unauthorized);
        };

        match state.verifier.verify(token).await {
            Ok(user_id) => Ok(AuthenticatedUser(user_id)),
            Err(e) => {
                warn!("Credential verification failed: {e}");
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
/// The scheme is matched case-insensitively; an empty token is treated as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
