//! Remote session verifier — delegates token checks to the session provider's
//! `GET {base}/{token}/verify` endpoint, authenticated with the service secret.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use super::{IdentityVerifier, UserId, VerifyError};

/// Upper bound on accepted token length; session JWTs are far shorter.
const MAX_TOKEN_LEN: usize = 4096;

#[derive(Debug, Deserialize)]
struct SessionResponse {
    user_id: Option<String>,
    status: Option<String>,
}

#[derive(Clone)]
pub struct RemoteSessionVerifier {
    client: Client,
    base_url: Url,
    secret: String,
}

impl RemoteSessionVerifier {
    /// `timeout` bounds the whole verification round trip.
    pub fn new(base_url: &str, secret: String, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid session verification URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("session verification URL cannot carry path segments: {base_url}");
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build session verification HTTP client")?;

        Ok(Self {
            client,
            base_url,
            secret,
        })
    }

    /// The token is pushed as one percent-encoded segment so it cannot
    /// rewrite the request path or add a query.
    fn verify_url(&self, token: &str) -> Result<Url, VerifyError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| VerifyError::Malformed)?
            .pop_if_empty()
            .push(token)
            .push("verify");
        Ok(url)
    }
}

fn is_plausible_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token != "."
        && token != ".."
        && !token.chars().any(|c| c.is_whitespace() || c.is_control())
}

#[async_trait]
impl IdentityVerifier for RemoteSessionVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, VerifyError> {
        if !is_plausible_token(token) {
            return Err(VerifyError::Malformed);
        }

        let response = self
            .client
            .get(self.verify_url(token)?)
            .bearer_auth(&self.secret)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Rejected(status.as_u16()));
        }

        let body = response.text().await.map_err(transport_error)?;
        let session: SessionResponse = serde_json::from_str(&body)
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;

        if let Some(session_status) = session.status.filter(|s| s != "active") {
            return Err(VerifyError::InactiveSession(session_status));
        }

        let user_id = session
            .user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| VerifyError::InvalidResponse("missing user_id".to_string()))?;

        debug!("Session verified for user {user_id}");
        Ok(UserId::new(user_id))
    }
}

/// The request URL carries the caller's token, so it is stripped before the
/// error can reach a log line.
fn transport_error(e: reqwest::Error) -> VerifyError {
    if e.is_timeout() {
        VerifyError::Timeout
    } else {
        VerifyError::Transport(e.without_url())
    }
}
