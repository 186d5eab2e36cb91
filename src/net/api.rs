//! Collaborator boundaries: payment verification and the auth provider.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR) and native builds: the HTTP verifier reports
//! [`VerifyError::Unavailable`] since the endpoint is only meaningful in the
//! browser.
//!
//! ERROR HANDLING
//! ==============
//! Collaborators return typed errors; the state modules turn them into UI
//! states instead of panicking.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

#[cfg(feature = "hydrate")]
use super::types::{ApiErrorBody, VerifyPaymentRequest, VerifyPaymentResponse};
use crate::config::DEFAULT_VERIFY_ENDPOINT;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors produced while verifying a checkout session.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The request never produced a response.
    #[error("verify request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("payment verification rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("verify response parse failed: {0}")]
    Parse(String),

    /// No browser context to issue the request from.
    #[error("payment verification unavailable outside the browser")]
    Unavailable,
}

/// Errors reported by the auth provider.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("sign in failed: {0}")]
    SignIn(String),
    #[error("sign out failed: {0}")]
    SignOut(String),
}

// =============================================================================
// TRAITS
// =============================================================================

/// Confirms a checkout session with the payment backend. Enables mocking in tests.
#[async_trait::async_trait(?Send)]
pub trait PaymentVerifier {
    /// Verify `session_id`, returning the backend's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns a [`VerifyError`] if the request fails, the backend rejects the
    /// session, or the response is malformed.
    async fn verify(&self, session_id: &str) -> Result<Option<String>, VerifyError>;
}

/// OAuth provider used by the account menu.
#[async_trait::async_trait(?Send)]
pub trait AuthProvider {
    /// Start an OAuth sign-in with `provider`, returning to `redirect_to`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SignIn`] if the provider refuses the request.
    async fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), AuthError>;

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SignOut`] if the provider fails to end the session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

// =============================================================================
// HTTP VERIFIER
// =============================================================================

/// [`PaymentVerifier`] backed by `POST /api/payments/verify`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpPaymentVerifier {
    endpoint: String,
}

impl Default for HttpPaymentVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_VERIFY_ENDPOINT)
    }
}

impl HttpPaymentVerifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn rejected_error(status: u16, body: Option<String>) -> VerifyError {
    VerifyError::Rejected { status, message: body.unwrap_or_else(|| format!("status {status}")) }
}

#[async_trait::async_trait(?Send)]
impl PaymentVerifier for HttpPaymentVerifier {
    async fn verify(&self, session_id: &str) -> Result<Option<String>, VerifyError> {
        #[cfg(feature = "hydrate")]
        {
            let payload = VerifyPaymentRequest { session_id: session_id.to_owned() };
            let resp = gloo_net::http::Request::post(&self.endpoint)
                .json(&payload)
                .map_err(|e| VerifyError::Request(e.to_string()))?
                .send()
                .await
                .map_err(|e| VerifyError::Request(e.to_string()))?;
            if !resp.ok() {
                let body = resp.json::<ApiErrorBody>().await.ok().and_then(|b| b.error);
                return Err(rejected_error(resp.status(), body));
            }
            let body: VerifyPaymentResponse = resp.json().await.map_err(|e| VerifyError::Parse(e.to_string()))?;
            Ok(body.message)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = session_id;
            Err(VerifyError::Unavailable)
        }
    }
}
