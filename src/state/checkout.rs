//! Post-checkout confirmation state.
//!
//! The payment provider redirects back with `?session_id=...`. The success
//! page verifies that session with the backend and, once confirmed, drops the
//! cached credits and subscription so the header shows the new balance.

#[cfg(test)]
#[path = "checkout_test.rs"]
mod checkout_test;

use crate::net::api::{PaymentVerifier, VerifyError};
use crate::state::account::UserCache;
use crate::util::storage_backend::StorageBackend;

pub const SESSION_ID_PARAM: &str = "session_id";
pub const MISSING_TRANSACTION_ID: &str = "N/A";

/// Why a checkout could not be confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutFailure {
    /// The page was opened without a `session_id`.
    MissingSession,
    /// The backend (or the request to it) failed.
    Verification(VerifyError),
}

/// Lifecycle of the success page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutState {
    #[default]
    Loading,
    Verified { session_id: String, message: Option<String> },
    Failed(CheckoutFailure),
}

impl CheckoutState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Extract a non-empty `session_id` from a URL query string.
///
/// Accepts the query with or without its leading `?`.
pub fn session_id_from_query(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == SESSION_ID_PARAM)
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// `session_id` of the current page URL. `None` outside the browser.
pub fn current_session_id() -> Option<String> {
    #[cfg(feature = "hydrate")]
    {
        let search = web_sys::window()?.location().search().ok()?;
        session_id_from_query(&search)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}

/// Verify `session_id` and settle the page state.
///
/// Without a session id the verifier is never called. On success the cached
/// billing data is invalidated so fresh credits and subscription are fetched.
pub async fn verify_checkout<V, B>(verifier: &V, session_id: Option<&str>, cache: &UserCache<'_, B>) -> CheckoutState
where
    V: PaymentVerifier + ?Sized,
    B: StorageBackend,
{
    let Some(session_id) = session_id else {
        return CheckoutState::Failed(CheckoutFailure::MissingSession);
    };

    match verifier.verify(session_id).await {
        Ok(message) => {
            log::info!("payment verified: session={session_id} message={}", message.as_deref().unwrap_or(""));
            cache.invalidate_billing();
            CheckoutState::Verified { session_id: session_id.to_owned(), message }
        }
        Err(e) => {
            log::error!("payment verification failed: session={session_id} error={e}");
            CheckoutState::Failed(CheckoutFailure::Verification(e))
        }
    }
}

/// Payment details card shown once verification succeeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentSummary {
    pub transaction_id: String,
    pub status: &'static str,
}

impl PaymentSummary {
    pub fn from_session(session_id: Option<&str>) -> Self {
        Self {
            transaction_id: session_id.unwrap_or(MISSING_TRANSACTION_ID).to_owned(),
            status: "Completed",
        }
    }
}
