//! Shared DTOs for the auth provider, billing data, and payment endpoints.
//!
//! DESIGN
//! ======
//! Field names mirror the JSON the auth provider and `/api/payments/*`
//! routes emit, so serde round-trips stay lossless and cached copies in
//! storage decode without translation.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Profile metadata attached to an authenticated user by the OAuth provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Display name, if the provider shared one.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Avatar image URL, if available.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// An authenticated user as reported by the auth provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier (UUID string).
    pub id: String,
    /// Account email, if the provider shared one.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Credits balance for the current user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credits {
    pub available_credits: i64,
}

/// Subscription status for the current user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub is_member: bool,
}

/// Body of `POST /api/payments/verify`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub session_id: String,
}

/// Success body of `POST /api/payments/verify`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned by `/api/*` routes on non-2xx responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
