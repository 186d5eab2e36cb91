//! Account dropdown state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The header's user menu renders from [`AccountMenu`]. Live auth data is
//! preferred, but a cached copy of the user (kept in storage through
//! [`UserCache`]) lets the menu render immediately on reload instead of
//! flashing a spinner.
//!
//! TRADE-OFFS
//! ==========
//! The cached user can briefly outlive a server-side sign-out. Entries carry a
//! TTL and are swept on mount via [`UserCache::clean_expired`].

#[cfg(test)]
#[path = "account_test.rs"]
mod account_test;

use crate::net::api::AuthProvider;
use crate::net::types::{Credits, Subscription, User};
use crate::util::cache::CacheStore;
use crate::util::storage::SafeStorage;
use crate::util::storage_backend::StorageBackend;

pub const PRICING_HREF: &str = "/pricing";
pub const OAUTH_PROVIDER: &str = "google";
pub const OAUTH_CALLBACK_PATH: &str = "/api/auth/callback";
pub const SIGN_IN_FAILED_MESSAGE: &str = "Login failed, please try again";
pub const SIGN_OUT_FAILED_MESSAGE: &str = "Logout failed, please try again";

/// Non-members at or below this balance are offered a subscription.
pub const LOW_CREDITS_THRESHOLD: i64 = 10;

const USER_SLOT: &str = "user";
const CREDITS_SLOT: &str = "credits";
const SUBSCRIPTION_SLOT: &str = "subscription";

// =============================================================================
// USER CACHE
// =============================================================================

/// Cached identity and billing data for the signed-in user.
pub struct UserCache<'a, B: StorageBackend> {
    cache: CacheStore<'a, B>,
}

impl<'a, B: StorageBackend> UserCache<'a, B> {
    pub fn new(storage: &'a SafeStorage<B>) -> Self {
        Self { cache: CacheStore::new(storage) }
    }

    pub fn cached_user(&self, now_ms: i64) -> Option<User> {
        self.cache.load(USER_SLOT, now_ms)
    }

    pub fn store_user(&self, user: &User, now_ms: i64) -> bool {
        self.cache.store(USER_SLOT, user, now_ms)
    }

    pub fn cached_credits(&self, now_ms: i64) -> Option<Credits> {
        self.cache.load(CREDITS_SLOT, now_ms)
    }

    pub fn store_credits(&self, credits: Credits, now_ms: i64) -> bool {
        self.cache.store(CREDITS_SLOT, &credits, now_ms)
    }

    pub fn cached_subscription(&self, now_ms: i64) -> Option<Subscription> {
        self.cache.load(SUBSCRIPTION_SLOT, now_ms)
    }

    pub fn store_subscription(&self, subscription: Subscription, now_ms: i64) -> bool {
        self.cache.store(SUBSCRIPTION_SLOT, &subscription, now_ms)
    }

    /// Drop cached credits and subscription so the next read refetches them.
    pub fn invalidate_billing(&self) {
        self.cache.invalidate(CREDITS_SLOT);
        self.cache.invalidate(SUBSCRIPTION_SLOT);
    }

    /// Drop everything cached for the user.
    pub fn clear(&self) {
        self.cache.invalidate(USER_SLOT);
        self.invalidate_billing();
    }

    /// Sweep stale cache entries. Returns how many were removed.
    pub fn clean_expired(&self, now_ms: i64) -> usize {
        self.cache.clean_expired(now_ms)
    }
}

// =============================================================================
// AVATAR
// =============================================================================

/// Load state of the avatar image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AvatarState {
    pub loading: bool,
    pub failed: bool,
}

impl AvatarState {
    /// Fresh state for a newly displayed user.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn load_started(&mut self) {
        self.loading = true;
        self.failed = false;
    }

    pub fn loaded(&mut self) {
        self.loading = false;
        self.failed = false;
    }

    pub fn failed(&mut self, url: &str) {
        log::warn!("avatar image failed to load: {url}");
        self.loading = false;
        self.failed = true;
    }
}

/// What the menu trigger shows for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Avatar {
    /// Remote image; `loading` shows a spinner overlay.
    Image { url: String, loading: bool },
    /// Generic user icon.
    Placeholder,
}

// =============================================================================
// MENU MODEL
// =============================================================================

/// Pricing link offered beneath the credits row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsell {
    PurchaseCredits,
    GetSubscription,
}

impl Upsell {
    pub fn label(self) -> &'static str {
        match self {
            Self::PurchaseCredits => "Purchase Credits",
            Self::GetSubscription => "Get Subscription",
        }
    }

    pub fn href(self) -> &'static str {
        PRICING_HREF
    }

    fn select(is_member: bool, credits: Option<Credits>) -> Option<Self> {
        if is_member {
            return Some(Self::PurchaseCredits);
        }
        match credits {
            Some(c) if c.available_credits <= LOW_CREDITS_THRESHOLD => Some(Self::GetSubscription),
            _ => None,
        }
    }
}

/// Everything the signed-in dropdown renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSummary {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub is_member: bool,
    pub avatar: Avatar,
    /// `None` while the balance is still loading.
    pub credits: Option<i64>,
    pub upsell: Option<Upsell>,
    pub sign_out_label: &'static str,
    pub sign_out_disabled: bool,
}

/// Inputs collected from auth, billing, and local UI state.
#[derive(Clone, Debug, Default)]
pub struct MenuInputs {
    pub user: Option<User>,
    pub cached_user: Option<User>,
    pub auth_loading: bool,
    pub credits: Option<Credits>,
    pub subscription: Subscription,
    /// A sign-in or sign-out request is in flight.
    pub busy: bool,
    pub avatar: AvatarState,
}

/// Render model of the account dropdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountMenu {
    /// Auth is loading and no user (live or cached) is known yet.
    Loading,
    SignedOut { label: &'static str, disabled: bool },
    SignedIn(Box<AccountSummary>),
}

impl AccountMenu {
    pub fn build(inputs: &MenuInputs) -> Self {
        let display_user = inputs.user.as_ref().or(inputs.cached_user.as_ref());

        let Some(user) = display_user else {
            if inputs.auth_loading {
                return Self::Loading;
            }
            let label = if inputs.busy { "Signing in..." } else { "Sign in with Google" };
            return Self::SignedOut { label, disabled: inputs.busy };
        };

        let avatar = match user.user_metadata.avatar_url.as_deref() {
            Some(url) if !url.is_empty() && !inputs.avatar.failed => {
                Avatar::Image { url: url.to_owned(), loading: inputs.avatar.loading }
            }
            _ => Avatar::Placeholder,
        };
        let display_name = user
            .user_metadata
            .full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("User")
            .to_owned();
        let is_member = inputs.subscription.is_member;

        Self::SignedIn(Box::new(AccountSummary {
            user_id: user.id.clone(),
            display_name,
            email: user.email.clone(),
            is_member,
            avatar,
            credits: inputs.credits.map(|c| c.available_credits),
            upsell: Upsell::select(is_member, inputs.credits),
            sign_out_label: if inputs.busy { "Signing out..." } else { "Sign out" },
            sign_out_disabled: inputs.busy,
        }))
    }
}

// =============================================================================
// SIGN IN / SIGN OUT
// =============================================================================

/// Origin of the current page. `None` outside the browser.
pub fn current_origin() -> Option<String> {
    #[cfg(feature = "hydrate")]
    {
        web_sys::window()?.location().origin().ok()
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}

/// OAuth redirect target for `origin` (e.g. `https://app.example.com`).
pub fn oauth_redirect_url(origin: &str) -> String {
    format!("{}{OAUTH_CALLBACK_PATH}", origin.trim_end_matches('/'))
}

/// Start Google sign-in. On failure returns the message shown to the user.
///
/// # Errors
///
/// Returns [`SIGN_IN_FAILED_MESSAGE`] if the provider rejects the request.
pub async fn sign_in<P: AuthProvider + ?Sized>(provider: &P, origin: &str) -> Result<(), &'static str> {
    let redirect_to = oauth_redirect_url(origin);
    provider.sign_in_with_oauth(OAUTH_PROVIDER, &redirect_to).await.map_err(|e| {
        log::error!("oauth sign in failed: {e}");
        SIGN_IN_FAILED_MESSAGE
    })
}

/// End the session and clear cached user data. The cache is left intact when
/// the provider fails, since the session is still live.
///
/// # Errors
///
/// Returns [`SIGN_OUT_FAILED_MESSAGE`] if the provider fails to sign out.
pub async fn sign_out<P, B>(provider: &P, cache: &UserCache<'_, B>) -> Result<(), &'static str>
where
    P: AuthProvider + ?Sized,
    B: StorageBackend,
{
    match provider.sign_out().await {
        Ok(()) => {
            cache.clear();
            Ok(())
        }
        Err(e) => {
            log::error!("sign out failed: {e}");
            Err(SIGN_OUT_FAILED_MESSAGE)
        }
    }
}
