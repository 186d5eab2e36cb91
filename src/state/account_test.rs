use super::*;
use crate::net::api::AuthError;
use crate::net::types::UserMetadata;
use futures::executor::block_on;
use std::cell::RefCell;

// =========================================================================
// MockAuth
// =========================================================================

#[derive(Default)]
struct MockAuth {
    fail: bool,
    calls: RefCell<Vec<String>>,
}

impl MockAuth {
    fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }
}

#[async_trait::async_trait(?Send)]
impl AuthProvider for MockAuth {
    async fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), AuthError> {
        self.calls.borrow_mut().push(format!("sign_in {provider} {redirect_to}"));
        if self.fail { Err(AuthError::SignIn("popup blocked".to_owned())) } else { Ok(()) }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.calls.borrow_mut().push("sign_out".to_owned());
        if self.fail { Err(AuthError::SignOut("network".to_owned())) } else { Ok(()) }
    }
}

fn user(id: &str, name: Option<&str>, avatar: Option<&str>) -> User {
    User {
        id: id.to_owned(),
        email: Some(format!("{id}@example.com")),
        user_metadata: UserMetadata { full_name: name.map(str::to_owned), avatar_url: avatar.map(str::to_owned) },
    }
}

fn signed_in(menu: AccountMenu) -> AccountSummary {
    match menu {
        AccountMenu::SignedIn(summary) => *summary,
        other => panic!("expected signed-in menu, got {other:?}"),
    }
}

// =========================================================================
// AccountMenu::build
// =========================================================================

#[test]
fn loading_only_without_any_user() {
    let inputs = MenuInputs { auth_loading: true, ..MenuInputs::default() };
    assert_eq!(AccountMenu::build(&inputs), AccountMenu::Loading);
}

#[test]
fn cached_user_shows_while_auth_loads() {
    let inputs = MenuInputs {
        auth_loading: true,
        cached_user: Some(user("cached", Some("Cached Ada"), None)),
        ..MenuInputs::default()
    };
    let summary = signed_in(AccountMenu::build(&inputs));
    assert_eq!(summary.user_id, "cached");
    assert_eq!(summary.display_name, "Cached Ada");
}

#[test]
fn live_user_wins_over_cached_user() {
    let inputs = MenuInputs {
        user: Some(user("live", None, None)),
        cached_user: Some(user("cached", None, None)),
        ..MenuInputs::default()
    };
    assert_eq!(signed_in(AccountMenu::build(&inputs)).user_id, "live");
}

#[test]
fn signed_out_button_reflects_busy_state() {
    assert_eq!(
        AccountMenu::build(&MenuInputs::default()),
        AccountMenu::SignedOut { label: "Sign in with Google", disabled: false }
    );
    let busy = MenuInputs { busy: true, ..MenuInputs::default() };
    assert_eq!(AccountMenu::build(&busy), AccountMenu::SignedOut { label: "Signing in...", disabled: true });
}

#[test]
fn display_name_falls_back_to_user() {
    let inputs = MenuInputs { user: Some(user("u1", Some("  "), None)), ..MenuInputs::default() };
    let summary = signed_in(AccountMenu::build(&inputs));
    assert_eq!(summary.display_name, "User");
    assert_eq!(summary.email.as_deref(), Some("u1@example.com"));
}

#[test]
fn avatar_image_hidden_after_load_error() {
    let url = "https://cdn.example.com/a.png";
    let mut inputs = MenuInputs { user: Some(user("u1", None, Some(url))), ..MenuInputs::default() };

    inputs.avatar.load_started();
    assert_eq!(
        signed_in(AccountMenu::build(&inputs)).avatar,
        Avatar::Image { url: url.to_owned(), loading: true }
    );

    inputs.avatar.failed(url);
    assert_eq!(signed_in(AccountMenu::build(&inputs)).avatar, Avatar::Placeholder);

    inputs.avatar.reset();
    assert_eq!(
        signed_in(AccountMenu::build(&inputs)).avatar,
        Avatar::Image { url: url.to_owned(), loading: false }
    );
}

#[test]
fn avatar_placeholder_without_url() {
    let inputs = MenuInputs { user: Some(user("u1", None, None)), ..MenuInputs::default() };
    assert_eq!(signed_in(AccountMenu::build(&inputs)).avatar, Avatar::Placeholder);
}

#[test]
fn members_are_offered_credit_purchase() {
    let inputs = MenuInputs {
        user: Some(user("u1", None, None)),
        credits: Some(Credits { available_credits: 500 }),
        subscription: Subscription { is_member: true },
        ..MenuInputs::default()
    };
    let summary = signed_in(AccountMenu::build(&inputs));
    assert!(summary.is_member);
    assert_eq!(summary.upsell, Some(Upsell::PurchaseCredits));
    assert_eq!(Upsell::PurchaseCredits.label(), "Purchase Credits");
    assert_eq!(Upsell::PurchaseCredits.href(), "/pricing");
}

#[test]
fn low_credit_non_members_are_offered_subscription() {
    let mut inputs = MenuInputs {
        user: Some(user("u1", None, None)),
        credits: Some(Credits { available_credits: 10 }),
        ..MenuInputs::default()
    };
    assert_eq!(signed_in(AccountMenu::build(&inputs)).upsell, Some(Upsell::GetSubscription));

    inputs.credits = Some(Credits { available_credits: 11 });
    assert_eq!(signed_in(AccountMenu::build(&inputs)).upsell, None);

    inputs.credits = None;
    let summary = signed_in(AccountMenu::build(&inputs));
    assert_eq!(summary.upsell, None);
    assert_eq!(summary.credits, None);
}

#[test]
fn sign_out_label_reflects_busy_state() {
    let inputs = MenuInputs { user: Some(user("u1", None, None)), busy: true, ..MenuInputs::default() };
    let summary = signed_in(AccountMenu::build(&inputs));
    assert_eq!(summary.sign_out_label, "Signing out...");
    assert!(summary.sign_out_disabled);
}

// =========================================================================
// UserCache
// =========================================================================

#[test]
fn user_cache_round_trips_and_clears() {
    let storage = SafeStorage::in_memory();
    let cache = UserCache::new(&storage);
    let ada = user("u1", Some("Ada"), None);

    assert!(cache.store_user(&ada, 0));
    assert!(cache.store_credits(Credits { available_credits: 3 }, 0));
    assert!(cache.store_subscription(Subscription { is_member: true }, 0));
    assert_eq!(cache.cached_user(1), Some(ada));
    assert_eq!(cache.cached_credits(1), Some(Credits { available_credits: 3 }));
    assert_eq!(cache.cached_subscription(1), Some(Subscription { is_member: true }));

    cache.clear();
    assert_eq!(cache.cached_user(1), None);
    assert_eq!(cache.cached_credits(1), None);
    assert!(storage.all_keys().is_empty());
}

#[test]
fn invalidate_billing_keeps_user() {
    let storage = SafeStorage::in_memory();
    let cache = UserCache::new(&storage);
    cache.store_user(&user("u1", None, None), 0);
    cache.store_credits(Credits { available_credits: 3 }, 0);

    cache.invalidate_billing();
    assert!(cache.cached_user(0).is_some());
    assert_eq!(cache.cached_credits(0), None);
}

// =========================================================================
// sign in / sign out
// =========================================================================

#[test]
fn oauth_redirect_url_appends_callback() {
    assert_eq!(oauth_redirect_url("https://app.example.com/"), "https://app.example.com/api/auth/callback");
}

#[test]
fn sign_in_uses_google_and_callback() {
    let auth = MockAuth::default();
    assert_eq!(block_on(sign_in(&auth, "https://app.example.com")), Ok(()));
    assert_eq!(*auth.calls.borrow(), vec!["sign_in google https://app.example.com/api/auth/callback".to_owned()]);
}

#[test]
fn sign_in_failure_maps_to_user_message() {
    let auth = MockAuth::failing();
    assert_eq!(block_on(sign_in(&auth, "https://app.example.com")), Err(SIGN_IN_FAILED_MESSAGE));
}

#[test]
fn sign_out_clears_cache_on_success() {
    let storage = SafeStorage::in_memory();
    let cache = UserCache::new(&storage);
    cache.store_user(&user("u1", None, None), 0);

    assert_eq!(block_on(sign_out(&MockAuth::default(), &cache)), Ok(()));
    assert_eq!(cache.cached_user(0), None);
}

#[test]
fn sign_out_failure_keeps_cache() {
    let storage = SafeStorage::in_memory();
    let cache = UserCache::new(&storage);
    cache.store_user(&user("u1", None, None), 0);

    assert_eq!(block_on(sign_out(&MockAuth::failing(), &cache)), Err(SIGN_OUT_FAILED_MESSAGE));
    assert!(cache.cached_user(0).is_some());
}

#[cfg(not(feature = "hydrate"))]
#[test]
fn current_origin_is_none_outside_browser() {
    assert_eq!(current_origin(), None);
}

#[test]
fn clean_expired_sweeps_stale_user_entries() {
    let storage = SafeStorage::in_memory();
    let cache = UserCache::new(&storage);
    cache.store_user(&user("u1", None, None), 0);

    let day_ms = 24 * 60 * 60 * 1000;
    assert_eq!(cache.clean_expired(day_ms - 1), 0);
    assert_eq!(cache.clean_expired(day_ms), 1);
    assert_eq!(cache.cached_user(0), None);
}

#[test]
fn avatar_loaded_clears_spinner() {
    let mut avatar = AvatarState::default();
    avatar.load_started();
    avatar.loaded();
    assert_eq!(avatar, AvatarState { loading: false, failed: false });
}
