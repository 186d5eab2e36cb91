//! # portal-client
//!
//! Client-side logic for the web portal: the fault-absorbing browser storage
//! accessor, the account dropdown model, and the post-checkout confirmation
//! flow. Rendering lives elsewhere; this crate produces the state those
//! views draw from.
//!
//! Browser-only behavior (web-sys storage, `gloo-net` requests, console
//! logging) sits behind the `hydrate` feature. Without it every browser call
//! degrades to an in-memory or no-op fallback.

pub mod config;
pub mod net;
pub mod state;
pub mod util;

/// Route `log` output to the browser console and install the panic hook.
///
/// Safe to call more than once; later calls keep the first logger.
#[cfg(feature = "hydrate")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
}
