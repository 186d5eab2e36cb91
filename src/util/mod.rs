//! Utility helpers shared across client state modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser/environment concerns (host storage, clock)
//! from account and checkout logic to improve reuse and testability.

pub mod cache;
pub mod storage;
pub mod storage_backend;
