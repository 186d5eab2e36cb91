//! Network-facing types and collaborator boundaries.

pub mod api;
pub mod types;
