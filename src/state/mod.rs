//! Client state for the account menu and checkout confirmation.

pub mod account;
pub mod checkout;
