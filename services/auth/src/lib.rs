//! Account and session access for the Aora backend client
//!
//! Wraps the identity side of the hosted backend: creating accounts, opening
//! and closing sessions, resolving the signed-in identity and building
//! initials avatars.

pub mod account;
pub mod avatars;
pub mod validation;

pub use account::{AccountClient, IdentityApi};
pub use avatars::Avatars;
