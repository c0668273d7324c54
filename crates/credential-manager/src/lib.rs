//! Credential lifecycle orchestration
//!
//! `CredentialManager` composes the access token `Signer` with a
//! `RefreshStore` into the four lifecycle operations: login, rotate, logout
//! and revoke-all. Refresh values are single-use; rotation consumes one and
//! issues a complete new pair.

pub mod error;
pub mod manager;

pub use error::{Error, Result};
pub use manager::{CredentialManager, CredentialPair};
