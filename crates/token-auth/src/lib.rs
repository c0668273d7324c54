//! Access token signing and refresh value generation
//!
//! Two stateless building blocks for the credential lifecycle:
//! - `Signer` issues and verifies HS256 access tokens bound to an identity
//! - `generate_refresh_value()` produces the opaque 256-bit refresh values
//!
//! Neither holds mutable state. Refresh values only become credentials once
//! a store associates them with an owner; see the `refresh-store` crate.

pub mod constants;
pub mod error;
pub mod refresh;
pub mod signer;

pub use constants::*;
pub use error::{Error, Result};
pub use refresh::generate_refresh_value;
pub use signer::{AccessClaims, IssuedToken, Signer};
