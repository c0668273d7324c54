//! Types shared by the credential lifecycle crates and the service binary

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
