//! Error types for token signing and verification

/// Errors from the signer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Signature, structure, issuer, audience or expiry check failed.
    #[error("invalid access credential: {0}")]
    InvalidCredential(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, Error>;
