//! Error types for credential lifecycle operations

/// Errors from the credential manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The refresh value is unknown, already used, revoked or expired.
    /// Which one is deliberately not reported.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("invalid access credential: {0}")]
    InvalidCredential(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<token_auth::Error> for Error {
    fn from(err: token_auth::Error) -> Self {
        match err {
            token_auth::Error::InvalidCredential(msg) => Self::InvalidCredential(msg),
            token_auth::Error::Signing(msg) => Self::Signing(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
