//! Username/password check and bearer extraction
//!
//! The service only ever sees SHA-256 digests of configured passwords.
//! Unknown users and wrong passwords are indistinguishable to the caller.

use std::collections::HashMap;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use sha2::{Digest, Sha256};

use crate::config::UserEntry;
use crate::error::ApiError;

type Digest256 = [u8; 32];

/// Authenticator backed by the `[[users]]` config table.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    users: HashMap<String, Digest256>,
}

impl StaticAuthenticator {
    /// Entries whose digest is not 64 hex characters are skipped; config
    /// validation rejects them before this point.
    pub fn new(users: &[UserEntry]) -> Self {
        Self {
            users: users
                .iter()
                .filter_map(|u| Some((u.username.clone(), decode_digest(&u.password_sha256)?)))
                .collect(),
        }
    }

    /// Check a username/password pair. Returns the identity on success.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let submitted: Digest256 = Sha256::digest(password.as_bytes()).into();
        match self.users.get(username) {
            Some(expected) if digests_equal(expected, &submitted) => Ok(username.to_string()),
            _ => Err(ApiError::Unauthorized),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

/// Lowercase hex SHA-256 of a password, as written in `[[users]]`.
#[cfg(test)]
pub(crate) fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn decode_digest(hex: &str) -> Option<Digest256> {
    let bytes = hex.as_bytes();
    if bytes.len() != 64 {
        return None;
    }
    let mut out = [0u8; 32];
    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out[i] = (hi * 16 + lo) as u8;
    }
    Some(out)
}

/// Compares every byte regardless of where the first mismatch is.
fn digests_equal(a: &Digest256, b: &Digest256) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidCredential("missing bearer token".into()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(ApiError::InvalidCredential(
            "authorization header must use the Bearer scheme".into(),
        )),
    }
}
