//! HS256 access token signer
//!
//! Access tokens are self-contained JWTs. Nothing about them is stored
//! server-side: a token is valid exactly when its signature checks out under
//! the shared secret, its issuer and audience match, and its `exp` lies in
//! the future. Expiry is checked with zero leeway and `exp == now` counts as
//! expired.

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::Secret;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Identity the token was issued to
    pub sub: String,
    /// Unique token id (uuid v4)
    pub jti: String,
    /// Issued-at, unix seconds
    pub iat: u64,
    /// Expires-at, unix seconds
    pub exp: u64,
    pub iss: String,
    pub aud: String,
}

impl AccessClaims {
    pub fn identity(&self) -> &str {
        &self.sub
    }
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Serialized compact JWT
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// Stateless issuer/verifier for access tokens.
///
/// Cheap to clone; holds only derived key material and the validation
/// settings built at construction time.
#[derive(Clone)]
pub struct Signer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl Signer {
    pub fn new(
        secret: &Secret<Vec<u8>>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let issuer = issuer.into();
        let audience = audience.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&issuer]);
        validation.set_audience(&[&audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.expose()),
            decoding_key: DecodingKey::from_secret(secret.expose()),
            validation,
            issuer,
            audience,
            ttl,
        }
    }

    /// Issue an access token for `identity`, valid for the configured TTL.
    pub fn issue(&self, identity: &str) -> Result<IssuedToken> {
        let now = unix_now();
        let exp = now
            .checked_add(self.ttl.as_secs())
            .ok_or_else(|| Error::Signing("token lifetime overflows expiry".into()))?;
        let expires_at = i64::try_from(exp)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or_else(|| Error::Signing(format!("expiry {exp} out of range")))?;

        let claims = AccessClaims {
            sub: identity.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Signing(e.to_string()))?;

        debug!(identity, jti = %claims.jti, exp, "access token issued");
        Ok(IssuedToken {
            token,
            jti: claims.jti,
            expires_at,
        })
    }

    /// Verify a serialized access token and return its claims.
    pub fn verify(&self, token: &str) -> Result<AccessClaims> {
        let claims = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "token expired".to_string(),
                    ErrorKind::InvalidSignature => "signature mismatch".to_string(),
                    ErrorKind::InvalidIssuer => "issuer mismatch".to_string(),
                    ErrorKind::InvalidAudience => "audience mismatch".to_string(),
                    _ => e.to_string(),
                };
                Error::InvalidCredential(reason)
            })?;

        // The decoder accepts exp == now; we do not.
        if claims.exp <= unix_now() {
            return Err(Error::InvalidCredential("token expired".into()));
        }
        Ok(claims)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_secs", &self.ttl.as_secs())
            .finish()
    }
}

fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
