//! Lifecycle defaults
//!
//! Used when the service config leaves a value out.

use std::time::Duration;

/// Default lifetime of an access token.
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Default lifetime of a refresh value (7 days).
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Bytes of CSPRNG output behind each refresh value (256 bits).
pub const REFRESH_VALUE_BYTES: usize = 32;

/// Signing secrets shorter than this trigger a startup warning.
pub const RECOMMENDED_SECRET_BYTES: usize = 32;

/// Longest access token lifetime the service accepts.
pub const MAX_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest refresh value lifetime the service accepts (365 days).
pub const MAX_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);
