//! Opaque refresh value generation
//!
//! A refresh value is a bearer capability: whoever holds it can exchange it
//! once for a new credential pair. It carries no structure, so its only
//! protection is entropy.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;

use crate::constants::REFRESH_VALUE_BYTES;

/// Generate a fresh refresh value.
///
/// 32 bytes from the thread-local CSPRNG, encoded as URL-safe base64 without
/// padding (43 characters). Safe to place in JSON bodies, headers and URLs
/// without further escaping.
pub fn generate_refresh_value() -> String {
    let mut bytes = [0u8; REFRESH_VALUE_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn value_is_url_safe_base64_of_32_bytes() {
        let value = generate_refresh_value();
        // 32 bytes -> ceil(32 * 4 / 3) = 43 chars, no padding
        assert_eq!(value.len(), 43);
        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "refresh value must be URL-safe base64: {value}"
        );
        let decoded = URL_SAFE_NO_PAD.decode(&value).expect("valid base64url");
        assert_eq!(decoded.len(), REFRESH_VALUE_BYTES);
    }

    #[test]
    fn values_do_not_collide() {
        let values: HashSet<String> = (0..1000).map(|_| generate_refresh_value()).collect();
        assert_eq!(values.len(), 1000);
    }
}
