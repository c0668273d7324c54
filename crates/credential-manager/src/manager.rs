//! Login, rotation, logout and bulk revocation
//!
//! The manager holds no state of its own beyond its collaborators. The store
//! owns every refresh record; the signer is immutable. Rotation's
//! correctness rests entirely on `RefreshStore::take` being atomic: two
//! concurrent rotations of the same value cannot both succeed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use refresh_store::RefreshStore;
use serde::{Deserialize, Serialize};
use token_auth::{AccessClaims, Signer, generate_refresh_value};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// What a client receives on login and on every rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

pub struct CredentialManager {
    signer: Signer,
    store: Arc<dyn RefreshStore>,
    refresh_ttl: Duration,
}

impl CredentialManager {
    pub fn new(signer: Signer, store: Arc<dyn RefreshStore>, refresh_ttl: Duration) -> Self {
        Self {
            signer,
            store,
            refresh_ttl,
        }
    }

    /// Issue a fresh pair for an already-authenticated identity.
    pub async fn login(&self, identity: &str) -> Result<CredentialPair> {
        let pair = self.issue_pair(identity).await?;
        info!(identity, "credential pair issued on login");
        Ok(pair)
    }

    /// Exchange a refresh value for a new pair. The presented value is
    /// consumed whether or not anything after the take succeeds.
    pub async fn rotate(&self, refresh: &str) -> Result<CredentialPair> {
        let Some(owner) = self.store.take(refresh).await else {
            debug!("refresh rejected on rotate");
            return Err(Error::InvalidRefreshToken);
        };

        let pair = self.issue_pair(&owner).await?;
        info!(identity = %owner, "refresh credential rotated");
        Ok(pair)
    }

    /// Invalidate a refresh value. Issues nothing.
    pub async fn logout(&self, refresh: &str) -> Result<()> {
        if !self.store.invalidate(refresh).await {
            debug!("refresh rejected on logout");
            return Err(Error::InvalidRefreshToken);
        }
        info!("refresh credential invalidated on logout");
        Ok(())
    }

    /// Revoke every refresh credential of `identity`. Returns how many live
    /// ones were removed. Outstanding access tokens stay valid until their
    /// own expiry.
    pub async fn revoke_all(&self, identity: &str) -> Result<usize> {
        let revoked = self.store.revoke_all(identity).await;
        info!(identity, revoked, "all refresh credentials revoked");
        Ok(revoked)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        Ok(self.signer.verify(token)?)
    }

    pub async fn active_sessions(&self, identity: &str) -> usize {
        self.store.active_count(identity).await
    }

    pub fn store(&self) -> &Arc<dyn RefreshStore> {
        &self.store
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    async fn issue_pair(&self, identity: &str) -> Result<CredentialPair> {
        let access = self.signer.issue(identity)?;
        let refresh = generate_refresh_value();
        self.store.put(&refresh, identity, self.refresh_ttl).await;

        Ok(CredentialPair {
            access_token: access.token,
            refresh_token: refresh,
            access_token_expires_at: access.expires_at,
        })
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("signer", &self.signer)
            .field("refresh_ttl_secs", &self.refresh_ttl.as_secs())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Secret;
    use refresh_store::MemoryRefreshStore;
    use token_auth::DEFAULT_REFRESH_TOKEN_TTL;

    fn manager_with(refresh_ttl: Duration) -> CredentialManager {
        let signer = Signer::new(
            &Secret::new(b"test-secret-key-that-is-32-bytes".to_vec()),
            "test-issuer",
            "test-audience",
            Duration::from_secs(900),
        );
        CredentialManager::new(signer, Arc::new(MemoryRefreshStore::new()), refresh_ttl)
    }

    fn manager() -> CredentialManager {
        manager_with(DEFAULT_REFRESH_TOKEN_TTL)
    }

    #[tokio::test]
    async fn login_issues_verifiable_pair() {
        let m = manager();
        let pair = m.login("alice").await.unwrap();

        let claims = m.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.identity(), "alice");
        assert_eq!(pair.refresh_token.len(), 43);
        assert_eq!(pair.access_token_expires_at.timestamp() as u64, claims.exp);
        assert_eq!(m.active_sessions("alice").await, 1);
    }

    #[tokio::test]
    async fn full_lifecycle_scenario() {
        let m = manager();

        let p1 = m.login("alice").await.unwrap();
        let p2 = m.rotate(&p1.refresh_token).await.unwrap();
        assert_ne!(p1.refresh_token, p2.refresh_token);
        assert_eq!(
            m.verify_access(&p2.access_token).unwrap().identity(),
            "alice"
        );

        assert!(matches!(
            m.rotate(&p1.refresh_token).await,
            Err(Error::InvalidRefreshToken)
        ));

        m.revoke_all("alice").await.unwrap();
        assert!(matches!(
            m.rotate(&p2.refresh_token).await,
            Err(Error::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn rotated_value_cannot_be_logged_out() {
        let m = manager();
        let p1 = m.login("alice").await.unwrap();
        m.rotate(&p1.refresh_token).await.unwrap();

        assert!(matches!(
            m.logout(&p1.refresh_token).await,
            Err(Error::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn rotating_one_identity_leaves_others_alone() {
        let m = manager();
        let a = m.login("alice").await.unwrap();
        let b = m.login("bob").await.unwrap();

        m.rotate(&a.refresh_token).await.unwrap();
        m.revoke_all("alice").await.unwrap();

        let b2 = m.rotate(&b.refresh_token).await.unwrap();
        assert_eq!(m.verify_access(&b2.access_token).unwrap().identity(), "bob");
    }

    #[tokio::test]
    async fn revoke_all_covers_every_session() {
        let m = manager();
        let sessions = login_many(&m, "alice", 3).await;
        assert_eq!(m.active_sessions("alice").await, 3);

        assert_eq!(m.revoke_all("alice").await.unwrap(), 3);
        assert_eq!(m.revoke_all("alice").await.unwrap(), 0);
        for pair in sessions {
            assert!(m.rotate(&pair.refresh_token).await.is_err());
        }
    }

    async fn login_many(m: &CredentialManager, identity: &str, n: usize) -> Vec<CredentialPair> {
        let mut pairs = Vec::with_capacity(n);
        for _ in 0..n {
            pairs.push(m.login(identity).await.unwrap());
        }
        pairs
    }

    #[tokio::test]
    async fn logout_issues_nothing() {
        let m = manager();
        let pair = m.login("alice").await.unwrap();
        m.login("alice").await.unwrap();
        assert_eq!(m.store().len().await, 2);

        m.logout(&pair.refresh_token).await.unwrap();
        assert_eq!(m.store().len().await, 1);
        assert_eq!(m.active_sessions("alice").await, 1);
        assert!(matches!(
            m.rotate(&pair.refresh_token).await,
            Err(Error::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn unknown_and_expired_values_fail_identically() {
        let m = manager_with(Duration::ZERO);
        let pair = m.login("alice").await.unwrap();

        let expired = m.rotate(&pair.refresh_token).await.unwrap_err();
        let unknown = m.rotate("never-issued").await.unwrap_err();
        assert_eq!(expired.to_string(), unknown.to_string());
        assert!(matches!(expired, Error::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn oversized_refresh_ttl_does_not_panic() {
        let m = manager_with(Duration::MAX);
        let pair = m.login("alice").await.unwrap();
        assert_eq!(m.active_sessions("alice").await, 1);
        m.rotate(&pair.refresh_token).await.unwrap();
    }

    #[test]
    fn signer_settings_are_exposed() {
        let m = manager();
        assert_eq!(m.signer().issuer(), "test-issuer");
        assert_eq!(m.signer().audience(), "test-audience");
        assert_eq!(m.signer().ttl(), Duration::from_secs(900));
    }

    #[tokio::test]
    async fn bad_access_token_maps_to_invalid_credential() {
        let m = manager();
        assert!(matches!(
            m.verify_access("garbage"),
            Err(Error::InvalidCredential(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_rotation_has_exactly_one_winner() {
        let m = Arc::new(manager());
        for _ in 0..25 {
            let pair = m.login("alice").await.unwrap();
            let barrier = Arc::new(tokio::sync::Barrier::new(2));

            let mut handles = Vec::new();
            for _ in 0..2 {
                let m = m.clone();
                let barrier = barrier.clone();
                let refresh = pair.refresh_token.clone();
                handles.push(tokio::spawn(async move {
                    barrier.wait().await;
                    m.rotate(&refresh).await
                }));
            }

            let mut ok = 0;
            let mut rejected = 0;
            for h in handles {
                match h.await.unwrap() {
                    Ok(_) => ok += 1,
                    Err(Error::InvalidRefreshToken) => rejected += 1,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            assert_eq!((ok, rejected), (1, 1));
        }
    }

    #[test]
    fn pair_serializes_with_expected_field_names() {
        let pair = CredentialPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
            access_token_expires_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["access_token"], "a");
        assert_eq!(json["refresh_token"], "r");
        assert_eq!(json["access_token_expires_at"], "1970-01-01T00:00:00Z");
    }
}
