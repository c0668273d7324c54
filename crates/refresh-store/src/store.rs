//! Refresh store contract
//!
//! The credential manager only talks to `dyn RefreshStore`, so a shared
//! backing (distributed cache, transactional table) can replace the in-memory
//! map without touching rotation logic. Any implementation must uphold:
//!
//! - `take` and `invalidate` are atomic per value: of any number of
//!   concurrent calls for the same live value, exactly one observes it
//! - a removed value never becomes live again unless explicitly `put`
//! - an expired record behaves exactly like a missing one
//! - `revoke_all` may race with a concurrent `put` for the same owner; the
//!   racing record may survive (eventual, not linearizable)

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

/// Boxed future returned by store operations.
///
/// Boxed rather than `async fn` so the trait stays usable as
/// `Arc<dyn RefreshStore>`.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Upper bound on a record's lifetime (100 years).
pub const MAX_RECORD_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Server-held state for one refresh value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRecord {
    pub owner: String,
    pub expires_at: Instant,
}

impl RefreshRecord {
    /// TTLs beyond `MAX_RECORD_TTL` are clamped to it.
    pub fn new(owner: impl Into<String>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            owner: owner.into(),
            // Unrepresentable deadline: treat as already expired
            expires_at: now.checked_add(ttl.min(MAX_RECORD_TTL)).unwrap_or(now),
        }
    }

    /// A record whose deadline has been reached is expired.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

/// Keyed store of refresh values.
pub trait RefreshStore: Send + Sync {
    /// Insert or overwrite the record for `value`, expiring after `ttl`.
    fn put<'a>(&'a self, value: &'a str, owner: &'a str, ttl: Duration) -> StoreFuture<'a, ()>;

    /// Remove `value` and return its owner, in one atomic step.
    ///
    /// `None` if the value is unknown or expired.
    fn take<'a>(&'a self, value: &'a str) -> StoreFuture<'a, Option<String>>;

    /// Delete `value` without issuing anything in its place.
    ///
    /// Returns whether a live record was removed.
    fn invalidate<'a>(&'a self, value: &'a str) -> StoreFuture<'a, bool>;

    /// Remove every record owned by `owner`. Returns the number of live
    /// records removed; zero when the owner has none.
    fn revoke_all<'a>(&'a self, owner: &'a str) -> StoreFuture<'a, usize>;

    /// Number of live records owned by `owner`.
    fn active_count<'a>(&'a self, owner: &'a str) -> StoreFuture<'a, usize>;

    /// Physically remove expired records. Returns how many were removed.
    fn purge_expired(&self) -> StoreFuture<'_, usize>;

    /// Number of records physically held, expired ones included.
    fn len(&self) -> StoreFuture<'_, usize>;
}
