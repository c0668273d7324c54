//! In-memory refresh store
//!
//! Two sharded maps:
//! - `records`: refresh value -> `RefreshRecord` (primary, authoritative)
//! - `owners`: owner -> set of refresh values (secondary index)
//!
//! Removal from `records` is the single point at which a value stops being
//! usable, so `take` and `invalidate` are atomic without any lock of our own:
//! `DashMap::remove` holds the shard lock across the read and the delete.
//! The owner index is maintained around it and may briefly list values that
//! are already gone; readers always confirm against `records`.
//!
//! No method holds a guard on one map while locking the other.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::store::{RefreshRecord, RefreshStore, StoreFuture};

/// Single-process refresh store. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRefreshStore {
    records: DashMap<String, RefreshRecord>,
    owners: DashMap<String, HashSet<String>>,
}

impl MemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, value: &str, owner: &str, ttl: Duration) {
        let previous = self
            .records
            .insert(value.to_string(), RefreshRecord::new(owner, ttl));

        if let Some(previous) = previous
            && previous.owner != owner
        {
            self.unindex(&previous.owner, value);
        }

        self.owners
            .entry(owner.to_string())
            .or_default()
            .insert(value.to_string());
    }

    /// Atomically remove `value`, returning its record only if still live.
    fn remove_live(&self, value: &str) -> Option<RefreshRecord> {
        let (_, record) = self.records.remove(value)?;
        self.unindex(&record.owner, value);
        if record.is_expired() {
            debug!(owner = %record.owner, "refresh record found expired on removal");
            return None;
        }
        Some(record)
    }

    fn unindex(&self, owner: &str, value: &str) {
        if let Some(mut values) = self.owners.get_mut(owner) {
            values.remove(value);
        }
        self.owners.remove_if(owner, |_, values| values.is_empty());
    }

    fn revoke_owner(&self, owner: &str) -> usize {
        let Some((_, values)) = self.owners.remove(owner) else {
            return 0;
        };

        let now = Instant::now();
        let mut revoked = 0usize;
        for value in &values {
            // Only remove records still owned by `owner`; a value re-put for
            // someone else has already left this index set.
            if let Some((_, record)) = self.records.remove_if(value, |_, r| r.owner == owner)
                && !record.is_expired_at(now)
            {
                revoked += 1;
            }
        }
        revoked
    }

    fn count_live(&self, owner: &str) -> usize {
        let values: Vec<String> = match self.owners.get(owner) {
            Some(values) => values.iter().cloned().collect(),
            None => return 0,
        };

        let now = Instant::now();
        values
            .iter()
            .filter(|value| {
                self.records
                    .get(value.as_str())
                    .is_some_and(|r| r.owner == owner && !r.is_expired_at(now))
            })
            .count()
    }

    fn purge(&self) -> usize {
        let now = Instant::now();
        let mut expired: Vec<(String, String)> = Vec::new();
        self.records.retain(|value, record| {
            if record.is_expired_at(now) {
                expired.push((record.owner.clone(), value.clone()));
                false
            } else {
                true
            }
        });

        for (owner, value) in &expired {
            self.unindex(owner, value);
        }
        expired.len()
    }
}

impl RefreshStore for MemoryRefreshStore {
    fn put<'a>(&'a self, value: &'a str, owner: &'a str, ttl: Duration) -> StoreFuture<'a, ()> {
        Box::pin(async move { self.insert(value, owner, ttl) })
    }

    fn take<'a>(&'a self, value: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { self.remove_live(value).map(|record| record.owner) })
    }

    fn invalidate<'a>(&'a self, value: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move { self.remove_live(value).is_some() })
    }

    fn revoke_all<'a>(&'a self, owner: &'a str) -> StoreFuture<'a, usize> {
        Box::pin(async move {
            let revoked = self.revoke_owner(owner);
            info!(owner, revoked, "revoked refresh records for owner");
            revoked
        })
    }

    fn active_count<'a>(&'a self, owner: &'a str) -> StoreFuture<'a, usize> {
        Box::pin(async move { self.count_live(owner) })
    }

    fn purge_expired(&self) -> StoreFuture<'_, usize> {
        Box::pin(async move { self.purge() })
    }

    fn len(&self) -> StoreFuture<'_, usize> {
        Box::pin(async move { self.records.len() })
    }
}
