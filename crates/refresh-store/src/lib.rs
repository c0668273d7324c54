//! Server-side state for refresh credentials
//!
//! Maps each opaque refresh value to its owning identity and expiry. The
//! `RefreshStore` trait is the contract the credential manager relies on:
//! single-step take (lookup and delete are one atomic operation), delete-only
//! invalidation, and owner-indexed bulk revocation. `MemoryRefreshStore` is
//! the single-process implementation.
//!
//! Record lifecycle:
//! 1. `put` on login or rotation -> live
//! 2. `take` on rotation, or `invalidate` on logout -> gone, never revivable
//! 3. `revoke_all(owner)` -> every live record of the owner gone
//! 4. TTL elapses -> treated as absent immediately, physically removed by the
//!    next `take`/`purge_expired` (see `spawn_sweep_task`)

pub mod memory;
pub mod store;
pub mod sweep;

pub use memory::MemoryRefreshStore;
pub use store::{MAX_RECORD_TTL, RefreshRecord, RefreshStore, StoreFuture};
pub use sweep::spawn_sweep_task;
