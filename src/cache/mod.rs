//! Generic caching layer for time-boxed response reuse.
//!
//! This module provides a domain-agnostic caching mechanism that:
//! - Stores serialized values under string keys with an absolute expiry
//! - Evicts expired and corrupt entries on access
//! - Treats every storage failure as a miss (reads) or a no-op (writes)
//! - Runs network fetches only when the cache has nothing fresh

mod layer;
mod storage;
mod store;
mod traits;

pub use layer::CacheLayer;
pub use storage::{MemoryStorage, NoopStorage, SqliteStorage};
pub use store::CacheStore;

#[cfg(test)]
pub(crate) use storage::KeyValueStorage;
#[cfg(test)]
pub(crate) use traits::testing::ManualClock;
