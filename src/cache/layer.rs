//! Cache layer that orchestrates caching logic with network fetching.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::store::CacheStore;
use super::traits::CacheResult;

/// Cache layer that manages cache-first fetching.
///
/// This layer sits between the coordinator and the network client. A fresh
/// entry short-circuits the fetcher entirely; a miss runs the fetcher and
/// stores its result. Failed fetches never touch the store.
#[derive(Clone)]
pub struct CacheLayer {
  store: CacheStore,
}

impl CacheLayer {
  /// Create a new cache layer over the given store.
  pub fn new(store: CacheStore) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &CacheStore {
    &self.store
  }

  /// Return the cached value for `key` without fetching.
  pub fn peek<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    self.store.get(key)
  }

  /// Fetch with a cache-first strategy.
  ///
  /// 1. Check cache - if fresh, return immediately
  /// 2. On miss, fetch from network
  /// 3. On success, store with `ttl` and return
  /// 4. On failure, return the error and leave the cache as it was
  pub async fn fetch<T, E, F, Fut>(
    &self,
    key: &str,
    ttl: Duration,
    fetcher: F,
  ) -> Result<CacheResult<T>, E>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    if let Some(cached) = self.store.get(key) {
      debug!(key, "cache hit");
      return Ok(CacheResult::from_cache(cached));
    }

    debug!(key, "cache miss, fetching");
    let data = fetcher().await?;
    self.store.set(key, &data, ttl);
    Ok(CacheResult::from_network(data))
  }
}
