//! TTL cache store over a key-value storage backend.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::storage::KeyValueStorage;
use super::traits::{Clock, SystemClock};

/// Persisted envelope for one cached value.
///
/// Serialized as `{"expiresAt": <epoch-millis>, "value": <json>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
  pub expires_at: i64,
  pub value: T,
}

/// Keyed store of values with absolute expiry.
///
/// Storage failures never reach the caller: a failed write is dropped and a
/// failed or corrupt read is a miss. Cloning shares the same backend.
#[derive(Clone)]
pub struct CacheStore {
  storage: Arc<dyn KeyValueStorage>,
  clock: Arc<dyn Clock>,
}

impl CacheStore {
  pub fn new(storage: impl KeyValueStorage + 'static) -> Self {
    Self::with_clock(storage, SystemClock)
  }

  pub fn with_clock(
    storage: impl KeyValueStorage + 'static,
    clock: impl Clock + 'static,
  ) -> Self {
    Self {
      storage: Arc::new(storage),
      clock: Arc::new(clock),
    }
  }

  fn now_millis(&self) -> i64 {
    self.clock.now().timestamp_millis()
  }

  /// Look up `key`, evicting it if it has expired or cannot be decoded.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let raw = match self.storage.get_item(key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!(key, error = %e, "cache read failed, treating as miss");
        self.remove(key);
        return None;
      }
    };

    let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
      Ok(entry) => entry,
      Err(e) => {
        warn!(key, error = %e, "evicting corrupt cache entry");
        self.remove(key);
        return None;
      }
    };

    if self.now_millis() > entry.expires_at {
      debug!(key, "cache entry expired");
      self.remove(key);
      return None;
    }

    Some(entry.value)
  }

  /// Store `value` under `key` until `ttl` from now.
  pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
    if ttl.is_zero() {
      debug!(key, "ignoring cache write with zero ttl");
      return;
    }

    // Sub-millisecond ttls round up so the expiry stays in the future
    let ttl_millis = i64::try_from(ttl.as_nanos().div_ceil(1_000_000)).unwrap_or(i64::MAX);
    let entry = CacheEntry {
      expires_at: self.now_millis().saturating_add(ttl_millis),
      value,
    };

    let raw = match serde_json::to_string(&entry) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(key, error = %e, "failed to serialize cache entry");
        return;
      }
    };

    if let Err(e) = self.storage.set_item(key, &raw) {
      warn!(key, error = %e, "cache write failed, skipping");
    }
  }

  pub fn remove(&self, key: &str) {
    if let Err(e) = self.storage.remove_item(key) {
      warn!(key, error = %e, "failed to remove cache entry");
    }
  }

  /// Remove every entry whose key starts with `prefix`. Returns how many were removed.
  pub fn remove_prefix(&self, prefix: &str) -> usize {
    self.remove_matching(|key, _| key.starts_with(prefix))
  }

  /// Remove expired and undecodable entries. Returns how many were removed.
  pub fn purge_expired(&self) -> usize {
    let now = self.now_millis();
    self.remove_matching(|_, raw| {
      match serde_json::from_str::<CacheEntry<serde::de::IgnoredAny>>(raw) {
        Ok(entry) => now > entry.expires_at,
        Err(_) => true,
      }
    })
  }

  /// Remove everything.
  pub fn clear(&self) -> usize {
    self.remove_matching(|_, _| true)
  }

  fn remove_matching(&self, mut should_remove: impl FnMut(&str, &str) -> bool) -> usize {
    let keys = match self.storage.keys() {
      Ok(keys) => keys,
      Err(e) => {
        warn!(error = %e, "failed to list cache keys");
        return 0;
      }
    };

    let mut removed = 0;
    for key in keys {
      let raw = match self.storage.get_item(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => continue,
        // Unreadable entries count as corrupt
        Err(_) => String::new(),
      };
      if should_remove(&key, &raw) && self.storage.remove_item(&key).is_ok() {
        removed += 1;
      }
    }
    removed
  }
}
