//! Synchronize coordinator: out-of-band refresh of the remote dataset.

use std::ops::RangeInclusive;
use tracing::{info, warn};

use crate::funds::cache::FundsQueryKey;
use crate::funds::{FetchCoordinator, SyncError, SyncOutcome};

/// Lookback windows the remote accepts, in days.
pub const SYNC_WINDOW_DAYS: RangeInclusive<u32> = 1..=3650;

/// What to do with cached list/detail entries after a successful sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncPolicy {
  /// Leave entries to expire on their own TTL.
  #[default]
  KeepCache,
  /// Drop every list and detail entry so the follow-up fetch hits the remote.
  InvalidateCache,
}

/// Runs the remote synchronize command.
///
/// The follow-up list refresh is driven by the caller (see
/// `App::on_sync_completed`) so it goes through the same latest-wins path as
/// any other query change.
#[derive(Clone)]
pub struct SyncCoordinator {
  fetch: FetchCoordinator,
  policy: SyncPolicy,
}

impl SyncCoordinator {
  pub fn new(fetch: FetchCoordinator, policy: SyncPolicy) -> Self {
    Self { fetch, policy }
  }

  pub fn policy(&self) -> SyncPolicy {
    self.policy
  }

  /// Ask the remote to re-ingest the trailing `days` of data.
  pub async fn synchronize(&self, days: u32) -> Result<SyncOutcome, SyncError> {
    if !SYNC_WINDOW_DAYS.contains(&days) {
      return Err(SyncError::InvalidWindow(days));
    }

    let outcome = match self.fetch.api().synchronize(days).await {
      Ok(outcome) => outcome,
      Err(e) => {
        warn!(days, error = %e, "synchronize failed");
        return Err(e);
      }
    };

    info!(
      days,
      inserted = outcome.inserted_count,
      status = ?outcome.status,
      "synchronize finished"
    );

    if self.policy == SyncPolicy::InvalidateCache {
      let store = self.fetch.store();
      let removed = store.remove_prefix(&FundsQueryKey::prefix("list"))
        + store.remove_prefix(&FundsQueryKey::prefix("detail"));
      info!(removed, "invalidated cached fund data after synchronize");
    }

    Ok(outcome)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheStore, MemoryStorage};
  use crate::funds::testing::FakeApi;
  use crate::params::QueryParams;
  use std::sync::Arc;

  fn coordinators(api: &Arc<FakeApi>, policy: SyncPolicy) -> (FetchCoordinator, SyncCoordinator) {
    let fetch = FetchCoordinator::new(api.clone(), CacheStore::new(MemoryStorage::new()));
    let sync = SyncCoordinator::new(fetch.clone(), policy);
    (fetch, sync)
  }

  #[tokio::test]
  async fn test_synchronize_reports_inserted() {
    let api = Arc::new(FakeApi::new());
    let (_, sync) = coordinators(&api, SyncPolicy::KeepCache);

    let outcome = sync.synchronize(30).await.unwrap();
    assert_eq!(outcome.inserted_count, 5);
    assert_eq!(api.last_sync_days(), Some(30));
    // The coordinator itself never fetches
    assert_eq!(api.list_calls(), 0);
  }

  #[tokio::test]
  async fn test_invalid_window_skips_remote() {
    let api = Arc::new(FakeApi::new());
    let (_, sync) = coordinators(&api, SyncPolicy::KeepCache);

    assert!(matches!(
      sync.synchronize(0).await,
      Err(SyncError::InvalidWindow(0))
    ));
    assert!(matches!(
      sync.synchronize(3651).await,
      Err(SyncError::InvalidWindow(3651))
    ));
    assert_eq!(api.sync_calls(), 0);
  }

  #[tokio::test]
  async fn test_keep_cache_leaves_entries() {
    let api = Arc::new(FakeApi::new());
    let (fetch, sync) = coordinators(&api, SyncPolicy::KeepCache);
    let params = QueryParams::default();

    fetch.fetch_list(&params).await.unwrap();
    sync.synchronize(30).await.unwrap();

    assert!(fetch.cached_list(&params).is_some());
  }

  #[tokio::test]
  async fn test_invalidate_cache_drops_entries() {
    let api = Arc::new(FakeApi::new());
    let (fetch, sync) = coordinators(&api, SyncPolicy::InvalidateCache);
    let params = QueryParams::default();

    fetch.fetch_list(&params).await.unwrap();
    fetch.fetch_detail("000001").await.unwrap();
    sync.synchronize(7).await.unwrap();

    assert_eq!(fetch.cached_list(&params), None);
    assert_eq!(fetch.cached_detail("000001"), None);
  }

  #[tokio::test]
  async fn test_failed_sync_keeps_cache_even_when_invalidating() {
    let api = Arc::new(FakeApi::new());
    api.set_sync_result(Err(SyncError::Status { status: 502 }));
    let (fetch, sync) = coordinators(&api, SyncPolicy::InvalidateCache);
    let params = QueryParams::default();

    fetch.fetch_list(&params).await.unwrap();
    assert!(matches!(
      sync.synchronize(30).await,
      Err(SyncError::Status { status: 502 })
    ));
    assert!(fetch.cached_list(&params).is_some());
  }
}
