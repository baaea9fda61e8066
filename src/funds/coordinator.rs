//! Fetch coordinator: cache-first access to the fund API.

use std::sync::Arc;
use tracing::debug;

use crate::cache::{CacheLayer, CacheStore};
use crate::params::QueryParams;

use super::cache::{detail_key, query_key, DETAIL_TTL, LIST_TTL};
use super::client::FundsApi;
use super::error::FetchError;
use super::types::{FundDetail, FundListItem, ListResult};

/// Fund client with transparent caching support.
///
/// This wraps a [`FundsApi`] and answers list and detail requests from the
/// cache store while entries are fresh. Failed requests never write to the
/// store, so a previously cached value survives a failed refresh.
#[derive(Clone)]
pub struct FetchCoordinator {
  api: Arc<dyn FundsApi>,
  cache: CacheLayer,
}

impl FetchCoordinator {
  pub fn new(api: Arc<dyn FundsApi>, store: CacheStore) -> Self {
    Self {
      api,
      cache: CacheLayer::new(store),
    }
  }

  pub fn api(&self) -> &Arc<dyn FundsApi> {
    &self.api
  }

  pub fn store(&self) -> &CacheStore {
    self.cache.store()
  }

  /// Cached page for `params`, if still fresh. Never touches the network.
  pub fn cached_list(&self, params: &QueryParams) -> Option<ListResult<FundListItem>> {
    self.cache.peek(&query_key(params))
  }

  /// Cached details for `code`, if still fresh. Never touches the network.
  pub fn cached_detail(&self, code: &str) -> Option<FundDetail> {
    self.cache.peek(&detail_key(code))
  }

  /// Get one page of funds with caching.
  pub async fn fetch_list(
    &self,
    params: &QueryParams,
  ) -> Result<ListResult<FundListItem>, FetchError> {
    let key = query_key(params);
    let request = params.to_list_request();

    let result = self
      .cache
      .fetch(&key, LIST_TTL, || {
        let api = Arc::clone(&self.api);
        async move { api.list_funds(&request).await }
      })
      .await?;

    debug!(cached = result.is_cached(), total = result.data.total, "fund list resolved");
    Ok(result.data)
  }

  /// Get a single fund by code with caching.
  pub async fn fetch_detail(&self, code: &str) -> Result<FundDetail, FetchError> {
    let key = detail_key(code);

    let result = self
      .cache
      .fetch(&key, DETAIL_TTL, || {
        let api = Arc::clone(&self.api);
        let code = code.to_string();
        async move { api.fund_detail(&code).await }
      })
      .await?;

    debug!(cached = result.is_cached(), code, "fund detail resolved");
    Ok(result.data)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{KeyValueStorage, ManualClock, MemoryStorage};
  use crate::funds::testing::{fund_detail, FakeApi};
  use crate::params::SortOrder;

  fn snapshot(storage: &MemoryStorage) -> Vec<(String, Option<String>)> {
    storage
      .keys()
      .unwrap()
      .into_iter()
      .map(|k| {
        let v = storage.get_item(&k).unwrap();
        (k, v)
      })
      .collect()
  }

  fn coordinator(api: &Arc<FakeApi>) -> FetchCoordinator {
    FetchCoordinator::new(api.clone(), CacheStore::new(MemoryStorage::new()))
  }

  #[tokio::test]
  async fn test_repeat_list_within_ttl_hits_cache() {
    let api = Arc::new(FakeApi::new());
    let fetch = coordinator(&api);
    let params = QueryParams::new(1, 10).with_sort(Some("nav"), SortOrder::Desc);

    let first = fetch.fetch_list(&params).await.unwrap();
    let second = fetch.fetch_list(&params).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(api.list_calls(), 1);
    assert_eq!(fetch.cached_list(&params), Some(first));
  }

  #[tokio::test]
  async fn test_list_sends_translated_request() {
    let api = Arc::new(FakeApi::new());
    let fetch = coordinator(&api);

    fetch
      .fetch_list(&QueryParams::new(3, 10).with_search(Some("growth")))
      .await
      .unwrap();

    let request = api.last_list_request().unwrap();
    assert_eq!(request.skip, 20);
    assert_eq!(request.limit, 10);
    assert_eq!(request.search.as_deref(), Some("growth"));
  }

  #[tokio::test]
  async fn test_list_refetches_after_ttl() {
    let api = Arc::new(FakeApi::new());
    let clock = Arc::new(ManualClock::new());
    let fetch = FetchCoordinator::new(
      api.clone(),
      CacheStore::with_clock(MemoryStorage::new(), clock.clone()),
    );
    let params = QueryParams::default();

    fetch.fetch_list(&params).await.unwrap();
    clock.advance(chrono::Duration::seconds(31));
    fetch.fetch_list(&params).await.unwrap();

    assert_eq!(api.list_calls(), 2);
  }

  #[tokio::test]
  async fn test_failed_list_is_not_cached() {
    let api = Arc::new(FakeApi::new());
    api.fail_lists(true);
    let fetch = coordinator(&api);
    let params = QueryParams::default();

    assert!(fetch.fetch_list(&params).await.is_err());
    assert_eq!(fetch.cached_list(&params), None);

    api.fail_lists(false);
    assert!(fetch.fetch_list(&params).await.is_ok());
    assert_eq!(api.list_calls(), 2);
  }

  #[tokio::test]
  async fn test_detail_failure_leaves_store_untouched() {
    let api = Arc::new(FakeApi::new());
    let storage = Arc::new(MemoryStorage::new());
    let fetch = FetchCoordinator::new(api.clone(), CacheStore::new(storage.clone()));

    fetch
      .store()
      .set(&detail_key("000002"), &fund_detail("000002"), DETAIL_TTL);
    let before = snapshot(&storage);
    api.fail_details(true);

    let err = fetch.fetch_detail("000001").await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 500 }));
    assert_eq!(snapshot(&storage), before);
    assert_eq!(fetch.cached_detail("000001"), None);
  }

  #[tokio::test]
  async fn test_fresh_detail_survives_remote_outage() {
    let api = Arc::new(FakeApi::new());
    let fetch = coordinator(&api);

    let cached = fetch.fetch_detail("000001").await.unwrap();
    api.fail_details(true);

    assert_eq!(fetch.fetch_detail("000001").await.unwrap(), cached);
    assert_eq!(api.detail_calls(), 1);
  }

  #[tokio::test]
  async fn test_detail_cache_hit_skips_network() {
    let api = Arc::new(FakeApi::new());
    let fetch = coordinator(&api);

    fetch.fetch_detail("000001").await.unwrap();
    fetch.fetch_detail("000001").await.unwrap();
    assert_eq!(api.detail_calls(), 1);
  }
}
