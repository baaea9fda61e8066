//! Immutable list-view state and its transitions.
//!
//! Each transition takes the current snapshot and returns the next one; no
//! snapshot is ever mutated after it is built. The [`App`](crate::app::App)
//! decides *when* a transition fires (for example, only for the latest
//! request's response); this module decides *what* the resulting view looks
//! like.

use crate::funds::{FetchError, FundListItem, ListResult, SyncError, SyncOutcome};
use crate::params::QueryParams;

/// Sync progress shown alongside the list.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
  Idle,
  Running { days: u32 },
  Done(SyncOutcome),
  Failed(String),
}

/// Snapshot of everything the fund list view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListViewState {
  /// Query the visible page should reflect
  pub params: QueryParams,
  /// Last successfully loaded page
  pub page: Option<ListResult<FundListItem>>,
  /// Params that produced `page`
  pub page_params: Option<QueryParams>,
  pub loading: bool,
  /// User-visible notice from the last failure, cleared on success
  pub notice: Option<String>,
  pub sync: SyncState,
}

impl ListViewState {
  pub fn new(params: QueryParams) -> Self {
    Self {
      params,
      page: None,
      page_params: None,
      loading: false,
      notice: None,
      sync: SyncState::Idle,
    }
  }

  pub fn items(&self) -> &[FundListItem] {
    self.page.as_ref().map(|p| p.items.as_slice()).unwrap_or(&[])
  }

  pub fn total(&self) -> u64 {
    self.page.as_ref().map(|p| p.total).unwrap_or(0)
  }

  /// Total number of pages for the current page size.
  pub fn page_count(&self) -> u64 {
    let size = u64::from(self.params.normalized().page_size);
    self.total().div_ceil(size)
  }

  /// Params changed and the page was found in the cache: no loading transition.
  pub fn on_cache_hit(&self, params: QueryParams, page: ListResult<FundListItem>) -> Self {
    Self {
      page_params: Some(params.clone()),
      params,
      page: Some(page),
      loading: false,
      notice: None,
      sync: self.sync.clone(),
    }
  }

  /// Params changed and a network request was issued.
  ///
  /// The previous page stays visible until the new one arrives.
  pub fn on_params_changed(&self, params: QueryParams) -> Self {
    Self {
      params,
      loading: true,
      ..self.clone()
    }
  }

  /// The latest request succeeded.
  pub fn on_list_loaded(&self, page: ListResult<FundListItem>) -> Self {
    Self {
      page: Some(page),
      page_params: Some(self.params.clone()),
      loading: false,
      notice: None,
      ..self.clone()
    }
  }

  /// The latest request failed: keep the prior page, surface a notice.
  pub fn on_list_failed(&self, error: &FetchError) -> Self {
    Self {
      loading: false,
      notice: Some(format!("Failed to load funds: {}", error)),
      ..self.clone()
    }
  }

  pub fn on_sync_started(&self, days: u32) -> Self {
    Self {
      sync: SyncState::Running { days },
      ..self.clone()
    }
  }

  pub fn on_sync_completed(&self, outcome: SyncOutcome) -> Self {
    Self {
      sync: SyncState::Done(outcome),
      ..self.clone()
    }
  }

  pub fn on_sync_failed(&self, error: &SyncError) -> Self {
    let message = format!("Synchronize failed: {}", error);
    Self {
      sync: SyncState::Failed(message.clone()),
      notice: Some(message),
      ..self.clone()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::funds::testing::fund_item;
  use crate::funds::types::SyncStatus;

  fn page(first: u64) -> ListResult<FundListItem> {
    ListResult {
      items: vec![fund_item(first)],
      total: 41,
    }
  }

  #[test]
  fn test_cache_hit_has_no_loading_transition() {
    let state = ListViewState::new(QueryParams::default());
    let next = state.on_cache_hit(QueryParams::new(2, 20), page(20));

    assert!(!next.loading);
    assert_eq!(next.items()[0].code, "000020");
    assert_eq!(next.page_params, Some(QueryParams::new(2, 20)));
    // The previous snapshot is unchanged
    assert!(state.page.is_none());
  }

  #[test]
  fn test_failure_keeps_previous_page() {
    let loaded = ListViewState::new(QueryParams::default()).on_list_loaded(page(0));
    let failed = loaded
      .on_params_changed(QueryParams::new(2, 20))
      .on_list_failed(&FetchError::Timeout);

    assert!(!failed.loading);
    assert_eq!(failed.page, loaded.page);
    assert_eq!(failed.page_params, Some(QueryParams::default()));
    assert!(failed.notice.as_deref().unwrap().contains("timeout"));

    let recovered = failed.on_list_loaded(page(20));
    assert_eq!(recovered.notice, None);
    assert_eq!(recovered.page_params, Some(QueryParams::new(2, 20)));
  }

  #[test]
  fn test_page_count() {
    let state = ListViewState::new(QueryParams::new(1, 20)).on_list_loaded(page(0));
    assert_eq!(state.page_count(), 3);
  }

  #[test]
  fn test_sync_transitions() {
    let state = ListViewState::new(QueryParams::default()).on_sync_started(30);
    assert_eq!(state.sync, SyncState::Running { days: 30 });

    let outcome = SyncOutcome {
      inserted_count: 0,
      status: SyncStatus::Noop,
      message: Some("nothing to do".into()),
      details: Vec::new(),
    };
    let done = state.on_sync_completed(outcome.clone());
    assert_eq!(done.sync, SyncState::Done(outcome));

    let failed = state.on_sync_failed(&SyncError::Timeout);
    assert!(matches!(failed.sync, SyncState::Failed(_)));
    assert!(failed.notice.is_some());
  }
}
