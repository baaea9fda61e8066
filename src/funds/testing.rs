//! Scripted in-process fund API for tests.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

use super::client::FundsApi;
use super::error::{FetchError, SyncError};
use super::types::{
  FundDetail, FundListItem, FundSyncDetail, ListResult, NavPoint, SyncOutcome, SyncStatus,
};
use crate::params::ListRequest;

pub fn fund_item(n: u64) -> FundListItem {
  FundListItem {
    id: n as i64,
    code: format!("{:06}", n),
    name: format!("Fund {}", n),
    fund_type: Some("mixed".to_string()),
    nav: Some(1.0 + n as f64 / 100.0),
    nav_date: NaiveDate::from_ymd_opt(2024, 3, 1),
    daily_change_pct: Some(0.25),
  }
}

pub fn fund_detail(code: &str) -> FundDetail {
  FundDetail {
    id: 1,
    code: code.to_string(),
    name: format!("Fund {}", code),
    fund_type: Some("mixed".to_string()),
    created_at: NaiveDateTime::parse_from_str("2023-09-01 08:00:00", "%Y-%m-%d %H:%M:%S")
      .unwrap(),
    navs: vec![
      NavPoint {
        nav_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        nav: 1.20,
        accumulated_nav: Some(2.10),
      },
      NavPoint {
        nav_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        nav: 1.23,
        accumulated_nav: Some(2.13),
      },
    ],
  }
}

/// Fake remote. List pages contain up to three funds numbered from the
/// request's offset, so results identify the page that produced them.
pub struct FakeApi {
  list_calls: AtomicUsize,
  detail_calls: AtomicUsize,
  sync_calls: AtomicUsize,
  fail_lists: AtomicBool,
  fail_details: AtomicBool,
  last_list_request: Mutex<Option<ListRequest>>,
  last_sync_days: Mutex<Option<u32>>,
  list_gates: Mutex<HashMap<u64, oneshot::Receiver<()>>>,
  sync_result: Mutex<Result<SyncOutcome, SyncError>>,
}

impl FakeApi {
  pub fn new() -> Self {
    Self {
      list_calls: AtomicUsize::new(0),
      detail_calls: AtomicUsize::new(0),
      sync_calls: AtomicUsize::new(0),
      fail_lists: AtomicBool::new(false),
      fail_details: AtomicBool::new(false),
      last_list_request: Mutex::new(None),
      last_sync_days: Mutex::new(None),
      list_gates: Mutex::new(HashMap::new()),
      sync_result: Mutex::new(Ok(SyncOutcome {
        inserted_count: 5,
        status: SyncStatus::Success,
        message: None,
        details: vec![FundSyncDetail {
          code: "000001".to_string(),
          inserted: 5,
          fetched: 22,
        }],
      })),
    }
  }

  pub fn list_calls(&self) -> usize {
    self.list_calls.load(Ordering::SeqCst)
  }

  pub fn detail_calls(&self) -> usize {
    self.detail_calls.load(Ordering::SeqCst)
  }

  pub fn sync_calls(&self) -> usize {
    self.sync_calls.load(Ordering::SeqCst)
  }

  pub fn fail_lists(&self, fail: bool) {
    self.fail_lists.store(fail, Ordering::SeqCst);
  }

  pub fn fail_details(&self, fail: bool) {
    self.fail_details.store(fail, Ordering::SeqCst);
  }

  pub fn last_list_request(&self) -> Option<ListRequest> {
    self.last_list_request.lock().unwrap().clone()
  }

  pub fn last_sync_days(&self) -> Option<u32> {
    *self.last_sync_days.lock().unwrap()
  }

  pub fn set_sync_result(&self, result: Result<SyncOutcome, SyncError>) {
    *self.sync_result.lock().unwrap() = result;
  }

  /// Hold list responses for offset `skip` until the returned sender fires.
  pub fn gate_list(&self, skip: u64) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.list_gates.lock().unwrap().insert(skip, rx);
    tx
  }
}

#[async_trait]
impl FundsApi for FakeApi {
  async fn list_funds(
    &self,
    request: &ListRequest,
  ) -> Result<ListResult<FundListItem>, FetchError> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);
    *self.last_list_request.lock().unwrap() = Some(request.clone());

    let gate = self.list_gates.lock().unwrap().remove(&request.skip);
    if let Some(gate) = gate {
      let _ = gate.await;
    }

    if self.fail_lists.load(Ordering::SeqCst) {
      return Err(FetchError::Status { status: 500 });
    }

    let count = u64::from(request.limit.min(3));
    Ok(ListResult {
      items: (request.skip..request.skip + count).map(fund_item).collect(),
      total: 100,
    })
  }

  async fn fund_detail(&self, code: &str) -> Result<FundDetail, FetchError> {
    self.detail_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_details.load(Ordering::SeqCst) {
      return Err(FetchError::Status { status: 500 });
    }
    Ok(fund_detail(code))
  }

  async fn synchronize(&self, days: u32) -> Result<SyncOutcome, SyncError> {
    self.sync_calls.fetch_add(1, Ordering::SeqCst);
    *self.last_sync_days.lock().unwrap() = Some(days);
    self.sync_result.lock().unwrap().clone()
  }
}
