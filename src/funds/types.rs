use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One page of a list endpoint, plus the unpaged total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
  pub items: Vec<T>,
  pub total: u64,
}

/// Fund row for list views, with its latest NAV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundListItem {
  pub id: i64,
  pub code: String,
  pub name: String,
  pub fund_type: Option<String>,
  pub nav: Option<f64>,
  pub nav_date: Option<NaiveDate>,
  pub daily_change_pct: Option<f64>,
}

/// A single valuation point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
  pub nav_date: NaiveDate,
  pub nav: f64,
  pub accumulated_nav: Option<f64>,
}

/// Full fund details with NAV history, oldest point first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundDetail {
  pub id: i64,
  pub code: String,
  pub name: String,
  pub fund_type: Option<String>,
  pub created_at: NaiveDateTime,
  pub navs: Vec<NavPoint>,
}

impl FundDetail {
  pub fn latest_nav(&self) -> Option<&NavPoint> {
    self.navs.last()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
  Success,
  /// The remote had nothing to synchronize
  Noop,
}

/// Per-fund counts reported by a synchronize run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundSyncDetail {
  pub code: String,
  pub inserted: u64,
  pub fetched: u64,
}

/// Result of a synchronize call (never cached)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
  pub inserted_count: u64,
  pub status: SyncStatus,
  pub message: Option<String>,
  pub details: Vec<FundSyncDetail>,
}
