//! Serde-deserializable types matching fund API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use super::types::{
  FundDetail, FundListItem, FundSyncDetail, ListResult, NavPoint, SyncOutcome, SyncStatus,
};

// ============================================================================
// List endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiFundListItem {
  pub id: i64,
  pub code: String,
  pub name: String,
  pub fund_type: Option<String>,
  pub nav: Option<f64>,
  pub nav_date: Option<NaiveDate>,
  pub daily_change_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiFundListResponse {
  pub total: u64,
  #[serde(default)]
  pub items: Vec<ApiFundListItem>,
}

impl From<ApiFundListItem> for FundListItem {
  fn from(item: ApiFundListItem) -> Self {
    Self {
      id: item.id,
      code: item.code,
      name: item.name,
      fund_type: item.fund_type,
      nav: item.nav,
      nav_date: item.nav_date,
      daily_change_pct: item.daily_change_pct,
    }
  }
}

impl From<ApiFundListResponse> for ListResult<FundListItem> {
  fn from(response: ApiFundListResponse) -> Self {
    Self {
      items: response.items.into_iter().map(FundListItem::from).collect(),
      total: response.total,
    }
  }
}

// ============================================================================
// Detail endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiNavPoint {
  pub nav_date: NaiveDate,
  pub nav: f64,
  pub accumulated_nav: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiFundDetailResponse {
  pub id: i64,
  pub code: String,
  pub name: String,
  pub fund_type: Option<String>,
  #[serde(deserialize_with = "deserialize_timestamp")]
  pub created_at: NaiveDateTime,
  #[serde(default)]
  pub navs: Vec<ApiNavPoint>,
}

impl ApiFundDetailResponse {
  pub fn into_detail(self) -> FundDetail {
    let mut navs: Vec<NavPoint> = self
      .navs
      .into_iter()
      .map(|p| NavPoint {
        nav_date: p.nav_date,
        nav: p.nav,
        accumulated_nav: p.accumulated_nav,
      })
      .collect();
    // Callers rely on ascending dates
    navs.sort_by_key(|p| p.nav_date);

    FundDetail {
      id: self.id,
      code: self.code,
      name: self.name,
      fund_type: self.fund_type,
      created_at: self.created_at,
      navs,
    }
  }
}

/// Accept both naive ISO timestamps and ones carrying an offset.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
    return Ok(dt.naive_utc());
  }
  NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f").map_err(serde::de::Error::custom)
}

// ============================================================================
// Synchronize endpoint
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiSyncDetail {
  pub code: String,
  #[serde(default)]
  pub inserted: u64,
  #[serde(default)]
  pub fetched: u64,
}

#[derive(Debug, Deserialize)]
pub struct ApiSyncResponse {
  pub status: String,
  #[serde(default)]
  pub inserted: u64,
  #[serde(default)]
  pub details: Vec<ApiSyncDetail>,
  pub message: Option<String>,
}

impl ApiSyncResponse {
  /// Convert into a domain outcome; unknown statuses are rejected.
  pub fn into_outcome(self) -> Result<SyncOutcome, String> {
    let status = match self.status.as_str() {
      "success" => SyncStatus::Success,
      "noop" => SyncStatus::Noop,
      other => return Err(format!("unexpected sync status '{}'", other)),
    };

    Ok(SyncOutcome {
      inserted_count: self.inserted,
      status,
      message: self.message,
      details: self
        .details
        .into_iter()
        .map(|d| FundSyncDetail {
          code: d.code,
          inserted: d.inserted,
          fetched: d.fetched,
        })
        .collect(),
    })
  }
}
