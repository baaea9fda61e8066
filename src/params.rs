//! List query parameters: paging, filtering and sorting state for the fund list.
//!
//! A [`QueryParams`] value is an immutable snapshot. Every UI-driven change
//! produces a new one through the `with_*` helpers, and the snapshot's
//! canonical JSON is what the cache keys on.
//!
//! Normalization rule for optional text fields: absent, empty and
//! whitespace-only all mean "no filter", and present values are trimmed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sort columns the remote list endpoint understands.
pub const SORT_FIELDS: &[&str] = &["nav", "daily_change_pct", "code", "name"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

impl SortOrder {
  pub fn as_str(self) -> &'static str {
    match self {
      SortOrder::Asc => "asc",
      SortOrder::Desc => "desc",
    }
  }
}

impl fmt::Display for SortOrder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SortOrder {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "asc" => Ok(SortOrder::Asc),
      "desc" => Ok(SortOrder::Desc),
      other => Err(format!("unknown sort order '{}', expected asc or desc", other)),
    }
  }
}

/// Page/filter/sort snapshot for the fund list view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryParams {
  pub page: u32,
  pub page_size: u32,
  pub fund_type: Option<String>,
  pub search: Option<String>,
  pub sort_by: Option<String>,
  pub sort_order: SortOrder,
}

impl Default for QueryParams {
  fn default() -> Self {
    Self {
      page: 1,
      page_size: 20,
      fund_type: None,
      search: None,
      sort_by: None,
      sort_order: SortOrder::Desc,
    }
  }
}

/// Query translated to the remote list endpoint's offset/limit contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRequest {
  pub skip: u64,
  pub limit: u32,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub fund_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub search: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sort_by: Option<String>,
  pub sort_order: SortOrder,
}

fn normalize_text(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(String::from)
}

impl QueryParams {
  pub fn new(page: u32, page_size: u32) -> Self {
    Self {
      page,
      page_size,
      ..Self::default()
    }
  }

  #[allow(dead_code)]
  pub fn with_page(&self, page: u32) -> Self {
    Self {
      page,
      ..self.clone()
    }
  }

  pub fn with_fund_type(&self, fund_type: Option<&str>) -> Self {
    Self {
      fund_type: fund_type.map(String::from),
      ..self.clone()
    }
  }

  pub fn with_search(&self, search: Option<&str>) -> Self {
    Self {
      search: search.map(String::from),
      ..self.clone()
    }
  }

  pub fn with_sort(&self, sort_by: Option<&str>, sort_order: SortOrder) -> Self {
    Self {
      sort_by: sort_by.map(String::from),
      sort_order,
      ..self.clone()
    }
  }

  /// Apply the normalization rule: clamp paging to at least 1 and collapse
  /// blank text filters to `None`.
  pub fn normalized(&self) -> Self {
    Self {
      page: self.page.max(1),
      page_size: self.page_size.max(1),
      fund_type: normalize_text(self.fund_type.as_deref()),
      search: normalize_text(self.search.as_deref()),
      sort_by: normalize_text(self.sort_by.as_deref()),
      sort_order: self.sort_order,
    }
  }

  /// JSON object with sorted keys and `null` for absent fields.
  ///
  /// Built from the normalized snapshot, so semantically equal queries
  /// always produce identical text.
  pub fn canonical_json(&self) -> String {
    let p = self.normalized();
    let fields: BTreeMap<&str, Value> = BTreeMap::from([
      ("page", Value::from(p.page)),
      ("page_size", Value::from(p.page_size)),
      ("search", Value::from(p.search)),
      ("sort_by", Value::from(p.sort_by)),
      ("sort_order", Value::from(p.sort_order.as_str())),
      ("type", Value::from(p.fund_type)),
    ]);
    // A BTreeMap serializes in key order regardless of serde_json features
    serde_json::to_string(&fields).unwrap_or_default()
  }

  /// Translate to the remote offset/limit contract.
  pub fn to_list_request(&self) -> ListRequest {
    let p = self.normalized();
    ListRequest {
      skip: u64::from(p.page - 1) * u64::from(p.page_size),
      limit: p.page_size,
      fund_type: p.fund_type,
      search: p.search,
      sort_by: p.sort_by,
      sort_order: p.sort_order,
    }
  }
}
