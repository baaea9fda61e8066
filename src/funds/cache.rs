//! Cache keys and TTLs for fund API calls.

use std::time::Duration;

use crate::params::QueryParams;

/// Prefix shared by every key this client writes.
pub const NAMESPACE: &str = "fundview";

/// How long a list page stays fresh.
pub const LIST_TTL: Duration = Duration::from_secs(30);

/// How long fund details stay fresh. Longer than lists: detail data changes
/// less often from the viewer's side.
pub const DETAIL_TTL: Duration = Duration::from_secs(60);

/// Query key types for fund API calls.
#[derive(Clone, Debug)]
pub enum FundsQueryKey<'a> {
  /// One page of the fund list
  List(&'a QueryParams),
  /// A single fund by code
  Detail { code: &'a str },
}

impl FundsQueryKey<'_> {
  pub fn operation(&self) -> &'static str {
    match self {
      Self::List(_) => "list",
      Self::Detail { .. } => "detail",
    }
  }

  /// `<namespace>:<operation>:<canonical-params-json>`
  pub fn cache_key(&self) -> String {
    let params = match self {
      Self::List(params) => params.canonical_json(),
      Self::Detail { code } => serde_json::json!({ "code": code }).to_string(),
    };
    format!("{}:{}:{}", NAMESPACE, self.operation(), params)
  }

  /// Key prefix covering every entry of this operation.
  pub fn prefix(operation: &str) -> String {
    format!("{}:{}:", NAMESPACE, operation)
  }
}

/// Cache key for a list page.
pub fn query_key(params: &QueryParams) -> String {
  FundsQueryKey::List(params).cache_key()
}

/// Cache key for a fund's details.
pub fn detail_key(code: &str) -> String {
  FundsQueryKey::Detail { code }.cache_key()
}
