use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::funds::api_types::{ApiFundDetailResponse, ApiFundListResponse, ApiSyncResponse};
use crate::funds::error::{FetchError, SyncError};
use crate::funds::types::{FundDetail, FundListItem, ListResult, SyncOutcome};
use crate::params::ListRequest;

/// Remote fund service contract.
///
/// Implemented over HTTP by [`FundsClient`]; tests substitute scripted fakes.
#[async_trait]
pub trait FundsApi: Send + Sync {
  /// One page of funds.
  async fn list_funds(
    &self,
    request: &ListRequest,
  ) -> Result<ListResult<FundListItem>, FetchError>;

  /// Fund details and NAV history.
  async fn fund_detail(&self, code: &str) -> Result<FundDetail, FetchError>;

  /// Re-ingest the trailing `days` of remote data.
  async fn synchronize(&self, days: u32) -> Result<SyncOutcome, SyncError>;
}

/// Fund API client wrapper
#[derive(Clone)]
pub struct FundsClient {
  http: reqwest::Client,
  base_url: Url,
  token: Option<String>,
  nav_limit: u32,
}

impl FundsClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = Url::parse(&config.api.url)
      .map_err(|e| eyre!("Invalid API url {}: {}", config.api.url, e))?;
    if base_url.cannot_be_a_base() {
      return Err(eyre!("Invalid API url {}: not a base URL", config.api.url));
    }

    // One timeout for every call; a timeout surfaces as an ordinary error
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      token: Config::get_api_token(),
      nav_limit: config.api.nav_limit,
    })
  }

  /// Build `{base}/seg/seg/...`, percent-encoding each segment.
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }
}

#[async_trait]
impl FundsApi for FundsClient {
  async fn list_funds(
    &self,
    request: &ListRequest,
  ) -> Result<ListResult<FundListItem>, FetchError> {
    let url = self.endpoint(&["api", "funds", ""]);
    debug!(%url, skip = request.skip, limit = request.limit, "listing funds");

    let response = self
      .authorize(self.http.get(url).query(request))
      .send()
      .await?;
    let response = check_fetch_status(response, None)?;

    let body: ApiFundListResponse = response.json().await?;
    Ok(body.into())
  }

  async fn fund_detail(&self, code: &str) -> Result<FundDetail, FetchError> {
    let url = self.endpoint(&["api", "funds", code]);
    debug!(%url, "getting fund detail");

    let response = self
      .authorize(self.http.get(url).query(&[("limit", self.nav_limit)]))
      .send()
      .await?;
    let response = check_fetch_status(response, Some(code))?;

    let body: ApiFundDetailResponse = response.json().await?;
    Ok(body.into_detail())
  }

  async fn synchronize(&self, days: u32) -> Result<SyncOutcome, SyncError> {
    let url = self.endpoint(&["api", "funds", "sync"]);
    debug!(%url, days, "requesting synchronize");

    let response = self
      .authorize(self.http.post(url).query(&[("days", days)]))
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      return Err(SyncError::Status {
        status: status.as_u16(),
      });
    }

    let body: ApiSyncResponse = response.json().await?;
    body.into_outcome().map_err(SyncError::Malformed)
  }
}

fn check_fetch_status(response: Response, code: Option<&str>) -> Result<Response, FetchError> {
  let status = response.status();
  match (status, code) {
    (s, _) if s.is_success() => Ok(response),
    (StatusCode::NOT_FOUND, Some(code)) => Err(FetchError::NotFound {
      code: code.to_string(),
    }),
    (s, _) => Err(FetchError::Status { status: s.as_u16() }),
  }
}
