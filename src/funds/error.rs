//! Error types for remote fund API calls.

use std::sync::Arc;

/// Failure of a list or detail retrieval.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
  /// Transport-level failure (connection refused, DNS, TLS...).
  #[error("network error: {0}")]
  Network(Arc<reqwest::Error>),

  /// The configured transport timeout elapsed.
  #[error("request timeout")]
  Timeout,

  /// The requested fund does not exist.
  #[error("fund not found: {code}")]
  NotFound { code: String },

  /// Non-success HTTP status.
  #[error("HTTP error: {status}")]
  Status { status: u16 },

  /// The response body did not match the expected shape.
  #[error("malformed response: {0}")]
  Malformed(String),
}

impl From<reqwest::Error> for FetchError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      FetchError::Timeout
    } else if err.is_decode() {
      FetchError::Malformed(err.to_string())
    } else {
      FetchError::Network(Arc::new(err))
    }
  }
}

/// Failure of a synchronize call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
  /// Lookback window outside the range the remote accepts.
  #[error("invalid lookback window: {0} days (expected 1-3650)")]
  InvalidWindow(u32),

  #[error("network error: {0}")]
  Network(Arc<reqwest::Error>),

  #[error("request timeout")]
  Timeout,

  #[error("HTTP error: {status}")]
  Status { status: u16 },

  #[error("malformed response: {0}")]
  Malformed(String),
}

impl From<reqwest::Error> for SyncError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      SyncError::Timeout
    } else if err.is_decode() {
      SyncError::Malformed(err.to_string())
    } else {
      SyncError::Network(Arc::new(err))
    }
  }
}
