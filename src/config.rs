use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sync::SyncPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub list: ListConfig,
  #[serde(default)]
  pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the fund service, e.g. "http://localhost:8000"
  pub url: String,
  /// Transport timeout for every request
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Number of NAV points requested with a fund detail
  #[serde(default = "default_nav_limit")]
  pub nav_limit: u32,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: "http://localhost:8000".to_string(),
      timeout_secs: default_timeout_secs(),
      nav_limit: default_nav_limit(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Cache database location (defaults to the user data directory)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
  #[serde(default = "default_page_size")]
  pub page_size: u32,
}

impl Default for ListConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
  /// Lookback window used when `sync` is run without `--days`
  #[serde(default = "default_sync_days")]
  pub default_days: u32,
  /// Drop cached list and detail entries after a successful sync
  #[serde(default)]
  pub invalidate_cache: bool,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      default_days: default_sync_days(),
      invalidate_cache: false,
    }
  }
}

fn default_timeout_secs() -> u64 {
  5
}

fn default_nav_limit() -> u32 {
  180
}

fn default_true() -> bool {
  true
}

fn default_page_size() -> u32 {
  20
}

fn default_sync_days() -> u32 {
  30
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./fundview.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/fundview/config.yaml
  ///
  /// Without any file the defaults are used (a service on localhost).
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("fundview.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("fundview").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;

    if config.list.page_size == 0 {
      return Err(eyre!("list.page_size must be at least 1"));
    }

    Ok(config)
  }

  pub fn sync_policy(&self) -> SyncPolicy {
    if self.sync.invalidate_cache {
      SyncPolicy::InvalidateCache
    } else {
      SyncPolicy::KeepCache
    }
  }

  /// Get the API bearer token from the environment, if set.
  ///
  /// Checks FUNDVIEW_API_TOKEN. The service may also run without auth.
  pub fn get_api_token() -> Option<String> {
    std::env::var("FUNDVIEW_API_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }
}
