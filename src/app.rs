use color_eyre::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, MemoryStorage, NoopStorage, SqliteStorage};
use crate::config::Config;
use crate::funds::{FetchCoordinator, FetchError, FundListItem, FundsClient, ListResult};
use crate::funds::{SyncError, SyncOutcome};
use crate::params::QueryParams;
use crate::query::Query;
use crate::sync::SyncCoordinator;
use crate::view::ListViewState;

/// Main application state for one session.
///
/// Owns the single cache store (through the coordinators), the in-flight
/// list and sync requests, and the current view snapshot. UI events come in
/// as `on_*` calls; async completions are applied by [`App::poll`] or
/// [`App::settle`].
pub struct App {
  fetch: FetchCoordinator,
  sync: SyncCoordinator,
  list_query: Query<ListResult<FundListItem>, FetchError>,
  sync_query: Query<SyncOutcome, SyncError>,
  state: ListViewState,
}

impl App {
  pub fn new(fetch: FetchCoordinator, sync: SyncCoordinator, params: QueryParams) -> Self {
    Self {
      fetch,
      sync,
      list_query: Query::new(),
      sync_query: Query::new(),
      state: ListViewState::new(params),
    }
  }

  /// Wire up the HTTP client, cache storage and coordinators from config.
  pub fn from_config(config: &Config) -> Result<Self> {
    let client = FundsClient::new(config)?;
    let store = open_store(config);
    let fetch = FetchCoordinator::new(Arc::new(client), store);

    let sync = SyncCoordinator::new(fetch.clone(), config.sync_policy());
    info!(
      api = %config.api.url,
      cache = config.cache.enabled,
      policy = ?sync.policy(),
      "session started"
    );

    let params = QueryParams::new(1, config.list.page_size);
    Ok(Self::new(fetch, sync, params))
  }

  // Accessors for rendering
  #[allow(dead_code)]
  pub fn state(&self) -> &ListViewState {
    &self.state
  }

  pub fn fetch(&self) -> &FetchCoordinator {
    &self.fetch
  }

  /// Superseded list responses dropped so far.
  #[allow(dead_code)]
  pub fn discarded_responses(&self) -> usize {
    self.list_query.discarded()
  }

  /// The query changed: answer from cache or issue a request.
  pub fn on_params_changed(&mut self, params: QueryParams) -> &ListViewState {
    if let Some(page) = self.fetch.cached_list(&params) {
      let request = self.list_query.resolve_now();
      debug!(%request, "list served from cache");
      self.state = self.state.on_cache_hit(params, page);
      return &self.state;
    }

    let fetch = self.fetch.clone();
    let query = params.clone();
    let request = self
      .list_query
      .restart(async move { fetch.fetch_list(&query).await });
    debug!(%request, page = params.page, "list request issued");

    self.state = self.state.on_params_changed(params);
    &self.state
  }

  /// Re-run the current query.
  pub fn refresh(&mut self) -> &ListViewState {
    let params = self.state.params.clone();
    self.on_params_changed(params)
  }

  /// Start a synchronize run. Returns false if one is already running.
  pub fn synchronize(&mut self, days: u32) -> bool {
    let sync = self.sync.clone();
    let started = self
      .sync_query
      .start(async move { sync.synchronize(days).await });

    match started {
      Some(request) => {
        info!(%request, days, "synchronize started");
        self.state = self.state.on_sync_started(days);
        true
      }
      None => {
        warn!(days, "synchronize already running, ignoring");
        false
      }
    }
  }

  fn on_list_settled(&mut self, result: Result<ListResult<FundListItem>, FetchError>) {
    self.state = match result {
      Ok(page) => self.state.on_list_loaded(page),
      Err(e) => {
        warn!(error = %e, "failed to load funds");
        self.state.on_list_failed(&e)
      }
    };
  }

  /// Apply a finished sync. Success triggers exactly one list refresh with
  /// the current params; failure triggers none.
  fn on_sync_completed(&mut self, result: Result<SyncOutcome, SyncError>) {
    match result {
      Ok(outcome) => {
        self.state = self.state.on_sync_completed(outcome);
        self.refresh();
      }
      Err(e) => {
        self.state = self.state.on_sync_failed(&e);
      }
    }
  }

  /// Apply whatever has arrived without blocking. Returns true if the view changed.
  #[allow(dead_code)]
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    if let Some(result) = self.sync_query.poll() {
      self.on_sync_completed(result);
      changed = true;
    }

    if let Some(result) = self.list_query.poll() {
      self.on_list_settled(result);
      changed = true;
    }

    changed
  }

  /// Wait until no list or sync request is outstanding.
  pub async fn settle(&mut self) -> &ListViewState {
    loop {
      if self.sync_query.is_loading() {
        if let Some(result) = self.sync_query.settled().await {
          self.on_sync_completed(result);
        }
        continue;
      }

      if self.list_query.is_loading() {
        if let Some(result) = self.list_query.settled().await {
          self.on_list_settled(result);
        }
        continue;
      }

      return &self.state;
    }
  }
}

fn open_store(config: &Config) -> CacheStore {
  if !config.cache.enabled {
    return CacheStore::new(NoopStorage);
  }

  let storage = match &config.cache.path {
    Some(path) => SqliteStorage::open_at(path),
    None => SqliteStorage::open(),
  };

  match storage {
    Ok(storage) => CacheStore::new(storage),
    Err(e) => {
      // Fall back to an in-process cache for this session
      warn!(error = %e, "failed to open cache database, using in-memory cache");
      CacheStore::new(MemoryStorage::new())
    }
  }
}
