//! Async request tracking with latest-wins resolution.
//!
//! A `Query<T, E>` spawns fetches onto the runtime and hands their results
//! back through a channel. Every fetch is tagged with a [`RequestId`]; only
//! the result of the most recently issued request is ever returned to the
//! caller, so a slow response to an old request can never overwrite a newer
//! one. Nothing is cancelled: superseded fetches run to completion and their
//! results are dropped when they arrive.
//!
//! # Example
//!
//! ```ignore
//! let mut query = Query::new();
//!
//! // Start fetching
//! query.restart(async move { fetch.fetch_list(&params).await });
//!
//! // In event loop tick
//! if let Some(result) = query.poll() {
//!     // Latest result arrived, apply it to view state
//! }
//! ```

use std::fmt;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::debug;

/// Identifies one issued request. Later requests compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Async query with latest-wins result delivery.
pub struct Query<T, E> {
  next_id: u64,
  latest: Option<RequestId>,
  loading: bool,
  discarded: usize,
  sender: mpsc::UnboundedSender<(RequestId, Result<T, E>)>,
  receiver: mpsc::UnboundedReceiver<(RequestId, Result<T, E>)>,
}

impl<T: Send + 'static, E: Send + 'static> Query<T, E> {
  pub fn new() -> Self {
    let (sender, receiver) = mpsc::unbounded_channel();
    Self {
      next_id: 0,
      latest: None,
      loading: false,
      discarded: 0,
      sender,
      receiver,
    }
  }

  /// Whether the latest request is still outstanding.
  pub fn is_loading(&self) -> bool {
    self.loading
  }

  /// How many superseded results have been dropped so far.
  pub fn discarded(&self) -> usize {
    self.discarded
  }

  fn next_request(&mut self) -> RequestId {
    self.next_id += 1;
    let id = RequestId(self.next_id);
    self.latest = Some(id);
    id
  }

  /// Start fetching if not already loading.
  ///
  /// This is a no-op if the query is already loading.
  pub fn start<Fut>(&mut self, future: Fut) -> Option<RequestId>
  where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    if self.loading {
      return None;
    }
    Some(self.restart(future))
  }

  /// Issue a new request, superseding any request still in flight.
  pub fn restart<Fut>(&mut self, future: Fut) -> RequestId
  where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let id = self.next_request();
    self.loading = true;

    let sender = self.sender.clone();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - the query may have been dropped
      let _ = sender.send((id, result));
    });

    id
  }

  /// Record a request that was answered synchronously (e.g. from cache).
  ///
  /// Supersedes anything in flight without a loading transition.
  pub fn resolve_now(&mut self) -> RequestId {
    let id = self.next_request();
    self.loading = false;
    id
  }

  /// Accept `result` only if it belongs to the latest request.
  fn accept(&mut self, id: RequestId, result: Result<T, E>) -> Option<Result<T, E>> {
    if Some(id) == self.latest && self.loading {
      self.loading = false;
      Some(result)
    } else {
      debug!(request = %id, latest = ?self.latest, "discarding superseded response");
      self.discarded += 1;
      None
    }
  }

  /// Drain arrived results without blocking.
  ///
  /// Returns the latest request's result once it has arrived. Call this in
  /// your event loop tick handler.
  pub fn poll(&mut self) -> Option<Result<T, E>> {
    let mut applied = None;
    while let Ok((id, result)) = self.receiver.try_recv() {
      if let Some(result) = self.accept(id, result) {
        applied = Some(result);
      }
    }
    applied
  }

  /// Wait for the latest request to settle.
  ///
  /// Returns `None` immediately when nothing is loading.
  pub async fn settled(&mut self) -> Option<Result<T, E>> {
    while self.loading {
      // The query holds a sender, so the channel never closes under us
      let (id, result) = self.receiver.recv().await?;
      if let Some(result) = self.accept(id, result) {
        return Some(result);
      }
    }
    None
  }
}

impl<T: Send + 'static, E: Send + 'static> Default for Query<T, E> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T, E> fmt::Debug for Query<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Query")
      .field("latest", &self.latest)
      .field("loading", &self.loading)
      .field("discarded", &self.discarded)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;
  use tokio::sync::oneshot;

  async fn gated(gate: oneshot::Receiver<()>, value: u32) -> Result<u32, String> {
    let _ = gate.await;
    Ok(value)
  }

  /// Poll until `n` stale results have been dropped.
  async fn wait_for_discards(
    query: &mut Query<u32, String>,
    n: usize,
  ) -> Option<Result<u32, String>> {
    tokio::time::timeout(Duration::from_secs(1), async {
      loop {
        let applied = query.poll();
        if applied.is_some() || query.discarded() >= n {
          return applied;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
      }
    })
    .await
    .unwrap()
  }

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new();
    assert!(!query.is_loading());

    query.restart(async { Ok::<_, String>(vec![1, 2, 3]) });
    assert!(query.is_loading());

    assert_eq!(query.settled().await, Some(Ok(vec![1, 2, 3])));
    assert!(!query.is_loading());
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32, String> = Query::new();

    query.restart(async { Err("Something went wrong".to_string()) });

    assert_eq!(
      query.settled().await,
      Some(Err("Something went wrong".to_string()))
    );
    assert!(!query.is_loading());
  }

  #[tokio::test]
  async fn test_start_while_loading_is_noop() {
    let mut query: Query<u32, String> = Query::new();
    let (_tx, rx) = oneshot::channel();

    assert!(query.start(gated(rx, 1)).is_some());
    assert!(query.start(async { Ok(2) }).is_none());
    assert!(query.is_loading());
  }

  #[tokio::test]
  async fn test_older_response_arriving_last_is_discarded() {
    let mut query = Query::new();
    let (tx1, rx1) = oneshot::channel();
    let (tx2, rx2) = oneshot::channel();

    let r1 = query.restart(gated(rx1, 1));
    let r2 = query.restart(gated(rx2, 2));
    assert!(r2 > r1);

    tx2.send(()).unwrap();
    assert_eq!(query.settled().await, Some(Ok(2)));

    tx1.send(()).unwrap();
    assert_eq!(wait_for_discards(&mut query, 1).await, None);
    assert_eq!(query.discarded(), 1);
    assert!(!query.is_loading());
  }

  #[tokio::test]
  async fn test_older_response_arriving_first_is_discarded() {
    let mut query = Query::new();
    let (tx1, rx1) = oneshot::channel();
    let (tx2, rx2) = oneshot::channel();

    query.restart(gated(rx1, 1));
    query.restart(gated(rx2, 2));

    tx1.send(()).unwrap();
    assert_eq!(wait_for_discards(&mut query, 1).await, None);
    assert!(query.is_loading());

    tx2.send(()).unwrap();
    assert_eq!(query.settled().await, Some(Ok(2)));
  }

  #[tokio::test]
  async fn test_resolve_now_supersedes_in_flight() {
    let mut query = Query::new();
    let (tx, rx) = oneshot::channel();

    query.restart(gated(rx, 1));
    query.resolve_now();
    assert!(!query.is_loading());

    tx.send(()).unwrap();
    assert_eq!(wait_for_discards(&mut query, 1).await, None);
    assert_eq!(query.settled().await, None);
  }
}
