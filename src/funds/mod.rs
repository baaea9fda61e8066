pub mod api_types;
pub mod cache;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::FundsClient;
pub use coordinator::FetchCoordinator;
pub use error::{FetchError, SyncError};
pub use types::{FundDetail, FundListItem, ListResult, SyncOutcome};
