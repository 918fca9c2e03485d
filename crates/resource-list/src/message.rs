//! # List Messages
//!
//! Message types exchanged between a [`ListHandle`](crate::controller::ListHandle)
//! and its [`ResourceListController`](crate::controller::ResourceListController).
//!
//! Commands carry no response channel. Their effect is observed through the
//! published [`ListView`](crate::state::ListView), so a screen never blocks on a
//! fetch it just triggered.

use crate::error::TransportError;
use crate::state::ResourcePage;

/// User intent sent to the controller.
///
/// | Command | Effect |
/// |---|---|
/// | `ChangeSearchText` | Goes through the search gate; empty text fetches page 1 at once |
/// | `ChangePage` | Fetches that page (clamped) with the current search text |
/// | `Refresh` | Re-fetches the current page and search text; sent after every successful mutation |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    ChangeSearchText(String),
    ChangePage(u32),
    Refresh,
}

/// Result of one spawned fetch, routed back into the controller loop.
#[derive(Debug)]
pub(crate) struct FetchCompleted<T> {
    pub version: u64,
    pub result: Result<ResourcePage<T>, TransportError>,
}
