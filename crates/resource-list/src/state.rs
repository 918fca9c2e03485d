//! # List State Machine
//!
//! Owns the canonical `{rows, page, total_count, search_text, status}` of one
//! screen and is the only place it changes.
//!
//! ```text
//!   Idle ──request_fetch──▶ Loading ──apply(Ok)──▶ Loaded
//!                             ▲   └────apply(Err)─▶ Failed
//!                             └──── request_fetch ◀──┘ (from Loaded or Failed)
//! ```
//!
//! Every [`request_fetch`](ListStateMachine::request_fetch) bumps a version
//! counter and returns a [`FetchTicket`]. Only the result carrying the latest
//! version is applied; anything older is a stale result and is dropped. This is
//! the whole cancellation story: in-flight requests are never aborted, their
//! answers are just ignored.

use crate::error::TransportError;
use crate::query::ResourceQuery;
use tracing::{debug, warn};

/// One page of rows produced by exactly one query execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePage<T> {
    pub rows: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> ResourcePage<T> {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }

    /// 1-based index of the first row on this page, 0 when there are no rows.
    pub fn start_index(&self) -> u64 {
        if self.total_count == 0 {
            return 0;
        }
        u64::from(self.page - 1) * u64::from(self.page_size) + 1
    }

    /// 1-based index of the last row on this page, 0 when there are no rows.
    pub fn end_index(&self) -> u64 {
        (u64::from(self.page) * u64::from(self.page_size)).min(self.total_count)
    }
}

/// `ceil(total_count / page_size)`.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Status of the list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    Idle,
    Loading { previous_rows: Vec<T> },
    Loaded(ResourcePage<T>),
    Failed { error: TransportError, previous_rows: Vec<T> },
}

impl<T> ListState<T> {
    /// Rows to display: the current page, or the last good rows while loading or failed.
    pub fn rows(&self) -> &[T] {
        match self {
            ListState::Idle => &[],
            ListState::Loading { previous_rows } | ListState::Failed { previous_rows, .. } => {
                previous_rows
            }
            ListState::Loaded(page) => &page.rows,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ListState::Loading { .. })
    }

    pub fn error(&self) -> Option<&TransportError> {
        match self {
            ListState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    fn take_rows(&mut self) -> Vec<T> {
        match std::mem::replace(self, ListState::Idle) {
            ListState::Idle => Vec::new(),
            ListState::Loading { previous_rows } | ListState::Failed { previous_rows, .. } => {
                previous_rows
            }
            ListState::Loaded(page) => page.rows,
        }
    }
}

/// Permission to apply one fetch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub version: u64,
    pub query: ResourceQuery,
}

/// What [`ListStateMachine::apply`] did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Loaded,
    Failed,
    /// A newer request was issued after this one; the result was dropped.
    Stale,
    /// The page no longer exists; fetch the last valid page instead.
    Refetch(FetchTicket),
}

/// Snapshot handed to the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    pub rows: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub start_index: u64,
    pub end_index: u64,
    pub total_count: u64,
    pub search_text: String,
    pub is_loading: bool,
    pub error: Option<TransportError>,
}

/// Transition function over [`ListState`].
#[derive(Debug)]
pub struct ListStateMachine<T> {
    state: ListState<T>,
    /// Requested page; `refresh` retries it.
    page: u32,
    /// Page the displayed rows belong to.
    shown_page: u32,
    page_size: u32,
    search_text: String,
    total_count: u64,
    /// Search text `total_count` was counted for.
    counted_search: Option<String>,
    latest_version: u64,
}

impl<T: Clone> ListStateMachine<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            state: ListState::Idle,
            page: 1,
            shown_page: 1,
            page_size: page_size.max(1),
            search_text: String::new(),
            total_count: 0,
            counted_search: None,
            latest_version: 0,
        }
    }

    pub fn state(&self) -> &ListState<T> {
        &self.state
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Version of the most recent request, 0 before the first one.
    pub fn latest_version(&self) -> u64 {
        self.latest_version
    }

    /// Starts a fetch for `page` with `search_text`, superseding any fetch in flight.
    ///
    /// The page is validated against the last known total: 0 becomes 1 and a
    /// page past the end becomes the last page.
    pub fn request_fetch(&mut self, page: u32, search_text: impl Into<String>) -> FetchTicket {
        let search_text = search_text.into();
        let page = self.clamp_page(page, &search_text);
        self.latest_version += 1;
        self.page = page;
        self.search_text = search_text;
        let previous_rows = self.state.take_rows();
        self.state = ListState::Loading { previous_rows };
        debug!(
            version = self.latest_version,
            page,
            search = %self.search_text,
            "Fetch requested"
        );
        FetchTicket {
            version: self.latest_version,
            query: ResourceQuery::new(page, self.page_size).with_search(self.search_text.clone()),
        }
    }

    /// Re-issues the current page and search text.
    pub fn refresh(&mut self) -> FetchTicket {
        let search_text = self.search_text.clone();
        self.request_fetch(self.page, search_text)
    }

    fn clamp_page(&self, page: u32, search_text: &str) -> u32 {
        let page = page.max(1);
        if self.counted_search.as_deref() != Some(search_text) {
            return page;
        }
        page.min(total_pages(self.total_count, self.page_size).max(1))
    }

    /// Applies the result of the fetch identified by `version`.
    pub fn apply(
        &mut self,
        version: u64,
        result: Result<ResourcePage<T>, TransportError>,
    ) -> Outcome {
        if version != self.latest_version {
            debug!(version, latest = self.latest_version, "Stale result dropped");
            return Outcome::Stale;
        }
        match result {
            Ok(page) => {
                self.total_count = page.total_count;
                self.counted_search = Some(self.search_text.clone());
                let last_page = page.total_pages().max(1);
                if page.page > last_page {
                    debug!(
                        requested = page.page,
                        last_page, "Page past the end, fetching last page"
                    );
                    let search_text = self.search_text.clone();
                    return Outcome::Refetch(self.request_fetch(last_page, search_text));
                }
                self.page = page.page;
                self.shown_page = page.page;
                self.state = ListState::Loaded(page);
                Outcome::Loaded
            }
            Err(error) => {
                warn!(version, error = %error, "Fetch failed");
                let previous_rows = self.state.take_rows();
                self.state = ListState::Failed {
                    error,
                    previous_rows,
                };
                Outcome::Failed
            }
        }
    }

    /// Derived values for rendering.
    ///
    /// A failed fetch keeps the previous rows, so page and indexes stay those
    /// of the previous rows too.
    pub fn view(&self) -> ListView<T> {
        let page = match self.state {
            ListState::Failed { .. } => self.shown_page,
            _ => self.page,
        };
        let meta = ResourcePage::<T> {
            rows: Vec::new(),
            total_count: self.total_count,
            page,
            page_size: self.page_size,
        };
        ListView {
            rows: self.state.rows().to_vec(),
            page,
            page_size: self.page_size,
            total_pages: meta.total_pages(),
            start_index: meta.start_index(),
            end_index: meta.end_index(),
            total_count: self.total_count,
            search_text: self.search_text.clone(),
            is_loading: self.state.is_loading(),
            error: self.state.error().cloned(),
        }
    }
}
