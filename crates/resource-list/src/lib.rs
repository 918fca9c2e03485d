//! # Resource List
//!
//! This crate provides a generic, paginated, searchable and soft-delete-aware
//! list controller for admin screens backed by a PostgREST-style API. One
//! controller reconciles three inputs into one consistent list:
//!
//! - the page the user is on,
//! - the text typed into the search box,
//! - the mutations the user performs (create, update, soft delete).
//!
//! ## Architecture Overview
//!
//! ```text
//!  ListHandle ──ListCommand──▶ ResourceListController ──spawn──▶ fetch_page ──▶ Transport
//!      ▲                         │  SearchGate                          │
//!      │                         │  ListStateMachine ◀──FetchCompleted──┘
//!      └──────ListView (watch)───┘
//!  MutationCoordinator ──WriteRequest──▶ Transport
//!           └──────────ListCommand::Refresh──────────▶ controller
//! ```
//!
//! 1. **Entity Layer** ([`ListEntity`], [`ResourceConfig`]) - endpoint, searchable fields, ordering
//! 2. **Query Layer** ([`QueryBuilder`]) - pure translation of a [`ResourceQuery`] into requests
//! 3. **Transport Layer** ([`Transport`]) - REST, in-memory and mock implementations
//! 4. **Runtime Layer** ([`ResourceListController`]) - debounce, versioning, page clamping
//! 5. **Interface Layer** ([`ListHandle`], [`MutationCoordinator`]) - what a screen talks to
//!
//! ## Guarantees
//!
//! - Soft-deleted rows never appear: every data and count request filters on
//!   `deleted_at=is.null`.
//! - A burst of keystrokes inside the debounce window produces one fetch for
//!   the last text. Clearing the box fetches at once.
//! - A response is shown only if it answers the most recent request.
//! - A page that stopped existing (e.g. after deleting the last row on it) is
//!   replaced by the last page that does.
//! - Every successful mutation re-fetches the current page and search text.
//!
//! ## Concurrency Model
//!
//! - Each controller runs in its own Tokio task and processes commands sequentially
//! - Fetches run in spawned tasks; the controller keeps accepting commands meanwhile
//! - The UI reads immutable [`ListView`] snapshots from a `watch` channel
//!
//! ## Testing
//!
//! The [`mock`] module provides a channel-backed transport so tests decide when
//! each request is answered. Combined with `#[tokio::test(start_paused = true)]`
//! this makes debounce timing and out-of-order responses deterministic.

pub mod controller;
pub mod count;
pub mod debounce;
pub mod entity;
pub mod error;
pub mod memory;
pub mod message;
pub mod mock;
pub mod mutation;
pub mod query;
pub mod rest;
pub mod state;
pub mod tracing;
pub mod transport;

// Re-export core types for convenience
pub use controller::{ListHandle, ListSettings, ResourceListController};
pub use debounce::{GateDecision, SearchGate};
pub use entity::{ListEntity, RecordMeta, ResourceConfig};
pub use error::{ControllerError, QueryError, TransportError};
pub use memory::InMemoryTransport;
pub use message::ListCommand;
pub use mutation::{MutationCoordinator, PendingMutation};
pub use query::{OrderClause, OrderDirection, QueryBuilder, QueryPlan, ResourceQuery};
pub use rest::{RestConfig, RestTransport};
pub use state::{ListState, ListStateMachine, ListView, ResourcePage};
pub use transport::{AuthProvider, MissingTokenPolicy, NoAuth, StaticToken, Transport};
