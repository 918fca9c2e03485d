//! # System Lifecycle
//!
//! Starts one list controller per admin screen, wires them to a shared
//! [`Transport`](resource_list::Transport) and shuts them down together.
//!
//! ## Startup
//!
//! ```rust,ignore
//! let config = AppConfig::load(Some(Path::new("health-admin.toml")))?;
//! let session = Arc::new(SessionStore::new());
//! let system = AdminSystem::from_config(&config, session.clone())?;
//!
//! system.municipes.search("maria").await?;
//! ```
//!
//! Each screen mounts immediately: its first page is requested before
//! [`AdminSystem::new`] returns.
//!
//! ## Graceful Shutdown
//!
//! 1. **Drop all screens** - closes the command channel of every controller
//! 2. **Controllers detect closure** - `receiver.recv()` returns `None`
//! 3. **Await completion** - every controller task is joined
//!
//! Fetches still in flight finish on their own; their results are discarded.
//!
//! ## Offline Mode
//!
//! [`seed_sample_data`] fills an [`InMemoryTransport`](resource_list::InMemoryTransport)
//! with a small municipality so the screens can be exercised without a backend.

pub mod admin_system;
pub mod seed;

pub use admin_system::*;
pub use resource_list::tracing::setup_tracing;
pub use seed::*;
