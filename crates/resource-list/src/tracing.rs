//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the `tracing` subscriber used by binaries and, when
//! wanted, by tests.
//!
//! ## What Gets Traced
//!
//! - **Controller lifecycle**: `Controller started` / `Controller shutdown` with `entity_type`
//! - **Commands**: every `ListCommand` at `debug`, with the command as a structured field
//! - **Fetches**: `Fetch requested` (version, page, search), `Page fetched`, `Page loaded`
//! - **Stale results**: `Stale result dropped` at `debug`
//! - **Failures**: transport and mutation failures at `warn`
//! - **Mutations**: one span per mutation carrying the endpoint and the mutation
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle and mutations only
//! RUST_LOG=info cargo run
//!
//! # Every command, request and version
//! RUST_LOG=debug cargo run
//!
//! # Only the list core
//! RUST_LOG=resource_list=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug`, a search typed in the Cargo screen reads:
//!
//! ```text
//! DEBUG Command entity_type="Cargo" command=ChangeSearchText("enf")
//! DEBUG Search timer fired entity_type="Cargo" search=enf
//! DEBUG Fetch requested version=2 page=1 search=enf
//! DEBUG Page fetched endpoint=cargos rows=3 total_count=3
//! DEBUG Page loaded entity_type="Cargo" version=2 page=1 total_count=3
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Calling it again once a subscriber is installed does nothing.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type and endpoint say where an event comes from
        .compact()
        .try_init();
}
