//! # Municipal Health Admin
//!
//! Back-office for the municipal health records: job roles, chronic diseases,
//! vehicle types, care teams, coverage areas and registered citizens. Every
//! table is browsed through the same paginated, searchable list built on the
//! [`resource_list`] crate.
//!
//! ## Core Components
//!
//! - **[model]**: The six records and their forms, each implementing [`ListEntity`](resource_list::ListEntity).
//! - **[validation]**: Checks forms before anything is sent to the backend.
//! - **[clients]**: [`ResourceScreen`](clients::ResourceScreen), the API one admin screen talks to.
//! - **[lifecycle]**: [`AdminSystem`](lifecycle::AdminSystem) starts and stops every screen.
//! - **[config]** and **[auth]**: backend settings and the signed-in session.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! setup_tracing();
//! let transport = Arc::new(InMemoryTransport::new());
//! seed_sample_data(&transport).await;
//! let system = AdminSystem::new(transport, ListSettings::default());
//!
//! system.cargos.search("enf").await?;
//! let view = system.cargos.list().wait_for(|v| v.search_text == "enf" && !v.is_loading).await?;
//! system.shutdown().await?;
//! ```
//!
//! ## Testing
//!
//! Screens accept any [`Transport`](resource_list::Transport). Tests use the
//! in-memory one, or [`resource_list::mock`] to control every response.

pub mod auth;
pub mod clients;
pub mod config;
pub mod lifecycle;
pub mod model;
pub mod validation;
