//! Screen-facing wrappers around [`ListHandle`](resource_list::ListHandle) and
//! [`MutationCoordinator`](resource_list::MutationCoordinator).

pub mod list_client;
pub mod screen;

pub use list_client::*;
pub use screen::*;
