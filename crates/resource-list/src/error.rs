//! # List Errors
//!
//! This module defines the error types shared by the query builder, the transport
//! adapters, the list controller and the mutation coordinator. Keeping them in one
//! place means a failure travels from the wire to the UI without being re-wrapped.

/// Errors raised while turning a [`ResourceQuery`](crate::query::ResourceQuery) into requests.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid page: {0} (pages start at 1)")]
    InvalidPage(u32),
    #[error("Invalid page size: {0} (must be at least 1)")]
    InvalidPageSize(u32),
}

/// Errors produced by a [`Transport`](crate::transport::Transport).
///
/// The type is `Clone` because a failed fetch is kept inside
/// [`ListState::Failed`](crate::state::ListState::Failed) and republished with every view.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// The request could not be sent or the response could not be received.
    #[error("Network error: {0}")]
    Network(String),
    /// The backend answered but the body did not have the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(String),
    /// No access token was available and the transport is configured to reject anonymous requests.
    #[error("No access token available")]
    MissingToken,
    /// The request description could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// HTTP status of the failure, if the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<QueryError> for TransportError {
    fn from(e: QueryError) -> Self {
        TransportError::InvalidRequest(e.to_string())
    }
}

/// Errors seen by users of a [`ListHandle`](crate::controller::ListHandle) or a
/// [`MutationCoordinator`](crate::mutation::MutationCoordinator).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("List controller closed")]
    ControllerClosed,
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// An update matched no live row (missing or soft-deleted meanwhile).
    #[error("No live row {id} in {endpoint}")]
    RowNotFound { endpoint: String, id: String },
}
