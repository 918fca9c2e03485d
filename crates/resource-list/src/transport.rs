//! # Transport Adapter
//!
//! The [`Transport`] trait is the seam between the list controller and the backend.
//! Implementations execute request descriptions built by the
//! [`QueryBuilder`](crate::query::QueryBuilder) and normalize the outcome into rows,
//! a total count, or a [`TransportError`].
//!
//! | Implementation | Use |
//! |---|---|
//! | [`RestTransport`](crate::rest::RestTransport) | The real PostgREST backend over HTTP |
//! | [`InMemoryTransport`](crate::memory::InMemoryTransport) | Offline demo and end-to-end tests |
//! | [`MockTransport`](crate::mock::MockTransport) | Scripted responses for controller tests |
//!
//! Transports never retry. Retrying is the user's decision.

use crate::error::TransportError;
use crate::query::{CountRequest, DataRequest, QueryPlan, WriteRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Executes request descriptions against a backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches one window of rows.
    async fn fetch_rows(&self, request: &DataRequest) -> Result<Vec<Value>, TransportError>;

    /// Fetches the total number of rows matching the request's filters.
    async fn fetch_count(&self, request: &CountRequest) -> Result<u64, TransportError>;

    /// Executes a create/update/soft-delete and returns the affected rows.
    async fn write(&self, request: &WriteRequest) -> Result<Vec<Value>, TransportError>;
}

/// Rows and total count of one list fetch, before decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    pub rows: Vec<Value>,
    pub total_count: u64,
}

/// Issues the data and count requests of `plan` concurrently and combines them.
///
/// The backend cannot return an exact count alongside a windowed result, so this
/// is always two calls. Either failure fails the whole fetch.
pub async fn fetch_page(
    transport: &dyn Transport,
    plan: &QueryPlan,
) -> Result<RawPage, TransportError> {
    let (rows, total_count) = tokio::try_join!(
        transport.fetch_rows(&plan.data),
        transport.fetch_count(&plan.count)
    )?;
    debug!(
        endpoint = %plan.data.endpoint,
        rows = rows.len(),
        total_count,
        "Page fetched"
    );
    Ok(RawPage { rows, total_count })
}

/// Source of the bearer token attached to each request.
///
/// Read synchronously right before every request; there is no refresh logic.
pub trait AuthProvider: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// Never has a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn access_token(&self) -> Option<String> {
        None
    }
}

/// A fixed token, typically a service key from configuration.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl AuthProvider for StaticToken {
    fn access_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

impl<A: AuthProvider + ?Sized> AuthProvider for Arc<A> {
    fn access_token(&self) -> Option<String> {
        (**self).access_token()
    }
}

/// What to do when the [`AuthProvider`] has no token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingTokenPolicy {
    /// Send the request with only the API key.
    #[default]
    SendAnonymous,
    /// Fail with [`TransportError::MissingToken`] without sending anything.
    Reject,
}

/// Resolves the token to attach, applying `policy` when there is none.
pub fn resolve_token(
    auth: &dyn AuthProvider,
    policy: MissingTokenPolicy,
) -> Result<Option<String>, TransportError> {
    match (auth.access_token(), policy) {
        (Some(token), _) => Ok(Some(token)),
        (None, MissingTokenPolicy::SendAnonymous) => Ok(None),
        (None, MissingTokenPolicy::Reject) => Err(TransportError::MissingToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_policy() {
        assert_eq!(resolve_token(&NoAuth, MissingTokenPolicy::SendAnonymous), Ok(None));
        assert_eq!(
            resolve_token(&NoAuth, MissingTokenPolicy::Reject),
            Err(TransportError::MissingToken)
        );
        assert_eq!(
            resolve_token(&StaticToken("t0k".into()), MissingTokenPolicy::Reject),
            Ok(Some("t0k".to_string()))
        );
    }
}
