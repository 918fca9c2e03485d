//! # Mock Transport & Testing Guide
//!
//! [`MockTransport`] implements [`Transport`] by forwarding every call over a
//! channel the test controls. The test decides when and how each call is
//! answered, which makes ordering problems (late responses, failures in the
//! middle of a burst) reproducible without a network or a real clock.
//!
//! ## When to use which transport
//!
//! | Feature | MockTransport | InMemoryTransport |
//! |---------|---------------|-------------------|
//! | **Response timing** | Chosen by the test | Immediate |
//! | **Data** | Scripted per call | Real tables with filters and paging |
//! | **Error injection** | Any call | Next write only |
//! | **Use case** | Controller ordering and debounce tests | End-to-end flows |
//!
//! ## Example
//!
//! ```rust
//! use resource_list::mock::{create_mock_transport, expect_fetch};
//! use resource_list::{ListEntity, ListSettings, ResourceListController};
//! use serde::Deserialize;
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, Deserialize)]
//! struct Area { id: i64, nome: String }
//!
//! impl ListEntity for Area {
//!     type Id = i64;
//!     type Create = serde_json::Value;
//!     type Update = serde_json::Value;
//!     const ENDPOINT: &'static str = "areas";
//!     const SEARCHABLE_FIELDS: &'static [&'static str] = &["nome"];
//!     const ORDER_BY: &'static str = "nome";
//!     fn id(&self) -> &i64 { &self.id }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (transport, mut calls) = create_mock_transport(8);
//!     let (controller, list) =
//!         ResourceListController::<Area>::new(ListSettings::default(), Arc::new(transport));
//!     tokio::spawn(controller.run());
//!
//!     // Answer the fetch issued on start.
//!     let fetch = expect_fetch(&mut calls).await.unwrap();
//!     fetch.respond(vec![serde_json::json!({ "id": 1, "nome": "Centro" })], 1);
//!
//!     let view = list.settled().await.unwrap();
//!     assert_eq!(view.rows[0].nome, "Centro");
//! }
//! ```
//!
//! Use [`MockTransport::scripted`] instead when the answers are known up front.

use crate::error::TransportError;
use crate::query::{CountRequest, DataRequest, WriteRequest};
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// Type alias for the one-shot channel a transport call is answered on.
pub type Reply<T> = oneshot::Sender<Result<T, TransportError>>;

/// One call made against a [`MockTransport`].
#[derive(Debug)]
pub enum TransportCall {
    FetchRows {
        request: DataRequest,
        respond_to: Reply<Vec<Value>>,
    },
    FetchCount {
        request: CountRequest,
        respond_to: Reply<u64>,
    },
    Write {
        request: WriteRequest,
        respond_to: Reply<Vec<Value>>,
    },
}

/// Scripted answer for [`MockTransport::scripted`].
#[derive(Debug, Clone)]
pub enum Scripted {
    Page {
        rows: Vec<Value>,
        total_count: u64,
    },
    Write(Result<Vec<Value>, TransportError>),
    FetchError(TransportError),
}

/// A [`Transport`] that forwards every call to a channel.
#[derive(Clone)]
pub struct MockTransport {
    sender: mpsc::Sender<TransportCall>,
}

impl MockTransport {
    async fn call<R>(
        &self,
        make: impl FnOnce(Reply<R>) -> TransportCall,
    ) -> Result<R, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| TransportError::Network("mock transport closed".into()))?;
        response
            .await
            .map_err(|_| TransportError::Network("mock call dropped".into()))?
    }

    /// A transport answering calls from a queue of scripted responses.
    ///
    /// A `Page` or `FetchError` answers one rows call and one count call. Panics
    /// on a call the script does not expect.
    pub fn scripted(script: impl IntoIterator<Item = Scripted>) -> (Self, ScriptHandle) {
        let (transport, mut calls) = create_mock_transport(64);
        let queue = Arc::new(Mutex::new(script.into_iter().collect::<VecDeque<_>>()));
        let script = queue.clone();

        let handle = tokio::spawn(async move {
            let mut pending_count: Option<u64> = None;
            let mut pending_rows: Option<Vec<Value>> = None;
            while let Some(call) = calls.recv().await {
                match call {
                    TransportCall::FetchRows { respond_to, .. } => {
                        if let Some(rows) = pending_rows.take() {
                            let _ = respond_to.send(Ok(rows));
                            continue;
                        }
                        let next = script.lock().unwrap().pop_front();
                        match next {
                            Some(Scripted::Page { rows, total_count }) => {
                                pending_count = Some(total_count);
                                let _ = respond_to.send(Ok(rows));
                            }
                            Some(Scripted::FetchError(error)) => {
                                pending_count = Some(0);
                                let _ = respond_to.send(Err(error));
                            }
                            other => panic!("Unexpected rows fetch, script had {other:?}"),
                        }
                    }
                    TransportCall::FetchCount { respond_to, .. } => {
                        if let Some(total) = pending_count.take() {
                            let _ = respond_to.send(Ok(total));
                            continue;
                        }
                        let next = script.lock().unwrap().pop_front();
                        match next {
                            Some(Scripted::Page { rows, total_count }) => {
                                pending_rows = Some(rows);
                                let _ = respond_to.send(Ok(total_count));
                            }
                            Some(Scripted::FetchError(error)) => {
                                pending_rows = Some(Vec::new());
                                let _ = respond_to.send(Err(error));
                            }
                            other => panic!("Unexpected count fetch, script had {other:?}"),
                        }
                    }
                    TransportCall::Write { respond_to, .. } => {
                        let next = script.lock().unwrap().pop_front();
                        match next {
                            Some(Scripted::Write(result)) => {
                                let _ = respond_to.send(result);
                            }
                            other => panic!("Unexpected write, script had {other:?}"),
                        }
                    }
                }
            }
        });

        (
            transport,
            ScriptHandle {
                remaining: queue,
                _handle: handle,
            },
        )
    }
}

/// Keeps a scripted transport alive and reports unused answers.
pub struct ScriptHandle {
    remaining: Arc<Mutex<VecDeque<Scripted>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl ScriptHandle {
    /// Verifies that every scripted answer was consumed.
    pub fn verify(&self) {
        let remaining = self.remaining.lock().unwrap();
        if !remaining.is_empty() {
            panic!("Not all scripted answers were used. {} remaining", remaining.len());
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_rows(&self, request: &DataRequest) -> Result<Vec<Value>, TransportError> {
        let request = request.clone();
        self.call(|respond_to| TransportCall::FetchRows {
            request,
            respond_to,
        })
        .await
    }

    async fn fetch_count(&self, request: &CountRequest) -> Result<u64, TransportError> {
        let request = request.clone();
        self.call(|respond_to| TransportCall::FetchCount {
            request,
            respond_to,
        })
        .await
    }

    async fn write(&self, request: &WriteRequest) -> Result<Vec<Value>, TransportError> {
        let request = request.clone();
        self.call(|respond_to| TransportCall::Write {
            request,
            respond_to,
        })
        .await
    }
}

/// Creates a mock transport and the receiver its calls arrive on.
pub fn create_mock_transport(buffer_size: usize) -> (MockTransport, mpsc::Receiver<TransportCall>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (MockTransport { sender }, receiver)
}

/// The rows and count calls of one list fetch, waiting for an answer.
#[derive(Debug)]
pub struct PendingFetch {
    pub data: DataRequest,
    pub count: CountRequest,
    rows_reply: Reply<Vec<Value>>,
    count_reply: Reply<u64>,
}

impl PendingFetch {
    pub fn respond(self, rows: Vec<Value>, total_count: u64) {
        let _ = self.rows_reply.send(Ok(rows));
        let _ = self.count_reply.send(Ok(total_count));
    }

    /// Fails the rows call; the count call succeeds.
    pub fn fail(self, error: TransportError) {
        let _ = self.rows_reply.send(Err(error));
        let _ = self.count_reply.send(Ok(0));
    }
}

/// Helper to receive the next list fetch (its rows and count calls, in either order).
///
/// Returns `None` if the channel closes or a write arrives first.
pub async fn expect_fetch(receiver: &mut mpsc::Receiver<TransportCall>) -> Option<PendingFetch> {
    let mut rows = None;
    let mut count = None;
    while rows.is_none() || count.is_none() {
        match receiver.recv().await? {
            TransportCall::FetchRows {
                request,
                respond_to,
            } if rows.is_none() => rows = Some((request, respond_to)),
            TransportCall::FetchCount {
                request,
                respond_to,
            } if count.is_none() => count = Some((request, respond_to)),
            _ => return None,
        }
    }
    let ((data, rows_reply), (count, count_reply)) = (rows?, count?);
    Some(PendingFetch {
        data,
        count,
        rows_reply,
        count_reply,
    })
}

/// Helper to verify that the next call is a write.
pub async fn expect_write(
    receiver: &mut mpsc::Receiver<TransportCall>,
) -> Option<(WriteRequest, Reply<Vec<Value>>)> {
    match receiver.recv().await {
        Some(TransportCall::Write {
            request,
            respond_to,
        }) => Some((request, respond_to)),
        _ => None,
    }
}
