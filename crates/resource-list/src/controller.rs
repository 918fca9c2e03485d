//! # List Controller
//!
//! This module defines the `ResourceListController`, the screen-scoped task that
//! owns a [`ListStateMachine`], a [`SearchGate`] and a handle to the
//! [`Transport`]. It is the "Server" half of the list: commands arrive over a
//! channel and are processed one at a time, so the state needs no locks.
//!
//! The loop waits on three event sources at once:
//!
//! 1. **Commands** from [`ListHandle`]s (search text, page, refresh).
//! 2. **Completions** of fetches it spawned earlier.
//! 3. **The debounce deadline** of the search gate, when one is armed.
//!
//! Fetches run in their own tasks, so the controller keeps accepting commands
//! while requests are outstanding. Their results come back tagged with the
//! version of the request that produced them and the state machine drops the
//! stale ones.
//!
//! Dropping every `ListHandle` closes the command channel and ends the task. The
//! pending debounce timer is a field of the controller and goes with it.

use crate::debounce::{GateDecision, SearchGate, DEFAULT_DEBOUNCE};
use crate::entity::ListEntity;
use crate::error::{ControllerError, TransportError};
use crate::message::{FetchCompleted, ListCommand};
use crate::query::{QueryBuilder, ResourceQuery};
use crate::state::{FetchTicket, ListStateMachine, ListView, Outcome, ResourcePage};
use crate::transport::{self, RawPage, Transport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info};

/// Tunables of one list screen.
#[derive(Debug, Clone)]
pub struct ListSettings {
    pub page_size: u32,
    pub debounce: Duration,
    /// Capacity of the command channel.
    pub buffer_size: usize,
    /// Fetch page 1 as soon as the controller starts.
    pub fetch_on_start: bool,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            debounce: DEFAULT_DEBOUNCE,
            buffer_size: 32,
            fetch_on_start: true,
        }
    }
}

enum Event<T> {
    Command(Option<ListCommand>),
    Completed(FetchCompleted<T>),
    SearchDue,
}

/// The controller task of one list screen.
///
/// # Usage Pattern
///
/// 1.  **Create**: `ResourceListController::new()` returns the controller and a [`ListHandle`].
/// 2.  **Run**: spawn `controller.run()`.
/// 3.  **Use**: send commands through the handle and read [`ListView`]s back.
pub struct ResourceListController<T: ListEntity> {
    receiver: mpsc::Receiver<ListCommand>,
    completions: mpsc::UnboundedReceiver<FetchCompleted<T>>,
    completion_sender: mpsc::UnboundedSender<FetchCompleted<T>>,
    machine: ListStateMachine<T>,
    gate: SearchGate,
    builder: QueryBuilder,
    transport: Arc<dyn Transport>,
    view: watch::Sender<ListView<T>>,
    /// Mount fetch, issued before the first view is published.
    initial: Option<FetchTicket>,
}

impl<T: ListEntity> ResourceListController<T> {
    pub fn new(settings: ListSettings, transport: Arc<dyn Transport>) -> (Self, ListHandle<T>) {
        let (sender, receiver) = mpsc::channel(settings.buffer_size.max(1));
        let (completion_sender, completions) = mpsc::unbounded_channel();
        let mut machine = ListStateMachine::new(settings.page_size);
        let initial = settings
            .fetch_on_start
            .then(|| machine.request_fetch(1, ""));
        let (view, view_receiver) = watch::channel(machine.view());
        let controller = Self {
            receiver,
            completions,
            completion_sender,
            machine,
            gate: SearchGate::new(settings.debounce),
            builder: QueryBuilder::new(T::resource()),
            transport,
            view,
            initial,
        };
        let handle = ListHandle {
            sender,
            view: view_receiver,
        };
        (controller, handle)
    }

    /// Runs the event loop until every [`ListHandle`] is dropped.
    pub async fn run(mut self) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, endpoint = T::ENDPOINT, "Controller started");

        if let Some(ticket) = self.initial.take() {
            self.start_fetch(ticket);
        }

        loop {
            let deadline = self.gate.deadline();
            let event = tokio::select! {
                command = self.receiver.recv() => Event::Command(command),
                Some(done) = self.completions.recv() => Event::Completed(done),
                _ = wait_until(deadline) => Event::SearchDue,
            };

            match event {
                Event::Command(Some(command)) => {
                    debug!(entity_type, ?command, "Command");
                    self.handle_command(command);
                }
                Event::Command(None) => break,
                Event::Completed(done) => self.handle_completion(entity_type, done),
                Event::SearchDue => {
                    if let Some(text) = self.gate.fire(Instant::now()) {
                        debug!(entity_type, search = %text, "Search timer fired");
                        let ticket = self.machine.request_fetch(1, text);
                        self.start_fetch(ticket);
                    }
                }
            }
        }

        info!(
            entity_type,
            version = self.machine.latest_version(),
            "Controller shutdown"
        );
    }

    fn handle_command(&mut self, command: ListCommand) {
        match command {
            ListCommand::ChangeSearchText(text) => {
                match self.gate.on_search_text_changed(&text, Instant::now()) {
                    GateDecision::FetchNow => {
                        let ticket = self.machine.request_fetch(1, "");
                        self.start_fetch(ticket);
                    }
                    GateDecision::Scheduled { .. } => {}
                }
            }
            ListCommand::ChangePage(page) => {
                let search_text = self.machine.search_text().to_string();
                let ticket = self.machine.request_fetch(page, search_text);
                self.start_fetch(ticket);
            }
            ListCommand::Refresh => {
                let ticket = self.machine.refresh();
                self.start_fetch(ticket);
            }
        }
    }

    fn handle_completion(&mut self, entity_type: &str, done: FetchCompleted<T>) {
        match self.machine.apply(done.version, done.result) {
            Outcome::Loaded => {
                debug!(
                    entity_type,
                    version = done.version,
                    page = self.machine.page(),
                    total_count = self.machine.total_count(),
                    "Page loaded"
                );
                self.publish();
            }
            Outcome::Failed => self.publish(),
            Outcome::Stale => {}
            Outcome::Refetch(ticket) => self.start_fetch(ticket),
        }
    }

    /// Spawns the fetch behind `ticket` and publishes the loading state.
    fn start_fetch(&mut self, ticket: FetchTicket) {
        let plan = self.builder.build(&ticket.query);
        let transport = Arc::clone(&self.transport);
        let completions = self.completion_sender.clone();
        let FetchTicket { version, query } = ticket;

        tokio::spawn(async move {
            let result = match plan {
                Ok(plan) => transport::fetch_page(transport.as_ref(), &plan)
                    .await
                    .and_then(|raw| decode_page(raw, &query)),
                Err(e) => Err(TransportError::from(e)),
            };
            // The controller is gone when this fails; nobody is waiting.
            let _ = completions.send(FetchCompleted { version, result });
        });

        self.publish();
    }

    fn publish(&self) {
        self.view.send_replace(self.machine.view());
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn decode_page<T: ListEntity>(
    raw: RawPage,
    query: &ResourceQuery,
) -> Result<ResourcePage<T>, TransportError> {
    let rows = raw
        .rows
        .into_iter()
        .map(serde_json::from_value::<T>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(ResourcePage {
        rows,
        total_count: raw.total_count,
        page: query.page,
        page_size: query.page_size,
    })
}

/// Cloneable client of a [`ResourceListController`].
///
/// Commands are fire-and-forget: they return once the controller has accepted
/// them. Observe their effect with [`view`](Self::view), [`subscribe`](Self::subscribe)
/// or [`wait_for`](Self::wait_for).
pub struct ListHandle<T> {
    sender: mpsc::Sender<ListCommand>,
    view: watch::Receiver<ListView<T>>,
}

impl<T> Clone for ListHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            view: self.view.clone(),
        }
    }
}

impl<T: Clone> ListHandle<T> {
    async fn send(&self, command: ListCommand) -> Result<(), ControllerError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| ControllerError::ControllerClosed)
    }

    pub async fn change_search_text(&self, text: impl Into<String>) -> Result<(), ControllerError> {
        self.send(ListCommand::ChangeSearchText(text.into())).await
    }

    pub async fn change_page(&self, page: u32) -> Result<(), ControllerError> {
        self.send(ListCommand::ChangePage(page)).await
    }

    pub async fn refresh(&self) -> Result<(), ControllerError> {
        self.send(ListCommand::Refresh).await
    }

    /// The latest published view.
    pub fn view(&self) -> ListView<T> {
        self.view.borrow().clone()
    }

    /// A receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ListView<T>> {
        self.view.clone()
    }

    /// Waits until the published view satisfies `predicate` and returns it.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&ListView<T>) -> bool,
    ) -> Result<ListView<T>, ControllerError> {
        let mut view = self.view.clone();
        let matched = view
            .wait_for(predicate)
            .await
            .map_err(|_| ControllerError::ControllerClosed)?;
        Ok(matched.clone())
    }

    /// Waits for the next settled view (not loading).
    pub async fn settled(&self) -> Result<ListView<T>, ControllerError> {
        self.wait_for(|view| !view.is_loading).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{create_mock_transport, expect_fetch};
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Clone, Debug, PartialEq, Deserialize)]
    struct Row {
        id: i64,
        nome: String,
    }

    impl ListEntity for Row {
        type Id = i64;
        type Create = Value;
        type Update = Value;

        const ENDPOINT: &'static str = "cargos";
        const SEARCHABLE_FIELDS: &'static [&'static str] = &["nome"];
        const ORDER_BY: &'static str = "nome";

        fn id(&self) -> &i64 {
            &self.id
        }
    }

    fn rows(ids: std::ops::RangeInclusive<i64>) -> Vec<Value> {
        ids.map(|id| json!({ "id": id, "nome": format!("Cargo {id:02}") }))
            .collect()
    }

    fn param(pairs: &[(String, String)], key: &str) -> Option<String> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Starts a controller and answers its mount fetch with 23 rows.
    async fn mounted() -> (ListHandle<Row>, mpsc::Receiver<crate::mock::TransportCall>) {
        let (transport, mut calls) = create_mock_transport(16);
        let (controller, handle) =
            ResourceListController::<Row>::new(ListSettings::default(), Arc::new(transport));
        tokio::spawn(controller.run());

        let fetch = expect_fetch(&mut calls).await.unwrap();
        assert_eq!(fetch.data.offset, 0);
        fetch.respond(rows(1..=10), 23);
        let view = handle.settled().await.unwrap();
        assert_eq!(view.total_count, 23);
        (handle, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn mount_fetches_first_page() {
        let (handle, _calls) = mounted().await;
        let view = handle.view();
        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.start_index, 1);
        assert_eq!(view.end_index, 10);
        assert_eq!(view.rows[0].nome, "Cargo 01");
    }

    #[tokio::test(start_paused = true)]
    async fn typing_burst_issues_one_fetch() {
        let (handle, mut calls) = mounted().await;
        let start = Instant::now();

        handle.change_search_text("abc").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.change_search_text("abcd").await.unwrap();

        let fetch = expect_fetch(&mut calls).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(700));
        assert_eq!(
            param(&fetch.data.query_pairs(), "nome"),
            Some("ilike.*abcd*".to_string())
        );
        assert_eq!(fetch.data.offset, 0);
        fetch.respond(rows(1..=2), 2);

        let view = handle.settled().await.unwrap();
        assert_eq!(view.search_text, "abcd");
        assert_eq!(view.total_count, 2);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_search_fetches_immediately() {
        let (handle, mut calls) = mounted().await;

        handle.change_search_text("hiper").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let cleared_at = Instant::now();
        handle.change_search_text("   ").await.unwrap();

        let fetch = expect_fetch(&mut calls).await.unwrap();
        assert_eq!(cleared_at.elapsed(), Duration::ZERO);
        assert_eq!(param(&fetch.data.query_pairs(), "nome"), None);
        fetch.respond(rows(1..=10), 23);
        handle.settled().await.unwrap();

        // The cancelled "hiper" timer never fires.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_for_old_page_is_ignored() {
        let (handle, mut calls) = mounted().await;

        handle.change_page(2).await.unwrap();
        let page_two = expect_fetch(&mut calls).await.unwrap();
        handle.change_page(3).await.unwrap();
        let page_three = expect_fetch(&mut calls).await.unwrap();
        assert_eq!(page_three.data.offset, 20);

        page_three.respond(rows(21..=23), 23);
        let view = handle
            .wait_for(|v| v.page == 3 && !v.is_loading)
            .await
            .unwrap();
        assert_eq!(view.rows.len(), 3);

        page_two.respond(rows(11..=20), 23);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let view = handle.view();
        assert_eq!(view.page, 3);
        assert_eq!(view.rows[0].id, 21);
        assert_eq!(view.start_index, 21);
        assert_eq!(view.end_index, 23);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_keeps_page_and_search() {
        let (handle, mut calls) = mounted().await;

        handle.change_search_text("enf").await.unwrap();
        let search = expect_fetch(&mut calls).await.unwrap();
        search.respond(rows(1..=10), 15);
        handle.settled().await.unwrap();

        handle.change_page(2).await.unwrap();
        expect_fetch(&mut calls).await.unwrap().respond(rows(11..=15), 15);
        handle.wait_for(|v| v.page == 2 && !v.is_loading).await.unwrap();

        handle.refresh().await.unwrap();
        let refresh = expect_fetch(&mut calls).await.unwrap();
        let pairs = refresh.data.query_pairs();
        assert_eq!(param(&pairs, "nome"), Some("ilike.*enf*".to_string()));
        assert_eq!(param(&pairs, "offset"), Some("10".to_string()));
        assert_eq!(param(&pairs, "deleted_at"), Some("is.null".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_rows_and_reports_error() {
        let (handle, mut calls) = mounted().await;

        handle.change_page(2).await.unwrap();
        let fetch = expect_fetch(&mut calls).await.unwrap();
        fetch.fail(TransportError::Network("connection reset".into()));

        let view = handle.wait_for(|v| v.error.is_some()).await.unwrap();
        assert_eq!(view.rows.len(), 10);
        assert_eq!(view.rows[0].id, 1);
        assert_eq!((view.page, view.start_index, view.end_index), (1, 1, 10));
        assert!(!view.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_rows_fail_the_fetch() {
        let (handle, mut calls) = mounted().await;

        handle.refresh().await.unwrap();
        expect_fetch(&mut calls)
            .await
            .unwrap()
            .respond(vec![json!({ "id": "not-a-number" })], 1);

        let view = handle.wait_for(|v| v.error.is_some()).await.unwrap();
        assert!(matches!(view.error, Some(TransportError::Decode(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handles_stops_the_controller() {
        let (transport, _calls) = create_mock_transport(16);
        let settings = ListSettings {
            fetch_on_start: false,
            ..ListSettings::default()
        };
        let (controller, handle) = ResourceListController::<Row>::new(settings, Arc::new(transport));
        let task = tokio::spawn(controller.run());

        let observer = handle.subscribe();
        drop(handle);
        task.await.unwrap();
        assert!(observer.has_changed().is_err());
    }
}
