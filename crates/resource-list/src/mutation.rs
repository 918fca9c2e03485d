//! # Mutation Coordinator
//!
//! Runs create, update and soft-delete requests for one resource and keeps the
//! list consistent afterwards by sending [`ListCommand::Refresh`](crate::message::ListCommand::Refresh)
//! to its controller. There is no optimistic patching: the list only changes
//! through a re-fetch.
//!
//! Payloads are borrowed. A failed mutation leaves the form data with the caller
//! so the user can retry without retyping.

use crate::controller::ListHandle;
use crate::entity::{ListEntity, ResourceConfig};
use crate::error::{ControllerError, TransportError};
use crate::query::WriteRequest;
use crate::transport::Transport;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// One mutation while it is in flight.
#[derive(Debug)]
pub enum PendingMutation<'a, T: ListEntity> {
    Create(&'a T::Create),
    Update { id: &'a T::Id, payload: &'a T::Update },
    SoftDelete { id: &'a T::Id },
}

impl<T: ListEntity> PendingMutation<'_, T> {
    fn kind(&self) -> &'static str {
        match self {
            PendingMutation::Create(_) => "create",
            PendingMutation::Update { .. } => "update",
            PendingMutation::SoftDelete { .. } => "soft_delete",
        }
    }

    fn into_request(self, config: &ResourceConfig) -> Result<WriteRequest, TransportError> {
        Ok(match self {
            PendingMutation::Create(payload) => WriteRequest::insert(config, to_body(payload)?),
            PendingMutation::Update { id, payload } => {
                WriteRequest::update(config, &id.to_string(), to_body(payload)?)
            }
            PendingMutation::SoftDelete { id } => {
                WriteRequest::soft_delete(config, &id.to_string(), Utc::now())
            }
        })
    }
}

impl<T: ListEntity> fmt::Display for PendingMutation<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingMutation::Create(_) => write!(f, "create"),
            PendingMutation::Update { id, .. } => write!(f, "update {id}"),
            PendingMutation::SoftDelete { id } => write!(f, "soft delete {id}"),
        }
    }
}

fn to_body(payload: &impl Serialize) -> Result<Value, TransportError> {
    serde_json::to_value(payload).map_err(|e| TransportError::InvalidRequest(e.to_string()))
}

/// Executes mutations for `T` and refreshes the bound list on success.
pub struct MutationCoordinator<T: ListEntity> {
    transport: Arc<dyn Transport>,
    config: ResourceConfig,
    list: ListHandle<T>,
}

impl<T: ListEntity> Clone for MutationCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            list: self.list.clone(),
        }
    }
}

impl<T: ListEntity> MutationCoordinator<T> {
    pub fn new(transport: Arc<dyn Transport>, list: ListHandle<T>) -> Self {
        Self {
            transport,
            config: T::resource(),
            list,
        }
    }

    /// Inserts a row. Returns the created row when the backend echoes it.
    pub async fn create(&self, payload: &T::Create) -> Result<Option<T>, ControllerError> {
        let rows = self.execute(PendingMutation::Create(payload)).await?;
        Ok(first_row(rows))
    }

    /// Patches the row with `id`. Returns the updated row when the backend echoes it.
    ///
    /// Fails with [`ControllerError::RowNotFound`] when the row no longer exists
    /// or was soft-deleted meanwhile; the list is not refreshed then.
    pub async fn update(&self, id: &T::Id, payload: &T::Update) -> Result<Option<T>, ControllerError> {
        let rows = self.execute(PendingMutation::Update { id, payload }).await?;
        Ok(first_row(rows))
    }

    /// Marks the row with `id` as deleted. Never removes it.
    ///
    /// Deleting a row that is already deleted matches nothing and still succeeds.
    pub async fn soft_delete(&self, id: &T::Id) -> Result<(), ControllerError> {
        self.execute(PendingMutation::SoftDelete { id }).await?;
        Ok(())
    }

    #[instrument(skip(self, mutation), fields(endpoint = %self.config.endpoint(), mutation = %mutation))]
    async fn execute(&self, mutation: PendingMutation<'_, T>) -> Result<Vec<Value>, ControllerError> {
        let kind = mutation.kind();
        let updated_id = match &mutation {
            PendingMutation::Update { id, .. } => Some(id.to_string()),
            _ => None,
        };
        let request = mutation.into_request(&self.config)?;
        debug!(body = %request.body, "Sending mutation");

        let rows = match self.transport.write(&request).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(kind, error = %e, "Mutation failed");
                return Err(e.into());
            }
        };
        if let (Some(id), true) = (updated_id, rows.is_empty()) {
            warn!(kind, %id, "Mutation matched no live row");
            return Err(ControllerError::RowNotFound {
                endpoint: self.config.endpoint().to_string(),
                id,
            });
        }
        info!(kind, affected = rows.len(), "Mutation applied");

        self.list.refresh().await?;
        Ok(rows)
    }
}

fn first_row<T: ListEntity>(rows: Vec<Value>) -> Option<T> {
    let row = rows.into_iter().next()?;
    match serde_json::from_value(row) {
        Ok(row) => Some(row),
        Err(e) => {
            debug!(error = %e, "Returned row not decodable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ListSettings, ResourceListController};
    use crate::mock::{create_mock_transport, expect_fetch, expect_write, TransportCall};
    use crate::query::WriteMethod;
    use serde::Deserialize;
    use serde_json::json;
    use tokio::sync::mpsc;

    #[derive(Clone, Debug, PartialEq, Deserialize)]
    struct Equipe {
        id: i64,
        nome: String,
    }

    #[derive(Debug, Serialize)]
    struct EquipeForm {
        nome: String,
    }

    impl ListEntity for Equipe {
        type Id = i64;
        type Create = EquipeForm;
        type Update = EquipeForm;

        const ENDPOINT: &'static str = "equipes";
        const SEARCHABLE_FIELDS: &'static [&'static str] = &["nome"];
        const ORDER_BY: &'static str = "nome";

        fn id(&self) -> &i64 {
            &self.id
        }
    }

    async fn setup() -> (MutationCoordinator<Equipe>, ListHandle<Equipe>, mpsc::Receiver<TransportCall>) {
        let (transport, mut calls) = create_mock_transport(16);
        let transport: Arc<dyn Transport> = Arc::new(transport);
        let (controller, list) =
            ResourceListController::<Equipe>::new(ListSettings::default(), transport.clone());
        tokio::spawn(controller.run());

        expect_fetch(&mut calls)
            .await
            .unwrap()
            .respond(vec![json!({ "id": 1, "nome": "Equipe Azul" })], 1);
        list.settled().await.unwrap();

        (MutationCoordinator::new(transport, list.clone()), list, calls)
    }

    #[tokio::test]
    async fn create_refreshes_list() {
        let (mutations, list, mut calls) = setup().await;
        let form = EquipeForm {
            nome: "Equipe Verde".into(),
        };

        let create = tokio::spawn(async move { mutations.create(&form).await });
        let (request, reply) = expect_write(&mut calls).await.unwrap();
        assert_eq!(request.method, WriteMethod::Insert);
        assert_eq!(request.body, json!({ "nome": "Equipe Verde" }));
        reply.send(Ok(vec![json!({ "id": 2, "nome": "Equipe Verde" })])).unwrap();

        let created = create.await.unwrap().unwrap();
        assert_eq!(created.map(|e| e.id), Some(2));

        let refresh = expect_fetch(&mut calls).await.unwrap();
        assert_eq!(refresh.data.offset, 0);
        refresh.respond(
            vec![
                json!({ "id": 1, "nome": "Equipe Azul" }),
                json!({ "id": 2, "nome": "Equipe Verde" }),
            ],
            2,
        );
        let view = list.wait_for(|v| v.total_count == 2 && !v.is_loading).await.unwrap();
        assert_eq!(view.rows.len(), 2);
    }

    #[tokio::test]
    async fn soft_delete_is_a_patch_with_timestamp() {
        let (mutations, _list, mut calls) = setup().await;

        let delete = tokio::spawn(async move { mutations.soft_delete(&1).await });
        let (request, reply) = expect_write(&mut calls).await.unwrap();
        assert_eq!(request.method, WriteMethod::Patch);
        let pairs = request.query_pairs();
        assert!(pairs.contains(&("id".to_string(), "eq.1".to_string())));
        assert!(pairs.contains(&("deleted_at".to_string(), "is.null".to_string())));
        assert!(request.body["deleted_at"].is_string());
        reply.send(Ok(Vec::new())).unwrap();

        delete.await.unwrap().unwrap();
        assert!(expect_fetch(&mut calls).await.is_some());
    }

    #[tokio::test]
    async fn failed_update_does_not_refresh() {
        let (mutations, _list, mut calls) = setup().await;
        let form = EquipeForm {
            nome: "Duplicada".into(),
        };

        let update = tokio::spawn(async move {
            let result = mutations.update(&1, &form).await;
            // The form is still available for a retry.
            (result, form.nome)
        });
        let (request, reply) = expect_write(&mut calls).await.unwrap();
        assert!(request
            .query_pairs()
            .contains(&("id".to_string(), "eq.1".to_string())));
        let error = TransportError::Status {
            status: 409,
            message: "duplicate key value".into(),
        };
        reply.send(Err(error.clone())).unwrap();

        let (result, nome) = update.await.unwrap();
        assert_eq!(result, Err(ControllerError::Transport(error)));
        assert_eq!(nome, "Duplicada");
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test]
    async fn update_of_deleted_row_fails_without_refresh() {
        let (mutations, _list, mut calls) = setup().await;
        let form = EquipeForm {
            nome: "Equipe Azul Claro".into(),
        };

        let update = tokio::spawn(async move { mutations.update(&1, &form).await });
        let (request, reply) = expect_write(&mut calls).await.unwrap();
        assert!(request
            .query_pairs()
            .contains(&("deleted_at".to_string(), "is.null".to_string())));
        // Soft-deleted meanwhile: the filter matches nothing.
        reply.send(Ok(Vec::new())).unwrap();

        assert_eq!(
            update.await.unwrap(),
            Err(ControllerError::RowNotFound {
                endpoint: "equipes".into(),
                id: "1".into(),
            })
        );
        assert!(calls.try_recv().is_err());
    }
}
