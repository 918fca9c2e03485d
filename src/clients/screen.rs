//! # Resource Screen
//!
//! Provides the API one admin screen uses: the list (search, paging, view) and
//! the mutations behind its forms. Forms are validated here, before anything is
//! sent, so the backend only sees well-formed payloads.
use crate::clients::ListClient;
use crate::validation::{Validate, ValidationError};
use resource_list::{
    ControllerError, ListEntity, ListHandle, ListSettings, MutationCoordinator,
    ResourceListController, Transport,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ScreenError {
    #[error("Invalid form: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Client for one resource screen.
pub struct ResourceScreen<T: ListEntity> {
    list: ListHandle<T>,
    mutations: MutationCoordinator<T>,
}

impl<T: ListEntity> Clone for ResourceScreen<T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            mutations: self.mutations.clone(),
        }
    }
}

impl<T: ListEntity> ResourceScreen<T> {
    pub fn new(list: ListHandle<T>, mutations: MutationCoordinator<T>) -> Self {
        Self { list, mutations }
    }

    /// Starts the list controller of a new screen ("mount").
    ///
    /// The controller stops once the screen and all its clones are dropped.
    pub fn spawn(transport: Arc<dyn Transport>, settings: ListSettings) -> (Self, JoinHandle<()>) {
        let (controller, list) = ResourceListController::<T>::new(settings, transport.clone());
        let handle = tokio::spawn(controller.run());
        let mutations = MutationCoordinator::new(transport, list.clone());
        (Self::new(list, mutations), handle)
    }
}

impl<T: ListEntity> ResourceScreen<T>
where
    T::Create: Validate,
    T::Update: Validate,
{
    #[instrument(skip(self, form), fields(endpoint = T::ENDPOINT))]
    pub async fn create(&self, form: &T::Create) -> Result<Option<T>, ScreenError> {
        debug!(?form, "create called");
        validated(form)?;
        Ok(self.mutations.create(form).await?)
    }

    #[instrument(skip(self, form), fields(endpoint = T::ENDPOINT))]
    pub async fn update(&self, id: &T::Id, form: &T::Update) -> Result<Option<T>, ScreenError> {
        debug!(?form, "update called");
        validated(form)?;
        Ok(self.mutations.update(id, form).await?)
    }

    #[instrument(skip(self), fields(endpoint = T::ENDPOINT))]
    pub async fn soft_delete(&self, id: &T::Id) -> Result<(), ScreenError> {
        Ok(self.mutations.soft_delete(id).await?)
    }
}

fn validated(form: &impl Validate) -> Result<(), ValidationError> {
    form.validate().inspect_err(|e| warn!(error = %e, "Form rejected"))
}

impl<T: ListEntity> ListClient<T> for ResourceScreen<T> {
    type Error = ScreenError;

    fn list(&self) -> &ListHandle<T> {
        &self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cargo, CargoForm};
    use resource_list::mock::{create_mock_transport, expect_fetch, expect_write};
    use serde_json::json;

    #[tokio::test]
    async fn invalid_form_never_reaches_the_backend() {
        let (transport, mut calls) = create_mock_transport(8);
        let (screen, _task) = ResourceScreen::<Cargo>::spawn(Arc::new(transport), ListSettings::default());
        expect_fetch(&mut calls).await.unwrap().respond(Vec::new(), 0);
        screen.settled().await.unwrap();

        let result = screen.create(&CargoForm::new("   ")).await;

        assert_eq!(
            result,
            Err(ScreenError::Validation(ValidationError::Required { field: "nome" }))
        );
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test]
    async fn valid_form_is_written_and_list_refreshed() {
        let (transport, mut calls) = create_mock_transport(8);
        let (screen, _task) = ResourceScreen::<Cargo>::spawn(Arc::new(transport), ListSettings::default());
        expect_fetch(&mut calls).await.unwrap().respond(Vec::new(), 0);
        screen.settled().await.unwrap();

        let writer = screen.clone();
        let create = tokio::spawn(async move { writer.create(&CargoForm::new("Dentista")).await });
        let (request, reply) = expect_write(&mut calls).await.unwrap();
        assert_eq!(request.endpoint, "cargos");
        reply
            .send(Ok(vec![json!({ "id": 1, "nome": "Dentista" })]))
            .unwrap();
        assert_eq!(create.await.unwrap().unwrap().map(|c| c.nome), Some("Dentista".into()));

        expect_fetch(&mut calls)
            .await
            .unwrap()
            .respond(vec![json!({ "id": 1, "nome": "Dentista" })], 1);
        let view = screen.list().wait_for(|v| v.total_count == 1 && !v.is_loading).await.unwrap();
        assert_eq!(view.rows[0].nome, "Dentista");
    }

    #[tokio::test]
    async fn paging_stops_at_the_edges() {
        let (transport, mut calls) = create_mock_transport(8);
        let (screen, _task) = ResourceScreen::<Cargo>::spawn(Arc::new(transport), ListSettings::default());
        let rows = (1..=10).map(|id| json!({ "id": id, "nome": format!("Cargo {id}") })).collect();
        expect_fetch(&mut calls).await.unwrap().respond(rows, 10);
        screen.settled().await.unwrap();

        screen.previous_page().await.unwrap();
        screen.next_page().await.unwrap();
        assert!(calls.try_recv().is_err());
    }
}
