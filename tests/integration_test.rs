use health_admin::clients::{ListClient, ScreenError};
use health_admin::lifecycle::{seed_sample_data, AdminSystem};
use health_admin::model::{CargoForm, Municipe, MunicipeForm, TipoVeiculoForm};
use health_admin::validation::ValidationError;
use resource_list::{InMemoryTransport, ListEntity, ListSettings};
use std::sync::Arc;

async fn offline_system() -> (AdminSystem, Arc<InMemoryTransport>) {
    let transport = Arc::new(InMemoryTransport::new());
    seed_sample_data(&transport).await;
    let system = AdminSystem::new(transport.clone(), ListSettings::default());
    (system, transport)
}

/// Every screen mounts on its own and hides soft-deleted rows.
#[tokio::test]
async fn test_all_screens_mount_with_live_rows() {
    let (system, _transport) = offline_system().await;

    let cargos = system
        .cargos
        .list()
        .wait_for(|v| v.total_count > 0 && !v.is_loading)
        .await
        .expect("cargos screen closed");
    assert_eq!(cargos.total_count, 12);
    assert_eq!(cargos.total_pages, 2);
    assert_eq!(cargos.rows.len(), 10);

    let areas = system
        .areas
        .list()
        .wait_for(|v| v.total_count > 0 && !v.is_loading)
        .await
        .unwrap();
    assert_eq!(areas.total_count, 3);

    let municipes = system
        .municipes
        .list()
        .wait_for(|v| v.total_count > 0 && !v.is_loading)
        .await
        .unwrap();
    assert_eq!(municipes.total_count, 4);
    assert!(municipes.rows.iter().all(|m| !m.meta.is_deleted()));

    system.shutdown().await.expect("Shutdown failed");
}

#[tokio::test(start_paused = true)]
async fn test_municipe_search_skips_deleted_namesakes() {
    let (system, _transport) = offline_system().await;
    system.municipes.settled().await.unwrap();

    system.municipes.search("MARIA").await.unwrap();
    let view = system
        .municipes
        .list()
        .wait_for(|v| v.search_text == "MARIA" && !v.is_loading)
        .await
        .unwrap();

    assert_eq!(view.total_count, 1);
    assert_eq!(view.rows[0].nome, "Maria Aparecida Souza");
    assert_eq!(view.page, 1);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_forms_never_reach_the_backend() {
    let (system, transport) = offline_system().await;
    let before = transport.snapshot(Municipe::ENDPOINT).await.len();

    let form = MunicipeForm {
        nome: "Carlos Eduardo".into(),
        cpf: "123".into(),
        cartao_sus: "700000000000009".into(),
        ..MunicipeForm::default()
    };
    let result = system.municipes.create(&form).await;
    assert_eq!(
        result.unwrap_err(),
        ScreenError::Validation(ValidationError::Digits {
            field: "cpf",
            expected: 11,
            found: 3,
        })
    );

    let van = TipoVeiculoForm {
        nome: "Van adaptada".into(),
        capacidade: Some(0),
    };
    assert!(matches!(
        system.tipos_veiculo.update(&3, &van).await,
        Err(ScreenError::Validation(ValidationError::OutOfRange { field: "capacidade", .. }))
    ));

    assert_eq!(transport.snapshot(Municipe::ENDPOINT).await.len(), before);
    system.shutdown().await.unwrap();
}

/// Create then soft delete on the last page of Cargos.
#[tokio::test]
async fn test_cargo_create_and_soft_delete_flow() {
    let (system, transport) = offline_system().await;
    let cargos = &system.cargos;
    cargos
        .list()
        .wait_for(|v| v.total_count == 12 && !v.is_loading)
        .await
        .unwrap();

    cargos.next_page().await.unwrap();
    let view = cargos
        .list()
        .wait_for(|v| v.page == 2 && !v.is_loading)
        .await
        .unwrap();
    assert_eq!((view.start_index, view.end_index), (11, 12));

    let created = cargos
        .create(&CargoForm::new("Terapeuta Ocupacional"))
        .await
        .expect("Failed to create cargo")
        .expect("No representation returned");
    let view = cargos
        .list()
        .wait_for(|v| v.total_count == 13 && !v.is_loading)
        .await
        .unwrap();
    assert_eq!(view.page, 2);
    assert_eq!(view.rows.len(), 3);

    cargos.soft_delete(&created.id).await.unwrap();
    let view = cargos
        .list()
        .wait_for(|v| v.total_count == 12 && !v.is_loading)
        .await
        .unwrap();
    assert!(view.rows.iter().all(|c| c.id != created.id));

    let stored = transport.snapshot("cargos").await;
    assert_eq!(stored.len(), 14);

    system.shutdown().await.unwrap();
}
