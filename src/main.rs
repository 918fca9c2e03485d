//! # Health Admin
//!
//! Command-line entry point. Mounts every admin screen against the configured
//! backend (or seeded in-memory tables with `--offline`) and walks the Cargo
//! screen through a search, a page change, a create and a soft delete.
//!
//! ```bash
//! RUST_LOG=info cargo run -- --offline
//! RUST_LOG=debug cargo run -- --config health-admin.toml
//! ```

use clap::Parser;
use health_admin::auth::SessionStore;
use health_admin::clients::ListClient;
use health_admin::config::AppConfig;
use health_admin::lifecycle::{seed_sample_data, setup_tracing, AdminSystem};
use health_admin::model::{Cargo, CargoForm};
use resource_list::{InMemoryTransport, ListView};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[derive(Debug, Parser)]
#[command(name = "health-admin", about = "Municipal health records admin")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use seeded in-memory tables instead of the REST backend
    #[arg(long)]
    offline: bool,
}

fn log_view(label: &str, view: &ListView<Cargo>) {
    info!(
        label,
        page = view.page,
        total_pages = view.total_pages,
        total_count = view.total_count,
        showing = %format!("{}-{}", view.start_index, view.end_index),
        search = %view.search_text,
        "Cargos"
    );
    if let Some(e) = &view.error {
        error!(error = %e, "List failed");
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();
    setup_tracing();

    let config = AppConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;

    let system = if cli.offline {
        info!("Starting in offline mode");
        let transport = Arc::new(InMemoryTransport::new());
        seed_sample_data(&transport).await;
        config.validate().map_err(|e| e.to_string())?;
        AdminSystem::new(transport, config.list_settings())
    } else {
        info!(api_url = %config.api_url, "Starting against REST backend");
        let session = Arc::new(match &config.access_token {
            Some(token) => SessionStore::with_token(token.clone()),
            None => SessionStore::new(),
        });
        AdminSystem::from_config(&config, session).map_err(|e| e.to_string())?
    };

    let cargos = &system.cargos;
    let view = cargos.settled().await.map_err(|e| e.to_string())?;
    log_view("mounted", &view);

    let span = tracing::info_span!("search");
    let view = async {
        cargos.search("enf").await?;
        Ok::<_, health_admin::clients::ScreenError>(
            cargos
                .list()
                .wait_for(|v| v.search_text == "enf" && !v.is_loading)
                .await?,
        )
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;
    log_view("searched", &view);

    cargos.search("").await.map_err(|e| e.to_string())?;
    let view = cargos
        .list()
        .wait_for(|v| v.search_text.is_empty() && !v.is_loading)
        .await
        .map_err(|e| e.to_string())?;
    if view.total_pages > 1 {
        cargos.next_page().await.map_err(|e| e.to_string())?;
        let view = cargos
            .list()
            .wait_for(|v| v.page == 2 && !v.is_loading)
            .await
            .map_err(|e| e.to_string())?;
        log_view("next page", &view);
    }

    let span = tracing::info_span!("cargo_lifecycle");
    let result = async {
        let form = CargoForm::new("Enfermeiro Auditor").with_descricao("Auditoria de prontuários");
        match cargos.create(&form).await? {
            Some(created) => {
                info!(id = created.id, "Cargo created");
                cargos.soft_delete(&created.id).await?;
                info!(id = created.id, "Cargo soft-deleted");
            }
            None => info!("Cargo created; backend returned no representation"),
        }
        Ok::<_, health_admin::clients::ScreenError>(())
    }
    .instrument(span)
    .await;

    if let Err(e) = result {
        error!(error = %e, "Cargo lifecycle failed");
    }

    let view = cargos.settled().await.map_err(|e| e.to_string())?;
    log_view("final", &view);

    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}
