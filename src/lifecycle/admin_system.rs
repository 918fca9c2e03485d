use crate::clients::ResourceScreen;
use crate::config::{AppConfig, ConfigError};
use crate::model::{Area, Cargo, DoencaCronica, Equipe, Municipe, TipoVeiculo};
use resource_list::{AuthProvider, ListSettings, RestTransport, Transport, TransportError};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to build transport: {0}")]
    Transport(#[from] TransportError),
    #[error("Controller task failed: {0}")]
    TaskFailed(String),
}

/// The runtime orchestrator of the admin front-end.
///
/// Owns one [`ResourceScreen`] per managed table and the tasks running their
/// list controllers.
pub struct AdminSystem {
    pub cargos: ResourceScreen<Cargo>,
    pub doencas: ResourceScreen<DoencaCronica>,
    pub tipos_veiculo: ResourceScreen<TipoVeiculo>,
    pub equipes: ResourceScreen<Equipe>,
    pub areas: ResourceScreen<Area>,
    pub municipes: ResourceScreen<Municipe>,

    /// Task handles for all running controllers (used for graceful shutdown)
    handles: Vec<JoinHandle<()>>,
}

impl AdminSystem {
    /// Mounts every screen on `transport`. Must be called inside a Tokio runtime.
    pub fn new(transport: Arc<dyn Transport>, settings: ListSettings) -> Self {
        let (cargos, cargos_handle) = ResourceScreen::spawn(transport.clone(), settings.clone());
        let (doencas, doencas_handle) = ResourceScreen::spawn(transport.clone(), settings.clone());
        let (tipos_veiculo, veiculos_handle) =
            ResourceScreen::spawn(transport.clone(), settings.clone());
        let (equipes, equipes_handle) = ResourceScreen::spawn(transport.clone(), settings.clone());
        let (areas, areas_handle) = ResourceScreen::spawn(transport.clone(), settings.clone());
        let (municipes, municipes_handle) = ResourceScreen::spawn(transport, settings);

        info!("Admin system started");
        Self {
            cargos,
            doencas,
            tipos_veiculo,
            equipes,
            areas,
            municipes,
            handles: vec![
                cargos_handle,
                doencas_handle,
                veiculos_handle,
                equipes_handle,
                areas_handle,
                municipes_handle,
            ],
        }
    }

    /// Builds the REST transport described by `config` and mounts every screen on it.
    pub fn from_config(config: &AppConfig, auth: Arc<dyn AuthProvider>) -> Result<Self, SystemError> {
        config.validate()?;
        let transport = RestTransport::new(config.rest_config()?, auth)?;
        Ok(Self::new(Arc::new(transport), config.list_settings()))
    }

    /// Gracefully shuts down every controller.
    ///
    /// Returns an error if a controller task panicked.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down admin system...");

        // Dropping the screens closes the command channels.
        drop(self.cargos);
        drop(self.doencas);
        drop(self.tipos_veiculo);
        drop(self.equipes);
        drop(self.areas);
        drop(self.municipes);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Controller task failed: {:?}", e);
                return Err(SystemError::TaskFailed(e.to_string()));
            }
        }

        info!("Admin system shutdown complete.");
        Ok(())
    }
}
