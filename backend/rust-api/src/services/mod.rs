use std::sync::Arc;

use crate::config::Config;
use authoring_service::AuthoringStore;
use kidemia_client::{HttpKidemiaBackend, KidemiaBackend};

pub struct AppState {
    pub config: Config,
    pub authoring: Arc<AuthoringStore>,
    pub kidemia: Arc<dyn KidemiaBackend>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let backend = HttpKidemiaBackend::new(&config.kidemia_api)?;
        tracing::info!("Kidemia API client targeting {}", config.kidemia_api.url);

        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Builds the state around an existing backend (used by tests).
    pub fn with_backend(config: Config, kidemia: Arc<dyn KidemiaBackend>) -> Self {
        Self {
            config,
            authoring: Arc::new(AuthoringStore::new()),
            kidemia,
        }
    }
}

pub mod authoring_service;
pub mod catalog_service;
pub mod csv_import;
pub mod error_parser;
pub mod kidemia_client;
pub mod payload_mapper;
pub mod question_validation;
