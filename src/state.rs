use std::{sync::Arc, time::Duration};

use crate::backend::Backend;
use crate::config::AppConfig;
use crate::session::Session;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let backend = Backend::connect(&config).await?;
        Ok(Self::from_parts(backend, config))
    }

    pub fn from_parts(backend: Backend, config: Arc<AppConfig>) -> Self {
        let session = Arc::new(Session::new(backend, config.session.clone()));
        Self { session, config }
    }

    /// In-memory state with a short splash, for tests.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig::in_memory(Duration::from_millis(10)));
        Self::from_parts(Backend::in_memory(), config)
    }
}
