//! Application state
//!
//! Holds the shared state for the Axum application: the service context
//! and configuration.

use std::sync::Arc;

use harbor_common::AppConfig;
use harbor_service::ServiceContext;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    services: ServiceContext,
    config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(services: ServiceContext, config: Arc<AppConfig>) -> Self {
        Self { services, config }
    }

    /// Get the service context
    pub fn services(&self) -> &ServiceContext {
        &self.services
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("services", &"ServiceContext")
            .field("config", &"AppConfig")
            .finish()
    }
}
