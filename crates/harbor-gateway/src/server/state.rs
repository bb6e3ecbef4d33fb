//! Gateway state

use std::sync::Arc;

use harbor_common::AppConfig;
use harbor_service::ServiceContext;

use crate::connection::ConnectionManager;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    services: ServiceContext,
    manager: Arc<ConnectionManager>,
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        services: ServiceContext,
        manager: Arc<ConnectionManager>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            services,
            manager,
            config,
        }
    }

    /// Get the service context
    pub fn services(&self) -> &ServiceContext {
        &self.services
    }

    /// Get the connection manager
    pub fn connection_manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("manager", &self.manager)
            .finish()
    }
}
