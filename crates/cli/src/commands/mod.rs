//! CLI subcommands and the wiring they share.

pub mod config_cmd;
pub mod serve;
pub mod tools;

use std::sync::Arc;

use mcremote_config::{AppConfig, ConfigError};
use mcremote_core::{GameConnector, Session};
use mcremote_gateway::McpServer;
use mcremote_sim::{SimConnector, SimWorld};

/// Load the configuration, applying a backend override from the command line.
pub fn load_config(backend: Option<String>) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::load()?;
    if let Some(kind) = backend {
        config.backend.kind = kind;
        config.validate()?;
    }
    Ok(config)
}

/// The game connector for the configured backend.
pub fn connector_for(config: &AppConfig) -> Result<Arc<dyn GameConnector>, ConfigError> {
    match config.backend.kind.as_str() {
        "sim" => Ok(Arc::new(SimConnector::new(SimWorld::demo()))),
        other => Err(ConfigError::ValidationError(format!(
            "unknown backend '{other}'"
        ))),
    }
}

/// Build the session, register every tool once, and wrap it in the server.
pub fn build_server(config: &AppConfig) -> Result<McpServer, ConfigError> {
    let connector = connector_for(config)?;
    let session = Arc::new(Session::new());
    let registry = mcremote_tools::default_registry(session, connector, config);
    Ok(McpServer::new(registry, config.server.clone()))
}
