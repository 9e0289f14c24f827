//! Wires the production collaborators of a client actor

use std::sync::Arc;

use eyre::Result;
use revtrack_core::{
    ClientActorArgs, ExitRestartHandler, LogRestartHandler, RestartHandler, SystemIdentity,
};
use revtrack_exec::LocalRunner;

use crate::config::AgentConfig;
use crate::transport::HttpTransport;

/// Build actor arguments from the agent configuration
///
/// # Errors
/// Returns an error if the client settings are invalid
pub fn build_client_args(config: &AgentConfig) -> Result<ClientActorArgs> {
    config.client.validate()?;

    let transport = HttpTransport::from_config(&config.client)
        .map_err(|e| eyre::eyre!("invalid phonehome endpoint: {e}"))?;

    let restart_handler: Arc<dyn RestartHandler> = if config.external_restart {
        Arc::new(LogRestartHandler)
    } else {
        Arc::new(ExitRestartHandler::new(config.client.restart_delay()))
    };

    Ok(ClientActorArgs {
        config: config.client.clone(),
        runner: Arc::new(LocalRunner::new()),
        transport: Arc::new(transport),
        restart_handler,
        identity: Arc::new(SystemIdentity),
    })
}

#[cfg(test)]
mod tests {
    use revtrack_core::ClientConfig;

    use super::*;

    fn agent_config(client: ClientConfig) -> AgentConfig {
        AgentConfig {
            log_level: "info".to_string(),
            external_restart: true,
            client,
        }
    }

    #[test]
    fn test_builds_args() {
        let config = agent_config(ClientConfig::new("web", "http://localhost:8080/phonehome"));
        let args = build_client_args(&config).unwrap();
        assert_eq!(args.config.package_name, "web");
    }

    #[test]
    fn test_rejects_invalid_client_config() {
        let config = agent_config(ClientConfig::new("", "http://localhost:8080/phonehome"));
        assert!(build_client_args(&config).is_err());
    }
}
