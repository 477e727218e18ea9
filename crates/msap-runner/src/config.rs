//! Runner configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use msap_core::sim::SimulatedNodeConfig;
use msap_core::{ConfigError, MsapConfig};

/// Default management port address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:5150";

/// Everything the runner needs: where to listen, how to size the engine,
/// and the node to simulate.
///
/// ```yaml
/// listen: 127.0.0.1:5150
/// msap:
///   name: router-1
///   indication_items: 8
/// node:
///   node_address: 1
///   network_address: 0xABCDEF
///   network_channel: 5
///   role: router
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// TCP address of the management port.
    pub listen: String,
    /// Engine settings.
    pub msap: MsapConfig,
    /// Simulated node model.
    pub node: SimulatedNodeConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            listen: DEFAULT_LISTEN.to_string(),
            msap: MsapConfig::default(),
            node: SimulatedNodeConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Parse and validate a configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RunnerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.is_empty() {
            return Err(ConfigError::Invalid("listen address is empty".into()));
        }
        self.msap.validate()?;
        self.node.validate()
    }
}
