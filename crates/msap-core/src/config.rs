//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration of the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsapConfig {
    /// Node name used in logs and metric labels.
    pub name: String,
    /// Number of request items; bounds requests in flight.
    pub request_items: usize,
    /// Number of indication items; bounds queued indications.
    pub indication_items: usize,
}

impl Default for MsapConfig {
    fn default() -> Self {
        MsapConfig {
            name: "node".to_string(),
            request_items: 2,
            indication_items: 8,
        }
    }
}

impl MsapConfig {
    /// Check that both pools can hold at least one item.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_items == 0 {
            return Err(ConfigError::Invalid("request_items must be at least 1".into()));
        }
        if self.indication_items == 0 {
            return Err(ConfigError::Invalid("indication_items must be at least 1".into()));
        }
        Ok(())
    }
}
