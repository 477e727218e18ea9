//! Simulated node model, loaded from YAML.

use serde::{Deserialize, Serialize};

use msap_protocol::APP_CONFIG_SIZE;

use crate::error::ConfigError;
use crate::permission::Feature;
use crate::platform::NeighborKind;

/// Role a node plays in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Network sink.
    Sink,
    /// Routing node.
    Router,
    /// Non-routing leaf node.
    Leaf,
}

impl NodeRole {
    /// Label used in logs and metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            NodeRole::Sink => "sink",
            NodeRole::Router => "router",
            NodeRole::Leaf => "leaf",
        }
    }
}

/// Neighbor classification as written in YAML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborKindConfig {
    /// Next hop towards a sink.
    NextHop,
    /// Cluster member.
    Member,
    /// Anything else.
    #[default]
    Other,
}

impl From<NeighborKindConfig> for NeighborKind {
    fn from(kind: NeighborKindConfig) -> Self {
        match kind {
            NeighborKindConfig::NextHop => NeighborKind::NextHop,
            NeighborKindConfig::Member => NeighborKind::Member,
            NeighborKindConfig::Other => NeighborKind::Other,
        }
    }
}

/// One neighbor of the simulated node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborConfig {
    pub address: u32,
    pub link_reliability: u8,
    pub norm_rssi: u8,
    pub cost: u8,
    pub channel: u8,
    pub kind: NeighborKindConfig,
    pub tx_power: u8,
    pub rx_power: u8,
    pub last_update: u16,
}

/// App config data the node starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfigSeed {
    pub seq: u8,
    pub interval: u16,
    /// Leading bytes of the config blob; the rest is zero-filled.
    pub data: Vec<u8>,
}

impl Default for AppConfigSeed {
    fn default() -> Self {
        AppConfigSeed {
            seq: 0,
            interval: 60,
            data: Vec::new(),
        }
    }
}

/// Complete model of a simulated node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedNodeConfig {
    /// Node address; unset blocks stack start.
    pub node_address: Option<u32>,
    /// Network address; unset blocks stack start.
    pub network_address: Option<u32>,
    /// Network channel; unset blocks stack start.
    pub network_channel: Option<u8>,
    /// Node role; unset blocks stack start.
    pub role: Option<NodeRole>,
    /// Features locked by the deployment.
    pub locked_features: Vec<Feature>,
    /// Persisted autostart flag; the stack starts on boot when set.
    pub autostart: bool,
    /// Energy level.
    pub energy: u8,
    /// Configured access cycle range in milliseconds.
    pub access_cycle_range: (u16, u16),
    /// Access cycle limits in milliseconds.
    pub access_cycle_limits: (u16, u16),
    /// Total PDU buffers.
    pub pdu_buffers: usize,
    /// PDU buffers in use.
    pub pdu_buffers_in_use: usize,
    /// Neighbor table, visible while the stack runs.
    pub neighbors: Vec<NeighborConfig>,
    /// Routes to sinks, visible while the stack runs.
    pub route_count: usize,
    /// Scratchpad size in bytes.
    pub scratchpad_capacity: u32,
    /// Sink base cost.
    pub sink_cost: u8,
    /// App config data present at boot (sinks only).
    pub app_config: Option<AppConfigSeed>,
    /// Max queuing time for normal priority, in seconds.
    pub queuing_time_normal: u16,
    /// Max queuing time for high priority, in seconds.
    pub queuing_time_high: u16,
    /// Stack firmware version `[major, minor, maint, devel]`.
    pub firmware_version: [u8; 4],
}

impl Default for SimulatedNodeConfig {
    fn default() -> Self {
        SimulatedNodeConfig {
            node_address: None,
            network_address: None,
            network_channel: None,
            role: None,
            locked_features: Vec::new(),
            autostart: false,
            energy: 0,
            access_cycle_range: (2000, 8000),
            access_cycle_limits: (2000, 8000),
            pdu_buffers: 32,
            pdu_buffers_in_use: 0,
            neighbors: Vec::new(),
            route_count: 0,
            scratchpad_capacity: 0x0004_0000,
            sink_cost: 0,
            app_config: None,
            queuing_time_normal: 1200,
            queuing_time_high: 600,
            firmware_version: [5, 1, 0, 0],
        }
    }
}

impl SimulatedNodeConfig {
    /// Parse a node model from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: SimulatedNodeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the model for contradictions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pdu_buffers_in_use > self.pdu_buffers {
            return Err(ConfigError::Invalid(format!(
                "pdu_buffers_in_use ({}) exceeds pdu_buffers ({})",
                self.pdu_buffers_in_use, self.pdu_buffers
            )));
        }
        let (min, max) = self.access_cycle_limits;
        if min > max {
            return Err(ConfigError::Invalid(format!(
                "access_cycle_limits min {} exceeds max {}",
                min, max
            )));
        }
        if let Some(seed) = &self.app_config {
            if seed.data.len() > APP_CONFIG_SIZE {
                return Err(ConfigError::Invalid(format!(
                    "app_config data is {} bytes, at most {} allowed",
                    seed.data.len(),
                    APP_CONFIG_SIZE
                )));
            }
        }
        if self.scratchpad_capacity % 16 != 0 {
            return Err(ConfigError::Invalid(
                "scratchpad_capacity must be a multiple of 16".into(),
            ));
        }
        Ok(())
    }

    /// A configured router that can start right away.
    pub fn router(node_address: u32) -> Self {
        SimulatedNodeConfig {
            node_address: Some(node_address),
            network_address: Some(0x00AB_CDEF),
            network_channel: Some(5),
            role: Some(NodeRole::Router),
            ..Default::default()
        }
    }

    /// A configured sink with app config data present.
    pub fn sink(node_address: u32) -> Self {
        SimulatedNodeConfig {
            role: Some(NodeRole::Sink),
            app_config: Some(AppConfigSeed::default()),
            ..SimulatedNodeConfig::router(node_address)
        }
    }
}
