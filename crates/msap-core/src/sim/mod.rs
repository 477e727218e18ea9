//! Deterministic in-memory node.
//!
//! [`SimulatedNode`] implements every collaborator trait the engine needs,
//! so the engine can be driven end to end without radio hardware. The
//! stack lifecycle honours its start preconditions, the scratchpad runs a
//! real write state machine, and asynchronous stack activity (scan
//! completion, state changes, app config pushed by the network) is queued
//! as [`NodeEvent`]s for the caller to turn into indications.

mod config;
mod scratchpad;

pub use config::{AppConfigSeed, NeighborConfig, NeighborKindConfig, NodeRole, SimulatedNodeConfig};
pub use scratchpad::{Scratchpad, ScratchpadState};

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use msap_protocol::{
    AppConfig, FirmwareVersion, Priority, ScratchpadStatus, APP_CONFIG_SIZE, MAX_MULTICAST_GROUPS,
};

use crate::error::{AppConfigError, StackError};
use crate::permission::{Feature, LockBitmap, LockBits};
use crate::platform::*;

/// Supported diagnostic intervals for app config data, in seconds.
pub const DIAGNOSTIC_INTERVALS: [u16; 7] = [10, 30, 60, 120, 300, 600, 1800];

/// Access cycle values the stack can run, in milliseconds.
pub const ACCESS_CYCLES: [u16; 3] = [2000, 4000, 8000];

/// Shortest sleep the stack accepts, in seconds.
pub const MIN_SLEEP_SECONDS: u32 = 10;
/// Longest sleep the stack accepts, in seconds (30 days).
pub const MAX_SLEEP_SECONDS: u32 = 2_592_000;

/// Shortest max queuing time, in seconds.
pub const MIN_QUEUING_TIME: u16 = 2;

/// Reserved app config sequence number.
const APP_CONFIG_SEQ_RESERVED: u8 = 255;

/// Asynchronous activity of the simulated stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// The stack started or stopped.
    StackStateChanged,
    /// A neighbor scan finished.
    ScanComplete,
    /// New app config data arrived from the network.
    AppConfigReceived(AppConfig),
}

/// A simulated node.
#[derive(Debug)]
pub struct SimulatedNode {
    name: String,
    node_address: Option<u32>,
    network_address: Option<u32>,
    network_channel: Option<u8>,
    role: Option<NodeRole>,
    lock_bits: LockBitmap,
    autostart: bool,
    started: bool,
    energy: u8,
    access_cycle_range: (u16, u16),
    access_cycle_limits: (u16, u16),
    pdu_buffers: usize,
    pdu_buffers_in_use: usize,
    neighbors: Vec<NeighborInfo>,
    neighbor_table_unavailable: bool,
    route_count: usize,
    multicast_groups: [u32; MAX_MULTICAST_GROUPS],
    sink_cost: u8,
    app_config: Option<AppConfig>,
    queuing_time: [u16; 2],
    data_plane_indications: usize,
    firmware: FirmwareVersion,
    scratchpad: Scratchpad,
    sleep_until: Option<Duration>,
    latest_gotosleep: u32,
    epoch: Instant,
    time_offset: Duration,
    reboots: u32,
    events: Vec<NodeEvent>,
}

impl Default for SimulatedNode {
    fn default() -> Self {
        SimulatedNode::new("node", &SimulatedNodeConfig::default())
    }
}

impl SimulatedNode {
    /// Boot a node from its model. A node with autostart set tries to start
    /// its stack right away, without raising an event.
    pub fn new(name: impl Into<String>, config: &SimulatedNodeConfig) -> Self {
        let [major, minor, maint, devel] = config.firmware_version;
        let app_config = config.app_config.as_ref().map(|seed| {
            let mut data = [0u8; APP_CONFIG_SIZE];
            let len = seed.data.len().min(APP_CONFIG_SIZE);
            data[..len].copy_from_slice(&seed.data[..len]);
            AppConfig {
                seq: seed.seq,
                interval: seed.interval,
                data,
            }
        });
        let neighbors = config
            .neighbors
            .iter()
            .map(|n| NeighborInfo {
                address: n.address,
                link_reliability: n.link_reliability,
                norm_rssi: n.norm_rssi,
                cost: n.cost,
                channel: n.channel,
                kind: n.kind.into(),
                tx_power: n.tx_power,
                rx_power: n.rx_power,
                last_update: n.last_update,
            })
            .collect();

        let mut node = SimulatedNode {
            name: name.into(),
            node_address: config.node_address,
            network_address: config.network_address,
            network_channel: config.network_channel,
            role: config.role,
            lock_bits: LockBitmap::locking(&config.locked_features),
            autostart: config.autostart,
            started: false,
            energy: config.energy,
            access_cycle_range: config.access_cycle_range,
            access_cycle_limits: config.access_cycle_limits,
            pdu_buffers: config.pdu_buffers,
            pdu_buffers_in_use: config.pdu_buffers_in_use.min(config.pdu_buffers),
            neighbors,
            neighbor_table_unavailable: false,
            route_count: config.route_count,
            multicast_groups: [0; MAX_MULTICAST_GROUPS],
            sink_cost: config.sink_cost,
            app_config,
            queuing_time: [config.queuing_time_normal, config.queuing_time_high],
            data_plane_indications: 0,
            firmware: FirmwareVersion {
                major,
                minor,
                maint,
                devel,
            },
            scratchpad: Scratchpad::new(config.scratchpad_capacity),
            sleep_until: None,
            latest_gotosleep: 0,
            epoch: Instant::now(),
            time_offset: Duration::ZERO,
            reboots: 0,
            events: Vec::new(),
        };
        node.boot();
        node
    }

    /// Node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured role.
    pub fn role(&self) -> Option<NodeRole> {
        self.role
    }

    /// Whether the stack is running.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of reboots since creation.
    pub fn reboots(&self) -> u32 {
        self.reboots
    }

    /// Scratchpad write state.
    pub fn scratchpad_state(&self) -> ScratchpadState {
        self.scratchpad.state()
    }

    /// Current lock bitmap.
    pub fn lock_bits(&self) -> LockBitmap {
        self.lock_bits
    }

    /// Replace the lock bitmap.
    pub fn set_lock_bits(&mut self, lock_bits: LockBitmap) {
        self.lock_bits = lock_bits;
    }

    /// Lock one feature.
    pub fn lock(&mut self, feature: Feature) {
        self.lock_bits.lock(feature);
    }

    /// Make neighbor table queries fail.
    pub fn set_neighbor_table_unavailable(&mut self, unavailable: bool) {
        self.neighbor_table_unavailable = unavailable;
    }

    /// Set the number of indications waiting in the data plane.
    pub fn set_data_plane_indications(&mut self, count: usize) {
        self.data_plane_indications = count;
    }

    /// App config data pushed by the network.
    pub fn receive_app_config(&mut self, config: AppConfig) {
        debug!(seq = config.seq, "app config received from network");
        self.app_config = Some(config.clone());
        self.events.push(NodeEvent::AppConfigReceived(config));
    }

    /// Move the simulated clock forward.
    pub fn advance_time(&mut self, by: Duration) {
        self.time_offset += by;
    }

    /// Drain asynchronous events raised since the last call.
    pub fn take_events(&mut self) -> Vec<NodeEvent> {
        std::mem::take(&mut self.events)
    }

    fn now(&self) -> Duration {
        self.epoch.elapsed() + self.time_offset
    }

    fn boot(&mut self) {
        if self.autostart {
            if let Err(err) = self.try_start() {
                warn!(node = %self.name, %err, "autostart failed");
            }
        }
    }

    /// Start the stack if its preconditions hold. Returns whether it was
    /// started by this call.
    fn try_start(&mut self) -> StackResult<bool> {
        if self.started {
            return Ok(false);
        }
        let status = self.stack_state();
        if status.node_address_not_set
            || status.network_address_not_set
            || status.network_channel_not_set
            || status.role_not_set
            || status.app_config_missing
        {
            debug!(node = %self.name, ?status, "stack start preconditions not met");
            return Err(StackError::InvalidStackState);
        }
        self.started = true;
        info!(node = %self.name, "stack started");
        Ok(true)
    }

    fn require_started(&self) -> StackResult<()> {
        if self.started {
            Ok(())
        } else {
            Err(StackError::InvalidStackState)
        }
    }

    fn require_sink(&self) -> StackResult<()> {
        if self.role == Some(NodeRole::Sink) {
            Ok(())
        } else {
            Err(StackError::InvalidConfiguration)
        }
    }
}

// ============================================================================
// Collaborator Implementations
// ============================================================================

impl NetworkStack for SimulatedNode {
    fn start_stack(&mut self) -> StackResult<()> {
        if self.try_start()? {
            self.events.push(NodeEvent::StackStateChanged);
        }
        Ok(())
    }

    fn stop_stack(&mut self) {
        self.reboots += 1;
        self.started = false;
        self.sleep_until = None;
        info!(node = %self.name, reboots = self.reboots, "node rebooting");
        self.scratchpad.process_on_boot();
        self.boot();
        self.events.push(NodeEvent::StackStateChanged);
    }

    fn stack_state(&self) -> StackStatus {
        if self.started {
            return StackStatus::default();
        }
        StackStatus {
            stopped: true,
            network_address_not_set: self.network_address.is_none(),
            node_address_not_set: self.node_address.is_none(),
            network_channel_not_set: self.network_channel.is_none(),
            role_not_set: self.role.is_none(),
            app_config_missing: self.role == Some(NodeRole::Sink) && self.app_config.is_none(),
            access_denied: !self.lock_bits.permits(Feature::StackStart),
        }
    }

    fn firmware_version(&self) -> FirmwareVersion {
        self.firmware
    }

    fn energy(&self) -> StackResult<u8> {
        Ok(self.energy)
    }

    fn set_energy(&mut self, energy: u8) -> StackResult<()> {
        self.energy = energy;
        Ok(())
    }

    fn route_count(&self) -> StackResult<usize> {
        self.require_started()?;
        Ok(self.route_count)
    }

    fn access_cycle(&self) -> StackResult<u16> {
        self.require_started()?;
        Ok(self.access_cycle_range.1)
    }

    fn sink_cost(&self) -> StackResult<u8> {
        self.require_sink()?;
        Ok(self.sink_cost)
    }

    fn set_sink_cost(&mut self, cost: u8) -> StackResult<()> {
        self.require_sink()?;
        self.sink_cost = cost;
        Ok(())
    }

    fn neighbors(&self) -> StackResult<Vec<NeighborInfo>> {
        if self.neighbor_table_unavailable {
            return Err(StackError::Unspecified);
        }
        if !self.started {
            return Ok(Vec::new());
        }
        Ok(self.neighbors.clone())
    }

    fn start_neighbor_scan(&mut self) -> StackResult<()> {
        self.require_started()?;
        self.events.push(NodeEvent::ScanComplete);
        Ok(())
    }
}

impl StackSettings for SimulatedNode {
    fn access_cycle_range(&self) -> StackResult<(u16, u16)> {
        Ok(self.access_cycle_range)
    }

    fn set_access_cycle_range(&mut self, min: u16, max: u16) -> StackResult<()> {
        let (low, high) = self.access_cycle_limits;
        let valid = |v: u16| ACCESS_CYCLES.contains(&v) && (low..=high).contains(&v);
        if !valid(min) || !valid(max) || min > max {
            return Err(StackError::InvalidValue);
        }
        self.access_cycle_range = (min, max);
        Ok(())
    }

    fn access_cycle_limits(&self) -> StackResult<(u16, u16)> {
        Ok(self.access_cycle_limits)
    }

    fn multicast_groups(&self) -> StackResult<Vec<u32>> {
        Ok(self.multicast_groups.to_vec())
    }

    fn set_multicast_groups(&mut self, groups: &[u32]) -> StackResult<()> {
        if groups.len() > MAX_MULTICAST_GROUPS {
            return Err(StackError::InvalidValue);
        }
        // Unused slots are zero; used slots must be multicast addresses.
        if groups.iter().any(|&g| g != 0 && g & 0x8000_0000 == 0) {
            return Err(StackError::InvalidValue);
        }
        self.multicast_groups = [0; MAX_MULTICAST_GROUPS];
        self.multicast_groups[..groups.len()].copy_from_slice(groups);
        Ok(())
    }
}

impl DataPlane for SimulatedNode {
    fn read_app_config(&self) -> Result<AppConfig, AppConfigError> {
        self.app_config.clone().ok_or(AppConfigError::NotSet)
    }

    fn write_app_config(&mut self, config: &AppConfig) -> Result<(), AppConfigError> {
        if self.role != Some(NodeRole::Sink) {
            return Err(AppConfigError::InvalidRole);
        }
        if !DIAGNOSTIC_INTERVALS.contains(&config.interval) {
            return Err(AppConfigError::InvalidInterval);
        }
        if config.seq == APP_CONFIG_SEQ_RESERVED {
            return Err(AppConfigError::InvalidSeq);
        }
        self.app_config = Some(config.clone());
        Ok(())
    }

    fn num_buffers(&self) -> usize {
        self.pdu_buffers
    }

    fn num_free_buffers(&self) -> StackResult<usize> {
        Ok(self.pdu_buffers - self.pdu_buffers_in_use)
    }

    fn max_queuing_time(&self, priority: Priority) -> StackResult<u16> {
        Ok(self.queuing_time[priority as usize])
    }

    fn set_max_queuing_time(&mut self, priority: Priority, time: u16) -> StackResult<()> {
        if self.started {
            return Err(StackError::InvalidStackState);
        }
        if time < MIN_QUEUING_TIME {
            return Err(StackError::InvalidValue);
        }
        self.queuing_time[priority as usize] = time;
        Ok(())
    }

    fn queued_indications(&self) -> usize {
        self.data_plane_indications
    }
}

impl Otap for SimulatedNode {
    fn clear(&mut self) {
        info!(node = %self.name, "clearing scratchpad");
        self.scratchpad.clear();
    }

    fn begin(&mut self, num_bytes: u32, seq: u8) -> StackResult<()> {
        self.scratchpad.begin(num_bytes, seq)
    }

    fn write(&mut self, start: u32, bytes: &[u8]) -> OtapWrite {
        self.scratchpad.write(start, bytes)
    }

    fn set_to_be_processed(&mut self) -> StackResult<()> {
        self.scratchpad.set_to_be_processed()
    }

    fn scratchpad_status(&self) -> ScratchpadStatus {
        self.scratchpad.status()
    }
}

impl Persistence for SimulatedNode {
    fn autostart(&self) -> bool {
        self.autostart
    }

    fn set_autostart(&mut self, autostart: bool) -> StackResult<()> {
        self.autostart = autostart;
        Ok(())
    }
}

impl LockBits for SimulatedNode {
    fn is_feature_permitted(&self, feature: Feature) -> bool {
        self.lock_bits.permits(feature)
    }
}

impl SleepControl for SimulatedNode {
    fn sleep_for(&mut self, seconds: u32, ignore_app_config_interval: bool) -> StackResult<()> {
        if self.role == Some(NodeRole::Sink) {
            return Err(StackError::InvalidConfiguration);
        }
        self.require_started()?;
        if !(MIN_SLEEP_SECONDS..=MAX_SLEEP_SECONDS).contains(&seconds) {
            return Err(StackError::InvalidValue);
        }
        let mut seconds = seconds;
        if !ignore_app_config_interval {
            if let Some(config) = &self.app_config {
                seconds = seconds.min(u32::from(config.interval).max(MIN_SLEEP_SECONDS));
            }
        }
        self.sleep_until = Some(self.now() + Duration::from_secs(u64::from(seconds)));
        self.latest_gotosleep = seconds;
        Ok(())
    }

    fn wakeup(&mut self) -> StackResult<()> {
        if !self.is_sleeping() {
            return Err(StackError::InvalidStackState);
        }
        self.sleep_until = None;
        Ok(())
    }

    fn is_sleeping(&self) -> bool {
        self.sleep_until.is_some_and(|until| self.now() < until)
    }

    fn wakeup_countdown(&self) -> u32 {
        self.sleep_until
            .and_then(|until| until.checked_sub(self.now()))
            .map_or(0, |left| left.as_secs() as u32)
    }

    fn latest_gotosleep(&self) -> u32 {
        self.latest_gotosleep
    }
}

impl Clock for SimulatedNode {
    fn coarse_timestamp(&self) -> u32 {
        (self.now().as_micros() >> 13) as u32
    }
}
