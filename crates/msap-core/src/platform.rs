//! Collaborator interfaces consumed by the engine.
//!
//! The engine never talks to a concrete network stack. Everything it needs
//! is expressed as a small capability trait; [`Platform`] bundles them so a
//! single value can be injected into [`crate::Msap`].

use msap_protocol::{AppConfig, FirmwareVersion, Priority, ScratchpadStatus, StackStateFlags};

use crate::error::{AppConfigError, StackError};
use crate::permission::LockBits;

/// Result of a stack collaborator call.
pub type StackResult<T> = Result<T, StackError>;

// ============================================================================
// Stack Lifecycle
// ============================================================================

/// Why the stack is not running.
///
/// All fields false means the stack is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackStatus {
    /// Stack is stopped.
    pub stopped: bool,
    /// Network address has not been set.
    pub network_address_not_set: bool,
    /// Node address has not been set.
    pub node_address_not_set: bool,
    /// Network channel has not been set.
    pub network_channel_not_set: bool,
    /// Node role has not been set.
    pub role_not_set: bool,
    /// App config data is missing (sinks only).
    pub app_config_missing: bool,
    /// Starting is not permitted.
    pub access_denied: bool,
}

impl StackStatus {
    /// Whether the stack is running.
    pub fn is_started(&self) -> bool {
        *self == StackStatus::default()
    }
}

impl From<StackStatus> for StackStateFlags {
    fn from(status: StackStatus) -> Self {
        let mut flags = StackStateFlags::STARTED;
        let bits = [
            (status.stopped, StackStateFlags::STOPPED),
            (status.network_address_not_set, StackStateFlags::NETWORK_ADDRESS_NOT_SET),
            (status.node_address_not_set, StackStateFlags::NODE_ADDRESS_NOT_SET),
            (status.network_channel_not_set, StackStateFlags::NETWORK_CHANNEL_NOT_SET),
            (status.role_not_set, StackStateFlags::ROLE_NOT_SET),
            (status.app_config_missing, StackStateFlags::APP_CONFIG_MISSING),
            (status.access_denied, StackStateFlags::ACCESS_DENIED),
        ];
        for (set, flag) in bits {
            if set {
                flags |= flag;
            }
        }
        flags
    }
}

/// How the stack classifies a neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborKind {
    /// Next hop towards a sink.
    NextHop,
    /// Member of this node's cluster.
    Member,
    /// Any other neighbor.
    Other,
}

/// Neighbor record as reported by the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborInfo {
    /// Neighbor address.
    pub address: u32,
    /// Link reliability (0-255).
    pub link_reliability: u8,
    /// Normalized RSSI.
    pub norm_rssi: u8,
    /// Route cost through this neighbor.
    pub cost: u8,
    /// Radio channel.
    pub channel: u8,
    /// Classification.
    pub kind: NeighborKind,
    /// Transmit power level.
    pub tx_power: u8,
    /// Receive power level.
    pub rx_power: u8,
    /// Seconds since the entry was last updated.
    pub last_update: u16,
}

/// Stack lifecycle and routing state.
pub trait NetworkStack {
    /// Try to start the stack.
    fn start_stack(&mut self) -> StackResult<()>;

    /// Stop the stack. This reboots the node.
    fn stop_stack(&mut self);

    /// Current stack state.
    fn stack_state(&self) -> StackStatus;

    /// Running stack firmware version.
    fn firmware_version(&self) -> FirmwareVersion;

    /// Energy level.
    fn energy(&self) -> StackResult<u8>;

    /// Set the energy level.
    fn set_energy(&mut self, energy: u8) -> StackResult<()>;

    /// Number of routes to sinks.
    fn route_count(&self) -> StackResult<usize>;

    /// Access cycle currently in use, in milliseconds.
    fn access_cycle(&self) -> StackResult<u16>;

    /// Sink base cost.
    fn sink_cost(&self) -> StackResult<u8>;

    /// Set the sink base cost.
    fn set_sink_cost(&mut self, cost: u8) -> StackResult<()>;

    /// Snapshot of the neighbor table.
    fn neighbors(&self) -> StackResult<Vec<NeighborInfo>>;

    /// Start an asynchronous neighbor scan.
    fn start_neighbor_scan(&mut self) -> StackResult<()>;
}

/// Persistent stack settings.
pub trait StackSettings {
    /// Configured access cycle range `(min, max)` in milliseconds.
    fn access_cycle_range(&self) -> StackResult<(u16, u16)>;

    /// Set the access cycle range.
    fn set_access_cycle_range(&mut self, min: u16, max: u16) -> StackResult<()>;

    /// Access cycle limits `(min, max)` in milliseconds.
    fn access_cycle_limits(&self) -> StackResult<(u16, u16)>;

    /// Multicast group addresses; unused slots are zero.
    fn multicast_groups(&self) -> StackResult<Vec<u32>>;

    /// Replace the multicast group set.
    fn set_multicast_groups(&mut self, groups: &[u32]) -> StackResult<()>;
}

/// Data plane configuration.
pub trait DataPlane {
    /// Stored app config data.
    fn read_app_config(&self) -> Result<AppConfig, AppConfigError>;

    /// Store new app config data.
    fn write_app_config(&mut self, config: &AppConfig) -> Result<(), AppConfigError>;

    /// Total number of PDU buffers.
    fn num_buffers(&self) -> usize;

    /// Number of free PDU buffers.
    fn num_free_buffers(&self) -> StackResult<usize>;

    /// Max message queuing time for a priority class, in seconds.
    fn max_queuing_time(&self, priority: Priority) -> StackResult<u16>;

    /// Set the max message queuing time for a priority class.
    fn set_max_queuing_time(&mut self, priority: Priority, time: u16) -> StackResult<()>;

    /// Indications waiting in the data plane, outside this engine.
    fn queued_indications(&self) -> usize;
}

/// Result of writing one scratchpad block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtapWrite {
    /// Block accepted, more expected.
    Ok,
    /// Final block accepted, image is valid.
    CompletedOk,
    /// Final block accepted, image is not valid.
    CompletedError,
    /// No write is ongoing.
    NotOngoing,
    /// Start address does not continue the image.
    InvalidStart,
    /// Block length is not acceptable.
    InvalidNumBytes,
    /// Image header is not acceptable.
    InvalidHeader,
    /// Block data is missing.
    InvalidNullBytes,
}

/// Over-the-air programming (scratchpad) subsystem.
pub trait Otap {
    /// Erase the scratchpad. May block for seconds.
    fn clear(&mut self);

    /// Begin writing an image of `num_bytes` bytes, clearing any old image.
    fn begin(&mut self, num_bytes: u32, seq: u8) -> StackResult<()>;

    /// Write one block at `start`.
    fn write(&mut self, start: u32, bytes: &[u8]) -> OtapWrite;

    /// Mark the stored image to be processed on next boot.
    fn set_to_be_processed(&mut self) -> StackResult<()>;

    /// Scratchpad status. The firmware version fields are left at zero.
    fn scratchpad_status(&self) -> ScratchpadStatus;
}

/// Persistent node flags.
pub trait Persistence {
    /// Stored autostart flag.
    fn autostart(&self) -> bool;

    /// Store the autostart flag.
    fn set_autostart(&mut self, autostart: bool) -> StackResult<()>;
}

/// Low-power sleep control.
pub trait SleepControl {
    /// Sleep for `seconds`.
    fn sleep_for(&mut self, seconds: u32, ignore_app_config_interval: bool) -> StackResult<()>;

    /// Wake immediately.
    fn wakeup(&mut self) -> StackResult<()>;

    /// Whether the stack is sleeping.
    fn is_sleeping(&self) -> bool;

    /// Seconds until wakeup.
    fn wakeup_countdown(&self) -> u32;

    /// Countdown recorded when the stack last went to sleep.
    fn latest_gotosleep(&self) -> u32;
}

/// Coarse system clock.
pub trait Clock {
    /// Coarse timestamp in ticks of 8192 microseconds.
    fn coarse_timestamp(&self) -> u32;
}

/// Every collaborator the engine needs.
pub trait Platform:
    NetworkStack + StackSettings + DataPlane + Otap + Persistence + LockBits + SleepControl + Clock
{
}

impl<T> Platform for T where
    T: NetworkStack
        + StackSettings
        + DataPlane
        + Otap
        + Persistence
        + LockBits
        + SleepControl
        + Clock
{
}
