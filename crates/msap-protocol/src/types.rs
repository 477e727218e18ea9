//! Common types used in the protocol.

use bytes::{Buf, BufMut};

use crate::constants::*;
use crate::error::ProtocolError;

/// Declares a one-byte result enumeration with its wire values.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ProtocolError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                $(
                    if value == $name::$variant as u8 {
                        return Ok($name::$variant);
                    }
                )+
                Err(ProtocolError::invalid_field(stringify!($name), value))
            }
        }
    };
}

// ============================================================================
// Function Codes
// ============================================================================

wire_enum! {
    /// Request function codes accepted by the node.
    pub enum RequestCode {
        /// Poll for pending indications.
        IndicationPoll = FUNC_INDICATION_POLL_REQ,
        /// Start the stack.
        StackStart = FUNC_STACK_START_REQ,
        /// Stop the stack.
        StackStop = FUNC_STACK_STOP_REQ,
        /// Write an attribute.
        AttributeWrite = FUNC_ATTR_WRITE_REQ,
        /// Read an attribute.
        AttributeRead = FUNC_ATTR_READ_REQ,
        /// Begin a scratchpad write session.
        ScratchpadStart = FUNC_SCRATCHPAD_START_REQ,
        /// Write one scratchpad block.
        ScratchpadBlock = FUNC_SCRATCHPAD_BLOCK_REQ,
        /// Query scratchpad status.
        ScratchpadStatus = FUNC_SCRATCHPAD_STATUS_REQ,
        /// Mark the scratchpad bootable.
        ScratchpadBootable = FUNC_SCRATCHPAD_BOOTABLE_REQ,
        /// Erase the scratchpad.
        ScratchpadClear = FUNC_SCRATCHPAD_CLEAR_REQ,
        /// Remote status (retired).
        RemoteStatus = FUNC_REMOTE_STATUS_REQ,
        /// Remote update (retired).
        RemoteUpdate = FUNC_REMOTE_UPDATE_REQ,
        /// Read the neighbor table.
        GetNeighbors = FUNC_GET_NBORS_REQ,
        /// Start a neighbor scan.
        ScanNeighbors = FUNC_SCAN_NBORS_REQ,
        /// Write the sink cost.
        SinkCostWrite = FUNC_SINK_COST_WRITE_REQ,
        /// Read the sink cost.
        SinkCostRead = FUNC_SINK_COST_READ_REQ,
        /// Write app config data.
        AppConfigWrite = FUNC_APP_CONFIG_WRITE_REQ,
        /// Read app config data.
        AppConfigRead = FUNC_APP_CONFIG_READ_REQ,
        /// Enter sleep.
        Sleep = FUNC_STACK_SLEEP_REQ,
        /// Wake up.
        SleepStop = FUNC_STACK_SLEEP_STOP_REQ,
        /// Query sleep state.
        SleepState = FUNC_STACK_SLEEP_STATE_GET_REQ,
        /// Query last go-to-sleep countdown.
        GotoSleepInfo = FUNC_STACK_SLEEP_GOTOSLEEP_INFO_REQ,
        /// Write max queuing time.
        QueuingTimeWrite = FUNC_MAX_QUEUING_TIME_WRITE_REQ,
        /// Read max queuing time.
        QueuingTimeRead = FUNC_MAX_QUEUING_TIME_READ_REQ,
    }
}

impl RequestCode {
    /// Function code of the matching confirm.
    pub fn confirm_code(self) -> u8 {
        u8::from(self) | CONFIRM_BIT
    }

    /// Look up the request a confirm code answers.
    pub fn from_confirm(code: u8) -> Result<Self, ProtocolError> {
        if code & CONFIRM_BIT == 0 {
            return Err(ProtocolError::UnknownConfirm(code));
        }
        RequestCode::try_from(code & !CONFIRM_BIT)
            .map_err(|_| ProtocolError::UnknownConfirm(code))
    }

    /// Short name for logs and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            RequestCode::IndicationPoll => "indication_poll",
            RequestCode::StackStart => "stack_start",
            RequestCode::StackStop => "stack_stop",
            RequestCode::AttributeWrite => "attribute_write",
            RequestCode::AttributeRead => "attribute_read",
            RequestCode::ScratchpadStart => "scratchpad_start",
            RequestCode::ScratchpadBlock => "scratchpad_block",
            RequestCode::ScratchpadStatus => "scratchpad_status",
            RequestCode::ScratchpadBootable => "scratchpad_bootable",
            RequestCode::ScratchpadClear => "scratchpad_clear",
            RequestCode::RemoteStatus => "remote_status",
            RequestCode::RemoteUpdate => "remote_update",
            RequestCode::GetNeighbors => "get_neighbors",
            RequestCode::ScanNeighbors => "scan_neighbors",
            RequestCode::SinkCostWrite => "sink_cost_write",
            RequestCode::SinkCostRead => "sink_cost_read",
            RequestCode::AppConfigWrite => "app_config_write",
            RequestCode::AppConfigRead => "app_config_read",
            RequestCode::Sleep => "sleep",
            RequestCode::SleepStop => "sleep_stop",
            RequestCode::SleepState => "sleep_state",
            RequestCode::GotoSleepInfo => "gotosleep_info",
            RequestCode::QueuingTimeWrite => "queuing_time_write",
            RequestCode::QueuingTimeRead => "queuing_time_read",
        }
    }
}

wire_enum! {
    /// Indication function codes sent by the node.
    pub enum IndicationCode {
        /// Stack state changed.
        StackState = FUNC_STACK_STATE_IND,
        /// Neighbor scan completed.
        ScanNeighbors = FUNC_SCAN_NBORS_IND,
        /// App config data received.
        AppConfigReceived = FUNC_APP_CONFIG_RX_IND,
    }
}

// ============================================================================
// Stack State Flags
// ============================================================================

/// Why the stack is not running, as a bitmask.
///
/// Several preconditions can be unmet at once, so this is not an enum.
/// An empty set means the stack is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StackStateFlags(u8);

impl StackStateFlags {
    /// Stack is running.
    pub const STARTED: StackStateFlags = StackStateFlags(0);
    /// Stack is stopped.
    pub const STOPPED: StackStateFlags = StackStateFlags(1);
    /// Network (radio) address has not been set.
    pub const NETWORK_ADDRESS_NOT_SET: StackStateFlags = StackStateFlags(2);
    /// Node address has not been set.
    pub const NODE_ADDRESS_NOT_SET: StackStateFlags = StackStateFlags(4);
    /// Network channel has not been set.
    pub const NETWORK_CHANNEL_NOT_SET: StackStateFlags = StackStateFlags(8);
    /// Node role has not been set.
    pub const ROLE_NOT_SET: StackStateFlags = StackStateFlags(16);
    /// App config data has not been received.
    pub const APP_CONFIG_MISSING: StackStateFlags = StackStateFlags(32);
    /// Starting the stack is not permitted.
    pub const ACCESS_DENIED: StackStateFlags = StackStateFlags(128);

    /// Build from raw bits.
    pub const fn from_bits(bits: u8) -> Self {
        StackStateFlags(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the flags describe a running stack.
    pub const fn is_started(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: StackStateFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for StackStateFlags {
    type Output = StackStateFlags;

    fn bitor(self, rhs: StackStateFlags) -> StackStateFlags {
        StackStateFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for StackStateFlags {
    fn bitor_assign(&mut self, rhs: StackStateFlags) {
        self.0 |= rhs.0;
    }
}

// ============================================================================
// Result Codes
// ============================================================================

wire_enum! {
    /// Result of an attribute read or write.
    pub enum AttributeResult {
        /// Success.
        Success = 0,
        /// Attribute id is unknown or retired.
        UnsupportedAttribute = 1,
        /// Stack is in the wrong state for this attribute.
        InvalidStackState = 2,
        /// Value length does not match the attribute size.
        InvalidLength = 3,
        /// Value is out of range.
        InvalidValue = 4,
        /// Operation is not permitted.
        AccessDenied = 6,
    }
}

wire_enum! {
    /// Result of a stack stop request.
    pub enum StackStopResult {
        /// Stack stopped; the node reboots.
        Ok = 0,
        /// Stack was already stopped; the node still reboots.
        AlreadyStopped = 1,
        /// Operation is not permitted.
        AccessDenied = 128,
    }
}

wire_enum! {
    /// Result of a sink cost read or write.
    pub enum SinkCostResult {
        /// Success.
        Ok = 0,
        /// Node is not a sink.
        InvalidRole = 1,
        /// Operation is not permitted.
        AccessDenied = 2,
    }
}

wire_enum! {
    /// Result of an app config read.
    pub enum AppConfigReadResult {
        /// Success.
        Success = 0,
        /// No app config data has been set.
        Failure = 1,
        /// Operation is not permitted.
        AccessDenied = 2,
    }
}

wire_enum! {
    /// Result of an app config write.
    pub enum AppConfigWriteResult {
        /// Success.
        Success = 0,
        /// Only sinks may write app config data.
        NotSink = 1,
        /// Diagnostic interval is not supported.
        InvalidInterval = 2,
        /// Sequence number is not valid.
        InvalidSeq = 3,
        /// Operation is not permitted.
        AccessDenied = 4,
    }
}

wire_enum! {
    /// Result of a scratchpad clear.
    pub enum ScratchpadClearResult {
        /// Scratchpad erased.
        Success = 0,
        /// Stack is running.
        InvalidState = 1,
        /// Operation is not permitted.
        AccessDenied = 2,
    }
}

wire_enum! {
    /// Result of a scratchpad start.
    pub enum ScratchpadStartResult {
        /// Write session started.
        Success = 0,
        /// Stack is running.
        InvalidState = 1,
        /// Image size is not acceptable.
        InvalidNumBytes = 2,
        /// Operation is not permitted.
        AccessDenied = 3,
    }
}

wire_enum! {
    /// Result of a scratchpad block write.
    pub enum ScratchpadBlockResult {
        /// Block accepted, more expected.
        Success = 0,
        /// Final block accepted, image is valid.
        CompletedOk = 1,
        /// Final block accepted, image is not valid.
        CompletedError = 2,
        /// Stack is running.
        InvalidState = 3,
        /// No write session is ongoing.
        NotOngoing = 4,
        /// Start address does not continue the image.
        InvalidStartAddress = 5,
        /// Block length is not acceptable.
        InvalidNumBytes = 6,
        /// Block content is not acceptable.
        InvalidData = 7,
    }
}

wire_enum! {
    /// Result of marking the scratchpad bootable.
    pub enum ScratchpadBootableResult {
        /// Scratchpad will be processed on next boot.
        Success = 0,
        /// Stack is running.
        InvalidState = 1,
        /// No complete image is stored.
        NoScratchpad = 2,
        /// Operation is not permitted.
        AccessDenied = 3,
    }
}

wire_enum! {
    /// Result of starting a neighbor scan.
    pub enum ScanNeighborsResult {
        /// Scan started.
        Success = 0,
        /// Stack is not running.
        InvalidState = 1,
        /// Operation is not permitted.
        AccessDenied = 2,
    }
}

wire_enum! {
    /// Result of a remote status request (retired, always access denied).
    pub enum RemoteStatusResult {
        /// Success.
        Success = 0,
        /// Stack is in the wrong state.
        InvalidState = 1,
        /// Operation is not permitted.
        AccessDenied = 2,
    }
}

wire_enum! {
    /// Result of a remote update request (retired, always access denied).
    pub enum RemoteUpdateResult {
        /// Success.
        Success = 0,
        /// Stack is in the wrong state.
        InvalidState = 1,
        /// Operation is not permitted.
        AccessDenied = 2,
    }
}

wire_enum! {
    /// Result of a sleep or wakeup request.
    pub enum SleepResult {
        /// Success.
        Success = 0,
        /// Stack is in the wrong state.
        InvalidState = 1,
        /// Node role does not allow sleeping.
        InvalidRole = 2,
        /// Sleep time is out of range.
        InvalidValue = 3,
        /// Operation is not permitted, or failed for another reason.
        AccessDenied = 4,
    }
}

wire_enum! {
    /// Current sleep state.
    pub enum SleepState {
        /// Stack is not sleeping.
        NotStarted = 0,
        /// Stack is sleeping.
        Active = 1,
    }
}

wire_enum! {
    /// Result of a max queuing time read or write.
    pub enum QueuingTimeResult {
        /// Success.
        Success = 0,
        /// Priority or time is out of range.
        InvalidValue = 1,
        /// Stack is in the wrong state.
        InvalidStackState = 2,
        /// Operation is not permitted.
        AccessDenied = 3,
    }
}

wire_enum! {
    /// Message priority class for queuing time settings.
    pub enum Priority {
        /// Normal priority traffic.
        Normal = 0,
        /// High priority traffic.
        High = 1,
    }
}

wire_enum! {
    /// Role of a neighbor relative to this node.
    pub enum NeighborRole {
        /// Neighbor is the next hop towards a sink.
        NextHop = 0,
        /// Neighbor is a member of this node's cluster.
        Member = 1,
        /// Neighbor is a cluster head.
        Cluster = 2,
    }
}

// ============================================================================
// Structured Payloads
// ============================================================================

/// App config data together with its sequence number and diagnostic interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Sequence number.
    pub seq: u8,
    /// Diagnostic interval in seconds.
    pub interval: u16,
    /// Opaque config blob.
    pub data: [u8; APP_CONFIG_SIZE],
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            seq: 0,
            interval: 0,
            data: [0u8; APP_CONFIG_SIZE],
        }
    }
}

/// One entry of the neighbor table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighborEntry {
    /// Neighbor node address.
    pub address: u32,
    /// Link reliability (0-255).
    pub link_reliability: u8,
    /// Normalized RSSI.
    pub rssi: u8,
    /// Route cost through this neighbor.
    pub cost: u8,
    /// Radio channel.
    pub channel: u8,
    /// Role of the neighbor (see [`NeighborRole`]).
    pub role: u8,
    /// Transmit power level.
    pub tx_power: u8,
    /// Receive power level.
    pub rx_power: u8,
    /// Seconds since the entry was last updated.
    pub last_update: u16,
}

impl NeighborEntry {
    pub(crate) fn put(&self, buf: &mut Vec<u8>) {
        buf.put_u32_le(self.address);
        buf.put_u8(self.link_reliability);
        buf.put_u8(self.rssi);
        buf.put_u8(self.cost);
        buf.put_u8(self.channel);
        buf.put_u8(self.role);
        buf.put_u8(self.tx_power);
        buf.put_u8(self.rx_power);
        buf.put_u16_le(self.last_update);
    }

    pub(crate) fn get(buf: &mut &[u8]) -> Self {
        NeighborEntry {
            address: buf.get_u32_le(),
            link_reliability: buf.get_u8(),
            rssi: buf.get_u8(),
            cost: buf.get_u8(),
            channel: buf.get_u8(),
            role: buf.get_u8(),
            tx_power: buf.get_u8(),
            rx_power: buf.get_u8(),
            last_update: buf.get_u16_le(),
        }
    }
}

/// Stack firmware version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirmwareVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Maintenance version.
    pub maint: u8,
    /// Development version.
    pub devel: u8,
}

/// Scratchpad status block.
///
/// An all-zero block is returned when the status query is not permitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScratchpadStatus {
    /// Size of the stored image.
    pub num_bytes: u32,
    /// CRC of the stored image.
    pub crc: u16,
    /// Sequence number of the stored image.
    pub seq: u8,
    /// Scratchpad type (blank, present, process).
    pub scratchpad_type: u8,
    /// Status of the last processed image.
    pub status: u8,
    /// Size of the last processed image.
    pub processed_num_bytes: u32,
    /// CRC of the last processed image.
    pub processed_crc: u16,
    /// Sequence number of the last processed image.
    pub processed_seq: u8,
    /// Memory area id of the last processed image.
    pub area_id: u32,
    /// Running stack firmware version.
    pub firmware: FirmwareVersion,
}

impl ScratchpadStatus {
    pub(crate) fn put(&self, buf: &mut Vec<u8>) {
        buf.put_u32_le(self.num_bytes);
        buf.put_u16_le(self.crc);
        buf.put_u8(self.seq);
        buf.put_u8(self.scratchpad_type);
        buf.put_u8(self.status);
        buf.put_u32_le(self.processed_num_bytes);
        buf.put_u16_le(self.processed_crc);
        buf.put_u8(self.processed_seq);
        buf.put_u32_le(self.area_id);
        buf.put_u8(self.firmware.major);
        buf.put_u8(self.firmware.minor);
        buf.put_u8(self.firmware.maint);
        buf.put_u8(self.firmware.devel);
    }

    pub(crate) fn get(buf: &mut &[u8]) -> Self {
        ScratchpadStatus {
            num_bytes: buf.get_u32_le(),
            crc: buf.get_u16_le(),
            seq: buf.get_u8(),
            scratchpad_type: buf.get_u8(),
            status: buf.get_u8(),
            processed_num_bytes: buf.get_u32_le(),
            processed_crc: buf.get_u16_le(),
            processed_seq: buf.get_u8(),
            area_id: buf.get_u32_le(),
            firmware: FirmwareVersion {
                major: buf.get_u8(),
                minor: buf.get_u8(),
                maint: buf.get_u8(),
                devel: buf.get_u8(),
            },
        }
    }
}

/// Encoded size of an attribute, or `None` if the id is outside the table.
pub fn attribute_size(id: u16) -> Option<usize> {
    let idx = (id as usize).checked_sub(1)?;
    ATTRIBUTE_SIZES.get(idx).map(|&size| size as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_code_confirm_mapping() {
        assert_eq!(RequestCode::StackStart.confirm_code(), 0x85);
        assert_eq!(RequestCode::from_confirm(0x8C).unwrap(), RequestCode::AttributeRead);
        assert!(RequestCode::from_confirm(0x0C).is_err());
        assert!(RequestCode::try_from(0x7F).is_err());
    }

    #[test]
    fn test_stack_state_flags() {
        let flags = StackStateFlags::STOPPED | StackStateFlags::ROLE_NOT_SET;
        assert_eq!(flags.bits(), 17);
        assert!(flags.contains(StackStateFlags::ROLE_NOT_SET));
        assert!(!flags.contains(StackStateFlags::ACCESS_DENIED));
        assert!(!flags.is_started());
        assert!(StackStateFlags::STARTED.is_started());
    }

    #[test]
    fn test_attribute_size_table() {
        assert_eq!(attribute_size(0), None);
        assert_eq!(attribute_size(ATTR_STACK_STATUS), Some(1));
        assert_eq!(attribute_size(ATTR_SYSTEM_TIME), Some(4));
        assert_eq!(attribute_size(ATTR_CURRENT_ACCESS_CYCLE), Some(2));
        assert_eq!(attribute_size(ATTR_MULTICAST_GROUPS), Some(40));
        assert_eq!(attribute_size(ATTR_MULTICAST_GROUPS + 1), None);
    }

    #[test]
    fn test_scratchpad_status_layout() {
        let status = ScratchpadStatus {
            num_bytes: 0x1000,
            crc: 0xBEEF,
            seq: 7,
            firmware: FirmwareVersion { major: 5, minor: 1, maint: 0, devel: 0 },
            ..Default::default()
        };
        let mut buf = Vec::new();
        status.put(&mut buf);
        assert_eq!(buf.len(), SCRATCHPAD_STATUS_SIZE);
        assert_eq!(&buf[..7], &[0x00, 0x10, 0x00, 0x00, 0xEF, 0xBE, 7]);
        assert_eq!(buf[20], 5);
    }
}
