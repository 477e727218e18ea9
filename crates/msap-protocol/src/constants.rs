//! Protocol constants
//!
//! Function codes, payload sizes and attribute identifiers used by the
//! management service access point (MSAP) of the WAPS host protocol.

// ============================================================================
// Frame Layout
// ============================================================================

/// Size of the frame header: function code, sequence id, payload length.
pub const FRAME_HEADER_SIZE: usize = 3;
/// Largest payload a frame can carry (length field is one byte).
pub const MAX_PAYLOAD_SIZE: usize = 255;
/// Bit set on a request code to form its confirm code.
pub const CONFIRM_BIT: u8 = 0x80;

// ============================================================================
// Request Codes (host → node)
// ============================================================================

/// Poll for pending indications.
pub const FUNC_INDICATION_POLL_REQ: u8 = 0x04;
/// Start the network stack.
pub const FUNC_STACK_START_REQ: u8 = 0x05;
/// Stop the network stack (reboots the node).
pub const FUNC_STACK_STOP_REQ: u8 = 0x06;
/// Write an attribute.
pub const FUNC_ATTR_WRITE_REQ: u8 = 0x0B;
/// Read an attribute.
pub const FUNC_ATTR_READ_REQ: u8 = 0x0C;
/// Begin a scratchpad write session.
pub const FUNC_SCRATCHPAD_START_REQ: u8 = 0x17;
/// Write one scratchpad block.
pub const FUNC_SCRATCHPAD_BLOCK_REQ: u8 = 0x18;
/// Query scratchpad status.
pub const FUNC_SCRATCHPAD_STATUS_REQ: u8 = 0x19;
/// Mark the stored scratchpad bootable.
pub const FUNC_SCRATCHPAD_BOOTABLE_REQ: u8 = 0x1A;
/// Erase the scratchpad.
pub const FUNC_SCRATCHPAD_CLEAR_REQ: u8 = 0x1B;
/// Remote scratchpad status (retired).
pub const FUNC_REMOTE_STATUS_REQ: u8 = 0x1C;
/// Remote scratchpad update (retired).
pub const FUNC_REMOTE_UPDATE_REQ: u8 = 0x1E;
/// Read the neighbor table.
pub const FUNC_GET_NBORS_REQ: u8 = 0x20;
/// Start a neighbor scan.
pub const FUNC_SCAN_NBORS_REQ: u8 = 0x21;
/// Write the sink base cost.
pub const FUNC_SINK_COST_WRITE_REQ: u8 = 0x38;
/// Read the sink base cost.
pub const FUNC_SINK_COST_READ_REQ: u8 = 0x39;
/// Write the app config data.
pub const FUNC_APP_CONFIG_WRITE_REQ: u8 = 0x3A;
/// Read the app config data.
pub const FUNC_APP_CONFIG_READ_REQ: u8 = 0x3B;
/// Put the stack to sleep.
pub const FUNC_STACK_SLEEP_REQ: u8 = 0x40;
/// Wake the stack.
pub const FUNC_STACK_SLEEP_STOP_REQ: u8 = 0x41;
/// Query the sleep state.
pub const FUNC_STACK_SLEEP_STATE_GET_REQ: u8 = 0x42;
/// Query the most recent go-to-sleep countdown.
pub const FUNC_STACK_SLEEP_GOTOSLEEP_INFO_REQ: u8 = 0x43;
/// Write the maximum message queuing time.
pub const FUNC_MAX_QUEUING_TIME_WRITE_REQ: u8 = 0x4F;
/// Read the maximum message queuing time.
pub const FUNC_MAX_QUEUING_TIME_READ_REQ: u8 = 0x50;

// ============================================================================
// Indication Codes (node → host, unsolicited)
// ============================================================================

/// Stack state changed.
pub const FUNC_STACK_STATE_IND: u8 = 0x07;
/// Neighbor scan completed.
pub const FUNC_SCAN_NBORS_IND: u8 = 0x22;
/// App config data received from the network.
pub const FUNC_APP_CONFIG_RX_IND: u8 = 0x3F;

// ============================================================================
// Payload Sizes
// ============================================================================

/// Size of the app config data blob.
pub const APP_CONFIG_SIZE: usize = 80;
/// Maximum number of neighbors reported in one confirm.
pub const MAX_NEIGHBORS: usize = 8;
/// Encoded size of one neighbor entry.
pub const NEIGHBOR_ENTRY_SIZE: usize = 13;
/// Maximum number of bytes in one scratchpad block.
pub const SCRATCHPAD_BLOCK_MAX_BYTES: usize = 112;
/// Encoded size of the scratchpad status block.
pub const SCRATCHPAD_STATUS_SIZE: usize = 24;
/// Number of multicast groups a node can belong to.
pub const MAX_MULTICAST_GROUPS: usize = 10;
/// Largest encoded attribute value.
pub const MAX_ATTRIBUTE_SIZE: usize = 4 * MAX_MULTICAST_GROUPS;

/// Attribute write request header: id(2) + len(1).
pub const ATTR_WRITE_REQ_HEADER_SIZE: usize = 3;
/// Attribute read confirm header: result(1) + id(2) + len(1).
pub const ATTR_READ_CNF_HEADER_SIZE: usize = 4;
/// Scratchpad block request header: start address(4) + num bytes(1).
pub const SCRATCHPAD_BLOCK_REQ_HEADER_SIZE: usize = 5;

// ============================================================================
// Attribute Identifiers
// ============================================================================

/// Stack state flags.
pub const ATTR_STACK_STATUS: u16 = 1;
/// Number of PDU buffers in use.
pub const ATTR_PDU_BUFFER_USAGE: u16 = 2;
/// Number of PDU buffers available.
pub const ATTR_PDU_BUFFER_CAPACITY: u16 = 3;
/// Neighbor count (deprecated, never readable).
pub const ATTR_NEIGHBOR_COUNT: u16 = 4;
/// Remaining energy estimate.
pub const ATTR_ENERGY: u16 = 5;
/// Autostart flag.
pub const ATTR_AUTOSTART: u16 = 6;
/// Number of routes to a sink.
pub const ATTR_ROUTE_COUNT: u16 = 7;
/// Coarse system time.
pub const ATTR_SYSTEM_TIME: u16 = 8;
/// Access cycle range (min | max << 16), in milliseconds.
pub const ATTR_ACCESS_CYCLE_RANGE: u16 = 9;
/// Access cycle limits (min | max << 16), in milliseconds.
pub const ATTR_ACCESS_CYCLE_LIMITS: u16 = 10;
/// Current access cycle, in milliseconds.
pub const ATTR_CURRENT_ACCESS_CYCLE: u16 = 11;
/// Maximum scratchpad block size.
pub const ATTR_SCRATCHPAD_BLOCK_MAX: u16 = 12;
/// Multicast group list.
pub const ATTR_MULTICAST_GROUPS: u16 = 13;

/// Encoded attribute sizes, indexed by `id - 1`.
pub const ATTRIBUTE_SIZES: [u8; 13] = [
    1,  // stack status
    1,  // pdu buffer usage
    1,  // pdu buffer capacity
    1,  // neighbor count
    1,  // energy
    1,  // autostart
    1,  // route count
    4,  // system time
    4,  // access cycle range
    4,  // access cycle limits
    2,  // current access cycle
    1,  // scratchpad block max
    MAX_ATTRIBUTE_SIZE as u8,
];
