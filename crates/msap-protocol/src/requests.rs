//! Requests sent by the host to the node.
//!
//! Decoding validates the payload length against the exact shape the
//! function code requires; a frame that fails the check produces an error
//! and must not reach any handler.

use bytes::{Buf, BufMut};

use crate::constants::*;
use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::types::*;

/// Requests that can be sent to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Poll for pending indications.
    IndicationPoll,

    /// Start the stack.
    StackStart {
        /// Persist the autostart flag.
        autostart: bool,
    },

    /// Stop the stack and reboot.
    StackStop,

    /// Write an attribute.
    AttributeWrite {
        /// Attribute id.
        id: u16,
        /// Encoded value.
        value: Vec<u8>,
    },

    /// Read an attribute.
    AttributeRead {
        /// Attribute id.
        id: u16,
    },

    /// Begin a scratchpad write session.
    ScratchpadStart {
        /// Total image size.
        num_bytes: u32,
        /// Image sequence number.
        seq: u8,
    },

    /// Write one scratchpad block.
    ScratchpadBlock {
        /// Byte offset of the block in the image.
        start_address: u32,
        /// Block contents.
        bytes: Vec<u8>,
    },

    /// Query scratchpad status.
    ScratchpadStatus,

    /// Mark the stored image bootable.
    ScratchpadBootable,

    /// Erase the scratchpad.
    ScratchpadClear,

    /// Remote scratchpad status (retired).
    RemoteStatus {
        /// Destination address.
        address: u32,
    },

    /// Remote scratchpad update (retired).
    RemoteUpdate {
        /// Destination address.
        address: u32,
        /// Scratchpad sequence number.
        seq: u8,
        /// Reboot delay in seconds.
        reboot_delay: u16,
    },

    /// Read the neighbor table.
    GetNeighbors,

    /// Start a neighbor scan.
    ScanNeighbors,

    /// Write the sink base cost.
    SinkCostWrite {
        /// Base cost.
        cost: u8,
    },

    /// Read the sink base cost.
    SinkCostRead,

    /// Write app config data.
    AppConfigWrite(AppConfig),

    /// Read app config data.
    AppConfigRead,

    /// Put the stack to sleep.
    Sleep {
        /// Sleep time in seconds.
        seconds: u32,
        /// Ignore the app config diagnostic interval while sleeping.
        ignore_app_config_interval: bool,
    },

    /// Wake the stack.
    SleepStop,

    /// Query the sleep state.
    SleepState,

    /// Query the most recent go-to-sleep countdown.
    GotoSleepInfo,

    /// Write the max message queuing time.
    QueuingTimeWrite {
        /// Raw priority class (see [`Priority`]).
        priority: u8,
        /// Queuing time in seconds.
        time: u16,
    },

    /// Read the max message queuing time.
    QueuingTimeRead {
        /// Raw priority class (see [`Priority`]).
        priority: u8,
    },
}

/// Check a header-plus-trailer payload, returning the trailer length.
fn expect_trailer(frame: &Frame, header: usize, count_offset: usize) -> Result<usize, ProtocolError> {
    if frame.payload.len() < header {
        return Err(ProtocolError::length_mismatch(
            frame.function,
            header,
            frame.payload.len(),
        ));
    }
    let count = frame.payload[count_offset] as usize;
    frame.expect_payload_len(header + count)?;
    Ok(count)
}

impl Request {
    /// Function code of this request.
    pub fn code(&self) -> RequestCode {
        match self {
            Request::IndicationPoll => RequestCode::IndicationPoll,
            Request::StackStart { .. } => RequestCode::StackStart,
            Request::StackStop => RequestCode::StackStop,
            Request::AttributeWrite { .. } => RequestCode::AttributeWrite,
            Request::AttributeRead { .. } => RequestCode::AttributeRead,
            Request::ScratchpadStart { .. } => RequestCode::ScratchpadStart,
            Request::ScratchpadBlock { .. } => RequestCode::ScratchpadBlock,
            Request::ScratchpadStatus => RequestCode::ScratchpadStatus,
            Request::ScratchpadBootable => RequestCode::ScratchpadBootable,
            Request::ScratchpadClear => RequestCode::ScratchpadClear,
            Request::RemoteStatus { .. } => RequestCode::RemoteStatus,
            Request::RemoteUpdate { .. } => RequestCode::RemoteUpdate,
            Request::GetNeighbors => RequestCode::GetNeighbors,
            Request::ScanNeighbors => RequestCode::ScanNeighbors,
            Request::SinkCostWrite { .. } => RequestCode::SinkCostWrite,
            Request::SinkCostRead => RequestCode::SinkCostRead,
            Request::AppConfigWrite(_) => RequestCode::AppConfigWrite,
            Request::AppConfigRead => RequestCode::AppConfigRead,
            Request::Sleep { .. } => RequestCode::Sleep,
            Request::SleepStop => RequestCode::SleepStop,
            Request::SleepState => RequestCode::SleepState,
            Request::GotoSleepInfo => RequestCode::GotoSleepInfo,
            Request::QueuingTimeWrite { .. } => RequestCode::QueuingTimeWrite,
            Request::QueuingTimeRead { .. } => RequestCode::QueuingTimeRead,
        }
    }

    /// Decode a request frame, validating its payload length exactly.
    pub fn decode(frame: &Frame) -> Result<Request, ProtocolError> {
        let code = RequestCode::try_from(frame.function)
            .map_err(|_| ProtocolError::UnknownRequest(frame.function))?;
        let mut buf = &frame.payload[..];

        let request = match code {
            RequestCode::IndicationPoll => {
                frame.expect_payload_len(0)?;
                Request::IndicationPoll
            }
            RequestCode::StackStart => {
                frame.expect_payload_len(1)?;
                Request::StackStart {
                    autostart: buf.get_u8() != 0,
                }
            }
            RequestCode::StackStop => {
                frame.expect_payload_len(0)?;
                Request::StackStop
            }
            RequestCode::AttributeWrite => {
                expect_trailer(frame, ATTR_WRITE_REQ_HEADER_SIZE, 2)?;
                let id = buf.get_u16_le();
                buf.advance(1);
                Request::AttributeWrite {
                    id,
                    value: buf.to_vec(),
                }
            }
            RequestCode::AttributeRead => {
                frame.expect_payload_len(2)?;
                Request::AttributeRead {
                    id: buf.get_u16_le(),
                }
            }
            RequestCode::ScratchpadStart => {
                frame.expect_payload_len(5)?;
                Request::ScratchpadStart {
                    num_bytes: buf.get_u32_le(),
                    seq: buf.get_u8(),
                }
            }
            RequestCode::ScratchpadBlock => {
                expect_trailer(frame, SCRATCHPAD_BLOCK_REQ_HEADER_SIZE, 4)?;
                let start_address = buf.get_u32_le();
                buf.advance(1);
                Request::ScratchpadBlock {
                    start_address,
                    bytes: buf.to_vec(),
                }
            }
            RequestCode::ScratchpadStatus => {
                frame.expect_payload_len(0)?;
                Request::ScratchpadStatus
            }
            RequestCode::ScratchpadBootable => {
                frame.expect_payload_len(0)?;
                Request::ScratchpadBootable
            }
            RequestCode::ScratchpadClear => {
                frame.expect_payload_len(0)?;
                Request::ScratchpadClear
            }
            RequestCode::RemoteStatus => {
                frame.expect_payload_len(4)?;
                Request::RemoteStatus {
                    address: buf.get_u32_le(),
                }
            }
            RequestCode::RemoteUpdate => {
                frame.expect_payload_len(7)?;
                Request::RemoteUpdate {
                    address: buf.get_u32_le(),
                    seq: buf.get_u8(),
                    reboot_delay: buf.get_u16_le(),
                }
            }
            RequestCode::GetNeighbors => {
                frame.expect_payload_len(0)?;
                Request::GetNeighbors
            }
            RequestCode::ScanNeighbors => {
                frame.expect_payload_len(0)?;
                Request::ScanNeighbors
            }
            RequestCode::SinkCostWrite => {
                frame.expect_payload_len(1)?;
                Request::SinkCostWrite { cost: buf.get_u8() }
            }
            RequestCode::SinkCostRead => {
                frame.expect_payload_len(0)?;
                Request::SinkCostRead
            }
            RequestCode::AppConfigWrite => {
                frame.expect_payload_len(3 + APP_CONFIG_SIZE)?;
                let seq = buf.get_u8();
                let interval = buf.get_u16_le();
                let mut data = [0u8; APP_CONFIG_SIZE];
                buf.copy_to_slice(&mut data);
                Request::AppConfigWrite(AppConfig {
                    seq,
                    interval,
                    data,
                })
            }
            RequestCode::AppConfigRead => {
                frame.expect_payload_len(0)?;
                Request::AppConfigRead
            }
            RequestCode::Sleep => {
                frame.expect_payload_len(5)?;
                Request::Sleep {
                    seconds: buf.get_u32_le(),
                    ignore_app_config_interval: buf.get_u8() != 0,
                }
            }
            RequestCode::SleepStop => {
                frame.expect_payload_len(0)?;
                Request::SleepStop
            }
            RequestCode::SleepState => {
                frame.expect_payload_len(0)?;
                Request::SleepState
            }
            RequestCode::GotoSleepInfo => {
                frame.expect_payload_len(0)?;
                Request::GotoSleepInfo
            }
            RequestCode::QueuingTimeWrite => {
                frame.expect_payload_len(3)?;
                Request::QueuingTimeWrite {
                    priority: buf.get_u8(),
                    time: buf.get_u16_le(),
                }
            }
            RequestCode::QueuingTimeRead => {
                frame.expect_payload_len(1)?;
                Request::QueuingTimeRead {
                    priority: buf.get_u8(),
                }
            }
        };

        Ok(request)
    }

    /// Encode the request payload.
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Request::IndicationPoll
            | Request::StackStop
            | Request::ScratchpadStatus
            | Request::ScratchpadBootable
            | Request::ScratchpadClear
            | Request::GetNeighbors
            | Request::ScanNeighbors
            | Request::SinkCostRead
            | Request::AppConfigRead
            | Request::SleepStop
            | Request::SleepState
            | Request::GotoSleepInfo => {}

            Request::StackStart { autostart } => buf.put_u8(u8::from(*autostart)),

            Request::AttributeWrite { id, value } => {
                buf.put_u16_le(*id);
                buf.put_u8(value.len() as u8);
                buf.extend_from_slice(value);
            }

            Request::AttributeRead { id } => buf.put_u16_le(*id),

            Request::ScratchpadStart { num_bytes, seq } => {
                buf.put_u32_le(*num_bytes);
                buf.put_u8(*seq);
            }

            Request::ScratchpadBlock {
                start_address,
                bytes,
            } => {
                buf.put_u32_le(*start_address);
                buf.put_u8(bytes.len() as u8);
                buf.extend_from_slice(bytes);
            }

            Request::RemoteStatus { address } => buf.put_u32_le(*address),

            Request::RemoteUpdate {
                address,
                seq,
                reboot_delay,
            } => {
                buf.put_u32_le(*address);
                buf.put_u8(*seq);
                buf.put_u16_le(*reboot_delay);
            }

            Request::SinkCostWrite { cost } => buf.put_u8(*cost),

            Request::AppConfigWrite(config) => {
                buf.put_u8(config.seq);
                buf.put_u16_le(config.interval);
                buf.extend_from_slice(&config.data);
            }

            Request::Sleep {
                seconds,
                ignore_app_config_interval,
            } => {
                buf.put_u32_le(*seconds);
                buf.put_u8(u8::from(*ignore_app_config_interval));
            }

            Request::QueuingTimeWrite { priority, time } => {
                buf.put_u8(*priority);
                buf.put_u16_le(*time);
            }

            Request::QueuingTimeRead { priority } => buf.put_u8(*priority),
        }

        buf
    }

    /// Build a frame carrying this request.
    pub fn to_frame(&self, sequence_id: u8) -> Frame {
        Frame::new(self.code().into(), sequence_id, self.encode_payload())
    }
}
