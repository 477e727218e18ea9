//! Unsolicited indications sent by the node.
//!
//! Every indication starts with the same pending-indication byte as the
//! poll confirm, so the host can keep polling without a separate request.

use bytes::{Buf, BufMut};

use crate::constants::*;
use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::types::*;

/// Offset of the pending-indication byte in every indication payload.
pub const INDICATION_PENDING_OFFSET: usize = 0;

/// Indications that can be produced by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indication {
    /// Stack state changed.
    StackState {
        /// 1 if more indications are pending, else 0.
        pending: u8,
        /// Current unmet preconditions; empty when started.
        flags: StackStateFlags,
    },

    /// Neighbor scan completed.
    ScanNeighbors {
        /// 1 if more indications are pending, else 0.
        pending: u8,
        /// Scan result is ready (always 1).
        scan_ready: u8,
    },

    /// New app config data received from the network.
    AppConfigReceived {
        /// 1 if more indications are pending, else 0.
        pending: u8,
        /// Received config.
        config: AppConfig,
    },
}

impl Indication {
    /// Indication type.
    pub fn kind(&self) -> IndicationCode {
        match self {
            Indication::StackState { .. } => IndicationCode::StackState,
            Indication::ScanNeighbors { .. } => IndicationCode::ScanNeighbors,
            Indication::AppConfigReceived { .. } => IndicationCode::AppConfigReceived,
        }
    }

    /// Encode the indication payload.
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Indication::StackState { pending, flags } => {
                buf.put_u8(*pending);
                buf.put_u8(flags.bits());
            }
            Indication::ScanNeighbors {
                pending,
                scan_ready,
            } => {
                buf.put_u8(*pending);
                buf.put_u8(*scan_ready);
            }
            Indication::AppConfigReceived { pending, config } => {
                buf.put_u8(*pending);
                buf.put_u8(config.seq);
                buf.put_u16_le(config.interval);
                buf.extend_from_slice(&config.data);
            }
        }

        buf
    }

    /// Build a frame carrying this indication. Indications use sequence id 0.
    pub fn to_frame(&self) -> Frame {
        Frame::new(self.kind().into(), 0, self.encode_payload())
    }

    /// Decode an indication frame.
    pub fn decode(frame: &Frame) -> Result<Indication, ProtocolError> {
        let kind = IndicationCode::try_from(frame.function)
            .map_err(|_| ProtocolError::UnknownIndication(frame.function))?;
        let mut buf = &frame.payload[..];

        let indication = match kind {
            IndicationCode::StackState => {
                frame.expect_payload_len(2)?;
                Indication::StackState {
                    pending: buf.get_u8(),
                    flags: StackStateFlags::from_bits(buf.get_u8()),
                }
            }
            IndicationCode::ScanNeighbors => {
                frame.expect_payload_len(2)?;
                Indication::ScanNeighbors {
                    pending: buf.get_u8(),
                    scan_ready: buf.get_u8(),
                }
            }
            IndicationCode::AppConfigReceived => {
                frame.expect_payload_len(4 + APP_CONFIG_SIZE)?;
                let pending = buf.get_u8();
                let seq = buf.get_u8();
                let interval = buf.get_u16_le();
                let mut data = [0u8; APP_CONFIG_SIZE];
                buf.copy_to_slice(&mut data);
                Indication::AppConfigReceived {
                    pending,
                    config: AppConfig {
                        seq,
                        interval,
                        data,
                    },
                }
            }
        };

        Ok(indication)
    }
}
