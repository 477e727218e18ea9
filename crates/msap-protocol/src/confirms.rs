//! Confirms sent by the node in answer to requests.
//!
//! A confirm reuses the request's sequence id; its function code is the
//! request code with [`CONFIRM_BIT`] set.

use bytes::{Buf, BufMut};

use crate::constants::*;
use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::types::*;

/// Confirms that can be produced by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    /// Indication poll confirm.
    IndicationPoll {
        /// 1 if any indication is pending, else 0.
        pending: u8,
    },

    /// Stack start confirm.
    StackStart {
        /// Unmet preconditions; empty on success.
        flags: StackStateFlags,
    },

    /// Stack stop confirm.
    StackStop(StackStopResult),

    /// Attribute write confirm.
    AttributeWrite(AttributeResult),

    /// Attribute read confirm.
    AttributeRead {
        /// Result code.
        result: AttributeResult,
        /// Attribute id from the request.
        id: u16,
        /// Encoded value; empty unless the read succeeded.
        value: Vec<u8>,
    },

    /// Scratchpad start confirm.
    ScratchpadStart(ScratchpadStartResult),

    /// Scratchpad block confirm.
    ScratchpadBlock(ScratchpadBlockResult),

    /// Scratchpad status confirm.
    ScratchpadStatus(ScratchpadStatus),

    /// Scratchpad bootable confirm.
    ScratchpadBootable(ScratchpadBootableResult),

    /// Scratchpad clear confirm.
    ScratchpadClear(ScratchpadClearResult),

    /// Remote status confirm.
    RemoteStatus(RemoteStatusResult),

    /// Remote update confirm.
    RemoteUpdate(RemoteUpdateResult),

    /// Neighbor table confirm.
    ///
    /// The table is always encoded with [`MAX_NEIGHBORS`] slots; unused
    /// slots are zero-filled.
    GetNeighbors {
        /// Valid entries, at most [`MAX_NEIGHBORS`].
        neighbors: Vec<NeighborEntry>,
    },

    /// Neighbor scan confirm.
    ScanNeighbors(ScanNeighborsResult),

    /// Sink cost write confirm.
    SinkCostWrite(SinkCostResult),

    /// Sink cost read confirm.
    SinkCostRead {
        /// Result code.
        result: SinkCostResult,
        /// Base cost.
        cost: u8,
    },

    /// App config write confirm.
    AppConfigWrite(AppConfigWriteResult),

    /// App config read confirm.
    AppConfigRead {
        /// Result code.
        result: AppConfigReadResult,
        /// Stored config; zero-filled unless the read succeeded.
        config: AppConfig,
    },

    /// Sleep confirm.
    Sleep(SleepResult),

    /// Wakeup confirm.
    SleepStop(SleepResult),

    /// Sleep state confirm.
    SleepState {
        /// Current state.
        state: SleepState,
        /// Seconds until wakeup.
        countdown: u32,
    },

    /// Latest go-to-sleep info confirm.
    GotoSleepInfo {
        /// Countdown recorded when the stack last went to sleep.
        seconds: u32,
    },

    /// Max queuing time write confirm.
    QueuingTimeWrite(QueuingTimeResult),

    /// Max queuing time read confirm.
    QueuingTimeRead {
        /// Result code.
        result: QueuingTimeResult,
        /// Queuing time in seconds.
        time: u16,
    },
}

impl Confirm {
    /// Request this confirm answers.
    pub fn request_code(&self) -> RequestCode {
        match self {
            Confirm::IndicationPoll { .. } => RequestCode::IndicationPoll,
            Confirm::StackStart { .. } => RequestCode::StackStart,
            Confirm::StackStop(_) => RequestCode::StackStop,
            Confirm::AttributeWrite(_) => RequestCode::AttributeWrite,
            Confirm::AttributeRead { .. } => RequestCode::AttributeRead,
            Confirm::ScratchpadStart(_) => RequestCode::ScratchpadStart,
            Confirm::ScratchpadBlock(_) => RequestCode::ScratchpadBlock,
            Confirm::ScratchpadStatus(_) => RequestCode::ScratchpadStatus,
            Confirm::ScratchpadBootable(_) => RequestCode::ScratchpadBootable,
            Confirm::ScratchpadClear(_) => RequestCode::ScratchpadClear,
            Confirm::RemoteStatus(_) => RequestCode::RemoteStatus,
            Confirm::RemoteUpdate(_) => RequestCode::RemoteUpdate,
            Confirm::GetNeighbors { .. } => RequestCode::GetNeighbors,
            Confirm::ScanNeighbors(_) => RequestCode::ScanNeighbors,
            Confirm::SinkCostWrite(_) => RequestCode::SinkCostWrite,
            Confirm::SinkCostRead { .. } => RequestCode::SinkCostRead,
            Confirm::AppConfigWrite(_) => RequestCode::AppConfigWrite,
            Confirm::AppConfigRead { .. } => RequestCode::AppConfigRead,
            Confirm::Sleep(_) => RequestCode::Sleep,
            Confirm::SleepStop(_) => RequestCode::SleepStop,
            Confirm::SleepState { .. } => RequestCode::SleepState,
            Confirm::GotoSleepInfo { .. } => RequestCode::GotoSleepInfo,
            Confirm::QueuingTimeWrite(_) => RequestCode::QueuingTimeWrite,
            Confirm::QueuingTimeRead { .. } => RequestCode::QueuingTimeRead,
        }
    }

    /// Function code carried on the wire.
    pub fn code(&self) -> u8 {
        self.request_code().confirm_code()
    }

    /// Encode the confirm payload.
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Confirm::IndicationPoll { pending } => buf.put_u8(*pending),
            Confirm::StackStart { flags } => buf.put_u8(flags.bits()),
            Confirm::StackStop(result) => buf.put_u8((*result).into()),
            Confirm::AttributeWrite(result) => buf.put_u8((*result).into()),

            Confirm::AttributeRead { result, id, value } => {
                buf.put_u8((*result).into());
                buf.put_u16_le(*id);
                buf.put_u8(value.len() as u8);
                buf.extend_from_slice(value);
            }

            Confirm::ScratchpadStart(result) => buf.put_u8((*result).into()),
            Confirm::ScratchpadBlock(result) => buf.put_u8((*result).into()),
            Confirm::ScratchpadStatus(status) => status.put(&mut buf),
            Confirm::ScratchpadBootable(result) => buf.put_u8((*result).into()),
            Confirm::ScratchpadClear(result) => buf.put_u8((*result).into()),
            Confirm::RemoteStatus(result) => buf.put_u8((*result).into()),
            Confirm::RemoteUpdate(result) => buf.put_u8((*result).into()),

            Confirm::GetNeighbors { neighbors } => {
                let count = neighbors.len().min(MAX_NEIGHBORS);
                buf.put_u8(count as u8);
                for entry in &neighbors[..count] {
                    entry.put(&mut buf);
                }
                buf.resize(1 + MAX_NEIGHBORS * NEIGHBOR_ENTRY_SIZE, 0);
            }

            Confirm::ScanNeighbors(result) => buf.put_u8((*result).into()),
            Confirm::SinkCostWrite(result) => buf.put_u8((*result).into()),

            Confirm::SinkCostRead { result, cost } => {
                buf.put_u8((*result).into());
                buf.put_u8(*cost);
            }

            Confirm::AppConfigWrite(result) => buf.put_u8((*result).into()),

            Confirm::AppConfigRead { result, config } => {
                buf.put_u8((*result).into());
                buf.put_u8(config.seq);
                buf.put_u16_le(config.interval);
                buf.extend_from_slice(&config.data);
            }

            Confirm::Sleep(result) | Confirm::SleepStop(result) => buf.put_u8((*result).into()),

            Confirm::SleepState { state, countdown } => {
                buf.put_u8((*state).into());
                buf.put_u32_le(*countdown);
            }

            Confirm::GotoSleepInfo { seconds } => buf.put_u32_le(*seconds),
            Confirm::QueuingTimeWrite(result) => buf.put_u8((*result).into()),

            Confirm::QueuingTimeRead { result, time } => {
                buf.put_u8((*result).into());
                buf.put_u16_le(*time);
            }
        }

        buf
    }

    /// Build a frame carrying this confirm.
    pub fn to_frame(&self, sequence_id: u8) -> Frame {
        Frame::new(self.code(), sequence_id, self.encode_payload())
    }

    /// Decode a confirm frame.
    pub fn decode(frame: &Frame) -> Result<Confirm, ProtocolError> {
        let code = RequestCode::from_confirm(frame.function)?;
        let mut buf = &frame.payload[..];

        let confirm = match code {
            RequestCode::IndicationPoll => {
                frame.expect_payload_len(1)?;
                Confirm::IndicationPoll {
                    pending: buf.get_u8(),
                }
            }
            RequestCode::StackStart => {
                frame.expect_payload_len(1)?;
                Confirm::StackStart {
                    flags: StackStateFlags::from_bits(buf.get_u8()),
                }
            }
            RequestCode::StackStop => Confirm::StackStop(single(frame)?),
            RequestCode::AttributeWrite => Confirm::AttributeWrite(single(frame)?),
            RequestCode::AttributeRead => {
                if frame.payload.len() < ATTR_READ_CNF_HEADER_SIZE {
                    return Err(ProtocolError::length_mismatch(
                        frame.function,
                        ATTR_READ_CNF_HEADER_SIZE,
                        frame.payload.len(),
                    ));
                }
                let result = AttributeResult::try_from(buf.get_u8())?;
                let id = buf.get_u16_le();
                let len = buf.get_u8() as usize;
                frame.expect_payload_len(ATTR_READ_CNF_HEADER_SIZE + len)?;
                Confirm::AttributeRead {
                    result,
                    id,
                    value: buf.to_vec(),
                }
            }
            RequestCode::ScratchpadStart => Confirm::ScratchpadStart(single(frame)?),
            RequestCode::ScratchpadBlock => Confirm::ScratchpadBlock(single(frame)?),
            RequestCode::ScratchpadStatus => {
                frame.expect_payload_len(SCRATCHPAD_STATUS_SIZE)?;
                Confirm::ScratchpadStatus(ScratchpadStatus::get(&mut buf))
            }
            RequestCode::ScratchpadBootable => Confirm::ScratchpadBootable(single(frame)?),
            RequestCode::ScratchpadClear => Confirm::ScratchpadClear(single(frame)?),
            RequestCode::RemoteStatus => Confirm::RemoteStatus(single(frame)?),
            RequestCode::RemoteUpdate => Confirm::RemoteUpdate(single(frame)?),
            RequestCode::GetNeighbors => {
                frame.expect_payload_len(1 + MAX_NEIGHBORS * NEIGHBOR_ENTRY_SIZE)?;
                let count = buf.get_u8() as usize;
                if count > MAX_NEIGHBORS {
                    return Err(ProtocolError::invalid_field("neighbor count", count as u8));
                }
                let neighbors = (0..count).map(|_| NeighborEntry::get(&mut buf)).collect();
                Confirm::GetNeighbors { neighbors }
            }
            RequestCode::ScanNeighbors => Confirm::ScanNeighbors(single(frame)?),
            RequestCode::SinkCostWrite => Confirm::SinkCostWrite(single(frame)?),
            RequestCode::SinkCostRead => {
                frame.expect_payload_len(2)?;
                Confirm::SinkCostRead {
                    result: SinkCostResult::try_from(buf.get_u8())?,
                    cost: buf.get_u8(),
                }
            }
            RequestCode::AppConfigWrite => Confirm::AppConfigWrite(single(frame)?),
            RequestCode::AppConfigRead => {
                frame.expect_payload_len(4 + APP_CONFIG_SIZE)?;
                let result = AppConfigReadResult::try_from(buf.get_u8())?;
                let seq = buf.get_u8();
                let interval = buf.get_u16_le();
                let mut data = [0u8; APP_CONFIG_SIZE];
                buf.copy_to_slice(&mut data);
                Confirm::AppConfigRead {
                    result,
                    config: AppConfig {
                        seq,
                        interval,
                        data,
                    },
                }
            }
            RequestCode::Sleep => Confirm::Sleep(single(frame)?),
            RequestCode::SleepStop => Confirm::SleepStop(single(frame)?),
            RequestCode::SleepState => {
                frame.expect_payload_len(5)?;
                Confirm::SleepState {
                    state: SleepState::try_from(buf.get_u8())?,
                    countdown: buf.get_u32_le(),
                }
            }
            RequestCode::GotoSleepInfo => {
                frame.expect_payload_len(4)?;
                Confirm::GotoSleepInfo {
                    seconds: buf.get_u32_le(),
                }
            }
            RequestCode::QueuingTimeWrite => Confirm::QueuingTimeWrite(single(frame)?),
            RequestCode::QueuingTimeRead => {
                frame.expect_payload_len(3)?;
                Confirm::QueuingTimeRead {
                    result: QueuingTimeResult::try_from(buf.get_u8())?,
                    time: buf.get_u16_le(),
                }
            }
        };

        Ok(confirm)
    }
}

/// Decode a confirm whose payload is a single result byte.
fn single<T>(frame: &Frame) -> Result<T, ProtocolError>
where
    T: TryFrom<u8, Error = ProtocolError>,
{
    frame.expect_payload_len(1)?;
    T::try_from(frame.payload[0])
}
