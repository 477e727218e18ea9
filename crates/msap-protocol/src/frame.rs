//! Frame encoding/decoding utilities.
//!
//! Every MSAP frame starts with a three byte header followed by the payload:
//!
//! ```text
//! +----------+-------------+-------------+--------------------+
//! | function | sequence_id | payload_len | payload[0..len]    |
//! +----------+-------------+-------------+--------------------+
//! ```
//!
//! The header is self-delimiting, so [`FrameCodec`] can reassemble frames
//! from a raw byte stream without any extra length prefix.

use bytes::{Buf, BufMut, BytesMut};

use crate::constants::*;
use crate::error::ProtocolError;

/// A single MSAP frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Function code (selects request, confirm or indication type).
    pub function: u8,
    /// Opaque sequence id, echoed back in confirms.
    pub sequence_id: u8,
    /// Type-specific payload.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame.
    pub fn new(function: u8, sequence_id: u8, payload: Vec<u8>) -> Self {
        Frame {
            function,
            sequence_id,
            payload,
        }
    }

    /// Length of the payload as carried in the header.
    pub fn payload_length(&self) -> usize {
        self.payload.len()
    }

    /// Fail unless the payload is exactly `expected` bytes long.
    pub fn expect_payload_len(&self, expected: usize) -> Result<(), ProtocolError> {
        if self.payload.len() != expected {
            return Err(ProtocolError::length_mismatch(
                self.function,
                expected,
                self.payload.len(),
            ));
        }
        Ok(())
    }

    /// Decode a complete frame from a buffer.
    ///
    /// The buffer must hold exactly one frame: its length must equal the
    /// header size plus the payload length field.
    pub fn decode(data: &[u8]) -> Result<Frame, ProtocolError> {
        if data.len() < FRAME_HEADER_SIZE {
            return Err(ProtocolError::FrameTooShort {
                expected: FRAME_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let function = buf.get_u8();
        let sequence_id = buf.get_u8();
        let payload_len = buf.get_u8() as usize;

        if buf.len() != payload_len {
            return Err(ProtocolError::length_mismatch(function, payload_len, buf.len()));
        }

        Ok(Frame::new(function, sequence_id, buf.to_vec()))
    }

    /// Encode the frame, header included.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLong {
                max: MAX_PAYLOAD_SIZE,
                actual: self.payload.len(),
            });
        }
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + self.payload.len());
        buf.put_u8(self.function);
        buf.put_u8(self.sequence_id);
        buf.put_u8(self.payload.len() as u8);
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }
}

/// A codec that reassembles frames from a byte stream.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(FRAME_HEADER_SIZE + MAX_PAYLOAD_SIZE),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode a complete frame from the buffer.
    ///
    /// Returns `Some(frame)` if a complete frame is available,
    /// or `None` if more data is needed.
    pub fn decode(&mut self) -> Option<Frame> {
        if self.buffer.len() < FRAME_HEADER_SIZE {
            return None;
        }

        let payload_len = self.buffer[2] as usize;
        if self.buffer.len() < FRAME_HEADER_SIZE + payload_len {
            return None;
        }

        let function = self.buffer.get_u8();
        let sequence_id = self.buffer.get_u8();
        self.buffer.advance(1);
        let payload = self.buffer.split_to(payload_len).to_vec();
        log::trace!(
            "decoded frame 0x{:02X} seq={} len={}",
            function,
            sequence_id,
            payload_len
        );

        Some(Frame::new(function, sequence_id, payload))
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
