//! In-memory scratchpad with a real write state machine.

use crc::{Crc, CRC_16_IBM_3740};
use tracing::{debug, info};

use msap_protocol::{ScratchpadStatus, SCRATCHPAD_BLOCK_MAX_BYTES};

use crate::error::StackError;
use crate::platform::{OtapWrite, StackResult};

const SCRATCHPAD_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Images are written in units of this many bytes.
const IMAGE_ALIGNMENT: u32 = 16;

/// Scratchpad type reported in the status block.
const TYPE_BLANK: u8 = 0;
const TYPE_PRESENT: u8 = 1;
const TYPE_PROCESS: u8 = 2;

/// Processing status: image applied successfully.
const STATUS_SUCCESS: u8 = 0;
/// Processing status: no image has been processed yet.
const STATUS_NEW: u8 = 0xFF;

/// Memory area the simulated scratchpad lives in.
const AREA_ID: u32 = 0x8000_0001;

/// Write progress of the scratchpad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchpadState {
    /// Nothing stored.
    Idle,
    /// Blocks are being written.
    Writing,
    /// A complete, valid image is stored.
    Written,
    /// The stored image will be processed on the next boot.
    Bootable,
}

#[derive(Debug, Clone, Copy, Default)]
struct Processed {
    status: u8,
    num_bytes: u32,
    crc: u16,
    seq: u8,
}

/// Simulated OTAP storage.
#[derive(Debug)]
pub struct Scratchpad {
    capacity: u32,
    state: ScratchpadState,
    data: Vec<u8>,
    expected: u32,
    seq: u8,
    crc: u16,
    processed: Processed,
}

impl Scratchpad {
    /// Create an empty scratchpad of `capacity` bytes.
    pub fn new(capacity: u32) -> Self {
        Scratchpad {
            capacity,
            state: ScratchpadState::Idle,
            data: Vec::new(),
            expected: 0,
            seq: 0,
            crc: 0,
            processed: Processed {
                status: STATUS_NEW,
                ..Default::default()
            },
        }
    }

    /// Current write state.
    pub fn state(&self) -> ScratchpadState {
        self.state
    }

    /// Bytes written so far.
    pub fn written(&self) -> usize {
        self.data.len()
    }

    /// Erase the scratchpad.
    pub fn clear(&mut self) {
        self.state = ScratchpadState::Idle;
        self.data.clear();
        self.expected = 0;
        self.seq = 0;
        self.crc = 0;
    }

    /// Start a new image, discarding any previous one.
    pub fn begin(&mut self, num_bytes: u32, seq: u8) -> StackResult<()> {
        if num_bytes == 0 || num_bytes % IMAGE_ALIGNMENT != 0 || num_bytes > self.capacity {
            return Err(StackError::InvalidValue);
        }
        self.clear();
        self.state = ScratchpadState::Writing;
        self.expected = num_bytes;
        self.seq = seq;
        debug!(num_bytes, seq, "scratchpad write started");
        Ok(())
    }

    /// Append one block. Blocks must arrive in order.
    pub fn write(&mut self, start: u32, bytes: &[u8]) -> OtapWrite {
        if self.state != ScratchpadState::Writing {
            return OtapWrite::NotOngoing;
        }
        if bytes.is_empty() {
            return OtapWrite::InvalidNullBytes;
        }
        if start as usize != self.data.len() {
            return OtapWrite::InvalidStart;
        }
        let end = self.data.len() + bytes.len();
        if bytes.len() > SCRATCHPAD_BLOCK_MAX_BYTES || end > self.expected as usize {
            return OtapWrite::InvalidNumBytes;
        }

        self.data.extend_from_slice(bytes);
        if end < self.expected as usize {
            return OtapWrite::Ok;
        }

        if is_blank(&self.data) {
            info!(seq = self.seq, "scratchpad image is blank, discarding");
            self.clear();
            return OtapWrite::CompletedError;
        }

        self.crc = SCRATCHPAD_CRC.checksum(&self.data);
        self.state = ScratchpadState::Written;
        info!(
            num_bytes = self.expected,
            seq = self.seq,
            crc = self.crc,
            "scratchpad image complete"
        );
        OtapWrite::CompletedOk
    }

    /// Mark a complete image to be processed on next boot.
    pub fn set_to_be_processed(&mut self) -> StackResult<()> {
        match self.state {
            ScratchpadState::Written => {
                self.state = ScratchpadState::Bootable;
                Ok(())
            }
            ScratchpadState::Bootable => Ok(()),
            _ => Err(StackError::InvalidStackState),
        }
    }

    /// Process a bootable image, as the bootloader does on reboot.
    ///
    /// Returns whether an image was processed.
    pub fn process_on_boot(&mut self) -> bool {
        if self.state != ScratchpadState::Bootable {
            return false;
        }
        self.processed = Processed {
            status: STATUS_SUCCESS,
            num_bytes: self.expected,
            crc: self.crc,
            seq: self.seq,
        };
        info!(seq = self.seq, crc = self.crc, "scratchpad image processed");
        self.clear();
        true
    }

    /// Status block, without the firmware version.
    pub fn status(&self) -> ScratchpadStatus {
        let (num_bytes, crc, seq, scratchpad_type) = match self.state {
            ScratchpadState::Idle => (0, 0, 0, TYPE_BLANK),
            ScratchpadState::Writing => (self.expected, 0, self.seq, TYPE_BLANK),
            ScratchpadState::Written => (self.expected, self.crc, self.seq, TYPE_PRESENT),
            ScratchpadState::Bootable => (self.expected, self.crc, self.seq, TYPE_PROCESS),
        };
        ScratchpadStatus {
            num_bytes,
            crc,
            seq,
            scratchpad_type,
            status: self.processed.status,
            processed_num_bytes: self.processed.num_bytes,
            processed_crc: self.processed.crc,
            processed_seq: self.processed.seq,
            area_id: AREA_ID,
            ..Default::default()
        }
    }
}

fn is_blank(data: &[u8]) -> bool {
    data.iter().all(|&b| b == 0xFF) || data.iter().all(|&b| b == 0x00)
}
