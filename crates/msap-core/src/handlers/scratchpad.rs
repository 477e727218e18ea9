//! Scratchpad (OTAP) handlers.
//!
//! Every mutating step requires the stack to be stopped. Clear, start and
//! bootable share the scratchpad-start permission; status has its own bit.
//! Block writes are only gated by stack state: a session can only exist if
//! start was permitted.

use msap_protocol::{
    Confirm, ScratchpadBlockResult, ScratchpadBootableResult, ScratchpadClearResult,
    ScratchpadStartResult, ScratchpadStatus,
};
use tracing::{debug, info};

use super::Reply;
use crate::permission::Feature;
use crate::platform::{OtapWrite, Platform};

impl From<OtapWrite> for ScratchpadBlockResult {
    fn from(write: OtapWrite) -> Self {
        match write {
            OtapWrite::Ok => ScratchpadBlockResult::Success,
            OtapWrite::CompletedOk => ScratchpadBlockResult::CompletedOk,
            OtapWrite::CompletedError => ScratchpadBlockResult::CompletedError,
            OtapWrite::NotOngoing => ScratchpadBlockResult::NotOngoing,
            OtapWrite::InvalidStart => ScratchpadBlockResult::InvalidStartAddress,
            OtapWrite::InvalidNumBytes => ScratchpadBlockResult::InvalidNumBytes,
            OtapWrite::InvalidHeader | OtapWrite::InvalidNullBytes => {
                ScratchpadBlockResult::InvalidData
            }
        }
    }
}

fn stack_started<P: Platform>(platform: &P) -> bool {
    platform.stack_state().is_started()
}

/// Clearing is synchronous: the confirm means the scratchpad is erased.
pub(crate) fn clear<P: Platform>(platform: &mut P) -> Reply {
    let result = if !platform.is_feature_permitted(Feature::ScratchpadStart) {
        ScratchpadClearResult::AccessDenied
    } else if stack_started(platform) {
        ScratchpadClearResult::InvalidState
    } else {
        platform.clear();
        info!("scratchpad cleared");
        ScratchpadClearResult::Success
    };
    Confirm::ScratchpadClear(result).into()
}

pub(crate) fn start<P: Platform>(platform: &mut P, num_bytes: u32, seq: u8) -> Reply {
    let result = if !platform.is_feature_permitted(Feature::ScratchpadStart) {
        ScratchpadStartResult::AccessDenied
    } else if stack_started(platform) {
        ScratchpadStartResult::InvalidState
    } else {
        match platform.begin(num_bytes, seq) {
            Ok(()) => {
                info!(num_bytes, seq, "scratchpad write started");
                ScratchpadStartResult::Success
            }
            Err(err) => {
                debug!(%err, num_bytes, "scratchpad start rejected");
                ScratchpadStartResult::InvalidNumBytes
            }
        }
    };
    Confirm::ScratchpadStart(result).into()
}

pub(crate) fn block<P: Platform>(platform: &mut P, start_address: u32, bytes: &[u8]) -> Reply {
    let result = if stack_started(platform) {
        ScratchpadBlockResult::InvalidState
    } else {
        ScratchpadBlockResult::from(platform.write(start_address, bytes))
    };

    match result {
        ScratchpadBlockResult::CompletedOk => info!("scratchpad image complete"),
        ScratchpadBlockResult::Success => {}
        other => debug!(start_address, len = bytes.len(), result = ?other, "scratchpad block"),
    }

    Confirm::ScratchpadBlock(result).into()
}

/// A denied query returns an all-zero block.
pub(crate) fn status<P: Platform>(platform: &mut P) -> Reply {
    let status = if platform.is_feature_permitted(Feature::ScratchpadStatus) {
        ScratchpadStatus {
            firmware: platform.firmware_version(),
            ..platform.scratchpad_status()
        }
    } else {
        ScratchpadStatus::default()
    };
    Confirm::ScratchpadStatus(status).into()
}

pub(crate) fn bootable<P: Platform>(platform: &mut P) -> Reply {
    let result = if !platform.is_feature_permitted(Feature::ScratchpadStart) {
        ScratchpadBootableResult::AccessDenied
    } else if stack_started(platform) {
        ScratchpadBootableResult::InvalidState
    } else {
        match platform.set_to_be_processed() {
            Ok(()) => {
                info!("scratchpad marked bootable");
                ScratchpadBootableResult::Success
            }
            Err(_) => ScratchpadBootableResult::NoScratchpad,
        }
    };
    Confirm::ScratchpadBootable(result).into()
}
