//! Low-power sleep control.
//!
//! Permission for these requests is enforced by the stack itself.

use msap_protocol::{Confirm, SleepResult, SleepState};
use tracing::info;

use super::Reply;
use crate::error::StackError;
use crate::platform::Platform;

pub(crate) fn sleep<P: Platform>(platform: &mut P, seconds: u32, ignore_interval: bool) -> Reply {
    let result = match platform.sleep_for(seconds, ignore_interval) {
        Ok(()) => {
            info!(seconds, ignore_interval, "stack going to sleep");
            SleepResult::Success
        }
        Err(err) => err.into(),
    };
    Confirm::Sleep(result).into()
}

pub(crate) fn wakeup<P: Platform>(platform: &mut P) -> Reply {
    let result = match platform.wakeup() {
        Ok(()) => SleepResult::Success,
        Err(StackError::InvalidStackState) => SleepResult::InvalidState,
        Err(_) => SleepResult::AccessDenied,
    };
    Confirm::SleepStop(result).into()
}

pub(crate) fn state<P: Platform>(platform: &mut P) -> Reply {
    let state = if platform.is_sleeping() {
        SleepState::Active
    } else {
        SleepState::NotStarted
    };
    Confirm::SleepState {
        state,
        countdown: platform.wakeup_countdown(),
    }
    .into()
}

pub(crate) fn gotosleep_info<P: Platform>(platform: &mut P) -> Reply {
    Confirm::GotoSleepInfo {
        seconds: platform.latest_gotosleep(),
    }
    .into()
}
