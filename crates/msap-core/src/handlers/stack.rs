//! Stack start and stop.

use msap_protocol::{Confirm, StackStateFlags, StackStopResult};
use tracing::{debug, info, warn};

use super::Reply;
use crate::item::PostSend;
use crate::permission::Feature;
use crate::platform::Platform;

pub(crate) fn start<P: Platform>(platform: &mut P, autostart: bool) -> Option<Reply> {
    if !platform.is_feature_permitted(Feature::StackStart) {
        debug!("stack start denied");
        return Some(
            Confirm::StackStart {
                flags: StackStateFlags::ACCESS_DENIED,
            }
            .into(),
        );
    }

    if let Err(err) = platform.set_autostart(autostart) {
        warn!(%err, "failed to persist autostart flag, dropping stack start");
        return None;
    }

    let flags = match platform.start_stack() {
        Ok(()) => {
            info!(autostart, "stack started");
            StackStateFlags::STARTED
        }
        Err(err) => {
            let flags = StackStateFlags::from(platform.stack_state());
            debug!(%err, flags = flags.bits(), "stack start failed");
            flags
        }
    };

    Some(Confirm::StackStart { flags }.into())
}

/// A permitted stop always reboots, even when the stack was not running.
pub(crate) fn stop<P: Platform>(platform: &mut P) -> Option<Reply> {
    if !platform.is_feature_permitted(Feature::StackStop) {
        debug!("stack stop denied");
        return Some(Confirm::StackStop(StackStopResult::AccessDenied).into());
    }

    let result = if platform.stack_state().is_started() {
        StackStopResult::Ok
    } else {
        StackStopResult::AlreadyStopped
    };

    if let Err(err) = platform.set_autostart(false) {
        warn!(%err, "failed to clear autostart flag, dropping stack stop");
        return None;
    }

    info!(?result, "stack stop accepted, reboot scheduled");
    Some(Reply::from(Confirm::StackStop(result)).after_send(PostSend::Reboot))
}
