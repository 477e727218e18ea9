//! Indication poll and retired remote scratchpad requests.

use msap_protocol::{Confirm, RemoteStatusResult, RemoteUpdateResult};

use super::Reply;
use crate::item::PreSend;

/// The pending flag is filled in just before transmission.
pub(crate) fn poll() -> Reply {
    Reply::from(Confirm::IndicationPoll { pending: 0 }).before_send(PreSend::PendingIndications)
}

/// Remote status is no longer supported by the stack; answer access denied
/// so existing hosts keep working.
pub(crate) fn remote_status() -> Reply {
    Confirm::RemoteStatus(RemoteStatusResult::AccessDenied).into()
}

pub(crate) fn remote_update() -> Reply {
    Confirm::RemoteUpdate(RemoteUpdateResult::AccessDenied).into()
}
