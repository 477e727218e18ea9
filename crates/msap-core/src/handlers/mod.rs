//! Request handlers.
//!
//! Each handler receives an already length-validated request, consults the
//! permission gate before touching any collaborator, computes its result
//! into a local value and only then builds the confirm. A handler returns
//! `None` when no confirm must be sent.

mod app_config;
mod attribute;
mod neighbors;
mod poll;
mod queuing_time;
mod scratchpad;
mod sink_cost;
mod sleep;
mod stack;

use msap_protocol::{Confirm, Request};

use crate::item::{PostSend, PreSend};
use crate::platform::Platform;

/// A confirm plus the steps to run around its transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reply {
    pub confirm: Confirm,
    pub pre_send: Option<PreSend>,
    pub post_send: Option<PostSend>,
}

impl Reply {
    pub fn before_send(mut self, step: PreSend) -> Self {
        self.pre_send = Some(step);
        self
    }

    pub fn after_send(mut self, step: PostSend) -> Self {
        self.post_send = Some(step);
        self
    }
}

impl From<Confirm> for Reply {
    fn from(confirm: Confirm) -> Self {
        Reply {
            confirm,
            pre_send: None,
            post_send: None,
        }
    }
}

/// Run the handler for a decoded request.
pub(crate) fn dispatch<P: Platform>(platform: &mut P, request: Request) -> Option<Reply> {
    match request {
        Request::IndicationPoll => Some(poll::poll()),
        Request::StackStart { autostart } => stack::start(platform, autostart),
        Request::StackStop => stack::stop(platform),
        Request::AttributeWrite { id, value } => Some(attribute::write(platform, id, &value)),
        Request::AttributeRead { id } => Some(attribute::read(platform, id)),
        Request::ScratchpadStart { num_bytes, seq } => {
            Some(scratchpad::start(platform, num_bytes, seq))
        }
        Request::ScratchpadBlock {
            start_address,
            bytes,
        } => Some(scratchpad::block(platform, start_address, &bytes)),
        Request::ScratchpadStatus => Some(scratchpad::status(platform)),
        Request::ScratchpadBootable => Some(scratchpad::bootable(platform)),
        Request::ScratchpadClear => Some(scratchpad::clear(platform)),
        Request::RemoteStatus { .. } => Some(poll::remote_status()),
        Request::RemoteUpdate { .. } => Some(poll::remote_update()),
        Request::GetNeighbors => neighbors::get(platform),
        Request::ScanNeighbors => Some(neighbors::scan(platform)),
        Request::SinkCostWrite { cost } => Some(sink_cost::write(platform, cost)),
        Request::SinkCostRead => Some(sink_cost::read(platform)),
        Request::AppConfigWrite(config) => Some(app_config::write(platform, &config)),
        Request::AppConfigRead => Some(app_config::read(platform)),
        Request::Sleep {
            seconds,
            ignore_app_config_interval,
        } => Some(sleep::sleep(platform, seconds, ignore_app_config_interval)),
        Request::SleepStop => Some(sleep::wakeup(platform)),
        Request::SleepState => Some(sleep::state(platform)),
        Request::GotoSleepInfo => Some(sleep::gotosleep_info(platform)),
        Request::QueuingTimeWrite { priority, time } => {
            Some(queuing_time::write(platform, priority, time))
        }
        Request::QueuingTimeRead { priority } => Some(queuing_time::read(platform, priority)),
    }
}
