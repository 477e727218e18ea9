//! Max message queuing time per priority class.

use msap_protocol::{Confirm, Priority, QueuingTimeResult};

use super::Reply;
use crate::platform::Platform;

pub(crate) fn write<P: Platform>(platform: &mut P, priority: u8, time: u16) -> Reply {
    let result = match Priority::try_from(priority) {
        Err(_) => QueuingTimeResult::InvalidValue,
        Ok(priority) => match platform.set_max_queuing_time(priority, time) {
            Ok(()) => QueuingTimeResult::Success,
            Err(err) => err.into(),
        },
    };
    Confirm::QueuingTimeWrite(result).into()
}

pub(crate) fn read<P: Platform>(platform: &mut P, priority: u8) -> Reply {
    let (result, time) = match Priority::try_from(priority) {
        Err(_) => (QueuingTimeResult::InvalidValue, 0),
        Ok(priority) => match platform.max_queuing_time(priority) {
            Ok(time) => (QueuingTimeResult::Success, time),
            Err(err) => (err.into(), 0),
        },
    };
    Confirm::QueuingTimeRead { result, time }.into()
}
