//! Sink base cost read and write.

use msap_protocol::{Confirm, SinkCostResult};

use super::Reply;
use crate::permission::Feature;
use crate::platform::Platform;

pub(crate) fn write<P: Platform>(platform: &mut P, cost: u8) -> Reply {
    let result = if !platform.is_feature_permitted(Feature::SinkCostWrite) {
        SinkCostResult::AccessDenied
    } else {
        match platform.set_sink_cost(cost) {
            Ok(()) => SinkCostResult::Ok,
            Err(err) => err.into(),
        }
    };
    Confirm::SinkCostWrite(result).into()
}

pub(crate) fn read<P: Platform>(platform: &mut P) -> Reply {
    let (result, cost) = if !platform.is_feature_permitted(Feature::SinkCostRead) {
        (SinkCostResult::AccessDenied, 0)
    } else {
        match platform.sink_cost() {
            Ok(cost) => (SinkCostResult::Ok, cost),
            Err(err) => (err.into(), 0),
        }
    };
    Confirm::SinkCostRead { result, cost }.into()
}
