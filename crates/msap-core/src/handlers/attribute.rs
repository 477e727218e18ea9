//! Attribute read and write.

use msap_protocol::{AttributeResult, Confirm, ATTR_SYSTEM_TIME};
use tracing::debug;

use super::Reply;
use crate::attributes;
use crate::item::PreSend;
use crate::permission::Feature;
use crate::platform::Platform;

pub(crate) fn read<P: Platform>(platform: &mut P, id: u16) -> Reply {
    let (result, value) = match read_value(platform, id) {
        Ok(value) => (AttributeResult::Success, value),
        Err(result) => {
            debug!(id, ?result, "attribute read failed");
            (result, Vec::new())
        }
    };

    let reply = Reply::from(Confirm::AttributeRead { result, id, value });
    if result == AttributeResult::Success && id == ATTR_SYSTEM_TIME {
        reply.before_send(PreSend::StampSystemTime)
    } else {
        reply
    }
}

fn read_value<P: Platform>(platform: &P, id: u16) -> Result<Vec<u8>, AttributeResult> {
    let descriptor =
        attributes::lookup::<P>(id).ok_or(AttributeResult::UnsupportedAttribute)?;

    if !platform.is_feature_permitted(descriptor.read_feature) {
        return Err(AttributeResult::AccessDenied);
    }

    let mut value = vec![0u8; descriptor.size];
    (descriptor.reader)(platform, &mut value)?;
    Ok(value)
}

pub(crate) fn write<P: Platform>(platform: &mut P, id: u16, value: &[u8]) -> Reply {
    let result = match write_value(platform, id, value) {
        Ok(()) => AttributeResult::Success,
        Err(result) => {
            debug!(id, ?result, "attribute write failed");
            result
        }
    };
    Confirm::AttributeWrite(result).into()
}

fn write_value<P: Platform>(platform: &mut P, id: u16, value: &[u8]) -> Result<(), AttributeResult> {
    let descriptor =
        attributes::lookup::<P>(id).ok_or(AttributeResult::UnsupportedAttribute)?;

    if !platform.is_feature_permitted(Feature::AttributeWrite) {
        return Err(AttributeResult::AccessDenied);
    }

    if value.len() != descriptor.size {
        return Err(AttributeResult::InvalidLength);
    }

    let writer = descriptor
        .writer
        .ok_or(AttributeResult::UnsupportedAttribute)?;
    writer(platform, value)?;
    Ok(())
}
