//! App config data read and write.

use msap_protocol::{AppConfig, AppConfigReadResult, AppConfigWriteResult, Confirm};
use tracing::{debug, info};

use super::Reply;
use crate::permission::Feature;
use crate::platform::Platform;

/// On any failure the config is returned zero-filled.
pub(crate) fn read<P: Platform>(platform: &mut P) -> Reply {
    let (result, config) = if !platform.is_feature_permitted(Feature::AppConfigRead) {
        (AppConfigReadResult::AccessDenied, AppConfig::default())
    } else {
        match platform.read_app_config() {
            Ok(config) => (AppConfigReadResult::Success, config),
            Err(err) => {
                debug!(%err, "app config read failed");
                (err.into(), AppConfig::default())
            }
        }
    };

    Confirm::AppConfigRead { result, config }.into()
}

pub(crate) fn write<P: Platform>(platform: &mut P, config: &AppConfig) -> Reply {
    let result = if !platform.is_feature_permitted(Feature::AppConfigWrite) {
        AppConfigWriteResult::AccessDenied
    } else {
        match platform.write_app_config(config) {
            Ok(()) => {
                info!(seq = config.seq, interval = config.interval, "app config written");
                AppConfigWriteResult::Success
            }
            Err(err) => {
                debug!(%err, "app config write failed");
                err.into()
            }
        }
    };

    Confirm::AppConfigWrite(result).into()
}
