//! Indication builders and the outgoing indication queue.

use std::collections::VecDeque;

use msap_protocol::{AppConfig, Indication, IndicationCode, StackStateFlags, APP_CONFIG_SIZE};

use crate::item::Item;

/// Stack state changed.
pub fn stack_state(flags: StackStateFlags) -> Indication {
    Indication::StackState { pending: 0, flags }
}

/// Neighbor scan finished.
pub fn scan_complete() -> Indication {
    Indication::ScanNeighbors {
        pending: 0,
        scan_ready: 1,
    }
}

/// New app config data received from the network.
pub fn app_config_received(seq: u8, data: &[u8; APP_CONFIG_SIZE], interval: u16) -> Indication {
    Indication::AppConfigReceived {
        pending: 0,
        config: AppConfig {
            seq,
            interval,
            data: *data,
        },
    }
}

/// FIFO of indication items waiting for the host to poll.
#[derive(Debug, Default)]
pub(crate) struct IndicationQueue {
    items: VecDeque<Item>,
}

impl IndicationQueue {
    pub fn push(&mut self, item: Item) {
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<Item> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First queued item of the given indication type.
    pub fn find_mut(&mut self, kind: IndicationCode) -> Option<&mut Item> {
        let code = u8::from(kind);
        self.items.iter_mut().find(|item| item.frame.function == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msap_protocol::FUNC_APP_CONFIG_RX_IND;

    #[test]
    fn test_builders() {
        let frame = scan_complete().to_frame();
        assert_eq!(frame.payload, vec![0, 1]);

        let data = [0x5A; APP_CONFIG_SIZE];
        let frame = app_config_received(3, &data, 60).to_frame();
        assert_eq!(frame.function, FUNC_APP_CONFIG_RX_IND);
        assert_eq!(&frame.payload[..4], &[0, 3, 60, 0]);
        assert_eq!(frame.payload[4], 0x5A);
    }
}
