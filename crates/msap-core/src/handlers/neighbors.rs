//! Neighbor table query and scan.

use msap_protocol::{Confirm, NeighborEntry, NeighborRole, ScanNeighborsResult, MAX_NEIGHBORS};
use tracing::{debug, warn};

use super::Reply;
use crate::permission::Feature;
use crate::platform::{NeighborInfo, NeighborKind, Platform};

/// A denied query still answers with the full zero-filled table.
/// A failed query answers nothing rather than a partial list.
pub(crate) fn get<P: Platform>(platform: &mut P) -> Option<Reply> {
    if !platform.is_feature_permitted(Feature::GetNeighbors) {
        debug!("neighbor query denied");
        return Some(Confirm::GetNeighbors { neighbors: Vec::new() }.into());
    }

    let neighbors = match platform.neighbors() {
        Ok(neighbors) => neighbors,
        Err(err) => {
            warn!(%err, "neighbor query failed");
            return None;
        }
    };

    let neighbors = neighbors.iter().take(MAX_NEIGHBORS).map(to_entry).collect();
    Some(Confirm::GetNeighbors { neighbors }.into())
}

fn to_entry(info: &NeighborInfo) -> NeighborEntry {
    let role = match info.kind {
        NeighborKind::NextHop => NeighborRole::NextHop,
        NeighborKind::Member => NeighborRole::Member,
        NeighborKind::Other => NeighborRole::Cluster,
    };
    NeighborEntry {
        address: info.address,
        link_reliability: info.link_reliability,
        rssi: info.norm_rssi,
        cost: info.cost,
        channel: info.channel,
        role: role.into(),
        tx_power: info.tx_power,
        rx_power: info.rx_power,
        last_update: info.last_update,
    }
}

/// Completion is reported later through a scan indication.
pub(crate) fn scan<P: Platform>(platform: &mut P) -> Reply {
    let result = if !platform.is_feature_permitted(Feature::ScanNeighbors) {
        ScanNeighborsResult::AccessDenied
    } else {
        match platform.start_neighbor_scan() {
            Ok(()) => ScanNeighborsResult::Success,
            Err(err) => err.into(),
        }
    };
    Confirm::ScanNeighbors(result).into()
}
