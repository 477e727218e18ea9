//! End-to-end tests of the MSAP engine against the simulated node.
//!
//! Every exchange goes through the same path a transport uses:
//! accept, handle, pre-send, decode the confirm, post-send.

use std::time::Duration;

use msap_core::sim::{NodeEvent, ScratchpadState, SimulatedNode, SimulatedNodeConfig};
use msap_core::{Feature, LockBitmap, Msap, MsapConfig, Outcome};
use msap_protocol::*;

const SEQ: u8 = 0x5C;

fn engine(config: &SimulatedNodeConfig) -> Msap<SimulatedNode> {
    Msap::new(SimulatedNode::new("test", config), MsapConfig::default())
}

fn router() -> Msap<SimulatedNode> {
    engine(&SimulatedNodeConfig::router(1))
}

fn started_router() -> Msap<SimulatedNode> {
    let mut msap = router();
    assert_eq!(
        exchange(&mut msap, Request::StackStart { autostart: false }),
        Some(Confirm::StackStart {
            flags: StackStateFlags::STARTED
        })
    );
    msap
}

/// Run a raw frame through the engine; return the outcome and the confirm.
fn exchange_frame(msap: &mut Msap<SimulatedNode>, frame: Frame) -> (Outcome, Option<Confirm>) {
    let mut item = msap.accept(frame).expect("request item available");
    let outcome = msap.handle(&mut item);
    let confirm = if outcome == Outcome::Responded {
        msap.pre_send(&mut item);
        assert_eq!(item.frame.sequence_id, SEQ);
        Some(Confirm::decode(&item.frame).expect("confirm decodes"))
    } else {
        None
    };
    msap.post_send(item);
    (outcome, confirm)
}

fn exchange(msap: &mut Msap<SimulatedNode>, request: Request) -> Option<Confirm> {
    exchange_frame(msap, request.to_frame(SEQ)).1
}

fn write_attr(msap: &mut Msap<SimulatedNode>, id: u16, value: Vec<u8>) -> AttributeResult {
    match exchange(msap, Request::AttributeWrite { id, value }) {
        Some(Confirm::AttributeWrite(result)) => result,
        other => panic!("unexpected confirm {:?}", other),
    }
}

fn read_attr(msap: &mut Msap<SimulatedNode>, id: u16) -> (AttributeResult, Vec<u8>) {
    match exchange(msap, Request::AttributeRead { id }) {
        Some(Confirm::AttributeRead {
            result,
            id: echoed,
            value,
        }) => {
            assert_eq!(echoed, id);
            (result, value)
        }
        other => panic!("unexpected confirm {:?}", other),
    }
}

fn sample_requests() -> Vec<Request> {
    vec![
        Request::IndicationPoll,
        Request::StackStart { autostart: true },
        Request::StackStop,
        Request::AttributeWrite {
            id: ATTR_ENERGY,
            value: vec![3],
        },
        Request::AttributeRead { id: ATTR_ENERGY },
        Request::ScratchpadStart {
            num_bytes: 32,
            seq: 1,
        },
        Request::ScratchpadBlock {
            start_address: 0,
            bytes: vec![1; 16],
        },
        Request::ScratchpadStatus,
        Request::ScratchpadBootable,
        Request::ScratchpadClear,
        Request::RemoteStatus { address: 9 },
        Request::RemoteUpdate {
            address: 9,
            seq: 1,
            reboot_delay: 10,
        },
        Request::GetNeighbors,
        Request::ScanNeighbors,
        Request::SinkCostWrite { cost: 1 },
        Request::SinkCostRead,
        Request::AppConfigWrite(AppConfig::default()),
        Request::AppConfigRead,
        Request::Sleep {
            seconds: 60,
            ignore_app_config_interval: false,
        },
        Request::SleepStop,
        Request::SleepState,
        Request::GotoSleepInfo,
        Request::QueuingTimeWrite {
            priority: 0,
            time: 30,
        },
        Request::QueuingTimeRead { priority: 0 },
    ]
}

/// Observable node state that a denied request must not change.
fn snapshot(node: &SimulatedNode) -> String {
    use msap_core::{DataPlane, NetworkStack, Otap, Persistence, StackSettings};
    format!(
        "{:?} {:?} {:?} {:?} {:?} {:?} {:?} {:?} {:?}",
        node.is_started(),
        node.reboots(),
        node.autostart(),
        node.energy(),
        node.sink_cost(),
        node.read_app_config(),
        node.scratchpad_status(),
        node.access_cycle_range(),
        node.multicast_groups(),
    )
}

// ============================================================================
// Framing
// ============================================================================

#[test]
fn test_length_mismatch_produces_no_response_for_every_code() {
    for request in sample_requests() {
        let good = request.to_frame(SEQ);

        let mut longer = good.clone();
        longer.payload.push(0);
        let mut msap = router();
        let before = snapshot(msap.platform());
        let (outcome, confirm) = exchange_frame(&mut msap, longer);
        assert_eq!(outcome, Outcome::Rejected, "{:?} with extra byte", request.code());
        assert!(confirm.is_none());
        assert_eq!(snapshot(msap.platform()), before);

        if !good.payload.is_empty() {
            let mut shorter = good.clone();
            shorter.payload.pop();
            let (outcome, _) = exchange_frame(&mut msap, shorter);
            assert_eq!(outcome, Outcome::Rejected, "{:?} truncated", request.code());
            assert_eq!(snapshot(msap.platform()), before);
        }
    }
}

#[test]
fn test_every_request_code_is_answered() {
    for request in sample_requests() {
        let mut msap = router();
        let code = request.code();
        let (outcome, confirm) = exchange_frame(&mut msap, request.to_frame(SEQ));
        assert_eq!(outcome, Outcome::Responded, "{:?}", code);
        assert_eq!(confirm.map(|c| c.request_code()), Some(code));
    }
}

#[test]
fn test_unknown_function_is_unhandled_and_untouched() {
    let mut msap = router();
    let frame = Frame::new(0x7E, SEQ, vec![1, 2, 3]);
    let mut item = msap.accept(frame.clone()).unwrap();
    assert_eq!(msap.handle(&mut item), Outcome::Unhandled);
    assert_eq!(item.frame, frame);
    msap.release(item);
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_writable_attributes_round_trip() {
    let mut msap = router();

    let mut groups = Vec::new();
    for g in [0x8000_0001u32, 0x8000_00FF] {
        groups.extend_from_slice(&g.to_le_bytes());
    }
    groups.resize(MAX_ATTRIBUTE_SIZE, 0);

    let cases = vec![
        (ATTR_ENERGY, vec![42]),
        (ATTR_AUTOSTART, vec![1]),
        (
            ATTR_ACCESS_CYCLE_RANGE,
            (2000u32 | (4000 << 16)).to_le_bytes().to_vec(),
        ),
        (ATTR_MULTICAST_GROUPS, groups),
    ];

    for (id, value) in cases {
        assert_eq!(write_attr(&mut msap, id, value.clone()), AttributeResult::Success);
        assert_eq!(read_attr(&mut msap, id), (AttributeResult::Success, value));
    }
}

#[test]
fn test_autostart_rejects_non_boolean() {
    let mut msap = router();
    assert_eq!(write_attr(&mut msap, ATTR_AUTOSTART, vec![1]), AttributeResult::Success);
    assert_eq!(write_attr(&mut msap, ATTR_AUTOSTART, vec![2]), AttributeResult::InvalidValue);
    assert_eq!(
        read_attr(&mut msap, ATTR_AUTOSTART),
        (AttributeResult::Success, vec![1])
    );
}

#[test]
fn test_attribute_write_errors() {
    let mut msap = router();
    assert_eq!(write_attr(&mut msap, 0, vec![1]), AttributeResult::UnsupportedAttribute);
    assert_eq!(write_attr(&mut msap, 14, vec![1]), AttributeResult::UnsupportedAttribute);
    assert_eq!(write_attr(&mut msap, ATTR_ENERGY, vec![1, 2]), AttributeResult::InvalidLength);
    assert_eq!(
        write_attr(&mut msap, ATTR_STACK_STATUS, vec![0]),
        AttributeResult::UnsupportedAttribute
    );
    assert_eq!(
        write_attr(&mut msap, ATTR_ACCESS_CYCLE_RANGE, 3000u32.to_le_bytes().to_vec()),
        AttributeResult::InvalidValue
    );
}

#[test]
fn test_attribute_reads() {
    let mut msap = router();
    assert_eq!(read_attr(&mut msap, 0xFFFF), (AttributeResult::UnsupportedAttribute, vec![]));
    assert_eq!(
        read_attr(&mut msap, ATTR_NEIGHBOR_COUNT),
        (AttributeResult::UnsupportedAttribute, vec![])
    );
    assert_eq!(read_attr(&mut msap, ATTR_SCRATCHPAD_BLOCK_MAX), (AttributeResult::Success, vec![112]));
    assert_eq!(read_attr(&mut msap, ATTR_PDU_BUFFER_CAPACITY), (AttributeResult::Success, vec![32]));
    assert_eq!(read_attr(&mut msap, ATTR_PDU_BUFFER_USAGE), (AttributeResult::Success, vec![0]));
    assert_eq!(
        read_attr(&mut msap, ATTR_CURRENT_ACCESS_CYCLE),
        (AttributeResult::InvalidStackState, vec![])
    );

    let (result, flags) = read_attr(&mut msap, ATTR_STACK_STATUS);
    assert_eq!(result, AttributeResult::Success);
    assert_eq!(flags, vec![StackStateFlags::STOPPED.bits()]);

    let mut msap = started_router();
    assert_eq!(read_attr(&mut msap, ATTR_STACK_STATUS), (AttributeResult::Success, vec![0]));
    assert_eq!(
        read_attr(&mut msap, ATTR_CURRENT_ACCESS_CYCLE),
        (AttributeResult::Success, 8000u16.to_le_bytes().to_vec())
    );
}

#[test]
fn test_system_time_is_stamped_at_send() {
    let mut msap = router();
    msap.platform_mut().advance_time(Duration::from_secs(4));
    let (result, value) = read_attr(&mut msap, ATTR_SYSTEM_TIME);
    assert_eq!(result, AttributeResult::Success);
    let ticks = u32::from_le_bytes(value.try_into().unwrap());
    assert!(ticks >= 4 * 122, "ticks = {}", ticks);
}

#[test]
fn test_attribute_read_permission_buckets() {
    let mut msap = router();
    msap.platform_mut().lock(Feature::GetNeighbors);
    assert_eq!(
        read_attr(&mut msap, ATTR_ROUTE_COUNT),
        (AttributeResult::AccessDenied, vec![])
    );
    assert_eq!(read_attr(&mut msap, ATTR_ENERGY).0, AttributeResult::Success);

    msap.platform_mut().lock(Feature::ScratchpadStatus);
    assert_eq!(
        read_attr(&mut msap, ATTR_SCRATCHPAD_BLOCK_MAX),
        (AttributeResult::AccessDenied, vec![])
    );
}

// ============================================================================
// Permissions
// ============================================================================

#[test]
fn test_denied_requests_do_not_mutate() {
    let cases: Vec<(Feature, Request, Confirm)> = vec![
        (
            Feature::StackStart,
            Request::StackStart { autostart: true },
            Confirm::StackStart {
                flags: StackStateFlags::ACCESS_DENIED,
            },
        ),
        (
            Feature::StackStop,
            Request::StackStop,
            Confirm::StackStop(StackStopResult::AccessDenied),
        ),
        (
            Feature::AttributeWrite,
            Request::AttributeWrite {
                id: ATTR_ENERGY,
                value: vec![9],
            },
            Confirm::AttributeWrite(AttributeResult::AccessDenied),
        ),
        (
            Feature::AttributeRead,
            Request::AttributeRead { id: ATTR_ENERGY },
            Confirm::AttributeRead {
                result: AttributeResult::AccessDenied,
                id: ATTR_ENERGY,
                value: vec![],
            },
        ),
        (
            Feature::AppConfigWrite,
            Request::AppConfigWrite(AppConfig {
                seq: 1,
                interval: 30,
                data: [7; APP_CONFIG_SIZE],
            }),
            Confirm::AppConfigWrite(AppConfigWriteResult::AccessDenied),
        ),
        (
            Feature::AppConfigRead,
            Request::AppConfigRead,
            Confirm::AppConfigRead {
                result: AppConfigReadResult::AccessDenied,
                config: AppConfig::default(),
            },
        ),
        (
            Feature::SinkCostWrite,
            Request::SinkCostWrite { cost: 5 },
            Confirm::SinkCostWrite(SinkCostResult::AccessDenied),
        ),
        (
            Feature::SinkCostRead,
            Request::SinkCostRead,
            Confirm::SinkCostRead {
                result: SinkCostResult::AccessDenied,
                cost: 0,
            },
        ),
        (
            Feature::ScanNeighbors,
            Request::ScanNeighbors,
            Confirm::ScanNeighbors(ScanNeighborsResult::AccessDenied),
        ),
        (
            Feature::ScratchpadStart,
            Request::ScratchpadClear,
            Confirm::ScratchpadClear(ScratchpadClearResult::AccessDenied),
        ),
        (
            Feature::ScratchpadStart,
            Request::ScratchpadStart {
                num_bytes: 32,
                seq: 2,
            },
            Confirm::ScratchpadStart(ScratchpadStartResult::AccessDenied),
        ),
        (
            Feature::ScratchpadStart,
            Request::ScratchpadBootable,
            Confirm::ScratchpadBootable(ScratchpadBootableResult::AccessDenied),
        ),
        (
            Feature::ScratchpadStatus,
            Request::ScratchpadStatus,
            Confirm::ScratchpadStatus(ScratchpadStatus::default()),
        ),
    ];

    for (feature, request, expected) in cases {
        let mut msap = engine(&SimulatedNodeConfig::sink(1));
        msap.platform_mut().set_lock_bits(LockBitmap::locking(&[feature]));
        msap.platform_mut().take_events();
        let before = snapshot(msap.platform());

        assert_eq!(exchange(&mut msap, request), Some(expected), "{:?}", feature);
        assert_eq!(snapshot(msap.platform()), before, "{:?} mutated state", feature);
        assert!(msap.platform_mut().take_events().is_empty());
    }
}

// ============================================================================
// Stack Lifecycle
// ============================================================================

#[test]
fn test_stack_start_reports_unmet_preconditions() {
    let mut msap = engine(&SimulatedNodeConfig::default());
    let confirm = exchange(&mut msap, Request::StackStart { autostart: true });
    let Some(Confirm::StackStart { flags }) = confirm else {
        panic!("unexpected confirm {:?}", confirm);
    };
    assert!(flags.contains(StackStateFlags::STOPPED));
    assert!(flags.contains(StackStateFlags::NODE_ADDRESS_NOT_SET));
    assert!(flags.contains(StackStateFlags::NETWORK_ADDRESS_NOT_SET));
    assert!(flags.contains(StackStateFlags::NETWORK_CHANNEL_NOT_SET));
    assert!(flags.contains(StackStateFlags::ROLE_NOT_SET));
    assert!(!flags.contains(StackStateFlags::ACCESS_DENIED));

    // The autostart flag is persisted even though the start failed.
    assert_eq!(read_attr(&mut msap, ATTR_AUTOSTART), (AttributeResult::Success, vec![1]));
}

#[test]
fn test_stack_start_persists_autostart() {
    let mut msap = router();
    assert_eq!(
        exchange(&mut msap, Request::StackStart { autostart: true }),
        Some(Confirm::StackStart {
            flags: StackStateFlags::STARTED
        })
    );
    assert!(msap.platform().is_started());
    assert_eq!(read_attr(&mut msap, ATTR_AUTOSTART), (AttributeResult::Success, vec![1]));
    assert_eq!(msap.platform_mut().take_events(), vec![NodeEvent::StackStateChanged]);
}

#[test]
fn test_stack_stop_reboots_after_confirm() {
    let mut msap = router();
    exchange(&mut msap, Request::StackStart { autostart: true });

    let mut item = msap.accept(Request::StackStop.to_frame(SEQ)).unwrap();
    assert_eq!(msap.handle(&mut item), Outcome::Responded);
    msap.pre_send(&mut item);
    assert_eq!(
        Confirm::decode(&item.frame).unwrap(),
        Confirm::StackStop(StackStopResult::Ok)
    );
    // Nothing happens until the confirm has been sent.
    assert!(msap.platform().is_started());
    assert_eq!(msap.platform().reboots(), 0);

    msap.post_send(item);
    assert!(!msap.platform().is_started());
    assert_eq!(msap.platform().reboots(), 1);
    assert_eq!(read_attr(&mut msap, ATTR_AUTOSTART), (AttributeResult::Success, vec![0]));

    // Stopping again still reboots.
    assert_eq!(
        exchange(&mut msap, Request::StackStop),
        Some(Confirm::StackStop(StackStopResult::AlreadyStopped))
    );
    assert_eq!(msap.platform().reboots(), 2);
}

// ============================================================================
// Scratchpad
// ============================================================================

fn image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8 | 1).collect()
}

#[test]
fn test_scratchpad_write_sequence() {
    let mut msap = router();
    let data = image(224);

    assert_eq!(
        exchange(&mut msap, Request::ScratchpadClear),
        Some(Confirm::ScratchpadClear(ScratchpadClearResult::Success))
    );
    assert_eq!(
        exchange(&mut msap, Request::ScratchpadStart { num_bytes: 224, seq: 3 }),
        Some(Confirm::ScratchpadStart(ScratchpadStartResult::Success))
    );
    assert_eq!(
        exchange(
            &mut msap,
            Request::ScratchpadBlock {
                start_address: 0,
                bytes: data[..112].to_vec()
            }
        ),
        Some(Confirm::ScratchpadBlock(ScratchpadBlockResult::Success))
    );
    assert_eq!(
        exchange(
            &mut msap,
            Request::ScratchpadBlock {
                start_address: 112,
                bytes: data[112..].to_vec()
            }
        ),
        Some(Confirm::ScratchpadBlock(ScratchpadBlockResult::CompletedOk))
    );
    assert_eq!(msap.platform().scratchpad_state(), ScratchpadState::Written);

    let Some(Confirm::ScratchpadStatus(status)) = exchange(&mut msap, Request::ScratchpadStatus)
    else {
        panic!("expected a status confirm");
    };
    assert_eq!(status.num_bytes, 224);
    assert_eq!(status.seq, 3);
    assert_eq!(status.scratchpad_type, 1);
    assert_eq!(status.firmware.major, 5);
    let crc = status.crc;

    assert_eq!(
        exchange(&mut msap, Request::ScratchpadBootable),
        Some(Confirm::ScratchpadBootable(ScratchpadBootableResult::Success))
    );

    // The image is processed by the reboot that follows a stack stop.
    exchange(&mut msap, Request::StackStop);
    let Some(Confirm::ScratchpadStatus(status)) = exchange(&mut msap, Request::ScratchpadStatus)
    else {
        panic!("expected a status confirm");
    };
    assert_eq!(status.status, 0);
    assert_eq!(status.processed_seq, 3);
    assert_eq!(status.processed_crc, crc);
    assert_eq!(status.processed_num_bytes, 224);
    assert_eq!(status.scratchpad_type, 0);
}

#[test]
fn test_scratchpad_refused_while_started() {
    let mut msap = router();
    exchange(&mut msap, Request::ScratchpadStart { num_bytes: 32, seq: 1 });
    exchange(&mut msap, Request::StackStart { autostart: false });

    assert_eq!(
        exchange(
            &mut msap,
            Request::ScratchpadBlock {
                start_address: 0,
                bytes: vec![1; 16]
            }
        ),
        Some(Confirm::ScratchpadBlock(ScratchpadBlockResult::InvalidState))
    );
    assert_eq!(
        exchange(&mut msap, Request::ScratchpadStart { num_bytes: 32, seq: 2 }),
        Some(Confirm::ScratchpadStart(ScratchpadStartResult::InvalidState))
    );
    assert_eq!(
        exchange(&mut msap, Request::ScratchpadClear),
        Some(Confirm::ScratchpadClear(ScratchpadClearResult::InvalidState))
    );
    assert_eq!(
        exchange(&mut msap, Request::ScratchpadBootable),
        Some(Confirm::ScratchpadBootable(ScratchpadBootableResult::InvalidState))
    );
    assert_eq!(msap.platform().scratchpad_state(), ScratchpadState::Writing);
}

#[test]
fn test_scratchpad_errors() {
    let mut msap = router();
    assert_eq!(
        exchange(
            &mut msap,
            Request::ScratchpadBlock {
                start_address: 0,
                bytes: vec![1; 16]
            }
        ),
        Some(Confirm::ScratchpadBlock(ScratchpadBlockResult::NotOngoing))
    );
    assert_eq!(
        exchange(&mut msap, Request::ScratchpadStart { num_bytes: 33, seq: 1 }),
        Some(Confirm::ScratchpadStart(ScratchpadStartResult::InvalidNumBytes))
    );
    assert_eq!(
        exchange(&mut msap, Request::ScratchpadBootable),
        Some(Confirm::ScratchpadBootable(ScratchpadBootableResult::NoScratchpad))
    );

    exchange(&mut msap, Request::ScratchpadStart { num_bytes: 32, seq: 1 });
    assert_eq!(
        exchange(
            &mut msap,
            Request::ScratchpadBlock {
                start_address: 16,
                bytes: vec![1; 16]
            }
        ),
        Some(Confirm::ScratchpadBlock(ScratchpadBlockResult::InvalidStartAddress))
    );
    assert_eq!(
        exchange(
            &mut msap,
            Request::ScratchpadBlock {
                start_address: 0,
                bytes: vec![0xFF; 32]
            }
        ),
        Some(Confirm::ScratchpadBlock(ScratchpadBlockResult::CompletedError))
    );
}

// ============================================================================
// Neighbors
// ============================================================================

fn neighbor_config() -> SimulatedNodeConfig {
    let yaml = r#"
node_address: 1
network_address: 100
network_channel: 3
role: router
neighbors:
  - { address: 10, cost: 1, kind: next_hop, link_reliability: 200 }
  - { address: 11, cost: 2, kind: member }
  - { address: 12, cost: 3, kind: other }
"#;
    SimulatedNodeConfig::from_yaml(yaml).unwrap()
}

#[test]
fn test_get_neighbors() {
    let mut msap = engine(&neighbor_config());
    exchange(&mut msap, Request::StackStart { autostart: false });

    let Some(Confirm::GetNeighbors { neighbors }) = exchange(&mut msap, Request::GetNeighbors)
    else {
        panic!("expected a neighbors confirm");
    };
    assert_eq!(neighbors.len(), 3);
    assert_eq!(neighbors[0].address, 10);
    assert_eq!(neighbors[0].link_reliability, 200);
    assert_eq!(neighbors[0].role, u8::from(NeighborRole::NextHop));
    assert_eq!(neighbors[1].role, u8::from(NeighborRole::Member));
    assert_eq!(neighbors[2].role, u8::from(NeighborRole::Cluster));
}

#[test]
fn test_get_neighbors_denied_is_zero_filled() {
    let mut msap = engine(&neighbor_config());
    exchange(&mut msap, Request::StackStart { autostart: false });
    msap.platform_mut().lock(Feature::GetNeighbors);

    let mut item = msap.accept(Request::GetNeighbors.to_frame(SEQ)).unwrap();
    assert_eq!(msap.handle(&mut item), Outcome::Responded);
    assert_eq!(item.frame.payload.len(), 1 + MAX_NEIGHBORS * NEIGHBOR_ENTRY_SIZE);
    assert!(item.frame.payload.iter().all(|&b| b == 0));
    msap.post_send(item);
}

#[test]
fn test_get_neighbors_failure_sends_nothing() {
    let mut msap = engine(&neighbor_config());
    msap.platform_mut().set_neighbor_table_unavailable(true);
    let (outcome, confirm) = exchange_frame(&mut msap, Request::GetNeighbors.to_frame(SEQ));
    assert_eq!(outcome, Outcome::Rejected);
    assert!(confirm.is_none());
}

#[test]
fn test_scan_completion_becomes_indication() {
    let mut msap = started_router();
    assert_eq!(
        exchange(&mut msap, Request::ScanNeighbors),
        Some(Confirm::ScanNeighbors(ScanNeighborsResult::Success))
    );
    for event in msap.platform_mut().take_events() {
        if event == NodeEvent::ScanComplete {
            msap.notify_scan_complete();
        }
    }

    let mut item = msap.next_indication().expect("scan indication");
    msap.pre_send(&mut item);
    assert_eq!(
        Indication::decode(&item.frame).unwrap(),
        Indication::ScanNeighbors {
            pending: 0,
            scan_ready: 1
        }
    );
    msap.post_send(item);
}

// ============================================================================
// Sink Cost, App Config, Queuing Time, Sleep
// ============================================================================

#[test]
fn test_sink_cost() {
    let mut msap = router();
    assert_eq!(
        exchange(&mut msap, Request::SinkCostWrite { cost: 4 }),
        Some(Confirm::SinkCostWrite(SinkCostResult::InvalidRole))
    );

    let mut msap = engine(&SimulatedNodeConfig::sink(1));
    assert_eq!(
        exchange(&mut msap, Request::SinkCostWrite { cost: 4 }),
        Some(Confirm::SinkCostWrite(SinkCostResult::Ok))
    );
    assert_eq!(
        exchange(&mut msap, Request::SinkCostRead),
        Some(Confirm::SinkCostRead {
            result: SinkCostResult::Ok,
            cost: 4
        })
    );
}

#[test]
fn test_app_config() {
    let config = AppConfig {
        seq: 7,
        interval: 120,
        data: [0xA5; APP_CONFIG_SIZE],
    };

    let mut msap = router();
    assert_eq!(
        exchange(&mut msap, Request::AppConfigWrite(config.clone())),
        Some(Confirm::AppConfigWrite(AppConfigWriteResult::NotSink))
    );
    assert_eq!(
        exchange(&mut msap, Request::AppConfigRead),
        Some(Confirm::AppConfigRead {
            result: AppConfigReadResult::Failure,
            config: AppConfig::default()
        })
    );

    let mut msap = engine(&SimulatedNodeConfig::sink(1));
    assert_eq!(
        exchange(
            &mut msap,
            Request::AppConfigWrite(AppConfig {
                interval: 45,
                ..config.clone()
            })
        ),
        Some(Confirm::AppConfigWrite(AppConfigWriteResult::InvalidInterval))
    );
    assert_eq!(
        exchange(
            &mut msap,
            Request::AppConfigWrite(AppConfig {
                seq: 255,
                ..config.clone()
            })
        ),
        Some(Confirm::AppConfigWrite(AppConfigWriteResult::InvalidSeq))
    );
    assert_eq!(
        exchange(&mut msap, Request::AppConfigWrite(config.clone())),
        Some(Confirm::AppConfigWrite(AppConfigWriteResult::Success))
    );
    assert_eq!(
        exchange(&mut msap, Request::AppConfigRead),
        Some(Confirm::AppConfigRead {
            result: AppConfigReadResult::Success,
            config
        })
    );
}

#[test]
fn test_queuing_time() {
    let mut msap = router();
    assert_eq!(
        exchange(&mut msap, Request::QueuingTimeWrite { priority: 1, time: 90 }),
        Some(Confirm::QueuingTimeWrite(QueuingTimeResult::Success))
    );
    assert_eq!(
        exchange(&mut msap, Request::QueuingTimeRead { priority: 1 }),
        Some(Confirm::QueuingTimeRead {
            result: QueuingTimeResult::Success,
            time: 90
        })
    );
    assert_eq!(
        exchange(&mut msap, Request::QueuingTimeWrite { priority: 5, time: 90 }),
        Some(Confirm::QueuingTimeWrite(QueuingTimeResult::InvalidValue))
    );
    assert_eq!(
        exchange(&mut msap, Request::QueuingTimeWrite { priority: 0, time: 1 }),
        Some(Confirm::QueuingTimeWrite(QueuingTimeResult::InvalidValue))
    );

    exchange(&mut msap, Request::StackStart { autostart: false });
    assert_eq!(
        exchange(&mut msap, Request::QueuingTimeWrite { priority: 0, time: 30 }),
        Some(Confirm::QueuingTimeWrite(QueuingTimeResult::InvalidStackState))
    );
}

#[test]
fn test_sleep_cycle() {
    let mut msap = router();
    let sleep = Request::Sleep {
        seconds: 300,
        ignore_app_config_interval: true,
    };
    assert_eq!(
        exchange(&mut msap, sleep.clone()),
        Some(Confirm::Sleep(SleepResult::InvalidState))
    );

    exchange(&mut msap, Request::StackStart { autostart: false });
    assert_eq!(exchange(&mut msap, sleep), Some(Confirm::Sleep(SleepResult::Success)));

    let Some(Confirm::SleepState { state, countdown }) = exchange(&mut msap, Request::SleepState)
    else {
        panic!("expected a sleep state confirm");
    };
    assert_eq!(state, SleepState::Active);
    assert!(countdown > 290 && countdown <= 300);
    assert_eq!(
        exchange(&mut msap, Request::GotoSleepInfo),
        Some(Confirm::GotoSleepInfo { seconds: 300 })
    );

    assert_eq!(
        exchange(&mut msap, Request::SleepStop),
        Some(Confirm::SleepStop(SleepResult::Success))
    );
    assert_eq!(
        exchange(&mut msap, Request::SleepStop),
        Some(Confirm::SleepStop(SleepResult::InvalidState))
    );
    assert_eq!(
        exchange(&mut msap, Request::SleepState),
        Some(Confirm::SleepState {
            state: SleepState::NotStarted,
            countdown: 0
        })
    );
}

#[test]
fn test_sink_cannot_sleep() {
    let mut msap = engine(&SimulatedNodeConfig::sink(1));
    exchange(&mut msap, Request::StackStart { autostart: false });
    assert_eq!(
        exchange(
            &mut msap,
            Request::Sleep {
                seconds: 60,
                ignore_app_config_interval: true
            }
        ),
        Some(Confirm::Sleep(SleepResult::InvalidRole))
    );
}

#[test]
fn test_retired_remote_requests_are_denied() {
    let mut msap = router();
    assert_eq!(
        exchange(&mut msap, Request::RemoteStatus { address: 1 }),
        Some(Confirm::RemoteStatus(RemoteStatusResult::AccessDenied))
    );
    assert_eq!(
        exchange(
            &mut msap,
            Request::RemoteUpdate {
                address: 1,
                seq: 2,
                reboot_delay: 3
            }
        ),
        Some(Confirm::RemoteUpdate(RemoteUpdateResult::AccessDenied))
    );
}

// ============================================================================
// Poll and Indications
// ============================================================================

fn poll(msap: &mut Msap<SimulatedNode>) -> u8 {
    match exchange(msap, Request::IndicationPoll) {
        Some(Confirm::IndicationPoll { pending }) => pending,
        other => panic!("unexpected confirm {:?}", other),
    }
}

#[test]
fn test_poll_reports_presence_not_depth() {
    let mut msap = router();
    assert_eq!(poll(&mut msap), 0);

    msap.notify_stack_state();
    msap.notify_scan_complete();
    assert_eq!(msap.queued_indications(), 2);
    assert_eq!(poll(&mut msap), 1);

    let mut first = msap.next_indication().unwrap();
    msap.pre_send(&mut first);
    assert_eq!(first.frame.payload[0], 1);
    assert_eq!(first.frame.sequence_id, 0);
    msap.post_send(first);

    let mut last = msap.next_indication().unwrap();
    msap.pre_send(&mut last);
    assert_eq!(last.frame.payload[0], 0);
    msap.post_send(last);

    assert_eq!(poll(&mut msap), 0);
    msap.platform_mut().set_data_plane_indications(3);
    assert_eq!(poll(&mut msap), 1);
}

#[test]
fn test_stack_state_indication_carries_flags() {
    let mut msap = started_router();
    msap.notify_stack_state();
    let mut item = msap.next_indication().unwrap();
    msap.pre_send(&mut item);
    assert_eq!(
        Indication::decode(&item.frame).unwrap(),
        Indication::StackState {
            pending: 0,
            flags: StackStateFlags::STARTED
        }
    );
    msap.post_send(item);
}

#[test]
fn test_scan_indications_coalesce() {
    let mut msap = router();
    msap.notify_scan_complete();
    msap.notify_scan_complete();
    assert_eq!(msap.queued_indications(), 1);
}

#[test]
fn test_newer_app_config_replaces_queued() {
    let mut msap = router();
    msap.notify_stack_state();
    msap.notify_app_config(1, &[1; APP_CONFIG_SIZE], 30);
    msap.notify_app_config(2, &[2; APP_CONFIG_SIZE], 60);
    assert_eq!(msap.queued_indications(), 2);

    let state = msap.next_indication().unwrap();
    msap.post_send(state);
    let mut item = msap.next_indication().unwrap();
    msap.pre_send(&mut item);
    let Indication::AppConfigReceived { pending, config } = Indication::decode(&item.frame).unwrap()
    else {
        panic!("expected an app config indication");
    };
    assert_eq!(pending, 0);
    assert_eq!(config.seq, 2);
    assert_eq!(config.interval, 60);
    assert_eq!(config.data, [2; APP_CONFIG_SIZE]);
    msap.post_send(item);
}

#[test]
fn test_received_app_config_event() {
    let mut msap = router();
    let config = AppConfig {
        seq: 4,
        interval: 30,
        data: [9; APP_CONFIG_SIZE],
    };
    msap.platform_mut().receive_app_config(config.clone());
    for event in msap.platform_mut().take_events() {
        if let NodeEvent::AppConfigReceived(cfg) = event {
            msap.notify_app_config(cfg.seq, &cfg.data, cfg.interval);
        }
    }
    let item = msap.next_indication().unwrap();
    assert_eq!(
        Indication::decode(&item.frame).unwrap(),
        Indication::AppConfigReceived { pending: 0, config }
    );
    msap.release(item);
}

// ============================================================================
// Pools
// ============================================================================

#[test]
fn test_request_pool_exhaustion() {
    let config = MsapConfig {
        request_items: 1,
        ..Default::default()
    };
    let mut msap = Msap::new(SimulatedNode::default(), config);
    let held = msap.accept(Request::IndicationPoll.to_frame(1)).unwrap();
    assert!(msap.accept(Request::IndicationPoll.to_frame(2)).is_none());
    msap.release(held);
    assert!(msap.accept(Request::IndicationPoll.to_frame(3)).is_some());
}

#[test]
fn test_indication_pool_exhaustion_drops() {
    let config = MsapConfig {
        indication_items: 1,
        ..Default::default()
    };
    let mut msap = Msap::new(SimulatedNode::default(), config);
    msap.notify_stack_state();
    msap.notify_scan_complete();
    assert_eq!(msap.queued_indications(), 1);

    let item = msap.next_indication().unwrap();
    msap.post_send(item);
    msap.notify_scan_complete();
    assert_eq!(msap.queued_indications(), 1);
}
