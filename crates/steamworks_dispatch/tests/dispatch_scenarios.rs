//! # Dispatch Scenarios
//!
//! Drives `Dispatch` against the simulated bridge and checks, for every
//! path through the drain loop, what was invoked and what was released.
//!
//! Run with: cargo test -p steamworks_dispatch --test dispatch_scenarios

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use steamworks_bridge::{
    BridgeError, ByteOrder, EResult, EventKind, PointerWidth, SimulatedBridge, SimulatedItem,
    SimulatedRecord, SteamId, UserHandle, WireLayout,
};
use steamworks_dispatch::{
    Callbacks, DecodeError, DecodedEvent, Dispatch, DispatchConfig, DispatchError,
    UserStatsReceived,
};

type Seen = Rc<RefCell<Vec<(u64, EResult, SteamId)>>>;

fn recording() -> (Callbacks, Seen) {
    let seen: Seen = Rc::default();
    let sink = Rc::clone(&seen);
    let callbacks = Callbacks::new().on_user_stats_received(move |game_id, result, user| {
        sink.borrow_mut().push((game_id, result, user));
    });
    (callbacks, seen)
}

fn stats(order: ByteOrder, game_id: u64, result: EResult, user: u64) -> SimulatedRecord {
    SimulatedRecord::user_stats_received(order, UserHandle(1), game_id, result, SteamId(user))
}

fn host_stats(game_id: u64, result: EResult, user: u64) -> SimulatedRecord {
    stats(ByteOrder::host(), game_id, result, user)
}

// ============================================================================
// DELIVERY
// ============================================================================

#[test]
fn test_two_records_delivered_in_order() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge.push_frame([
        host_stats(1001, EResult::OK, 555),
        host_stats(1002, EResult::FAIL, 556),
    ]);
    let (callbacks, seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    dispatch.process_callbacks().unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            (1001, EResult::OK, SteamId(555)),
            (1002, EResult::FAIL, SteamId(556)),
        ]
    );
    let log = probe.snapshot();
    assert_eq!(log.released.len(), 2);
    assert_eq!(log.outstanding(), 0);
    assert_eq!(log.double_fetches, 0);
    assert_eq!(log.spurious_releases, 0);
}

#[test]
fn test_records_wait_for_their_frame() {
    let mut bridge = SimulatedBridge::new();
    bridge
        .push_frame(Vec::<SimulatedItem>::new())
        .push_frame([host_stats(7, EResult::OK, 1)]);
    let (callbacks, seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    dispatch.process_callbacks().unwrap();
    assert!(seen.borrow().is_empty());

    dispatch.process_callbacks().unwrap();
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_absent_slot_releases_without_invoking() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge.push_frame([host_stats(1, EResult::OK, 2)]);
    let mut dispatch = Dispatch::new(bridge, Callbacks::new()).unwrap();

    dispatch.process_callbacks().unwrap();

    let snap = dispatch.stats_snapshot();
    assert_eq!(snap.callbacks_invoked, 0);
    assert_eq!(snap.unhandled_kinds, 1);
    assert_eq!(probe.snapshot().released, vec![EventKind::USER_STATS_RECEIVED]);
}

#[test]
fn test_absent_slot_skips_malformed_payload() {
    let mut bridge = SimulatedBridge::new();
    bridge.push_frame([SimulatedRecord::new(
        UserHandle(1),
        EventKind::USER_STATS_RECEIVED,
        vec![0; 2],
    )]);
    let mut dispatch = Dispatch::new(bridge, Callbacks::new()).unwrap();

    assert_eq!(dispatch.process_callbacks(), Ok(()));
}

#[test]
fn test_unknown_kinds_released_unread() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge.push_frame([
        SimulatedRecord::empty(UserHandle(1), EventKind(304)),
        SimulatedRecord::unbacked(UserHandle(1), EventKind(2_000_001), -8),
        SimulatedRecord::new(UserHandle(1), EventKind(151), vec![0xAB; 40]),
        host_stats(3, EResult::OK, 4),
    ]);
    let (callbacks, seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    dispatch.process_callbacks().unwrap();

    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(dispatch.stats_snapshot().unknown_kinds, 3);
    let log = probe.snapshot();
    assert_eq!(log.released.len(), 4);
    assert_eq!(log.outstanding(), 0);
}

#[test]
fn test_unrecognized_result_code_passed_through() {
    let mut bridge = SimulatedBridge::new();
    bridge.push_frame([host_stats(1, EResult(84), 2)]);
    let (callbacks, seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    dispatch.process_callbacks().unwrap();
    assert_eq!(seen.borrow()[0].1, EResult(84));
}

// ============================================================================
// RELEASE ON FAILURE
// ============================================================================

#[test]
fn test_fetch_failure_stops_drain() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge.push_frame([
        SimulatedItem::from(host_stats(1, EResult::OK, 1)),
        SimulatedItem::FetchFailure(BridgeError::QueueCorrupted("bad header".into())),
        SimulatedItem::from(host_stats(3, EResult::OK, 3)),
    ]);
    let (callbacks, seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    let err = dispatch.process_callbacks().unwrap_err();

    assert_eq!(
        err,
        DispatchError::Fetch {
            drained: 1,
            source: BridgeError::QueueCorrupted("bad header".into()),
        }
    );
    assert_eq!(seen.borrow().len(), 1);
    let log = probe.snapshot();
    assert_eq!(log.released.len(), 1);
    assert_eq!(log.outstanding(), 0);
    assert_eq!(dispatch.bridge().pending(), 1);
    assert_eq!(dispatch.stats_snapshot().fetch_failures, 1);

    // The leftover record comes out on the next frame.
    dispatch.process_callbacks().unwrap();
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(probe.snapshot().released.len(), 2);
}

#[test]
fn test_short_payload_released_and_reported() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge.push_frame([
        SimulatedRecord::new(UserHandle(1), EventKind::USER_STATS_RECEIVED, vec![0; 12]),
        host_stats(2, EResult::OK, 2),
    ]);
    let (callbacks, seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    let err = dispatch.process_callbacks().unwrap_err();

    assert_eq!(
        err,
        DispatchError::Decode {
            drained: 0,
            source: DecodeError::PayloadTooShort {
                kind: EventKind::USER_STATS_RECEIVED,
                name: "UserStatsReceived",
                expected: 20,
                actual: 12,
            },
        }
    );
    assert!(err.to_string().contains("UserStatsReceived"));
    assert!(seen.borrow().is_empty());
    let log = probe.snapshot();
    assert_eq!(log.released, vec![EventKind::USER_STATS_RECEIVED]);
    assert_eq!(log.outstanding(), 0);
    assert_eq!(dispatch.bridge().pending(), 1);
}

#[test]
fn test_negative_length_released_and_reported() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge.push_frame([SimulatedRecord::unbacked(
        UserHandle(1),
        EventKind::USER_STATS_RECEIVED,
        -1,
    )]);
    let (callbacks, _seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    let err = dispatch.process_callbacks().unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Decode {
            source: DecodeError::NegativeLength { len: -1, .. },
            ..
        }
    ));
    assert_eq!(probe.snapshot().outstanding(), 0);
    assert_eq!(probe.snapshot().released.len(), 1);
}

#[test]
fn test_null_payload_released_and_reported() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge.push_frame([SimulatedRecord::unbacked(
        UserHandle(1),
        EventKind::USER_STATS_RECEIVED,
        20,
    )]);
    let (callbacks, _seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    let err = dispatch.process_callbacks().unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Decode {
            source: DecodeError::NullPayload { len: 20, .. },
            ..
        }
    ));
    assert_eq!(probe.snapshot().released.len(), 1);
}

#[test]
fn test_panicking_callback_still_releases() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge
        .push_frame([host_stats(1, EResult::OK, 1)])
        .push_frame([host_stats(2, EResult::OK, 2)]);
    let calls = Rc::new(RefCell::new(0u32));
    let counter = Rc::clone(&calls);
    let callbacks = Callbacks::new().on_user_stats_received(move |game_id, _, _| {
        *counter.borrow_mut() += 1;
        assert_ne!(game_id, 1, "handler rejects game 1");
    });
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    let unwound = catch_unwind(AssertUnwindSafe(|| dispatch.process_callbacks()));
    assert!(unwound.is_err());
    let log = probe.snapshot();
    assert_eq!(log.released.len(), 1);
    assert_eq!(log.outstanding(), 0);

    // Dispatch keeps working after the unwind.
    dispatch.process_callbacks().unwrap();
    assert_eq!(*calls.borrow(), 2);
    let log = probe.snapshot();
    assert_eq!(log.released.len(), 2);
    assert_eq!(log.double_fetches, 0);
    assert_eq!(log.spurious_releases, 0);
}

// ============================================================================
// SESSION AND FRAME
// ============================================================================

#[test]
fn test_missing_session_touches_nothing() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge.push_frame([host_stats(1, EResult::OK, 1)]);
    bridge.disconnect();
    let (callbacks, seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    let err = dispatch.process_callbacks().unwrap_err();

    assert_eq!(err, DispatchError::SessionUnavailable(BridgeError::NoSession));
    assert!(err.to_string().starts_with("SteamPipe:"));
    assert!(seen.borrow().is_empty());
    let log = probe.snapshot();
    assert_eq!(log.frames, 0);
    assert!(log.fetched.is_empty());
    assert!(log.released.is_empty());
}

#[test]
fn test_frame_failure_leaves_queue() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge
        .push_frame([host_stats(1, EResult::OK, 1)])
        .push_frame_failure(BridgeError::FrameFailed("client restarting".into()))
        .push_frame(Vec::<SimulatedItem>::new());
    let (callbacks, seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();

    dispatch.process_callbacks().unwrap();
    assert_eq!(seen.borrow().len(), 1);

    let err = dispatch.process_callbacks().unwrap_err();
    assert_eq!(
        err,
        DispatchError::FrameAdvance(BridgeError::FrameFailed("client restarting".into()))
    );
    assert!(err.to_string().starts_with("Steam RunFrame:"));
    assert_eq!(probe.snapshot().fetched.len(), 1);

    dispatch.process_callbacks().unwrap();
    assert_eq!(probe.snapshot().frames, 2);
}

#[test]
fn test_uninitialized_sdk_fails_init() {
    let bridge = SimulatedBridge::new().uninitialized();
    let err = Dispatch::new(bridge, Callbacks::new()).unwrap_err();
    assert_eq!(err, DispatchError::Init(BridgeError::NotInitialized));
}

// ============================================================================
// WIRE LAYOUTS
// ============================================================================

#[test]
fn test_layout_mismatch_rejected() {
    let native = WireLayout::new(ByteOrder::Big, PointerWidth::Eight);
    let configured = WireLayout::new(ByteOrder::Little, PointerWidth::Eight);
    let bridge = SimulatedBridge::new().with_layout(native);

    let err = Dispatch::with_config(
        bridge,
        Callbacks::new(),
        &DispatchConfig::default().with_wire(configured),
    )
    .unwrap_err();

    assert_eq!(err, DispatchError::LayoutMismatch { configured, native });
}

#[test]
fn test_big_endian_end_to_end() {
    let layout = WireLayout::new(ByteOrder::Big, PointerWidth::Eight);
    let mut bridge = SimulatedBridge::new().with_layout(layout);
    bridge.push_frame([stats(ByteOrder::Big, 0x0102_0304, EResult::OK, 76_561_197_960_287_930)]);
    let (callbacks, seen) = recording();
    let mut dispatch = Dispatch::with_config(
        bridge,
        callbacks,
        &DispatchConfig::default().with_wire(layout),
    )
    .unwrap();

    dispatch.process_callbacks().unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![(0x0102_0304, EResult::OK, SteamId(76_561_197_960_287_930))]
    );
}

#[test]
fn test_four_byte_pointer_headers() {
    let layout = WireLayout::new(ByteOrder::host(), PointerWidth::Four);
    let mut bridge = SimulatedBridge::new().with_layout(layout);
    let probe = bridge.probe();
    bridge.push_frame([
        SimulatedRecord::empty(UserHandle(2), EventKind(304)),
        SimulatedRecord::empty(UserHandle(2), EventKind::USER_STATS_RECEIVED),
    ]);
    let mut dispatch = Dispatch::new(bridge, Callbacks::new()).unwrap();
    assert_eq!(dispatch.layout().header_len(), 16);

    dispatch.process_callbacks().unwrap();

    let snap = dispatch.stats_snapshot();
    assert_eq!(snap.unknown_kinds, 1);
    assert_eq!(snap.unhandled_kinds, 1);
    assert_eq!(
        probe.snapshot().released,
        vec![EventKind(304), EventKind::USER_STATS_RECEIVED]
    );
}

// ============================================================================
// FORWARDING, CONFIG, STATS
// ============================================================================

#[test]
fn test_forwarding_to_channel() {
    let mut bridge = SimulatedBridge::new();
    bridge.push_frame([
        host_stats(10, EResult::OK, 1),
        host_stats(11, EResult::FAIL, 2),
    ]);
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut dispatch = Dispatch::new(bridge, Callbacks::forwarding(tx)).unwrap();

    dispatch.process_callbacks().unwrap();

    let events: Vec<DecodedEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            DecodedEvent::UserStatsReceived(UserStatsReceived {
                game_id: 10,
                result: EResult::OK,
                user: SteamId(1),
            }),
            DecodedEvent::UserStatsReceived(UserStatsReceived {
                game_id: 11,
                result: EResult::FAIL,
                user: SteamId(2),
            }),
        ]
    );
}

#[test]
fn test_full_channel_does_not_stop_dispatch() {
    let mut bridge = SimulatedBridge::new();
    let probe = bridge.probe();
    bridge.push_frame([
        host_stats(1, EResult::OK, 1),
        host_stats(2, EResult::OK, 2),
        host_stats(3, EResult::OK, 3),
    ]);
    let (tx, rx) = crossbeam_channel::bounded(1);
    let mut dispatch = Dispatch::new(bridge, Callbacks::forwarding(tx)).unwrap();

    dispatch.process_callbacks().unwrap();

    assert_eq!(rx.try_iter().count(), 1);
    assert_eq!(dispatch.stats_snapshot().callbacks_invoked, 3);
    assert_eq!(probe.snapshot().released.len(), 3);
}

#[test]
fn test_config_from_toml() {
    let order = match ByteOrder::host() {
        ByteOrder::Little => "little",
        ByteOrder::Big => "big",
    };
    let text = format!(
        "log_unknown_kinds = false\n\n[wire]\nbyte_order = \"{order}\"\npointer_width = {}\n",
        std::mem::size_of::<usize>()
    );
    let config = DispatchConfig::from_toml_str(&text).unwrap();
    assert_eq!(config.wire, Some(WireLayout::host()));

    let mut bridge = SimulatedBridge::new();
    bridge.push_frame([SimulatedRecord::empty(UserHandle(1), EventKind(999))]);
    let mut dispatch = Dispatch::with_config(bridge, Callbacks::new(), &config).unwrap();

    dispatch.process_callbacks().unwrap();
    assert_eq!(dispatch.stats_snapshot().unknown_kinds, 1);
}

#[test]
fn test_config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("steamworks-dispatch-{}.toml", std::process::id()));
    std::fs::write(&path, "log_unknown_kinds = false\n").unwrap();

    let config = DispatchConfig::from_toml_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(!config.log_unknown_kinds);
    assert_eq!(config.wire, None);
}

#[test]
fn test_stats_readable_from_another_thread() {
    let mut bridge = SimulatedBridge::new();
    bridge.push_frame([host_stats(1, EResult::OK, 1)]);
    let (callbacks, _seen) = recording();
    let mut dispatch = Dispatch::new(bridge, callbacks).unwrap();
    dispatch.process_callbacks().unwrap();

    let stats = dispatch.stats();
    let snap = std::thread::spawn(move || stats.snapshot()).join().unwrap();

    assert_eq!(snap.frames, 1);
    assert_eq!(snap.records_drained, 1);
    assert_eq!(snap.callbacks_invoked, 1);
}
