//! Integration tests for window trigger timing
//!
//! With the default parameters (X=24, maturation=1200, window=720,
//! staggered activations 0/720/1440) the earliest possible window openings
//! are fully determined: activation + lot_size * X + (maturation - window),
//! i.e. 2640 minutes after each source's activation.
//!
//! The first opening is insensitive to buffer pressure, so it is tested at
//! the default 22-cell capacity. The full A/B/C timeline is tested with
//! 30-cell rows: at 22 cells producers start blocking between the first and
//! second trigger, which delays the later windows past their minima.

use line_simulator_core_rs::{
    AllocationConfig, ConsumptionConfig, Engine, SimulationConfig, Source,
};

fn engine_with_capacity(row_capacity: usize) -> Engine {
    Engine::new(SimulationConfig {
        row_capacity,
        allocation_strategy: AllocationConfig::MostFree,
        consumption_strategy: ConsumptionConfig::FirstThree,
        ..SimulationConfig::default()
    })
    .unwrap()
}

#[test]
fn test_first_window_opens_for_a_at_2640() {
    let mut engine = engine_with_capacity(22);

    // One minute before the trigger: still idle, nothing consumed
    let snapshot = engine.step(2639).unwrap();
    assert_eq!(snapshot.window.active_source, None);
    assert_eq!(snapshot.window.next_candidate_source, Source::A);
    assert!(engine.consumption_log().is_empty());

    let snapshot = engine.step(1).unwrap();
    assert_eq!(snapshot.now, 2640);
    assert_eq!(snapshot.window.active_source, Some(Source::A));
    assert_eq!(snapshot.window.window_start, Some(2640));
    assert_eq!(snapshot.window.window_end, Some(3360));
}

#[test]
fn test_exactly_90_a_pallets_eligible_at_2640() {
    let mut engine = engine_with_capacity(22);
    engine.step(2640).unwrap();

    // First emission at minute 24, then every 24 minutes: 90 pallets have
    // t_prod <= 2160 and all of them will be mature by the window end
    let eligible = engine
        .pallet_records()
        .iter()
        .filter(|r| r.source == Source::A && r.t_prod <= 2160)
        .count();
    assert_eq!(eligible, 90);

    let opens = engine.event_log().events_of_type("WindowOpened");
    assert_eq!(opens.len(), 1);
    match opens[0] {
        line_simulator_core_rs::Event::WindowOpened {
            minute,
            source,
            window_end,
            eligible,
        } => {
            assert_eq!(*minute, 2640);
            assert_eq!(*source, Source::A);
            assert_eq!(*window_end, 3360);
            assert_eq!(*eligible, 90);
        }
        other => panic!("expected a WindowOpened event, got {:?}", other),
    }
}

#[test]
fn test_no_consumption_before_first_window() {
    let mut engine = engine_with_capacity(22);
    engine.step(2639).unwrap();
    assert!(engine.consumption_log().is_empty());
    assert_eq!(engine.event_log().events_of_type("PalletConsumed").len(), 0);

    // The first slot fires in the opening minute itself
    engine.step(1).unwrap();
    let log = engine.consumption_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].t_consumed_minutes, 2640);
    assert_eq!(log[0].source, Source::A);
}

#[test]
fn test_window_b_opens_when_a_closes_at_3360() {
    let mut engine = engine_with_capacity(30);

    // Mid-window for A
    let snapshot = engine.step(3359).unwrap();
    assert_eq!(snapshot.window.active_source, Some(Source::A));

    // A closes and B opens within the same minute
    let snapshot = engine.step(1).unwrap();
    assert_eq!(snapshot.now, 3360);
    assert_eq!(snapshot.window.active_source, Some(Source::B));
    assert_eq!(snapshot.window.window_start, Some(3360));
    assert_eq!(snapshot.window.window_end, Some(4080));

    let closes = engine.event_log().events_of_type("WindowClosed");
    assert_eq!(closes.len(), 1);
    assert_eq!(closes[0].minute(), 3360);
    assert_eq!(closes[0].source(), Source::A);
}

#[test]
fn test_window_c_opens_when_b_closes_at_4080() {
    let mut engine = engine_with_capacity(30);
    let snapshot = engine.step(4080).unwrap();

    // activation 1440 + 2160 production + 480 maturation margin
    assert_eq!(snapshot.window.active_source, Some(Source::C));
    assert_eq!(snapshot.window.window_start, Some(4080));

    // Every source observed its earliest possible opening
    let opens = engine.event_log().events_of_type("WindowOpened");
    let timeline: Vec<(u64, Source)> = opens.iter().map(|e| (e.minute(), e.source())).collect();
    assert_eq!(
        timeline,
        vec![(2640, Source::A), (3360, Source::B), (4080, Source::C)]
    );
}

#[test]
fn test_producers_never_block_with_headroom() {
    let mut engine = engine_with_capacity(30);
    let snapshot = engine.step(4080).unwrap();
    for producer in &snapshot.producers {
        assert_eq!(
            producer.blocked_minutes, 0,
            "producer {} should not block at 30-cell capacity",
            producer.source
        );
    }
}

#[test]
fn test_tight_capacity_delays_later_windows() {
    // At the default 22-cell capacity the buffer saturates between the
    // first and second trigger: B and C block, and B's 90th pallet lands
    // after minute 2880, so B's window opens late
    let mut engine = engine_with_capacity(22);
    let snapshot = engine.step(3400).unwrap();
    assert_eq!(snapshot.window.active_source, None);
    assert!(snapshot.producers[1].blocked_minutes > 0);

    let opens = engine.event_log().events_of_type("WindowOpened");
    assert_eq!(opens.len(), 1, "only A's window has opened by 3400");
}
