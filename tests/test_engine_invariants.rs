//! Universal invariant checks over long runs
//!
//! These properties must hold at every minute, across production, window
//! handovers and consumption: capacity bounds, FIFO production order,
//! pallet uniqueness, maturation before consumption, slot spacing, window
//! exclusivity and emission scheduling.

use line_simulator_core_rs::{Engine, SimulationConfig, Snapshot, Source};
use std::collections::HashSet;

/// 30-cell rows: enough headroom that no producer ever blocks, giving the
/// clean A/B/C window timeline (2640 / 3360 / 4080)
fn headroom_config() -> SimulationConfig {
    SimulationConfig {
        row_capacity: 30,
        ..SimulationConfig::default()
    }
}

fn assert_buffer_invariants(snapshot: &Snapshot) {
    let mut seen: HashSet<u64> = HashSet::new();

    for conveyor in &snapshot.conveyors {
        // 1. Capacity bound
        assert!(
            conveyor.pallets.len() <= conveyor.capacity,
            "minute {}: conveyor {} over capacity",
            snapshot.now,
            conveyor.index
        );

        // 2. FIFO: production times never decrease from head to tail
        for pair in conveyor.pallets.windows(2) {
            assert!(
                pair[0].t_prod <= pair[1].t_prod,
                "minute {}: conveyor {} breaks FIFO order",
                snapshot.now,
                conveyor.index
            );
        }

        // 3. No pallet in two conveyors
        for pallet in &conveyor.pallets {
            assert!(
                seen.insert(pallet.id),
                "minute {}: pallet {} in two conveyors",
                snapshot.now,
                pallet.id
            );
        }
    }
}

#[test]
fn test_buffer_invariants_hold_every_minute() {
    // Default capacity: producers block under pressure, windows drift late;
    // the structural invariants must hold regardless
    let mut engine = Engine::new(SimulationConfig::default()).unwrap();
    for _ in 0..4200 {
        let snapshot = engine.step(1).unwrap();
        assert_buffer_invariants(&snapshot);

        // 5. At most one source active at any time, and windows are bounded
        if snapshot.window.active_source.is_some() {
            let start = snapshot.window.window_start.unwrap();
            let end = snapshot.window.window_end.unwrap();
            assert_eq!(end, start + 720);
            assert!(snapshot.now >= start && snapshot.now < end);
        }
    }
}

#[test]
fn test_consumed_pallets_matured_and_matched_the_window() {
    let mut engine = Engine::new(headroom_config()).unwrap();
    engine.step(4200).unwrap();

    // 4. Maturation: every consumed pallet rested the full period
    let log = engine.consumption_log();
    assert!(!log.is_empty());
    for record in &log {
        assert!(
            record.t_consumed_minutes - record.t_prod_minutes >= 1200,
            "pallet {} consumed after only {} minutes",
            record.pallet_id,
            record.t_consumed_minutes - record.t_prod_minutes
        );
    }

    // Consumptions fall inside the windows of their source: A [2640,3360),
    // B [3360,4080), C [4080,...)
    for record in &log {
        let (start, end) = match record.source {
            Source::A => (2640, 3360),
            Source::B => (3360, 4080),
            Source::C => (4080, 4800),
        };
        assert!(
            record.t_consumed_minutes >= start && record.t_consumed_minutes < end,
            "pallet {} of {} consumed at {} outside its window",
            record.pallet_id,
            record.source,
            record.t_consumed_minutes
        );
    }
}

#[test]
fn test_consumption_slots_never_shrink_below_the_period() {
    // 6. Within a source, consecutive consumptions are >= X/3 apart
    // (retries may stretch the gap, never shrink it). Checked at the tight
    // default capacity, where starved slots and retries actually occur.
    let mut engine = Engine::new(SimulationConfig::default()).unwrap();
    engine.step(4200).unwrap();

    for source in Source::ALL {
        let times: Vec<u64> = engine
            .consumption_log()
            .iter()
            .filter(|r| r.source == source)
            .map(|r| r.t_consumed_minutes)
            .collect();
        for pair in times.windows(2) {
            assert!(
                pair[1] - pair[0] >= 8,
                "source {} consumed at {} and {}",
                source,
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn test_emissions_land_on_period_multiples_from_activation() {
    let mut engine = Engine::new(headroom_config()).unwrap();
    engine.step(4200).unwrap();

    // 7. No producer blocks in this run, so every emission sits exactly on
    // a multiple of X after its activation
    let snapshot = engine.snapshot();
    for producer in &snapshot.producers {
        assert_eq!(producer.blocked_minutes, 0);
    }
    let activation = [0u64, 720, 1440];
    for record in engine.pallet_records() {
        let offset = record.t_prod - activation[record.source.index()];
        assert!(offset > 0 && offset % 24 == 0);
    }
}

#[test]
fn test_deterministic_replay_is_bit_identical() {
    let run = |tick: u64| -> (Snapshot, usize) {
        let mut engine = Engine::new(SimulationConfig::default()).unwrap();
        let mut last = engine.snapshot();
        let mut total = 0;
        while engine.now() < 3600 {
            last = engine.step(tick).unwrap();
            total = engine.consumption_log().len();
        }
        (last, total)
    };

    // Identical parameters give identical runs, regardless of external
    // tick size (time always advances in one-minute micro-steps)
    let (snap_a, log_a) = run(1);
    let (snap_b, log_b) = run(60);
    assert_eq!(snap_a, snap_b);
    assert_eq!(log_a, log_b);
}
