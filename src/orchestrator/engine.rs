//! Simulation Engine
//!
//! Main simulation loop integrating all components:
//! - Producer emissions (fixed cadence, staggered activation)
//! - Allocation strategy (pallet -> conveyor placement)
//! - Window scheduler (rotating per-source consumption windows)
//! - Consumption strategy (conveyor selection for mature heads)
//! - Pallet and event logging (complete simulation history)
//!
//! # Architecture
//!
//! The engine advances in one-minute micro-steps. Within each minute:
//!
//! ```text
//! 1. Advance the clock
//! 2. Producers A -> B -> C: emit while due; a rejected pallet blocks the
//!    producer for this minute without advancing its schedule
//! 3. Scheduler: close the window if its end was reached, then evaluate
//!    the trigger for the next source in rotation
//! 4. If a window is active: consume while a slot is due and a conveyor
//!    yields a mature head of the active source
//! 5. Audit the buffer invariants; a violation halts the run
//! ```
//!
//! # Example
//!
//! ```
//! use line_simulator_core_rs::{Engine, SimulationConfig};
//!
//! let mut engine = Engine::new(SimulationConfig::default()).unwrap();
//!
//! // Run the first day in hour-long ticks
//! for _ in 0..24 {
//!     let snapshot = engine.step(60).unwrap();
//!     assert_eq!(snapshot.window.active_source, None); // far from a trigger
//! }
//! assert_eq!(engine.now(), 1440);
//! ```

use crate::core::time::SimClock;
use crate::models::conveyor::{Conveyor, ConveyorError, Role};
use crate::models::event::{Event, EventLog};
use crate::models::log::{ConsumptionRecord, PalletLog, PalletRecord};
use crate::models::pallet::{Pallet, Source};
use crate::production::Producer;
use crate::scheduler::{ActiveWindow, WindowScheduler};
use crate::strategy::{
    create_allocation, create_consumption, AllocationConfig, AllocationStrategy,
    ConsumptionConfig, ConsumptionStrategy,
};
use std::collections::HashSet;
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete engine configuration
///
/// All durations are in simulated minutes. `activation_times` is indexed by
/// [`Source::index`] (A, B, C).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimulationConfig {
    /// Producer period X: one pallet per producer every X minutes
    pub x_minutes: u64,

    /// Minimum rest time before a pallet may be consumed
    pub maturation_minutes: u64,

    /// Length of one consumption window
    pub window_minutes: u64,

    /// Number of conveyor rows in the buffer
    pub rows: usize,

    /// Pallet capacity of each row
    pub row_capacity: usize,

    /// Role of each row, `rows` entries
    pub role_layout: Vec<Role>,

    /// Phase 1 placement strategy
    pub allocation_strategy: AllocationConfig,

    /// Phase 2 selection strategy
    pub consumption_strategy: ConsumptionConfig,

    /// Activation minute per source (staggered start)
    pub activation_times: [u64; 3],
}

impl SimulationConfig {
    /// Default 12-row layout: rows 0-2 dedicated A, 4-6 dedicated B,
    /// 8-10 dedicated C, rows 3, 7 and 11 dynamic
    pub fn default_role_layout() -> Vec<Role> {
        vec![
            Role::Dedicated(Source::A),
            Role::Dedicated(Source::A),
            Role::Dedicated(Source::A),
            Role::Dynamic,
            Role::Dedicated(Source::B),
            Role::Dedicated(Source::B),
            Role::Dedicated(Source::B),
            Role::Dynamic,
            Role::Dedicated(Source::C),
            Role::Dedicated(Source::C),
            Role::Dedicated(Source::C),
            Role::Dynamic,
        ]
    }

    /// Minutes between consumption slots: X/3 (Phase 2 runs at three times
    /// the per-producer rate)
    pub fn consume_period(&self) -> u64 {
        self.x_minutes / 3
    }

    /// Pallets consumed during one full window, `floor(window / (X/3))`,
    /// clamped to at least 1
    pub fn lot_size(&self) -> u64 {
        (self.window_minutes / self.consume_period()).max(1)
    }

    /// Validate all construction preconditions
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.x_minutes == 0 {
            return Err(ConfigError::NonPositivePeriod);
        }
        if self.x_minutes % 3 != 0 {
            return Err(ConfigError::PeriodNotDivisibleByThree(self.x_minutes));
        }
        if self.window_minutes == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.rows == 0 {
            return Err(ConfigError::NoRows);
        }
        if self.row_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.role_layout.len() != self.rows {
            return Err(ConfigError::LayoutMismatch {
                layout: self.role_layout.len(),
                rows: self.rows,
            });
        }
        for source in Source::ALL {
            if !self
                .role_layout
                .iter()
                .any(|role| *role == Role::Dedicated(source))
            {
                return Err(ConfigError::NoDedicatedRow(source));
            }
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            x_minutes: 24,
            maturation_minutes: 1200,
            window_minutes: 720,
            rows: 12,
            row_capacity: 22,
            role_layout: Self::default_role_layout(),
            allocation_strategy: AllocationConfig::MostFree,
            consumption_strategy: ConsumptionConfig::FirstThree,
            activation_times: [0, 720, 1440],
        }
    }
}

/// Configuration errors, raised only at construction or checkpoint load
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("x_minutes must be >= 1")]
    NonPositivePeriod,

    #[error("x_minutes must be divisible by 3, got {0}")]
    PeriodNotDivisibleByThree(u64),

    #[error("window_minutes must be >= 1")]
    ZeroWindow,

    #[error("rows must be >= 1")]
    NoRows,

    #[error("row_capacity must be >= 1")]
    ZeroCapacity,

    #[error("role_layout has {layout} entries for {rows} rows")]
    LayoutMismatch { layout: usize, rows: usize },

    #[error("role layout has no dedicated row for source {0}")]
    NoDedicatedRow(Source),
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Simulation error types
///
/// Recoverable shortages (full buffer, no mature head, insufficient
/// maturing stock) are modeled states and never appear here. An
/// `InvariantViolation` indicates an implementation bug: the engine halts
/// and every further `step` call returns the same error.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Configuration validation error
    InvalidConfig(ConfigError),

    /// An internal invariant was broken (implementation bug)
    InvariantViolation { minute: u64, detail: String },

    /// Serialization error (checkpoint save)
    SerializationError(String),

    /// Deserialization error (checkpoint load)
    DeserializationError(String),

    /// Checkpoint taken under a different configuration
    ConfigMismatch { expected: String, actual: String },
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::InvalidConfig(err) => write!(f, "Invalid config: {}", err),
            SimulationError::InvariantViolation { minute, detail } => {
                write!(f, "Invariant violation at minute {}: {}", minute, detail)
            }
            SimulationError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            SimulationError::DeserializationError(msg) => {
                write!(f, "Deserialization error: {}", msg)
            }
            SimulationError::ConfigMismatch { expected, actual } => write!(
                f,
                "Config mismatch: expected hash {}, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for SimulationError {}

impl From<ConfigError> for SimulationError {
    fn from(err: ConfigError) -> Self {
        SimulationError::InvalidConfig(err)
    }
}

// ============================================================================
// Snapshot Types
// ============================================================================

/// Observable state emitted after each step
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Snapshot {
    /// Current simulated minute
    pub now: u64,

    /// Buffer contents, row by row
    pub conveyors: Vec<ConveyorSnapshot>,

    /// Per-producer counters (A, B, C)
    pub producers: Vec<ProducerSnapshot>,

    /// Window scheduler state
    pub window: WindowSnapshot,
}

/// One conveyor row as seen by external observers
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConveyorSnapshot {
    pub index: usize,
    pub role: Role,
    pub capacity: usize,
    /// Pallets from head (consumption side) to tail (insertion side)
    pub pallets: Vec<PalletView>,
}

/// One buffered pallet with its maturity evaluated at snapshot time
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PalletView {
    pub id: u64,
    pub source: Source,
    pub lot: u64,
    pub t_prod: u64,
    pub mature: bool,
}

/// One producer's counters
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProducerSnapshot {
    pub source: Source,
    /// Whether the staggered start has activated this producer
    pub active: bool,
    pub next_emission_time: u64,
    pub blocked_minutes: u64,
    pub lot_counter: u64,
    pub produced: u64,
    pub consumed: u64,
}

/// Window scheduler state as seen by external observers
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WindowSnapshot {
    pub active_source: Option<Source>,
    pub window_start: Option<u64>,
    pub window_end: Option<u64>,
    pub next_candidate_source: Source,
    pub next_consume_time: Option<u64>,
    pub consumed_in_window: u64,
}

// ============================================================================
// Engine
// ============================================================================

/// Main engine owning all simulation state
///
/// The engine exclusively owns the conveyors, producers, window scheduler
/// and logs. Strategies are invoked synchronously with a read-only view of
/// the buffer; the engine never bypasses a strategy's decision, but it does
/// re-check every decision against the conveyor invariants before acting.
///
/// # Determinism
///
/// The core is single-threaded and randomness-free: identical
/// configuration, strategies and tick sequence produce bit-identical runs.
pub struct Engine {
    /// Original configuration (kept for reset and checkpoint hashing)
    config: SimulationConfig,

    /// Simulated clock, minute resolution
    clock: SimClock,

    /// The maturation buffer
    conveyors: Vec<Conveyor>,

    /// Phase 1 producers in fixed A, B, C order
    producers: Vec<Producer>,

    /// Phase 2 window rotation and slot timing
    scheduler: WindowScheduler,

    /// Placement strategy (Phase 1 seam)
    allocation: Box<dyn AllocationStrategy>,

    /// Selection strategy (Phase 2 seam)
    consumption: Box<dyn ConsumptionStrategy>,

    /// Append-only record of every pallet produced
    pallet_log: PalletLog,

    /// Audit trail of state changes
    event_log: EventLog,

    /// Next pallet id to assign
    next_pallet_id: u64,

    /// Set after an invariant violation; the engine refuses further steps
    halted: Option<SimulationError>,
}

impl Engine {
    /// Create a new engine from a validated configuration
    ///
    /// # Example
    ///
    /// ```
    /// use line_simulator_core_rs::{ConfigError, Engine, SimulationConfig};
    ///
    /// let engine = Engine::new(SimulationConfig::default()).unwrap();
    /// assert_eq!(engine.now(), 0);
    ///
    /// let bad = SimulationConfig {
    ///     x_minutes: 25,
    ///     ..SimulationConfig::default()
    /// };
    /// assert!(matches!(
    ///     Engine::new(bad),
    ///     Err(ConfigError::PeriodNotDivisibleByThree(25))
    /// ));
    /// ```
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let conveyors: Vec<Conveyor> = config
            .role_layout
            .iter()
            .enumerate()
            .map(|(index, role)| Conveyor::new(index, *role, config.row_capacity))
            .collect();

        let lot_size = config.lot_size();
        let producers: Vec<Producer> = Source::ALL
            .iter()
            .map(|source| {
                Producer::new(
                    *source,
                    config.activation_times[source.index()],
                    config.x_minutes,
                    lot_size,
                )
            })
            .collect();

        let scheduler = WindowScheduler::new(config.window_minutes, config.consume_period(), lot_size);
        let allocation = create_allocation(config.allocation_strategy);
        let consumption = create_consumption(config.consumption_strategy);

        Ok(Self {
            config,
            clock: SimClock::new(),
            conveyors,
            producers,
            scheduler,
            allocation,
            consumption,
            pallet_log: PalletLog::new(),
            event_log: EventLog::new(),
            next_pallet_id: 1,
            halted: None,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current simulated minute
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// The configuration this engine was built with
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Read-only view of the buffer
    pub fn conveyors(&self) -> &[Conveyor] {
        &self.conveyors
    }

    /// Read-only view of the producers (A, B, C order)
    pub fn producers(&self) -> &[Producer] {
        &self.producers
    }

    /// Read-only view of the window scheduler
    pub fn scheduler(&self) -> &WindowScheduler {
        &self.scheduler
    }

    /// Audit trail of all events so far
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Remove and return all buffered events (for external renderers)
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.event_log.drain()
    }

    /// Every pallet ever produced, with optional consumption stamp
    pub fn pallet_records(&self) -> Vec<PalletRecord> {
        self.pallet_log.export_records()
    }

    /// Finalized consumption records in consumption order
    pub fn consumption_log(&self) -> Vec<ConsumptionRecord> {
        self.pallet_log.consumption_records()
    }

    /// Pallets produced by one source so far
    pub fn produced_count(&self, source: Source) -> u64 {
        self.pallet_log.produced_count(source)
    }

    /// Pallets of one source consumed so far
    pub fn consumed_count(&self, source: Source) -> u64 {
        self.pallet_log.consumed_count(source)
    }

    /// Pallets of one source currently in the buffer
    pub fn buffered_count(&self, source: Source) -> u64 {
        self.conveyors
            .iter()
            .flat_map(|c| c.pallets())
            .filter(|p| p.source() == source)
            .count() as u64
    }

    // ========================================================================
    // Runtime Operations
    // ========================================================================

    /// Advance simulated time by `tick_minutes` minutes
    ///
    /// Time always advances in one-minute micro-steps internally so that
    /// producer, scheduler and consumer events interleave deterministically
    /// regardless of the external tick size. A zero tick is treated as one
    /// minute.
    ///
    /// Returns the observable snapshot after the final micro-step, or the
    /// invariant violation that halted the run.
    pub fn step(&mut self, tick_minutes: u64) -> Result<Snapshot, SimulationError> {
        if let Some(err) = &self.halted {
            return Err(err.clone());
        }

        for _ in 0..tick_minutes.max(1) {
            if let Err(err) = self.advance_minute() {
                self.halted = Some(err.clone());
                return Err(err);
            }
        }
        Ok(self.snapshot())
    }

    /// Observable state at the current minute
    pub fn snapshot(&self) -> Snapshot {
        let now = self.now();

        let conveyors = self
            .conveyors
            .iter()
            .map(|c| ConveyorSnapshot {
                index: c.index(),
                role: c.role(),
                capacity: c.capacity(),
                pallets: c
                    .pallets()
                    .map(|p| PalletView {
                        id: p.id(),
                        source: p.source(),
                        lot: p.lot(),
                        t_prod: p.t_prod(),
                        mature: p.is_mature(now),
                    })
                    .collect(),
            })
            .collect();

        let producers = self
            .producers
            .iter()
            .map(|p| ProducerSnapshot {
                source: p.source(),
                active: p.is_active(now),
                next_emission_time: p.next_emission_time(),
                blocked_minutes: p.blocked_minutes(),
                lot_counter: p.lot_counter(),
                produced: self.pallet_log.produced_count(p.source()),
                consumed: self.pallet_log.consumed_count(p.source()),
            })
            .collect();

        let window = match self.scheduler.active() {
            Some(w) => WindowSnapshot {
                active_source: Some(w.source),
                window_start: Some(w.start),
                window_end: Some(w.end),
                next_candidate_source: self.scheduler.next_candidate(),
                next_consume_time: Some(w.next_consume_time),
                consumed_in_window: w.consumed,
            },
            None => WindowSnapshot {
                active_source: None,
                window_start: None,
                window_end: None,
                next_candidate_source: self.scheduler.next_candidate(),
                next_consume_time: None,
                consumed_in_window: 0,
            },
        };

        Snapshot {
            now,
            conveyors,
            producers,
            window,
        }
    }

    /// Restore the t=0 state with the original configuration
    ///
    /// Cannot fail in practice: the stored configuration was validated when
    /// the engine was built.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        *self = Engine::new(self.config.clone())?;
        Ok(())
    }

    // ========================================================================
    // Tick Loop Implementation
    // ========================================================================

    /// One minute of simulation: producers, scheduler, consumption, audit
    fn advance_minute(&mut self) -> Result<(), SimulationError> {
        self.clock.advance_minute();
        let now = self.clock.now();

        // STEP 1: PRODUCTION (fixed A -> B -> C order)
        self.run_producers(now);

        // STEP 2: WINDOW SCHEDULER (close before open: back-to-back windows
        // hand over within the same minute)
        self.evaluate_window(now);

        // STEP 3: CONSUMPTION (only while a window is active)
        self.run_consumption(now);

        // STEP 4: INVARIANT AUDIT
        self.check_invariants(now)
    }

    /// Emit due pallets for every active producer
    ///
    /// A producer whose schedule fell behind (blocked earlier) catches up by
    /// emitting several pallets in one minute, one schedule slot at a time.
    /// The first rejection blocks the producer for the rest of the minute.
    fn run_producers(&mut self, now: u64) {
        for i in 0..self.producers.len() {
            while self.producers[i].emission_due(now) {
                let source = self.producers[i].source();
                let lot = self.producers[i].current_lot();
                let pallet = Pallet::new(
                    self.next_pallet_id,
                    source,
                    lot,
                    now,
                    self.config.maturation_minutes,
                );

                let target = self
                    .allocation
                    .allocate(&pallet, &self.conveyors)
                    .filter(|row| {
                        self.conveyors
                            .get(*row)
                            .map_or(false, |c| c.role().accepts(source))
                    });

                let placed = match target {
                    Some(row) => match self.conveyors[row].enqueue(pallet.clone()) {
                        Ok(()) => Some(row),
                        Err(ConveyorError::Full { .. }) => None,
                    },
                    None => None,
                };

                match placed {
                    Some(row) => {
                        self.next_pallet_id += 1;
                        self.pallet_log.record_production(&pallet);
                        self.event_log.log(Event::PalletProduced {
                            minute: now,
                            pallet_id: pallet.id(),
                            source,
                            lot,
                            row,
                        });
                        self.producers[i].mark_emitted();
                    }
                    None => {
                        self.producers[i].mark_blocked(1);
                        self.event_log.log(Event::ProducerBlocked { minute: now, source });
                        log::trace!("producer {} blocked at minute {}", source, now);
                        break;
                    }
                }
            }
        }
    }

    /// Close a due window, then evaluate the trigger for the next candidate
    fn evaluate_window(&mut self, now: u64) {
        if let Some(closed) = self.scheduler.close_if_due(now) {
            log::debug!(
                "window {} closed at minute {} after {} consumptions",
                closed.source,
                now,
                closed.consumed
            );
            self.event_log.log(Event::WindowClosed {
                minute: now,
                source: closed.source,
                consumed: closed.consumed,
            });
        }

        if let Some((source, eligible)) = self.scheduler.try_open(now, &self.conveyors) {
            log::debug!(
                "window {} opened at minute {} with {} eligible pallets",
                source,
                now,
                eligible
            );
            self.event_log.log(Event::WindowOpened {
                minute: now,
                source,
                window_end: now + self.config.window_minutes,
                eligible,
            });
        }
    }

    /// Consume while slots are due and the strategy yields a conveyor
    ///
    /// A failed slot is retried next minute without advancing the slot
    /// time; a successful consumption schedules the next slot one period
    /// after the actual consumption.
    fn run_consumption(&mut self, now: u64) {
        while self.scheduler.consumption_due(now) {
            let source = match self.scheduler.active_source() {
                Some(source) => source,
                None => break,
            };

            let row = match self.consumption.select(source, now, &self.conveyors) {
                Some(row) => row,
                None => break, // empty slot, retry next minute
            };

            let popped = self.conveyors.get_mut(row).and_then(|c| {
                c.pop_head_if(now, |head, now| {
                    head.source() == source && head.is_mature(now)
                })
            });

            match popped {
                Some(pallet) => {
                    self.pallet_log.record_consumption(pallet.id(), now);
                    self.event_log.log(Event::PalletConsumed {
                        minute: now,
                        pallet_id: pallet.id(),
                        source,
                        lot: pallet.lot(),
                        row,
                        wait_minutes: now - pallet.t_prod(),
                    });
                    self.scheduler.record_consumption(now);
                }
                // The strategy pointed at a non-yielding head; nothing is
                // popped and the slot is retried next minute.
                None => break,
            }
        }
    }

    // ========================================================================
    // Checkpoint Plumbing
    // ========================================================================

    pub(crate) fn next_pallet_id_for_checkpoint(&self) -> u64 {
        self.next_pallet_id
    }

    pub(crate) fn consumption_order_for_checkpoint(&self) -> Vec<u64> {
        self.pallet_log.export_consumption_order()
    }

    pub(crate) fn allocation_cursors_for_checkpoint(&self) -> Option<[usize; 3]> {
        self.allocation.cursors()
    }

    /// Rebuild an engine from validated checkpoint parts
    ///
    /// The event log starts empty: events produced before the checkpoint
    /// belong to the run that saved it.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_checkpoint_parts(
        config: SimulationConfig,
        now: u64,
        next_pallet_id: u64,
        conveyors: Vec<Conveyor>,
        producers: Vec<Producer>,
        rotation_idx: usize,
        active_window: Option<ActiveWindow>,
        pallet_log: PalletLog,
        allocation_cursors: Option<[usize; 3]>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let scheduler = WindowScheduler::from_state(
            config.window_minutes,
            config.consume_period(),
            config.lot_size(),
            rotation_idx,
            active_window,
        );
        let mut allocation = create_allocation(config.allocation_strategy);
        if let Some(cursors) = allocation_cursors {
            allocation.restore_cursors(cursors);
        }
        let consumption = create_consumption(config.consumption_strategy);

        Ok(Self {
            config,
            clock: SimClock::from_state(now),
            conveyors,
            producers,
            scheduler,
            allocation,
            consumption,
            pallet_log,
            event_log: EventLog::new(),
            next_pallet_id,
            halted: None,
        })
    }

    // ========================================================================
    // Invariant Audit
    // ========================================================================

    /// Verify the buffer invariants; any failure is an implementation bug
    ///
    /// Checked every minute: capacity bounds, per-conveyor FIFO production
    /// order, role compliance on dedicated rows, pallet uniqueness across
    /// the buffer, and that no buffered pallet carries a consumption stamp.
    fn check_invariants(&self, now: u64) -> Result<(), SimulationError> {
        let mut seen: HashSet<u64> = HashSet::new();

        for conveyor in &self.conveyors {
            if conveyor.len() > conveyor.capacity() {
                return Err(SimulationError::InvariantViolation {
                    minute: now,
                    detail: format!(
                        "conveyor {} holds {} pallets over capacity {}",
                        conveyor.index(),
                        conveyor.len(),
                        conveyor.capacity()
                    ),
                });
            }

            let mut previous: Option<&Pallet> = None;
            for pallet in conveyor.pallets() {
                if !conveyor.role().accepts(pallet.source()) {
                    return Err(SimulationError::InvariantViolation {
                        minute: now,
                        detail: format!(
                            "pallet {} of source {} sits on conveyor {} with role {:?}",
                            pallet.id(),
                            pallet.source(),
                            conveyor.index(),
                            conveyor.role()
                        ),
                    });
                }
                if let Some(prev) = previous {
                    if pallet.t_prod() < prev.t_prod() {
                        return Err(SimulationError::InvariantViolation {
                            minute: now,
                            detail: format!(
                                "conveyor {} breaks FIFO order: pallet {} (t_prod {}) behind pallet {} (t_prod {})",
                                conveyor.index(),
                                pallet.id(),
                                pallet.t_prod(),
                                prev.id(),
                                prev.t_prod()
                            ),
                        });
                    }
                }
                previous = Some(pallet);

                if !seen.insert(pallet.id()) {
                    return Err(SimulationError::InvariantViolation {
                        minute: now,
                        detail: format!("pallet {} present in two conveyors", pallet.id()),
                    });
                }
                match self.pallet_log.get(pallet.id()) {
                    Some(record) if record.t_consumed.is_none() => {}
                    Some(record) => {
                        return Err(SimulationError::InvariantViolation {
                            minute: now,
                            detail: format!(
                                "buffered pallet {} already consumed at minute {:?}",
                                pallet.id(),
                                record.t_consumed
                            ),
                        });
                    }
                    None => {
                        return Err(SimulationError::InvariantViolation {
                            minute: now,
                            detail: format!("buffered pallet {} has no production record", pallet.id()),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
