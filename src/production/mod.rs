//! Producer emission scheduling
//!
//! Each Phase 1 source has one producer emitting a pallet every `X` minutes
//! from its activation time. Producers never skip ahead: when the buffer
//! rejects a pallet the schedule stands still and the attempt repeats every
//! minute until a conveyor accepts, accumulating blocked time.

use crate::models::pallet::Source;
use serde::{Deserialize, Serialize};

/// Emission state of a single producer
///
/// The first emission of a source happens one full period after activation
/// (`activation + X`); subsequent emissions follow every `X` minutes. Lot
/// ids group `lot_size` consecutive pallets of the source.
///
/// # Example
/// ```
/// use line_simulator_core_rs::{Producer, Source};
///
/// let mut producer = Producer::new(Source::A, 0, 24, 90);
/// assert_eq!(producer.next_emission_time(), 24);
/// assert!(!producer.emission_due(23));
/// assert!(producer.emission_due(24));
///
/// producer.mark_emitted();
/// assert_eq!(producer.next_emission_time(), 48);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    /// Source this producer emits
    source: Source,

    /// Minute at which the producer becomes active
    activation_time: u64,

    /// Emission period X in minutes
    period: u64,

    /// Pallets per lot group
    lot_size: u64,

    /// Minute of the next emission attempt
    next_emission_time: u64,

    /// Cumulative minutes the producer was unable to deposit
    blocked_minutes: u64,

    /// Pallets emitted so far
    lot_counter: u64,
}

impl Producer {
    /// Create a producer with its first emission at `activation_time + period`
    pub fn new(source: Source, activation_time: u64, period: u64, lot_size: u64) -> Self {
        Self {
            source,
            activation_time,
            period,
            lot_size,
            next_emission_time: activation_time + period,
            blocked_minutes: 0,
            lot_counter: 0,
        }
    }

    /// Source this producer emits
    pub fn source(&self) -> Source {
        self.source
    }

    /// Minute at which the producer becomes active
    pub fn activation_time(&self) -> u64 {
        self.activation_time
    }

    /// Whether the producer has been activated by `now` (staggered start)
    pub fn is_active(&self, now: u64) -> bool {
        now >= self.activation_time
    }

    /// Whether an emission attempt is due at `now`
    pub fn emission_due(&self, now: u64) -> bool {
        now >= self.next_emission_time
    }

    /// Minute of the next emission attempt
    pub fn next_emission_time(&self) -> u64 {
        self.next_emission_time
    }

    /// Cumulative minutes the producer was unable to deposit
    pub fn blocked_minutes(&self) -> u64 {
        self.blocked_minutes
    }

    /// Pallets emitted so far
    pub fn lot_counter(&self) -> u64 {
        self.lot_counter
    }

    /// Lot id for the next pallet (groups of `lot_size` consecutive pallets)
    pub fn current_lot(&self) -> u64 {
        self.lot_counter / self.lot_size + 1
    }

    /// Advance the schedule after a successful emission
    pub fn mark_emitted(&mut self) {
        self.lot_counter += 1;
        self.next_emission_time += self.period;
    }

    /// Accumulate blocked time; the emission schedule does not advance
    pub fn mark_blocked(&mut self, minutes: u64) {
        self.blocked_minutes += minutes;
    }
}
