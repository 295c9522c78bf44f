//! Time management for the simulation
//!
//! The simulation operates in discrete minutes. Time only advances when the
//! external driver requests it, so runs are fully deterministic.

use serde::{Deserialize, Serialize};

/// Manages simulated time as a single minute-resolution cursor
///
/// # Example
/// ```
/// use line_simulator_core_rs::SimClock;
///
/// let mut clock = SimClock::new();
/// assert_eq!(clock.now(), 0);
///
/// clock.advance_minute();
/// assert_eq!(clock.now(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimClock {
    /// Minutes elapsed since simulation start
    now: u64,
}

impl SimClock {
    /// Create a clock positioned at t=0
    pub fn new() -> Self {
        Self { now: 0 }
    }

    /// Restore a clock to a saved position (checkpoint load)
    pub fn from_state(now: u64) -> Self {
        Self { now }
    }

    /// Advance time by one minute
    pub fn advance_minute(&mut self) {
        self.now += 1;
    }

    /// Current simulated minute
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Whole hours elapsed since start
    ///
    /// # Example
    /// ```
    /// use line_simulator_core_rs::SimClock;
    ///
    /// let clock = SimClock::from_state(2640);
    /// assert_eq!(clock.hours(), 44);
    /// ```
    pub fn hours(&self) -> u64 {
        self.now / 60
    }
}
