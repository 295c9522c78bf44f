//! Consumption window scheduler
//!
//! Phase 2 consumes one source at a time in rotating fixed-length windows.
//! The scheduler is a two-state machine, Idle or Active(source):
//!
//! - **Idle**: each tick, look at the next source in the A -> B -> C
//!   rotation. A window opens once enough of that source's buffered pallets
//!   will be mature by the prospective window end (the lot-size trigger).
//!   A failed trigger does not advance the rotation; the same source is
//!   retried next tick.
//! - **Active(source)**: consumption slots fire every consumption period
//!   until the window end. The window closes on time, never early, and the
//!   rotation advances to the next source.
//!
//! The close check and the open trigger run in the same evaluation pass, so
//! back-to-back windows may hand over within a single minute.

use crate::models::conveyor::Conveyor;
use crate::models::pallet::Source;
use serde::{Deserialize, Serialize};

/// State of the currently open window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWindow {
    /// Source being consumed
    pub source: Source,

    /// Minute the window opened
    pub start: u64,

    /// Minute the window closes (`start + window_minutes`)
    pub end: u64,

    /// Minute of the next consumption attempt
    pub next_consume_time: u64,

    /// Pallets consumed so far in this window
    pub consumed: u64,
}

/// Window scheduler: rotation cursor, trigger evaluation, slot timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowScheduler {
    /// Fixed consumption rotation
    rotation: [Source; 3],

    /// Position of the next candidate source in the rotation
    rotation_idx: usize,

    /// Window length in minutes
    window_minutes: u64,

    /// Minutes between consumption slots (X/3)
    consume_period: u64,

    /// Pallets required to trigger a window (one full window of consumption)
    lot_size: u64,

    /// Currently open window, if any
    active: Option<ActiveWindow>,
}

impl WindowScheduler {
    /// Create an Idle scheduler with the rotation cursor on A
    pub fn new(window_minutes: u64, consume_period: u64, lot_size: u64) -> Self {
        Self {
            rotation: Source::ALL,
            rotation_idx: 0,
            window_minutes,
            consume_period,
            lot_size,
            active: None,
        }
    }

    /// The currently open window, if any
    pub fn active(&self) -> Option<&ActiveWindow> {
        self.active.as_ref()
    }

    /// Source of the currently open window, if any
    pub fn active_source(&self) -> Option<Source> {
        self.active.as_ref().map(|w| w.source)
    }

    /// Next source the Idle trigger will consider
    pub fn next_candidate(&self) -> Source {
        self.rotation[self.rotation_idx]
    }

    /// Pallets required to trigger a window
    pub fn lot_size(&self) -> u64 {
        self.lot_size
    }

    /// Close the active window once its end is reached
    ///
    /// Advances the rotation cursor past the completed source and returns
    /// the closed window. Consumption never happens at or after the window
    /// end, so closing at `now == end` loses nothing.
    pub fn close_if_due(&mut self, now: u64) -> Option<ActiveWindow> {
        let due = matches!(&self.active, Some(window) if now >= window.end);
        if !due {
            return None;
        }
        self.rotation_idx = (self.rotation_idx + 1) % self.rotation.len();
        self.active.take()
    }

    /// Idle trigger: open a window for the candidate source if enough of its
    /// buffered pallets will be mature by the prospective window end
    ///
    /// Returns the opened source and the eligible pallet count. The first
    /// consumption attempt is scheduled immediately (`next_consume_time =
    /// now`).
    pub fn try_open(&mut self, now: u64, conveyors: &[Conveyor]) -> Option<(Source, u64)> {
        if self.active.is_some() {
            return None;
        }

        let source = self.next_candidate();
        let window_end = now + self.window_minutes;
        let eligible = conveyors
            .iter()
            .flat_map(|c| c.pallets())
            .filter(|p| p.source() == source && p.matures_at() <= window_end)
            .count() as u64;

        if eligible < self.lot_size {
            return None;
        }

        self.active = Some(ActiveWindow {
            source,
            start: now,
            end: window_end,
            next_consume_time: now,
            consumed: 0,
        });
        Some((source, eligible))
    }

    /// Whether a consumption attempt is due at `now`
    ///
    /// True while a window is open, the current slot time has been reached,
    /// and the window end has not.
    pub fn consumption_due(&self, now: u64) -> bool {
        match &self.active {
            Some(window) => now >= window.next_consume_time && now < window.end,
            None => false,
        }
    }

    /// Record a successful consumption at `now`
    ///
    /// The next slot opens one consumption period after the actual
    /// consumption; slot time lost to retries is never compensated, so
    /// consecutive consumptions are always at least one period apart.
    pub fn record_consumption(&mut self, now: u64) {
        if let Some(window) = self.active.as_mut() {
            window.consumed += 1;
            window.next_consume_time = now + self.consume_period;
        }
    }

    /// Restore a scheduler from checkpointed state
    pub fn from_state(
        window_minutes: u64,
        consume_period: u64,
        lot_size: u64,
        rotation_idx: usize,
        active: Option<ActiveWindow>,
    ) -> Self {
        Self {
            rotation: Source::ALL,
            rotation_idx: rotation_idx % 3,
            window_minutes,
            consume_period,
            lot_size,
            active,
        }
    }

    /// Rotation cursor position (checkpoint export)
    pub fn rotation_idx(&self) -> usize {
        self.rotation_idx
    }
}
