//! Event logging for simulation replay and auditing.
//!
//! This module defines the Event enum which captures all significant state
//! changes during simulation. Events enable:
//! - Debugging (understand what happened and when)
//! - Auditing (verify windows, blocks, and consumptions)
//! - External rendering (the GUI drains events after each step)
//!
//! # Event Types
//!
//! - **PalletProduced**: a producer placed a pallet on a conveyor
//! - **ProducerBlocked**: no accepting conveyor had free capacity
//! - **WindowOpened** / **WindowClosed**: consumption window transitions
//! - **PalletConsumed**: a mature head pallet left the buffer

use crate::models::pallet::Source;
use serde::{Deserialize, Serialize};

/// Simulation event capturing a state change.
///
/// All events carry the simulated minute at which they occurred; events are
/// logged in the order they happen within a minute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A pallet was created and enqueued
    PalletProduced {
        minute: u64,
        pallet_id: u64,
        source: Source,
        lot: u64,
        row: usize,
    },

    /// A producer could not deposit this minute (buffer shortage, not an error)
    ProducerBlocked { minute: u64, source: Source },

    /// A consumption window opened for a source
    WindowOpened {
        minute: u64,
        source: Source,
        window_end: u64,
        /// Buffered pallets of the source that will be mature by window end
        eligible: u64,
    },

    /// The active consumption window reached its end
    WindowClosed {
        minute: u64,
        source: Source,
        /// Pallets consumed during the window
        consumed: u64,
    },

    /// A mature head pallet was consumed
    PalletConsumed {
        minute: u64,
        pallet_id: u64,
        source: Source,
        lot: u64,
        row: usize,
        /// Minutes between production and consumption
        wait_minutes: u64,
    },
}

impl Event {
    /// Simulated minute at which this event occurred
    pub fn minute(&self) -> u64 {
        match self {
            Event::PalletProduced { minute, .. } => *minute,
            Event::ProducerBlocked { minute, .. } => *minute,
            Event::WindowOpened { minute, .. } => *minute,
            Event::WindowClosed { minute, .. } => *minute,
            Event::PalletConsumed { minute, .. } => *minute,
        }
    }

    /// Short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::PalletProduced { .. } => "PalletProduced",
            Event::ProducerBlocked { .. } => "ProducerBlocked",
            Event::WindowOpened { .. } => "WindowOpened",
            Event::WindowClosed { .. } => "WindowClosed",
            Event::PalletConsumed { .. } => "PalletConsumed",
        }
    }

    /// Source the event relates to
    pub fn source(&self) -> Source {
        match self {
            Event::PalletProduced { source, .. } => *source,
            Event::ProducerBlocked { source, .. } => *source,
            Event::WindowOpened { source, .. } => *source,
            Event::WindowClosed { source, .. } => *source,
            Event::PalletConsumed { source, .. } => *source,
        }
    }

    /// Pallet id if the event relates to a specific pallet
    pub fn pallet_id(&self) -> Option<u64> {
        match self {
            Event::PalletProduced { pallet_id, .. } => Some(*pallet_id),
            Event::PalletConsumed { pallet_id, .. } => Some(*pallet_id),
            _ => None,
        }
    }
}

/// Event log for storing and querying simulation events.
///
/// A simple wrapper around `Vec<Event>` with convenience queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events logged at a specific minute
    pub fn events_at_minute(&self, minute: u64) -> Vec<&Event> {
        self.events.iter().filter(|e| e.minute() == minute).collect()
    }

    /// Events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Events for a specific pallet
    pub fn events_for_pallet(&self, pallet_id: u64) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.pallet_id() == Some(pallet_id))
            .collect()
    }

    /// Events for a specific source
    pub fn events_for_source(&self, source: Source) -> Vec<&Event> {
        self.events.iter().filter(|e| e.source() == source).collect()
    }

    /// Remove and return all buffered events (external renderers poll this)
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
