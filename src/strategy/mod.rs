//! Allocation and Consumption Strategy Module
//!
//! This module defines the two pluggable decision seams of the engine:
//!
//! - **Allocation** (Phase 1): given a freshly produced pallet, pick the
//!   conveyor it lands on, or none to block the producer for this tick.
//! - **Consumption** (Phase 2): given the active window source, pick the
//!   conveyor whose head pallet should be consumed next, or none.
//!
//! Strategies are invoked synchronously by the engine with a read-only view
//! of the buffer. They hold no simulation state beyond strategy-local
//! bookkeeping (the round-robin cursor); everything else is owned by the
//! engine, so strategies can be swapped without the engine leaking their
//! policies.
//!
//! # Strategy Interface
//!
//! ```
//! use line_simulator_core_rs::{AllocationStrategy, Conveyor, Pallet};
//!
//! struct FirstAccepting;
//!
//! impl AllocationStrategy for FirstAccepting {
//!     fn allocate(&mut self, pallet: &Pallet, conveyors: &[Conveyor]) -> Option<usize> {
//!         conveyors
//!             .iter()
//!             .find(|c| c.role().accepts(pallet.source()) && c.can_enqueue())
//!             .map(|c| c.index())
//!     }
//! }
//! ```

use crate::models::conveyor::Conveyor;
use crate::models::pallet::{Pallet, Source};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod allocation;
pub mod consumption;

pub use allocation::{
    DedicatedPlusDynamicAllocation, MostFreeAllocation, RoundRobinAllocation,
};
pub use consumption::{FirstThreeConsumption, LongestHeadConsumption};

/// Allocation strategy trait (Phase 1 seam)
///
/// The returned index must denote a conveyor whose role permits
/// `pallet.source()` and that has free capacity; `None` blocks the producer
/// for this tick (it retries every following tick without advancing its
/// emission schedule).
pub trait AllocationStrategy: Send {
    /// Select a conveyor for a freshly produced pallet
    fn allocate(&mut self, pallet: &Pallet, conveyors: &[Conveyor]) -> Option<usize>;

    /// Per-source cursor positions, for strategies that keep one
    ///
    /// Checkpointing uses this so a restored run continues bit-identically;
    /// stateless strategies return `None`.
    fn cursors(&self) -> Option<[usize; 3]> {
        None
    }

    /// Restore previously saved cursor positions
    fn restore_cursors(&mut self, _cursors: [usize; 3]) {}
}

/// Consumption strategy trait (Phase 2 seam)
///
/// The returned index must denote a conveyor whose head is a mature pallet
/// of `source` at `now`; `None` leaves the consumption slot empty (the
/// scheduler retries the slot next tick).
pub trait ConsumptionStrategy: Send {
    /// Select the conveyor to pop the next pallet from
    fn select(&mut self, source: Source, now: u64, conveyors: &[Conveyor]) -> Option<usize>;
}

/// Allocation strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationConfig {
    /// S1: role-accepting conveyor with the most free space
    MostFree,

    /// S2: per-source round-robin over dedicated rows only
    RoundRobin,

    /// S3: keep-lot affinity on dedicated rows, dynamic rows as overflow
    DedicatedPlusDynamic,
}

impl FromStr for AllocationConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "most_free" => Ok(AllocationConfig::MostFree),
            "round_robin" => Ok(AllocationConfig::RoundRobin),
            "dedicated_plus_dynamic" => Ok(AllocationConfig::DedicatedPlusDynamic),
            _ => Err(format!(
                "Invalid allocation strategy: '{}'. Valid values: most_free, round_robin, dedicated_plus_dynamic",
                s
            )),
        }
    }
}

/// Consumption strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionConfig {
    /// C1: dedicated rows of the active source first, then dynamic rows
    FirstThree,

    /// C2: deepest queue among conveyors with a mature head of the source
    LongestHead,
}

impl FromStr for ConsumptionConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_three" => Ok(ConsumptionConfig::FirstThree),
            "longest_head" => Ok(ConsumptionConfig::LongestHead),
            _ => Err(format!(
                "Invalid consumption strategy: '{}'. Valid values: first_three, longest_head",
                s
            )),
        }
    }
}

/// Instantiate the allocation strategy selected by the configuration
pub fn create_allocation(config: AllocationConfig) -> Box<dyn AllocationStrategy> {
    match config {
        AllocationConfig::MostFree => Box::new(MostFreeAllocation),
        AllocationConfig::RoundRobin => Box::new(RoundRobinAllocation::new()),
        AllocationConfig::DedicatedPlusDynamic => Box::new(DedicatedPlusDynamicAllocation),
    }
}

/// Instantiate the consumption strategy selected by the configuration
pub fn create_consumption(config: ConsumptionConfig) -> Box<dyn ConsumptionStrategy> {
    match config {
        ConsumptionConfig::FirstThree => Box::new(FirstThreeConsumption),
        ConsumptionConfig::LongestHead => Box::new(LongestHeadConsumption),
    }
}
