//! Pallet model
//!
//! Represents the atomic unit produced by Phase 1, buffered on a conveyor,
//! and consumed by Phase 2. Each pallet has:
//! - A unique id assigned at creation
//! - An immutable source (producer A, B, or C)
//! - A lot id grouping consecutive pallets of the same source
//! - A production minute and a derived maturation deadline
//!
//! Consumption timestamps live in the pallet log, not on the pallet itself:
//! a pallet leaves the buffer at the moment it is consumed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Origin machine of a pallet
///
/// A pallet's source is immutable and determines which dedicated conveyors
/// may hold it and during which consumption windows it may leave the buffer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Source {
    A,
    B,
    C,
}

impl Source {
    /// All sources in the fixed production order A -> B -> C
    pub const ALL: [Source; 3] = [Source::A, Source::B, Source::C];

    /// Stable index 0..3 for array-based per-source state
    pub fn index(&self) -> usize {
        match self {
            Source::A => 0,
            Source::B => 1,
            Source::C => 2,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::A => write!(f, "A"),
            Source::B => write!(f, "B"),
            Source::C => write!(f, "C"),
        }
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(Source::A),
            "B" => Ok(Source::B),
            "C" => Ok(Source::C),
            _ => Err(format!("Invalid source: '{}'. Valid values: A, B, C", s)),
        }
    }
}

/// A single pallet
///
/// # Example
/// ```
/// use line_simulator_core_rs::{Pallet, Source};
///
/// let pallet = Pallet::new(1, Source::A, 1, 24, 1200);
/// assert_eq!(pallet.matures_at(), 1224);
/// assert!(!pallet.is_mature(1223));
/// assert!(pallet.is_mature(1224));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pallet {
    /// Unique pallet identifier, assigned at creation (starts at 1)
    id: u64,

    /// Origin machine
    source: Source,

    /// Lot group id (per-source, monotonically increasing)
    lot: u64,

    /// Simulated minute of creation
    t_prod: u64,

    /// First minute at which the pallet may be consumed
    matures_at: u64,
}

impl Pallet {
    /// Create a pallet at production time
    ///
    /// The maturation deadline is fixed at creation: `t_prod + maturation`.
    pub fn new(id: u64, source: Source, lot: u64, t_prod: u64, maturation_minutes: u64) -> Self {
        Self {
            id,
            source,
            lot,
            t_prod,
            matures_at: t_prod + maturation_minutes,
        }
    }

    /// Unique pallet id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Origin machine
    pub fn source(&self) -> Source {
        self.source
    }

    /// Lot group id
    pub fn lot(&self) -> u64 {
        self.lot
    }

    /// Minute of creation
    pub fn t_prod(&self) -> u64 {
        self.t_prod
    }

    /// First minute at which the pallet is consumable
    pub fn matures_at(&self) -> u64 {
        self.matures_at
    }

    /// Whether the pallet may be consumed at `now`
    pub fn is_mature(&self, now: u64) -> bool {
        now >= self.matures_at
    }
}
