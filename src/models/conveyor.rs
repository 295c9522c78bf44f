//! Conveyor model
//!
//! A conveyor is a bounded, unidirectional FIFO lane. Pallets enter at the
//! tail and leave at the head, never anywhere else. The head pallet is the
//! oldest one on the lane; if it is immature or of the wrong source during
//! a consumption window, the conveyor cannot yield anything.
//!
//! # Critical Invariants
//!
//! - At most `capacity` pallets at any time
//! - Pallets appear in production order (FIFO)
//! - No insertion between existing pallets, no removal except the head

use crate::models::pallet::{Pallet, Source};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Role of a conveyor in the buffer layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Accepts pallets of a single source
    Dedicated(Source),

    /// Accepts pallets of any source
    Dynamic,
}

impl Role {
    /// Whether a pallet of `source` may be placed on a conveyor of this role
    pub fn accepts(&self, source: Source) -> bool {
        match self {
            Role::Dedicated(s) => *s == source,
            Role::Dynamic => true,
        }
    }
}

/// Errors that can occur during conveyor operations
#[derive(Debug, Error, PartialEq)]
pub enum ConveyorError {
    #[error("conveyor {index} is full ({capacity} pallets)")]
    Full { index: usize, capacity: usize },
}

/// A bounded FIFO lane of pallets
///
/// The head (consumption end) is at the front of the deque, the tail
/// (insertion end) at the back; the oldest pallet is always the head.
///
/// # Example
/// ```
/// use line_simulator_core_rs::{Conveyor, Pallet, Role, Source};
///
/// let mut belt = Conveyor::new(0, Role::Dedicated(Source::A), 22);
/// belt.enqueue(Pallet::new(1, Source::A, 1, 0, 1200)).unwrap();
/// belt.enqueue(Pallet::new(2, Source::A, 1, 24, 1200)).unwrap();
///
/// // The head is the oldest pallet
/// assert_eq!(belt.peek_head().unwrap().id(), 1);
///
/// // Only a mature head can be popped
/// assert!(belt.pop_head_if(100, |p, now| p.is_mature(now)).is_none());
/// assert_eq!(
///     belt.pop_head_if(1200, |p, now| p.is_mature(now)).unwrap().id(),
///     1
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conveyor {
    /// Row index in the buffer (0-based)
    index: usize,

    /// Source restriction for this row
    role: Role,

    /// Maximum number of pallets on the lane
    capacity: usize,

    /// Pallets in FIFO order: head at the front, tail at the back
    cells: VecDeque<Pallet>,
}

impl Conveyor {
    /// Create an empty conveyor
    pub fn new(index: usize, role: Role, capacity: usize) -> Self {
        Self {
            index,
            role,
            capacity,
            cells: VecDeque::with_capacity(capacity),
        }
    }

    /// Row index in the buffer
    pub fn index(&self) -> usize {
        self.index
    }

    /// Source restriction for this row
    pub fn role(&self) -> Role {
        self.role
    }

    /// Maximum number of pallets on the lane
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether there is room for one more pallet
    pub fn can_enqueue(&self) -> bool {
        self.cells.len() < self.capacity
    }

    /// Append a pallet at the tail
    ///
    /// Fails with [`ConveyorError::Full`] when the lane is at capacity.
    /// There is no maturity check at enqueue time.
    pub fn enqueue(&mut self, pallet: Pallet) -> Result<(), ConveyorError> {
        if !self.can_enqueue() {
            return Err(ConveyorError::Full {
                index: self.index,
                capacity: self.capacity,
            });
        }
        self.cells.push_back(pallet);
        Ok(())
    }

    /// The pallet at the consumption end, without removing it
    pub fn peek_head(&self) -> Option<&Pallet> {
        self.cells.front()
    }

    /// Remove and return the head pallet if `predicate(head, now)` holds
    ///
    /// Returns `None` when the lane is empty or the predicate rejects the
    /// head. The head is never skipped: no pallet behind it is considered.
    pub fn pop_head_if<F>(&mut self, now: u64, predicate: F) -> Option<Pallet>
    where
        F: Fn(&Pallet, u64) -> bool,
    {
        let yields = self
            .cells
            .front()
            .map_or(false, |head| predicate(head, now));
        if yields {
            self.cells.pop_front()
        } else {
            None
        }
    }

    /// Number of pallets currently on the lane
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the lane is empty
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Occupied cell count (same as [`len`](Self::len))
    pub fn occupancy(&self) -> usize {
        self.cells.len()
    }

    /// Free cells remaining
    pub fn free_space(&self) -> usize {
        self.capacity - self.cells.len()
    }

    /// Iterate pallets from head (oldest) to tail (newest)
    pub fn pallets(&self) -> impl Iterator<Item = &Pallet> {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pallet(id: u64, t_prod: u64) -> Pallet {
        Pallet::new(id, Source::A, 1, t_prod, 1200)
    }

    #[test]
    fn test_role_accepts() {
        assert!(Role::Dedicated(Source::A).accepts(Source::A));
        assert!(!Role::Dedicated(Source::A).accepts(Source::B));
        assert!(Role::Dynamic.accepts(Source::C));
    }

    #[test]
    fn test_enqueue_until_full() {
        let mut belt = Conveyor::new(3, Role::Dynamic, 2);
        assert!(belt.can_enqueue());
        belt.enqueue(pallet(1, 0)).unwrap();
        belt.enqueue(pallet(2, 24)).unwrap();
        assert!(!belt.can_enqueue());
        assert_eq!(
            belt.enqueue(pallet(3, 48)),
            Err(ConveyorError::Full {
                index: 3,
                capacity: 2
            })
        );
        assert_eq!(belt.len(), 2);
        assert_eq!(belt.occupancy(), 2);
        assert_eq!(belt.free_space(), 0);
    }

    #[test]
    fn test_fifo_order() {
        let mut belt = Conveyor::new(0, Role::Dedicated(Source::A), 22);
        for i in 0..5 {
            belt.enqueue(pallet(i + 1, i * 24)).unwrap();
        }
        let ids: Vec<u64> = (0..5)
            .filter_map(|_| belt.pop_head_if(10_000, |_, _| true))
            .map(|p| p.id())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_pop_respects_predicate() {
        let mut belt = Conveyor::new(0, Role::Dedicated(Source::A), 22);
        belt.enqueue(pallet(1, 0)).unwrap();

        // Immature head: nothing pops, the head stays in place
        assert!(belt
            .pop_head_if(1199, |p, now| p.is_mature(now))
            .is_none());
        assert_eq!(belt.len(), 1);

        let popped = belt.pop_head_if(1200, |p, now| p.is_mature(now)).unwrap();
        assert_eq!(popped.id(), 1);
        assert!(belt.is_empty());
    }

    #[test]
    fn test_immature_head_blocks_mature_pallets_behind() {
        let mut belt = Conveyor::new(0, Role::Dynamic, 22);
        // Wrong-source head in front of a mature pallet of the wanted source
        belt.enqueue(Pallet::new(1, Source::B, 1, 0, 1200)).unwrap();
        belt.enqueue(Pallet::new(2, Source::A, 1, 0, 1200)).unwrap();

        let matcher = |p: &Pallet, now: u64| p.source() == Source::A && p.is_mature(now);
        assert!(belt.pop_head_if(5000, matcher).is_none());
        assert_eq!(belt.len(), 2);
    }

    #[test]
    fn test_pop_empty_is_none() {
        let mut belt = Conveyor::new(0, Role::Dynamic, 22);
        assert!(belt.pop_head_if(0, |_, _| true).is_none());
    }
}
