//! Consumption strategies (Phase 2)
//!
//! Both strategies respect strict FIFO: a conveyor whose head pallet is
//! immature or belongs to the wrong source is skipped regardless of what
//! lies behind the head. The engine re-checks the head with its own
//! predicate before popping, so a strategy can never consume an immature or
//! foreign pallet.

use crate::models::conveyor::{Conveyor, Role};
use crate::models::pallet::Source;
use crate::strategy::ConsumptionStrategy;

/// Whether the conveyor can yield for `source` right now
fn head_yields(conveyor: &Conveyor, source: Source, now: u64) -> bool {
    conveyor
        .peek_head()
        .map_or(false, |head| head.source() == source && head.is_mature(now))
}

/// C1 - Prioritize First Three
///
/// Scans the dedicated conveyors of the active source in row order first;
/// if none yields a mature head of the source, scans the dynamic conveyors
/// in row order. Picks the first that yields.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstThreeConsumption;

impl ConsumptionStrategy for FirstThreeConsumption {
    fn select(&mut self, source: Source, now: u64, conveyors: &[Conveyor]) -> Option<usize> {
        conveyors
            .iter()
            .filter(|c| c.role() == Role::Dedicated(source))
            .chain(conveyors.iter().filter(|c| c.role() == Role::Dynamic))
            .find(|c| head_yields(c, source, now))
            .map(|c| c.index())
    }
}

/// C2 - Longest Head Queue
///
/// Among all conveyors (dedicated of the active source plus dynamic) whose
/// head is a mature pallet of the source, picks the one with the greatest
/// length; ties go to the lowest row index. Draining the deepest backlog
/// first reduces peak work-in-progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestHeadConsumption;

impl ConsumptionStrategy for LongestHeadConsumption {
    fn select(&mut self, source: Source, now: u64, conveyors: &[Conveyor]) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None; // (len, index)
        for conveyor in conveyors {
            if !conveyor.role().accepts(source) || !head_yields(conveyor, source, now) {
                continue;
            }
            let len = conveyor.len();
            match best {
                Some((best_len, _)) if len <= best_len => {}
                _ => best = Some((len, conveyor.index())),
            }
        }
        best.map(|(_, index)| index)
    }
}
