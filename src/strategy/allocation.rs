//! Allocation strategies (Phase 1)
//!
//! All three strategies honor the same contract: return a conveyor whose
//! role permits the pallet's source and that has free capacity, or `None`
//! to block the producer for this tick. None of them can violate FIFO or
//! capacity; the conveyor itself enforces both.

use crate::models::conveyor::{Conveyor, Role};
use crate::models::pallet::Pallet;
use crate::strategy::AllocationStrategy;

/// Most-free row among `rows`, ties broken by lowest index
///
/// Rows without free capacity never win. Assumes `rows` is ordered by
/// ascending index, which the engine's buffer layout guarantees.
fn most_free<'a, I>(rows: I) -> Option<usize>
where
    I: Iterator<Item = &'a Conveyor>,
{
    let mut best: Option<(usize, usize)> = None; // (free, index)
    for conveyor in rows {
        let free = conveyor.free_space();
        if free == 0 {
            continue;
        }
        match best {
            Some((best_free, _)) if free <= best_free => {}
            _ => best = Some((free, conveyor.index())),
        }
    }
    best.map(|(_, index)| index)
}

/// S1 - Most Free Space
///
/// Considers every conveyor whose role accepts the pallet's source (the
/// dedicated rows for that source plus any dynamic row) and picks the one
/// with the greatest free capacity; ties go to the lowest row index.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostFreeAllocation;

impl AllocationStrategy for MostFreeAllocation {
    fn allocate(&mut self, pallet: &Pallet, conveyors: &[Conveyor]) -> Option<usize> {
        most_free(
            conveyors
                .iter()
                .filter(|c| c.role().accepts(pallet.source())),
        )
    }
}

/// S2 - Round-robin per Conveyor
///
/// Keeps a per-source cursor over the dedicated rows of that source. Each
/// allocation scans forward from the cursor (wrapping) for a row with free
/// capacity and advances the cursor past the chosen row. Dynamic rows are
/// never used: when every dedicated row is full, the producer blocks.
#[derive(Debug, Clone, Default)]
pub struct RoundRobinAllocation {
    /// Cursor per source, as a position within that source's dedicated rows
    cursors: [usize; 3],
}

impl RoundRobinAllocation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AllocationStrategy for RoundRobinAllocation {
    fn allocate(&mut self, pallet: &Pallet, conveyors: &[Conveyor]) -> Option<usize> {
        let source = pallet.source();
        let dedicated: Vec<usize> = conveyors
            .iter()
            .filter(|c| c.role() == Role::Dedicated(source))
            .map(|c| c.index())
            .collect();
        if dedicated.is_empty() {
            return None;
        }

        let n = dedicated.len();
        let start = self.cursors[source.index()] % n;
        for k in 0..n {
            let pos = (start + k) % n;
            let row = dedicated[pos];
            if conveyors[row].can_enqueue() {
                self.cursors[source.index()] = (pos + 1) % n;
                return Some(row);
            }
        }
        None
    }

    fn cursors(&self) -> Option<[usize; 3]> {
        Some(self.cursors)
    }

    fn restore_cursors(&mut self, cursors: [usize; 3]) {
        self.cursors = cursors;
    }
}

/// S3 - 3 Dedicated + Dynamic (keep-lot)
///
/// Clusters same-lot pallets: a pallet follows its lot onto the row the lot
/// already occupies for as long as that row has capacity. Dedicated rows of
/// the source are preferred (with affinity, then least-full), dynamic rows
/// are the overflow (again with affinity, then least-full). Ties go to the
/// lowest index at every stage. Clustering same-lot pallets reduces
/// fragmentation for downstream accounting.
#[derive(Debug, Clone, Copy, Default)]
pub struct DedicatedPlusDynamicAllocation;

impl DedicatedPlusDynamicAllocation {
    /// First row among `rows` that already holds this source+lot and still
    /// has capacity
    fn affinity_row<'a, I>(rows: I, pallet: &Pallet) -> Option<usize>
    where
        I: Iterator<Item = &'a Conveyor>,
    {
        for conveyor in rows {
            if conveyor.can_enqueue()
                && conveyor
                    .pallets()
                    .any(|p| p.source() == pallet.source() && p.lot() == pallet.lot())
            {
                return Some(conveyor.index());
            }
        }
        None
    }
}

impl AllocationStrategy for DedicatedPlusDynamicAllocation {
    fn allocate(&mut self, pallet: &Pallet, conveyors: &[Conveyor]) -> Option<usize> {
        let source = pallet.source();
        let dedicated = || {
            conveyors
                .iter()
                .filter(move |c| c.role() == Role::Dedicated(source))
        };
        let dynamic = || conveyors.iter().filter(|c| c.role() == Role::Dynamic);

        Self::affinity_row(dedicated(), pallet)
            .or_else(|| most_free(dedicated()))
            .or_else(|| Self::affinity_row(dynamic(), pallet))
            .or_else(|| most_free(dynamic()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pallet::Source;

    /// Default 12-row layout: A=0-2, dynamic=3, B=4-6, dynamic=7, C=8-10, dynamic=11
    fn buffer() -> Vec<Conveyor> {
        let roles = [
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
        ];
        roles
            .iter()
            .enumerate()
            .map(|(i, role)| Conveyor::new(i, *role, 22))
            .collect()
    }

    fn pallet(id: u64, source: Source, lot: u64) -> Pallet {
        Pallet::new(id, source, lot, 0, 1200)
    }

    fn fill_lot(conveyors: &mut [Conveyor], row: usize, source: Source, lot: u64, count: usize) {
        for _ in 0..count {
            conveyors[row]
                .enqueue(pallet(9000 + row as u64, source, lot))
                .unwrap();
        }
    }

    fn fill(conveyors: &mut [Conveyor], row: usize, source: Source, count: usize) {
        fill_lot(conveyors, row, source, 99, count);
    }

    #[test]
    fn test_most_free_prefers_emptiest_accepting_row() {
        let mut conveyors = buffer();
        fill(&mut conveyors, 0, Source::A, 5);
        fill(&mut conveyors, 1, Source::A, 2);
        fill(&mut conveyors, 2, Source::A, 8);
        fill(&mut conveyors, 3, Source::A, 3);
        fill(&mut conveyors, 7, Source::A, 3);
        fill(&mut conveyors, 11, Source::A, 3);

        let mut strategy = MostFreeAllocation;
        assert_eq!(strategy.allocate(&pallet(1, Source::A, 1), &conveyors), Some(1));
    }

    #[test]
    fn test_most_free_ties_break_to_lowest_index() {
        let conveyors = buffer();
        let mut strategy = MostFreeAllocation;
        // All empty: the lowest-index accepting row wins. For B and C that
        // is dynamic row 3, which accepts every source.
        assert_eq!(strategy.allocate(&pallet(1, Source::A, 1), &conveyors), Some(0));
        assert_eq!(strategy.allocate(&pallet(2, Source::B, 1), &conveyors), Some(3));
        assert_eq!(strategy.allocate(&pallet(3, Source::C, 1), &conveyors), Some(3));
    }

    #[test]
    fn test_most_free_blocks_when_all_accepting_rows_full() {
        let mut conveyors = buffer();
        for row in [0, 1, 2, 3, 7, 11] {
            fill(&mut conveyors, row, Source::A, 22);
        }
        let mut strategy = MostFreeAllocation;
        assert_eq!(strategy.allocate(&pallet(1, Source::A, 1), &conveyors), None);
        // B still has all its dedicated rows free
        assert_eq!(strategy.allocate(&pallet(2, Source::B, 1), &conveyors), Some(4));
    }

    #[test]
    fn test_round_robin_cycles_dedicated_rows() {
        let conveyors = buffer();
        let mut strategy = RoundRobinAllocation::new();
        assert_eq!(strategy.allocate(&pallet(1, Source::A, 1), &conveyors), Some(0));
        assert_eq!(strategy.allocate(&pallet(2, Source::A, 1), &conveyors), Some(1));
        assert_eq!(strategy.allocate(&pallet(3, Source::A, 1), &conveyors), Some(2));
        assert_eq!(strategy.allocate(&pallet(4, Source::A, 1), &conveyors), Some(0));
        // Independent cursor per source
        assert_eq!(strategy.allocate(&pallet(5, Source::B, 1), &conveyors), Some(4));
        assert_eq!(strategy.allocate(&pallet(6, Source::B, 1), &conveyors), Some(5));
    }

    #[test]
    fn test_round_robin_skips_full_rows() {
        let mut conveyors = buffer();
        fill(&mut conveyors, 1, Source::A, 22);

        let mut strategy = RoundRobinAllocation::new();
        assert_eq!(strategy.allocate(&pallet(1, Source::A, 1), &conveyors), Some(0));
        // Row 1 is full: cursor lands on row 2 instead
        assert_eq!(strategy.allocate(&pallet(2, Source::A, 1), &conveyors), Some(2));
        assert_eq!(strategy.allocate(&pallet(3, Source::A, 1), &conveyors), Some(0));
    }

    #[test]
    fn test_round_robin_never_spills_to_dynamic() {
        let mut conveyors = buffer();
        for row in 0..3 {
            fill(&mut conveyors, row, Source::A, 22);
        }
        let mut strategy = RoundRobinAllocation::new();
        assert_eq!(strategy.allocate(&pallet(1, Source::A, 1), &conveyors), None);
    }

    #[test]
    fn test_round_robin_cursor_round_trips() {
        let conveyors = buffer();
        let mut strategy = RoundRobinAllocation::new();
        strategy.allocate(&pallet(1, Source::A, 1), &conveyors);
        strategy.allocate(&pallet(2, Source::A, 1), &conveyors);

        let saved = strategy.cursors().unwrap();
        let mut restored = RoundRobinAllocation::new();
        restored.restore_cursors(saved);
        assert_eq!(restored.allocate(&pallet(3, Source::A, 1), &conveyors), Some(2));
    }

    #[test]
    fn test_keep_lot_prefers_row_with_same_lot() {
        let mut conveyors = buffer();
        // Lot 7 sits on row 1; rows 0 and 2 are emptier
        conveyors[1].enqueue(pallet(1, Source::A, 7)).unwrap();
        conveyors[1].enqueue(pallet(2, Source::A, 7)).unwrap();

        let mut strategy = DedicatedPlusDynamicAllocation;
        assert_eq!(strategy.allocate(&pallet(3, Source::A, 7), &conveyors), Some(1));
        // A different lot goes to the least-full row instead
        assert_eq!(strategy.allocate(&pallet(4, Source::A, 8), &conveyors), Some(0));
    }

    #[test]
    fn test_keep_lot_full_affinity_row_falls_back_to_least_full() {
        let mut conveyors = buffer();
        fill_lot(&mut conveyors, 0, Source::A, 99, 22); // row 0 full of lot 99
        fill_lot(&mut conveyors, 1, Source::A, 42, 4);

        let mut strategy = DedicatedPlusDynamicAllocation;
        // Lot 99 lives on full row 0: affinity cannot apply, least-full wins
        assert_eq!(strategy.allocate(&pallet(1, Source::A, 99), &conveyors), Some(2));
    }

    #[test]
    fn test_keep_lot_spills_to_dynamic_last() {
        let mut conveyors = buffer();
        for row in 0..3 {
            fill(&mut conveyors, row, Source::A, 22);
        }
        fill(&mut conveyors, 3, Source::B, 5);

        let mut strategy = DedicatedPlusDynamicAllocation;
        // Dedicated rows full: least-full dynamic row wins (7 and 11 empty, tie -> 7)
        assert_eq!(strategy.allocate(&pallet(1, Source::A, 1), &conveyors), Some(7));
    }

    #[test]
    fn test_keep_lot_affinity_applies_on_dynamic_rows_too() {
        let mut conveyors = buffer();
        for row in 0..3 {
            fill(&mut conveyors, row, Source::A, 22);
        }
        // The lot already overflowed onto row 7; row 3 is emptier
        fill_lot(&mut conveyors, 7, Source::A, 5, 10);

        let mut strategy = DedicatedPlusDynamicAllocation;
        assert_eq!(strategy.allocate(&pallet(1, Source::A, 5), &conveyors), Some(7));
        // A foreign source with the same lot number gets no affinity
        assert_eq!(strategy.allocate(&pallet(2, Source::B, 5), &conveyors), Some(4));
    }

    #[test]
    fn test_keep_lot_blocks_when_everything_full() {
        let mut conveyors = buffer();
        for row in [0, 1, 2, 3, 7, 11] {
            fill(&mut conveyors, row, Source::A, 22);
        }
        let mut strategy = DedicatedPlusDynamicAllocation;
        assert_eq!(strategy.allocate(&pallet(1, Source::A, 1), &conveyors), None);
    }
}
