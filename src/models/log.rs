//! Pallet log
//!
//! Append-only record of every pallet ever produced, indexed for per-source
//! queries, with consumption timestamping. External exporters read the
//! finalized consumption records; the core owns no file format.
//!
//! # Critical Invariants
//!
//! - A record is created exactly once, at production time
//! - A consumption stamp is applied at most once and never removed
//! - Consumption order is preserved for export

use crate::models::pallet::{Pallet, Source};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifetime record of a single pallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalletRecord {
    /// Unique pallet id
    pub pallet_id: u64,

    /// Origin machine
    pub source: Source,

    /// Lot group id
    pub lot: u64,

    /// Minute of production
    pub t_prod: u64,

    /// Minute of consumption, or None while still buffered
    pub t_consumed: Option<u64>,
}

/// Finalized consumption record, field set stable for CSV export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub source: Source,
    pub lot: u64,
    pub pallet_id: u64,
    pub t_prod_minutes: u64,
    pub t_consumed_minutes: u64,
    /// `t_consumed - t_prod` formatted HH:MM
    pub wait_hhmm: String,
}

/// Format a wait duration in minutes as HH:MM
///
/// # Example
/// ```
/// use line_simulator_core_rs::models::log::format_wait_hhmm;
///
/// assert_eq!(format_wait_hhmm(1200), "20:00");
/// assert_eq!(format_wait_hhmm(1333), "22:13");
/// ```
pub fn format_wait_hhmm(minutes: u64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Append-only log of all pallets produced and consumed
///
/// Records are keyed by pallet id in a `BTreeMap` so iteration order is
/// deterministic; a per-source index avoids full scans for source queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PalletLog {
    /// All records, keyed by pallet id
    records: BTreeMap<u64, PalletRecord>,

    /// Pallet ids per source, in production order
    by_source: [Vec<u64>; 3],

    /// Pallet ids in consumption order
    consumption_order: Vec<u64>,
}

impl PalletLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from checkpointed parts
    ///
    /// Returns an error string when the consumption order references an
    /// unknown or unstamped record.
    pub fn from_parts(
        records: Vec<PalletRecord>,
        consumption_order: Vec<u64>,
    ) -> Result<Self, String> {
        let mut log = Self::new();
        for record in records {
            log.by_source[record.source.index()].push(record.pallet_id);
            log.records.insert(record.pallet_id, record);
        }
        for pallet_id in &consumption_order {
            match log.records.get(pallet_id) {
                Some(r) if r.t_consumed.is_some() => {}
                Some(_) => {
                    return Err(format!(
                        "pallet {} in consumption order has no consumption stamp",
                        pallet_id
                    ))
                }
                None => {
                    return Err(format!(
                        "pallet {} in consumption order has no record",
                        pallet_id
                    ))
                }
            }
        }
        log.consumption_order = consumption_order;
        Ok(log)
    }

    /// Record a freshly produced pallet
    pub fn record_production(&mut self, pallet: &Pallet) {
        self.by_source[pallet.source().index()].push(pallet.id());
        self.records.insert(
            pallet.id(),
            PalletRecord {
                pallet_id: pallet.id(),
                source: pallet.source(),
                lot: pallet.lot(),
                t_prod: pallet.t_prod(),
                t_consumed: None,
            },
        );
    }

    /// Stamp a pallet as consumed at `minute`
    ///
    /// Returns false when the pallet is unknown or already stamped; the
    /// first stamp always wins.
    pub fn record_consumption(&mut self, pallet_id: u64, minute: u64) -> bool {
        match self.records.get_mut(&pallet_id) {
            Some(record) if record.t_consumed.is_none() => {
                record.t_consumed = Some(minute);
                self.consumption_order.push(pallet_id);
                true
            }
            _ => false,
        }
    }

    /// Look up a single record
    pub fn get(&self, pallet_id: u64) -> Option<&PalletRecord> {
        self.records.get(&pallet_id)
    }

    /// All records in pallet-id order
    pub fn records(&self) -> impl Iterator<Item = &PalletRecord> {
        self.records.values()
    }

    /// Records of one source, in production order
    pub fn records_for_source(&self, source: Source) -> Vec<&PalletRecord> {
        self.by_source[source.index()]
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Total pallets ever produced
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been produced yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pallets produced by one source
    pub fn produced_count(&self, source: Source) -> u64 {
        self.by_source[source.index()].len() as u64
    }

    /// Pallets of one source already consumed
    pub fn consumed_count(&self, source: Source) -> u64 {
        self.by_source[source.index()]
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter(|r| r.t_consumed.is_some())
            .count() as u64
    }

    /// Finalized consumption records, in consumption order
    pub fn consumption_records(&self) -> Vec<ConsumptionRecord> {
        self.consumption_order
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter_map(|r| {
                r.t_consumed.map(|t_consumed| ConsumptionRecord {
                    source: r.source,
                    lot: r.lot,
                    pallet_id: r.pallet_id,
                    t_prod_minutes: r.t_prod,
                    t_consumed_minutes: t_consumed,
                    wait_hhmm: format_wait_hhmm(t_consumed - r.t_prod),
                })
            })
            .collect()
    }

    /// Checkpoint export: records in pallet-id order
    pub fn export_records(&self) -> Vec<PalletRecord> {
        self.records.values().cloned().collect()
    }

    /// Checkpoint export: pallet ids in consumption order
    pub fn export_consumption_order(&self) -> Vec<u64> {
        self.consumption_order.clone()
    }
}
