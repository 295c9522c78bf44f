//! Checkpoint - Save/Load Simulation State
//!
//! Enables serialization and deserialization of complete engine state for
//! pause/resume functionality. The core produces and consumes JSON strings;
//! persisting them is the caller's business.
//!
//! # Critical Invariants
//!
//! - **Determinism**: a restored run continues bit-identically, including
//!   strategy-local round-robin cursors
//! - **Buffer Integrity**: capacity, FIFO order and pallet uniqueness are
//!   validated on both save and load
//! - **Config Matching**: state can only be loaded with the configuration
//!   it was saved under (SHA-256 hash guard)

use crate::models::conveyor::Conveyor;
use crate::models::log::{PalletLog, PalletRecord};
use crate::orchestrator::engine::{Engine, SimulationConfig, SimulationError};
use crate::production::Producer;
use crate::scheduler::ActiveWindow;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

// ============================================================================
// Snapshot Structure
// ============================================================================

/// Complete engine state snapshot
///
/// Captures everything needed to resume a simulation from an arbitrary
/// minute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Current simulated minute
    pub now: u64,

    /// Next pallet id to assign
    pub next_pallet_id: u64,

    /// Full buffer contents
    pub conveyors: Vec<Conveyor>,

    /// Producer states (A, B, C order)
    pub producers: Vec<Producer>,

    /// Rotation cursor position of the window scheduler
    pub rotation_idx: usize,

    /// Currently open window, if any
    pub active_window: Option<ActiveWindow>,

    /// All pallet records, in pallet-id order
    pub records: Vec<PalletRecord>,

    /// Pallet ids in consumption order
    pub consumption_order: Vec<u64>,

    /// Round-robin allocation cursors, when that strategy is configured
    pub allocation_cursors: Option<[usize; 3]>,

    /// SHA-256 hash of the original configuration (for validation)
    pub config_hash: String,
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute a deterministic SHA-256 hash of a configuration
///
/// Uses canonical JSON with recursively sorted object keys so the hash does
/// not depend on serialization order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation
// ============================================================================

/// Validate snapshot integrity against its configuration
///
/// Checks the same invariants the engine audits at runtime: capacity
/// bounds, FIFO production order, role compliance, pallet uniqueness, and
/// log consistency (buffered pallets unstamped, consumption order stamped
/// and mature).
pub fn validate_snapshot(
    snapshot: &StateSnapshot,
    config: &SimulationConfig,
) -> Result<(), SimulationError> {
    let violation = |detail: String| SimulationError::InvariantViolation {
        minute: snapshot.now,
        detail,
    };

    if snapshot.conveyors.len() != config.rows {
        return Err(violation(format!(
            "snapshot has {} conveyors for {} configured rows",
            snapshot.conveyors.len(),
            config.rows
        )));
    }
    if snapshot.producers.len() != 3 {
        return Err(violation(format!(
            "snapshot has {} producers, expected 3",
            snapshot.producers.len()
        )));
    }

    let mut record_ids: HashSet<u64> = HashSet::new();
    for record in &snapshot.records {
        if !record_ids.insert(record.pallet_id) {
            return Err(violation(format!(
                "duplicate pallet record {}",
                record.pallet_id
            )));
        }
        if let Some(t_consumed) = record.t_consumed {
            if t_consumed < record.t_prod + config.maturation_minutes {
                return Err(violation(format!(
                    "pallet {} consumed at {} before maturing at {}",
                    record.pallet_id,
                    t_consumed,
                    record.t_prod + config.maturation_minutes
                )));
            }
        }
    }

    let mut buffered: HashSet<u64> = HashSet::new();
    for conveyor in &snapshot.conveyors {
        if conveyor.len() > config.row_capacity {
            return Err(violation(format!(
                "conveyor {} holds {} pallets over capacity {}",
                conveyor.index(),
                conveyor.len(),
                config.row_capacity
            )));
        }
        let mut previous_t_prod = 0;
        for pallet in conveyor.pallets() {
            if !conveyor.role().accepts(pallet.source()) {
                return Err(violation(format!(
                    "pallet {} of source {} on conveyor {} with role {:?}",
                    pallet.id(),
                    pallet.source(),
                    conveyor.index(),
                    conveyor.role()
                )));
            }
            if pallet.t_prod() < previous_t_prod {
                return Err(violation(format!(
                    "conveyor {} breaks FIFO order at pallet {}",
                    conveyor.index(),
                    pallet.id()
                )));
            }
            previous_t_prod = pallet.t_prod();
            if !buffered.insert(pallet.id()) {
                return Err(violation(format!(
                    "pallet {} present in two conveyors",
                    pallet.id()
                )));
            }
            if !record_ids.contains(&pallet.id()) {
                return Err(violation(format!(
                    "buffered pallet {} has no record",
                    pallet.id()
                )));
            }
        }
    }

    for record in &snapshot.records {
        let in_buffer = buffered.contains(&record.pallet_id);
        match (record.t_consumed, in_buffer) {
            (Some(_), true) => {
                return Err(violation(format!(
                    "consumed pallet {} still buffered",
                    record.pallet_id
                )))
            }
            (None, false) => {
                return Err(violation(format!(
                    "unconsumed pallet {} missing from buffer",
                    record.pallet_id
                )))
            }
            _ => {}
        }
    }

    Ok(())
}

// ============================================================================
// Engine Save/Load
// ============================================================================

impl Engine {
    /// Save complete simulation state to JSON
    ///
    /// Validates invariants before saving so a corrupted state is never
    /// persisted.
    ///
    /// # Example
    ///
    /// ```
    /// use line_simulator_core_rs::{Engine, SimulationConfig};
    ///
    /// let mut engine = Engine::new(SimulationConfig::default()).unwrap();
    /// engine.step(100).unwrap();
    ///
    /// let json = engine.save_state().unwrap();
    /// let restored = Engine::load_state(SimulationConfig::default(), &json).unwrap();
    /// assert_eq!(restored.now(), 100);
    /// ```
    pub fn save_state(&self) -> Result<String, SimulationError> {
        let config_hash = compute_config_hash(self.config())?;

        let snapshot = StateSnapshot {
            now: self.now(),
            next_pallet_id: self.next_pallet_id_for_checkpoint(),
            conveyors: self.conveyors().to_vec(),
            producers: self.producers().to_vec(),
            rotation_idx: self.scheduler().rotation_idx(),
            active_window: self.scheduler().active().cloned(),
            records: self.pallet_records(),
            consumption_order: self.consumption_order_for_checkpoint(),
            allocation_cursors: self.allocation_cursors_for_checkpoint(),
            config_hash,
        };

        validate_snapshot(&snapshot, self.config())?;

        serde_json::to_string(&snapshot).map_err(|e| {
            SimulationError::SerializationError(format!("Failed to serialize state: {}", e))
        })
    }

    /// Load simulation state from JSON and create a new engine
    ///
    /// The configuration must match the one the checkpoint was saved under;
    /// the SHA-256 hash guard rejects everything else.
    pub fn load_state(
        config: SimulationConfig,
        state_json: &str,
    ) -> Result<Self, SimulationError> {
        let snapshot: StateSnapshot = serde_json::from_str(state_json).map_err(|e| {
            SimulationError::DeserializationError(format!("Failed to parse state JSON: {}", e))
        })?;

        let config_hash = compute_config_hash(&config)?;
        if snapshot.config_hash != config_hash {
            return Err(SimulationError::ConfigMismatch {
                expected: snapshot.config_hash,
                actual: config_hash,
            });
        }

        validate_snapshot(&snapshot, &config)?;

        let pallet_log = PalletLog::from_parts(snapshot.records, snapshot.consumption_order)
            .map_err(SimulationError::DeserializationError)?;

        Engine::from_checkpoint_parts(
            config,
            snapshot.now,
            snapshot.next_pallet_id,
            snapshot.conveyors,
            snapshot.producers,
            snapshot.rotation_idx,
            snapshot.active_window,
            pallet_log,
            snapshot.allocation_cursors,
        )
    }
}
