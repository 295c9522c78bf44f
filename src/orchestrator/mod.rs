//! Orchestrator - main simulation loop
//!
//! Implements the complete minute loop integrating producers, allocation,
//! window scheduling and consumption.
//!
//! See `engine.rs` for the full implementation.

pub mod checkpoint;
pub mod engine;

// Re-export main types for convenience
pub use engine::{
    ConfigError, ConveyorSnapshot, Engine, PalletView, ProducerSnapshot, SimulationConfig,
    SimulationError, Snapshot, WindowSnapshot,
};

// Re-export checkpoint types
pub use checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};
