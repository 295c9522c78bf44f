//! Production Line Simulator Core - Rust Engine
//!
//! Deterministic simulator for a two-phase production line with a
//! maturation buffer. Phase 1 producers (A, B, C) emit pallets at a fixed
//! cadence; pallets rest on bounded FIFO conveyors until mature; Phase 2
//! consumes one source at a time in rotating windows.
//!
//! # Architecture
//!
//! - **core**: Time management (minute-resolution simulated clock)
//! - **models**: Domain types (Pallet, Conveyor, logs, events)
//! - **production**: Producer emission scheduling
//! - **strategy**: Pluggable allocation and consumption strategies
//! - **scheduler**: Consumption window rotation and triggering
//! - **orchestrator**: Main simulation loop and checkpointing
//!
//! # Critical Invariants
//!
//! 1. Conveyors are strict FIFO: tail-only insert, head-only removal
//! 2. A pallet is only consumed after its maturation period
//! 3. All behavior is deterministic (no randomness anywhere in the core)

// Module declarations
pub mod core;
pub mod models;
pub mod orchestrator;
pub mod production;
pub mod scheduler;
pub mod strategy;

// Re-exports for convenience
pub use crate::core::time::SimClock;
pub use models::{
    conveyor::{Conveyor, ConveyorError, Role},
    event::{Event, EventLog},
    log::{ConsumptionRecord, PalletLog, PalletRecord},
    pallet::{Pallet, Source},
};
pub use orchestrator::{
    ConfigError, Engine, SimulationConfig, SimulationError, Snapshot,
};
pub use production::Producer;
pub use scheduler::WindowScheduler;
pub use strategy::{
    AllocationConfig, AllocationStrategy, ConsumptionConfig, ConsumptionStrategy,
};
