//! Domain models for the production line simulator

pub mod conveyor;
pub mod event;
pub mod log;
pub mod pallet;

// Re-exports
pub use conveyor::{Conveyor, ConveyorError, Role};
pub use event::{Event, EventLog};
pub use self::log::{ConsumptionRecord, PalletLog, PalletRecord};
pub use pallet::{Pallet, Source};
