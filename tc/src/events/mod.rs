//! Session event fan-out
//!
//! The orchestrator is the only writer of session state; everything that
//! wants to react to a fold (the terminal renderer, the diagnostic logger)
//! subscribes here instead of polling snapshots.

mod bus;
mod logger;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use logger::spawn_event_logger;
pub use types::SessionEvent;
