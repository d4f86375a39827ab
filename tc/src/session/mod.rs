//! Session core: state, identity, location resolution, enrichment folding,
//! and the orchestrator actor that ties them together
//!
//! The orchestrator is the single writer of session state. Everything else
//! in the crate either feeds it (the backend client, the push listener) or
//! reads from it (snapshots, events).

mod enrichment;
mod identity;
mod orchestrator;
mod resolver;
mod state;

pub use identity::{IdentitySource, SessionId};
pub use orchestrator::{SessionConfig, SessionError, SessionOrchestrator};
pub use resolver::{Resolution, plan_resolution};
pub use state::{Sender, SessionSnapshot, SessionState, Turn, WeatherFold};
