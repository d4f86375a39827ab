//! Interactive terminal front-end
//!
//! Presentational collaborator over the session orchestrator: renders
//! transcript and enrichment from read-only snapshots and invokes
//! orchestrator commands for preferences, voting, and finalization.

mod session;

pub use session::ChatRepl;

use std::sync::Arc;

use eyre::Result;

use crate::api::HttpBackend;
use crate::config::Config;
use crate::events::{EventBus, spawn_event_logger};
use crate::push::PushListener;
use crate::session::{SessionConfig, SessionOrchestrator};

/// Wire up a session against the configured backend and run the REPL
pub async fn run_interactive(config: &Config, push_enabled: bool, initial_message: Option<String>) -> Result<()> {
    let backend =
        Arc::new(HttpBackend::from_config(config).map_err(|e| eyre::eyre!("Failed to create backend client: {}", e))?);

    let bus = EventBus::with_default_capacity();
    let _logger = spawn_event_logger(&bus);

    let push = push_enabled.then(|| PushListener::spawn(&config.base_url, bus.clone()));
    let session = SessionOrchestrator::spawn(backend, bus.clone(), push, SessionConfig::default());

    let mut repl = ChatRepl::new(session, &bus);
    repl.run(initial_message).await
}
