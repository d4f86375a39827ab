//! Event logger - subscribes to the bus and mirrors events into tracing
//!
//! Keeps a diagnostic trail of every fold without the renderer having to log
//! anything itself.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::bus::EventBus;
use super::types::SessionEvent;

/// Spawn a task that logs every event until the bus is dropped
pub fn spawn_event_logger(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "event logger lagged; events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("event logger stopped");
    })
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::TurnAppended { turn } => {
            info!(sender = ?turn.sender, len = turn.text.len(), "turn appended");
        }
        SessionEvent::TurnCompleted => debug!("turn completed"),
        SessionEvent::LocationChanged { location } => info!(%location, "location changed"),
        SessionEvent::WeatherChanged { weather } => match weather {
            Some(w) => info!(description = %w.description, temperature = w.temperature, "weather updated"),
            None => info!("weather cleared"),
        },
        SessionEvent::PoisReplaced { count } => info!(count, "points of interest replaced"),
        SessionEvent::RecommendationsReplaced { count } => info!(count, "recommendations replaced"),
        SessionEvent::ItinerarySet => info!("itinerary set"),
        SessionEvent::ServerNotice { data } => info!(%data, "server notice"),
    }
}
