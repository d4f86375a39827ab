//! Server push listener
//!
//! Auxiliary channel for unsolicited server messages, delivered over SSE.
//! Inbound messages are informational only: they are logged and republished
//! as [`SessionEvent::ServerNotice`], and never drive a state transition.
//! The listener is owned by the orchestrator and closed on session teardown;
//! a dead or absent channel degrades to logging, never to an error the user
//! sees.

use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::{EventBus, SessionEvent};

/// Handle to the spawned SSE listener task
pub struct PushListener {
    task: JoinHandle<()>,
}

impl PushListener {
    /// Spawn a listener against the backend's event stream
    pub fn spawn(base_url: &str, bus: EventBus) -> Self {
        let url = format!("{}/events", base_url.trim_end_matches('/'));
        let task = tokio::spawn(listen(url, bus));
        Self { task }
    }

    /// Stop listening; called on session teardown
    pub fn close(self) {
        debug!("push listener closed");
        self.task.abort();
    }
}

async fn listen(url: String, bus: EventBus) {
    debug!(%url, "push listener connecting");
    let mut stream = EventSource::get(url.as_str());

    while let Some(event) = stream.next().await {
        match event {
            Ok(Event::Open) => debug!("push channel open"),
            Ok(Event::Message(message)) => {
                info!(data = %message.data, "server notice received");
                bus.emit(SessionEvent::ServerNotice { data: message.data });
            }
            Err(e) => {
                // Auxiliary channel: give up quietly rather than retry-storm
                debug!(error = %e, "push channel error; listener stopping");
                stream.close();
                break;
            }
        }
    }

    debug!("push listener finished");
}
