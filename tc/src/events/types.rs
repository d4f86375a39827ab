//! Session event types
//!
//! Notifications emitted after each state fold so presentational
//! collaborators know when to pull a fresh snapshot. Events carry summaries,
//! not authoritative state.

use crate::api::{Coordinates, WeatherSnapshot};
use crate::session::Turn;

/// State-change notifications broadcast by the orchestrator
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A turn was appended to the transcript
    TurnAppended { turn: Turn },
    /// A chat turn finished (reply folded or error turn appended)
    TurnCompleted,
    /// The session location resolved to new coordinates
    LocationChanged { location: Coordinates },
    /// Weather was applied or cleared for the current location
    WeatherChanged { weather: Option<WeatherSnapshot> },
    /// The point-of-interest set was replaced
    PoisReplaced { count: usize },
    /// The recommendation set was replaced
    RecommendationsReplaced { count: usize },
    /// The finalized itinerary arrived
    ItinerarySet,
    /// Informational message from the server push channel; never drives
    /// state transitions
    ServerNotice { data: String },
}

impl SessionEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::TurnAppended { .. } => "turn_appended",
            SessionEvent::TurnCompleted => "turn_completed",
            SessionEvent::LocationChanged { .. } => "location_changed",
            SessionEvent::WeatherChanged { .. } => "weather_changed",
            SessionEvent::PoisReplaced { .. } => "pois_replaced",
            SessionEvent::RecommendationsReplaced { .. } => "recommendations_replaced",
            SessionEvent::ItinerarySet => "itinerary_set",
            SessionEvent::ServerNotice { .. } => "server_notice",
        }
    }
}
