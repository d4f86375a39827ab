//! Session state owned by the orchestrator
//!
//! All mutation goes through the fold methods here, called only from the
//! orchestrator task. Collaborators see cloned [`SessionSnapshot`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{Coordinates, PointOfInterest, RecommendedTrip, WeatherSnapshot};

/// Author of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// One message in the conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub text: String,
    pub sender: Sender,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            at: Utc::now(),
        }
    }
}

/// Outcome of folding a weather result tagged with the location it was
/// fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherFold {
    /// Reading stored; it matches the current location
    Applied,
    /// Fetch for the current location failed; previous reading cleared
    Cleared,
    /// The location moved on while the fetch was in flight; result dropped
    Stale,
}

/// The full mutable session state
///
/// Transcript is append-only. Location changes only on successful
/// resolution. Weather is valid only for the location it was fetched for.
#[derive(Debug, Default)]
pub struct SessionState {
    transcript: Vec<Turn>,
    location: Option<Coordinates>,
    weather: Option<WeatherSnapshot>,
    points_of_interest: Vec<PointOfInterest>,
    recommendations: Vec<RecommendedTrip>,
    itinerary: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.weather.as_ref()
    }

    pub fn recommendations(&self) -> &[RecommendedTrip] {
        &self.recommendations
    }

    pub fn itinerary(&self) -> Option<&str> {
        self.itinerary.as_deref()
    }

    /// Append a turn; returns a clone for event emission
    pub fn append_turn(&mut self, turn: Turn) -> Turn {
        debug!(sender = ?turn.sender, len = turn.text.len(), "append_turn");
        self.transcript.push(turn.clone());
        turn
    }

    /// Fold a successful location resolution
    pub fn set_location(&mut self, coords: Coordinates) {
        debug!(%coords, "set_location");
        self.location = Some(coords);
    }

    /// Fold a weather result tagged with the location it was fetched for
    ///
    /// A result whose tag no longer matches the current location is
    /// discarded; a failure for the current location clears the reading
    /// rather than leaving a mismatched one.
    pub fn fold_weather(&mut self, tag: Coordinates, outcome: Option<WeatherSnapshot>) -> WeatherFold {
        if self.location != Some(tag) {
            debug!(%tag, current = ?self.location, "fold_weather: stale result discarded");
            return WeatherFold::Stale;
        }

        match outcome {
            Some(snapshot) => {
                debug!(description = %snapshot.description, "fold_weather: applied");
                self.weather = Some(snapshot);
                WeatherFold::Applied
            }
            None => {
                debug!(%tag, "fold_weather: fetch failed, reading cleared");
                self.weather = None;
                WeatherFold::Cleared
            }
        }
    }

    /// Replace the point-of-interest set wholesale
    ///
    /// An empty list clears the set; callers must not invoke this when the
    /// chat reply omitted the field entirely.
    pub fn replace_pois(&mut self, pois: Vec<PointOfInterest>) {
        debug!(count = pois.len(), "replace_pois");
        self.points_of_interest = pois;
    }

    pub fn points_of_interest(&self) -> &[PointOfInterest] {
        &self.points_of_interest
    }

    /// Replace the recommendation set wholesale
    pub fn replace_recommendations(&mut self, trips: Vec<RecommendedTrip>) {
        debug!(count = trips.len(), "replace_recommendations");
        self.recommendations = trips;
    }

    pub fn set_itinerary(&mut self, itinerary: String) {
        debug!(len = itinerary.len(), "set_itinerary");
        self.itinerary = Some(itinerary);
    }

    /// Read-only copy for presentational collaborators
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            transcript: self.transcript.clone(),
            location: self.location,
            weather: self.weather.clone(),
            points_of_interest: self.points_of_interest.clone(),
            recommendations: self.recommendations.clone(),
            itinerary: self.itinerary.clone(),
        }
    }
}

/// Immutable view of the session handed to renderers
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub transcript: Vec<Turn>,
    pub location: Option<Coordinates>,
    pub weather: Option<WeatherSnapshot>,
    pub points_of_interest: Vec<PointOfInterest>,
    pub recommendations: Vec<RecommendedTrip>,
    pub itinerary: Option<String>,
}
