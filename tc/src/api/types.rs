//! Domain types shared between the backend client and the session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components are finite numbers
    pub fn is_well_formed(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Weather reading for a resolved location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub description: String,
    /// Degrees Celsius
    pub temperature: f64,
    pub fetched_at: DateTime<Utc>,
}

/// A point of interest near the resolved location
///
/// Decoded from the Overpass-style records the backend forwards alongside
/// chat replies. `kind` carries the most specific category tag available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: i64,
    pub kind: String,
    pub name: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// One trip option in a recommendation batch
///
/// `name` is the unique key within a batch; `votes` reflects the server-side
/// tally at fetch time and is never incremented locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedTrip {
    pub name: String,
    pub style: String,
    #[serde(default)]
    pub votes: u32,
    pub dates: Option<String>,
    pub budget: Option<String>,
    #[serde(default)]
    pub activities: Vec<String>,
}

/// Group travel preferences posted before requesting recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPreferences {
    pub location: String,
    pub budget: String,
    pub dates: String,
    pub mode: String,
}

/// Result of finalizing the group trip
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedTrip {
    /// The winning trip, when the backend includes it
    pub trip: Option<RecommendedTrip>,
    pub itinerary: String,
}

/// Parsed chat reply
///
/// `location_coords` is kept as the raw wire pair; the location resolver
/// decides whether it is well-formed. `points_of_interest` distinguishes an
/// absent field (leave state as-is) from an empty list (clear state).
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub location: Option<String>,
    pub location_coords: Option<Vec<f64>>,
    pub points_of_interest: Option<Vec<PointOfInterest>>,
    pub recommended_trips: Option<Vec<RecommendedTrip>>,
}

impl ChatReply {
    /// Plain text reply with no enrichment payload
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            location: None,
            location_coords: None,
            points_of_interest: None,
            recommended_trips: None,
        }
    }
}
