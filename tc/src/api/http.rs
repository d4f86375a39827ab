//! HTTP implementation of the backend client
//!
//! One reqwest client with a bounded per-request timeout; every endpoint
//! decodes into a typed wire struct and is validated here, so malformed
//! payloads surface as [`ApiError`] instead of leaking into session state.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{
    ApiError, Backend, ChatReply, Coordinates, FinalizedTrip, PointOfInterest, RecommendedTrip, TripPreferences,
    WeatherSnapshot,
};
use crate::config::Config;
use crate::session::SessionId;

/// Backend client over the trip-planning HTTP API
pub struct HttpBackend {
    base_url: String,
    user: String,
    http: Client,
}

impl HttpBackend {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        debug!(base_url = %config.base_url, timeout_ms = config.request_timeout_ms, "from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user: config.user.clone(),
            http,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send_chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        debug!(len = message.len(), "send_chat: called");
        let url = format!("{}/chat", self.base_url);
        let response = self.http.post(&url).json(&ChatPayload { message }).send().await?;

        let wire: ChatWire = Self::decode(response).await?;
        parse_chat(wire)
    }

    async fn geocode(&self, place: &str) -> Result<Coordinates, ApiError> {
        debug!(%place, "geocode: called");
        let url = format!("{}/geocode", self.base_url);
        let response = self.http.get(&url).query(&[("location", place)]).send().await?;

        let wire: GeocodeWire = Self::decode(response).await?;
        parse_geocode(wire)
    }

    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, ApiError> {
        debug!(latitude, longitude, "fetch_weather: called");
        let url = format!("{}/weather", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("lat", latitude), ("lon", longitude)])
            .send()
            .await?;

        let wire: WeatherWire = Self::decode(response).await?;
        parse_weather(wire)
    }

    async fn submit_preferences(&self, session: SessionId, prefs: &TripPreferences) -> Result<(), ApiError> {
        debug!(%session, "submit_preferences: called");
        let url = format!("{}/submit_preference", self.base_url);
        let payload = PreferencePayload {
            prefs,
            session_id: session.to_string(),
            user: &self.user,
        };
        let response = self.http.post(&url).json(&payload).send().await?;

        let wire: AckWire = Self::decode(response).await?;
        parse_ack(wire)
    }

    async fn fetch_recommendations(&self, session: SessionId) -> Result<Vec<RecommendedTrip>, ApiError> {
        debug!(%session, "fetch_recommendations: called");
        let url = format!("{}/get_recommendations/{}", self.base_url, session);
        let response = self.http.get(&url).send().await?;

        let wire: RecommendationsWire = Self::decode(response).await?;
        parse_recommendations(wire)
    }

    async fn vote_for_trip(&self, session: SessionId, trip_name: &str) -> Result<(), ApiError> {
        debug!(%session, %trip_name, "vote_for_trip: called");
        let url = format!("{}/vote_trip", self.base_url);
        let payload = VotePayload {
            session_id: session.to_string(),
            user: &self.user,
            trip_name,
        };
        let response = self.http.post(&url).json(&payload).send().await?;

        let wire: AckWire = Self::decode(response).await?;
        parse_ack(wire)
    }

    async fn finalize_trip(&self, session: SessionId) -> Result<FinalizedTrip, ApiError> {
        debug!(%session, "finalize_trip: called");
        let url = format!("{}/finalize_trip/{}", self.base_url, session);
        let response = self.http.get(&url).send().await?;

        let wire: FinalizeWire = Self::decode(response).await?;
        parse_finalize(wire)
    }
}

// Request payloads

#[derive(Serialize)]
struct ChatPayload<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct PreferencePayload<'a> {
    #[serde(flatten)]
    prefs: &'a TripPreferences,
    session_id: String,
    user: &'a str,
}

#[derive(Serialize)]
struct VotePayload<'a> {
    session_id: String,
    user: &'a str,
    trip_name: &'a str,
}

// Wire shapes

#[derive(Debug, Deserialize)]
struct ChatWire {
    response: Option<String>,
    location: Option<String>,
    location_coords: Option<Vec<f64>>,
    points_of_interest: Option<Vec<PoiRecord>>,
    recommended_trips: Option<Vec<TripRecord>>,
}

#[derive(Debug, Deserialize)]
struct PoiRecord {
    id: i64,
    #[serde(rename = "type")]
    kind: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    tags: Option<PoiTags>,
}

#[derive(Debug, Default, Deserialize)]
struct PoiTags {
    name: Option<String>,
    tourism: Option<String>,
    amenity: Option<String>,
    shop: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TripRecord {
    name: Option<String>,
    trip_style: Option<String>,
    dates: Option<String>,
    budget: Option<String>,
    activities: Option<Vec<String>>,
    votes: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeocodeWire {
    latitude: Option<f64>,
    longitude: Option<f64>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherWire {
    weather: Option<Vec<ConditionWire>>,
    main: Option<MainWire>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConditionWire {
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainWire {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct AckWire {
    #[allow(dead_code)]
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecommendationsWire {
    recommendations: Option<Vec<TripRecord>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinalizeWire {
    finalized_trip: Option<TripRecord>,
    itinerary: Option<String>,
    error: Option<String>,
}

// Wire -> domain conversions

impl PoiRecord {
    fn into_domain(self) -> PointOfInterest {
        let tags = self.tags.unwrap_or_default();
        // The most specific category tag wins over the raw element type
        let kind = tags
            .tourism
            .or(tags.amenity)
            .or(tags.shop)
            .or(self.kind)
            .unwrap_or_else(|| "node".to_string());
        let coordinates = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        };

        PointOfInterest {
            id: self.id,
            kind,
            name: tags.name,
            coordinates,
        }
    }
}

impl TripRecord {
    /// Records without a name cannot be voted on and are dropped
    fn into_domain(self) -> Option<RecommendedTrip> {
        Some(RecommendedTrip {
            name: self.name?,
            style: self.trip_style.unwrap_or_default(),
            votes: self.votes.unwrap_or(0),
            dates: self.dates,
            budget: self.budget,
            activities: self.activities.unwrap_or_default(),
        })
    }
}

fn parse_chat(wire: ChatWire) -> Result<ChatReply, ApiError> {
    let response = wire
        .response
        .ok_or_else(|| ApiError::Invalid("chat reply missing response text".to_string()))?;

    Ok(ChatReply {
        response,
        location: wire.location,
        location_coords: wire.location_coords,
        points_of_interest: wire
            .points_of_interest
            .map(|pois| pois.into_iter().map(PoiRecord::into_domain).collect()),
        recommended_trips: wire
            .recommended_trips
            .map(|trips| trips.into_iter().filter_map(TripRecord::into_domain).collect()),
    })
}

fn parse_geocode(wire: GeocodeWire) -> Result<Coordinates, ApiError> {
    if let Some(error) = wire.error {
        return Err(ApiError::Service(error));
    }

    match (wire.latitude, wire.longitude) {
        (Some(latitude), Some(longitude)) => {
            let coords = Coordinates::new(latitude, longitude);
            if !coords.is_well_formed() {
                return Err(ApiError::Invalid("geocode reply has non-finite coordinates".to_string()));
            }
            Ok(coords)
        }
        _ => Err(ApiError::Invalid("geocode reply missing coordinates".to_string())),
    }
}

fn parse_weather(wire: WeatherWire) -> Result<WeatherSnapshot, ApiError> {
    if let Some(error) = wire.error {
        return Err(ApiError::Service(error));
    }

    let description = wire
        .weather
        .and_then(|conditions| conditions.into_iter().next())
        .map(|c| c.description)
        .ok_or_else(|| ApiError::Invalid("weather reply missing conditions".to_string()))?;
    let temperature = wire
        .main
        .map(|m| m.temp)
        .ok_or_else(|| ApiError::Invalid("weather reply missing temperature".to_string()))?;

    Ok(WeatherSnapshot {
        description,
        temperature,
        fetched_at: Utc::now(),
    })
}

fn parse_ack(wire: AckWire) -> Result<(), ApiError> {
    match wire.error {
        Some(error) => Err(ApiError::Service(error)),
        None => Ok(()),
    }
}

fn parse_recommendations(wire: RecommendationsWire) -> Result<Vec<RecommendedTrip>, ApiError> {
    if let Some(error) = wire.error {
        return Err(ApiError::Service(error));
    }

    let trips = wire
        .recommendations
        .ok_or_else(|| ApiError::Invalid("recommendations reply missing trip list".to_string()))?;
    Ok(trips.into_iter().filter_map(TripRecord::into_domain).collect())
}

fn parse_finalize(wire: FinalizeWire) -> Result<FinalizedTrip, ApiError> {
    if let Some(error) = wire.error {
        return Err(ApiError::Service(error));
    }

    let itinerary = wire
        .itinerary
        .ok_or_else(|| ApiError::Invalid("finalize reply missing itinerary".to_string()))?;

    Ok(FinalizedTrip {
        trip: wire.finalized_trip.and_then(TripRecord::into_domain),
        itinerary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_with_enrichment() {
        let wire: ChatWire = serde_json::from_str(
            r#"{
                "response": "Paris is lovely in spring.",
                "location": "Paris",
                "location_coords": [48.8566, 2.3522],
                "points_of_interest": [
                    {"id": 42, "type": "node", "lat": 48.86, "lon": 2.35,
                     "tags": {"name": "Louvre", "tourism": "museum"}},
                    {"id": 43, "type": "node"}
                ]
            }"#,
        )
        .unwrap();

        let reply = parse_chat(wire).unwrap();
        assert_eq!(reply.response, "Paris is lovely in spring.");
        assert_eq!(reply.location.as_deref(), Some("Paris"));
        assert_eq!(reply.location_coords, Some(vec![48.8566, 2.3522]));

        let pois = reply.points_of_interest.unwrap();
        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].name.as_deref(), Some("Louvre"));
        assert_eq!(pois[0].kind, "museum");
        assert_eq!(pois[0].coordinates, Some(Coordinates::new(48.86, 2.35)));
        assert_eq!(pois[1].kind, "node");
        assert!(pois[1].name.is_none());
        assert!(pois[1].coordinates.is_none());
    }

    #[test]
    fn test_parse_chat_empty_poi_list_is_preserved() {
        let wire: ChatWire = serde_json::from_str(r#"{"response": "ok", "points_of_interest": []}"#).unwrap();
        let reply = parse_chat(wire).unwrap();
        assert_eq!(reply.points_of_interest, Some(vec![]));

        let wire: ChatWire = serde_json::from_str(r#"{"response": "ok"}"#).unwrap();
        let reply = parse_chat(wire).unwrap();
        assert!(reply.points_of_interest.is_none());
    }

    #[test]
    fn test_parse_chat_missing_response_is_invalid() {
        let wire: ChatWire = serde_json::from_str(r#"{"location": "Paris"}"#).unwrap();
        assert!(matches!(parse_chat(wire), Err(ApiError::Invalid(_))));
    }

    #[test]
    fn test_parse_geocode() {
        let wire: GeocodeWire = serde_json::from_str(r#"{"latitude": 48.8566, "longitude": 2.3522}"#).unwrap();
        let coords = parse_geocode(wire).unwrap();
        assert_eq!(coords, Coordinates::new(48.8566, 2.3522));

        let wire: GeocodeWire = serde_json::from_str(r#"{"error": "Location not found"}"#).unwrap();
        assert!(matches!(parse_geocode(wire), Err(ApiError::Service(_))));

        let wire: GeocodeWire = serde_json::from_str(r#"{"latitude": 48.8566}"#).unwrap();
        assert!(matches!(parse_geocode(wire), Err(ApiError::Invalid(_))));
    }

    #[test]
    fn test_parse_weather() {
        let wire: WeatherWire =
            serde_json::from_str(r#"{"weather": [{"description": "clear sky"}], "main": {"temp": 18.2}}"#).unwrap();
        let snapshot = parse_weather(wire).unwrap();
        assert_eq!(snapshot.description, "clear sky");
        assert_eq!(snapshot.temperature, 18.2);

        let wire: WeatherWire = serde_json::from_str(r#"{"error": "API key not configured"}"#).unwrap();
        assert!(matches!(parse_weather(wire), Err(ApiError::Service(_))));

        let wire: WeatherWire = serde_json::from_str(r#"{"weather": [], "main": {"temp": 1.0}}"#).unwrap();
        assert!(matches!(parse_weather(wire), Err(ApiError::Invalid(_))));
    }

    #[test]
    fn test_parse_recommendations_maps_trip_style() {
        let wire: RecommendationsWire = serde_json::from_str(
            r#"{"recommendations": [
                {"name": "Alps Trek", "trip_style": "adventure", "dates": "June",
                 "budget": "$2000", "activities": ["hiking", "climbing"], "votes": 3},
                {"trip_style": "unnamed entry"}
            ]}"#,
        )
        .unwrap();

        let trips = parse_recommendations(wire).unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].name, "Alps Trek");
        assert_eq!(trips[0].style, "adventure");
        assert_eq!(trips[0].votes, 3);
        assert_eq!(trips[0].activities, vec!["hiking", "climbing"]);
    }

    #[test]
    fn test_parse_finalize() {
        let wire: FinalizeWire = serde_json::from_str(
            r#"{"finalized_trip": {"name": "Alps Trek", "trip_style": "adventure"},
                "itinerary": "Day 1: arrive."}"#,
        )
        .unwrap();

        let finalized = parse_finalize(wire).unwrap();
        assert_eq!(finalized.itinerary, "Day 1: arrive.");
        assert_eq!(finalized.trip.unwrap().name, "Alps Trek");

        let wire: FinalizeWire = serde_json::from_str(r#"{"error": "No votes have been cast"}"#).unwrap();
        assert!(matches!(parse_finalize(wire), Err(ApiError::Service(_))));
    }
}
