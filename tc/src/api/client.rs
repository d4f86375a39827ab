//! Backend trait definition

use async_trait::async_trait;

use super::{ApiError, ChatReply, Coordinates, FinalizedTrip, RecommendedTrip, TripPreferences, WeatherSnapshot};
use crate::session::SessionId;

/// Typed surface over the trip-planning backend
///
/// One operation per external capability. Each call is a single
/// request/response exchange; failures are normalized into [`ApiError`] and
/// never carry partially-parsed data. Retry policy, if any, belongs to the
/// caller.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send one chat message and receive the assistant reply with any
    /// enrichment payload the backend attached to it
    async fn send_chat(&self, message: &str) -> Result<ChatReply, ApiError>;

    /// Resolve a place name to coordinates
    async fn geocode(&self, place: &str) -> Result<Coordinates, ApiError>;

    /// Current weather at a coordinate pair
    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, ApiError>;

    /// Post this participant's trip preferences for the session
    async fn submit_preferences(&self, session: SessionId, prefs: &TripPreferences) -> Result<(), ApiError>;

    /// Fetch the recommendation batch for the session
    async fn fetch_recommendations(&self, session: SessionId) -> Result<Vec<RecommendedTrip>, ApiError>;

    /// Cast a vote for a recommended trip by name
    async fn vote_for_trip(&self, session: SessionId, trip_name: &str) -> Result<(), ApiError>;

    /// Finalize the session's trip and fetch the itinerary
    async fn finalize_trip(&self, session: SessionId) -> Result<FinalizedTrip, ApiError>;
}

#[cfg(test)]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Scripted backend for unit tests
    ///
    /// Each operation pops the next scripted outcome for that operation and
    /// records the call in an ordered log. An unscripted call fails with a
    /// service error so tests notice unexpected traffic. Weather calls can be
    /// given artificial latency to exercise late-arrival handling.
    #[derive(Default)]
    pub struct MockBackend {
        chat: Mutex<VecDeque<Result<ChatReply, ApiError>>>,
        chat_delays: Mutex<VecDeque<Duration>>,
        geocode: Mutex<VecDeque<Result<Coordinates, ApiError>>>,
        weather: Mutex<VecDeque<Result<WeatherSnapshot, ApiError>>>,
        weather_delays: Mutex<VecDeque<Duration>>,
        preferences: Mutex<VecDeque<Result<(), ApiError>>>,
        recommendations: Mutex<VecDeque<Result<Vec<RecommendedTrip>, ApiError>>>,
        votes: Mutex<VecDeque<Result<(), ApiError>>>,
        finalize: Mutex<VecDeque<Result<FinalizedTrip, ApiError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn script_chat(&self, outcome: Result<ChatReply, ApiError>) {
            self.chat.lock().unwrap().push_back(outcome);
        }

        /// Delay applied to the next chat calls, in script order
        pub fn script_chat_delay(&self, delay: Duration) {
            self.chat_delays.lock().unwrap().push_back(delay);
        }

        pub fn script_geocode(&self, outcome: Result<Coordinates, ApiError>) {
            self.geocode.lock().unwrap().push_back(outcome);
        }

        pub fn script_weather(&self, outcome: Result<WeatherSnapshot, ApiError>) {
            self.weather.lock().unwrap().push_back(outcome);
        }

        /// Delay applied to the next weather calls, in script order
        pub fn script_weather_delay(&self, delay: Duration) {
            self.weather_delays.lock().unwrap().push_back(delay);
        }

        pub fn script_preferences(&self, outcome: Result<(), ApiError>) {
            self.preferences.lock().unwrap().push_back(outcome);
        }

        pub fn script_recommendations(&self, outcome: Result<Vec<RecommendedTrip>, ApiError>) {
            self.recommendations.lock().unwrap().push_back(outcome);
        }

        pub fn script_vote(&self, outcome: Result<(), ApiError>) {
            self.votes.lock().unwrap().push_back(outcome);
        }

        pub fn script_finalize(&self, outcome: Result<FinalizedTrip, ApiError>) {
            self.finalize.lock().unwrap().push_back(outcome);
        }

        /// Ordered log of calls, e.g. `["chat", "geocode:Paris"]`
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self, prefix: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.starts_with(prefix))
                .count()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn pop<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>, op: &str) -> Result<T, ApiError> {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Service(format!("no scripted {} outcome", op))))
        }
    }

    #[async_trait]
    impl Backend for MockBackend {
        async fn send_chat(&self, _message: &str) -> Result<ChatReply, ApiError> {
            self.record("chat".to_string());
            let delay = self.chat_delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Self::pop(&self.chat, "chat")
        }

        async fn geocode(&self, place: &str) -> Result<Coordinates, ApiError> {
            self.record(format!("geocode:{}", place));
            Self::pop(&self.geocode, "geocode")
        }

        async fn fetch_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, ApiError> {
            self.record(format!("weather:{},{}", latitude, longitude));
            let delay = self.weather_delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Self::pop(&self.weather, "weather")
        }

        async fn submit_preferences(&self, _session: SessionId, _prefs: &TripPreferences) -> Result<(), ApiError> {
            self.record("preferences".to_string());
            Self::pop(&self.preferences, "preferences")
        }

        async fn fetch_recommendations(&self, _session: SessionId) -> Result<Vec<RecommendedTrip>, ApiError> {
            self.record("recommendations".to_string());
            Self::pop(&self.recommendations, "recommendations")
        }

        async fn vote_for_trip(&self, _session: SessionId, trip_name: &str) -> Result<(), ApiError> {
            self.record(format!("vote:{}", trip_name));
            Self::pop(&self.votes, "vote")
        }

        async fn finalize_trip(&self, _session: SessionId) -> Result<FinalizedTrip, ApiError> {
            self.record("finalize".to_string());
            Self::pop(&self.finalize, "finalize")
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_replays_scripted_outcomes() {
            let backend = MockBackend::new();
            backend.script_chat(Ok(ChatReply::text("hello")));
            backend.script_chat(Err(ApiError::Service("down".to_string())));

            let first = backend.send_chat("hi").await.unwrap();
            assert_eq!(first.response, "hello");

            let second = backend.send_chat("hi again").await;
            assert!(second.is_err());

            assert_eq!(backend.call_count("chat"), 2);
        }

        #[tokio::test]
        async fn test_mock_fails_when_unscripted() {
            let backend = MockBackend::new();
            let result = backend.geocode("Paris").await;
            assert!(matches!(result, Err(ApiError::Service(_))));
            assert_eq!(backend.calls(), vec!["geocode:Paris".to_string()]);
        }
    }
}
