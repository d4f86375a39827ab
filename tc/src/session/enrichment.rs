//! Enrichment folding
//!
//! Weather is fetched in a spawned sub-task tagged with the coordinates it
//! was issued for, and folded (or discarded) when the result arrives back on
//! the orchestrator channel. Points of interest and recommendation batches
//! arrive embedded in chat replies and fold synchronously.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ApiError, Backend, Coordinates, PointOfInterest, RecommendedTrip, WeatherSnapshot};
use crate::events::{EventBus, SessionEvent};

use super::orchestrator::SessionMsg;
use super::state::{SessionState, WeatherFold};

/// Spawn a weather fetch for a freshly resolved location
///
/// Fire-and-forget relative to the chat turn: the result is posted back to
/// the orchestrator with its tag and judged against the then-current
/// location.
pub(crate) fn spawn_weather_fetch(backend: Arc<dyn Backend>, tx: mpsc::Sender<SessionMsg>, target: Coordinates) {
    debug!(%target, "spawn_weather_fetch");
    tokio::spawn(async move {
        let outcome = backend.fetch_weather(target.latitude, target.longitude).await;
        let _ = tx.send(SessionMsg::WeatherDone { target, outcome }).await;
    });
}

/// Fold a tagged weather result into state
pub(crate) fn fold_weather_result(
    state: &mut SessionState,
    bus: &EventBus,
    target: Coordinates,
    outcome: Result<WeatherSnapshot, ApiError>,
) {
    let snapshot = match outcome {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!(%target, error = %e, "weather fetch failed");
            None
        }
    };

    match state.fold_weather(target, snapshot) {
        WeatherFold::Applied => bus.emit(SessionEvent::WeatherChanged {
            weather: state.weather().cloned(),
        }),
        WeatherFold::Cleared => bus.emit(SessionEvent::WeatherChanged { weather: None }),
        WeatherFold::Stale => {}
    }
}

/// Fold the point-of-interest field of a chat reply
///
/// `None` means the reply omitted the field: the previous set stays. An
/// empty list clears it.
pub(crate) fn fold_pois(state: &mut SessionState, bus: &EventBus, pois: Option<Vec<PointOfInterest>>) {
    let Some(pois) = pois else {
        debug!("fold_pois: field absent, set untouched");
        return;
    };

    let count = pois.len();
    state.replace_pois(pois);
    bus.emit(SessionEvent::PoisReplaced { count });
}

/// Replace the recommendation set with a fresh batch
pub(crate) fn fold_recommendations(state: &mut SessionState, bus: &EventBus, trips: Vec<RecommendedTrip>) {
    let count = trips.len();
    state.replace_recommendations(trips);
    bus.emit(SessionEvent::RecommendationsReplaced { count });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn poi(id: i64) -> PointOfInterest {
        PointOfInterest {
            id,
            kind: "museum".to_string(),
            name: None,
            coordinates: None,
        }
    }

    #[tokio::test]
    async fn test_fold_pois_absent_field_leaves_set() {
        let mut state = SessionState::new();
        let bus = EventBus::with_default_capacity();
        state.replace_pois(vec![poi(1)]);

        fold_pois(&mut state, &bus, None);
        assert_eq!(state.points_of_interest().len(), 1);

        fold_pois(&mut state, &bus, Some(vec![]));
        assert!(state.points_of_interest().is_empty());
    }

    #[tokio::test]
    async fn test_fold_weather_failure_emits_clear() {
        let mut state = SessionState::new();
        let bus = EventBus::with_default_capacity();
        let mut rx = bus.subscribe();

        let paris = Coordinates::new(48.8566, 2.3522);
        state.set_location(paris);
        state.fold_weather(
            paris,
            Some(WeatherSnapshot {
                description: "clear sky".to_string(),
                temperature: 18.0,
                fetched_at: Utc::now(),
            }),
        );

        fold_weather_result(&mut state, &bus, paris, Err(ApiError::Service("down".to_string())));

        assert!(state.weather().is_none());
        match rx.recv().await.unwrap() {
            SessionEvent::WeatherChanged { weather } => assert!(weather.is_none()),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fold_weather_stale_result_emits_nothing() {
        let mut state = SessionState::new();
        let bus = EventBus::with_default_capacity();
        let mut rx = bus.subscribe();

        let paris = Coordinates::new(48.8566, 2.3522);
        let tokyo = Coordinates::new(35.6762, 139.6503);
        state.set_location(tokyo);

        fold_weather_result(
            &mut state,
            &bus,
            paris,
            Ok(WeatherSnapshot {
                description: "clear sky".to_string(),
                temperature: 18.0,
                fetched_at: Utc::now(),
            }),
        );

        assert!(state.weather().is_none());
        assert!(rx.try_recv().is_err());
    }
}
