//! Session orchestrator - actor that owns the session state
//!
//! The orchestrator is the sole mutator of [`SessionState`]. It runs as a
//! spawned task processing commands from a cloneable [`SessionOrchestrator`]
//! handle. Network calls never block the actor: each runs in its own
//! sub-task and posts its result back on the same channel, so command sagas
//! interleave freely with an in-flight chat turn while every fold still
//! happens on one task.
//!
//! Chat turns are strictly serialized by a phase gate: a send issued while a
//! turn is in flight is rejected, never queued. Weather is the one
//! enrichment that outlives its turn; its result is tagged with the
//! coordinates it was fetched for and discarded on arrival if the session
//! has moved on.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::api::{ApiError, Backend, ChatReply, Coordinates, FinalizedTrip, RecommendedTrip, TripPreferences,
    WeatherSnapshot};
use crate::events::{EventBus, SessionEvent};
use crate::push::PushListener;

use super::enrichment;
use super::identity::{IdentitySource, SessionId};
use super::resolver::{self, Resolution};
use super::state::{SessionSnapshot, SessionState, Turn};

/// Command channel capacity
const CHANNEL_CAPACITY: usize = 64;

/// Transcript text when the backend cannot be reached at all
const CONNECT_ERROR_TEXT: &str = "Error: Could not connect to backend.";
/// Transcript text when the backend answers without a usable reply
const CHAT_ERROR_TEXT: &str = "Error: Could not get response from AI.";
/// Transcript text announcing a fresh recommendation batch
const RECOMMENDATIONS_ANNOUNCEMENT: &str = "Here are some trip recommendations:";

/// Errors surfaced to orchestrator callers
#[derive(Debug, Error)]
pub enum SessionError {
    /// A chat turn is already in flight; the send was rejected, not queued
    #[error("a chat turn is already in flight")]
    Busy,

    #[error("session closed")]
    Closed,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// State of the one in-flight chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnPhase {
    Idle,
    /// Chat call in flight
    Sending,
    /// Chat reply folded; geocode lookup still holds the gate
    Enriching,
}

/// Orchestrator configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    pub identity: IdentitySource,
}

/// Messages processed by the actor: external commands plus results posted
/// back by network sub-tasks
pub(crate) enum SessionMsg {
    Command(SessionCommand),
    ChatDone {
        outcome: Result<ChatReply, ApiError>,
    },
    GeocodeDone {
        place: String,
        outcome: Result<Coordinates, ApiError>,
    },
    WeatherDone {
        target: Coordinates,
        outcome: Result<WeatherSnapshot, ApiError>,
    },
    RecommendationsDone {
        outcome: Result<Vec<RecommendedTrip>, ApiError>,
        /// Present for an explicit fetch, absent for the post-preferences chain
        reply: Option<oneshot::Sender<Result<(), SessionError>>>,
    },
    FinalizeDone {
        outcome: Result<FinalizedTrip, ApiError>,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
}

pub(crate) enum SessionCommand {
    SendMessage {
        text: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SubmitPreferences {
        prefs: TripPreferences,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    FetchRecommendations {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    VoteForTrip {
        trip_name: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    FinalizeTrip {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown,
}

/// Handle to the session actor
///
/// Cloneable; all operations go through the command channel. Dropping every
/// handle without calling [`shutdown`](Self::shutdown) leaves the actor
/// running until the runtime stops.
#[derive(Clone)]
pub struct SessionOrchestrator {
    tx: mpsc::Sender<SessionMsg>,
}

impl SessionOrchestrator {
    /// Spawn the session actor
    ///
    /// The push listener, when given, is owned by the actor and closed on
    /// shutdown.
    pub fn spawn(
        backend: Arc<dyn Backend>,
        bus: EventBus,
        push: Option<PushListener>,
        config: SessionConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let actor = Actor {
            backend,
            bus,
            tx: tx.clone(),
            state: SessionState::new(),
            phase: TurnPhase::Idle,
            pending_turn: None,
            identity: None,
            identity_source: config.identity,
            push,
        };

        tokio::spawn(actor_loop(actor, rx));
        info!("session orchestrator spawned");

        Self { tx }
    }

    /// Send one chat message and drive the turn to completion
    ///
    /// Resolves once the reply (or the inline error turn) has been folded
    /// and location resolution finished; an in-flight weather fetch does not
    /// hold this up. Fails with [`SessionError::Busy`] while another turn is
    /// in flight.
    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(SessionCommand::SendMessage {
            text: text.into(),
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Post trip preferences; a fresh recommendations fetch follows on
    /// success
    pub async fn submit_preferences(&self, prefs: TripPreferences) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(SessionCommand::SubmitPreferences { prefs, reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Fetch the recommendation batch for this session
    pub async fn fetch_recommendations(&self) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(SessionCommand::FetchRecommendations { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Cast a vote for a recommended trip; counts refresh only on the next
    /// recommendations fetch
    pub async fn vote_for_trip(&self, trip_name: impl Into<String>) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(SessionCommand::VoteForTrip {
            trip_name: trip_name.into(),
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Finalize the trip; the outcome (itinerary or error) lands in the
    /// transcript either way
    pub async fn finalize_trip(&self) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(SessionCommand::FinalizeTrip { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Read-only copy of the current session state
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(SessionCommand::Snapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    /// Stop the actor and close the push listener
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.command(SessionCommand::Shutdown).await
    }

    async fn command(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx
            .send(SessionMsg::Command(command))
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// The actor that owns the state
struct Actor {
    backend: Arc<dyn Backend>,
    bus: EventBus,
    /// Self-sender handed to network sub-tasks
    tx: mpsc::Sender<SessionMsg>,
    state: SessionState,
    phase: TurnPhase,
    /// Caller waiting for the in-flight turn
    pending_turn: Option<oneshot::Sender<Result<(), SessionError>>>,
    identity: Option<SessionId>,
    identity_source: IdentitySource,
    push: Option<PushListener>,
}

async fn actor_loop(mut actor: Actor, mut rx: mpsc::Receiver<SessionMsg>) {
    debug!("session actor started");

    while let Some(msg) = rx.recv().await {
        match msg {
            SessionMsg::Command(SessionCommand::Shutdown) => {
                info!("session orchestrator shutting down");
                break;
            }
            SessionMsg::Command(cmd) => actor.on_command(cmd),
            SessionMsg::ChatDone { outcome } => actor.on_chat_done(outcome),
            SessionMsg::GeocodeDone { place, outcome } => actor.on_geocode_done(place, outcome),
            SessionMsg::WeatherDone { target, outcome } => {
                enrichment::fold_weather_result(&mut actor.state, &actor.bus, target, outcome);
            }
            SessionMsg::RecommendationsDone { outcome, reply } => actor.on_recommendations_done(outcome, reply),
            SessionMsg::FinalizeDone { outcome, reply } => actor.on_finalize_done(outcome, reply),
        }
    }

    if let Some(push) = actor.push.take() {
        push.close();
    }
    debug!("session actor stopped");
}

impl Actor {
    fn on_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SendMessage { text, reply } => self.on_send_message(text, reply),
            SessionCommand::SubmitPreferences { prefs, reply } => self.on_submit_preferences(prefs, reply),
            SessionCommand::FetchRecommendations { reply } => self.on_fetch_recommendations(reply),
            SessionCommand::VoteForTrip { trip_name, reply } => self.on_vote(trip_name, reply),
            SessionCommand::FinalizeTrip { reply } => self.on_finalize(reply),
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot());
            }
            SessionCommand::Shutdown => unreachable!("handled by the actor loop"),
        }
    }

    // === Chat turn ===

    fn on_send_message(&mut self, text: String, reply: oneshot::Sender<Result<(), SessionError>>) {
        if self.phase != TurnPhase::Idle {
            debug!(phase = ?self.phase, "send rejected: turn already in flight");
            let _ = reply.send(Err(SessionError::Busy));
            return;
        }

        // The user turn lands before the network call, whatever its outcome
        self.append_turn(Turn::user(text.clone()));
        self.phase = TurnPhase::Sending;
        self.pending_turn = Some(reply);

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = backend.send_chat(&text).await;
            let _ = tx.send(SessionMsg::ChatDone { outcome }).await;
        });
    }

    fn on_chat_done(&mut self, outcome: Result<ChatReply, ApiError>) {
        if self.phase != TurnPhase::Sending {
            warn!(phase = ?self.phase, "chat result arrived outside a turn; dropped");
            return;
        }

        let reply = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "chat send failed");
                let text = match e {
                    ApiError::Network(_) => CONNECT_ERROR_TEXT,
                    _ => CHAT_ERROR_TEXT,
                };
                self.append_turn(Turn::assistant(text));
                self.finish_turn();
                return;
            }
        };

        let resolution = resolver::plan_resolution(&reply);

        self.append_turn(Turn::assistant(reply.response));
        enrichment::fold_pois(&mut self.state, &self.bus, reply.points_of_interest);
        if let Some(trips) = reply.recommended_trips {
            enrichment::fold_recommendations(&mut self.state, &self.bus, trips);
            self.append_turn(Turn::assistant(RECOMMENDATIONS_ANNOUNCEMENT));
        }

        match resolution {
            Resolution::Immediate(coords) => {
                self.apply_location(coords);
                self.finish_turn();
            }
            Resolution::Lookup(place) => {
                // The geocode lookup holds the turn gate; weather will not
                self.phase = TurnPhase::Enriching;
                let backend = self.backend.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let outcome = backend.geocode(&place).await;
                    let _ = tx.send(SessionMsg::GeocodeDone { place, outcome }).await;
                });
            }
            Resolution::NoLocation => self.finish_turn(),
        }
    }

    fn on_geocode_done(&mut self, place: String, outcome: Result<Coordinates, ApiError>) {
        if self.phase != TurnPhase::Enriching {
            warn!(%place, phase = ?self.phase, "geocode result arrived outside a turn; dropped");
            return;
        }

        match outcome {
            Ok(coords) => {
                info!(%place, %coords, "place resolved");
                self.apply_location(coords);
            }
            Err(e) => {
                // Non-fatal: the turn completes with the previous location
                warn!(%place, error = %e, "geocode failed; location unchanged");
            }
        }
        self.finish_turn();
    }

    /// Fold a resolved location and kick off its weather fetch
    fn apply_location(&mut self, coords: Coordinates) {
        self.state.set_location(coords);
        self.bus.emit(SessionEvent::LocationChanged { location: coords });
        enrichment::spawn_weather_fetch(self.backend.clone(), self.tx.clone(), coords);
    }

    fn finish_turn(&mut self) {
        self.phase = TurnPhase::Idle;
        if let Some(reply) = self.pending_turn.take() {
            let _ = reply.send(Ok(()));
        }
        self.bus.emit(SessionEvent::TurnCompleted);
    }

    fn append_turn(&mut self, turn: Turn) {
        let turn = self.state.append_turn(turn);
        self.bus.emit(SessionEvent::TurnAppended { turn });
    }

    // === Command sagas ===

    fn on_submit_preferences(&mut self, prefs: TripPreferences, reply: oneshot::Sender<Result<(), SessionError>>) {
        let Some(id) = self.identity() else {
            debug!("no session identity; preference submission skipped");
            let _ = reply.send(Ok(()));
            return;
        };

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match backend.submit_preferences(id, &prefs).await {
                Ok(()) => {
                    let _ = reply.send(Ok(()));
                    // Preferences changed what the server would recommend
                    let outcome = backend.fetch_recommendations(id).await;
                    let _ = tx.send(SessionMsg::RecommendationsDone { outcome, reply: None }).await;
                }
                Err(e) => {
                    warn!(error = %e, "preference submission failed");
                    let _ = reply.send(Err(e.into()));
                }
            }
        });
    }

    fn on_fetch_recommendations(&mut self, reply: oneshot::Sender<Result<(), SessionError>>) {
        let Some(id) = self.identity() else {
            debug!("no session identity; recommendations fetch skipped");
            let _ = reply.send(Ok(()));
            return;
        };

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = backend.fetch_recommendations(id).await;
            let _ = tx
                .send(SessionMsg::RecommendationsDone {
                    outcome,
                    reply: Some(reply),
                })
                .await;
        });
    }

    fn on_recommendations_done(
        &mut self,
        outcome: Result<Vec<RecommendedTrip>, ApiError>,
        reply: Option<oneshot::Sender<Result<(), SessionError>>>,
    ) {
        match outcome {
            Ok(trips) => {
                enrichment::fold_recommendations(&mut self.state, &self.bus, trips);
                self.append_turn(Turn::assistant(RECOMMENDATIONS_ANNOUNCEMENT));
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(()));
                }
            }
            Err(e) => {
                // Fail safe to an empty set rather than showing outdated trips
                warn!(error = %e, "recommendations fetch failed; set cleared");
                enrichment::fold_recommendations(&mut self.state, &self.bus, Vec::new());
                if let Some(reply) = reply {
                    let _ = reply.send(Err(e.into()));
                }
            }
        }
    }

    fn on_vote(&mut self, trip_name: String, reply: oneshot::Sender<Result<(), SessionError>>) {
        let Some(id) = self.identity() else {
            debug!(%trip_name, "no session identity; vote skipped");
            let _ = reply.send(Ok(()));
            return;
        };

        // The server owns vote counts; nothing changes locally until the
        // next recommendations fetch
        let backend = self.backend.clone();
        tokio::spawn(async move {
            match backend.vote_for_trip(id, &trip_name).await {
                Ok(()) => {
                    info!(%trip_name, "vote recorded");
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    warn!(%trip_name, error = %e, "vote failed");
                    let _ = reply.send(Err(e.into()));
                }
            }
        });
    }

    fn on_finalize(&mut self, reply: oneshot::Sender<Result<(), SessionError>>) {
        let Some(id) = self.identity() else {
            debug!("no session identity; finalize skipped");
            let _ = reply.send(Ok(()));
            return;
        };

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = backend.finalize_trip(id).await;
            let _ = tx.send(SessionMsg::FinalizeDone { outcome, reply }).await;
        });
    }

    fn on_finalize_done(
        &mut self,
        outcome: Result<FinalizedTrip, ApiError>,
        reply: oneshot::Sender<Result<(), SessionError>>,
    ) {
        match outcome {
            Ok(FinalizedTrip { trip, itinerary }) => {
                self.state.set_itinerary(itinerary);
                self.bus.emit(SessionEvent::ItinerarySet);
                let text = match trip {
                    Some(trip) => format!("Here is the finalized itinerary for '{}':", trip.name),
                    None => "Here is the finalized itinerary:".to_string(),
                };
                self.append_turn(Turn::assistant(text));
            }
            Err(e) => {
                // Finalize failures are surfaced inline, like chat failures
                warn!(error = %e, "finalize failed");
                let text = match &e {
                    ApiError::Service(message) => format!("Error finalizing trip: {}", message),
                    _ => "Error finalizing trip.".to_string(),
                };
                self.append_turn(Turn::assistant(text));
            }
        }
        let _ = reply.send(Ok(()));
    }

    /// Lazily allocated, then stable for the session's lifetime
    fn identity(&mut self) -> Option<SessionId> {
        if self.identity.is_none() {
            if let Some(id) = self.identity_source.allocate() {
                info!(%id, "session identity allocated");
                self.identity = Some(id);
            }
        }
        self.identity
    }
}
