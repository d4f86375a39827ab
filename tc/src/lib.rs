//! Tripchat - client-side session orchestrator for a conversational
//! trip-planning assistant
//!
//! A user chats with a backend AI about a trip; the client progressively
//! enriches the conversation with derived context: resolved coordinates,
//! weather, nearby points of interest, group recommendations, votes, and a
//! finalized itinerary. The heart of the crate is the session orchestrator,
//! which owns all session state and folds every asynchronous result into one
//! render-consistent snapshot.
//!
//! # Core Rules
//!
//! - **Single writer**: only the orchestrator actor mutates session state;
//!   collaborators get read-only snapshots and events
//! - **Serialized turns**: one chat turn in flight at a time; concurrent
//!   sends are rejected, not queued
//! - **Tagged enrichment**: weather results carry the coordinates they were
//!   fetched for and are discarded on arrival if the session moved on
//! - **Graceful degradation**: enrichment failures log and keep
//!   last-known-good state; only chat-send and finalize failures surface in
//!   the transcript
//!
//! # Modules
//!
//! - [`api`] - typed backend client (chat, geocode, weather, group planning)
//! - [`session`] - session state, identity, resolution, and the orchestrator
//! - [`events`] - broadcast bus for state-change notifications
//! - [`push`] - lifecycle-managed listener for server push notices
//! - [`repl`] - interactive terminal front-end
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod events;
pub mod push;
pub mod repl;
pub mod session;
