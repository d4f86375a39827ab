//! Typed client for the trip-planning backend
//!
//! Wraps the four external capabilities (chat, geocoding, weather, group
//! recommendations/voting/finalize) behind the [`Backend`] trait and
//! normalizes transport and payload failures into [`ApiError`].

pub mod client;
mod error;
mod http;
mod types;

pub use client::Backend;
pub use error::ApiError;
pub use http::HttpBackend;
pub use types::{
    ChatReply, Coordinates, FinalizedTrip, PointOfInterest, RecommendedTrip, TripPreferences, WeatherSnapshot,
};
