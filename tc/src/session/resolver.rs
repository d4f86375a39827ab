//! Location resolution for chat replies
//!
//! A reply may carry explicit coordinates, a place name, or neither.
//! Priority order, first match wins: well-formed coordinates resolve
//! immediately with no network call; otherwise a non-empty place name needs
//! one geocode lookup; otherwise nothing to resolve. The orchestrator
//! serializes turns, so at most one lookup is ever in flight.

use tracing::debug;

use crate::api::{ChatReply, Coordinates};

/// What the current chat reply requires to resolve its location
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The reply carried a well-formed coordinate pair
    Immediate(Coordinates),
    /// The reply carried only a place name; one geocode call is needed
    Lookup(String),
    /// Nothing to resolve; the location stays as it was
    NoLocation,
}

/// Decide the resolution path for a chat reply
pub fn plan_resolution(reply: &ChatReply) -> Resolution {
    if let Some(coords) = well_formed_pair(reply.location_coords.as_deref()) {
        debug!(%coords, "plan_resolution: explicit coordinates");
        return Resolution::Immediate(coords);
    }

    match reply.location.as_deref().map(str::trim) {
        Some(place) if !place.is_empty() => {
            debug!(%place, "plan_resolution: geocode lookup needed");
            Resolution::Lookup(place.to_string())
        }
        _ => {
            debug!("plan_resolution: no location in reply");
            Resolution::NoLocation
        }
    }
}

/// A wire pair is usable only as exactly two finite numbers
fn well_formed_pair(pair: Option<&[f64]>) -> Option<Coordinates> {
    match pair {
        Some(&[latitude, longitude]) => {
            let coords = Coordinates::new(latitude, longitude);
            coords.is_well_formed().then_some(coords)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(coords: Option<Vec<f64>>, location: Option<&str>) -> ChatReply {
        ChatReply {
            location_coords: coords,
            location: location.map(str::to_string),
            ..ChatReply::text("ok")
        }
    }

    #[test]
    fn test_coordinates_win_over_place_name() {
        let resolution = plan_resolution(&reply(Some(vec![48.8566, 2.3522]), Some("Paris")));
        assert_eq!(resolution, Resolution::Immediate(Coordinates::new(48.8566, 2.3522)));
    }

    #[test]
    fn test_place_name_falls_back_to_lookup() {
        let resolution = plan_resolution(&reply(None, Some("Paris")));
        assert_eq!(resolution, Resolution::Lookup("Paris".to_string()));
    }

    #[test]
    fn test_malformed_pair_falls_back_to_place_name() {
        // Wrong arity
        let resolution = plan_resolution(&reply(Some(vec![48.8566]), Some("Paris")));
        assert_eq!(resolution, Resolution::Lookup("Paris".to_string()));

        // Non-finite component
        let resolution = plan_resolution(&reply(Some(vec![f64::NAN, 2.3522]), Some("Paris")));
        assert_eq!(resolution, Resolution::Lookup("Paris".to_string()));
    }

    #[test]
    fn test_blank_place_name_resolves_nothing() {
        assert_eq!(plan_resolution(&reply(None, Some("   "))), Resolution::NoLocation);
        assert_eq!(plan_resolution(&reply(None, None)), Resolution::NoLocation);
    }
}
