//! Session identity
//!
//! The correlation token that scopes preferences, votes, and finalization to
//! this client session on the server side.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque session correlation token, immutable once allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Where the orchestrator gets its identity from
///
/// `Generate` allocates lazily on the first stateful command and stays
/// stable afterwards. `Disabled` yields no identity, which turns
/// preferences, voting, and finalization into silent no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentitySource {
    #[default]
    Generate,
    Fixed(SessionId),
    Disabled,
}

impl IdentitySource {
    pub(crate) fn allocate(&self) -> Option<SessionId> {
        match self {
            IdentitySource::Generate => Some(SessionId::new()),
            IdentitySource::Fixed(id) => Some(*id),
            IdentitySource::Disabled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_allocates_unique_ids() {
        let a = IdentitySource::Generate.allocate().unwrap();
        let b = IdentitySource::Generate.allocate().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_returns_the_given_id() {
        let id = SessionId::new();
        assert_eq!(IdentitySource::Fixed(id).allocate(), Some(id));
    }

    #[test]
    fn test_disabled_yields_none() {
        assert_eq!(IdentitySource::Disabled.allocate(), None);
    }
}
