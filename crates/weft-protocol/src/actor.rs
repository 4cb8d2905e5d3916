//! Actor identity for change authorship.

use serde::{Deserialize, Serialize};

/// Opaque identifier for the author of a change.
///
/// Every change carries the id of the actor that produced it, and sequence
/// numbers are contiguous per actor. Ids are caller-supplied strings; the
/// protocol only compares them for equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    /// Create an actor id from a caller-supplied string.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        ActorId(id.into())
    }

    /// Generate a fresh random actor id.
    #[must_use]
    pub fn random() -> Self {
        ActorId(uuid::Uuid::new_v4().to_string())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ActorId {
    #[inline]
    fn from(s: String) -> Self {
        ActorId(s)
    }
}

impl From<&str> for ActorId {
    #[inline]
    fn from(s: &str) -> Self {
        ActorId(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_new() {
        let a = ActorId::new("alice");
        assert_eq!(a.as_str(), "alice");
    }

    #[test]
    fn test_actor_display() {
        let a = ActorId::new("alice");
        assert_eq!(a.to_string(), "alice");
    }

    #[test]
    fn test_actor_from_str() {
        let a: ActorId = "bob".into();
        assert_eq!(a, ActorId::new("bob"));
    }

    #[test]
    fn test_actor_random_unique() {
        assert_ne!(ActorId::random(), ActorId::random());
    }

    #[test]
    fn test_actor_serde_as_string() {
        let a = ActorId::new("alice");
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"alice\"");
        let back: ActorId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_actor_ordering() {
        let mut ids = vec![ActorId::new("carol"), ActorId::new("alice"), ActorId::new("bob")];
        ids.sort();
        assert_eq!(ids[0], ActorId::new("alice"));
        assert_eq!(ids[2], ActorId::new("carol"));
    }
}
