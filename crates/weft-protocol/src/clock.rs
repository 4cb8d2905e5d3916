//! Vector clocks summarizing how much of each actor's history is known.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;

/// Highest applied sequence number per actor.
///
/// A clock describes a causally closed prefix of history: "everything actor
/// `a` produced up to and including seq `n`". Absent actors are at zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock(BTreeMap<ActorId, u64>);

impl Clock {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Clock(BTreeMap::new())
    }

    /// The highest known sequence number for `actor`, zero if unknown.
    #[inline]
    #[must_use]
    pub fn get(&self, actor: &ActorId) -> u64 {
        self.0.get(actor).copied().unwrap_or(0)
    }

    /// Record that `actor` has reached `seq`. Keeps the maximum.
    pub fn observe(&mut self, actor: &ActorId, seq: u64) {
        let entry = self.0.entry(actor.clone()).or_insert(0);
        if seq > *entry {
            *entry = seq;
        }
    }

    /// Whether `(actor, seq)` falls inside the prefix this clock describes.
    #[inline]
    #[must_use]
    pub fn covers(&self, actor: &ActorId, seq: u64) -> bool {
        seq <= self.get(actor)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate `(actor, seq)` entries in actor order.
    pub fn iter(&self) -> impl Iterator<Item = (&ActorId, u64)> {
        self.0.iter().map(|(actor, seq)| (actor, *seq))
    }
}

impl FromIterator<(ActorId, u64)> for Clock {
    fn from_iter<I: IntoIterator<Item = (ActorId, u64)>>(iter: I) -> Self {
        Clock(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_clock_is_zero() {
        let clock = Clock::new();
        assert_eq!(clock.get(&ActorId::new("alice")), 0);
        assert!(clock.is_empty());
    }

    #[test]
    fn test_observe_keeps_max() {
        let alice = ActorId::new("alice");
        let mut clock = Clock::new();
        clock.observe(&alice, 3);
        clock.observe(&alice, 1);
        assert_eq!(clock.get(&alice), 3);
        clock.observe(&alice, 7);
        assert_eq!(clock.get(&alice), 7);
    }

    #[test]
    fn test_covers() {
        let alice = ActorId::new("alice");
        let bob = ActorId::new("bob");
        let clock: Clock = [(alice.clone(), 2)].into_iter().collect();
        assert!(clock.covers(&alice, 1));
        assert!(clock.covers(&alice, 2));
        assert!(!clock.covers(&alice, 3));
        assert!(!clock.covers(&bob, 1));
    }

    #[test]
    fn test_iter_in_actor_order() {
        let clock: Clock = [
            (ActorId::new("carol"), 1),
            (ActorId::new("alice"), 4),
            (ActorId::new("bob"), 2),
        ]
        .into_iter()
        .collect();
        let actors: Vec<&str> = clock.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(actors, vec!["alice", "bob", "carol"]);
        assert_eq!(clock.len(), 3);
    }

    #[test]
    fn test_serde_round_trip() {
        let clock: Clock = [(ActorId::new("alice"), 4), (ActorId::new("bob"), 2)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&clock).unwrap();
        assert_eq!(json, r#"{"alice":4,"bob":2}"#);
        let back: Clock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, clock);
    }
}
