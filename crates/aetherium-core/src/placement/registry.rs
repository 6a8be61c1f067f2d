//! Registry of placement sessions, keyed by transition id.

use super::session::{Listener, PlacementSession};
use crate::automaton::TransitionId;
use crate::input::Instant;
use std::collections::HashMap;

/// Holds every placement session by transition id.
///
/// The registry is owned by the placement controller and outlives any visual
/// edge, so a session keeps running while the renderer recreates the edge.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: HashMap<TransitionId, PlacementSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session. Refused while the transition already has a live one.
    pub fn insert(&mut self, session: PlacementSession) -> bool {
        if self.is_live(session.transition_id()) {
            return false;
        }
        self.sessions
            .insert(session.transition_id().to_string(), session);
        true
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PlacementSession> {
        self.sessions.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<PlacementSession> {
        self.sessions.remove(id)
    }

    /// Whether the transition has a session in the `Placing` phase.
    pub fn is_live(&self, id: &str) -> bool {
        self.sessions.get(id).is_some_and(PlacementSession::is_placing)
    }

    /// Ids of live sessions armed for `listener`, sorted for stable dispatch.
    pub fn listening(&self, listener: Listener) -> Vec<TransitionId> {
        let mut ids: Vec<TransitionId> = self
            .sessions
            .values()
            .filter(|s| s.listens(listener))
            .map(|s| s.transition_id().to_string())
            .collect();
        ids.sort();
        ids
    }

    pub fn any_listening(&self, listener: Listener) -> bool {
        self.sessions.values().any(|s| s.listens(listener))
    }

    /// Earliest deadline across live sessions.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sessions
            .values()
            .filter_map(PlacementSession::next_deadline)
            .min()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacementSession> {
        self.sessions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::TransitionShape;
    use crate::input::Duration;
    use kurbo::Point;

    fn live(id: &str, now: Instant) -> PlacementSession {
        let mut session = PlacementSession::new(id, TransitionShape::default(), Point::ZERO, now);
        session.begin(now, Duration::from_secs(5), Duration::from_secs(30));
        session
    }

    #[test]
    fn test_one_live_session_per_transition() {
        let now = Instant::now();
        let mut registry = SessionRegistry::new();

        assert!(registry.insert(live("t1", now)));
        assert!(!registry.insert(live("t1", now)));
        assert!(registry.insert(live("t2", now)));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.listening(Listener::Key), vec!["t1", "t2"]);
    }

    #[test]
    fn test_idle_sessions_are_not_live() {
        let now = Instant::now();
        let mut registry = SessionRegistry::new();
        registry.insert(PlacementSession::new(
            "t1",
            TransitionShape::default(),
            Point::ZERO,
            now,
        ));

        assert!(!registry.is_live("t1"));
        assert!(!registry.any_listening(Listener::PointerMove));
        assert_eq!(registry.next_deadline(), None);
    }
}
