//! Interactive reshaping of transitions.
//!
//! A placement session lets the user bend a transition through a point that
//! follows the pointer. It runs until one of:
//! - a pointer press anywhere (captured before any element sees it),
//! - Enter, or Escape to cancel,
//! - the tab going hidden or the window losing focus,
//! - the idle timeout (re-armed by every pointer move) or the fixed max timeout.
//!
//! Timeouts are deadlines checked against the `now` handed to every entry
//! point, so the host decides how often to call [`PlacementController::tick`].

mod label_drag;
mod registry;
mod session;

pub use label_drag::{LabelDrag, LabelDragController, LabelPress};
pub use registry::SessionRegistry;
pub use session::{CommitTrigger, Listener, PlacementSession, Resolution, SessionPhase};

use crate::adapter::{EdgeOverlay, VisualGraph};
use crate::automaton::{DomainStore, TransitionId, TransitionPatch, TransitionShape};
use crate::camera::CoordinateSpace;
use crate::input::{Duration, Instant, Key};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Placement timeouts, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub idle_timeout_ms: u64,
    pub max_timeout_ms: u64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 5_000,
            max_timeout_ms: 30_000,
        }
    }
}

impl PlacementConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn max_timeout(&self) -> Duration {
        Duration::from_millis(self.max_timeout_ms)
    }
}

/// Drives placement sessions and writes their outcome to the store.
#[derive(Debug, Clone, Default)]
pub struct PlacementController {
    registry: SessionRegistry,
    config: PlacementConfig,
}

impl PlacementController {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> PlacementConfig {
        self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn is_placing(&self, id: &str) -> bool {
        self.registry.is_live(id)
    }

    /// Whether any live session is armed for `listener`.
    pub fn listens(&self, listener: Listener) -> bool {
        self.registry.any_listening(listener)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.registry.next_deadline()
    }

    /// Begin reshaping a transition. Returns false for unknown transitions,
    /// self-loops, or a transition that is already being placed.
    pub fn start_placing<D, C>(
        &mut self,
        id: &str,
        pointer: Point,
        coords: &C,
        doc: &D,
        graph: &mut VisualGraph,
        now: Instant,
    ) -> bool
    where
        D: DomainStore,
        C: CoordinateSpace,
    {
        let Some(transition) = doc.transition(id) else {
            log::debug!("Ignoring placement of unknown transition {}", id);
            return false;
        };
        if transition.is_self_loop() || self.registry.is_live(id) {
            return false;
        }

        let candidate = coords.screen_to_canvas(pointer);
        let mut session = PlacementSession::new(id, transition.shape(), candidate, now);
        session.begin(now, self.config.idle_timeout(), self.config.max_timeout());
        if !self.registry.insert(session) {
            return false;
        }
        graph.set_overlay(id, EdgeOverlay::placing(candidate));
        log::debug!("Placement started for transition {}", id);
        true
    }

    /// Follow the pointer with every live session. Sessions whose deadline
    /// has already passed are committed first and do not move.
    pub fn pointer_move<D, C>(
        &mut self,
        pointer: Point,
        coords: &C,
        doc: &mut D,
        graph: &mut VisualGraph,
        now: Instant,
    ) -> bool
    where
        D: DomainStore,
        C: CoordinateSpace,
    {
        self.tick(now, doc, graph);

        let candidate = coords.screen_to_canvas(pointer);
        let ids = self.registry.listening(Listener::PointerMove);
        for id in &ids {
            let moved = self
                .registry
                .get_mut(id)
                .is_some_and(|session| session.update_candidate(candidate, now));
            if moved {
                graph.set_overlay(id, EdgeOverlay::placing(candidate));
            }
        }
        !ids.is_empty()
    }

    /// Capture-phase pointer press: commits every live session. Returns true
    /// when the press was consumed.
    pub fn pointer_down_capture<D: DomainStore>(
        &mut self,
        doc: &mut D,
        graph: &mut VisualGraph,
    ) -> bool {
        self.commit_listening(Listener::PointerDownCapture, CommitTrigger::PointerDown, doc, graph)
    }

    /// Enter commits, Escape cancels. Returns true when a session handled
    /// the key.
    pub fn key<D: DomainStore>(&mut self, key: Key, doc: &mut D, graph: &mut VisualGraph) -> bool {
        match key {
            Key::Enter => self.commit_listening(Listener::Key, CommitTrigger::Enter, doc, graph),
            Key::Escape => {
                let ids = self.registry.listening(Listener::Key);
                ids.iter()
                    .fold(false, |handled, id| self.cancel(id, doc, graph) || handled)
            }
            _ => false,
        }
    }

    pub fn visibility_changed<D: DomainStore>(
        &mut self,
        hidden: bool,
        doc: &mut D,
        graph: &mut VisualGraph,
    ) -> bool {
        hidden && self.commit_listening(Listener::Visibility, CommitTrigger::TabHidden, doc, graph)
    }

    pub fn window_blur<D: DomainStore>(&mut self, doc: &mut D, graph: &mut VisualGraph) -> bool {
        self.commit_listening(Listener::WindowBlur, CommitTrigger::WindowBlur, doc, graph)
    }

    /// Commit every session whose idle or max deadline has passed.
    pub fn tick<D: DomainStore>(
        &mut self,
        now: Instant,
        doc: &mut D,
        graph: &mut VisualGraph,
    ) -> Vec<(TransitionId, CommitTrigger)> {
        let mut expired: Vec<(TransitionId, CommitTrigger)> = self
            .registry
            .iter()
            .filter_map(|s| s.expired(now).map(|t| (s.transition_id().to_string(), t)))
            .collect();
        expired.sort_by(|a, b| a.0.cmp(&b.0));
        expired.retain(|(id, trigger)| self.commit(id, *trigger, doc, graph));
        expired
    }

    /// Persist the candidate as the transition's control point.
    pub fn commit<D: DomainStore>(
        &mut self,
        id: &str,
        trigger: CommitTrigger,
        doc: &mut D,
        graph: &mut VisualGraph,
    ) -> bool {
        self.resolve(id, Resolution::Committed(trigger), doc, graph)
    }

    /// Restore the shape the transition had before the session started.
    pub fn cancel<D: DomainStore>(
        &mut self,
        id: &str,
        doc: &mut D,
        graph: &mut VisualGraph,
    ) -> bool {
        self.resolve(id, Resolution::Cancelled, doc, graph)
    }

    fn commit_listening<D: DomainStore>(
        &mut self,
        listener: Listener,
        trigger: CommitTrigger,
        doc: &mut D,
        graph: &mut VisualGraph,
    ) -> bool {
        let ids = self.registry.listening(listener);
        ids.iter()
            .fold(false, |handled, id| self.commit(id, trigger, doc, graph) || handled)
    }

    fn resolve<D: DomainStore>(
        &mut self,
        id: &str,
        resolution: Resolution,
        doc: &mut D,
        graph: &mut VisualGraph,
    ) -> bool {
        let Some(session) = self.registry.get_mut(id) else {
            return false;
        };
        if !session.resolve(resolution) {
            return false;
        }
        let Some(session) = self.registry.remove(id) else {
            return false;
        };

        let shape = match resolution {
            Resolution::Committed(_) => Some(TransitionShape::control_point(session.candidate())),
            Resolution::Cancelled => {
                let current = doc.transition(id).map(|t| t.shape());
                (current != Some(session.original())).then(|| session.original())
            }
        };
        if let Some(shape) = shape {
            if let Err(err) = doc.update_transition(id, TransitionPatch::shape(shape)) {
                log::warn!("Failed to write placement result for {}: {}", id, err);
            }
        }

        graph.clear_overlay(id);
        graph.refresh_edge(id, doc);
        log::debug!("Placement of transition {} resolved: {:?}", id, resolution);
        true
    }
}
