//! Placement session state machine.

use crate::automaton::{TransitionId, TransitionShape};
use crate::input::{Duration, Instant};
use kurbo::Point;
use std::collections::HashSet;

/// Event sources a live session listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    /// Global pointer moves, wherever the pointer is.
    PointerMove,
    /// Pointer presses, seen in the capture phase before any element.
    PointerDownCapture,
    /// Enter and Escape.
    Key,
    /// Tab visibility changes.
    Visibility,
    /// Window focus loss.
    WindowBlur,
}

impl Listener {
    pub const ALL: [Listener; 5] = [
        Listener::PointerMove,
        Listener::PointerDownCapture,
        Listener::Key,
        Listener::Visibility,
        Listener::WindowBlur,
    ];
}

/// What ended a committed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitTrigger {
    PointerDown,
    Enter,
    IdleTimeout,
    MaxTimeout,
    TabHidden,
    WindowBlur,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Committed(CommitTrigger),
    Cancelled,
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Placing,
    Resolved(Resolution),
}

/// One interactive reshape of a transition.
#[derive(Debug, Clone)]
pub struct PlacementSession {
    transition_id: TransitionId,
    original: TransitionShape,
    candidate: Point,
    idle_timeout: Duration,
    idle_deadline: Instant,
    max_deadline: Instant,
    phase: SessionPhase,
    listeners: HashSet<Listener>,
}

impl PlacementSession {
    /// New session in the `Idle` phase, nothing armed yet.
    pub fn new(
        transition_id: impl Into<TransitionId>,
        original: TransitionShape,
        candidate: Point,
        now: Instant,
    ) -> Self {
        Self {
            transition_id: transition_id.into(),
            original,
            candidate,
            idle_timeout: Duration::ZERO,
            idle_deadline: now,
            max_deadline: now,
            phase: SessionPhase::Idle,
            listeners: HashSet::new(),
        }
    }

    /// Move to `Placing`: arm every listener and both deadlines. The max
    /// deadline is never moved again.
    pub fn begin(&mut self, now: Instant, idle_timeout: Duration, max_timeout: Duration) -> bool {
        if self.phase != SessionPhase::Idle {
            return false;
        }
        self.phase = SessionPhase::Placing;
        self.idle_timeout = idle_timeout;
        self.idle_deadline = now + idle_timeout;
        self.max_deadline = now + max_timeout;
        self.listeners.extend(Listener::ALL);
        true
    }

    /// Update the live candidate and push the idle deadline out.
    pub fn update_candidate(&mut self, candidate: Point, now: Instant) -> bool {
        if self.phase != SessionPhase::Placing {
            return false;
        }
        self.candidate = candidate;
        self.idle_deadline = now + self.idle_timeout;
        true
    }

    /// Timeout that has elapsed at `now`, if any. The max timeout wins when
    /// both have.
    pub fn expired(&self, now: Instant) -> Option<CommitTrigger> {
        if self.phase != SessionPhase::Placing {
            return None;
        }
        if now >= self.max_deadline {
            Some(CommitTrigger::MaxTimeout)
        } else if now >= self.idle_deadline {
            Some(CommitTrigger::IdleTimeout)
        } else {
            None
        }
    }

    /// Terminal transition. Disarms everything. Only the first call wins.
    pub fn resolve(&mut self, resolution: Resolution) -> bool {
        if self.phase != SessionPhase::Placing {
            return false;
        }
        self.phase = SessionPhase::Resolved(resolution);
        self.listeners.clear();
        true
    }

    pub fn transition_id(&self) -> &str {
        &self.transition_id
    }

    /// Shape hints as they were before the session started.
    pub fn original(&self) -> TransitionShape {
        self.original
    }

    pub fn candidate(&self) -> Point {
        self.candidate
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_placing(&self) -> bool {
        self.phase == SessionPhase::Placing
    }

    pub fn listens(&self, listener: Listener) -> bool {
        self.listeners.contains(&listener)
    }

    pub fn idle_deadline(&self) -> Instant {
        self.idle_deadline
    }

    pub fn max_deadline(&self) -> Instant {
        self.max_deadline
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.is_placing()
            .then(|| self.idle_deadline.min(self.max_deadline))
    }
}
