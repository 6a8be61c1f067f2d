//! Node and edge records handed to the renderer.

use crate::automaton::{State, StateId, Transition, TransitionId, TransitionShape};
use crate::routing::{Route, Side};
use kurbo::{Point, Rect, Size};

/// Display payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLabel {
    pub name: String,
    pub composite: bool,
    pub inputs: usize,
    pub outputs: usize,
    pub variables: usize,
}

impl From<&State> for NodeLabel {
    fn from(state: &State) -> Self {
        Self {
            name: state.name.clone(),
            composite: state.composite,
            inputs: state.inputs.len(),
            outputs: state.outputs.len(),
            variables: state.variables.len(),
        }
    }
}

/// A state as seen by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    pub id: StateId,
    /// Top-left corner in canvas coordinates.
    pub position: Point,
    pub size: Size,
    pub label: NodeLabel,
    pub selected: bool,
}

impl VisualNode {
    pub(crate) fn from_state(state: &State, size: Size, selected: bool) -> Self {
        Self {
            id: state.id.clone(),
            position: state.position,
            size,
            label: NodeLabel::from(state),
            selected,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }
}

/// Transient overrides for an edge while a gesture is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeOverlay {
    /// Set only while a placement session is live.
    pub placing: bool,
    pub control_point: Option<Point>,
    pub path_offset: Option<f64>,
}

impl EdgeOverlay {
    /// Overlay for a placement session candidate.
    pub fn placing(candidate: Point) -> Self {
        Self {
            placing: true,
            control_point: Some(candidate),
            path_offset: None,
        }
    }

    /// Overlay for a label drag preview.
    pub fn dragging(offset: f64) -> Self {
        Self {
            placing: false,
            control_point: None,
            path_offset: Some(offset),
        }
    }
}

/// Path-relevant data bag of an edge: the shape hints in effect plus
/// transient flags.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeData {
    pub path_offset: Option<f64>,
    pub control_point: Option<Point>,
    pub placing: bool,
    pub has_reverse_sibling: bool,
}

impl EdgeData {
    pub(crate) fn resolve(
        persisted: TransitionShape,
        overlay: Option<&EdgeOverlay>,
        has_reverse_sibling: bool,
    ) -> Self {
        match overlay {
            Some(overlay) => Self {
                path_offset: overlay.path_offset,
                control_point: overlay.control_point,
                placing: overlay.placing,
                has_reverse_sibling,
            },
            None => Self {
                path_offset: persisted.path_offset,
                control_point: persisted.control_point,
                placing: false,
                has_reverse_sibling,
            },
        }
    }
}

/// A transition as seen by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEdge {
    pub id: TransitionId,
    pub source: StateId,
    pub target: StateId,
    pub source_side: Side,
    pub target_side: Side,
    pub label: String,
    pub data: EdgeData,
    pub selected: bool,
    /// Domain-backed hints, kept so an overlay can be dropped without a
    /// round-trip through the store.
    pub(crate) persisted: TransitionShape,
}

impl VisualEdge {
    pub(crate) fn from_transition(transition: &Transition, selected: bool) -> Self {
        Self {
            id: transition.id.clone(),
            source: transition.source.clone(),
            target: transition.target.clone(),
            source_side: Side::Right,
            target_side: Side::Left,
            label: transition.name.clone(),
            data: EdgeData::default(),
            selected,
            persisted: transition.shape(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Edge plus its computed route, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedEdge {
    pub id: TransitionId,
    pub route: Route,
    pub label: String,
    pub selected: bool,
    pub placing: bool,
}

/// Change reported by the renderer for a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    Position { id: StateId, position: Point },
    Select { id: StateId, selected: bool },
}

/// Change reported by the renderer for an edge.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeChange {
    Select { id: TransitionId, selected: bool },
}
