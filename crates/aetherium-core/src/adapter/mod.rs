//! Domain↔visual adapter.
//!
//! [`VisualGraph`] derives the node and edge arrays the renderer consumes from
//! a [`DomainStore`], and writes position and selection edits coming back
//! from the canvas into the store.
//!
//! Derivation is driven by the store's counters:
//! - a new structure generation (state or transition added/removed) rebuilds
//!   both arrays,
//! - a new revision patches the existing records in place,
//! - otherwise nothing is touched.
//!
//! Transient edge overrides (a live placement candidate, a label drag preview)
//! live in an overlay map owned by the graph and are merged onto every freshly
//! derived edge, so unrelated store updates never snap an edge back mid-gesture.

mod elements;

pub use elements::{
    EdgeChange, EdgeData, EdgeOverlay, NodeChange, NodeLabel, RoutedEdge, VisualEdge, VisualNode,
};

use crate::automaton::{DomainStore, StateId, StatePatch, TransitionId};
use crate::placement::SessionRegistry;
use crate::routing::{route_edge, Anchor, EdgeGeometry, Route, RoutingConfig, Side};
use kurbo::{Point, Size};
use std::collections::{HashMap, HashSet};

/// Default node size in canvas units.
pub const DEFAULT_NODE_SIZE: Size = Size::new(140.0, 56.0);

/// What a [`VisualGraph::sync`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    Patched,
    Rebuilt,
}

/// Node and edge arrays derived from the domain model.
#[derive(Debug, Clone)]
pub struct VisualGraph {
    nodes: Vec<VisualNode>,
    edges: Vec<VisualEdge>,
    node_index: HashMap<StateId, usize>,
    edge_index: HashMap<TransitionId, usize>,
    overlays: HashMap<TransitionId, EdgeOverlay>,
    node_size: Size,
    structure_generation: Option<u64>,
    revision: Option<u64>,
}

impl Default for VisualGraph {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_SIZE)
    }
}

impl VisualGraph {
    pub fn new(node_size: Size) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            overlays: HashMap::new(),
            node_size,
            structure_generation: None,
            revision: None,
        }
    }

    pub fn nodes(&self) -> &[VisualNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[VisualEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn edge(&self, id: &str) -> Option<&VisualEdge> {
        self.edge_index.get(id).map(|&i| &self.edges[i])
    }

    pub fn overlay(&self, id: &str) -> Option<&EdgeOverlay> {
        self.overlays.get(id)
    }

    /// Bring the arrays up to date with the store.
    pub fn sync<D: DomainStore>(&mut self, doc: &D, sessions: &SessionRegistry) -> SyncOutcome {
        let generation = doc.structure_generation();
        let revision = doc.revision();
        let pruned = self.prune_overlays(doc, sessions);

        let outcome = if self.structure_generation != Some(generation) {
            self.rebuild(doc);
            SyncOutcome::Rebuilt
        } else if self.revision != Some(revision) {
            self.patch(doc);
            SyncOutcome::Patched
        } else if !pruned.is_empty() {
            for id in &pruned {
                self.refresh_data(id);
            }
            SyncOutcome::Patched
        } else {
            SyncOutcome::Unchanged
        };

        self.structure_generation = Some(generation);
        self.revision = Some(revision);
        outcome
    }

    /// Drop overlays whose transition is gone, and placing overlays whose
    /// session is no longer live.
    fn prune_overlays<D: DomainStore>(
        &mut self,
        doc: &D,
        sessions: &SessionRegistry,
    ) -> Vec<TransitionId> {
        let stale: Vec<TransitionId> = self
            .overlays
            .iter()
            .filter(|(id, overlay)| {
                doc.transition(id).is_none() || (overlay.placing && !sessions.is_live(id))
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            log::debug!("Dropping stale overlay for transition {}", id);
            self.overlays.remove(id);
        }
        stale
    }

    fn rebuild<D: DomainStore>(&mut self, doc: &D) {
        let selected_states: HashSet<&str> =
            doc.selected_states().iter().map(String::as_str).collect();
        let selected_transitions: HashSet<&str> =
            doc.selected_transitions().iter().map(String::as_str).collect();
        let pairs: HashSet<(&str, &str)> = doc
            .transitions()
            .values()
            .map(|t| (t.source.as_str(), t.target.as_str()))
            .collect();

        let node_size = self.node_size;
        let nodes: Vec<VisualNode> = doc
            .states()
            .values()
            .map(|s| VisualNode::from_state(s, node_size, selected_states.contains(s.id.as_str())))
            .collect();

        let overlays = &self.overlays;
        let edges: Vec<VisualEdge> = doc
            .transitions()
            .values()
            .map(|t| {
                let mut edge =
                    VisualEdge::from_transition(t, selected_transitions.contains(t.id.as_str()));
                let sibling =
                    !t.is_self_loop() && pairs.contains(&(t.target.as_str(), t.source.as_str()));
                edge.data = EdgeData::resolve(edge.persisted, overlays.get(&t.id), sibling);
                edge
            })
            .collect();

        self.node_index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self.edge_index = edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        self.nodes = nodes;
        self.edges = edges;
        self.update_edge_sides();

        log::debug!(
            "Rebuilt visual graph: {} nodes, {} edges",
            self.nodes.len(),
            self.edges.len()
        );
    }

    fn patch<D: DomainStore>(&mut self, doc: &D) {
        let selected_states: HashSet<&str> =
            doc.selected_states().iter().map(String::as_str).collect();
        let selected_transitions: HashSet<&str> =
            doc.selected_transitions().iter().map(String::as_str).collect();

        for node in &mut self.nodes {
            if let Some(state) = doc.state(&node.id) {
                node.position = state.position;
                node.label = NodeLabel::from(state);
                node.selected = selected_states.contains(node.id.as_str());
            }
        }

        let overlays = &self.overlays;
        for edge in &mut self.edges {
            if let Some(transition) = doc.transition(&edge.id) {
                edge.label = transition.name.clone();
                edge.persisted = transition.shape();
                edge.selected = selected_transitions.contains(edge.id.as_str());
                edge.data = EdgeData::resolve(
                    edge.persisted,
                    overlays.get(&edge.id),
                    edge.data.has_reverse_sibling,
                );
            }
        }
        self.update_edge_sides();
    }

    /// Recompute approach sides from the current node rectangles.
    fn update_edge_sides(&mut self) {
        let nodes = &self.nodes;
        let index = &self.node_index;
        for edge in &mut self.edges {
            let (Some(&si), Some(&ti)) = (index.get(&edge.source), index.get(&edge.target)) else {
                continue;
            };
            let (source_side, target_side) = if edge.is_self_loop() {
                (Side::Top, Side::Top)
            } else {
                Side::facing(nodes[si].rect(), nodes[ti].rect())
            };
            edge.source_side = source_side;
            edge.target_side = target_side;
        }
    }

    fn refresh_data(&mut self, id: &str) {
        if let Some(&i) = self.edge_index.get(id) {
            let edge = &mut self.edges[i];
            edge.data = EdgeData::resolve(
                edge.persisted,
                self.overlays.get(id),
                edge.data.has_reverse_sibling,
            );
        }
    }

    /// Install a transient override on an edge. Returns false for unknown
    /// edges.
    pub fn set_overlay(&mut self, id: &str, overlay: EdgeOverlay) -> bool {
        if !self.edge_index.contains_key(id) {
            return false;
        }
        self.overlays.insert(id.to_string(), overlay);
        self.refresh_data(id);
        true
    }

    /// Remove a transient override, falling back to the persisted hints.
    pub fn clear_overlay(&mut self, id: &str) -> bool {
        let removed = self.overlays.remove(id).is_some();
        if removed {
            self.refresh_data(id);
        }
        removed
    }

    /// Re-read one transition from the store without a full sync.
    pub fn refresh_edge<D: DomainStore>(&mut self, id: &str, doc: &D) {
        if let (Some(&i), Some(transition)) = (self.edge_index.get(id), doc.transition(id)) {
            let edge = &mut self.edges[i];
            edge.label = transition.name.clone();
            edge.persisted = transition.shape();
            edge.data = EdgeData::resolve(
                edge.persisted,
                self.overlays.get(id),
                edge.data.has_reverse_sibling,
            );
        }
    }

    /// Apply node changes reported by the canvas. Positions are written to the
    /// store immediately; selection changes are collected into one
    /// `set_selected_states` call.
    pub fn apply_node_changes<D: DomainStore>(&mut self, changes: &[NodeChange], doc: &mut D) {
        let mut selection_changed = false;
        let mut moved = false;

        for change in changes {
            match change {
                NodeChange::Position { id, position } => {
                    if let Some(&i) = self.node_index.get(id) {
                        self.nodes[i].position = *position;
                        moved = true;
                    }
                    if let Err(err) = doc.update_state(id, StatePatch::position(*position)) {
                        log::warn!("Failed to write position of state {}: {}", id, err);
                    }
                }
                NodeChange::Select { id, selected } => {
                    if let Some(&i) = self.node_index.get(id) {
                        self.nodes[i].selected = *selected;
                        selection_changed = true;
                    }
                }
            }
        }

        if selection_changed {
            let ids: Vec<StateId> = self
                .nodes
                .iter()
                .filter(|n| n.selected)
                .map(|n| n.id.clone())
                .collect();
            doc.set_selected_states(ids);
        }
        if moved {
            self.update_edge_sides();
        }
    }

    /// Apply edge changes reported by the canvas.
    pub fn apply_edge_changes<D: DomainStore>(&mut self, changes: &[EdgeChange], doc: &mut D) {
        let mut selection_changed = false;
        for change in changes {
            match change {
                EdgeChange::Select { id, selected } => {
                    if let Some(&i) = self.edge_index.get(id) {
                        self.edges[i].selected = *selected;
                        selection_changed = true;
                    }
                }
            }
        }
        if selection_changed {
            let ids: Vec<TransitionId> = self
                .edges
                .iter()
                .filter(|e| e.selected)
                .map(|e| e.id.clone())
                .collect();
            doc.set_selected_transitions(ids);
        }
    }

    /// Routing input for one edge, with any overlay applied.
    pub fn edge_geometry(&self, id: &str) -> Option<EdgeGeometry> {
        let edge = self.edge(id)?;
        let source = self.node(&edge.source)?;
        let target = self.node(&edge.target)?;
        Some(EdgeGeometry {
            source_id: edge.source.clone(),
            target_id: edge.target.clone(),
            source: Anchor::on(source.rect(), edge.source_side),
            target: Anchor::on(target.rect(), edge.target_side),
            control_point: edge.data.control_point,
            path_offset: edge.data.path_offset,
            has_reverse_sibling: edge.data.has_reverse_sibling,
        })
    }

    pub fn route_of(&self, id: &str, config: &RoutingConfig) -> Option<Route> {
        self.edge_geometry(id).map(|g| route_edge(&g, config))
    }

    /// Route every edge.
    pub fn routed_edges(&self, config: &RoutingConfig) -> Vec<RoutedEdge> {
        self.edges
            .iter()
            .filter_map(|edge| {
                let route = self.route_of(&edge.id, config)?;
                Some(RoutedEdge {
                    id: edge.id.clone(),
                    route,
                    label: edge.label.clone(),
                    selected: edge.selected,
                    placing: edge.data.placing,
                })
            })
            .collect()
    }

    /// Topmost node containing `point`.
    pub fn node_at(&self, point: Point) -> Option<&VisualNode> {
        self.nodes.iter().rev().find(|n| n.rect().contains(point))
    }

    /// Edge whose label anchor is closest to `point`, within `radius`.
    pub fn label_at(
        &self,
        point: Point,
        radius: f64,
        config: &RoutingConfig,
    ) -> Option<TransitionId> {
        self.routed_edges(config)
            .into_iter()
            .map(|e| ((e.route.label - point).hypot(), e.id))
            .filter(|(distance, _)| *distance <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{
        Automaton, State, Transition, TransitionPatch, TransitionShape,
    };
    use crate::routing::{RouteKind, ShapeHint};

    fn scenario() -> Automaton {
        let mut automaton = Automaton::new("Scenario");
        automaton
            .add_state(State::with_id("s1", "Idle", Point::new(0.0, 0.0)))
            .unwrap();
        automaton
            .add_state(State::with_id("s2", "Active", Point::new(400.0, 0.0)))
            .unwrap();
        automaton
            .add_transition(Transition::with_id("t1", "s1", "s2"))
            .unwrap();
        automaton
            .add_transition(Transition::with_id("t2", "s2", "s1"))
            .unwrap();
        automaton
    }

    fn synced(automaton: &Automaton) -> VisualGraph {
        let mut graph = VisualGraph::default();
        assert_eq!(
            graph.sync(automaton, &SessionRegistry::new()),
            SyncOutcome::Rebuilt
        );
        graph
    }

    #[test]
    fn test_derives_nodes_and_edges() {
        let automaton = scenario();
        let graph = synced(&automaton);

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.edges().len(), 2);
        let node = graph.node("s1").unwrap();
        assert_eq!(node.label.name, "Idle");
        assert_eq!(node.rect().size(), DEFAULT_NODE_SIZE);

        let t1 = graph.edge("t1").unwrap();
        assert!(t1.data.has_reverse_sibling);
        assert_eq!((t1.source_side, t1.target_side), (Side::Right, Side::Left));
        let t2 = graph.edge("t2").unwrap();
        assert_eq!((t2.source_side, t2.target_side), (Side::Left, Side::Right));
    }

    #[test]
    fn test_scenario_offsets() {
        let automaton = scenario();
        let graph = synced(&automaton);
        let config = RoutingConfig::default();

        let g1 = graph.edge_geometry("t1").unwrap();
        let g2 = graph.edge_geometry("t2").unwrap();
        assert!(matches!(
            g1.hint(&config),
            ShapeHint::Separation { offset, .. } if offset == 45.0
        ));
        assert!(matches!(
            g2.hint(&config),
            ShapeHint::Separation { offset, .. } if offset == -45.0
        ));

        let r1 = graph.route_of("t1", &config).unwrap();
        let r2 = graph.route_of("t2", &config).unwrap();
        assert_eq!(r1.kind, RouteKind::Separated);
        let chord_y = graph.node("s1").unwrap().rect().center().y;
        assert!((r1.label.y - chord_y) * (r2.label.y - chord_y) < 0.0);
    }

    #[test]
    fn test_sync_counters() {
        let mut automaton = scenario();
        let sessions = SessionRegistry::new();
        let mut graph = synced(&automaton);

        assert_eq!(graph.sync(&automaton, &sessions), SyncOutcome::Unchanged);

        automaton
            .update_transition("t1", TransitionPatch::shape(TransitionShape::offset(20.0)))
            .unwrap();
        assert_eq!(graph.sync(&automaton, &sessions), SyncOutcome::Patched);
        assert_eq!(graph.edge("t1").unwrap().data.path_offset, Some(20.0));

        automaton.remove_transition("t2").unwrap();
        assert_eq!(graph.sync(&automaton, &sessions), SyncOutcome::Rebuilt);
        assert!(graph.edge("t2").is_none());
        assert!(!graph.edge("t1").unwrap().data.has_reverse_sibling);
    }

    #[test]
    fn test_overlay_survives_rebuild() {
        let mut automaton = scenario();
        let sessions = SessionRegistry::new();
        let mut graph = synced(&automaton);

        assert!(graph.set_overlay("t1", EdgeOverlay::dragging(70.0)));
        automaton
            .add_state(State::with_id("s3", "Other", Point::new(0.0, 300.0)))
            .unwrap();
        assert_eq!(graph.sync(&automaton, &sessions), SyncOutcome::Rebuilt);

        let data = graph.edge("t1").unwrap().data;
        assert_eq!(data.path_offset, Some(70.0));
        assert!(!data.placing);
    }

    #[test]
    fn test_placing_overlay_without_session_is_dropped() {
        let automaton = scenario();
        let mut graph = synced(&automaton);

        graph.set_overlay("t1", EdgeOverlay::placing(Point::new(5.0, 5.0)));
        assert!(graph.edge("t1").unwrap().data.placing);

        assert_eq!(
            graph.sync(&automaton, &SessionRegistry::new()),
            SyncOutcome::Patched
        );
        let data = graph.edge("t1").unwrap().data;
        assert!(!data.placing);
        assert_eq!(data.control_point, None);
    }

    #[test]
    fn test_overlay_on_unknown_edge_rejected() {
        let automaton = scenario();
        let mut graph = synced(&automaton);
        assert!(!graph.set_overlay("nope", EdgeOverlay::dragging(1.0)));
        assert!(!graph.clear_overlay("t1"));
    }

    #[test]
    fn test_position_change_writes_through() {
        let mut automaton = scenario();
        let mut graph = synced(&automaton);

        graph.apply_node_changes(
            &[NodeChange::Position {
                id: "s2".to_string(),
                position: Point::new(0.0, 400.0),
            }],
            &mut automaton,
        );

        assert_eq!(
            automaton.state("s2").unwrap().position,
            Point::new(0.0, 400.0)
        );
        // Sides follow the node immediately
        let t1 = graph.edge("t1").unwrap();
        assert_eq!((t1.source_side, t1.target_side), (Side::Bottom, Side::Top));
    }

    #[test]
    fn test_selection_accumulates() {
        let mut automaton = scenario();
        let mut graph = synced(&automaton);

        graph.apply_node_changes(
            &[NodeChange::Select {
                id: "s1".to_string(),
                selected: true,
            }],
            &mut automaton,
        );
        graph.apply_node_changes(
            &[NodeChange::Select {
                id: "s2".to_string(),
                selected: true,
            }],
            &mut automaton,
        );
        assert_eq!(automaton.selected_states(), ["s1", "s2"]);

        graph.apply_node_changes(
            &[NodeChange::Select {
                id: "s1".to_string(),
                selected: false,
            }],
            &mut automaton,
        );
        assert_eq!(automaton.selected_states(), ["s2"]);

        graph.apply_edge_changes(
            &[EdgeChange::Select {
                id: "t2".to_string(),
                selected: true,
            }],
            &mut automaton,
        );
        assert_eq!(automaton.selected_transitions(), ["t2"]);
    }

    #[test]
    fn test_hit_testing() {
        let automaton = scenario();
        let graph = synced(&automaton);
        let config = RoutingConfig::default();

        assert_eq!(graph.node_at(Point::new(10.0, 10.0)).unwrap().id, "s1");
        assert!(graph.node_at(Point::new(250.0, 300.0)).is_none());

        let label = graph.route_of("t2", &config).unwrap().label;
        assert_eq!(
            graph.label_at(label + kurbo::Vec2::new(2.0, 0.0), 10.0, &config),
            Some("t2".to_string())
        );
        assert_eq!(graph.label_at(Point::new(-500.0, -500.0), 10.0, &config), None);
    }
}
