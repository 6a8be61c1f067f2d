//! Dragging a transition label sideways to set its path offset.
//!
//! A quick second press on the same label starts a placement session instead.

use super::PlacementController;
use crate::adapter::{EdgeOverlay, VisualGraph};
use crate::automaton::{DomainStore, TransitionId, TransitionPatch, TransitionShape};
use crate::camera::CoordinateSpace;
use crate::input::{DoubleClickConfig, DoubleClickDetector, Instant, Key};
use crate::routing::{chord_normal, RoutingConfig};
use kurbo::{Point, Vec2};

/// What a press on a label turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPress {
    DragStarted,
    PlacementStarted,
    Ignored,
}

/// An in-flight label drag.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDrag {
    pub transition_id: TransitionId,
    /// Pointer position at press time, canvas coordinates.
    pub start_pointer: Point,
    /// Effective offset at press time.
    pub start_offset: f64,
    /// Unit normal of the chord at press time.
    pub normal: Vec2,
    pub offset: f64,
}

#[derive(Debug, Clone)]
pub struct LabelDragController {
    drag: Option<LabelDrag>,
    clicks: DoubleClickDetector,
    last_pressed: Option<TransitionId>,
}

impl Default for LabelDragController {
    fn default() -> Self {
        Self::new(DoubleClickConfig::default())
    }
}

impl LabelDragController {
    pub fn new(double_click: DoubleClickConfig) -> Self {
        Self {
            drag: None,
            clicks: DoubleClickDetector::new(double_click),
            last_pressed: None,
        }
    }

    pub fn drag(&self) -> Option<&LabelDrag> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Press on the label of `id`.
    #[allow(clippy::too_many_arguments)]
    pub fn mouse_down<D, C>(
        &mut self,
        id: &str,
        pointer: Point,
        coords: &C,
        doc: &D,
        graph: &mut VisualGraph,
        placement: &mut PlacementController,
        routing: &RoutingConfig,
        now: Instant,
    ) -> LabelPress
    where
        D: DomainStore,
        C: CoordinateSpace,
    {
        let Some(edge) = graph.edge(id) else {
            return LabelPress::Ignored;
        };
        if edge.is_self_loop() {
            return LabelPress::Ignored;
        }

        let same_label = self.last_pressed.as_deref() == Some(id);
        let double = self.clicks.register(pointer, now) && same_label;
        self.last_pressed = Some(id.to_string());

        if double {
            self.abort(graph);
            self.last_pressed = None;
            return if placement.start_placing(id, pointer, coords, doc, graph, now) {
                LabelPress::PlacementStarted
            } else {
                LabelPress::Ignored
            };
        }

        let (Some(route), Some(geometry)) = (graph.route_of(id, routing), graph.edge_geometry(id))
        else {
            return LabelPress::Ignored;
        };
        let Some(normal) = chord_normal(geometry.source.point, geometry.target.point) else {
            return LabelPress::Ignored;
        };

        self.abort(graph);
        self.drag = Some(LabelDrag {
            transition_id: id.to_string(),
            start_pointer: coords.screen_to_canvas(pointer),
            start_offset: route.normal_offset,
            normal,
            offset: route.normal_offset,
        });
        LabelPress::DragStarted
    }

    /// Project the pointer onto the chord normal and preview the new offset.
    pub fn mouse_move<C: CoordinateSpace>(
        &mut self,
        pointer: Point,
        coords: &C,
        graph: &mut VisualGraph,
    ) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let delta = coords.screen_to_canvas(pointer) - drag.start_pointer;
        drag.offset = drag.start_offset + delta.dot(drag.normal);
        graph.set_overlay(&drag.transition_id, EdgeOverlay::dragging(drag.offset))
    }

    /// Finish the drag, writing the offset unless it did not change.
    pub fn mouse_up<D: DomainStore>(&mut self, doc: &mut D, graph: &mut VisualGraph) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let id = drag.transition_id.as_str();
        let changed = (drag.offset - drag.start_offset).abs() > f64::EPSILON;
        if changed {
            let patch = TransitionPatch::shape(TransitionShape::offset(drag.offset));
            if let Err(err) = doc.update_transition(id, patch) {
                log::warn!("Failed to write label offset for {}: {}", id, err);
            } else {
                log::debug!("Transition {} offset set to {:.1}", id, drag.offset);
            }
        }
        graph.clear_overlay(id);
        graph.refresh_edge(id, doc);
        changed
    }

    /// Enter finishes the drag, Escape drops it.
    pub fn key<D: DomainStore>(&mut self, key: Key, doc: &mut D, graph: &mut VisualGraph) -> bool {
        match key {
            Key::Enter if self.is_dragging() => {
                self.mouse_up(doc, graph);
                true
            }
            Key::Escape => self.abort(graph),
            _ => false,
        }
    }

    /// Drop the drag and its preview without touching the store.
    pub fn abort(&mut self, graph: &mut VisualGraph) -> bool {
        match self.drag.take() {
            Some(drag) => {
                graph.clear_overlay(&drag.transition_id);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{Automaton, State, Transition};
    use crate::camera::Camera;
    use crate::input::Duration;
    use crate::placement::SessionRegistry;

    struct Fixture {
        automaton: Automaton,
        graph: VisualGraph,
        placement: PlacementController,
        drags: LabelDragController,
        camera: Camera,
        routing: RoutingConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let mut automaton = Automaton::new("Drag");
            automaton
                .add_state(State::with_id("s1", "A", Point::new(0.0, 0.0)))
                .unwrap();
            automaton
                .add_state(State::with_id("s2", "B", Point::new(400.0, 0.0)))
                .unwrap();
            automaton
                .add_transition(Transition::with_id("t1", "s1", "s2"))
                .unwrap();
            automaton
                .add_transition(Transition::with_id("loop", "s2", "s2"))
                .unwrap();
            let mut graph = VisualGraph::default();
            graph.sync(&automaton, &SessionRegistry::new());
            Self {
                automaton,
                graph,
                placement: PlacementController::default(),
                drags: LabelDragController::default(),
                camera: Camera::new(),
                routing: RoutingConfig::default(),
            }
        }

        fn press(&mut self, id: &str, pointer: Point, now: Instant) -> LabelPress {
            self.drags.mouse_down(
                id,
                pointer,
                &self.camera,
                &self.automaton,
                &mut self.graph,
                &mut self.placement,
                &self.routing,
                now,
            )
        }
    }

    #[test]
    fn test_drag_commits_offset() {
        let mut f = Fixture::new();
        let now = Instant::now();

        assert_eq!(f.press("t1", Point::new(270.0, 28.0), now), LabelPress::DragStarted);
        // Chord runs left to right, so its normal points down the screen
        assert!(f.drags.mouse_move(Point::new(270.0, 68.0), &f.camera, &mut f.graph));

        let data = f.graph.edge("t1").unwrap().data;
        assert_eq!(data.path_offset, Some(40.0));
        assert_eq!(f.automaton.transition("t1").unwrap().path_offset, None);

        assert!(f.drags.mouse_up(&mut f.automaton, &mut f.graph));
        let t1 = f.automaton.transition("t1").unwrap();
        assert_eq!(t1.path_offset, Some(40.0));
        assert_eq!(t1.control_point, None);
        assert!(f.graph.overlay("t1").is_none());
        assert_eq!(f.graph.edge("t1").unwrap().data.path_offset, Some(40.0));
    }

    #[test]
    fn test_drag_starts_from_current_offset() {
        let mut f = Fixture::new();
        f.automaton
            .update_transition("t1", TransitionPatch::shape(TransitionShape::offset(-20.0)))
            .unwrap();
        f.graph.sync(&f.automaton, f.placement.registry());

        f.press("t1", Point::new(270.0, 8.0), Instant::now());
        assert_eq!(f.drags.drag().unwrap().start_offset, -20.0);
        f.drags.mouse_move(Point::new(270.0, 18.0), &f.camera, &mut f.graph);
        assert_eq!(f.drags.drag().unwrap().offset, -10.0);
    }

    #[test]
    fn test_click_without_move_writes_nothing() {
        let mut f = Fixture::new();
        let revision = f.automaton.revision();

        f.press("t1", Point::new(270.0, 28.0), Instant::now());
        assert!(!f.drags.mouse_up(&mut f.automaton, &mut f.graph));
        assert_eq!(f.automaton.revision(), revision);
    }

    #[test]
    fn test_escape_restores_visual() {
        let mut f = Fixture::new();

        f.press("t1", Point::new(270.0, 28.0), Instant::now());
        f.drags.mouse_move(Point::new(270.0, 100.0), &f.camera, &mut f.graph);
        assert!(f.drags.key(Key::Escape, &mut f.automaton, &mut f.graph));

        assert!(!f.drags.is_dragging());
        assert_eq!(f.graph.edge("t1").unwrap().data.path_offset, None);
        assert_eq!(f.automaton.transition("t1").unwrap().path_offset, None);
    }

    #[test]
    fn test_enter_commits() {
        let mut f = Fixture::new();

        f.press("t1", Point::new(270.0, 28.0), Instant::now());
        f.drags.mouse_move(Point::new(270.0, 0.0), &f.camera, &mut f.graph);
        assert!(f.drags.key(Key::Enter, &mut f.automaton, &mut f.graph));
        assert_eq!(f.automaton.transition("t1").unwrap().path_offset, Some(-28.0));
    }

    #[test]
    fn test_double_click_starts_placement() {
        let mut f = Fixture::new();
        let now = Instant::now();

        assert_eq!(f.press("t1", Point::new(270.0, 28.0), now), LabelPress::DragStarted);
        f.drags.mouse_up(&mut f.automaton, &mut f.graph);
        assert_eq!(
            f.press("t1", Point::new(272.0, 29.0), now + Duration::from_millis(200)),
            LabelPress::PlacementStarted
        );

        assert!(!f.drags.is_dragging());
        assert!(f.placement.is_placing("t1"));
        assert!(f.graph.edge("t1").unwrap().data.placing);
    }

    #[test]
    fn test_slow_second_press_is_a_drag() {
        let mut f = Fixture::new();
        let now = Instant::now();

        f.press("t1", Point::new(270.0, 28.0), now);
        f.drags.mouse_up(&mut f.automaton, &mut f.graph);
        assert_eq!(
            f.press("t1", Point::new(270.0, 28.0), now + Duration::from_millis(600)),
            LabelPress::DragStarted
        );
        assert!(!f.placement.is_placing("t1"));
    }

    #[test]
    fn test_self_loop_label_is_ignored() {
        let mut f = Fixture::new();
        let now = Instant::now();

        assert_eq!(f.press("loop", Point::new(470.0, -36.0), now), LabelPress::Ignored);
        assert_eq!(
            f.press("loop", Point::new(470.0, -36.0), now + Duration::from_millis(50)),
            LabelPress::Ignored
        );
        assert!(!f.placement.is_placing("loop"));
        assert_eq!(f.press("nope", Point::ZERO, now), LabelPress::Ignored);
    }
}
