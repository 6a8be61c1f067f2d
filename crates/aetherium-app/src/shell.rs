//! Editor shell: owns the document and routes input to the controllers.

use crate::error::{AppError, AppResult};
use crate::shortcuts::{ShortcutAction, ShortcutRegistry};
use aetherium_core::adapter::{EdgeChange, NodeChange, SyncOutcome, VisualGraph};
use aetherium_core::automaton::{Automaton, DomainStore, State, StateId, Transition, TransitionId};
use aetherium_core::camera::{Camera, CoordinateSpace};
use aetherium_core::config::EditorConfig;
use aetherium_core::input::{InputState, Instant, Key, Modifiers, MouseButton, PointerEvent};
use aetherium_core::placement::{
    CommitTrigger, LabelDragController, LabelPress, Listener, PlacementController,
};
use aetherium_core::snap::GridSettings;
use aetherium_render::{GridStyle, RenderContext, SvgRenderer};
use kurbo::{Point, Vec2};

/// A state being dragged with the pointer.
#[derive(Debug, Clone)]
struct NodeDrag {
    id: StateId,
    /// Pointer position relative to the node's top-left corner.
    grab: Vec2,
}

pub struct EditorShell {
    automaton: Automaton,
    config: EditorConfig,
    camera: Camera,
    graph: VisualGraph,
    placement: PlacementController,
    label_drags: LabelDragController,
    input: InputState,
    grid: GridSettings,
    locked: bool,
    node_drag: Option<NodeDrag>,
}

impl EditorShell {
    pub fn new(automaton: Automaton, config: EditorConfig) -> Self {
        let mut shell = Self {
            graph: VisualGraph::new(config.node_size()),
            placement: PlacementController::new(config.placement),
            label_drags: LabelDragController::new(config.double_click),
            grid: GridSettings::new(config.grid_size),
            camera: Camera::new(),
            input: InputState::new(),
            locked: false,
            node_drag: None,
            automaton,
            config,
        };
        shell.sync();
        shell
    }

    /// Load an automaton snapshot.
    pub fn from_json(json: &str, config: EditorConfig) -> AppResult<Self> {
        let automaton = Automaton::from_json(json)?;
        log::info!(
            "Loaded automaton '{}' ({} states, {} transitions)",
            automaton.name,
            automaton.states().len(),
            automaton.transitions().len()
        );
        Ok(Self::new(automaton, config))
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn graph(&self) -> &VisualGraph {
        &self.graph
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn placement(&self) -> &PlacementController {
        &self.placement
    }

    pub fn label_drags(&self) -> &LabelDragController {
        &self.label_drags
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn grid(&self) -> GridSettings {
        self.grid
    }

    /// When the host should call [`EditorShell::tick`] next.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.placement.next_deadline()
    }

    /// Re-derive the visual graph from the automaton.
    pub fn sync(&mut self) -> SyncOutcome {
        self.graph.sync(&self.automaton, self.placement.registry())
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) -> bool {
        self.input.handle_pointer_event(event);
        match event {
            PointerEvent::Down { position, button } => self.handle_press(position, button, now),
            PointerEvent::Move { position } => self.handle_drag(position, now),
            PointerEvent::Up {
                button: MouseButton::Left,
                ..
            } => self.handle_release(),
            _ => false,
        }
    }

    /// Pointer press, in order: live placements, labels, nodes, empty canvas.
    ///
    /// Any button commits live placements. Only the primary button reaches
    /// the rest.
    fn handle_press(&mut self, position: Point, button: MouseButton, now: Instant) -> bool {
        self.tick(now);

        if self.placement.listens(Listener::PointerDownCapture) {
            self.placement
                .pointer_down_capture(&mut self.automaton, &mut self.graph);
            self.sync();
            return true;
        }
        if button != MouseButton::Left {
            return false;
        }

        let canvas = self.camera.screen_to_canvas(position);
        let label = self
            .graph
            .label_at(canvas, self.config.label_hit_radius, &self.config.routing);
        if let Some(id) = label {
            let press = self.label_drags.mouse_down(
                &id,
                position,
                &self.camera,
                &self.automaton,
                &mut self.graph,
                &mut self.placement,
                &self.config.routing,
                now,
            );
            if press != LabelPress::Ignored {
                self.select_only(None, Some(id.as_str()));
                self.sync();
                return true;
            }
        }

        let hit = self
            .graph
            .node_at(canvas)
            .map(|node| (node.id.clone(), canvas - node.position));
        if let Some((id, grab)) = hit {
            self.select_only(Some(id.as_str()), None);
            if !self.locked {
                self.node_drag = Some(NodeDrag { id, grab });
            }
            self.sync();
            return true;
        }

        self.select_only(None, None);
        self.sync();
        false
    }

    fn handle_drag(&mut self, position: Point, now: Instant) -> bool {
        let mut handled = self.placement.pointer_move(
            position,
            &self.camera,
            &mut self.automaton,
            &mut self.graph,
            now,
        );

        if self.label_drags.is_dragging() {
            handled |= self
                .label_drags
                .mouse_move(position, &self.camera, &mut self.graph);
        } else if let Some(drag) = self.node_drag.as_ref().filter(|_| self.input.primary_held()) {
            let canvas = self.camera.screen_to_canvas(position);
            let change = NodeChange::Position {
                id: drag.id.clone(),
                position: self.grid.apply(canvas - drag.grab),
            };
            self.graph
                .apply_node_changes(&[change], &mut self.automaton);
            handled = true;
        }

        self.sync();
        handled
    }

    fn handle_release(&mut self) -> bool {
        let committed = self
            .label_drags
            .mouse_up(&mut self.automaton, &mut self.graph);
        let dropped = self.node_drag.take().is_some();
        self.sync();
        committed || dropped
    }

    pub fn handle_key(&mut self, key: Key, modifiers: Modifiers, now: Instant) -> bool {
        self.input.set_modifiers(modifiers);
        self.tick(now);

        let Some(action) = ShortcutRegistry::lookup(key, modifiers) else {
            return false;
        };
        let handled = match action {
            ShortcutAction::Confirm | ShortcutAction::Cancel => {
                let placed = self.placement.key(key, &mut self.automaton, &mut self.graph);
                let dragged = self
                    .label_drags
                    .key(key, &mut self.automaton, &mut self.graph);
                placed || dragged
            }
            ShortcutAction::CreateState => {
                let at = self.camera.screen_to_canvas(self.input.pointer_position);
                self.create_state(at).is_ok()
            }
            ShortcutAction::DeleteSelection => {
                self.delete_selection().is_ok_and(|removed| removed > 0)
            }
            ShortcutAction::ToggleLock => {
                self.toggle_lock();
                true
            }
            ShortcutAction::ToggleGrid => {
                self.toggle_grid();
                true
            }
            ShortcutAction::SelectAll => {
                self.select_all();
                true
            }
        };
        self.sync();
        handled
    }

    /// Hidden tabs commit any live placement.
    pub fn handle_visibility(&mut self, hidden: bool, now: Instant) -> bool {
        self.tick(now);
        let handled = self
            .placement
            .visibility_changed(hidden, &mut self.automaton, &mut self.graph);
        self.sync();
        handled
    }

    pub fn handle_blur(&mut self, now: Instant) -> bool {
        self.tick(now);
        let handled = self.placement.window_blur(&mut self.automaton, &mut self.graph);
        self.node_drag = None;
        self.sync();
        handled
    }

    /// Commit placements whose deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Vec<(TransitionId, CommitTrigger)> {
        let committed = self.placement.tick(now, &mut self.automaton, &mut self.graph);
        if !committed.is_empty() {
            self.sync();
        }
        committed
    }

    /// Create a state centred on `position` (canvas coordinates).
    pub fn create_state(&mut self, position: Point) -> AppResult<StateId> {
        if self.locked {
            return Err(AppError::Locked);
        }
        let size = self.config.node_size();
        let origin = self
            .grid
            .apply(position - Vec2::new(size.width / 2.0, size.height / 2.0));
        let name = format!("State {}", self.automaton.states().len() + 1);
        let id = self.automaton.add_state(State::new(name, origin))?;
        log::info!("Created state {} at ({:.0}, {:.0})", id, origin.x, origin.y);
        self.sync();
        Ok(id)
    }

    /// Delete the selected states and transitions. Transitions touching a
    /// deleted state go too.
    pub fn delete_selection(&mut self) -> AppResult<usize> {
        if self.locked {
            return Err(AppError::Locked);
        }
        let states: Vec<StateId> = self.automaton.selected_states().to_vec();
        let mut transitions: Vec<TransitionId> = self.automaton.selected_transitions().to_vec();
        transitions.extend(
            self.automaton
                .transitions()
                .values()
                .filter(|t| states.contains(&t.source) || states.contains(&t.target))
                .map(|t| t.id.clone()),
        );
        transitions.sort();
        transitions.dedup();

        for id in &transitions {
            self.placement
                .cancel(id, &mut self.automaton, &mut self.graph);
            if self
                .label_drags
                .drag()
                .is_some_and(|d| &d.transition_id == id)
            {
                self.label_drags.abort(&mut self.graph);
            }
        }
        if self
            .node_drag
            .as_ref()
            .is_some_and(|d| states.contains(&d.id))
        {
            self.node_drag = None;
        }

        let mut removed = 0;
        for id in &transitions {
            self.automaton.remove_transition(id)?;
            removed += 1;
        }
        for id in &states {
            self.automaton.remove_state(id)?;
            removed += 1;
        }
        log::info!("Deleted {} elements", removed);
        self.sync();
        Ok(removed)
    }

    /// Add a transition between two existing states.
    pub fn connect(&mut self, source: &str, target: &str) -> AppResult<TransitionId> {
        let id = self.automaton.add_transition(Transition::new(source, target))?;
        self.sync();
        Ok(id)
    }

    /// Toggle read-only mode. Returns the new state.
    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        if self.locked {
            self.node_drag = None;
        }
        log::info!("Editing {}", if self.locked { "locked" } else { "unlocked" });
        self.locked
    }

    pub fn toggle_grid(&mut self) -> bool {
        let enabled = self.grid.toggle();
        log::debug!("Grid {}", if enabled { "on" } else { "off" });
        enabled
    }

    pub fn select_all(&mut self) {
        let changes: Vec<NodeChange> = self
            .graph
            .nodes()
            .iter()
            .map(|n| NodeChange::Select {
                id: n.id.clone(),
                selected: true,
            })
            .collect();
        self.graph.apply_node_changes(&changes, &mut self.automaton);
        self.sync();
    }

    fn select_only(&mut self, state: Option<&str>, transition: Option<&str>) {
        let node_changes: Vec<NodeChange> = self
            .graph
            .nodes()
            .iter()
            .map(|n| NodeChange::Select {
                id: n.id.clone(),
                selected: state == Some(n.id.as_str()),
            })
            .collect();
        let edge_changes: Vec<EdgeChange> = self
            .graph
            .edges()
            .iter()
            .map(|e| EdgeChange::Select {
                id: e.id.clone(),
                selected: transition == Some(e.id.as_str()),
            })
            .collect();
        self.graph
            .apply_node_changes(&node_changes, &mut self.automaton);
        self.graph
            .apply_edge_changes(&edge_changes, &mut self.automaton);
    }

    /// Draw the current graph as SVG.
    pub fn render_svg(&self) -> AppResult<String> {
        let style = if self.grid.enabled {
            GridStyle::Lines
        } else {
            GridStyle::None
        };
        let ctx =
            RenderContext::new(&self.graph, &self.config.routing).with_grid(style, self.grid.size);
        Ok(SvgRenderer::new().render(&ctx)?)
    }
}
