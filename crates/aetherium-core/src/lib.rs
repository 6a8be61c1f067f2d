//! Aetherium Core Library
//!
//! Platform-agnostic core of the Aetherium automaton editor: the domain
//! model, edge routing, placement sessions and the domain↔visual adapter.

pub mod adapter;
pub mod automaton;
pub mod camera;
pub mod config;
pub mod input;
pub mod placement;
pub mod routing;
pub mod snap;

pub use adapter::{
    EdgeChange, EdgeOverlay, NodeChange, RoutedEdge, SyncOutcome, VisualEdge, VisualGraph,
    VisualNode,
};
pub use automaton::{
    Automaton, AutomatonError, AutomatonResult, DomainStore, State, StateId, Transition,
    TransitionId, TransitionShape,
};
pub use camera::{Camera, CoordinateSpace};
pub use config::{ConfigError, EditorConfig};
pub use input::{InputState, Key, Modifiers, MouseButton, PointerEvent};
pub use placement::{
    CommitTrigger, LabelDragController, LabelPress, PlacementController, SessionRegistry,
};
pub use routing::{Route, RouteKind, RoutingConfig, Side};
pub use snap::{GRID_SIZE, GridSettings, MIN_GRID_SIZE, snap_to_grid};
