//! Automaton document: states, transitions and the editor selection.
//!
//! This is the domain side of the editor. Everything the canvas shows is
//! derived from here by [`crate::adapter::VisualGraph`], and every edit made on
//! the canvas comes back through the [`DomainStore`] trait.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a state.
pub type StateId = String;
/// Identifier of a transition.
pub type TransitionId = String;

/// Errors raised by automaton mutations.
#[derive(Debug, Error)]
pub enum AutomatonError {
    #[error("Unknown state: {0}")]
    UnknownState(StateId),
    #[error("Unknown transition: {0}")]
    UnknownTransition(TransitionId),
    #[error("State already exists: {0}")]
    DuplicateState(StateId),
    #[error("Transition already exists: {0}")]
    DuplicateTransition(TransitionId),
    #[error("Snapshot key {key} does not match id {id}")]
    KeyMismatch { key: String, id: String },
    #[error("Invalid variable declaration: {0}")]
    InvalidVariable(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for automaton operations.
pub type AutomatonResult<T> = Result<T, AutomatonError>;

/// Type of a declared state variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableKind {
    Bool,
    Int,
    #[default]
    String,
    Void,
}

impl VariableKind {
    /// Name used in the `name:type` notation.
    pub fn name(self) -> &'static str {
        match self {
            VariableKind::Bool => "bool",
            VariableKind::Int => "int",
            VariableKind::String => "string",
            VariableKind::Void => "void",
        }
    }
}

/// A declared input, output or local variable of a state.
///
/// Snapshots store it in `name:type` notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
}

impl Variable {
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl FromStr for Variable {
    type Err = AutomatonError;

    /// Parse `name:type`. A bare `name` declares a string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, kind) = match s.split_once(':') {
            Some((name, ty)) => {
                let kind = match ty.trim() {
                    "bool" => VariableKind::Bool,
                    "int" => VariableKind::Int,
                    "string" => VariableKind::String,
                    "void" => VariableKind::Void,
                    _ => return Err(AutomatonError::InvalidVariable(s.to_string())),
                };
                (name.trim(), kind)
            }
            None => (s.trim(), VariableKind::String),
        };
        if name.is_empty() {
            return Err(AutomatonError::InvalidVariable(s.to_string()));
        }
        Ok(Self::new(name, kind))
    }
}

impl TryFrom<String> for Variable {
    type Error = AutomatonError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Variable> for String {
    fn from(variable: Variable) -> Self {
        variable.to_string()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.kind.name())
    }
}

/// A state of the automaton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: StateId,
    /// Display name.
    pub name: String,
    /// Top-left corner of the node in canvas coordinates.
    pub position: Point,
    /// Script body, opaque to the editor core.
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub composite: bool,
    #[serde(default)]
    pub inputs: Vec<Variable>,
    #[serde(default)]
    pub outputs: Vec<Variable>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub on_enter: Option<String>,
    #[serde(default)]
    pub on_exit: Option<String>,
}

impl State {
    /// Create a state with a fresh id.
    pub fn new(name: impl Into<String>, position: Point) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, position)
    }

    pub fn with_id(id: impl Into<StateId>, name: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            script: String::new(),
            composite: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
            variables: Vec::new(),
            on_enter: None,
            on_exit: None,
        }
    }
}

/// Persisted shape hints of a transition.
///
/// `control_point` wins over `path_offset` when both are present.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionShape {
    pub path_offset: Option<f64>,
    pub control_point: Option<Point>,
}

impl TransitionShape {
    pub fn offset(offset: f64) -> Self {
        Self {
            path_offset: Some(offset),
            control_point: None,
        }
    }

    pub fn control_point(point: Point) -> Self {
        Self {
            path_offset: None,
            control_point: Some(point),
        }
    }

    /// Neither hint is set.
    pub fn is_unshaped(&self) -> bool {
        self.path_offset.is_none() && self.control_point.is_none()
    }
}

/// A transition between two states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub id: TransitionId,
    pub source: StateId,
    pub target: StateId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Guard expression, opaque to the editor core.
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Code run when the transition fires, opaque to the editor core.
    #[serde(default)]
    pub triggered: Option<String>,
    #[serde(default)]
    pub path_offset: Option<f64>,
    #[serde(default)]
    pub control_point: Option<Point>,
}

fn default_weight() -> f64 {
    1.0
}

impl Transition {
    /// Create an unshaped transition with a fresh id.
    pub fn new(source: impl Into<StateId>, target: impl Into<StateId>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), source, target)
    }

    pub fn with_id(
        id: impl Into<TransitionId>,
        source: impl Into<StateId>,
        target: impl Into<StateId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            name: String::new(),
            condition: String::new(),
            priority: 0,
            weight: default_weight(),
            triggered: None,
            path_offset: None,
            control_point: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_shape(mut self, shape: TransitionShape) -> Self {
        self.path_offset = shape.path_offset;
        self.control_point = shape.control_point;
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Current persisted shape hints.
    pub fn shape(&self) -> TransitionShape {
        TransitionShape {
            path_offset: self.path_offset,
            control_point: self.control_point,
        }
    }
}

/// Partial update of a state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub name: Option<String>,
    pub position: Option<Point>,
    pub script: Option<String>,
    pub composite: Option<bool>,
}

impl StatePatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
}

/// Partial update of a transition.
///
/// The shape fields are doubly optional: `Some(None)` clears the hint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionPatch {
    pub name: Option<String>,
    pub condition: Option<String>,
    pub priority: Option<i32>,
    pub weight: Option<f64>,
    pub path_offset: Option<Option<f64>>,
    pub control_point: Option<Option<Point>>,
}

impl TransitionPatch {
    /// Replace both shape hints.
    pub fn shape(shape: TransitionShape) -> Self {
        Self {
            path_offset: Some(shape.path_offset),
            control_point: Some(shape.control_point),
            ..Self::default()
        }
    }
}

/// Read/write access to the domain model, as consumed by the canvas layer.
pub trait DomainStore {
    fn states(&self) -> &BTreeMap<StateId, State>;

    fn transitions(&self) -> &BTreeMap<TransitionId, Transition>;

    fn state(&self, id: &str) -> Option<&State> {
        self.states().get(id)
    }

    fn transition(&self, id: &str) -> Option<&Transition> {
        self.transitions().get(id)
    }

    fn selected_states(&self) -> &[StateId];

    fn selected_transitions(&self) -> &[TransitionId];

    /// Bumped whenever the set of state ids or transition ids changes.
    fn structure_generation(&self) -> u64;

    /// Bumped on every mutation.
    fn revision(&self) -> u64;

    fn update_state(&mut self, id: &str, patch: StatePatch) -> AutomatonResult<()>;

    fn update_transition(&mut self, id: &str, patch: TransitionPatch) -> AutomatonResult<()>;

    fn set_selected_states(&mut self, ids: Vec<StateId>);

    fn set_selected_transitions(&mut self, ids: Vec<TransitionId>);
}

/// An automaton definition being edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automaton {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    states: BTreeMap<StateId, State>,
    #[serde(default)]
    transitions: BTreeMap<TransitionId, Transition>,
    #[serde(default)]
    selected_states: Vec<StateId>,
    #[serde(default)]
    selected_transitions: Vec<TransitionId>,
    #[serde(skip)]
    structure_generation: u64,
    #[serde(skip)]
    revision: u64,
}

impl Default for Automaton {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Automaton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "0.0.1".to_string(),
            states: BTreeMap::new(),
            transitions: BTreeMap::new(),
            selected_states: Vec::new(),
            selected_transitions: Vec::new(),
            structure_generation: 0,
            revision: 0,
        }
    }

    /// Parse a JSON snapshot. Every map key must equal the id it holds and
    /// every transition must reference existing states.
    pub fn from_json(json: &str) -> AutomatonResult<Self> {
        let automaton: Automaton =
            serde_json::from_str(json).map_err(|e| AutomatonError::Serialization(e.to_string()))?;
        let keys = automaton
            .states
            .iter()
            .map(|(key, state)| (key, &state.id))
            .chain(automaton.transitions.iter().map(|(key, t)| (key, &t.id)));
        for (key, id) in keys {
            if key != id {
                return Err(AutomatonError::KeyMismatch {
                    key: key.clone(),
                    id: id.clone(),
                });
            }
        }
        for transition in automaton.transitions.values() {
            for endpoint in [&transition.source, &transition.target] {
                if !automaton.states.contains_key(endpoint) {
                    return Err(AutomatonError::UnknownState(endpoint.clone()));
                }
            }
        }
        Ok(automaton)
    }

    pub fn to_json(&self) -> AutomatonResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AutomatonError::Serialization(e.to_string()))
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn touch_structure(&mut self) {
        self.structure_generation += 1;
        self.revision += 1;
    }

    /// Add a state. Returns its id.
    pub fn add_state(&mut self, state: State) -> AutomatonResult<StateId> {
        if self.states.contains_key(&state.id) {
            return Err(AutomatonError::DuplicateState(state.id));
        }
        let id = state.id.clone();
        self.states.insert(id.clone(), state);
        self.touch_structure();
        Ok(id)
    }

    /// Remove a state together with every transition touching it.
    pub fn remove_state(&mut self, id: &str) -> AutomatonResult<State> {
        let state = self
            .states
            .remove(id)
            .ok_or_else(|| AutomatonError::UnknownState(id.to_string()))?;
        let dangling: Vec<TransitionId> = self
            .transitions
            .values()
            .filter(|t| t.source == id || t.target == id)
            .map(|t| t.id.clone())
            .collect();
        for transition_id in &dangling {
            self.transitions.remove(transition_id);
        }
        self.selected_states.retain(|s| s != id);
        self.selected_transitions.retain(|t| !dangling.contains(t));
        self.touch_structure();
        Ok(state)
    }

    /// Add a transition. Both endpoints must exist.
    pub fn add_transition(&mut self, transition: Transition) -> AutomatonResult<TransitionId> {
        if self.transitions.contains_key(&transition.id) {
            return Err(AutomatonError::DuplicateTransition(transition.id));
        }
        for endpoint in [&transition.source, &transition.target] {
            if !self.states.contains_key(endpoint) {
                return Err(AutomatonError::UnknownState(endpoint.clone()));
            }
        }
        let id = transition.id.clone();
        self.transitions.insert(id.clone(), transition);
        self.touch_structure();
        Ok(id)
    }

    pub fn remove_transition(&mut self, id: &str) -> AutomatonResult<Transition> {
        let transition = self
            .transitions
            .remove(id)
            .ok_or_else(|| AutomatonError::UnknownTransition(id.to_string()))?;
        self.selected_transitions.retain(|t| t != id);
        self.touch_structure();
        Ok(transition)
    }
}

impl DomainStore for Automaton {
    fn states(&self) -> &BTreeMap<StateId, State> {
        &self.states
    }

    fn transitions(&self) -> &BTreeMap<TransitionId, Transition> {
        &self.transitions
    }

    fn selected_states(&self) -> &[StateId] {
        &self.selected_states
    }

    fn selected_transitions(&self) -> &[TransitionId] {
        &self.selected_transitions
    }

    fn structure_generation(&self) -> u64 {
        self.structure_generation
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn update_state(&mut self, id: &str, patch: StatePatch) -> AutomatonResult<()> {
        let state = self
            .states
            .get_mut(id)
            .ok_or_else(|| AutomatonError::UnknownState(id.to_string()))?;
        if let Some(name) = patch.name {
            state.name = name;
        }
        if let Some(position) = patch.position {
            state.position = position;
        }
        if let Some(script) = patch.script {
            state.script = script;
        }
        if let Some(composite) = patch.composite {
            state.composite = composite;
        }
        self.touch();
        Ok(())
    }

    fn update_transition(&mut self, id: &str, patch: TransitionPatch) -> AutomatonResult<()> {
        let transition = self
            .transitions
            .get_mut(id)
            .ok_or_else(|| AutomatonError::UnknownTransition(id.to_string()))?;
        if let Some(name) = patch.name {
            transition.name = name;
        }
        if let Some(condition) = patch.condition {
            transition.condition = condition;
        }
        if let Some(priority) = patch.priority {
            transition.priority = priority;
        }
        if let Some(weight) = patch.weight {
            transition.weight = weight;
        }
        if let Some(path_offset) = patch.path_offset {
            transition.path_offset = path_offset;
        }
        if let Some(control_point) = patch.control_point {
            transition.control_point = control_point;
        }
        self.touch();
        Ok(())
    }

    fn set_selected_states(&mut self, ids: Vec<StateId>) {
        self.selected_states = ids;
        self.touch();
    }

    fn set_selected_transitions(&mut self, ids: Vec<TransitionId>) {
        self.selected_transitions = ids;
        self.touch();
    }
}
