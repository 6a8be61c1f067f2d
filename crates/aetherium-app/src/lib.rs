//! Aetherium Application Library
//!
//! Editor shell wiring input, shortcuts and rendering around the core.

pub mod cli;
mod error;
pub mod shell;
pub mod shortcuts;

pub use cli::Cli;
pub use error::{AppError, AppResult};
pub use shell::EditorShell;
pub use shortcuts::{Shortcut, ShortcutAction, ShortcutRegistry};

use aetherium_core::automaton::{Automaton, DomainStore};
use aetherium_core::config::EditorConfig;
use std::fmt;
use std::path::Path;

/// Summary of a snapshot that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub name: String,
    pub states: usize,
    pub transitions: usize,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: valid ({} states, {} transitions)",
            self.name, self.states, self.transitions
        )
    }
}

/// Load a snapshot and check it: map keys match ids, transition endpoints
/// exist and variable declarations parse.
pub fn validate_file(path: &Path) -> AppResult<Validation> {
    let json = std::fs::read_to_string(path)?;
    let automaton = Automaton::from_json(&json)?;
    log::info!("Validated {}", path.display());
    Ok(Validation {
        name: automaton.name.clone(),
        states: automaton.states().len(),
        transitions: automaton.transitions().len(),
    })
}

/// Load an automaton snapshot (and optionally a config file) and render it
/// as SVG.
pub fn export_svg(automaton_path: &Path, config_path: Option<&Path>) -> AppResult<String> {
    let config = match config_path {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let json = std::fs::read_to_string(automaton_path)?;
    let shell = EditorShell::from_json(&json, config)?;
    shell.render_svg()
}
