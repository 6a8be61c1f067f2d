//! Application errors.

use aetherium_core::automaton::AutomatonError;
use aetherium_core::config::ConfigError;
use aetherium_render::RendererError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Automaton(#[from] AutomatonError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Editing is locked")]
    Locked,
    #[error("Usage: {0}")]
    Usage(String),
}

pub type AppResult<T> = Result<T, AppError>;
