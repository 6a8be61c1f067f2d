//! Aetherium Render Library
//!
//! Renderer abstraction and an SVG backend for the Aetherium editor.

mod renderer;
mod svg;

pub use renderer::{GridStyle, RenderContext, RenderResult, Renderer, RendererError};
pub use svg::SvgRenderer;
