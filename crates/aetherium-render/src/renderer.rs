//! Renderer trait abstraction.

use aetherium_core::adapter::VisualGraph;
use aetherium_core::routing::RoutingConfig;
use aetherium_core::snap::GRID_SIZE;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Output error: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    /// No grid (plain background).
    #[default]
    None,
    /// Full grid lines.
    Lines,
    /// Only dots at intersections.
    Dots,
}

impl GridStyle {
    /// Cycle to the next grid style.
    pub fn next(self) -> Self {
        match self {
            GridStyle::None => GridStyle::Lines,
            GridStyle::Lines => GridStyle::Dots,
            GridStyle::Dots => GridStyle::None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GridStyle::None => "None",
            GridStyle::Lines => "Lines",
            GridStyle::Dots => "Dots",
        }
    }
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The derived graph to draw.
    pub graph: &'a VisualGraph,
    pub routing: &'a RoutingConfig,
    pub background_color: Color,
    pub grid_style: GridStyle,
    pub grid_size: f64,
    pub node_color: Color,
    pub edge_color: Color,
    pub selection_color: Color,
    /// Highlight for edges with a live placement session.
    pub placing_color: Color,
    /// Margin around the content, in canvas units.
    pub padding: f64,
}

impl<'a> RenderContext<'a> {
    pub fn new(graph: &'a VisualGraph, routing: &'a RoutingConfig) -> Self {
        Self {
            graph,
            routing,
            background_color: Color::from_rgba8(250, 250, 250, 255),
            grid_style: GridStyle::None,
            grid_size: GRID_SIZE,
            node_color: Color::from_rgba8(255, 255, 255, 255),
            edge_color: Color::from_rgba8(55, 65, 81, 255),
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
            placing_color: Color::from_rgba8(245, 158, 11, 255), // Amber
            padding: 40.0,
        }
    }

    /// Set the grid style and spacing.
    pub fn with_grid(mut self, style: GridStyle, size: f64) -> Self {
        self.grid_style = style;
        self.grid_size = size;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Build the output for a frame from the derived graph.
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
