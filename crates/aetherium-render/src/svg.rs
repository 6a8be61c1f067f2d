//! SVG rendering backend.

use crate::renderer::{GridStyle, RenderContext, RenderResult, Renderer, RendererError};
use aetherium_core::adapter::{RoutedEdge, VisualNode};
use kurbo::{ParamCurveExtrema, Point, Rect, Vec2};
use peniko::Color;
use std::fmt::Write;

const ARROW_SIZE: f64 = 10.0;
const CORNER_RADIUS: f64 = 8.0;
const FONT_SIZE: f64 = 14.0;
/// Upper bound on grid lines per axis. Finer grids are drawn at a multiple
/// of the requested spacing.
const MAX_GRID_LINES: usize = 400;

/// Renders the graph into a standalone SVG document.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    document: String,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last built document.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn take_document(&mut self) -> String {
        std::mem::take(&mut self.document)
    }

    /// Build and return the document in one go.
    pub fn render(&mut self, ctx: &RenderContext) -> RenderResult<String> {
        self.build_scene(ctx)?;
        Ok(self.take_document())
    }

    fn render_grid(
        out: &mut String,
        bounds: Rect,
        style: GridStyle,
        size: f64,
    ) -> RenderResult<()> {
        if !size.is_finite() || size <= 0.0 {
            return Ok(());
        }
        let xs = grid_coordinates(bounds.x0, bounds.x1, size);
        let ys = grid_coordinates(bounds.y0, bounds.y1, size);

        match style {
            GridStyle::None => {}
            GridStyle::Lines => {
                let mut path = String::new();
                for x in &xs {
                    write!(path, "M{} {}V{}", x, bounds.y0, bounds.y1)?;
                }
                for y in &ys {
                    write!(path, "M{} {}H{}", bounds.x0, y, bounds.x1)?;
                }
                writeln!(
                    out,
                    r#"<path class="grid" d="{}" stroke="rgba(200,200,200,0.4)" stroke-width="0.5" fill="none"/>"#,
                    path
                )?;
            }
            GridStyle::Dots => {
                writeln!(out, r#"<g class="grid" fill="rgba(160,160,160,0.3)">"#)?;
                for x in &xs {
                    for y in &ys {
                        writeln!(out, r#"<circle cx="{}" cy="{}" r="1.5"/>"#, x, y)?;
                    }
                }
                writeln!(out, "</g>")?;
            }
        }
        Ok(())
    }

    fn render_node(out: &mut String, node: &VisualNode, ctx: &RenderContext) -> RenderResult<()> {
        let rect = node.rect();
        let stroke = if node.selected {
            ctx.selection_color
        } else {
            ctx.edge_color
        };
        writeln!(
            out,
            r#"<g class="node" data-id="{}"><rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            escape(&node.id),
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
            CORNER_RADIUS,
            css(ctx.node_color),
            css(stroke),
            if node.selected { 2.5 } else { 1.5 },
        )?;
        if node.label.composite {
            // Inner border marks a composite state
            let inner = rect.inset(-4.0);
            writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="none" stroke="{}" stroke-width="1"/>"#,
                inner.x0,
                inner.y0,
                inner.width(),
                inner.height(),
                CORNER_RADIUS - 2.0,
                css(stroke),
            )?;
        }
        let center = rect.center();
        writeln!(
            out,
            r#"<text x="{}" y="{}" font-size="{}" text-anchor="middle" dominant-baseline="middle">{}</text></g>"#,
            center.x,
            center.y,
            FONT_SIZE,
            escape(&node.label.name),
        )?;
        Ok(())
    }

    fn render_edge(out: &mut String, edge: &RoutedEdge, ctx: &RenderContext) -> RenderResult<()> {
        let color = if edge.placing {
            ctx.placing_color
        } else if edge.selected {
            ctx.selection_color
        } else {
            ctx.edge_color
        };
        let dash = if edge.placing {
            r#" stroke-dasharray="6 4""#
        } else {
            ""
        };
        writeln!(
            out,
            r#"<g class="edge" data-id="{}"><path d="{}" fill="none" stroke="{}" stroke-width="{}"{}/>"#,
            escape(&edge.id),
            edge.route.to_svg(),
            css(color),
            if edge.selected { 2.5 } else { 1.5 },
            dash,
        )?;

        let [tip, left, right] = arrowhead(edge.route.curve.p3, edge.route.end_direction());
        writeln!(
            out,
            r#"<path d="M{} {}L{} {}L{} {}Z" fill="{}"/>"#,
            tip.x,
            tip.y,
            left.x,
            left.y,
            right.x,
            right.y,
            css(color),
        )?;

        if edge.placing {
            let control = edge.route.label;
            writeln!(
                out,
                r#"<circle class="candidate" cx="{}" cy="{}" r="5" fill="{}"/>"#,
                control.x,
                control.y,
                css(ctx.placing_color),
            )?;
        }
        if !edge.label.is_empty() {
            writeln!(
                out,
                r#"<text x="{}" y="{}" font-size="{}" text-anchor="middle" dominant-baseline="middle" paint-order="stroke" stroke="{}" stroke-width="4">{}</text>"#,
                edge.route.label.x,
                edge.route.label.y,
                FONT_SIZE - 2.0,
                css(ctx.background_color),
                escape(&edge.label),
            )?;
        }
        writeln!(out, "</g>")?;
        Ok(())
    }
}

impl Renderer for SvgRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        let edges = ctx.graph.routed_edges(ctx.routing);
        let bounds = content_bounds(ctx.graph.nodes(), &edges).inflate(ctx.padding, ctx.padding);
        if !bounds.is_finite() {
            return Err(RendererError::RenderFailed(format!(
                "non-finite content bounds {:?}",
                bounds
            )));
        }

        let mut out = String::new();
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}" width="{}" height="{}">"#,
            bounds.x0,
            bounds.y0,
            bounds.width(),
            bounds.height(),
            bounds.width(),
            bounds.height(),
        )?;
        writeln!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            bounds.x0,
            bounds.y0,
            bounds.width(),
            bounds.height(),
            css(self.background_color(ctx)),
        )?;
        Self::render_grid(&mut out, bounds, ctx.grid_style, ctx.grid_size)?;

        // Edges first so nodes cover the curve ends
        for edge in &edges {
            Self::render_edge(&mut out, edge, ctx)?;
        }
        for node in ctx.graph.nodes() {
            Self::render_node(&mut out, node, ctx)?;
        }
        writeln!(out, "</svg>")?;

        log::debug!(
            "Built SVG: {} nodes, {} edges, {} bytes",
            ctx.graph.nodes().len(),
            edges.len(),
            out.len()
        );
        self.document = out;
        Ok(())
    }
}

/// Union of node rectangles, curve extents and label anchors.
fn content_bounds(nodes: &[VisualNode], edges: &[RoutedEdge]) -> Rect {
    let rects = nodes.iter().map(VisualNode::rect).chain(edges.iter().map(|e| {
        e.route
            .curve
            .bounding_box()
            .union_pt(e.route.label)
    }));
    rects
        .reduce(|a, b| a.union(b))
        .unwrap_or_else(|| Rect::new(0.0, 0.0, 100.0, 100.0))
}

/// Grid line positions covering `[min, max]`, aligned to multiples of
/// `size`. The spacing is widened when more than `MAX_GRID_LINES` would be
/// needed.
fn grid_coordinates(min: f64, max: f64, size: f64) -> Vec<f64> {
    let start = (min / size).floor() * size;
    let count = ((max - start) / size).floor();
    if !count.is_finite() || count < 0.0 {
        return Vec::new();
    }
    let stride = (count / MAX_GRID_LINES as f64).ceil().max(1.0);
    let step = size * stride;
    let steps = ((count / stride) as usize).min(MAX_GRID_LINES);
    (0..=steps).map(|i| start + i as f64 * step).collect()
}

/// Tip, left and right corners of an arrowhead pointing along `direction`.
fn arrowhead(tip: Point, direction: Vec2) -> [Point; 3] {
    let perp = Vec2::new(-direction.y, direction.x);
    let back = tip - direction * ARROW_SIZE;
    [
        tip,
        back + perp * (ARROW_SIZE * 0.5),
        back - perp * (ARROW_SIZE * 0.5),
    ]
}

fn css(color: Color) -> String {
    let rgba = color.to_rgba8();
    if rgba.a == 255 {
        format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
    } else {
        format!(
            "rgba({},{},{},{:.3})",
            rgba.r,
            rgba.g,
            rgba.b,
            f64::from(rgba.a) / 255.0
        )
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
