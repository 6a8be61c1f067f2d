//! Viewport transform between screen and canvas coordinates.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

const MIN_ZOOM: f64 = 0.25;
const MAX_ZOOM: f64 = 4.0;

/// Conversion from screen (pointer) coordinates to canvas coordinates.
pub trait CoordinateSpace {
    fn screen_to_canvas(&self, screen_point: Point) -> Point;
}

/// Pan and zoom of the canvas view. A canvas point `p` appears on screen
/// at `pan + p * zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub pan: Vec2,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas-to-screen transform.
    pub fn view_transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        self.view_transform() * canvas_point
    }

    /// Move the view by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Scale the view by `factor`, keeping the canvas point under `anchor`
    /// (screen coordinates) in place.
    pub fn zoom_around(&mut self, anchor: Point, factor: f64) {
        let fixed = self.screen_to_canvas(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor.to_vec2() - fixed.to_vec2() * self.zoom;
    }
}

impl CoordinateSpace for Camera {
    fn screen_to_canvas(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.pan.x) / self.zoom,
            (screen_point.y - self.pan.y) / self.zoom,
        )
    }
}
