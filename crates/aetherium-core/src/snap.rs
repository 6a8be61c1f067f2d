//! Grid display and snapping for state placement.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Default grid size in canvas units.
pub const GRID_SIZE: f64 = 20.0;

/// Smallest non-zero grid size a configuration may ask for. Zero turns
/// snapping off.
pub const MIN_GRID_SIZE: f64 = 2.0;

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Grid toggle state. When enabled the grid is drawn and state positions
/// snap to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    pub enabled: bool,
    pub size: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            size: GRID_SIZE,
        }
    }
}

impl GridSettings {
    pub fn new(size: f64) -> Self {
        Self {
            enabled: false,
            size,
        }
    }

    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Snap the point if the grid is enabled.
    pub fn apply(&self, point: Point) -> Point {
        if self.enabled {
            snap_to_grid(point, self.size)
        } else {
            point
        }
    }
}
