//! Pointer and keyboard input types, and the double-click heuristic.

use kurbo::Point;
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, Instant};
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position } => position,
        }
    }
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Escape,
    Delete,
    Backspace,
    Character(char),
}

impl Key {
    /// Map a key name ("Enter", "Escape", "a", ...) to a key. Characters are
    /// lowercased.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Enter" | "Return" => Some(Key::Enter),
            "Escape" | "Esc" => Some(Key::Escape),
            "Delete" => Some(Key::Delete),
            "Backspace" => Some(Key::Backspace),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Character(c.to_ascii_lowercase())),
                    _ => None,
                }
            }
        }
    }
}

/// Thresholds for the manual double-click heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleClickConfig {
    /// Maximum time between the two presses.
    pub window_ms: u64,
    /// Maximum distance between the two presses, in screen pixels.
    pub tolerance_px: f64,
}

impl Default for DoubleClickConfig {
    fn default() -> Self {
        Self {
            window_ms: 350,
            tolerance_px: 10.0,
        }
    }
}

impl DoubleClickConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Detects double-clicks from successive presses on the same element.
///
/// Used for edge labels, where the native double-click event is not delivered
/// reliably.
#[derive(Debug, Clone)]
pub struct DoubleClickDetector {
    config: DoubleClickConfig,
    last_press: Option<(Instant, Point)>,
}

impl DoubleClickDetector {
    pub fn new(config: DoubleClickConfig) -> Self {
        Self {
            config,
            last_press: None,
        }
    }

    /// Record a press and report whether it completes a double-click.
    pub fn register(&mut self, position: Point, now: Instant) -> bool {
        if let Some((last_time, last_pos)) = self.last_press {
            let elapsed = now.saturating_duration_since(last_time);
            let distance = (position - last_pos).hypot();
            if elapsed <= self.config.window() && distance <= self.config.tolerance_px {
                // Reset so a third press does not count as another double-click
                self.last_press = None;
                return true;
            }
        }
        self.last_press = Some((now, position));
        false
    }
}

/// Last known pointer position and modifier keys, as seen by the shell.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Screen coordinates of the most recent pointer event.
    pub pointer_position: Point,
    pub modifiers: Modifiers,
    /// Where the primary button went down, while it is held.
    press_origin: Option<Point>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        self.pointer_position = event.position();
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => {
                self.press_origin.get_or_insert(position);
            }
            PointerEvent::Up {
                button: MouseButton::Left,
                ..
            } => self.press_origin = None,
            _ => {}
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn primary_held(&self) -> bool {
        self.press_origin.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_name("Enter"), Some(Key::Enter));
        assert_eq!(Key::from_name("Escape"), Some(Key::Escape));
        assert_eq!(Key::from_name("N"), Some(Key::Character('n')));
        assert_eq!(Key::from_name("F12"), None);
    }

    #[test]
    fn test_double_click_detection() {
        let mut detector = DoubleClickDetector::new(DoubleClickConfig::default());
        let start = Instant::now();
        let pos = Point::new(100.0, 100.0);

        assert!(!detector.register(pos, start));
        assert!(detector.register(
            Point::new(104.0, 103.0),
            start + Duration::from_millis(200)
        ));
        // Third press starts a new sequence
        assert!(!detector.register(pos, start + Duration::from_millis(300)));
    }

    #[test]
    fn test_double_click_too_slow() {
        let mut detector = DoubleClickDetector::new(DoubleClickConfig::default());
        let start = Instant::now();
        let pos = Point::new(100.0, 100.0);

        detector.register(pos, start);
        assert!(!detector.register(pos, start + Duration::from_millis(351)));
    }

    #[test]
    fn test_double_click_too_far() {
        let mut detector = DoubleClickDetector::new(DoubleClickConfig::default());
        let start = Instant::now();

        detector.register(Point::new(100.0, 100.0), start);
        assert!(!detector.register(
            Point::new(120.0, 100.0),
            start + Duration::from_millis(50)
        ));
    }

    #[test]
    fn test_double_click_custom_thresholds() {
        let mut detector = DoubleClickDetector::new(DoubleClickConfig {
            window_ms: 1000,
            tolerance_px: 50.0,
        });
        let start = Instant::now();

        detector.register(Point::new(0.0, 0.0), start);
        assert!(detector.register(
            Point::new(30.0, 30.0),
            start + Duration::from_millis(900)
        ));
    }

    #[test]
    fn test_primary_press_tracking() {
        let mut input = InputState::new();
        input.handle_pointer_event(PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Left,
        });
        input.handle_pointer_event(PointerEvent::Down {
            position: Point::new(99.0, 99.0),
            button: MouseButton::Right,
        });
        input.handle_pointer_event(PointerEvent::Move {
            position: Point::new(40.0, 50.0),
        });

        assert!(input.primary_held());
        assert_eq!(input.pointer_position, Point::new(40.0, 50.0));

        input.handle_pointer_event(PointerEvent::Up {
            position: Point::new(40.0, 50.0),
            button: MouseButton::Left,
        });
        assert!(!input.primary_held());
    }
}
