//! Keyboard shortcut registry and documentation.

use aetherium_core::input::{Key, Modifiers};

/// Editor command bound to a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    CreateState,
    DeleteSelection,
    ToggleLock,
    ToggleGrid,
    SelectAll,
    /// Enter: commit the active placement or label drag.
    Confirm,
    /// Escape: cancel the active placement or label drag.
    Cancel,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub action: ShortcutAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        action: ShortcutAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+A").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// Whether a key press triggers this shortcut.
    pub fn matches(&self, key: Key, modifiers: Modifiers) -> bool {
        if self.ctrl != modifiers.command() || self.shift != modifiers.shift {
            return false;
        }
        match key {
            Key::Character(c) => {
                let mut buf = [0u8; 4];
                self.key.eq_ignore_ascii_case(c.encode_utf8(&mut buf))
            }
            other => Key::from_name(self.key) == Some(other),
        }
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new(
                "N",
                false,
                false,
                ShortcutAction::CreateState,
                "Create state at pointer",
            ),
            Shortcut::new("A", true, false, ShortcutAction::SelectAll, "Select all states"),
            Shortcut::new(
                "Delete",
                false,
                false,
                ShortcutAction::DeleteSelection,
                "Delete selection",
            ),
            Shortcut::new(
                "Backspace",
                false,
                false,
                ShortcutAction::DeleteSelection,
                "Delete selection",
            ),
            Shortcut::new("L", false, false, ShortcutAction::ToggleLock, "Lock or unlock editing"),
            Shortcut::new("G", false, false, ShortcutAction::ToggleGrid, "Toggle grid snapping"),
            Shortcut::new("Enter", false, false, ShortcutAction::Confirm, "Commit edge placement"),
            Shortcut::new("Escape", false, false, ShortcutAction::Cancel, "Cancel edge placement"),
        ]
    }

    /// Action bound to a key press, if any.
    pub fn lookup(key: Key, modifiers: Modifiers) -> Option<ShortcutAction> {
        Self::all()
            .into_iter()
            .find(|s| s.matches(key, modifiers))
            .map(|s| s.action)
    }

    /// Shortcut table for the terminal.
    pub fn describe() -> String {
        let mut text = String::from("=== Keyboard Shortcuts ===\n");
        for shortcut in Self::all() {
            text.push_str(&format!("  {:20} {}\n", shortcut.format(), shortcut.description));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    #[test]
    fn test_lookup() {
        assert_eq!(
            ShortcutRegistry::lookup(Key::Character('n'), Modifiers::NONE),
            Some(ShortcutAction::CreateState)
        );
        assert_eq!(
            ShortcutRegistry::lookup(Key::Backspace, Modifiers::NONE),
            Some(ShortcutAction::DeleteSelection)
        );
        assert_eq!(
            ShortcutRegistry::lookup(Key::Character('a'), CTRL),
            Some(ShortcutAction::SelectAll)
        );
        assert_eq!(ShortcutRegistry::lookup(Key::Character('a'), Modifiers::NONE), None);
        // Ctrl+N is not bound
        assert_eq!(ShortcutRegistry::lookup(Key::Character('n'), CTRL), None);
    }

    #[test]
    fn test_format() {
        let select_all = ShortcutRegistry::all()
            .into_iter()
            .find(|s| s.action == ShortcutAction::SelectAll)
            .unwrap();
        assert_eq!(select_all.format(), "Ctrl+A");
    }

    #[test]
    fn test_describe_lists_every_shortcut() {
        let text = ShortcutRegistry::describe();
        assert_eq!(text.lines().count(), ShortcutRegistry::all().len() + 1);
        assert!(text.contains("Ctrl+A"));
        assert!(text.contains("Cancel edge placement"));
    }
}
