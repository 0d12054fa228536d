//! Keyboard shortcut registry and documentation.

use diagramkit_core::input::Key;

/// Editor commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PointerMode,
    ConnectorMode,
    ToggleGrid,
    ToggleSnap,
    NewRectangle,
    SelectAll,
    DeleteSelection,
    Cancel,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: Key,
    pub label: &'static str,
    pub command: Command,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: Key, label: &'static str, command: Command, description: &'static str) -> Self {
        Self {
            key,
            label,
            command,
            description,
        }
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new(Key::Char('V'), "V", Command::PointerMode, "Pointer mode"),
            Shortcut::new(Key::Char('C'), "C", Command::ConnectorMode, "Connector mode"),
            Shortcut::new(Key::Char('G'), "G", Command::ToggleGrid, "Toggle grid"),
            Shortcut::new(Key::Char('S'), "S", Command::ToggleSnap, "Toggle snap to grid"),
            Shortcut::new(Key::Char('N'), "N", Command::NewRectangle, "New rectangle"),
            Shortcut::new(Key::Char('A'), "A", Command::SelectAll, "Select all"),
            Shortcut::new(Key::Delete, "Delete", Command::DeleteSelection, "Delete selected entities"),
            Shortcut::new(Key::Backspace, "Backspace", Command::DeleteSelection, "Delete selected entities"),
            Shortcut::new(Key::Escape, "Escape", Command::Cancel, "Cancel current action"),
        ]
    }

    /// Command bound to a key, if any.
    pub fn lookup(key: Key) -> Option<Command> {
        Self::all().into_iter().find(|s| s.key == key).map(|s| s.command)
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:12} {}", shortcut.label, shortcut.description);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(ShortcutRegistry::lookup(Key::Char('C')), Some(Command::ConnectorMode));
        assert_eq!(ShortcutRegistry::lookup(Key::Escape), Some(Command::Cancel));
        assert_eq!(ShortcutRegistry::lookup(Key::Char('Q')), None);
    }

    #[test]
    fn test_keys_are_unique() {
        let all = ShortcutRegistry::all();
        for (i, a) in all.iter().enumerate() {
            assert!(all[i + 1..].iter().all(|b| b.key != a.key), "duplicate key {}", a.label);
        }
    }
}
