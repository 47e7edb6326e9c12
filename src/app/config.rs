use gtk::gdk;
use gtk4 as gtk;
use std::collections::HashMap;

use crate::editor::selection::HANDLE_SIZE;
use crate::editor::tools::{Pen, ToolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Copy,
    Save,
    Undo,
    Redo,
    SelectAll,
    Cancel,
    Tool(ToolKind),
    FlipHorizontal,
    FlipVertical,
    PenWidthDown,
    PenWidthUp,
}

impl Action {
    pub fn label(&self) -> &str {
        match self {
            Action::Copy => "Copy to Clipboard",
            Action::Save => "Save to File",
            Action::Undo => "Undo",
            Action::Redo => "Redo",
            Action::SelectAll => "Select All",
            Action::Cancel => "Cancel / Exit",
            Action::Tool(tool) => tool.tooltip(),
            Action::FlipHorizontal => "Flip Horizontally",
            Action::FlipVertical => "Flip Vertically",
            Action::PenWidthDown => "Thinner Pen",
            Action::PenWidthUp => "Thicker Pen",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shortcut {
    pub key: gdk::Key,
    pub modifiers: gdk::ModifierType,
}

impl Shortcut {
    pub fn new(key: gdk::Key, modifiers: gdk::ModifierType) -> Self {
        Self { key, modifiers }
    }

    fn plain(key: gdk::Key) -> Self {
        Self::new(key, gdk::ModifierType::empty())
    }

    fn ctrl(key: gdk::Key) -> Self {
        Self::new(key, gdk::ModifierType::CONTROL_MASK)
    }
}

#[derive(Debug, Clone)]
pub struct ShortcutConfig {
    bindings: HashMap<Action, Vec<Shortcut>>,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        let ctrl_shift = gdk::ModifierType::CONTROL_MASK | gdk::ModifierType::SHIFT_MASK;
        let mut bindings = HashMap::new();

        // Standard Actions
        bindings.insert(Action::Copy, vec![Shortcut::ctrl(gdk::Key::c)]);
        bindings.insert(Action::Save, vec![Shortcut::ctrl(gdk::Key::s)]);
        bindings.insert(Action::Undo, vec![Shortcut::ctrl(gdk::Key::z)]);
        bindings.insert(
            Action::Redo,
            vec![
                Shortcut::new(gdk::Key::z, ctrl_shift),
                Shortcut::ctrl(gdk::Key::y),
            ],
        );
        bindings.insert(Action::SelectAll, vec![Shortcut::ctrl(gdk::Key::a)]);
        bindings.insert(Action::Cancel, vec![Shortcut::plain(gdk::Key::Escape)]);

        // Tool Switching
        for (tool, key) in [
            (ToolKind::Cursor, gdk::Key::v),
            (ToolKind::Freehand, gdk::Key::b),
            (ToolKind::Line, gdk::Key::l),
            (ToolKind::Arrow, gdk::Key::a),
            (ToolKind::Rectangle, gdk::Key::r),
            (ToolKind::Ellipse, gdk::Key::e),
            (ToolKind::Text, gdk::Key::t),
        ] {
            bindings.insert(Action::Tool(tool), vec![Shortcut::plain(key)]);
        }

        // Effects and pen
        bindings.insert(Action::FlipHorizontal, vec![Shortcut::plain(gdk::Key::h)]);
        bindings.insert(
            Action::FlipVertical,
            vec![Shortcut::new(gdk::Key::h, gdk::ModifierType::SHIFT_MASK)],
        );
        bindings.insert(
            Action::PenWidthDown,
            vec![Shortcut::plain(gdk::Key::bracketleft)],
        );
        bindings.insert(
            Action::PenWidthUp,
            vec![Shortcut::plain(gdk::Key::bracketright)],
        );

        Self { bindings }
    }
}

impl ShortcutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_action(&self, key: gdk::Key, modifiers: gdk::ModifierType) -> Option<Action> {
        // Filter out irrelevant modifiers like NumLock/CapsLock/ScrollLock
        let mask = gdk::ModifierType::CONTROL_MASK
            | gdk::ModifierType::SHIFT_MASK
            | gdk::ModifierType::ALT_MASK
            | gdk::ModifierType::SUPER_MASK
            | gdk::ModifierType::META_MASK;

        let clean_mods = modifiers & mask;
        // Shift reports the upper-case keyval
        let key = key.to_lower();

        self.bindings.iter().find_map(|(action, shortcuts)| {
            shortcuts
                .iter()
                .any(|sc| sc.key == key && sc.modifiers == clean_mods)
                .then_some(*action)
        })
    }

    pub fn get_shortcut_label(&self, action: Action) -> String {
        self.bindings
            .get(&action)
            .map(|shortcuts| {
                shortcuts
                    .iter()
                    .map(|sc| gtk::accelerator_get_label(sc.key, sc.modifiers).to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }

    /// Rebinds `action` to a single shortcut, dropping any other binding
    /// that used the same key combination.
    pub fn set_shortcut(&mut self, action: Action, key: gdk::Key, modifiers: gdk::ModifierType) {
        let shortcut = Shortcut::new(key.to_lower(), modifiers);
        for shortcuts in self.bindings.values_mut() {
            shortcuts.retain(|sc| *sc != shortcut);
        }
        self.bindings.insert(action, vec![shortcut]);
    }
}

/// Start-of-session appearance of the editor.
#[derive(Debug, Clone)]
pub struct EditorDefaults {
    pub pen_width: f64,
    pub font_size: f64,
    pub color: gdk::RGBA,
    pub handle_size: f64,
    pub border_width: f64,
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            pen_width: 4.0,
            font_size: 24.0,
            color: gdk::RGBA::new(1.0, 0.0, 0.0, 1.0),
            handle_size: HANDLE_SIZE,
            border_width: 1.0,
        }
    }
}

impl EditorDefaults {
    pub fn pen(&self) -> Pen {
        let mut pen = Pen {
            color: self.color,
            ..Pen::default()
        };
        pen.set_width(self.pen_width);
        pen.set_font_size(self.font_size);
        pen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let config = ShortcutConfig::new();
        let ctrl = gdk::ModifierType::CONTROL_MASK;

        assert_eq!(config.get_action(gdk::Key::c, ctrl), Some(Action::Copy));
        assert_eq!(config.get_action(gdk::Key::s, ctrl), Some(Action::Save));
        assert_eq!(config.get_action(gdk::Key::a, ctrl), Some(Action::SelectAll));
        assert_eq!(
            config.get_action(gdk::Key::a, gdk::ModifierType::empty()),
            Some(Action::Tool(ToolKind::Arrow))
        );
        assert_eq!(
            config.get_action(gdk::Key::Escape, gdk::ModifierType::empty()),
            Some(Action::Cancel)
        );
    }

    #[test]
    fn test_redo_has_two_bindings() {
        let config = ShortcutConfig::new();
        let ctrl = gdk::ModifierType::CONTROL_MASK;

        assert_eq!(config.get_action(gdk::Key::y, ctrl), Some(Action::Redo));
        assert_eq!(
            config.get_action(gdk::Key::Z, ctrl | gdk::ModifierType::SHIFT_MASK),
            Some(Action::Redo)
        );
        assert_eq!(config.get_action(gdk::Key::z, ctrl), Some(Action::Undo));
    }

    #[test]
    fn test_lock_modifiers_are_ignored() {
        let config = ShortcutConfig::new();
        let mods = gdk::ModifierType::CONTROL_MASK | gdk::ModifierType::LOCK_MASK;
        assert_eq!(config.get_action(gdk::Key::c, mods), Some(Action::Copy));
    }

    #[test]
    fn test_shift_h_flips_vertically() {
        let config = ShortcutConfig::new();
        assert_eq!(
            config.get_action(gdk::Key::H, gdk::ModifierType::SHIFT_MASK),
            Some(Action::FlipVertical)
        );
        assert_eq!(
            config.get_action(gdk::Key::h, gdk::ModifierType::empty()),
            Some(Action::FlipHorizontal)
        );
    }

    #[test]
    fn test_set_shortcut_steals_combination() {
        let mut config = ShortcutConfig::new();
        config.set_shortcut(Action::Save, gdk::Key::c, gdk::ModifierType::CONTROL_MASK);

        assert_eq!(
            config.get_action(gdk::Key::c, gdk::ModifierType::CONTROL_MASK),
            Some(Action::Save)
        );
        assert_eq!(
            config.get_action(gdk::Key::s, gdk::ModifierType::CONTROL_MASK),
            None
        );
    }

    #[test]
    fn test_editor_defaults_pen() {
        let pen = EditorDefaults::default().pen();
        assert_eq!(pen.width, 4.0);
        assert_eq!(pen.font_size, 24.0);
        assert_eq!(pen.color.red(), 1.0);
    }
}
