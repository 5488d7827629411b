//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Keys reach
//! this map only after the active tool declined them, so tool-local keys
//! (arrows, Delete, Enter while typing) never show up here.
//!
//! Conventions:
//! - single letters switch tools
//! - Space hold = temporary hand tool
//! - ⌘/Ctrl combos edit history and selection

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    ToolSelect,
    ToolPen,
    ToolShape,
    ToolHand,
    ToolText,

    // ── Edit ──
    Undo,
    Redo,
    SelectAll,
    Deselect,

    // ── View ──
    ZoomIn,
    ZoomOut,
    /// Space pressed: push the temporary hand tool.
    PanStart,
}

impl ShortcutAction {
    /// Tool id for tool-switching actions.
    pub fn tool_id(self) -> Option<&'static str> {
        match self {
            ShortcutAction::ToolSelect => Some("select"),
            ShortcutAction::ToolPen => Some("pen"),
            ShortcutAction::ToolShape => Some("shape"),
            ShortcutAction::ToolHand => Some("hand"),
            ShortcutAction::ToolText => Some("text"),
            _ => None,
        }
    }
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `" "`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                _ => None,
            };
        }

        // Shift+= arrives as "+".
        if shift {
            return match key {
                "+" => Some(ShortcutAction::ZoomIn),
                _ => None,
            };
        }

        // ── Single keys (no modifiers) ──
        match key {
            "v" | "V" => Some(ShortcutAction::ToolSelect),
            "p" | "P" => Some(ShortcutAction::ToolPen),
            "s" | "S" | "r" | "R" => Some(ShortcutAction::ToolShape),
            "h" | "H" => Some(ShortcutAction::ToolHand),
            "t" | "T" => Some(ShortcutAction::ToolText),
            "+" | "=" => Some(ShortcutAction::ZoomIn),
            "-" => Some(ShortcutAction::ZoomOut),
            "Escape" => Some(ShortcutAction::Deselect),
            " " => Some(ShortcutAction::PanStart),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_tool_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("v", false, false, false, false),
            Some(ShortcutAction::ToolSelect)
        );
        assert_eq!(
            ShortcutMap::resolve("p", false, false, false, false),
            Some(ShortcutAction::ToolPen)
        );
        assert_eq!(
            ShortcutMap::resolve("r", false, false, false, false),
            Some(ShortcutAction::ToolShape)
        );
        assert_eq!(
            ShortcutMap::resolve("s", false, false, false, false),
            Some(ShortcutAction::ToolShape)
        );
        assert_eq!(
            ShortcutMap::resolve("h", false, false, false, false),
            Some(ShortcutAction::ToolHand)
        );
        assert_eq!(
            ShortcutMap::resolve("t", false, false, false, false),
            Some(ShortcutAction::ToolText)
        );
        assert_eq!(ShortcutAction::ToolShape.tool_id(), Some("shape"));
        assert_eq!(ShortcutAction::Undo.tool_id(), None);
    }

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", false, false, false, true),
            Some(ShortcutAction::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        // Cmd+Shift+Z → Redo
        assert_eq!(
            ShortcutMap::resolve("Z", false, true, false, true),
            Some(ShortcutAction::Redo)
        );
        // Ctrl+Y → Redo
        assert_eq!(
            ShortcutMap::resolve("y", true, false, false, false),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_select_all() {
        assert_eq!(
            ShortcutMap::resolve("a", true, false, false, false),
            Some(ShortcutAction::SelectAll)
        );
        assert_eq!(ShortcutMap::resolve("a", false, false, false, false), None);
    }

    #[test]
    fn resolve_zoom() {
        assert_eq!(
            ShortcutMap::resolve("+", false, true, false, false),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("=", false, false, false, true),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("-", false, false, false, false),
            Some(ShortcutAction::ZoomOut)
        );
    }

    #[test]
    fn resolve_escape_and_space() {
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Deselect)
        );
        assert_eq!(
            ShortcutMap::resolve(" ", false, false, false, false),
            Some(ShortcutAction::PanStart)
        );
    }

    #[test]
    fn resolve_unknown_key() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("v", false, false, false, true), None);
    }
}
