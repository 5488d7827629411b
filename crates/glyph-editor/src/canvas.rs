//! Host-facing canvas controller.
//!
//! Owns the [`Editor`] and the [`ToolManager`]. Every interaction from the
//! host (pointer, wheel, keyboard, frames) goes through this struct; it
//! resolves shortcuts for keys the active tool declines and drives the
//! hold-Space temporary hand tool.

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::input::{GestureRecognizer, KeyEvent, Modifiers};
use crate::manager::{TemporaryOptions, ToolManager};
use crate::overlay::Overlay;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::ToolId;
use glyph_core::Glyph;
use kurbo::{Point, Size, Vec2};

pub struct GlyphCanvas {
    editor: Editor,
    tools: ToolManager,
    /// Last pointer sample, replayed after wheel pans and zooms.
    pointer: Option<(Point, Modifiers)>,
}

impl GlyphCanvas {
    /// Create a canvas controller with the select tool active.
    pub fn new(glyph: Glyph, config: EditorConfig) -> Self {
        let recognizer = GestureRecognizer::new(config.gesture.clone());
        let mut editor = Editor::new(glyph, config);
        let mut tools = ToolManager::with_default_tools(recognizer);
        tools.activate("select", &mut editor);
        Self {
            editor,
            tools,
            pointer: None,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn glyph(&self) -> &Glyph {
        &self.editor.glyph
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.editor.viewport.resize(Size::new(width, height));
    }

    // ─── Tools ───────────────────────────────────────────────────────────

    pub fn set_tool(&mut self, name: &str) {
        self.tools.activate(name, &mut self.editor);
    }

    /// Active tool name, or an empty string before activation.
    pub fn tool_name(&self) -> String {
        self.tools
            .active_tool_id()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn active_tool_id(&self) -> Option<ToolId> {
        self.tools.active_tool_id()
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    pub fn handle_pointer_down(&mut self, x: f64, y: f64, modifiers: Modifiers) {
        let screen = Point::new(x, y);
        self.pointer = Some((screen, modifiers));
        self.tools.pointer_down(screen, modifiers, &mut self.editor);
    }

    /// Returns `true` if the host should schedule an animation frame.
    pub fn handle_pointer_move(&mut self, x: f64, y: f64, modifiers: Modifiers) -> bool {
        let screen = Point::new(x, y);
        self.pointer = Some((screen, modifiers));
        self.tools.handle_pointer_move(screen, modifiers, false)
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64) {
        self.tools.pointer_up(Point::new(x, y), &mut self.editor);
    }

    /// Run the pending pointer-move flush.
    pub fn animation_frame(&mut self) {
        self.tools.on_animation_frame(&mut self.editor);
    }

    /// Wheel: pan by the scroll delta, or zoom about the pointer when
    /// `zoom` is set. Returns `true` if a frame is needed to refresh hover.
    pub fn handle_wheel(&mut self, dx: f64, dy: f64, zoom: bool) -> bool {
        if zoom {
            let anchor = self
                .pointer
                .map(|(p, _)| p)
                .unwrap_or_else(|| viewport_centre(self.editor.viewport.size()));
            let factor = if dy < 0.0 {
                self.editor.config.zoom.step
            } else {
                1.0 / self.editor.config.zoom.step
            };
            let editor = &mut self.editor;
            editor.viewport.zoom_at(factor, anchor, &editor.config.zoom);
        } else {
            self.editor.pan(Vec2::new(-dx, -dy));
        }
        // The scene under a still pointer changed.
        match self.pointer {
            Some((screen, modifiers)) => self.tools.handle_pointer_move(screen, modifiers, true),
            None => false,
        }
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Offer the key to the active tool, then to the shortcut map.
    /// Returns the shortcut that ran, if any.
    pub fn handle_key_down(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let event = KeyEvent::new(key, modifiers);
        if self.tools.key_down(event, &mut self.editor) {
            return None;
        }
        let action = ShortcutMap::resolve(
            key,
            modifiers.ctrl,
            modifiers.shift,
            modifiers.alt,
            modifiers.meta,
        )?;
        self.dispatch_action(action);
        Some(action)
    }

    pub fn handle_key_up(&mut self, key: &str, modifiers: Modifiers) -> bool {
        if key == " " && self.tools.has_temporary() {
            self.tools.return_from_temporary(&mut self.editor);
            return true;
        }
        self.tools
            .key_up(KeyEvent::new(key, modifiers), &mut self.editor)
    }

    fn dispatch_action(&mut self, action: ShortcutAction) {
        log::debug!("shortcut: {action:?}");
        if let Some(tool) = action.tool_id() {
            self.set_tool(tool);
            return;
        }
        match action {
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::SelectAll => {
                self.editor.select_all();
                self.tools.notify_selection_changed(&mut self.editor);
            }
            ShortcutAction::Deselect => {
                if !self.editor.selection.is_empty() {
                    self.editor.selection.clear();
                    self.tools.notify_selection_changed(&mut self.editor);
                }
            }
            ShortcutAction::ZoomIn | ShortcutAction::ZoomOut => {
                let step = self.editor.config.zoom.step;
                let factor = if action == ShortcutAction::ZoomIn {
                    step
                } else {
                    1.0 / step
                };
                let editor = &mut self.editor;
                editor.viewport.zoom_by(factor, &editor.config.zoom);
            }
            ShortcutAction::PanStart => {
                self.tools
                    .request_temporary("hand", TemporaryOptions::default(), &mut self.editor);
            }
            ShortcutAction::ToolSelect
            | ShortcutAction::ToolPen
            | ShortcutAction::ToolShape
            | ShortcutAction::ToolHand
            | ShortcutAction::ToolText => {}
        }
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Undo the last action. Returns `false` if there was nothing to undo
    /// or a drag is in progress.
    pub fn undo(&mut self) -> bool {
        match self.editor.undo() {
            Ok(label) => {
                if let Some(label) = &label {
                    log::debug!("undo: {label}");
                    self.tools.notify_selection_changed(&mut self.editor);
                }
                label.is_some()
            }
            Err(e) => {
                log::warn!("undo refused: {e}");
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.editor.redo() {
            Ok(label) => {
                if let Some(label) = &label {
                    log::debug!("redo: {label}");
                    self.tools.notify_selection_changed(&mut self.editor);
                }
                label.is_some()
            }
            Err(e) => {
                log::warn!("redo refused: {e}");
                false
            }
        }
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Tool overlay for this frame: below-handles items first.
    pub fn overlay(&self) -> Overlay {
        let mut overlay = Overlay::default();
        self.tools.render_below_handles(&self.editor, &mut overlay);
        self.tools.render(&self.editor, &mut overlay);
        overlay
    }

    /// Selected point ids as strings.
    pub fn selected_point_ids(&self) -> Vec<String> {
        self.editor
            .selection
            .points()
            .iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }

    pub fn glyph_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.editor.glyph)
    }

    pub fn destroy(&mut self) {
        self.tools.destroy(&mut self.editor);
    }
}

fn viewport_centre(size: Size) -> Point {
    Point::new(size.width / 2.0, size.height / 2.0)
}
