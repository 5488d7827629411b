//! The editing context tools operate on.
//!
//! [`Editor`] bundles the glyph, selection, viewport, command history and
//! the signals the rendering layer observes. Behaviors read it while
//! computing transitions; document effects are applied afterwards through
//! [`Editor::apply`], one [`ToolAction`] at a time.

use crate::commands::CommandStack;
use crate::config::EditorConfig;
use crate::error::EditError;
use crate::selection::{SegmentRef, Selection};
use crate::signal::Signal;
use crate::tools::{Cursor, ToolAction, ToolStateInfo};
use crate::viewport::Viewport;
use glyph_core::hit::{self, Hit};
use glyph_core::{Glyph, PointId};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// A committed run of text placed by the text tool. Layout is external.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub origin: Point,
    pub text: String,
}

/// How a selection action combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    Replace,
    Add,
    Toggle,
}

/// Observable cells published to the rendering layer.
#[derive(Debug, Clone, Default)]
pub struct EditorSignals {
    pub active_tool_state: Signal<ToolStateInfo>,
    pub cursor: Signal<Cursor>,
    pub hover: Signal<Option<Hit>>,
}

#[derive(Debug)]
pub struct Editor {
    pub glyph: Glyph,
    pub selection: Selection,
    pub viewport: Viewport,
    pub commands: CommandStack,
    pub config: EditorConfig,
    pub signals: EditorSignals,
    pub text_runs: Vec<TextRun>,
    below_handles_redraws: u64,
}

impl Editor {
    pub fn new(glyph: Glyph, config: EditorConfig) -> Self {
        Self {
            glyph,
            selection: Selection::default(),
            viewport: Viewport::default(),
            commands: CommandStack::new(config.undo_depth),
            config,
            signals: EditorSignals::default(),
            text_runs: Vec::new(),
            below_handles_redraws: 0,
        }
    }

    // ─── Geometry helpers ────────────────────────────────────────────────

    /// Hit radius in scene units at the current zoom.
    pub fn hit_radius(&self) -> f64 {
        self.viewport.hit_radius(self.config.hit_radius_px)
    }

    /// Scene units per screen pixel.
    pub fn px(&self) -> f64 {
        self.viewport.scene_distance(1.0)
    }

    /// Point or anchor first, then segment.
    pub fn hit_test(&self, pos: Point) -> Option<Hit> {
        let radius = self.hit_radius();
        hit::node_at(&self.glyph, pos, radius).or_else(|| hit::segment_at(&self.glyph, pos, radius))
    }

    pub fn point_at(&self, pos: Point) -> Option<Hit> {
        hit::point_at(&self.glyph, pos, self.hit_radius())
    }

    pub fn segment_at(&self, pos: Point) -> Option<Hit> {
        hit::segment_at(&self.glyph, pos, self.hit_radius())
    }

    pub fn contour_endpoint_at(&self, pos: Point) -> Option<Hit> {
        hit::contour_endpoint_at(&self.glyph, pos, self.hit_radius())
    }

    /// Bounding box of the selected points.
    pub fn selection_bounds(&self) -> Option<kurbo::Rect> {
        self.glyph.bounds_of(self.selection.points())
    }

    // ─── Hover & redraw ──────────────────────────────────────────────────

    /// Recompute the hovered entity. Publishes only on change.
    pub fn update_hover(&mut self, pos: Point) {
        let hover = self.hit_test(pos);
        let changed = self.signals.hover.with(|current| *current != hover);
        if changed {
            self.signals.hover.set(hover);
        }
    }

    pub fn hover(&self) -> Option<Hit> {
        self.signals.hover.get()
    }

    pub fn request_redraw_below_handles(&mut self) {
        self.below_handles_redraws += 1;
    }

    pub fn below_handles_redraws(&self) -> u64 {
        self.below_handles_redraws
    }

    // ─── Actions ─────────────────────────────────────────────────────────

    /// Apply one tool action to the document, selection or view.
    pub fn apply(&mut self, action: ToolAction) -> Result<(), EditError> {
        match action {
            ToolAction::BeginPreview => self.commands.begin_preview(&self.glyph)?,
            ToolAction::SetPositions(positions) => self.glyph.set_positions(&positions)?,
            ToolAction::CommitPreview(label) => {
                self.commands.commit_preview(label, &self.glyph)?;
            }
            ToolAction::CancelPreview => {
                self.commands.cancel_preview(&mut self.glyph)?;
                self.selection.retain_existing(&self.glyph);
            }
            ToolAction::Execute(command) => {
                self.commands.execute(&mut self.glyph, command)?;
                self.selection.retain_existing(&self.glyph);
            }
            ToolAction::SelectPoints { ids, mode } => self.select_points(ids, mode),
            ToolAction::SelectSegment { segment, mode } => self.select_segment(segment, mode),
            ToolAction::ClearSelection => self.selection.clear(),
            ToolAction::Pan(delta) => self.pan(delta),
            ToolAction::InsertText(run) => {
                if !run.text.is_empty() {
                    self.text_runs.push(run);
                }
            }
        }
        Ok(())
    }

    fn select_points(&mut self, ids: Vec<PointId>, mode: SelectMode) {
        match mode {
            SelectMode::Replace => self.selection.set_points(ids),
            SelectMode::Add => self.selection.add_points(ids),
            SelectMode::Toggle => {
                for id in ids {
                    self.selection.toggle_point(id);
                }
            }
        }
    }

    fn select_segment(&mut self, segment: SegmentRef, mode: SelectMode) {
        match mode {
            SelectMode::Replace => {
                self.selection.set_points([segment.start, segment.end]);
                self.selection.set_segments([segment]);
            }
            SelectMode::Add => {
                self.selection.add_points([segment.start, segment.end]);
                let mut segments = self.selection.segments().clone();
                segments.insert(segment);
                self.selection.set_segments(segments);
            }
            SelectMode::Toggle => {
                if self.selection.toggle_segment(segment) {
                    self.selection.add_points([segment.start, segment.end]);
                } else {
                    self.selection.toggle_point(segment.start);
                    self.selection.toggle_point(segment.end);
                }
            }
        }
    }

    /// Pan the view by a screen-space delta.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.viewport.pan_by(screen_delta);
    }

    pub fn select_all(&mut self) {
        let ids: Vec<PointId> = self.glyph.points().map(|p| p.id).collect();
        self.selection.set_points(ids);
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Result<Option<String>, EditError> {
        let label = self.commands.undo(&mut self.glyph)?;
        self.selection.retain_existing(&self.glyph);
        Ok(label)
    }

    pub fn redo(&mut self) -> Result<Option<String>, EditError> {
        let label = self.commands.redo(&mut self.glyph)?;
        self.selection.retain_existing(&self.glyph);
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::AddPoint;
    use glyph_core::{ContourId, GlyphPoint};

    fn editor() -> (Editor, PointId) {
        let mut glyph = Glyph::new("i", Some(0x69), 300.0);
        let cid = ContourId::fresh();
        glyph.add_contour(cid);
        let p = GlyphPoint::on_curve(Point::new(10.0, 10.0));
        let id = p.id;
        glyph.add_point(cid, p).unwrap();
        (Editor::new(glyph, EditorConfig::default()), id)
    }

    #[test]
    fn hover_publishes_only_on_change() {
        let (mut editor, id) = editor();
        editor.update_hover(Point::new(11.0, 10.0));
        assert_eq!(editor.hover().and_then(|h| h.point_id()), Some(id));
        let version = editor.signals.hover.version();
        editor.update_hover(Point::new(10.5, 10.0));
        assert_eq!(editor.signals.hover.version(), version);
        editor.update_hover(Point::new(200.0, 200.0));
        assert_eq!(editor.hover(), None);
    }

    #[test]
    fn execute_action_is_undoable() {
        let (mut editor, _) = editor();
        let contour = editor.glyph.contours[0].id;
        let point = GlyphPoint::on_curve(Point::new(50.0, 0.0));
        editor
            .apply(ToolAction::Execute(Box::new(AddPoint { contour, point })))
            .unwrap();
        assert_eq!(editor.glyph.point_count(), 2);
        assert_eq!(editor.undo().unwrap(), Some("Add Point".into()));
        assert_eq!(editor.glyph.point_count(), 1);
    }

    #[test]
    fn undo_prunes_stale_selection() {
        let (mut editor, _) = editor();
        let contour = editor.glyph.contours[0].id;
        let point = GlyphPoint::on_curve(Point::new(50.0, 0.0));
        let new_id = point.id;
        editor
            .apply(ToolAction::Execute(Box::new(AddPoint { contour, point })))
            .unwrap();
        editor.selection.set_points([new_id]);
        editor.undo().unwrap();
        assert!(editor.selection.is_empty());
    }

    #[test]
    fn empty_text_runs_are_dropped() {
        let (mut editor, _) = editor();
        editor
            .apply(ToolAction::InsertText(TextRun {
                origin: Point::ZERO,
                text: String::new(),
            }))
            .unwrap();
        assert!(editor.text_runs.is_empty());
    }
}
