//! Undo/Redo command stack and preview transactions.
//!
//! Every permanent mutation is a reversible [`Command`] pushed onto a
//! linear history. Two grouping mechanisms sit on top:
//!
//! - **Preview transactions** (`begin_preview` / `commit_preview` /
//!   `cancel_preview`): drag gestures mutate the glyph live; the glyph is
//!   snapshotted at the start and the end, so undo/redo replaces the whole
//!   glyph in a single step. Cancel restores the start snapshot verbatim.
//! - **Batches** (`begin_batch` / `end_batch`): commands executed while a
//!   batch is open are collected into one [`CompositeCommand`].

use crate::error::EditError;
use glyph_core::{ContourId, Glyph, GlyphError, GlyphPoint, PointId};
use kurbo::Point;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A reversible edit. `undo` after `execute` must restore the exact prior
/// state of everything the command touched.
pub trait Command: fmt::Debug {
    /// Label shown in the undo menu.
    fn name(&self) -> &str;

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError>;

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError>;

    fn redo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        self.execute(glyph)
    }
}

// ─── Contour commands ────────────────────────────────────────────────────

/// Append an empty contour and make it active.
#[derive(Debug, Clone)]
pub struct AddContour {
    pub id: ContourId,
    previous_active: Option<ContourId>,
}

impl AddContour {
    pub fn new(id: ContourId) -> Self {
        Self {
            id,
            previous_active: None,
        }
    }
}

impl Command for AddContour {
    fn name(&self) -> &str {
        "Add Contour"
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        self.previous_active = glyph.active_contour;
        glyph.add_contour(self.id);
        Ok(())
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        glyph
            .remove_contour(self.id)
            .ok_or(GlyphError::UnknownContour(self.id))?;
        glyph.active_contour = self.previous_active;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CloseContour {
    pub id: ContourId,
}

impl Command for CloseContour {
    fn name(&self) -> &str {
        "Close Contour"
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        glyph.close_contour(self.id)
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        glyph.open_contour(self.id)
    }
}

/// Reverse point order. Reversal is its own inverse.
#[derive(Debug, Clone)]
pub struct ReverseContour {
    pub id: ContourId,
}

impl Command for ReverseContour {
    fn name(&self) -> &str {
        "Reverse Contour"
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        glyph.reverse_contour(self.id)
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        glyph.reverse_contour(self.id)
    }
}

#[derive(Debug, Clone)]
pub struct SetActiveContour {
    pub id: Option<ContourId>,
    previous: Option<ContourId>,
}

impl SetActiveContour {
    pub fn new(id: Option<ContourId>) -> Self {
        Self { id, previous: None }
    }
}

impl Command for SetActiveContour {
    fn name(&self) -> &str {
        "Set Active Contour"
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        self.previous = glyph.active_contour;
        glyph.set_active_contour(self.id)
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        glyph.active_contour = self.previous;
        Ok(())
    }
}

// ─── Point commands ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AddPoint {
    pub contour: ContourId,
    pub point: GlyphPoint,
}

impl Command for AddPoint {
    fn name(&self) -> &str {
        "Add Point"
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        glyph.add_point(self.contour, self.point)
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        // Not `remove_points`: an emptied contour must survive for the
        // `AddContour` undo that follows.
        let contour = glyph
            .contour_mut(self.contour)
            .ok_or(GlyphError::UnknownContour(self.contour))?;
        contour.points.retain(|p| p.id != self.point.id);
        Ok(())
    }
}

/// Move points between two sets of absolute positions.
#[derive(Debug, Clone)]
pub struct SetPositions {
    pub label: String,
    pub before: Vec<(PointId, Point)>,
    pub after: Vec<(PointId, Point)>,
}

impl SetPositions {
    /// Capture `before` from the glyph for every point in `after`.
    pub fn capture(
        label: impl Into<String>,
        glyph: &Glyph,
        after: Vec<(PointId, Point)>,
    ) -> Result<Self, GlyphError> {
        let before = after
            .iter()
            .map(|(id, _)| {
                glyph
                    .point(*id)
                    .map(|p| (*id, p.pos))
                    .ok_or(GlyphError::UnknownPoint(*id))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            label: label.into(),
            before,
            after,
        })
    }
}

impl Command for SetPositions {
    fn name(&self) -> &str {
        &self.label
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        glyph.set_positions(&self.after)
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        glyph.set_positions(&self.before)
    }
}

#[derive(Debug, Clone)]
pub struct ToggleSmooth {
    pub id: PointId,
    toggled: bool,
}

impl ToggleSmooth {
    pub fn new(id: PointId) -> Self {
        Self { id, toggled: false }
    }
}

impl Command for ToggleSmooth {
    fn name(&self) -> &str {
        "Toggle Smooth"
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        self.toggled = glyph.toggle_smooth(self.id)?;
        Ok(())
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        if self.toggled {
            glyph.toggle_smooth(self.id)?;
        }
        Ok(())
    }
}

/// Delete points. Undo restores the whole glyph, since removal may also
/// drop emptied contours.
#[derive(Debug, Clone)]
pub struct RemovePoints {
    pub ids: HashSet<PointId>,
    before: Option<Glyph>,
}

impl RemovePoints {
    pub fn new(ids: impl IntoIterator<Item = PointId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            before: None,
        }
    }
}

impl Command for RemovePoints {
    fn name(&self) -> &str {
        "Delete Points"
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        self.before = Some(glyph.clone());
        glyph.remove_points(&self.ids);
        Ok(())
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        if let Some(before) = &self.before {
            *glyph = before.clone();
        }
        Ok(())
    }
}

/// Duplicate every contour touching `source`, with ids decided up front.
#[derive(Debug, Clone)]
pub struct DuplicateContours {
    pub source: HashSet<PointId>,
    pub point_ids: HashMap<PointId, PointId>,
    pub contour_ids: HashMap<ContourId, ContourId>,
}

impl DuplicateContours {
    /// Allocate fresh ids for every point of every contour touching `source`.
    pub fn plan(glyph: &Glyph, source: HashSet<PointId>) -> Self {
        let mut point_ids = HashMap::new();
        let mut contour_ids = HashMap::new();
        for contour in &glyph.contours {
            if !contour.points.iter().any(|p| source.contains(&p.id)) {
                continue;
            }
            contour_ids.insert(contour.id, ContourId::fresh());
            for p in &contour.points {
                point_ids.insert(p.id, PointId::fresh());
            }
        }
        Self {
            source,
            point_ids,
            contour_ids,
        }
    }

    /// New ids of the source points themselves.
    pub fn copies_of_source(&self) -> Vec<PointId> {
        let mut ids: Vec<PointId> = self
            .source
            .iter()
            .filter_map(|id| self.point_ids.get(id).copied())
            .collect();
        ids.sort();
        ids
    }
}

impl Command for DuplicateContours {
    fn name(&self) -> &str {
        "Duplicate"
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        let points = &self.point_ids;
        let contours = &self.contour_ids;
        glyph.duplicate_contours_of(
            &self.source,
            |old| points.get(&old).copied().unwrap_or_else(PointId::fresh),
            |old| contours.get(&old).copied().unwrap_or_else(ContourId::fresh),
        );
        Ok(())
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        for id in self.contour_ids.values() {
            glyph.remove_contour(*id);
        }
        Ok(())
    }
}

// ─── Grouping ────────────────────────────────────────────────────────────

/// Whole-glyph before/after pair, produced by committing a preview.
#[derive(Debug, Clone)]
pub struct SnapshotCommand {
    pub label: String,
    pub before: Glyph,
    pub after: Glyph,
}

impl Command for SnapshotCommand {
    fn name(&self) -> &str {
        &self.label
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        *glyph = self.after.clone();
        Ok(())
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        *glyph = self.before.clone();
        Ok(())
    }
}

/// Ordered sub-commands that undo/redo as one step.
#[derive(Debug)]
pub struct CompositeCommand {
    pub label: String,
    pub commands: Vec<Box<dyn Command>>,
}

impl CompositeCommand {
    pub fn new(label: impl Into<String>, commands: Vec<Box<dyn Command>>) -> Self {
        Self {
            label: label.into(),
            commands,
        }
    }
}

impl Command for CompositeCommand {
    fn name(&self) -> &str {
        &self.label
    }

    fn execute(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        for i in 0..self.commands.len() {
            if let Err(e) = self.commands[i].execute(glyph) {
                // Roll back what already ran so the glyph is untouched.
                for done in self.commands[..i].iter_mut().rev() {
                    if let Err(undo_err) = done.undo(glyph) {
                        log::error!(
                            "{}: rollback of {:?} failed: {undo_err}",
                            self.label,
                            done.name()
                        );
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn undo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        for command in self.commands.iter_mut().rev() {
            command.undo(glyph)?;
        }
        Ok(())
    }

    fn redo(&mut self, glyph: &mut Glyph) -> Result<(), GlyphError> {
        for command in &mut self.commands {
            command.redo(glyph)?;
        }
        Ok(())
    }
}

// ─── Stack ───────────────────────────────────────────────────────────────

/// Manages undo/redo history, preview transactions and batches.
pub struct CommandStack {
    undo_stack: Vec<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Glyph captured by `begin_preview`. `Some` while a preview is open.
    preview_baseline: Option<Glyph>,
    /// Commands collected since `begin_batch`.
    batch: Option<Vec<Box<dyn Command>>>,
}

impl fmt::Debug for CommandStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandStack")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("preview_open", &self.preview_baseline.is_some())
            .field("batch_open", &self.batch.is_some())
            .finish()
    }
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(200)
    }
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            preview_baseline: None,
            batch: None,
        }
    }

    /// Execute a command and record it.
    ///
    /// Inside a preview the command applies live but is not recorded: the
    /// preview commit captures its effect. Inside a batch it is collected.
    pub fn execute(
        &mut self,
        glyph: &mut Glyph,
        mut command: Box<dyn Command>,
    ) -> Result<(), EditError> {
        command.execute(glyph)?;
        if self.preview_baseline.is_some() {
            log::trace!("preview: applied {:?} live", command.name());
            return Ok(());
        }
        self.push(command);
        Ok(())
    }

    fn push(&mut self, command: Box<dyn Command>) {
        if let Some(batch) = &mut self.batch {
            batch.push(command);
            return;
        }
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Undo the last command. Returns its label.
    pub fn undo(&mut self, glyph: &mut Glyph) -> Result<Option<String>, EditError> {
        if self.preview_baseline.is_some() {
            return Err(EditError::PreviewInProgress);
        }
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(None);
        };
        if let Err(e) = command.undo(glyph) {
            self.undo_stack.push(command);
            return Err(e.into());
        }
        let label = command.name().to_string();
        log::debug!("undo: {label}");
        self.redo_stack.push(command);
        Ok(Some(label))
    }

    /// Redo the last undone command. Returns its label.
    pub fn redo(&mut self, glyph: &mut Glyph) -> Result<Option<String>, EditError> {
        if self.preview_baseline.is_some() {
            return Err(EditError::PreviewInProgress);
        }
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(None);
        };
        if let Err(e) = command.redo(glyph) {
            self.redo_stack.push(command);
            return Err(e.into());
        }
        let label = command.name().to_string();
        log::debug!("redo: {label}");
        self.undo_stack.push(command);
        Ok(Some(label))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.name())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.name())
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    // ─── Preview transactions ────────────────────────────────────────────

    pub fn is_preview_open(&self) -> bool {
        self.preview_baseline.is_some()
    }

    /// Open a preview, capturing `glyph` as the baseline.
    pub fn begin_preview(&mut self, glyph: &Glyph) -> Result<(), EditError> {
        debug_assert!(
            self.preview_baseline.is_none(),
            "begin_preview: a preview is already open"
        );
        if self.preview_baseline.is_some() {
            log::error!("begin_preview: a preview is already open");
            return Err(EditError::PreviewAlreadyOpen);
        }
        log::debug!("preview: begin");
        self.preview_baseline = Some(glyph.clone());
        Ok(())
    }

    /// Close the preview, recording its net effect as one undo entry.
    ///
    /// Returns `false` (and records nothing) when the glyph is unchanged.
    pub fn commit_preview(
        &mut self,
        label: impl Into<String>,
        glyph: &Glyph,
    ) -> Result<bool, EditError> {
        let before = self
            .preview_baseline
            .take()
            .ok_or(EditError::NoPreviewOpen)?;
        if before == *glyph {
            log::debug!("preview: commit with no change, dropped");
            return Ok(false);
        }
        let label = label.into();
        log::debug!("preview: commit {label:?}");
        self.push(Box::new(SnapshotCommand {
            label,
            before,
            after: glyph.clone(),
        }));
        Ok(true)
    }

    /// Close the preview, restoring the baseline verbatim.
    pub fn cancel_preview(&mut self, glyph: &mut Glyph) -> Result<(), EditError> {
        let before = self
            .preview_baseline
            .take()
            .ok_or(EditError::NoPreviewOpen)?;
        log::debug!("preview: cancel");
        *glyph = before;
        Ok(())
    }

    // ─── Batches ─────────────────────────────────────────────────────────

    pub fn is_batch_open(&self) -> bool {
        self.batch.is_some()
    }

    pub fn begin_batch(&mut self) -> Result<(), EditError> {
        if self.batch.is_some() {
            return Err(EditError::BatchAlreadyOpen);
        }
        self.batch = Some(Vec::new());
        Ok(())
    }

    /// Close the batch. Its commands become one composite undo entry.
    /// An empty batch records nothing and returns `false`.
    pub fn end_batch(&mut self, label: impl Into<String>) -> Result<bool, EditError> {
        let commands = self.batch.take().ok_or(EditError::NoBatchOpen)?;
        if commands.is_empty() {
            return Ok(false);
        }
        self.push(Box::new(CompositeCommand::new(label, commands)));
        Ok(true)
    }

    /// Close the batch, undoing everything it collected.
    pub fn cancel_batch(&mut self, glyph: &mut Glyph) -> Result<(), EditError> {
        let commands = self.batch.take().ok_or(EditError::NoBatchOpen)?;
        for mut command in commands.into_iter().rev() {
            command.undo(glyph)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn glyph_with_contour() -> (Glyph, ContourId) {
        let mut glyph = Glyph::new("a", Some(0x61), 500.0);
        let cid = ContourId::fresh();
        glyph.add_contour(cid);
        (glyph, cid)
    }

    fn add(contour: ContourId, x: f64, y: f64) -> (PointId, Box<dyn Command>) {
        let point = GlyphPoint::on_curve(Point::new(x, y));
        (point.id, Box::new(AddPoint { contour, point }))
    }

    #[test]
    fn undo_redo_add_point() {
        let (mut glyph, cid) = glyph_with_contour();
        let mut stack = CommandStack::new(10);
        let (id, cmd) = add(cid, 10.0, 20.0);
        stack.execute(&mut glyph, cmd).unwrap();
        assert!(glyph.point(id).is_some());

        assert_eq!(stack.undo(&mut glyph).unwrap(), Some("Add Point".into()));
        assert!(glyph.point(id).is_none());
        assert_eq!(glyph.contours.len(), 1);

        assert_eq!(stack.redo(&mut glyph).unwrap(), Some("Add Point".into()));
        assert!(glyph.point(id).is_some());
    }

    #[test]
    fn redo_clears_on_new_action() {
        let (mut glyph, cid) = glyph_with_contour();
        let mut stack = CommandStack::new(10);
        stack.execute(&mut glyph, add(cid, 0.0, 0.0).1).unwrap();
        stack.undo(&mut glyph).unwrap();
        assert!(stack.can_redo());
        stack.execute(&mut glyph, add(cid, 1.0, 1.0).1).unwrap();
        assert!(!stack.can_redo());
    }

    #[test]
    fn max_depth_trims_oldest() {
        let (mut glyph, cid) = glyph_with_contour();
        let mut stack = CommandStack::new(3);
        for i in 0..5 {
            stack.execute(&mut glyph, add(cid, i as f64, 0.0).1).unwrap();
        }
        let mut undo_count = 0;
        while stack.undo(&mut glyph).unwrap().is_some() {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
        assert_eq!(glyph.point_count(), 2);
    }

    #[test]
    fn composite_undoes_in_reverse() {
        let mut glyph = Glyph::new("o", None, 500.0);
        let mut stack = CommandStack::new(10);
        let cid = ContourId::fresh();
        let (_, a) = add(cid, 0.0, 0.0);
        let (_, b) = add(cid, 10.0, 0.0);
        let composite = CompositeCommand::new(
            "Draw",
            vec![
                Box::new(AddContour::new(cid)),
                a,
                b,
                Box::new(CloseContour { id: cid }),
            ],
        );
        let before = glyph.clone();
        stack.execute(&mut glyph, Box::new(composite)).unwrap();
        assert!(glyph.contour(cid).is_some_and(|c| c.closed && c.len() == 2));

        stack.undo(&mut glyph).unwrap();
        assert_eq!(glyph, before);
    }

    #[test]
    fn composite_rolls_back_on_failure() {
        let (mut glyph, cid) = glyph_with_contour();
        let before = glyph.clone();
        let (_, ok) = add(cid, 0.0, 0.0);
        let bad: Box<dyn Command> = Box::new(CloseContour {
            id: ContourId::fresh(),
        });
        let mut composite = CompositeCommand::new("broken", vec![ok, bad]);
        assert!(composite.execute(&mut glyph).is_err());
        assert_eq!(glyph, before);
    }

    #[test]
    fn preview_commit_is_one_entry() {
        let (mut glyph, cid) = glyph_with_contour();
        let mut stack = CommandStack::new(10);
        let (id, cmd) = add(cid, 0.0, 0.0);
        stack.execute(&mut glyph, cmd).unwrap();
        let d0 = glyph.clone();

        stack.begin_preview(&glyph).unwrap();
        for x in 1..5 {
            glyph.move_point_to(id, Point::new(x as f64, 0.0)).unwrap();
        }
        assert_eq!(stack.commit_preview("Move", &glyph), Ok(true));
        assert_eq!(stack.undo_len(), 2);
        assert_eq!(stack.undo_label(), Some("Move"));

        stack.undo(&mut glyph).unwrap();
        assert_eq!(glyph, d0);
    }

    #[test]
    fn preview_cancel_restores_baseline() {
        let (mut glyph, cid) = glyph_with_contour();
        let mut stack = CommandStack::new(10);
        let d0 = glyph.clone();
        stack.begin_preview(&glyph).unwrap();
        stack.execute(&mut glyph, add(cid, 5.0, 5.0).1).unwrap();
        glyph.add_contour(ContourId::fresh());
        stack.cancel_preview(&mut glyph).unwrap();
        assert_eq!(glyph, d0);
        assert!(!stack.can_undo());
    }

    #[test]
    fn unchanged_preview_commit_records_nothing() {
        let (glyph, _) = glyph_with_contour();
        let mut stack = CommandStack::new(10);
        stack.begin_preview(&glyph).unwrap();
        assert_eq!(stack.commit_preview("Move", &glyph), Ok(false));
        assert!(!stack.can_undo());
        assert!(!stack.is_preview_open());
    }

    #[test]
    fn preview_misuse_is_reported() {
        let (mut glyph, _) = glyph_with_contour();
        let mut stack = CommandStack::new(10);
        assert_eq!(
            stack.commit_preview("x", &glyph),
            Err(EditError::NoPreviewOpen)
        );
        assert_eq!(
            stack.cancel_preview(&mut glyph),
            Err(EditError::NoPreviewOpen)
        );

        stack.begin_preview(&glyph).unwrap();
        assert_eq!(stack.undo(&mut glyph), Err(EditError::PreviewInProgress));
        stack.cancel_preview(&mut glyph).unwrap();
    }

    #[test]
    #[cfg_attr(
        debug_assertions,
        should_panic(expected = "begin_preview: a preview is already open")
    )]
    fn reentrant_begin_preview_is_rejected() {
        let (mut glyph, _) = glyph_with_contour();
        let mut stack = CommandStack::new(10);
        stack.begin_preview(&glyph).unwrap();
        glyph.add_contour(ContourId::fresh());
        assert_eq!(
            stack.begin_preview(&glyph),
            Err(EditError::PreviewAlreadyOpen)
        );
        // The original baseline is still the one restored.
        stack.cancel_preview(&mut glyph).unwrap();
        assert_eq!(glyph.contours.len(), 1);
    }

    #[test]
    fn empty_batch_no_undo_entry() {
        let mut stack = CommandStack::new(10);
        stack.begin_batch().unwrap();
        assert_eq!(stack.end_batch("nothing"), Ok(false));
        assert!(!stack.can_undo());
    }

    #[test]
    fn batch_undo_is_single_step() {
        let (mut glyph, cid) = glyph_with_contour();
        let mut stack = CommandStack::new(10);
        let before = glyph.clone();
        stack.begin_batch().unwrap();
        for i in 0..3 {
            stack.execute(&mut glyph, add(cid, i as f64, 0.0).1).unwrap();
        }
        assert_eq!(stack.end_batch("Three"), Ok(true));
        assert_eq!(stack.undo_len(), 1);
        assert_eq!(stack.undo(&mut glyph).unwrap(), Some("Three".into()));
        assert_eq!(glyph, before);
    }

    #[test]
    fn cancel_batch_reverts_collected_commands() {
        let (mut glyph, cid) = glyph_with_contour();
        let mut stack = CommandStack::new(10);
        let before = glyph.clone();
        stack.begin_batch().unwrap();
        stack.execute(&mut glyph, add(cid, 1.0, 1.0).1).unwrap();
        stack.cancel_batch(&mut glyph).unwrap();
        assert_eq!(glyph, before);
        assert!(!stack.can_undo());
    }

    #[test]
    fn remove_points_undo_restores_contours() {
        let (mut glyph, cid) = glyph_with_contour();
        let mut stack = CommandStack::new(10);
        let (id, cmd) = add(cid, 0.0, 0.0);
        stack.execute(&mut glyph, cmd).unwrap();
        glyph.set_active_contour(None).unwrap();
        let before = glyph.clone();

        stack.execute(&mut glyph, Box::new(RemovePoints::new([id]))).unwrap();
        assert!(glyph.contours.is_empty());
        stack.undo(&mut glyph).unwrap();
        assert_eq!(glyph, before);
    }

    #[test]
    fn duplicate_uses_planned_ids() {
        let (mut glyph, cid) = glyph_with_contour();
        let (id, cmd) = add(cid, 3.0, 4.0);
        cmd_execute(&mut glyph, cmd);
        let mut dup = DuplicateContours::plan(&glyph, HashSet::from([id]));
        let copies = dup.copies_of_source();
        dup.execute(&mut glyph).unwrap();
        assert_eq!(glyph.contours.len(), 2);
        assert_eq!(
            glyph.point(copies[0]).map(|p| p.pos),
            Some(Point::new(3.0, 4.0))
        );
        dup.undo(&mut glyph).unwrap();
        assert_eq!(glyph.contours.len(), 1);
    }

    fn cmd_execute(glyph: &mut Glyph, mut cmd: Box<dyn Command>) {
        cmd.execute(glyph).unwrap();
    }
}
