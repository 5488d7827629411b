//! Edit primitives on a [`Glyph`].
//!
//! Everything here is synchronous and id-based. Higher layers (commands,
//! preview transactions) decide *when* to call these; this module only
//! knows *how* to change the outline.

use crate::id::{ContourId, PointId};
use crate::model::{Contour, Glyph, GlyphPoint, PointKind};
use kurbo::{Point, Vec2};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlyphError {
    #[error("unknown point {0:?}")]
    UnknownPoint(PointId),
    #[error("unknown contour {0:?}")]
    UnknownContour(ContourId),
    #[error("no active contour")]
    NoActiveContour,
}

impl Glyph {
    // ─── Contours ────────────────────────────────────────────────────────

    /// Append an empty contour with the given id and make it active.
    pub fn add_contour(&mut self, id: ContourId) {
        self.contours.push(Contour::new(id));
        self.active_contour = Some(id);
    }

    /// Remove a contour, clearing the active contour if it was this one.
    pub fn remove_contour(&mut self, id: ContourId) -> Option<Contour> {
        let index = self.contours.iter().position(|c| c.id == id)?;
        if self.active_contour == Some(id) {
            self.active_contour = None;
        }
        Some(self.contours.remove(index))
    }

    pub fn close_contour(&mut self, id: ContourId) -> Result<(), GlyphError> {
        let contour = self
            .contour_mut(id)
            .ok_or(GlyphError::UnknownContour(id))?;
        contour.closed = true;
        Ok(())
    }

    pub fn open_contour(&mut self, id: ContourId) -> Result<(), GlyphError> {
        let contour = self
            .contour_mut(id)
            .ok_or(GlyphError::UnknownContour(id))?;
        contour.closed = false;
        Ok(())
    }

    /// Reverse point order. On closed contours the first point stays first.
    pub fn reverse_contour(&mut self, id: ContourId) -> Result<(), GlyphError> {
        let contour = self
            .contour_mut(id)
            .ok_or(GlyphError::UnknownContour(id))?;
        if contour.closed && contour.points.len() > 1 {
            contour.points[1..].reverse();
        } else {
            contour.points.reverse();
        }
        Ok(())
    }

    pub fn set_active_contour(&mut self, id: Option<ContourId>) -> Result<(), GlyphError> {
        if let Some(id) = id
            && self.contour(id).is_none()
        {
            return Err(GlyphError::UnknownContour(id));
        }
        self.active_contour = id;
        Ok(())
    }

    // ─── Points ──────────────────────────────────────────────────────────

    /// Append a point to the end of a contour.
    pub fn add_point(&mut self, contour: ContourId, point: GlyphPoint) -> Result<(), GlyphError> {
        let c = self
            .contour_mut(contour)
            .ok_or(GlyphError::UnknownContour(contour))?;
        c.points.push(point);
        Ok(())
    }

    /// Insert a point at `index` (clamped to the contour length).
    pub fn insert_point(
        &mut self,
        contour: ContourId,
        index: usize,
        point: GlyphPoint,
    ) -> Result<(), GlyphError> {
        let c = self
            .contour_mut(contour)
            .ok_or(GlyphError::UnknownContour(contour))?;
        let index = index.min(c.points.len());
        c.points.insert(index, point);
        Ok(())
    }

    /// Remove points by id. Contours left empty are dropped.
    /// Returns the ids that were actually removed.
    pub fn remove_points(&mut self, ids: &HashSet<PointId>) -> Vec<PointId> {
        let mut removed = Vec::new();
        for contour in &mut self.contours {
            contour.points.retain(|p| {
                if ids.contains(&p.id) {
                    removed.push(p.id);
                    false
                } else {
                    true
                }
            });
        }
        let emptied: Vec<ContourId> = self
            .contours
            .iter()
            .filter(|c| c.is_empty())
            .map(|c| c.id)
            .collect();
        for id in emptied {
            // Keep an empty active contour: the pen is about to fill it.
            if self.active_contour != Some(id) {
                self.remove_contour(id);
            }
        }
        removed
    }

    pub fn move_point_to(&mut self, id: PointId, pos: Point) -> Result<(), GlyphError> {
        let point = self.point_mut(id).ok_or(GlyphError::UnknownPoint(id))?;
        point.pos = pos;
        Ok(())
    }

    /// Translate every listed point by `delta`. Unknown ids are skipped.
    pub fn translate_points(&mut self, ids: &[PointId], delta: Vec2) -> Vec<PointId> {
        let mut moved = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(p) = self.point_mut(id) {
                p.pos += delta;
                moved.push(id);
            }
        }
        moved
    }

    /// Set absolute positions for many points at once.
    pub fn set_positions(&mut self, positions: &[(PointId, Point)]) -> Result<(), GlyphError> {
        // Validate first so a bad id never leaves a half-applied edit.
        if let Some((missing, _)) = positions.iter().find(|(id, _)| self.point(*id).is_none()) {
            return Err(GlyphError::UnknownPoint(*missing));
        }
        for &(id, pos) in positions {
            if let Some(p) = self.point_mut(id) {
                p.pos = pos;
            }
        }
        Ok(())
    }

    /// Flip the smooth flag of an on-curve point. Off-curve points are
    /// rejected with `Ok(false)`.
    pub fn toggle_smooth(&mut self, id: PointId) -> Result<bool, GlyphError> {
        let point = self.point_mut(id).ok_or(GlyphError::UnknownPoint(id))?;
        if point.kind != PointKind::OnCurve {
            return Ok(false);
        }
        point.smooth = !point.smooth;
        Ok(true)
    }

    /// Duplicate every contour that contains one of `ids`.
    ///
    /// `fresh_point` and `fresh_contour` supply the new ids so callers
    /// can know them ahead of time. Returns the old → new point mapping.
    pub fn duplicate_contours_of(
        &mut self,
        ids: &HashSet<PointId>,
        mut fresh_point: impl FnMut(PointId) -> PointId,
        mut fresh_contour: impl FnMut(ContourId) -> ContourId,
    ) -> HashMap<PointId, PointId> {
        let sources: Vec<Contour> = self
            .contours
            .iter()
            .filter(|c| c.points.iter().any(|p| ids.contains(&p.id)))
            .cloned()
            .collect();
        let mut mapping = HashMap::new();
        for source in sources {
            let mut copy = Contour::new(fresh_contour(source.id));
            copy.closed = source.closed;
            for p in &source.points {
                let new_id = fresh_point(p.id);
                mapping.insert(p.id, new_id);
                copy.points.push(p.with_id(new_id));
            }
            self.contours.push(copy);
        }
        mapping
    }

    /// Move `ids` by `delta`, dragging attached handles along.
    /// Returns every point that moved.
    pub fn apply_smart_edits(&mut self, ids: &HashSet<PointId>, delta: Vec2) -> Vec<PointId> {
        let plan = SmartMovePlan::new(self, ids);
        let positions = plan.positions(delta);
        let moved: Vec<PointId> = positions.iter().map(|(id, _)| *id).collect();
        // Plan ids come from this glyph, so this cannot fail.
        let _ = self.set_positions(&positions);
        moved
    }
}

// ─── Smart moves ─────────────────────────────────────────────────────────

/// A handle that must stay collinear with its smooth anchor.
#[derive(Debug, Clone, Copy)]
struct Tangent {
    moved_handle: PointId,
    anchor: Point,
    opposite: PointId,
    opposite_len: f64,
}

/// Snapshot of everything a selection drag moves, captured once at drag
/// start so every sample is computed from the same initial positions.
#[derive(Debug, Clone, Default)]
pub struct SmartMovePlan {
    initial: Vec<(PointId, Point)>,
    tangents: Vec<Tangent>,
}

impl SmartMovePlan {
    pub fn new(glyph: &Glyph, ids: &HashSet<PointId>) -> Self {
        let mut moving: Vec<PointId> = Vec::new();
        let mut seen: HashSet<PointId> = HashSet::new();
        let mut tangents = Vec::new();

        for contour in &glyph.contours {
            for (index, point) in contour.points.iter().enumerate() {
                if !ids.contains(&point.id) {
                    continue;
                }
                if seen.insert(point.id) {
                    moving.push(point.id);
                }
                let neighbours = [contour.prev_index(index), contour.next_index(index)];
                match point.kind {
                    PointKind::OnCurve => {
                        // Handles ride along with their anchor.
                        for n in neighbours.into_iter().flatten() {
                            let neighbour = &contour.points[n];
                            if neighbour.kind == PointKind::OffCurve && seen.insert(neighbour.id) {
                                moving.push(neighbour.id);
                            }
                        }
                    }
                    PointKind::OffCurve => {
                        if let Some(t) = tangent_for(contour, index, ids) {
                            tangents.push(t);
                        }
                    }
                }
            }
        }

        let initial = moving
            .into_iter()
            .filter_map(|id| glyph.point(id).map(|p| (id, p.pos)))
            .collect();
        Self { initial, tangents }
    }

    pub fn is_empty(&self) -> bool {
        self.initial.is_empty()
    }

    /// Initial positions of every point this plan moves.
    pub fn initial(&self) -> &[(PointId, Point)] {
        &self.initial
    }

    pub fn initial_position(&self, id: PointId) -> Option<Point> {
        self.initial.iter().find(|(p, _)| *p == id).map(|(_, pos)| *pos)
    }

    /// Target positions for a cumulative `delta` from the drag origin.
    pub fn positions(&self, delta: Vec2) -> Vec<(PointId, Point)> {
        let mut out: Vec<(PointId, Point)> = self
            .initial
            .iter()
            .map(|&(id, pos)| (id, pos + delta))
            .collect();
        for t in &self.tangents {
            let Some(handle) = out.iter().find(|(id, _)| *id == t.moved_handle).map(|(_, p)| *p)
            else {
                continue;
            };
            let dir = t.anchor - handle;
            let len = dir.hypot();
            if len <= f64::EPSILON {
                continue;
            }
            let opposite = t.anchor + dir * (t.opposite_len / len);
            out.push((t.opposite, opposite));
        }
        out
    }
}

/// If the off-curve point at `index` hangs off a smooth anchor whose other
/// handle is not being moved, describe how that other handle follows.
fn tangent_for(contour: &Contour, index: usize, moving: &HashSet<PointId>) -> Option<Tangent> {
    let handle = &contour.points[index];
    for (anchor_idx, away) in [
        (contour.prev_index(index), true),
        (contour.next_index(index), false),
    ] {
        let Some(anchor_idx) = anchor_idx else {
            continue;
        };
        let anchor = &contour.points[anchor_idx];
        if anchor.kind != PointKind::OnCurve || !anchor.smooth || moving.contains(&anchor.id) {
            continue;
        }
        let opposite_idx = if away {
            contour.prev_index(anchor_idx)
        } else {
            contour.next_index(anchor_idx)
        };
        let Some(opposite_idx) = opposite_idx else {
            continue;
        };
        let opposite = &contour.points[opposite_idx];
        if opposite.kind != PointKind::OffCurve || moving.contains(&opposite.id) {
            continue;
        }
        return Some(Tangent {
            moved_handle: handle.id,
            anchor: anchor.pos,
            opposite: opposite.id,
            opposite_len: (opposite.pos - anchor.pos).hypot(),
        });
    }
    None
}
