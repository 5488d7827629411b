//! Selection sets: points, segments and anchors.

use glyph_core::{AnchorId, ContourId, Glyph, PointId, Segment};
use std::collections::BTreeSet;

/// A segment identified by its contour and endpoint ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentRef {
    pub contour: ContourId,
    pub start: PointId,
    pub end: PointId,
}

impl From<&Segment> for SegmentRef {
    fn from(segment: &Segment) -> Self {
        Self {
            contour: segment.contour,
            start: segment.start,
            end: segment.end,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    points: BTreeSet<PointId>,
    segments: BTreeSet<SegmentRef>,
    anchors: BTreeSet<AnchorId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.segments.is_empty() && self.anchors.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.segments.clear();
        self.anchors.clear();
    }

    // ─── Points ──────────────────────────────────────────────────────────

    pub fn points(&self) -> &BTreeSet<PointId> {
        &self.points
    }

    pub fn point_ids(&self) -> Vec<PointId> {
        self.points.iter().copied().collect()
    }

    pub fn contains_point(&self, id: PointId) -> bool {
        self.points.contains(&id)
    }

    /// Replace the point selection. Segment and anchor selection is cleared.
    pub fn set_points(&mut self, ids: impl IntoIterator<Item = PointId>) {
        self.clear();
        self.points.extend(ids);
    }

    pub fn add_points(&mut self, ids: impl IntoIterator<Item = PointId>) {
        self.points.extend(ids);
    }

    /// Add `id` if absent, remove it if present. Returns the new membership.
    pub fn toggle_point(&mut self, id: PointId) -> bool {
        if self.points.remove(&id) {
            false
        } else {
            self.points.insert(id);
            true
        }
    }

    // ─── Segments ────────────────────────────────────────────────────────

    pub fn segments(&self) -> &BTreeSet<SegmentRef> {
        &self.segments
    }

    pub fn set_segments(&mut self, segments: impl IntoIterator<Item = SegmentRef>) {
        self.segments = segments.into_iter().collect();
    }

    pub fn toggle_segment(&mut self, segment: SegmentRef) -> bool {
        if self.segments.remove(&segment) {
            false
        } else {
            self.segments.insert(segment);
            true
        }
    }

    // ─── Anchors ─────────────────────────────────────────────────────────

    pub fn anchors(&self) -> &BTreeSet<AnchorId> {
        &self.anchors
    }

    pub fn set_anchors(&mut self, ids: impl IntoIterator<Item = AnchorId>) {
        self.anchors = ids.into_iter().collect();
    }

    pub fn toggle_anchor(&mut self, id: AnchorId) -> bool {
        if self.anchors.remove(&id) {
            false
        } else {
            self.anchors.insert(id);
            true
        }
    }

    /// Drop ids that no longer exist in `glyph` (after undo, delete, ...).
    pub fn retain_existing(&mut self, glyph: &Glyph) {
        self.points.retain(|id| glyph.point(*id).is_some());
        self.segments
            .retain(|s| glyph.point(s.start).is_some() && glyph.point(s.end).is_some());
        self.anchors.retain(|id| glyph.anchor(*id).is_some());
    }
}
