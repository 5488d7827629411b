//! Core glyph data model.
//!
//! A glyph is an ordered list of contours, each an ordered list of points.
//! On-curve points are path vertices; off-curve points are the bezier
//! control handles between them. The glyph also tracks which contour the
//! pen appends to (`active_contour`), so a snapshot of the glyph captures
//! everything an undo step needs to restore.

use crate::id::{AnchorId, ContourId, PointId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

// ─── Points ──────────────────────────────────────────────────────────────

/// Whether a point lies on the outline or is a control handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    OnCurve,
    OffCurve,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphPoint {
    pub id: PointId,
    pub pos: Point,
    pub kind: PointKind,
    /// Smooth on-curve points keep their two handles collinear.
    pub smooth: bool,
}

impl GlyphPoint {
    pub fn on_curve(pos: Point) -> Self {
        Self {
            id: PointId::fresh(),
            pos,
            kind: PointKind::OnCurve,
            smooth: false,
        }
    }

    pub fn off_curve(pos: Point) -> Self {
        Self {
            id: PointId::fresh(),
            pos,
            kind: PointKind::OffCurve,
            smooth: false,
        }
    }

    pub fn with_id(mut self, id: PointId) -> Self {
        self.id = id;
        self
    }

    pub fn smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }

    pub fn is_on_curve(&self) -> bool {
        self.kind == PointKind::OnCurve
    }
}

// ─── Contours ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub id: ContourId,
    pub points: Vec<GlyphPoint>,
    pub closed: bool,
}

impl Contour {
    pub fn new(id: ContourId) -> Self {
        Self {
            id,
            points: Vec::new(),
            closed: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn index_of(&self, id: PointId) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }

    pub fn first(&self) -> Option<&GlyphPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&GlyphPoint> {
        self.points.last()
    }

    /// Index of the point before `index`, wrapping on closed contours.
    pub fn prev_index(&self, index: usize) -> Option<usize> {
        if index > 0 {
            Some(index - 1)
        } else if self.closed && self.points.len() > 1 {
            Some(self.points.len() - 1)
        } else {
            None
        }
    }

    /// Index of the point after `index`, wrapping on closed contours.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        if index + 1 < self.points.len() {
            Some(index + 1)
        } else if self.closed && self.points.len() > 1 {
            Some(0)
        } else {
            None
        }
    }
}

// ─── Anchors & Metrics ───────────────────────────────────────────────────

/// Named attachment point (e.g. `top` for mark positioning).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: AnchorId,
    pub name: String,
    pub pos: Point,
}

/// Vertical font metrics, in font units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontMetrics {
    pub units_per_em: f64,
    pub ascender: f64,
    pub descender: f64,
    pub x_height: f64,
    pub cap_height: f64,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            units_per_em: 1000.0,
            ascender: 800.0,
            descender: -200.0,
            x_height: 500.0,
            cap_height: 700.0,
        }
    }
}

impl FontMetrics {
    /// Horizontal guide lines: baseline plus every vertical metric.
    pub fn guide_ys(&self) -> [f64; 5] {
        [
            0.0,
            self.x_height,
            self.cap_height,
            self.ascender,
            self.descender,
        ]
    }
}

// ─── Glyph ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub name: String,
    pub unicode: Option<u32>,
    pub advance: f64,
    pub metrics: FontMetrics,
    pub contours: Vec<Contour>,
    pub anchors: Vec<Anchor>,
    /// Contour that new pen points are appended to.
    pub active_contour: Option<ContourId>,
}

impl Glyph {
    pub fn new(name: impl Into<String>, unicode: Option<u32>, advance: f64) -> Self {
        Self {
            name: name.into(),
            unicode,
            advance,
            metrics: FontMetrics::default(),
            contours: Vec::new(),
            anchors: Vec::new(),
            active_contour: None,
        }
    }

    pub fn contour(&self, id: ContourId) -> Option<&Contour> {
        self.contours.iter().find(|c| c.id == id)
    }

    pub fn contour_mut(&mut self, id: ContourId) -> Option<&mut Contour> {
        self.contours.iter_mut().find(|c| c.id == id)
    }

    /// The contour containing `point`.
    pub fn contour_of(&self, point: PointId) -> Option<&Contour> {
        self.contours.iter().find(|c| c.index_of(point).is_some())
    }

    pub fn point(&self, id: PointId) -> Option<&GlyphPoint> {
        self.points().find(|p| p.id == id)
    }

    pub fn point_mut(&mut self, id: PointId) -> Option<&mut GlyphPoint> {
        self.contours
            .iter_mut()
            .flat_map(|c| c.points.iter_mut())
            .find(|p| p.id == id)
    }

    /// All points of all contours, in drawing order.
    pub fn points(&self) -> impl Iterator<Item = &GlyphPoint> {
        self.contours.iter().flat_map(|c| c.points.iter())
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(Contour::len).sum()
    }

    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.id == id)
    }

    /// The contour pen points are currently appended to, if it still exists.
    pub fn active(&self) -> Option<&Contour> {
        self.active_contour.and_then(|id| self.contour(id))
    }

    /// Bounding box of the given points. `None` if no id resolves.
    pub fn bounds_of<'a>(&self, ids: impl IntoIterator<Item = &'a PointId>) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        for id in ids {
            if let Some(p) = self.point(*id) {
                bounds = Some(match bounds {
                    Some(r) => r.union_pt(p.pos),
                    None => Rect::from_points(p.pos, p.pos),
                });
            }
        }
        bounds
    }

    /// Neighbouring points of `id` within its contour (previous, next).
    pub fn neighbours(&self, id: PointId) -> (Option<&GlyphPoint>, Option<&GlyphPoint>) {
        let Some(contour) = self.contour_of(id) else {
            return (None, None);
        };
        let Some(index) = contour.index_of(id) else {
            return (None, None);
        };
        let prev = contour.prev_index(index).map(|i| &contour.points[i]);
        let next = contour.next_index(index).map(|i| &contour.points[i]);
        (prev, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square() -> Glyph {
        let mut glyph = Glyph::new("square", Some(0x25A1), 600.0);
        let mut contour = Contour::new(ContourId::intern("sq"));
        for (x, y) in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)] {
            contour.points.push(GlyphPoint::on_curve(Point::new(x, y)));
        }
        contour.closed = true;
        glyph.contours.push(contour);
        glyph
    }

    #[test]
    fn bounds_cover_selected_points() {
        let glyph = square();
        let ids: Vec<PointId> = glyph.points().map(|p| p.id).collect();
        let bounds = glyph.bounds_of(&ids).unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn bounds_of_unknown_ids_is_none() {
        let glyph = square();
        assert!(glyph.bounds_of(&[PointId::fresh()]).is_none());
    }

    #[test]
    fn neighbours_wrap_on_closed_contours() {
        let glyph = square();
        let ids: Vec<PointId> = glyph.points().map(|p| p.id).collect();
        let (prev, next) = glyph.neighbours(ids[0]);
        assert_eq!(prev.map(|p| p.id), Some(ids[3]));
        assert_eq!(next.map(|p| p.id), Some(ids[1]));
    }

    #[test]
    fn neighbours_stop_at_open_contour_ends() {
        let mut glyph = square();
        glyph.contours[0].closed = false;
        let ids: Vec<PointId> = glyph.points().map(|p| p.id).collect();
        let (prev, _) = glyph.neighbours(ids[0]);
        let (_, next) = glyph.neighbours(ids[3]);
        assert!(prev.is_none());
        assert!(next.is_none());
    }
}
