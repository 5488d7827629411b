//! Segment extraction: contour points → line / quad / cubic segments.
//!
//! A segment runs from one on-curve point to the next, with zero, one or
//! two off-curve control points in between. Longer off-curve runs are
//! not produced by any tool here and are skipped.

use crate::id::{ContourId, PointId};
use crate::model::{Contour, Glyph, PointKind};
use kurbo::{CubicBez, Line, PathSeg, QuadBez};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Line,
    Quad,
    Cubic,
}

/// One outline segment, identified by its endpoint ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub contour: ContourId,
    pub start: PointId,
    pub controls: SmallVec<[PointId; 2]>,
    pub end: PointId,
    pub kind: SegmentKind,
    pub path: PathSeg,
}

impl Segment {
    pub fn is_curve(&self) -> bool {
        self.kind != SegmentKind::Line
    }

    /// Endpoints plus controls.
    pub fn point_ids(&self) -> impl Iterator<Item = PointId> + '_ {
        std::iter::once(self.start)
            .chain(self.controls.iter().copied())
            .chain(std::iter::once(self.end))
    }
}

/// All segments of a contour, in order.
pub fn contour_segments(contour: &Contour) -> Vec<Segment> {
    let n = contour.points.len();
    if n < 2 {
        return Vec::new();
    }
    let Some(first_on) = contour
        .points
        .iter()
        .position(|p| p.kind == PointKind::OnCurve)
    else {
        return Vec::new();
    };

    // Walk from the first on-curve point; closed contours wrap back to it.
    let span = if contour.closed { n } else { n - first_on - 1 };
    let mut out = Vec::new();
    let mut start = first_on;
    let mut controls: SmallVec<[usize; 2]> = SmallVec::new();
    let mut overflow = false;

    for step in 1..=span {
        let idx = (first_on + step) % n;
        let point = &contour.points[idx];
        if point.kind == PointKind::OffCurve {
            if controls.len() == 2 {
                overflow = true;
            } else {
                controls.push(idx);
            }
            continue;
        }
        if !overflow && let Some(segment) = build(contour, start, &controls, idx) {
            out.push(segment);
        }
        start = idx;
        controls.clear();
        overflow = false;
    }
    out
}

/// All segments of every contour in the glyph.
pub fn glyph_segments(glyph: &Glyph) -> Vec<Segment> {
    glyph.contours.iter().flat_map(contour_segments).collect()
}

fn build(contour: &Contour, start: usize, controls: &[usize], end: usize) -> Option<Segment> {
    let pts = &contour.points;
    let p0 = pts[start].pos;
    let p1 = pts[end].pos;
    let (kind, path) = match controls {
        [] => (SegmentKind::Line, PathSeg::Line(Line::new(p0, p1))),
        [c] => (
            SegmentKind::Quad,
            PathSeg::Quad(QuadBez::new(p0, pts[*c].pos, p1)),
        ),
        [c0, c1] => (
            SegmentKind::Cubic,
            PathSeg::Cubic(CubicBez::new(p0, pts[*c0].pos, pts[*c1].pos, p1)),
        ),
        _ => return None,
    };
    Some(Segment {
        contour: contour.id,
        start: pts[start].id,
        controls: controls.iter().map(|&i| pts[i].id).collect(),
        end: pts[end].id,
        kind,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GlyphPoint;
    use kurbo::Point;

    fn contour(points: &[(f64, f64, bool)], closed: bool) -> Contour {
        let mut c = Contour::new(ContourId::fresh());
        for &(x, y, on) in points {
            let p = Point::new(x, y);
            c.points.push(if on {
                GlyphPoint::on_curve(p)
            } else {
                GlyphPoint::off_curve(p)
            });
        }
        c.closed = closed;
        c
    }

    #[test]
    fn open_polyline_yields_lines() {
        let c = contour(
            &[(0.0, 0.0, true), (10.0, 0.0, true), (10.0, 10.0, true)],
            false,
        );
        let segs = contour_segments(&c);
        assert_eq!(segs.len(), 2);
        assert!(segs.iter().all(|s| s.kind == SegmentKind::Line));
    }

    #[test]
    fn closed_contour_wraps_to_start() {
        let c = contour(
            &[(0.0, 0.0, true), (10.0, 0.0, true), (10.0, 10.0, true)],
            true,
        );
        let segs = contour_segments(&c);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[2].end, c.points[0].id);
    }

    #[test]
    fn off_curve_runs_become_curves() {
        let c = contour(
            &[
                (0.0, 0.0, true),
                (5.0, 10.0, false),
                (10.0, 0.0, true),
                (12.0, 5.0, false),
                (18.0, 5.0, false),
                (20.0, 0.0, true),
            ],
            false,
        );
        let kinds: Vec<SegmentKind> = contour_segments(&c).iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SegmentKind::Quad, SegmentKind::Cubic]);
    }

    #[test]
    fn closed_contour_starting_off_curve() {
        let c = contour(
            &[(5.0, 10.0, false), (10.0, 0.0, true), (0.0, 0.0, true)],
            true,
        );
        let segs = contour_segments(&c);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].kind, SegmentKind::Quad);
    }

    #[test]
    fn single_point_has_no_segments() {
        let c = contour(&[(0.0, 0.0, true)], false);
        assert!(contour_segments(&c).is_empty());
    }
}
