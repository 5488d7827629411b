//! Hit testing: scene position → glyph entity lookup.
//!
//! All radii are in scene units; callers convert from screen pixels using
//! the current zoom. Points are tested last-drawn-first so the topmost
//! point wins when several overlap.

use crate::id::{AnchorId, ContourId, PointId};
use crate::model::Glyph;
use crate::segment::{Segment, glyph_segments};
use kurbo::{ParamCurveNearest, Point, Rect};

/// Which end of an open contour was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

/// A segment under the cursor, with the nearest curve parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentHit {
    pub segment: Segment,
    pub t: f64,
    pub distance: f64,
}

/// Typed hit result.
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    Point { contour: ContourId, point: PointId },
    Anchor { anchor: AnchorId },
    Segment(SegmentHit),
    ContourEndpoint {
        contour: ContourId,
        point: PointId,
        end: Endpoint,
    },
}

impl Hit {
    pub fn point_id(&self) -> Option<PointId> {
        match self {
            Hit::Point { point, .. } | Hit::ContourEndpoint { point, .. } => Some(*point),
            _ => None,
        }
    }
}

/// Topmost point within `radius` of `pos`.
pub fn point_at(glyph: &Glyph, pos: Point, radius: f64) -> Option<Hit> {
    let mut best: Option<(f64, ContourId, PointId)> = None;
    for contour in glyph.contours.iter().rev() {
        for p in contour.points.iter().rev() {
            let d = p.pos.distance(pos);
            if d <= radius && best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((d, contour.id, p.id));
            }
        }
    }
    best.map(|(_, contour, point)| Hit::Point { contour, point })
}

pub fn anchor_at(glyph: &Glyph, pos: Point, radius: f64) -> Option<Hit> {
    glyph
        .anchors
        .iter()
        .rev()
        .find(|a| a.pos.distance(pos) <= radius)
        .map(|a| Hit::Anchor { anchor: a.id })
}

/// Any node (point or anchor); points take precedence.
pub fn node_at(glyph: &Glyph, pos: Point, radius: f64) -> Option<Hit> {
    point_at(glyph, pos, radius).or_else(|| anchor_at(glyph, pos, radius))
}

/// Nearest segment within `radius`.
pub fn segment_at(glyph: &Glyph, pos: Point, radius: f64) -> Option<Hit> {
    let mut best: Option<SegmentHit> = None;
    for segment in glyph_segments(glyph) {
        let nearest = segment.path.nearest(pos, 1e-6);
        let distance = nearest.distance_sq.sqrt();
        if distance <= radius && best.as_ref().is_none_or(|b| distance < b.distance) {
            best = Some(SegmentHit {
                segment,
                t: nearest.t,
                distance,
            });
        }
    }
    best.map(Hit::Segment)
}

/// First or last point of an open, non-empty contour within `radius`.
pub fn contour_endpoint_at(glyph: &Glyph, pos: Point, radius: f64) -> Option<Hit> {
    for contour in glyph.contours.iter().rev() {
        if contour.closed {
            continue;
        }
        let ends = [
            (contour.last(), Endpoint::End),
            (contour.first(), Endpoint::Start),
        ];
        for (point, end) in ends {
            if let Some(p) = point
                && p.pos.distance(pos) <= radius
            {
                return Some(Hit::ContourEndpoint {
                    contour: contour.id,
                    point: p.id,
                    end,
                });
            }
        }
    }
    None
}

/// All points inside `rect` (marquee selection).
pub fn points_in_rect(glyph: &Glyph, rect: Rect) -> Vec<PointId> {
    let rect = rect.abs();
    glyph
        .points()
        .filter(|p| {
            p.pos.x >= rect.x0 && p.pos.x <= rect.x1 && p.pos.y >= rect.y0 && p.pos.y <= rect.y1
        })
        .map(|p| p.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Anchor, GlyphPoint};

    fn glyph() -> (Glyph, Vec<PointId>) {
        let mut glyph = Glyph::new("L", Some(0x4C), 500.0);
        let cid = ContourId::fresh();
        glyph.add_contour(cid);
        let mut ids = Vec::new();
        for (x, y) in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)] {
            let p = GlyphPoint::on_curve(Point::new(x, y));
            ids.push(p.id);
            glyph.add_point(cid, p).unwrap();
        }
        (glyph, ids)
    }

    #[test]
    fn point_hit_within_radius() {
        let (glyph, ids) = glyph();
        let hit = point_at(&glyph, Point::new(98.0, 2.0), 4.0);
        assert_eq!(hit.and_then(|h| h.point_id()), Some(ids[1]));
        assert!(point_at(&glyph, Point::new(50.0, 50.0), 4.0).is_none());
    }

    #[test]
    fn segment_hit_reports_parameter() {
        let (glyph, ids) = glyph();
        match segment_at(&glyph, Point::new(50.0, 1.0), 3.0) {
            Some(Hit::Segment(hit)) => {
                assert_eq!(hit.segment.start, ids[0]);
                assert!((hit.t - 0.5).abs() < 1e-6);
                assert!((hit.distance - 1.0).abs() < 1e-6);
            }
            other => panic!("expected segment hit, got {other:?}"),
        }
    }

    #[test]
    fn endpoints_only_on_open_contours() {
        let (mut glyph, ids) = glyph();
        let hit = contour_endpoint_at(&glyph, Point::new(0.0, 1.0), 3.0);
        assert!(matches!(
            hit,
            Some(Hit::ContourEndpoint { end: Endpoint::Start, point, .. }) if point == ids[0]
        ));

        let cid = glyph.contours[0].id;
        glyph.close_contour(cid).unwrap();
        assert!(contour_endpoint_at(&glyph, Point::new(0.0, 1.0), 3.0).is_none());
    }

    #[test]
    fn node_prefers_points_over_anchors() {
        let (mut glyph, ids) = glyph();
        glyph.anchors.push(Anchor {
            id: AnchorId::fresh(),
            name: "top".into(),
            pos: Point::new(0.0, 0.0),
        });
        let hit = node_at(&glyph, Point::ZERO, 2.0);
        assert_eq!(hit.and_then(|h| h.point_id()), Some(ids[0]));
    }

    #[test]
    fn marquee_collects_enclosed_points() {
        let (glyph, ids) = glyph();
        let inside = points_in_rect(&glyph, Rect::new(150.0, -10.0, 50.0, 10.0));
        assert_eq!(inside, vec![ids[1]]);
    }
}
