//! Snapping pipelines.
//!
//! Two pipelines, both ordered lists of steps over a shared per-session
//! [`SnapContext`]:
//!
//! - **Point** (drag): every step runs. A `PointToPoint` result wins
//!   outright; otherwise the result nearest to the raw position wins.
//! - **Rotate**: steps run in order and the first result wins.
//!
//! A snap session binds a pipeline to one drag or one rotation. Tools hold
//! it in their state through a shared handle and clear it when the
//! gesture ends; clearing is idempotent.

use crate::config::SnapConfig;
use crate::input::Modifiers;
use glyph_core::{Glyph, PointId};
use kurbo::{Line, Point, Vec2};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::HashSet;
use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::rc::Rc;

/// Which kind of snap fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapSource {
    PointToPoint,
    Metrics,
    Angle,
    RotateAngle,
    Reference,
}

/// What the overlay draws for an active snap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapIndicator {
    Point(Point),
    Line(Line),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSnapResult {
    pub point: Point,
    pub source: Option<SnapSource>,
    pub indicator: Option<SnapIndicator>,
}

impl PointSnapResult {
    /// Raw position, nothing snapped.
    pub fn passthrough(point: Point) -> Self {
        Self {
            point,
            source: None,
            indicator: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateSnapResult {
    /// Rotation in radians.
    pub delta: f64,
    pub source: Option<SnapSource>,
}

/// Per-session context shared by all steps of one drag or rotation.
#[derive(Debug, Clone, Default)]
pub struct SnapContext {
    /// Points being dragged; never snap onto themselves.
    pub excluded: HashSet<PointId>,
    /// Drag origin for angle constraints.
    pub origin: Point,
}

/// Inputs for one point-snap query.
#[derive(Debug, Clone, Copy)]
pub struct PointSnapArgs<'a> {
    pub glyph: &'a Glyph,
    pub raw: Point,
    pub modifiers: Modifiers,
    /// Scene units per screen pixel.
    pub px: f64,
    pub config: &'a SnapConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct RotateSnapArgs<'a> {
    pub raw: f64,
    pub modifiers: Modifiers,
    pub config: &'a SnapConfig,
}

pub trait PointSnapStep {
    fn snap(&self, args: &PointSnapArgs<'_>, ctx: &mut SnapContext) -> Option<PointSnapResult>;
}

pub trait RotateSnapStep {
    fn snap(&self, args: &RotateSnapArgs<'_>, ctx: &mut SnapContext) -> Option<RotateSnapResult>;
}

impl<F> PointSnapStep for F
where
    F: Fn(&PointSnapArgs<'_>, &mut SnapContext) -> Option<PointSnapResult>,
{
    fn snap(&self, args: &PointSnapArgs<'_>, ctx: &mut SnapContext) -> Option<PointSnapResult> {
        self(args, ctx)
    }
}

impl<F> RotateSnapStep for F
where
    F: Fn(&RotateSnapArgs<'_>, &mut SnapContext) -> Option<RotateSnapResult>,
{
    fn snap(&self, args: &RotateSnapArgs<'_>, ctx: &mut SnapContext) -> Option<RotateSnapResult> {
        self(args, ctx)
    }
}

// ─── Point steps ─────────────────────────────────────────────────────────

/// Snap onto the nearest other point of the glyph.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointToPointStep;

impl PointSnapStep for PointToPointStep {
    fn snap(&self, args: &PointSnapArgs<'_>, ctx: &mut SnapContext) -> Option<PointSnapResult> {
        let radius = args.config.point_radius_px * args.px;
        args.glyph
            .points()
            .filter(|p| !ctx.excluded.contains(&p.id))
            .map(|p| (p.pos.distance(args.raw), p.pos))
            .filter(|(d, _)| *d <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, pos)| PointSnapResult {
                point: pos,
                source: Some(SnapSource::PointToPoint),
                indicator: Some(SnapIndicator::Point(pos)),
            })
    }
}

/// Snap each axis independently onto metric guides: baseline, x-height,
/// cap height, ascender, descender, and the two sidebearing lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsStep;

impl PointSnapStep for MetricsStep {
    fn snap(&self, args: &PointSnapArgs<'_>, _ctx: &mut SnapContext) -> Option<PointSnapResult> {
        let radius = args.config.metrics_radius_px * args.px;
        let nearest = |value: f64, targets: &[f64]| {
            targets
                .iter()
                .map(|t| ((value - t).abs(), *t))
                .filter(|(d, _)| *d <= radius)
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, t)| t)
        };
        let glyph = args.glyph;
        let y = nearest(args.raw.y, &glyph.metrics.guide_ys());
        let x = nearest(args.raw.x, &[0.0, glyph.advance]);
        if x.is_none() && y.is_none() {
            return None;
        }
        let point = Point::new(x.unwrap_or(args.raw.x), y.unwrap_or(args.raw.y));
        let indicator = match y {
            Some(y) => Line::new((0.0, y), (glyph.advance, y)),
            None => Line::new(
                (point.x, glyph.metrics.descender),
                (point.x, glyph.metrics.ascender),
            ),
        };
        Some(PointSnapResult {
            point,
            source: Some(SnapSource::Metrics),
            indicator: Some(SnapIndicator::Line(indicator)),
        })
    }
}

/// With Shift, constrain the drag direction to multiples of the angle step.
#[derive(Debug, Clone, Copy, Default)]
pub struct AngleStep;

impl PointSnapStep for AngleStep {
    fn snap(&self, args: &PointSnapArgs<'_>, ctx: &mut SnapContext) -> Option<PointSnapResult> {
        if !args.modifiers.shift {
            return None;
        }
        let v = args.raw - ctx.origin;
        if v.hypot() <= f64::EPSILON {
            return None;
        }
        let step = args.config.angle_step_degrees.to_radians();
        if step <= 0.0 {
            return None;
        }
        let angle = (v.atan2() / step).round() * step;
        let dir = Vec2::from_angle(angle);
        let point = ctx.origin + dir * v.dot(dir);
        Some(PointSnapResult {
            point,
            source: Some(SnapSource::Angle),
            indicator: Some(SnapIndicator::Line(Line::new(ctx.origin, point))),
        })
    }
}

// ─── Rotate steps ────────────────────────────────────────────────────────

/// With Shift, round the rotation to multiples of the rotate step.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotateAngleStep;

impl RotateSnapStep for RotateAngleStep {
    fn snap(&self, args: &RotateSnapArgs<'_>, _ctx: &mut SnapContext) -> Option<RotateSnapResult> {
        if !args.modifiers.shift {
            return None;
        }
        let step = args.config.rotate_step_degrees.to_radians();
        if step <= 0.0 {
            return None;
        }
        Some(RotateSnapResult {
            delta: (args.raw / step).round() * step,
            source: Some(SnapSource::RotateAngle),
        })
    }
}

/// Rotations within tolerance of a right angle (0°, ±90°, 180°) snap onto it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceAngleStep;

impl RotateSnapStep for ReferenceAngleStep {
    fn snap(&self, args: &RotateSnapArgs<'_>, _ctx: &mut SnapContext) -> Option<RotateSnapResult> {
        let tolerance = args.config.rotate_reference_tolerance_degrees.to_radians();
        let reference = (args.raw / FRAC_PI_2).round() * FRAC_PI_2;
        if (args.raw - reference).abs() > tolerance {
            return None;
        }
        Some(RotateSnapResult {
            delta: reference,
            source: Some(SnapSource::Reference),
        })
    }
}

// ─── Pipelines ───────────────────────────────────────────────────────────

pub struct PointSnapPipeline {
    steps: Vec<Box<dyn PointSnapStep>>,
}

impl Default for PointSnapPipeline {
    fn default() -> Self {
        Self::new(vec![
            Box::new(PointToPointStep),
            Box::new(MetricsStep),
            Box::new(AngleStep),
        ])
    }
}

impl PointSnapPipeline {
    pub fn new(steps: Vec<Box<dyn PointSnapStep>>) -> Self {
        Self { steps }
    }

    pub fn run(&self, args: &PointSnapArgs<'_>, ctx: &mut SnapContext) -> PointSnapResult {
        let results: SmallVec<[PointSnapResult; 4]> =
            self.steps.iter().filter_map(|s| s.snap(args, ctx)).collect();

        if let Some(hit) = results
            .iter()
            .find(|r| r.source == Some(SnapSource::PointToPoint))
        {
            return *hit;
        }
        results
            .into_iter()
            .min_by(|a, b| {
                a.point
                    .distance(args.raw)
                    .total_cmp(&b.point.distance(args.raw))
            })
            .unwrap_or_else(|| PointSnapResult::passthrough(args.raw))
    }
}

pub struct RotateSnapPipeline {
    steps: Vec<Box<dyn RotateSnapStep>>,
}

impl Default for RotateSnapPipeline {
    fn default() -> Self {
        Self::new(vec![Box::new(RotateAngleStep), Box::new(ReferenceAngleStep)])
    }
}

impl RotateSnapPipeline {
    pub fn new(steps: Vec<Box<dyn RotateSnapStep>>) -> Self {
        Self { steps }
    }

    pub fn run(&self, args: &RotateSnapArgs<'_>, ctx: &mut SnapContext) -> RotateSnapResult {
        self.steps
            .iter()
            .find_map(|s| s.snap(args, ctx))
            .unwrap_or(RotateSnapResult {
                delta: args.raw,
                source: None,
            })
    }
}

// ─── Sessions ────────────────────────────────────────────────────────────

/// Point snapping bound to one drag.
pub struct DragSnapSession {
    pipeline: PointSnapPipeline,
    ctx: SnapContext,
    config: SnapConfig,
    last: Option<PointSnapResult>,
}

impl fmt::Debug for DragSnapSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragSnapSession")
            .field("origin", &self.ctx.origin)
            .field("excluded", &self.ctx.excluded.len())
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl DragSnapSession {
    pub fn new(origin: Point, excluded: HashSet<PointId>, config: SnapConfig) -> Self {
        Self::with_pipeline(PointSnapPipeline::default(), origin, excluded, config)
    }

    pub fn with_pipeline(
        pipeline: PointSnapPipeline,
        origin: Point,
        excluded: HashSet<PointId>,
        config: SnapConfig,
    ) -> Self {
        Self {
            pipeline,
            ctx: SnapContext { excluded, origin },
            config,
            last: None,
        }
    }

    /// Resolve `raw` against the pipeline. `px` is scene units per pixel.
    pub fn snap(
        &mut self,
        glyph: &Glyph,
        raw: Point,
        modifiers: Modifiers,
        px: f64,
    ) -> PointSnapResult {
        // Ctrl/Cmd temporarily disables snapping.
        if !self.config.enabled || modifiers.command() {
            self.last = None;
            return PointSnapResult::passthrough(raw);
        }
        let args = PointSnapArgs {
            glyph,
            raw,
            modifiers,
            px,
            config: &self.config,
        };
        let result = self.pipeline.run(&args, &mut self.ctx);
        if let Some(source) = result.source {
            log::trace!("snap: {source:?} -> ({:.1}, {:.1})", result.point.x, result.point.y);
        }
        self.last = result.source.map(|_| result);
        result
    }

    /// Indicator of the most recent snap, for the overlay.
    pub fn indicator(&self) -> Option<SnapIndicator> {
        self.last.and_then(|r| r.indicator)
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Rotation snapping bound to one rotate drag.
pub struct RotateSnapSession {
    pipeline: RotateSnapPipeline,
    ctx: SnapContext,
    config: SnapConfig,
    last: Option<RotateSnapResult>,
}

impl fmt::Debug for RotateSnapSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotateSnapSession")
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl RotateSnapSession {
    pub fn new(config: SnapConfig) -> Self {
        Self::with_pipeline(RotateSnapPipeline::default(), config)
    }

    pub fn with_pipeline(pipeline: RotateSnapPipeline, config: SnapConfig) -> Self {
        Self {
            pipeline,
            ctx: SnapContext::default(),
            config,
            last: None,
        }
    }

    pub fn snap(&mut self, raw: f64, modifiers: Modifiers) -> RotateSnapResult {
        // Ctrl/Cmd temporarily disables snapping.
        if !self.config.enabled || modifiers.command() {
            self.last = None;
            return RotateSnapResult {
                delta: raw,
                source: None,
            };
        }
        let args = RotateSnapArgs {
            raw,
            modifiers,
            config: &self.config,
        };
        let result = self.pipeline.run(&args, &mut self.ctx);
        if let Some(source) = result.source {
            log::trace!("rotate snap: {source:?} -> {:.1}°", result.delta.to_degrees());
        }
        self.last = result.source.map(|_| result);
        result
    }

    /// Most recent snapped rotation, if the last query snapped.
    pub fn last_angle(&self) -> Option<f64> {
        self.last.map(|r| r.delta)
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Shared handles, so tool state can carry a session and stay `Clone`.
pub type DragSnapHandle = Rc<RefCell<DragSnapSession>>;
pub type RotateSnapHandle = Rc<RefCell<RotateSnapSession>>;

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_core::{ContourId, GlyphPoint};

    fn glyph_with(points: &[(f64, f64)]) -> (Glyph, Vec<PointId>) {
        let mut glyph = Glyph::new("n", Some(0x6E), 600.0);
        let cid = ContourId::fresh();
        glyph.add_contour(cid);
        let mut ids = Vec::new();
        for &(x, y) in points {
            let p = GlyphPoint::on_curve(Point::new(x, y));
            ids.push(p.id);
            glyph.add_point(cid, p).unwrap();
        }
        (glyph, ids)
    }

    fn args<'a>(glyph: &'a Glyph, raw: Point, config: &'a SnapConfig) -> PointSnapArgs<'a> {
        PointSnapArgs {
            glyph,
            raw,
            modifiers: Modifiers::NONE,
            px: 1.0,
            config,
        }
    }

    #[test]
    fn point_to_point_wins_over_nearer_metrics() {
        // Point at (203, 506) sits 7 units away; x-height guide is 2 away.
        let (glyph, _) = glyph_with(&[(203.0, 506.0)]);
        let config = SnapConfig::default();
        let mut ctx = SnapContext::default();
        let result = PointSnapPipeline::default()
            .run(&args(&glyph, Point::new(200.0, 502.0), &config), &mut ctx);
        assert_eq!(result.source, Some(SnapSource::PointToPoint));
        assert_eq!(result.point, Point::new(203.0, 506.0));
    }

    #[test]
    fn nearest_result_wins_without_point_to_point() {
        let (glyph, _) = glyph_with(&[]);
        let config = SnapConfig::default();
        let far = |a: &PointSnapArgs<'_>, _: &mut SnapContext| {
            Some(PointSnapResult {
                point: a.raw + Vec2::new(5.0, 0.0),
                source: Some(SnapSource::Metrics),
                indicator: None,
            })
        };
        let near = |a: &PointSnapArgs<'_>, _: &mut SnapContext| {
            Some(PointSnapResult {
                point: a.raw + Vec2::new(1.0, 0.0),
                source: Some(SnapSource::Angle),
                indicator: None,
            })
        };
        let pipeline = PointSnapPipeline::new(vec![Box::new(far), Box::new(near)]);
        let result = pipeline.run(
            &args(&glyph, Point::new(50.0, 50.0), &config),
            &mut SnapContext::default(),
        );
        assert_eq!(result.source, Some(SnapSource::Angle));
    }

    #[test]
    fn no_result_passes_through() {
        let (glyph, _) = glyph_with(&[]);
        let config = SnapConfig::default();
        let raw = Point::new(123.0, 321.0);
        let result = PointSnapPipeline::default()
            .run(&args(&glyph, raw, &config), &mut SnapContext::default());
        assert_eq!(result, PointSnapResult::passthrough(raw));
    }

    #[test]
    fn dragged_points_are_excluded() {
        let (glyph, ids) = glyph_with(&[(100.0, 300.0)]);
        let mut session =
            DragSnapSession::new(Point::ZERO, HashSet::from([ids[0]]), SnapConfig::default());
        let result = session.snap(&glyph, Point::new(101.0, 301.0), Modifiers::NONE, 1.0);
        assert_eq!(result.source, None);
    }

    #[test]
    fn metrics_snaps_each_axis() {
        let (glyph, _) = glyph_with(&[]);
        let config = SnapConfig::default();
        let result = MetricsStep
            .snap(
                &args(&glyph, Point::new(598.0, 3.0), &config),
                &mut SnapContext::default(),
            )
            .unwrap();
        assert_eq!(result.point, Point::new(600.0, 0.0));
    }

    #[test]
    fn shift_constrains_to_angle_steps() {
        let (glyph, _) = glyph_with(&[]);
        let mut session =
            DragSnapSession::new(
                Point::new(100.0, 100.0),
                HashSet::new(),
                SnapConfig::default(),
            );
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        let result = session.snap(&glyph, Point::new(200.0, 110.0), shift, 1.0);
        assert_eq!(result.source, Some(SnapSource::Angle));
        assert!((result.point.y - 100.0).abs() < 1e-9);
        assert!(session.indicator().is_some());
        session.clear();
        session.clear();
        assert!(session.indicator().is_none());
    }

    #[test]
    fn rotate_pipeline_is_first_match() {
        let config = SnapConfig::default();
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        // 89° is within the reference tolerance and rounds to 90° by steps too.
        let raw = 89f64.to_radians();
        let args = RotateSnapArgs {
            raw,
            modifiers: shift,
            config: &config,
        };
        let result = RotateSnapPipeline::default().run(&args, &mut SnapContext::default());
        assert_eq!(result.source, Some(SnapSource::RotateAngle));

        let reversed =
            RotateSnapPipeline::new(vec![Box::new(ReferenceAngleStep), Box::new(RotateAngleStep)]);
        let result = reversed.run(&args, &mut SnapContext::default());
        assert_eq!(result.source, Some(SnapSource::Reference));
    }

    #[test]
    fn rotate_without_match_passes_through() {
        let mut session = RotateSnapSession::new(SnapConfig::default());
        let raw = 37f64.to_radians();
        let result = session.snap(raw, Modifiers::NONE);
        assert_eq!(
            result,
            RotateSnapResult {
                delta: raw,
                source: None
            }
        );
        assert_eq!(session.last_angle(), None);

        let near_right = 91f64.to_radians();
        let result = session.snap(near_right, Modifiers::NONE);
        assert_eq!(result.source, Some(SnapSource::Reference));
        assert!((result.delta - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn command_key_disables_both_sessions() {
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        let (glyph, _) = glyph_with(&[(100.0, 100.0)]);
        let mut drag = DragSnapSession::new(Point::ZERO, HashSet::new(), SnapConfig::default());
        let raw = Point::new(101.0, 101.0);
        assert_eq!(
            drag.snap(&glyph, raw, ctrl, 1.0),
            PointSnapResult::passthrough(raw)
        );

        let mut rotate = RotateSnapSession::new(SnapConfig::default());
        let near_right = 91f64.to_radians();
        assert_eq!(
            rotate.snap(near_right, Modifiers::NONE).source,
            Some(SnapSource::Reference)
        );
        assert!(rotate.last_angle().is_some());
        let result = rotate.snap(near_right, ctrl);
        assert_eq!(result.source, None);
        assert_eq!(result.delta, near_right);
        assert_eq!(rotate.last_angle(), None);
    }
}
