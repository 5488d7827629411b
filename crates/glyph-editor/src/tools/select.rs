//! Select tool: hover, click/marquee selection, and the four drag modes
//! (translate, rotate, resize, bend).
//!
//! Every drag mode follows the same transaction shape: open a preview on
//! `DragStart`, apply live positions on each `Drag`, commit on `DragEnd`
//! if anything moved (cancel otherwise), cancel on `DragCancel`.

use super::{
    BaseTool, Behavior, Cursor, Tool, ToolAction, ToolActions, ToolDefinition, ToolId, ToolState,
    Transition,
};
use crate::commands::{Command, DuplicateContours, RemovePoints, SetPositions, ToggleSmooth};
use crate::editor::{Editor, SelectMode};
use crate::input::{Modifiers, ToolEvent};
use crate::overlay::{HandleShape, Overlay, OverlayStyle};
use crate::selection::SegmentRef;
use crate::snap::{
    DragSnapHandle, DragSnapSession, RotateSnapHandle, RotateSnapSession, SnapIndicator,
};
use glyph_core::hit::{self, Hit};
use glyph_core::{PointId, SegmentKind, SmartMovePlan};
use kurbo::{Affine, Point, Rect, Vec2};
use smallvec::smallvec;
use std::cell::RefCell;
use std::collections::HashSet;
use std::f64::consts::{PI, TAU};
use std::rc::Rc;

// ─── Selection box ───────────────────────────────────────────────────────

/// One of the eight resize handles of the selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl BoxHandle {
    pub const ALL: [BoxHandle; 8] = [
        BoxHandle::TopLeft,
        BoxHandle::Top,
        BoxHandle::TopRight,
        BoxHandle::Right,
        BoxHandle::BottomRight,
        BoxHandle::Bottom,
        BoxHandle::BottomLeft,
        BoxHandle::Left,
    ];

    pub const CORNERS: [BoxHandle; 4] = [
        BoxHandle::TopLeft,
        BoxHandle::TopRight,
        BoxHandle::BottomRight,
        BoxHandle::BottomLeft,
    ];

    pub fn position(self, r: Rect) -> Point {
        let c = r.center();
        match self {
            BoxHandle::TopLeft => Point::new(r.x0, r.y0),
            BoxHandle::Top => Point::new(c.x, r.y0),
            BoxHandle::TopRight => Point::new(r.x1, r.y0),
            BoxHandle::Right => Point::new(r.x1, c.y),
            BoxHandle::BottomRight => Point::new(r.x1, r.y1),
            BoxHandle::Bottom => Point::new(c.x, r.y1),
            BoxHandle::BottomLeft => Point::new(r.x0, r.y1),
            BoxHandle::Left => Point::new(r.x0, c.y),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            BoxHandle::TopLeft => BoxHandle::BottomRight,
            BoxHandle::Top => BoxHandle::Bottom,
            BoxHandle::TopRight => BoxHandle::BottomLeft,
            BoxHandle::Right => BoxHandle::Left,
            BoxHandle::BottomRight => BoxHandle::TopLeft,
            BoxHandle::Bottom => BoxHandle::Top,
            BoxHandle::BottomLeft => BoxHandle::TopRight,
            BoxHandle::Left => BoxHandle::Right,
        }
    }

    pub fn is_corner(self) -> bool {
        Self::CORNERS.contains(&self)
    }

    fn scales_x(self) -> bool {
        !matches!(self, BoxHandle::Top | BoxHandle::Bottom)
    }

    fn scales_y(self) -> bool {
        !matches!(self, BoxHandle::Left | BoxHandle::Right)
    }

    fn cursor(self) -> Cursor {
        match self {
            BoxHandle::TopLeft | BoxHandle::BottomRight => Cursor::ResizeNwse,
            BoxHandle::TopRight | BoxHandle::BottomLeft => Cursor::ResizeNesw,
            BoxHandle::Top | BoxHandle::Bottom => Cursor::ResizeNs,
            BoxHandle::Left | BoxHandle::Right => Cursor::ResizeEw,
        }
    }
}

/// Bounding box of the selection, when it has at least two points and
/// is not a single point.
fn selection_box(editor: &Editor) -> Option<Rect> {
    if editor.selection.points().len() < 2 {
        return None;
    }
    let r = editor.selection_bounds()?;
    (r.width() > 0.0 || r.height() > 0.0).then_some(r)
}

fn handle_at(editor: &Editor, pos: Point) -> Option<BoxHandle> {
    let r = selection_box(editor)?;
    let radius = editor.hit_radius();
    BoxHandle::ALL
        .into_iter()
        .find(|h| h.position(r).distance(pos) <= radius)
}

/// The selection box, if `pos` is in the rotate zone just outside a corner.
fn rotate_zone_at(editor: &Editor, pos: Point) -> Option<Rect> {
    let r = selection_box(editor)?;
    if r.contains(pos) {
        return None;
    }
    let radius = editor.hit_radius();
    BoxHandle::CORNERS
        .into_iter()
        .map(|h| h.position(r).distance(pos))
        .any(|d| d > radius && d <= radius * 3.0)
        .then_some(r)
}

/// Selected points plus the handles that ride along with them.
fn selected_with_handles(editor: &Editor) -> SmartMovePlan {
    let ids: HashSet<PointId> = editor.selection.points().iter().copied().collect();
    SmartMovePlan::new(&editor.glyph, &ids)
}

fn moved(initial: &[(PointId, Point)], positions: &[(PointId, Point)]) -> bool {
    initial
        .iter()
        .zip(positions)
        .any(|((_, a), (_, b))| (*a - *b).hypot() > 1e-9)
}

// ─── State ───────────────────────────────────────────────────────────────

/// What the pointer is over while the tool is ready.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HoverTarget {
    #[default]
    None,
    Point,
    Segment,
    Handle(BoxHandle),
    Rotate,
}

#[derive(Debug, Clone)]
pub struct Marquee {
    pub origin: Point,
    pub current: Point,
    pub additive: bool,
}

impl Marquee {
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.origin, self.current)
    }
}

#[derive(Debug, Clone)]
pub struct TranslateDrag {
    plan: SmartMovePlan,
    /// Initial position of the grabbed point; snapping is applied to it.
    anchor: Point,
    delta: Vec2,
    duplicated: bool,
    snap: DragSnapHandle,
}

impl TranslateDrag {
    fn snapped_delta(&self, editor: &Editor, delta: Vec2, modifiers: Modifiers) -> Vec2 {
        let raw = self.anchor + delta;
        let snapped = self
            .snap
            .borrow_mut()
            .snap(&editor.glyph, raw, modifiers, editor.px());
        snapped.point - self.anchor
    }
}

#[derive(Debug, Clone)]
pub struct RotateDrag {
    center: Point,
    start_angle: f64,
    angle: f64,
    initial: Vec<(PointId, Point)>,
    snap: RotateSnapHandle,
}

impl RotateDrag {
    fn positions(&self, angle: f64) -> Vec<(PointId, Point)> {
        let rotate = Affine::rotate_about(angle, self.center);
        self.initial.iter().map(|&(id, p)| (id, rotate * p)).collect()
    }

    fn snapped_angle(&self, pointer: Point, modifiers: Modifiers) -> f64 {
        let raw = wrap_angle((pointer - self.center).atan2() - self.start_angle);
        self.snap.borrow_mut().snap(raw, modifiers).delta
    }
}

fn wrap_angle(a: f64) -> f64 {
    (a + PI).rem_euclid(TAU) - PI
}

#[derive(Debug, Clone)]
pub struct ResizeDrag {
    handle: BoxHandle,
    bounds: Rect,
    initial: Vec<(PointId, Point)>,
}

impl ResizeDrag {
    fn positions(&self, pointer: Point, uniform: bool) -> Vec<(PointId, Point)> {
        let anchor = self.handle.opposite().position(self.bounds);
        let extent = self.handle.position(self.bounds) - anchor;
        let target = pointer - anchor;
        let mut sx = if self.handle.scales_x() && extent.x.abs() > f64::EPSILON {
            target.x / extent.x
        } else {
            1.0
        };
        let mut sy = if self.handle.scales_y() && extent.y.abs() > f64::EPSILON {
            target.y / extent.y
        } else {
            1.0
        };
        if uniform {
            let s = if !self.handle.scales_y() || (self.handle.is_corner() && sx.abs() > sy.abs()) {
                sx
            } else {
                sy
            };
            sx = s;
            sy = s;
        }
        self.initial
            .iter()
            .map(|&(id, p)| {
                let v = p - anchor;
                (id, anchor + Vec2::new(v.x * sx, v.y * sy))
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct BendDrag {
    plan: SmartMovePlan,
    /// Pointer-to-control movement ratio for the grabbed curve parameter.
    gain: f64,
    delta: Vec2,
}

#[derive(Debug, Clone)]
pub enum SelectState {
    Idle,
    Ready { hover: HoverTarget },
    Selecting(Marquee),
    Translating(TranslateDrag),
    Rotating(RotateDrag),
    Resizing(ResizeDrag),
    Bending(BendDrag),
}

impl ToolState for SelectState {
    fn idle() -> Self {
        SelectState::Idle
    }

    fn ready() -> Self {
        SelectState::Ready {
            hover: HoverTarget::None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SelectState::Idle => "idle",
            SelectState::Ready { .. } => "ready",
            SelectState::Selecting(_) => "selecting",
            SelectState::Translating(_) => "translating",
            SelectState::Rotating(_) => "rotating",
            SelectState::Resizing(_) => "resizing",
            SelectState::Bending(_) => "bending",
        }
    }

    fn is_dragging(&self) -> bool {
        !matches!(self, SelectState::Idle | SelectState::Ready { .. })
    }
}

impl SelectState {
    fn is_ready(&self) -> bool {
        matches!(self, SelectState::Ready { .. })
    }
}

fn is_drag_family(event: &ToolEvent) -> bool {
    matches!(
        event,
        ToolEvent::Drag(_) | ToolEvent::DragEnd(_) | ToolEvent::DragCancel
    )
}

// ─── Behaviors ───────────────────────────────────────────────────────────

/// Tracks what the pointer is over, for the cursor.
struct Hover;

impl Behavior<SelectState> for Hover {
    fn name(&self) -> &'static str {
        "hover"
    }

    fn can_handle(&self, state: &SelectState, event: &ToolEvent) -> bool {
        state.is_ready() && matches!(event, ToolEvent::PointerMove { .. })
    }

    fn transition(
        &self,
        state: &SelectState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<SelectState>> {
        let (SelectState::Ready { hover }, ToolEvent::PointerMove { point, .. }) = (state, event)
        else {
            return None;
        };
        let target = if let Some(h) = handle_at(editor, *point) {
            HoverTarget::Handle(h)
        } else if rotate_zone_at(editor, *point).is_some() {
            HoverTarget::Rotate
        } else if editor.point_at(*point).is_some() {
            HoverTarget::Point
        } else if editor.segment_at(*point).is_some() {
            HoverTarget::Segment
        } else {
            HoverTarget::None
        };
        if target == *hover {
            return Some(Transition::Stay);
        }
        Some(Transition::to(SelectState::Ready { hover: target }))
    }
}

/// Drag one of the eight selection-box handles. Shift scales uniformly.
struct Resize;

impl Behavior<SelectState> for Resize {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn can_handle(&self, state: &SelectState, event: &ToolEvent) -> bool {
        match state {
            SelectState::Ready { .. } => matches!(event, ToolEvent::DragStart(_)),
            SelectState::Resizing(_) => is_drag_family(event),
            _ => false,
        }
    }

    fn transition(
        &self,
        state: &SelectState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<SelectState>> {
        match (state, event) {
            (SelectState::Ready { .. }, ToolEvent::DragStart(d)) => {
                let handle = handle_at(editor, d.origin)?;
                let bounds = selection_box(editor)?;
                let drag = ResizeDrag {
                    handle,
                    bounds,
                    initial: selected_with_handles(editor).initial().to_vec(),
                };
                Some(Transition::with(
                    SelectState::Resizing(drag),
                    ToolAction::BeginPreview,
                ))
            }
            (SelectState::Resizing(r), ToolEvent::Drag(d)) => {
                let positions = r.positions(d.point, d.modifiers.shift);
                Some(Transition::with(
                    SelectState::Resizing(r.clone()),
                    ToolAction::SetPositions(positions),
                ))
            }
            (SelectState::Resizing(r), ToolEvent::DragEnd(d)) => {
                let positions = r.positions(d.point, d.modifiers.shift);
                let actions: ToolActions = if moved(&r.initial, &positions) {
                    smallvec![
                        ToolAction::SetPositions(positions),
                        ToolAction::CommitPreview("Resize".into()),
                    ]
                } else {
                    smallvec![ToolAction::CancelPreview]
                };
                Some(Transition::with_actions(SelectState::ready(), actions))
            }
            (SelectState::Resizing(_), ToolEvent::DragCancel) => Some(Transition::with(
                SelectState::ready(),
                ToolAction::CancelPreview,
            )),
            _ => None,
        }
    }

    fn render(&self, state: &SelectState, editor: &Editor, overlay: &mut Overlay) {
        let active = match state {
            SelectState::Ready { hover } => match hover {
                HoverTarget::Handle(h) => Some(*h),
                _ => None,
            },
            SelectState::Resizing(r) => Some(r.handle),
            _ => return,
        };
        let Some(r) = selection_box(editor) else {
            return;
        };
        overlay.rect(r, OverlayStyle::Selection);
        for h in BoxHandle::ALL {
            overlay.handle(h.position(r), HandleShape::Square, active == Some(h));
        }
    }
}

/// Drag just outside a selection-box corner to rotate about its centre.
struct Rotate;

impl Behavior<SelectState> for Rotate {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn can_handle(&self, state: &SelectState, event: &ToolEvent) -> bool {
        match state {
            SelectState::Ready { .. } => matches!(event, ToolEvent::DragStart(_)),
            SelectState::Rotating(_) => is_drag_family(event),
            _ => false,
        }
    }

    fn transition(
        &self,
        state: &SelectState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<SelectState>> {
        match (state, event) {
            (SelectState::Ready { .. }, ToolEvent::DragStart(d)) => {
                let bounds = rotate_zone_at(editor, d.origin)?;
                let center = bounds.center();
                let drag = RotateDrag {
                    center,
                    start_angle: (d.origin - center).atan2(),
                    angle: 0.0,
                    initial: selected_with_handles(editor).initial().to_vec(),
                    snap: Rc::new(RefCell::new(RotateSnapSession::new(
                        editor.config.snap.clone(),
                    ))),
                };
                Some(Transition::with(
                    SelectState::Rotating(drag),
                    ToolAction::BeginPreview,
                ))
            }
            (SelectState::Rotating(r), ToolEvent::Drag(d)) => {
                let angle = r.snapped_angle(d.point, d.modifiers);
                if angle == r.angle {
                    return Some(Transition::Stay);
                }
                let positions = r.positions(angle);
                Some(Transition::with(
                    SelectState::Rotating(RotateDrag { angle, ..r.clone() }),
                    ToolAction::SetPositions(positions),
                ))
            }
            (SelectState::Rotating(r), ToolEvent::DragEnd(d)) => {
                let angle = r.snapped_angle(d.point, d.modifiers);
                let actions: ToolActions = if angle.abs() > 1e-9 {
                    smallvec![
                        ToolAction::SetPositions(r.positions(angle)),
                        ToolAction::CommitPreview("Rotate".into()),
                    ]
                } else {
                    smallvec![ToolAction::CancelPreview]
                };
                Some(Transition::with_actions(SelectState::ready(), actions))
            }
            (SelectState::Rotating(_), ToolEvent::DragCancel) => Some(Transition::with(
                SelectState::ready(),
                ToolAction::CancelPreview,
            )),
            _ => None,
        }
    }

    fn on_transition(
        &self,
        prev: &SelectState,
        next: &SelectState,
        _event: &ToolEvent,
        _editor: &mut Editor,
    ) {
        if let SelectState::Rotating(r) = prev
            && !matches!(next, SelectState::Rotating(_))
        {
            r.snap.borrow_mut().clear();
        }
    }
}

/// Drag a point to move the selection; Alt duplicates first.
struct Translate;

impl Behavior<SelectState> for Translate {
    fn name(&self) -> &'static str {
        "translate"
    }

    fn can_handle(&self, state: &SelectState, event: &ToolEvent) -> bool {
        match state {
            SelectState::Ready { .. } => matches!(event, ToolEvent::DragStart(_)),
            SelectState::Translating(_) => is_drag_family(event),
            _ => false,
        }
    }

    fn transition(
        &self,
        state: &SelectState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<SelectState>> {
        match (state, event) {
            (SelectState::Ready { .. }, ToolEvent::DragStart(d)) => {
                let grabbed = editor.point_at(d.origin)?.point_id()?;
                let anchor = editor.glyph.point(grabbed)?.pos;

                let mut ids: HashSet<PointId> = if editor.selection.contains_point(grabbed) {
                    editor.selection.points().iter().copied().collect()
                } else if d.modifiers.shift {
                    let mut ids: HashSet<PointId> =
                        editor.selection.points().iter().copied().collect();
                    ids.insert(grabbed);
                    ids
                } else {
                    HashSet::from([grabbed])
                };

                let mut actions: ToolActions = smallvec![
                    ToolAction::SelectPoints {
                        ids: sorted(&ids),
                        mode: SelectMode::Replace,
                    },
                    ToolAction::BeginPreview,
                ];

                let duplicated = d.modifiers.alt;
                let plan = if duplicated {
                    // Plan against a scratch copy that already has the duplicates.
                    let duplicate = DuplicateContours::plan(&editor.glyph, ids);
                    let copies = duplicate.copies_of_source();
                    let mut scratch = editor.glyph.clone();
                    duplicate.clone().execute(&mut scratch).ok()?;
                    ids = copies.iter().copied().collect();
                    actions.push(ToolAction::Execute(Box::new(duplicate)));
                    actions.push(ToolAction::SelectPoints {
                        ids: copies,
                        mode: SelectMode::Replace,
                    });
                    SmartMovePlan::new(&scratch, &ids)
                } else {
                    SmartMovePlan::new(&editor.glyph, &ids)
                };

                let excluded = plan.initial().iter().map(|(id, _)| *id).collect();
                let snap = DragSnapSession::new(anchor, excluded, editor.config.snap.clone());
                let drag = TranslateDrag {
                    plan,
                    anchor,
                    delta: Vec2::ZERO,
                    duplicated,
                    snap: Rc::new(RefCell::new(snap)),
                };
                Some(Transition::with_actions(
                    SelectState::Translating(drag),
                    actions,
                ))
            }
            (SelectState::Translating(t), ToolEvent::Drag(d)) => {
                let delta = t.snapped_delta(editor, d.delta, d.modifiers);
                if delta == t.delta {
                    return Some(Transition::Stay);
                }
                Some(Transition::with(
                    SelectState::Translating(TranslateDrag {
                        delta,
                        ..t.clone()
                    }),
                    ToolAction::SetPositions(t.plan.positions(delta)),
                ))
            }
            (SelectState::Translating(t), ToolEvent::DragEnd(d)) => {
                let delta = t.snapped_delta(editor, d.delta, d.modifiers);
                let actions: ToolActions = if delta != Vec2::ZERO || t.duplicated {
                    let label = if t.duplicated {
                        "Duplicate"
                    } else {
                        "Move Points"
                    };
                    smallvec![
                        ToolAction::SetPositions(t.plan.positions(delta)),
                        ToolAction::CommitPreview(label.into()),
                    ]
                } else {
                    smallvec![ToolAction::CancelPreview]
                };
                Some(Transition::with_actions(SelectState::ready(), actions))
            }
            (SelectState::Translating(_), ToolEvent::DragCancel) => Some(Transition::with(
                SelectState::ready(),
                ToolAction::CancelPreview,
            )),
            _ => None,
        }
    }

    fn on_transition(
        &self,
        prev: &SelectState,
        next: &SelectState,
        _event: &ToolEvent,
        _editor: &mut Editor,
    ) {
        if let SelectState::Translating(t) = prev
            && !matches!(next, SelectState::Translating(_))
        {
            t.snap.borrow_mut().clear();
        }
    }

    fn render(&self, state: &SelectState, _editor: &Editor, overlay: &mut Overlay) {
        let SelectState::Translating(t) = state else {
            return;
        };
        match t.snap.borrow().indicator() {
            Some(SnapIndicator::Point(p)) => overlay.marker(p, OverlayStyle::Snap),
            Some(SnapIndicator::Line(l)) => overlay.line(l.p0, l.p1, OverlayStyle::Snap),
            None => {}
        }
    }
}

fn sorted(ids: &HashSet<PointId>) -> Vec<PointId> {
    let mut v: Vec<PointId> = ids.iter().copied().collect();
    v.sort();
    v
}

/// Drag a segment to bend it: curves move their controls, lines move
/// their endpoints.
struct Bend;

impl Behavior<SelectState> for Bend {
    fn name(&self) -> &'static str {
        "bend"
    }

    fn can_handle(&self, state: &SelectState, event: &ToolEvent) -> bool {
        match state {
            SelectState::Ready { .. } => matches!(event, ToolEvent::DragStart(_)),
            SelectState::Bending(_) => is_drag_family(event),
            _ => false,
        }
    }

    fn transition(
        &self,
        state: &SelectState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<SelectState>> {
        match (state, event) {
            (SelectState::Ready { .. }, ToolEvent::DragStart(d)) => {
                let Some(Hit::Segment(hit)) = editor.segment_at(d.origin) else {
                    return None;
                };
                let segment = &hit.segment;
                let t = hit.t;
                let (ids, gain): (HashSet<PointId>, f64) = match segment.kind {
                    SegmentKind::Line => (HashSet::from([segment.start, segment.end]), 1.0),
                    SegmentKind::Quad => (
                        segment.controls.iter().copied().collect(),
                        1.0 / (2.0 * t * (1.0 - t)).max(0.1),
                    ),
                    SegmentKind::Cubic => (
                        segment.controls.iter().copied().collect(),
                        1.0 / (3.0 * t * (1.0 - t)).max(0.1),
                    ),
                };
                let drag = BendDrag {
                    plan: SmartMovePlan::new(&editor.glyph, &ids),
                    gain,
                    delta: Vec2::ZERO,
                };
                Some(Transition::with_actions(
                    SelectState::Bending(drag),
                    [
                        ToolAction::SelectSegment {
                            segment: SegmentRef::from(segment),
                            mode: SelectMode::Replace,
                        },
                        ToolAction::BeginPreview,
                    ],
                ))
            }
            (SelectState::Bending(b), ToolEvent::Drag(d)) => {
                if d.delta == b.delta {
                    return Some(Transition::Stay);
                }
                Some(Transition::with(
                    SelectState::Bending(BendDrag {
                        delta: d.delta,
                        ..b.clone()
                    }),
                    ToolAction::SetPositions(b.plan.positions(d.delta * b.gain)),
                ))
            }
            (SelectState::Bending(b), ToolEvent::DragEnd(d)) => {
                let actions: ToolActions = if d.delta != Vec2::ZERO {
                    smallvec![
                        ToolAction::SetPositions(b.plan.positions(d.delta * b.gain)),
                        ToolAction::CommitPreview("Bend Segment".into()),
                    ]
                } else {
                    smallvec![ToolAction::CancelPreview]
                };
                Some(Transition::with_actions(SelectState::ready(), actions))
            }
            (SelectState::Bending(_), ToolEvent::DragCancel) => Some(Transition::with(
                SelectState::ready(),
                ToolAction::CancelPreview,
            )),
            _ => None,
        }
    }
}

/// Rubber-band selection from empty space. Shift adds to the selection.
struct MarqueeSelect;

impl Behavior<SelectState> for MarqueeSelect {
    fn name(&self) -> &'static str {
        "marquee"
    }

    fn can_handle(&self, state: &SelectState, event: &ToolEvent) -> bool {
        match state {
            SelectState::Ready { .. } => matches!(event, ToolEvent::DragStart(_)),
            SelectState::Selecting(_) => is_drag_family(event),
            _ => false,
        }
    }

    fn transition(
        &self,
        state: &SelectState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<SelectState>> {
        match (state, event) {
            (SelectState::Ready { .. }, ToolEvent::DragStart(d)) => {
                if editor.hit_test(d.origin).is_some() {
                    return None;
                }
                Some(Transition::to(SelectState::Selecting(Marquee {
                    origin: d.origin,
                    current: d.origin,
                    additive: d.modifiers.shift,
                })))
            }
            (SelectState::Selecting(m), ToolEvent::Drag(d)) => {
                Some(Transition::to(SelectState::Selecting(Marquee {
                    current: d.point,
                    ..m.clone()
                })))
            }
            (SelectState::Selecting(m), ToolEvent::DragEnd(d)) => {
                let rect = Rect::from_points(m.origin, d.point);
                let ids = hit::points_in_rect(&editor.glyph, rect);
                let mode = if m.additive {
                    SelectMode::Add
                } else {
                    SelectMode::Replace
                };
                Some(Transition::with(
                    SelectState::ready(),
                    ToolAction::SelectPoints { ids, mode },
                ))
            }
            (SelectState::Selecting(_), ToolEvent::DragCancel) => {
                Some(Transition::to(SelectState::ready()))
            }
            _ => None,
        }
    }

    fn render(&self, state: &SelectState, _editor: &Editor, overlay: &mut Overlay) {
        if let SelectState::Selecting(m) = state {
            overlay.rect(m.rect(), OverlayStyle::Marquee);
        }
    }
}

/// Click selects; Shift toggles; clicking empty space clears.
struct ClickSelect;

impl Behavior<SelectState> for ClickSelect {
    fn name(&self) -> &'static str {
        "click-select"
    }

    fn can_handle(&self, state: &SelectState, event: &ToolEvent) -> bool {
        state.is_ready() && matches!(event, ToolEvent::Click { .. })
    }

    fn transition(
        &self,
        state: &SelectState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<SelectState>> {
        let ToolEvent::Click {
            point, modifiers, ..
        } = event
        else {
            return None;
        };
        let mode = if modifiers.shift {
            SelectMode::Toggle
        } else {
            SelectMode::Replace
        };
        let action = match editor.hit_test(*point) {
            Some(Hit::Point { point: id, .. } | Hit::ContourEndpoint { point: id, .. }) => {
                ToolAction::SelectPoints {
                    ids: vec![id],
                    mode,
                }
            }
            Some(Hit::Segment(hit)) => ToolAction::SelectSegment {
                segment: SegmentRef::from(&hit.segment),
                mode,
            },
            Some(Hit::Anchor { .. }) => return Some(Transition::Stay),
            None if modifiers.shift || editor.selection.is_empty() => {
                return Some(Transition::Stay);
            }
            None => ToolAction::ClearSelection,
        };
        Some(Transition::with(state.clone(), action))
    }
}

/// Double-click a point to toggle smoothness, or a segment to select its
/// contour.
struct DoubleClick;

impl Behavior<SelectState> for DoubleClick {
    fn name(&self) -> &'static str {
        "double-click"
    }

    fn can_handle(&self, state: &SelectState, event: &ToolEvent) -> bool {
        state.is_ready() && matches!(event, ToolEvent::DoubleClick { .. })
    }

    fn transition(
        &self,
        state: &SelectState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<SelectState>> {
        let ToolEvent::DoubleClick { point, .. } = event else {
            return None;
        };
        match editor.hit_test(*point)? {
            Hit::Point { point: id, .. } => {
                if !editor.glyph.point(id)?.is_on_curve() {
                    return Some(Transition::Stay);
                }
                Some(Transition::with(
                    state.clone(),
                    ToolAction::Execute(Box::new(ToggleSmooth::new(id))),
                ))
            }
            Hit::Segment(hit) => {
                let contour = editor.glyph.contour(hit.segment.contour)?;
                Some(Transition::with(
                    state.clone(),
                    ToolAction::SelectPoints {
                        ids: contour.points.iter().map(|p| p.id).collect(),
                        mode: SelectMode::Replace,
                    },
                ))
            }
            _ => None,
        }
    }
}

/// Arrow nudges, Delete, and Escape.
struct Keyboard;

impl Behavior<SelectState> for Keyboard {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn can_handle(&self, state: &SelectState, event: &ToolEvent) -> bool {
        state.is_ready() && matches!(event, ToolEvent::KeyDown(_))
    }

    fn transition(
        &self,
        state: &SelectState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<SelectState>> {
        let ToolEvent::KeyDown(key) = event else {
            return None;
        };
        if editor.selection.is_empty() {
            return None;
        }
        let nudge = &editor.config.nudge;
        let step = if key.modifiers.command() {
            nudge.huge
        } else if key.modifiers.shift {
            nudge.large
        } else {
            nudge.small
        };
        let direction = match key.key.as_str() {
            "ArrowLeft" => Vec2::new(-1.0, 0.0),
            "ArrowRight" => Vec2::new(1.0, 0.0),
            "ArrowUp" => Vec2::new(0.0, -1.0),
            "ArrowDown" => Vec2::new(0.0, 1.0),
            "Delete" | "Backspace" => {
                return Some(Transition::with_actions(
                    state.clone(),
                    [
                        ToolAction::Execute(Box::new(RemovePoints::new(
                            editor.selection.point_ids(),
                        ))),
                        ToolAction::ClearSelection,
                    ],
                ));
            }
            "Escape" => {
                return Some(Transition::with(state.clone(), ToolAction::ClearSelection));
            }
            _ => return None,
        };
        let positions = selected_with_handles(editor).positions(direction * step);
        let command = SetPositions::capture("Nudge", &editor.glyph, positions).ok()?;
        Some(Transition::with(
            state.clone(),
            ToolAction::Execute(Box::new(command)),
        ))
    }
}

// ─── Tool ────────────────────────────────────────────────────────────────

pub struct SelectTool {
    behaviors: Vec<Box<dyn Behavior<SelectState>>>,
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectTool {
    pub fn new() -> Self {
        Self {
            behaviors: vec![
                Box::new(Hover),
                Box::new(Resize),
                Box::new(Rotate),
                Box::new(Translate),
                Box::new(Bend),
                Box::new(MarqueeSelect),
                Box::new(ClickSelect),
                Box::new(DoubleClick),
                Box::new(Keyboard),
            ],
        }
    }

    pub fn boxed() -> Box<dyn Tool> {
        Box::new(BaseTool::new(Self::new()))
    }
}

impl ToolDefinition for SelectTool {
    type State = SelectState;

    fn id(&self) -> ToolId {
        ToolId::intern("select")
    }

    fn behaviors(&self) -> &[Box<dyn Behavior<SelectState>>] {
        &self.behaviors
    }

    fn cursor(&self, state: &SelectState) -> Cursor {
        match state {
            SelectState::Idle => Cursor::Default,
            SelectState::Ready { hover } => match hover {
                HoverTarget::None => Cursor::Default,
                HoverTarget::Point => Cursor::Move,
                HoverTarget::Segment => Cursor::Pointer,
                HoverTarget::Handle(h) => h.cursor(),
                HoverTarget::Rotate => Cursor::Rotate,
            },
            SelectState::Selecting(_) => Cursor::Crosshair,
            SelectState::Translating(t) if t.duplicated => Cursor::Copy,
            SelectState::Translating(_) | SelectState::Bending(_) => Cursor::Move,
            SelectState::Rotating(_) => Cursor::Rotate,
            SelectState::Resizing(r) => r.handle.cursor(),
        }
    }

    fn abandon(&self, state: &SelectState) -> ToolActions {
        match state {
            SelectState::Translating(t) => {
                t.snap.borrow_mut().clear();
                smallvec![ToolAction::CancelPreview]
            }
            SelectState::Rotating(r) => {
                r.snap.borrow_mut().clear();
                smallvec![ToolAction::CancelPreview]
            }
            SelectState::Resizing(_) | SelectState::Bending(_) => {
                smallvec![ToolAction::CancelPreview]
            }
            _ => ToolActions::new(),
        }
    }
}
