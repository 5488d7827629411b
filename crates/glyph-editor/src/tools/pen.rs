//! Pen tool: click to place corner points, press-drag to pull out smooth
//! handles, click the first point to close, click another open contour's
//! endpoint to continue it.

use super::{
    BaseTool, Behavior, Cursor, Tool, ToolAction, ToolActions, ToolDefinition, ToolId, ToolState,
    Transition,
};
use crate::commands::{
    AddContour, AddPoint, CloseContour, Command, CompositeCommand, ReverseContour,
    SetActiveContour,
};
use crate::editor::Editor;
use crate::input::ToolEvent;
use crate::overlay::{HandleShape, Overlay, OverlayStyle};
use glyph_core::{ContourId, Endpoint, GlyphPoint, Hit, PointId};
use kurbo::{Point, Vec2};
use smallvec::smallvec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PenHover {
    #[default]
    None,
    /// Over the first point of the active contour.
    Close,
    /// Over an endpoint of another open contour.
    Continue,
}

#[derive(Debug, Clone)]
pub struct AnchorDrag {
    pub anchor: Point,
    pub in_handle: Option<PointId>,
    pub out_handle: PointId,
    pub delta: Vec2,
}

impl AnchorDrag {
    fn positions(&self, delta: Vec2) -> Vec<(PointId, Point)> {
        let mut positions = vec![(self.out_handle, self.anchor + delta)];
        if let Some(id) = self.in_handle {
            positions.push((id, self.anchor - delta));
        }
        positions
    }
}

#[derive(Debug, Clone)]
pub enum PenState {
    Idle,
    Ready { hover: PenHover },
    Anchoring(AnchorDrag),
}

impl ToolState for PenState {
    fn idle() -> Self {
        PenState::Idle
    }

    fn ready() -> Self {
        PenState::Ready {
            hover: PenHover::None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PenState::Idle => "idle",
            PenState::Ready { .. } => "ready",
            PenState::Anchoring(_) => "anchoring",
        }
    }

    fn is_dragging(&self) -> bool {
        matches!(self, PenState::Anchoring(_))
    }
}

/// The open contour new points go to, plus the commands needed to create
/// it when there is none.
fn drawing_contour(editor: &Editor) -> (ContourId, Vec<Box<dyn Command>>) {
    match editor.glyph.active() {
        Some(c) if !c.closed => (c.id, Vec::new()),
        _ => {
            let id = ContourId::fresh();
            (id, vec![Box::new(AddContour::new(id)) as Box<dyn Command>])
        }
    }
}

/// Active open contour whose first point is at `pos`, if it can be closed.
fn closable_at(editor: &Editor, pos: Point) -> Option<ContourId> {
    let Hit::Point { contour, point } = editor.point_at(pos)? else {
        return None;
    };
    let active = editor.glyph.active()?;
    (active.id == contour && !active.closed && active.len() >= 2 && active.first()?.id == point)
        .then_some(contour)
}

/// Another open contour with an endpoint at `pos`.
fn continuable_at(editor: &Editor, pos: Point) -> Option<(ContourId, Endpoint)> {
    let Hit::ContourEndpoint { contour, end, .. } = editor.contour_endpoint_at(pos)? else {
        return None;
    };
    (editor.glyph.active_contour != Some(contour)).then_some((contour, end))
}

// ─── Behaviors ───────────────────────────────────────────────────────────

struct Hover;

impl Behavior<PenState> for Hover {
    fn name(&self) -> &'static str {
        "hover"
    }

    fn can_handle(&self, state: &PenState, event: &ToolEvent) -> bool {
        matches!(state, PenState::Ready { .. }) && matches!(event, ToolEvent::PointerMove { .. })
    }

    fn transition(
        &self,
        state: &PenState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<PenState>> {
        let (PenState::Ready { hover }, ToolEvent::PointerMove { point, .. }) = (state, event)
        else {
            return None;
        };
        let target = if closable_at(editor, *point).is_some() {
            PenHover::Close
        } else if continuable_at(editor, *point).is_some() {
            PenHover::Continue
        } else {
            PenHover::None
        };
        if target == *hover {
            return Some(Transition::Stay);
        }
        Some(Transition::to(PenState::Ready { hover: target }))
    }
}

/// Click: close, continue, or append a corner point.
struct PlacePoint;

impl Behavior<PenState> for PlacePoint {
    fn name(&self) -> &'static str {
        "place-point"
    }

    fn can_handle(&self, state: &PenState, event: &ToolEvent) -> bool {
        matches!(state, PenState::Ready { .. }) && matches!(event, ToolEvent::Click { .. })
    }

    fn transition(
        &self,
        _state: &PenState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<PenState>> {
        let ToolEvent::Click { point, .. } = event else {
            return None;
        };
        let command: Box<dyn Command> = if let Some(contour) = closable_at(editor, *point) {
            Box::new(CompositeCommand::new(
                "Close Contour",
                vec![
                    Box::new(CloseContour { id: contour }),
                    Box::new(AddContour::new(ContourId::fresh())),
                ],
            ))
        } else if let Some((contour, end)) = continuable_at(editor, *point) {
            let mut steps: Vec<Box<dyn Command>> = Vec::new();
            if end == Endpoint::Start {
                steps.push(Box::new(ReverseContour { id: contour }));
            }
            steps.push(Box::new(SetActiveContour::new(Some(contour))));
            Box::new(CompositeCommand::new("Continue Contour", steps))
        } else if editor.point_at(*point).is_some() {
            return Some(Transition::Stay);
        } else {
            let (contour, mut steps) = drawing_contour(editor);
            steps.push(Box::new(AddPoint {
                contour,
                point: GlyphPoint::on_curve(*point),
            }));
            Box::new(CompositeCommand::new("Add Point", steps))
        };
        Some(Transition::with(
            PenState::ready(),
            ToolAction::Execute(command),
        ))
    }
}

/// Press-drag: add a smooth anchor and pull symmetric handles.
struct PullHandles;

impl Behavior<PenState> for PullHandles {
    fn name(&self) -> &'static str {
        "pull-handles"
    }

    fn can_handle(&self, state: &PenState, event: &ToolEvent) -> bool {
        match state {
            PenState::Ready { .. } => matches!(event, ToolEvent::DragStart(_)),
            PenState::Anchoring(_) => matches!(
                event,
                ToolEvent::Drag(_) | ToolEvent::DragEnd(_) | ToolEvent::DragCancel
            ),
            PenState::Idle => false,
        }
    }

    fn transition(
        &self,
        state: &PenState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<PenState>> {
        match (state, event) {
            (PenState::Ready { .. }, ToolEvent::DragStart(d)) => {
                if editor.point_at(d.origin).is_some() {
                    return None;
                }
                let (contour, setup) = drawing_contour(editor);
                let has_points = editor
                    .glyph
                    .contour(contour)
                    .is_some_and(|c| !c.is_empty());

                let mut actions: ToolActions = smallvec![ToolAction::BeginPreview];
                actions.extend(setup.into_iter().map(ToolAction::Execute));

                let in_handle = has_points.then(|| GlyphPoint::off_curve(d.origin));
                let anchor = GlyphPoint::on_curve(d.origin).smooth(true);
                let out_handle = GlyphPoint::off_curve(d.origin);
                for point in in_handle.into_iter().chain([anchor, out_handle]) {
                    actions.push(ToolAction::Execute(Box::new(AddPoint { contour, point })));
                }

                let drag = AnchorDrag {
                    anchor: d.origin,
                    in_handle: in_handle.map(|p| p.id),
                    out_handle: out_handle.id,
                    delta: Vec2::ZERO,
                };
                actions.push(ToolAction::SetPositions(drag.positions(d.delta)));
                Some(Transition::with_actions(
                    PenState::Anchoring(AnchorDrag {
                        delta: d.delta,
                        ..drag
                    }),
                    actions,
                ))
            }
            (PenState::Anchoring(a), ToolEvent::Drag(d)) => {
                if d.delta == a.delta {
                    return Some(Transition::Stay);
                }
                Some(Transition::with(
                    PenState::Anchoring(AnchorDrag {
                        delta: d.delta,
                        ..a.clone()
                    }),
                    ToolAction::SetPositions(a.positions(d.delta)),
                ))
            }
            (PenState::Anchoring(a), ToolEvent::DragEnd(d)) => Some(Transition::with_actions(
                PenState::ready(),
                [
                    ToolAction::SetPositions(a.positions(d.delta)),
                    ToolAction::CommitPreview("Add Point".into()),
                ],
            )),
            (PenState::Anchoring(_), ToolEvent::DragCancel) => Some(Transition::with(
                PenState::ready(),
                ToolAction::CancelPreview,
            )),
            _ => None,
        }
    }

    fn render_below_handles(&self, state: &PenState, editor: &Editor, overlay: &mut Overlay) {
        let PenState::Anchoring(a) = state else {
            return;
        };
        for (id, _) in a.positions(a.delta) {
            if let Some(p) = editor.glyph.point(id) {
                overlay.line(a.anchor, p.pos, OverlayStyle::Preview);
                overlay.handle(p.pos, HandleShape::Circle, true);
            }
        }
    }
}

/// Escape ends the active contour.
struct EndContour;

impl Behavior<PenState> for EndContour {
    fn name(&self) -> &'static str {
        "end-contour"
    }

    fn can_handle(&self, state: &PenState, event: &ToolEvent) -> bool {
        matches!(state, PenState::Ready { .. })
            && matches!(event, ToolEvent::KeyDown(k) if k.is("Escape"))
    }

    fn transition(
        &self,
        state: &PenState,
        _event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<PenState>> {
        editor.glyph.active_contour?;
        Some(Transition::with(
            state.clone(),
            ToolAction::Execute(Box::new(SetActiveContour::new(None))),
        ))
    }
}

// ─── Tool ────────────────────────────────────────────────────────────────

pub struct PenTool {
    behaviors: Vec<Box<dyn Behavior<PenState>>>,
}

impl Default for PenTool {
    fn default() -> Self {
        Self::new()
    }
}

impl PenTool {
    pub fn new() -> Self {
        Self {
            behaviors: vec![
                Box::new(Hover),
                Box::new(PullHandles),
                Box::new(PlacePoint),
                Box::new(EndContour),
            ],
        }
    }

    pub fn boxed() -> Box<dyn Tool> {
        Box::new(BaseTool::new(Self::new()))
    }
}

impl ToolDefinition for PenTool {
    type State = PenState;

    fn id(&self) -> ToolId {
        ToolId::intern("pen")
    }

    fn behaviors(&self) -> &[Box<dyn Behavior<PenState>>] {
        &self.behaviors
    }

    fn cursor(&self, state: &PenState) -> Cursor {
        match state {
            PenState::Idle => Cursor::Default,
            PenState::Ready { hover } => match hover {
                PenHover::None => Cursor::Pen,
                PenHover::Close => Cursor::PenClose,
                PenHover::Continue => Cursor::PenContinue,
            },
            PenState::Anchoring(_) => Cursor::Move,
        }
    }

    fn abandon(&self, state: &PenState) -> ToolActions {
        match state {
            PenState::Anchoring(_) => smallvec![ToolAction::CancelPreview],
            _ => ToolActions::new(),
        }
    }

    fn has_below_handles(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::input::{DragEvent, KeyEvent, Modifiers};
    use glyph_core::{Glyph, PointKind};
    use pretty_assertions::assert_eq;

    fn setup() -> (Editor, BaseTool<PenTool>) {
        let mut editor = Editor::new(Glyph::new("a", Some(0x61), 500.0), EditorConfig::default());
        let mut tool = BaseTool::new(PenTool::new());
        tool.activate(&mut editor);
        (editor, tool)
    }

    fn click(tool: &mut BaseTool<PenTool>, editor: &mut Editor, x: f64, y: f64) {
        let p = Point::new(x, y);
        tool.handle_event(
            &ToolEvent::Click {
                point: p,
                screen_point: p,
                modifiers: Modifiers::NONE,
            },
            editor,
        );
    }

    fn drag(origin: Point, point: Point) -> DragEvent {
        DragEvent {
            point,
            screen_point: point,
            origin,
            screen_origin: origin,
            delta: point - origin,
            screen_delta: point - origin,
            modifiers: Modifiers::NONE,
        }
    }

    #[test]
    fn clicks_append_corner_points() {
        let (mut editor, mut tool) = setup();
        click(&mut tool, &mut editor, 0.0, 0.0);
        click(&mut tool, &mut editor, 100.0, 0.0);
        assert_eq!(editor.glyph.contours.len(), 1);
        assert_eq!(editor.glyph.contours[0].len(), 2);
        assert_eq!(editor.commands.undo_len(), 2);
        assert_eq!(editor.commands.undo_label(), Some("Add Point"));

        editor.undo().unwrap();
        editor.undo().unwrap();
        assert!(editor.glyph.contours.is_empty());
    }

    #[test]
    fn clicking_first_point_closes_and_starts_new_contour() {
        let (mut editor, mut tool) = setup();
        click(&mut tool, &mut editor, 0.0, 0.0);
        click(&mut tool, &mut editor, 100.0, 0.0);
        click(&mut tool, &mut editor, 100.0, 100.0);
        click(&mut tool, &mut editor, 1.0, 1.0);
        let first = &editor.glyph.contours[0];
        assert!(first.closed);
        assert_eq!(first.len(), 3);
        assert_eq!(editor.glyph.contours.len(), 2);
        assert_eq!(
            editor.glyph.active_contour,
            Some(editor.glyph.contours[1].id)
        );
        assert_eq!(editor.commands.undo_label(), Some("Close Contour"));
    }

    #[test]
    fn clicking_start_of_other_contour_reverses_and_continues() {
        let (mut editor, mut tool) = setup();
        click(&mut tool, &mut editor, 0.0, 0.0);
        click(&mut tool, &mut editor, 100.0, 0.0);
        let first = editor.glyph.contours[0].id;
        tool.handle_event(
            &ToolEvent::KeyDown(KeyEvent::new("Escape", Modifiers::NONE)),
            &mut editor,
        );
        assert_eq!(editor.glyph.active_contour, None);

        click(&mut tool, &mut editor, 0.0, 0.0);
        assert_eq!(editor.glyph.active_contour, Some(first));
        let contour = editor.glyph.contour(first).unwrap();
        assert_eq!(contour.last().unwrap().pos, Point::new(0.0, 0.0));

        click(&mut tool, &mut editor, -50.0, 0.0);
        assert_eq!(editor.glyph.contour(first).unwrap().len(), 3);
    }

    #[test]
    fn drag_adds_smooth_anchor_with_symmetric_handles() {
        let (mut editor, mut tool) = setup();
        click(&mut tool, &mut editor, 0.0, 0.0);
        let origin = Point::new(100.0, 0.0);
        let to = Point::new(130.0, 20.0);
        tool.handle_event(
            &ToolEvent::DragStart(drag(origin, Point::new(103.0, 0.0))),
            &mut editor,
        );
        tool.handle_event(&ToolEvent::Drag(drag(origin, to)), &mut editor);
        tool.handle_event(&ToolEvent::DragEnd(drag(origin, to)), &mut editor);

        let points = &editor.glyph.contours[0].points;
        let kinds: Vec<PointKind> = points.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PointKind::OnCurve,
                PointKind::OffCurve,
                PointKind::OnCurve,
                PointKind::OffCurve
            ]
        );
        assert!(points[2].smooth);
        assert_eq!(points[1].pos, Point::new(70.0, -20.0));
        assert_eq!(points[3].pos, Point::new(130.0, 20.0));
        assert_eq!(editor.commands.undo_len(), 2);
        assert_eq!(editor.commands.undo_label(), Some("Add Point"));
    }

    #[test]
    fn cancelled_drag_leaves_no_trace() {
        let (mut editor, mut tool) = setup();
        click(&mut tool, &mut editor, 0.0, 0.0);
        let before = editor.glyph.clone();
        let origin = Point::new(100.0, 0.0);
        tool.handle_event(&ToolEvent::DragStart(drag(origin, origin)), &mut editor);
        tool.handle_event(
            &ToolEvent::Drag(drag(origin, Point::new(120.0, 0.0))),
            &mut editor,
        );
        tool.handle_event(&ToolEvent::DragCancel, &mut editor);
        assert_eq!(editor.glyph, before);
        assert_eq!(editor.commands.undo_len(), 1);
    }

    #[test]
    fn hover_over_first_point_shows_close_cursor() {
        let (mut editor, mut tool) = setup();
        click(&mut tool, &mut editor, 0.0, 0.0);
        click(&mut tool, &mut editor, 100.0, 0.0);
        let p = Point::new(2.0, 0.0);
        tool.handle_event(
            &ToolEvent::PointerMove {
                point: p,
                screen_point: p,
                modifiers: Modifiers::NONE,
            },
            &mut editor,
        );
        assert_eq!(editor.signals.cursor.get(), Cursor::PenClose);
    }
}
