//! Shape tool: drag out a rectangle or an ellipse as a new closed contour.

use super::{
    BaseTool, Behavior, Cursor, Tool, ToolAction, ToolDefinition, ToolId, ToolState, Transition,
};
use crate::commands::{AddContour, AddPoint, CloseContour, Command, CompositeCommand};
use crate::editor::Editor;
use crate::input::{Modifiers, ToolEvent};
use crate::overlay::{Overlay, OverlayStyle};
use glyph_core::{ContourId, GlyphPoint};
use kurbo::{Point, Rect, Vec2};

/// Circle approximation constant for cubic Béziers.
const KAPPA: f64 = 0.552_284_749_831;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
}

impl ShapeKind {
    fn label(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Draw Rectangle",
            ShapeKind::Ellipse => "Draw Ellipse",
        }
    }

    /// Contour points for `rect`, starting at its top-left (rectangle) or
    /// rightmost point (ellipse).
    pub fn points(self, rect: Rect) -> Vec<GlyphPoint> {
        match self {
            ShapeKind::Rectangle => [
                (rect.x0, rect.y0),
                (rect.x1, rect.y0),
                (rect.x1, rect.y1),
                (rect.x0, rect.y1),
            ]
            .into_iter()
            .map(|(x, y)| GlyphPoint::on_curve(Point::new(x, y)))
            .collect(),
            ShapeKind::Ellipse => {
                let c = rect.center();
                let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
                let (kx, ky) = (rx * KAPPA, ry * KAPPA);
                let on = |x: f64, y: f64| GlyphPoint::on_curve(c + Vec2::new(x, y)).smooth(true);
                let off = |x: f64, y: f64| GlyphPoint::off_curve(c + Vec2::new(x, y));
                vec![
                    on(rx, 0.0),
                    off(rx, ky),
                    off(kx, ry),
                    on(0.0, ry),
                    off(-kx, ry),
                    off(-rx, ky),
                    on(-rx, 0.0),
                    off(-rx, -ky),
                    off(-kx, -ry),
                    on(0.0, -ry),
                    off(kx, -ry),
                    off(rx, -ky),
                ]
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShapeDraw {
    pub kind: ShapeKind,
    pub origin: Point,
    pub current: Point,
    pub modifiers: Modifiers,
}

impl ShapeDraw {
    /// Shift constrains to a square, Alt draws from the centre.
    pub fn rect(&self) -> Rect {
        let mut d = self.current - self.origin;
        if self.modifiers.shift {
            let side = d.x.abs().max(d.y.abs());
            d = Vec2::new(side.copysign(d.x), side.copysign(d.y));
        }
        if self.modifiers.alt {
            Rect::from_points(self.origin - d, self.origin + d)
        } else {
            Rect::from_points(self.origin, self.origin + d)
        }
    }
}

#[derive(Debug, Clone)]
pub enum ShapeState {
    Idle,
    Ready { kind: ShapeKind },
    Drawing(ShapeDraw),
}

impl ToolState for ShapeState {
    fn idle() -> Self {
        ShapeState::Idle
    }

    fn ready() -> Self {
        ShapeState::Ready {
            kind: ShapeKind::default(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ShapeState::Idle => "idle",
            ShapeState::Ready { .. } => "ready",
            ShapeState::Drawing(_) => "drawing",
        }
    }

    fn is_dragging(&self) -> bool {
        matches!(self, ShapeState::Drawing(_))
    }
}

/// One undoable command filling the active contour with the closed shape,
/// then starting a fresh open contour. A new contour is added first when
/// the active one is missing, closed or already has points.
fn draw_command(kind: ShapeKind, rect: Rect, editor: &Editor) -> CompositeCommand {
    let mut steps: Vec<Box<dyn Command>> = Vec::new();
    let contour = match editor.glyph.active() {
        Some(c) if !c.closed && c.is_empty() => c.id,
        _ => {
            let id = ContourId::fresh();
            steps.push(Box::new(AddContour::new(id)));
            id
        }
    };
    for point in kind.points(rect) {
        steps.push(Box::new(AddPoint { contour, point }));
    }
    steps.push(Box::new(CloseContour { id: contour }));
    steps.push(Box::new(AddContour::new(ContourId::fresh())));
    CompositeCommand::new(kind.label(), steps)
}

// ─── Behaviors ───────────────────────────────────────────────────────────

struct Draw;

impl Behavior<ShapeState> for Draw {
    fn name(&self) -> &'static str {
        "draw"
    }

    fn can_handle(&self, state: &ShapeState, event: &ToolEvent) -> bool {
        match state {
            ShapeState::Ready { .. } => matches!(event, ToolEvent::DragStart(_)),
            ShapeState::Drawing(_) => matches!(
                event,
                ToolEvent::Drag(_) | ToolEvent::DragEnd(_) | ToolEvent::DragCancel
            ),
            ShapeState::Idle => false,
        }
    }

    fn transition(
        &self,
        state: &ShapeState,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<ShapeState>> {
        match (state, event) {
            (ShapeState::Ready { kind }, ToolEvent::DragStart(d)) => {
                Some(Transition::to(ShapeState::Drawing(ShapeDraw {
                    kind: *kind,
                    origin: d.origin,
                    current: d.point,
                    modifiers: d.modifiers,
                })))
            }
            (ShapeState::Drawing(s), ToolEvent::Drag(d)) => {
                Some(Transition::to(ShapeState::Drawing(ShapeDraw {
                    current: d.point,
                    modifiers: d.modifiers,
                    ..s.clone()
                })))
            }
            (ShapeState::Drawing(s), ToolEvent::DragEnd(d)) => {
                let shape = ShapeDraw {
                    current: d.point,
                    modifiers: d.modifiers,
                    ..s.clone()
                };
                let rect = shape.rect();
                let ready = ShapeState::Ready { kind: s.kind };
                if rect.area() <= f64::EPSILON {
                    log::debug!("shape: zero-area {:?} ignored", s.kind);
                    return Some(Transition::to(ready));
                }
                Some(Transition::with(
                    ready,
                    ToolAction::Execute(Box::new(draw_command(s.kind, rect, editor))),
                ))
            }
            (ShapeState::Drawing(s), ToolEvent::DragCancel) => {
                Some(Transition::to(ShapeState::Ready { kind: s.kind }))
            }
            _ => None,
        }
    }

    fn render(&self, state: &ShapeState, _editor: &Editor, overlay: &mut Overlay) {
        if let ShapeState::Drawing(s) = state {
            overlay.rect(s.rect(), OverlayStyle::Preview);
        }
    }
}

/// `r` and `e` switch between rectangle and ellipse.
struct PickKind;

impl Behavior<ShapeState> for PickKind {
    fn name(&self) -> &'static str {
        "pick-kind"
    }

    fn can_handle(&self, state: &ShapeState, event: &ToolEvent) -> bool {
        matches!(state, ShapeState::Ready { .. }) && matches!(event, ToolEvent::KeyDown(_))
    }

    fn transition(
        &self,
        state: &ShapeState,
        event: &ToolEvent,
        _editor: &Editor,
    ) -> Option<Transition<ShapeState>> {
        let (ShapeState::Ready { kind }, ToolEvent::KeyDown(key)) = (state, event) else {
            return None;
        };
        if key.modifiers.command() {
            return None;
        }
        let picked = match key.key.as_str() {
            "r" => ShapeKind::Rectangle,
            "e" => ShapeKind::Ellipse,
            _ => return None,
        };
        if picked == *kind {
            return Some(Transition::Stay);
        }
        Some(Transition::to(ShapeState::Ready { kind: picked }))
    }
}

// ─── Tool ────────────────────────────────────────────────────────────────

pub struct ShapeTool {
    behaviors: Vec<Box<dyn Behavior<ShapeState>>>,
}

impl Default for ShapeTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeTool {
    pub fn new() -> Self {
        Self {
            behaviors: vec![Box::new(Draw), Box::new(PickKind)],
        }
    }

    pub fn boxed() -> Box<dyn Tool> {
        Box::new(BaseTool::new(Self::new()))
    }
}

impl ToolDefinition for ShapeTool {
    type State = ShapeState;

    fn id(&self) -> ToolId {
        ToolId::intern("shape")
    }

    fn behaviors(&self) -> &[Box<dyn Behavior<ShapeState>>] {
        &self.behaviors
    }

    fn cursor(&self, state: &ShapeState) -> Cursor {
        match state {
            ShapeState::Idle => Cursor::Default,
            _ => Cursor::Crosshair,
        }
    }
}
