//! Hand tool: drag to pan. Also the hold-Space temporary tool.

use super::{
    BaseTool, Behavior, Cursor, Tool, ToolAction, ToolDefinition, ToolId, ToolState, Transition,
};
use crate::editor::Editor;
use crate::input::ToolEvent;
use kurbo::Point;

#[derive(Debug, Clone, PartialEq)]
pub enum HandState {
    Idle,
    Ready,
    /// Screen positions: where the drag started and where it last panned to.
    Panning { origin: Point, last: Point },
}

impl ToolState for HandState {
    fn idle() -> Self {
        HandState::Idle
    }

    fn ready() -> Self {
        HandState::Ready
    }

    fn name(&self) -> &'static str {
        match self {
            HandState::Idle => "idle",
            HandState::Ready => "ready",
            HandState::Panning { .. } => "panning",
        }
    }

    fn is_dragging(&self) -> bool {
        matches!(self, HandState::Panning { .. })
    }
}

struct Pan;

impl Behavior<HandState> for Pan {
    fn name(&self) -> &'static str {
        "pan"
    }

    fn can_handle(&self, state: &HandState, event: &ToolEvent) -> bool {
        match state {
            HandState::Ready => matches!(event, ToolEvent::DragStart(_)),
            HandState::Panning { .. } => matches!(
                event,
                ToolEvent::Drag(_) | ToolEvent::DragEnd(_) | ToolEvent::DragCancel
            ),
            HandState::Idle => false,
        }
    }

    fn transition(
        &self,
        state: &HandState,
        event: &ToolEvent,
        _editor: &Editor,
    ) -> Option<Transition<HandState>> {
        match (state, event) {
            (HandState::Ready, ToolEvent::DragStart(d)) => Some(Transition::with(
                HandState::Panning {
                    origin: d.screen_origin,
                    last: d.screen_point,
                },
                ToolAction::Pan(d.screen_delta),
            )),
            (HandState::Panning { origin, last }, ToolEvent::Drag(d)) => {
                if d.screen_point == *last {
                    return Some(Transition::Stay);
                }
                Some(Transition::with(
                    HandState::Panning {
                        origin: *origin,
                        last: d.screen_point,
                    },
                    ToolAction::Pan(d.screen_point - *last),
                ))
            }
            (HandState::Panning { last, .. }, ToolEvent::DragEnd(d)) => Some(Transition::with(
                HandState::Ready,
                ToolAction::Pan(d.screen_point - *last),
            )),
            // Undo the whole pan.
            (HandState::Panning { origin, last }, ToolEvent::DragCancel) => Some(
                Transition::with(HandState::Ready, ToolAction::Pan(*origin - *last)),
            ),
            _ => None,
        }
    }
}

pub struct HandTool {
    behaviors: Vec<Box<dyn Behavior<HandState>>>,
}

impl Default for HandTool {
    fn default() -> Self {
        Self::new()
    }
}

impl HandTool {
    pub fn new() -> Self {
        Self {
            behaviors: vec![Box::new(Pan)],
        }
    }

    pub fn boxed() -> Box<dyn Tool> {
        Box::new(BaseTool::new(Self::new()))
    }
}

impl ToolDefinition for HandTool {
    type State = HandState;

    fn id(&self) -> ToolId {
        ToolId::intern("hand")
    }

    fn behaviors(&self) -> &[Box<dyn Behavior<HandState>>] {
        &self.behaviors
    }

    fn cursor(&self, state: &HandState) -> Cursor {
        match state {
            HandState::Idle => Cursor::Default,
            HandState::Ready => Cursor::Grab,
            HandState::Panning { .. } => Cursor::Grabbing,
        }
    }
}
