//! Text tool: click to place a caret, type, Enter to commit the run.

use super::{
    BaseTool, Behavior, Cursor, Tool, ToolAction, ToolActions, ToolDefinition, ToolId, ToolState,
    Transition,
};
use crate::editor::{Editor, TextRun};
use crate::input::ToolEvent;
use crate::overlay::{Overlay, OverlayItem, OverlayStyle};
use kurbo::Vec2;
use smallvec::smallvec;

#[derive(Debug, Clone, PartialEq)]
pub enum TextState {
    Idle,
    Ready,
    Typing(TextRun),
}

impl ToolState for TextState {
    fn idle() -> Self {
        TextState::Idle
    }

    fn ready() -> Self {
        TextState::Ready
    }

    fn name(&self) -> &'static str {
        match self {
            TextState::Idle => "idle",
            TextState::Ready => "ready",
            TextState::Typing(_) => "typing",
        }
    }
}

fn commit(run: &TextRun) -> ToolActions {
    if run.text.is_empty() {
        ToolActions::new()
    } else {
        smallvec![ToolAction::InsertText(run.clone())]
    }
}

/// Click places a caret; clicking elsewhere while typing commits first.
struct PlaceCaret;

impl Behavior<TextState> for PlaceCaret {
    fn name(&self) -> &'static str {
        "place-caret"
    }

    fn can_handle(&self, state: &TextState, event: &ToolEvent) -> bool {
        !state.is_idle() && matches!(event, ToolEvent::Click { .. })
    }

    fn transition(
        &self,
        state: &TextState,
        event: &ToolEvent,
        _editor: &Editor,
    ) -> Option<Transition<TextState>> {
        let ToolEvent::Click { point, .. } = event else {
            return None;
        };
        let actions = match state {
            TextState::Typing(run) => commit(run),
            _ => ToolActions::new(),
        };
        Some(Transition::with_actions(
            TextState::Typing(TextRun {
                origin: *point,
                text: String::new(),
            }),
            actions,
        ))
    }
}

/// Keys while typing. Every key is consumed so shortcuts do not fire.
struct Type;

impl Behavior<TextState> for Type {
    fn name(&self) -> &'static str {
        "type"
    }

    fn can_handle(&self, state: &TextState, event: &ToolEvent) -> bool {
        matches!(state, TextState::Typing(_)) && matches!(event, ToolEvent::KeyDown(_))
    }

    fn transition(
        &self,
        state: &TextState,
        event: &ToolEvent,
        _editor: &Editor,
    ) -> Option<Transition<TextState>> {
        let (TextState::Typing(run), ToolEvent::KeyDown(key)) = (state, event) else {
            return None;
        };
        match key.key.as_str() {
            "Enter" => Some(Transition::with_actions(TextState::Ready, commit(run))),
            "Escape" => Some(Transition::to(TextState::Ready)),
            "Backspace" => {
                if run.text.is_empty() {
                    return Some(Transition::Stay);
                }
                let mut run = run.clone();
                run.text.pop();
                Some(Transition::to(TextState::Typing(run)))
            }
            k if !key.modifiers.command() && k.chars().count() == 1 => {
                let mut run = run.clone();
                run.text.push_str(k);
                Some(Transition::to(TextState::Typing(run)))
            }
            _ => Some(Transition::Stay),
        }
    }

    fn render(&self, state: &TextState, editor: &Editor, overlay: &mut Overlay) {
        let TextState::Typing(run) = state else {
            return;
        };
        if !run.text.is_empty() {
            overlay.push(OverlayItem::Text {
                at: run.origin,
                text: run.text.clone(),
            });
        }
        // Caret: a line as tall as the cap height above the baseline.
        let height = editor.glyph.metrics.cap_height;
        overlay.line(
            run.origin,
            run.origin + Vec2::new(0.0, -height),
            OverlayStyle::Preview,
        );
    }
}

pub struct TextTool {
    behaviors: Vec<Box<dyn Behavior<TextState>>>,
}

impl Default for TextTool {
    fn default() -> Self {
        Self::new()
    }
}

impl TextTool {
    pub fn new() -> Self {
        Self {
            behaviors: vec![Box::new(PlaceCaret), Box::new(Type)],
        }
    }

    pub fn boxed() -> Box<dyn Tool> {
        Box::new(BaseTool::new(Self::new()))
    }
}

impl ToolDefinition for TextTool {
    type State = TextState;

    fn id(&self) -> ToolId {
        ToolId::intern("text")
    }

    fn behaviors(&self) -> &[Box<dyn Behavior<TextState>>] {
        &self.behaviors
    }

    fn cursor(&self, state: &TextState) -> Cursor {
        match state {
            TextState::Idle => Cursor::Default,
            _ => Cursor::Text,
        }
    }

    /// Switching tools keeps what was typed.
    fn abandon(&self, state: &TextState) -> ToolActions {
        match state {
            TextState::Typing(run) => commit(run),
            _ => ToolActions::new(),
        }
    }
}
