//! Tool system: behavior-based finite state machines.
//!
//! A tool is a state type plus an ordered list of [`Behavior`]s. For each
//! event the behaviors are tried in order; the first one that can handle
//! the event and returns a transition wins. Behaviors are pure: they read
//! the [`Editor`] and return the next state plus any [`ToolAction`]s.
//! [`BaseTool`] applies the actions after the state has been assigned.
//!
//! ## Modifier behaviors
//!
//! | Modifier  | Select Tool                 | Shape Tool         | Pen Tool |
//! |-----------|-----------------------------|--------------------|----------|
//! | **Shift** | Toggle / additive / 45° lock | Square / circle    | -        |
//! | **Alt**   | Duplicate on drag start      | Draw from center   | -        |
//! | **Ctrl**  | Disable snapping             | -                  | -        |

pub mod hand;
pub mod pen;
pub mod select;
pub mod shape;
pub mod text;

use crate::commands::Command;
use crate::editor::{Editor, SelectMode, TextRun};
use crate::input::ToolEvent;
use crate::overlay::Overlay;
use crate::selection::SegmentRef;
use crate::signal;
use glyph_core::PointId;
use kurbo::{Point, Vec2};
use lasso::{Spur, ThreadedRodeo};
use smallvec::{SmallVec, smallvec};
use std::fmt;
use std::sync::LazyLock;

pub use hand::HandTool;
pub use pen::PenTool;
pub use select::SelectTool;
pub use shape::{ShapeKind, ShapeTool};
pub use text::TextTool;

// ─── Tool ids ────────────────────────────────────────────────────────────

static TOOL_NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Interned tool name (`"select"`, `"pen"`, ...).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToolId(Spur);

impl ToolId {
    pub fn intern(name: &str) -> Self {
        Self(TOOL_NAMES.get_or_intern(name))
    }

    pub fn as_str(&self) -> &str {
        TOOL_NAMES.resolve(&self.0)
    }
}

impl fmt::Debug for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Published state ─────────────────────────────────────────────────────

/// Mouse cursor requested by the active tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Crosshair,
    Move,
    Copy,
    Grab,
    Grabbing,
    Rotate,
    ResizeNs,
    ResizeEw,
    ResizeNwse,
    ResizeNesw,
    Pen,
    PenClose,
    PenContinue,
    Text,
}

/// What the rendering layer sees of the active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStateInfo {
    pub tool: Option<ToolId>,
    pub state: &'static str,
}

impl Default for ToolStateInfo {
    fn default() -> Self {
        Self {
            tool: None,
            state: "idle",
        }
    }
}

// ─── Actions & transitions ───────────────────────────────────────────────

/// A side effect requested by a behavior, applied by [`Editor::apply`].
#[derive(Debug)]
pub enum ToolAction {
    BeginPreview,
    /// Live positions inside the open preview.
    SetPositions(Vec<(PointId, Point)>),
    CommitPreview(String),
    CancelPreview,
    Execute(Box<dyn Command>),
    SelectPoints {
        ids: Vec<PointId>,
        mode: SelectMode,
    },
    SelectSegment {
        segment: SegmentRef,
        mode: SelectMode,
    },
    ClearSelection,
    /// Screen-space pan.
    Pan(Vec2),
    InsertText(TextRun),
}

pub type ToolActions = SmallVec<[ToolAction; 2]>;

/// Result of a behavior that handled an event.
#[derive(Debug)]
pub enum Transition<S> {
    /// Handled, nothing changed. Publishes nothing and runs no hooks.
    Stay,
    Go { next: S, actions: ToolActions },
}

impl<S> Transition<S> {
    pub fn to(next: S) -> Self {
        Transition::Go {
            next,
            actions: SmallVec::new(),
        }
    }

    pub fn with(next: S, action: ToolAction) -> Self {
        Transition::Go {
            next,
            actions: smallvec![action],
        }
    }

    pub fn with_actions(next: S, actions: impl IntoIterator<Item = ToolAction>) -> Self {
        Transition::Go {
            next,
            actions: actions.into_iter().collect(),
        }
    }
}

// ─── Contracts ───────────────────────────────────────────────────────────

/// Per-tool state union.
pub trait ToolState: Clone + fmt::Debug + 'static {
    /// Terminal state of a deactivated tool.
    fn idle() -> Self;
    /// State of a freshly activated tool.
    fn ready() -> Self;
    fn name(&self) -> &'static str;

    fn is_idle(&self) -> bool {
        self.name() == "idle"
    }

    /// Whether a drag-family gesture is in progress.
    fn is_dragging(&self) -> bool {
        false
    }
}

/// One independently testable interaction mode of a tool.
pub trait Behavior<S: ToolState> {
    fn name(&self) -> &'static str;

    fn can_handle(&self, state: &S, event: &ToolEvent) -> bool;

    /// `None` means "not applicable": the next behavior gets the event.
    fn transition(&self, state: &S, event: &ToolEvent, editor: &Editor) -> Option<Transition<S>>;

    fn on_transition(&self, _prev: &S, _next: &S, _event: &ToolEvent, _editor: &mut Editor) {}

    fn render(&self, _state: &S, _editor: &Editor, _overlay: &mut Overlay) {}

    fn render_below_handles(&self, _state: &S, _editor: &Editor, _overlay: &mut Overlay) {}
}

/// Static description of a tool: its id, behaviors and hooks.
pub trait ToolDefinition: 'static {
    type State: ToolState;

    fn id(&self) -> ToolId;

    fn behaviors(&self) -> &[Box<dyn Behavior<Self::State>>];

    fn cursor(&self, _state: &Self::State) -> Cursor {
        Cursor::Default
    }

    /// Runs after the state is set and every behavior hook has run.
    fn after_transition(
        &self,
        _prev: &Self::State,
        _next: &Self::State,
        _event: &ToolEvent,
        _editor: &mut Editor,
    ) {
    }

    /// Resolve a state being abandoned by deactivation (close previews, ...).
    fn abandon(&self, _state: &Self::State) -> ToolActions {
        SmallVec::new()
    }

    fn has_below_handles(&self) -> bool {
        false
    }
}

/// Object-safe view of a tool, as used by the tool manager.
pub trait Tool {
    fn id(&self) -> ToolId;

    fn state_info(&self) -> ToolStateInfo;

    fn cursor(&self) -> Cursor;

    fn is_dragging(&self) -> bool;

    fn activate(&mut self, editor: &mut Editor);

    fn deactivate(&mut self, editor: &mut Editor);

    /// Republish state and cursor (after returning from a temporary tool).
    fn publish(&self, editor: &mut Editor);

    /// Returns whether a behavior handled the event.
    fn handle_event(&mut self, event: &ToolEvent, editor: &mut Editor) -> bool;

    fn render(&self, editor: &Editor, overlay: &mut Overlay);

    fn render_below_handles(&self, editor: &Editor, overlay: &mut Overlay);

    fn has_below_handles(&self) -> bool {
        false
    }
}

// ─── BaseTool ────────────────────────────────────────────────────────────

/// Runs a [`ToolDefinition`]'s behaviors over its state.
pub struct BaseTool<D: ToolDefinition> {
    definition: D,
    state: D::State,
}

impl<D: ToolDefinition> BaseTool<D> {
    pub fn new(definition: D) -> Self {
        Self {
            definition,
            state: D::State::idle(),
        }
    }

    pub fn state(&self) -> &D::State {
        &self.state
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    /// Pure step: the transition the first applicable behavior produces.
    /// `None` if no behavior handled the event.
    pub fn transition(
        &self,
        state: &D::State,
        event: &ToolEvent,
        editor: &Editor,
    ) -> Option<Transition<D::State>> {
        if state.is_idle() {
            return None;
        }
        self.definition
            .behaviors()
            .iter()
            .filter(|b| b.can_handle(state, event))
            .find_map(|b| b.transition(state, event, editor))
    }

    fn on_transition(
        &self,
        prev: &D::State,
        actions: ToolActions,
        event: &ToolEvent,
        editor: &mut Editor,
    ) {
        run_actions(self.definition.id(), actions, editor);
        for behavior in self.definition.behaviors() {
            behavior.on_transition(prev, &self.state, event, editor);
        }
        self.definition
            .after_transition(prev, &self.state, event, editor);
    }

    fn set_state(
        &mut self,
        next: D::State,
        actions: ToolActions,
        event: &ToolEvent,
        editor: &mut Editor,
    ) {
        signal::batch(|| {
            let prev = std::mem::replace(&mut self.state, next);
            log::debug!(
                "{}: {} -> {} ({})",
                self.definition.id(),
                prev.name(),
                self.state.name(),
                event.name()
            );
            self.publish(editor);
            self.on_transition(&prev, actions, event, editor);
        });
    }
}

fn run_actions(tool: ToolId, actions: ToolActions, editor: &mut Editor) {
    for action in actions {
        if let Err(e) = editor.apply(action) {
            log::warn!("{tool}: action failed: {e}");
        }
    }
}

impl<D: ToolDefinition> Tool for BaseTool<D> {
    fn id(&self) -> ToolId {
        self.definition.id()
    }

    fn state_info(&self) -> ToolStateInfo {
        ToolStateInfo {
            tool: Some(self.definition.id()),
            state: self.state.name(),
        }
    }

    fn cursor(&self) -> Cursor {
        self.definition.cursor(&self.state)
    }

    fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    fn activate(&mut self, editor: &mut Editor) {
        log::debug!("{}: activate", self.definition.id());
        self.state = D::State::ready();
        self.publish(editor);
    }

    fn deactivate(&mut self, editor: &mut Editor) {
        log::debug!("{}: deactivate", self.definition.id());
        let actions = self.definition.abandon(&self.state);
        run_actions(self.definition.id(), actions, editor);
        self.state = D::State::idle();
    }

    fn publish(&self, editor: &mut Editor) {
        editor.signals.active_tool_state.set(self.state_info());
        let cursor = self.cursor();
        if editor.signals.cursor.with(|c| *c != cursor) {
            editor.signals.cursor.set(cursor);
        }
    }

    fn handle_event(&mut self, event: &ToolEvent, editor: &mut Editor) -> bool {
        match self.transition(&self.state, event, editor) {
            None => false,
            Some(Transition::Stay) => true,
            Some(Transition::Go { next, actions }) => {
                self.set_state(next, actions, event, editor);
                true
            }
        }
    }

    fn render(&self, editor: &Editor, overlay: &mut Overlay) {
        for behavior in self.definition.behaviors() {
            behavior.render(&self.state, editor, overlay);
        }
    }

    fn render_below_handles(&self, editor: &Editor, overlay: &mut Overlay) {
        for behavior in self.definition.behaviors() {
            behavior.render_below_handles(&self.state, editor, overlay);
        }
    }

    fn has_below_handles(&self) -> bool {
        self.definition.has_below_handles()
    }
}
