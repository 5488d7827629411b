//! Tool orchestration.
//!
//! [`ToolManager`] owns the primary tool and an optional temporary
//! override (hold-Space hand), feeds pointer input through the
//! [`GestureRecognizer`], and coalesces pointer moves to one dispatch per
//! animation frame. The host drives frames: when
//! [`handle_pointer_move`](ToolManager::handle_pointer_move) returns
//! `true` it should request a frame and call
//! [`on_animation_frame`](ToolManager::on_animation_frame) from it.

use crate::editor::Editor;
use crate::input::{GestureRecognizer, KeyEvent, Modifiers, ToolEvent, ToolEvents};
use crate::overlay::Overlay;
use crate::tools::{HandTool, PenTool, SelectTool, ShapeTool, TextTool, Tool, ToolId};
use kurbo::Point;
use std::collections::HashMap;
use std::time::Instant;

/// Builds a fresh tool instance on activation.
pub type ToolFactory = Box<dyn Fn() -> Box<dyn Tool>>;

/// Callbacks for a temporary tool.
#[derive(Default)]
pub struct TemporaryOptions {
    pub on_activate: Option<Box<dyn FnOnce()>>,
    pub on_return: Option<Box<dyn FnOnce()>>,
}

struct Temporary {
    tool: Box<dyn Tool>,
    on_return: Option<Box<dyn FnOnce()>>,
}

#[derive(Debug, Clone, Copy)]
struct PendingMove {
    screen: Point,
    modifiers: Modifiers,
}

pub struct ToolManager {
    registry: HashMap<ToolId, ToolFactory>,
    primary: Option<Box<dyn Tool>>,
    temporary: Option<Temporary>,
    recognizer: GestureRecognizer,
    pending: Option<PendingMove>,
    frame_requested: bool,
    last_screen: Option<Point>,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(GestureRecognizer::default())
    }
}

impl ToolManager {
    pub fn new(recognizer: GestureRecognizer) -> Self {
        Self {
            registry: HashMap::new(),
            primary: None,
            temporary: None,
            recognizer,
            pending: None,
            frame_requested: false,
            last_screen: None,
        }
    }

    /// A manager with select, pen, shape, hand and text registered.
    pub fn with_default_tools(recognizer: GestureRecognizer) -> Self {
        let mut manager = Self::new(recognizer);
        manager.register("select", SelectTool::boxed);
        manager.register("pen", PenTool::boxed);
        manager.register("shape", ShapeTool::boxed);
        manager.register("hand", HandTool::boxed);
        manager.register("text", TextTool::boxed);
        manager
    }

    pub fn register(&mut self, id: &str, factory: impl Fn() -> Box<dyn Tool> + 'static) {
        self.registry.insert(ToolId::intern(id), Box::new(factory));
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.registry.contains_key(&ToolId::intern(id))
    }

    fn create(&self, id: &str) -> Option<Box<dyn Tool>> {
        let factory = self.registry.get(&ToolId::intern(id));
        if factory.is_none() {
            log::warn!("unknown tool id: {id}");
        }
        factory.map(|f| f())
    }

    // ─── Tool switching ──────────────────────────────────────────────────

    /// Make `id` the primary tool. Unknown ids are ignored.
    pub fn activate(&mut self, id: &str, editor: &mut Editor) {
        let Some(mut tool) = self.create(id) else {
            return;
        };
        if let Some(mut temporary) = self.temporary.take() {
            temporary.tool.deactivate(editor);
        }
        if let Some(mut previous) = self.primary.take() {
            previous.deactivate(editor);
        }
        self.recognizer.reset();
        tool.activate(editor);
        self.primary = Some(tool);
    }

    /// Activate `id` on top of the primary tool. Ignored while another
    /// temporary tool is active or a drag is in progress.
    pub fn request_temporary(&mut self, id: &str, options: TemporaryOptions, editor: &mut Editor) {
        if self.temporary.is_some() {
            log::debug!("temporary tool {id} ignored: override already active");
            return;
        }
        if self.is_dragging() {
            log::warn!("temporary tool {id} ignored during drag");
            return;
        }
        let Some(mut tool) = self.create(id) else {
            return;
        };
        tool.activate(editor);
        if let Some(on_activate) = options.on_activate {
            on_activate();
        }
        self.temporary = Some(Temporary {
            tool,
            on_return: options.on_return,
        });
    }

    pub fn return_from_temporary(&mut self, editor: &mut Editor) {
        let Some(mut temporary) = self.temporary.take() else {
            return;
        };
        temporary.tool.deactivate(editor);
        self.recognizer.reset();
        if let Some(on_return) = temporary.on_return {
            on_return();
        }
        if let Some(primary) = &self.primary {
            primary.publish(editor);
        }
    }

    pub fn has_temporary(&self) -> bool {
        self.temporary.is_some()
    }

    fn active(&self) -> Option<&dyn Tool> {
        match &self.temporary {
            Some(t) => Some(t.tool.as_ref()),
            None => self.primary.as_deref(),
        }
    }

    fn active_mut(&mut self) -> Option<&mut Box<dyn Tool>> {
        match &mut self.temporary {
            Some(t) => Some(&mut t.tool),
            None => self.primary.as_mut(),
        }
    }

    pub fn active_tool_id(&self) -> Option<ToolId> {
        self.active().map(|t| t.id())
    }

    pub fn primary_tool_id(&self) -> Option<ToolId> {
        self.primary.as_ref().map(|t| t.id())
    }

    pub fn is_dragging(&self) -> bool {
        self.recognizer.is_dragging() || self.active().is_some_and(|t| t.is_dragging())
    }

    fn dispatch(&mut self, event: &ToolEvent, editor: &mut Editor) -> bool {
        match self.active_mut() {
            Some(tool) => tool.handle_event(event, editor),
            None => false,
        }
    }

    fn dispatch_all(&mut self, events: ToolEvents, editor: &mut Editor) {
        for event in &events {
            self.dispatch(event, editor);
        }
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    /// Record a pointer move. Returns `true` if the host should request an
    /// animation frame. Moves to the last seen screen point are dropped
    /// unless `force` is set.
    pub fn handle_pointer_move(
        &mut self,
        screen: Point,
        modifiers: Modifiers,
        force: bool,
    ) -> bool {
        if !force && self.last_screen == Some(screen) {
            return false;
        }
        self.last_screen = Some(screen);
        self.pending = Some(PendingMove { screen, modifiers });
        !std::mem::replace(&mut self.frame_requested, true)
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame_requested
    }

    /// Deliver the coalesced pointer move.
    pub fn on_animation_frame(&mut self, editor: &mut Editor) {
        self.frame_requested = false;
        let Some(PendingMove { screen, modifiers }) = self.pending.take() else {
            return;
        };
        let point = editor.viewport.screen_to_scene(screen);
        log::trace!("pointer move flush at ({:.1}, {:.1})", screen.x, screen.y);
        if !self.is_dragging() {
            editor.update_hover(point);
        }
        let events = self.recognizer.pointer_move(point, screen, modifiers);
        self.dispatch_all(events, editor);
        if self.active().is_some_and(|t| t.has_below_handles()) {
            editor.request_redraw_below_handles();
        }
    }

    fn flush(&mut self, editor: &mut Editor) {
        if self.pending.is_some() {
            self.on_animation_frame(editor);
        }
    }

    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers, editor: &mut Editor) {
        self.flush(editor);
        let point = editor.viewport.screen_to_scene(screen);
        self.recognizer.pointer_down(point, screen, modifiers);
    }

    pub fn pointer_up(&mut self, screen: Point, editor: &mut Editor) {
        self.pointer_up_at(screen, Instant::now(), editor);
    }

    /// [`pointer_up`](Self::pointer_up) with an explicit timestamp.
    pub fn pointer_up_at(&mut self, screen: Point, now: Instant, editor: &mut Editor) {
        self.flush(editor);
        let point = editor.viewport.screen_to_scene(screen);
        let events = self.recognizer.pointer_up_at(point, screen, now);
        self.dispatch_all(events, editor);
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Returns whether the active tool consumed the key.
    pub fn key_down(&mut self, key: KeyEvent, editor: &mut Editor) -> bool {
        if key.is("Escape") && self.is_dragging() {
            self.recognizer.reset();
            self.dispatch(&ToolEvent::DragCancel, editor);
            return true;
        }
        self.dispatch(&ToolEvent::KeyDown(key), editor)
    }

    pub fn key_up(&mut self, key: KeyEvent, editor: &mut Editor) -> bool {
        self.dispatch(&ToolEvent::KeyUp(key), editor)
    }

    pub fn notify_selection_changed(&mut self, editor: &mut Editor) {
        self.dispatch(&ToolEvent::SelectionChanged, editor);
    }

    // ─── Rendering & teardown ────────────────────────────────────────────

    pub fn render(&self, editor: &Editor, overlay: &mut Overlay) {
        if let Some(tool) = self.active() {
            tool.render(editor, overlay);
        }
    }

    pub fn render_below_handles(&self, editor: &Editor, overlay: &mut Overlay) {
        if let Some(tool) = self.active() {
            tool.render_below_handles(editor, overlay);
        }
    }

    /// Drop any pending frame and deactivate every tool.
    pub fn destroy(&mut self, editor: &mut Editor) {
        self.pending = None;
        self.frame_requested = false;
        self.recognizer.reset();
        if let Some(mut temporary) = self.temporary.take() {
            temporary.tool.deactivate(editor);
        }
        if let Some(mut primary) = self.primary.take() {
            primary.deactivate(editor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::tools::{BaseTool, Behavior, ToolDefinition, ToolState, Transition};
    use glyph_core::Glyph;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Stub {
        Idle,
        Ready,
    }

    impl ToolState for Stub {
        fn idle() -> Self {
            Stub::Idle
        }
        fn ready() -> Self {
            Stub::Ready
        }
        fn name(&self) -> &'static str {
            match self {
                Stub::Idle => "idle",
                Stub::Ready => "ready",
            }
        }
    }

    /// Records the name of every event it sees.
    struct Record(Rc<RefCell<Vec<&'static str>>>);

    impl Behavior<Stub> for Record {
        fn name(&self) -> &'static str {
            "record"
        }
        fn can_handle(&self, _: &Stub, _: &ToolEvent) -> bool {
            true
        }
        fn transition(
            &self,
            _: &Stub,
            event: &ToolEvent,
            _: &Editor,
        ) -> Option<Transition<Stub>> {
            self.0.borrow_mut().push(event.name());
            Some(Transition::Stay)
        }
    }

    struct RecorderTool(Vec<Box<dyn Behavior<Stub>>>);

    impl ToolDefinition for RecorderTool {
        type State = Stub;
        fn id(&self) -> ToolId {
            ToolId::intern("recorder")
        }
        fn behaviors(&self) -> &[Box<dyn Behavior<Stub>>] {
            &self.0
        }
    }

    fn setup() -> (ToolManager, Editor, Rc<RefCell<Vec<&'static str>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = ToolManager::with_default_tools(GestureRecognizer::default());
        let sink = Rc::clone(&log);
        manager.register("recorder", move || {
            Box::new(BaseTool::new(RecorderTool(vec![Box::new(Record(Rc::clone(&sink)))])))
                as Box<dyn Tool>
        });
        let editor = Editor::new(Glyph::new("a", None, 500.0), EditorConfig::default());
        (manager, editor, log)
    }

    #[test]
    fn temporary_tool_stack() {
        let (mut manager, mut editor, _) = setup();
        manager.activate("pen", &mut editor);
        let returned = Rc::new(Cell::new(false));
        let flag = Rc::clone(&returned);
        manager.request_temporary(
            "hand",
            TemporaryOptions {
                on_activate: None,
                on_return: Some(Box::new(move || flag.set(true))),
            },
            &mut editor,
        );
        assert_eq!(manager.active_tool_id(), Some(ToolId::intern("hand")));
        assert_eq!(manager.primary_tool_id(), Some(ToolId::intern("pen")));

        manager.return_from_temporary(&mut editor);
        assert_eq!(manager.active_tool_id(), Some(ToolId::intern("pen")));
        assert!(returned.get());
        assert_eq!(
            editor.signals.active_tool_state.get().tool,
            Some(ToolId::intern("pen"))
        );
    }

    #[test]
    fn second_temporary_request_is_ignored() {
        let (mut manager, mut editor, _) = setup();
        manager.activate("select", &mut editor);
        manager.request_temporary("hand", TemporaryOptions::default(), &mut editor);
        manager.request_temporary("text", TemporaryOptions::default(), &mut editor);
        assert_eq!(manager.active_tool_id(), Some(ToolId::intern("hand")));
    }

    #[test]
    fn unknown_tool_is_a_no_op() {
        let (mut manager, mut editor, _) = setup();
        manager.activate("select", &mut editor);
        manager.activate("lasso", &mut editor);
        manager.request_temporary("lasso", TemporaryOptions::default(), &mut editor);
        assert_eq!(manager.active_tool_id(), Some(ToolId::intern("select")));
        assert!(!manager.has_temporary());
    }

    #[test]
    fn pointer_moves_are_coalesced_per_frame() {
        let (mut manager, mut editor, log) = setup();
        manager.activate("recorder", &mut editor);
        assert!(manager.handle_pointer_move(Point::new(1.0, 1.0), Modifiers::NONE, false));
        assert!(!manager.handle_pointer_move(Point::new(2.0, 1.0), Modifiers::NONE, false));
        manager.on_animation_frame(&mut editor);
        assert_eq!(*log.borrow(), vec!["pointerMove"]);
        assert!(!manager.has_pending_frame());
    }

    #[test]
    fn same_point_is_deduped_unless_forced() {
        let (mut manager, mut editor, log) = setup();
        manager.activate("recorder", &mut editor);
        let p = Point::new(5.0, 5.0);
        manager.handle_pointer_move(p, Modifiers::NONE, false);
        manager.on_animation_frame(&mut editor);
        manager.handle_pointer_move(p, Modifiers::NONE, false);
        manager.on_animation_frame(&mut editor);
        assert_eq!(log.borrow().len(), 1);

        manager.handle_pointer_move(p, Modifiers::NONE, true);
        manager.on_animation_frame(&mut editor);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn escape_during_drag_cancels() {
        let (mut manager, mut editor, log) = setup();
        manager.activate("recorder", &mut editor);
        manager.pointer_down(Point::new(0.0, 0.0), Modifiers::NONE, &mut editor);
        manager.handle_pointer_move(Point::new(20.0, 0.0), Modifiers::NONE, false);
        manager.on_animation_frame(&mut editor);
        assert!(manager.is_dragging());

        let consumed = manager.key_down(KeyEvent::new("Escape", Modifiers::NONE), &mut editor);
        assert!(consumed);
        assert!(!manager.is_dragging());
        assert_eq!(*log.borrow(), vec!["dragStart", "dragCancel"]);

        // The release after a cancelled drag produces nothing.
        manager.pointer_up(Point::new(20.0, 0.0), &mut editor);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn temporary_request_during_drag_is_ignored() {
        let (mut manager, mut editor, _) = setup();
        manager.activate("recorder", &mut editor);
        manager.pointer_down(Point::new(0.0, 0.0), Modifiers::NONE, &mut editor);
        manager.handle_pointer_move(Point::new(20.0, 0.0), Modifiers::NONE, false);
        manager.on_animation_frame(&mut editor);
        manager.request_temporary("hand", TemporaryOptions::default(), &mut editor);
        assert!(!manager.has_temporary());
    }

    #[test]
    fn pointer_down_flushes_pending_move() {
        let (mut manager, mut editor, log) = setup();
        manager.activate("recorder", &mut editor);
        manager.handle_pointer_move(Point::new(3.0, 3.0), Modifiers::NONE, false);
        manager.pointer_down(Point::new(3.0, 3.0), Modifiers::NONE, &mut editor);
        manager.pointer_up(Point::new(3.0, 3.0), &mut editor);
        assert_eq!(*log.borrow(), vec!["pointerMove", "click"]);
    }

    #[test]
    fn destroy_drops_pending_frame() {
        let (mut manager, mut editor, log) = setup();
        manager.activate("recorder", &mut editor);
        manager.handle_pointer_move(Point::new(3.0, 3.0), Modifiers::NONE, false);
        manager.destroy(&mut editor);
        manager.on_animation_frame(&mut editor);
        assert!(log.borrow().is_empty());
        assert_eq!(manager.active_tool_id(), None);
    }
}
