//! Input abstraction layer.
//!
//! Raw pointer and key primitives go in; a closed set of semantic
//! [`ToolEvent`]s comes out. The [`GestureRecognizer`] owns the only
//! stateful part: telling clicks from drags, and single from double clicks.
//!
//! Every drag produces exactly one `DragStart`, then zero or more `Drag`,
//! then one `DragEnd` (or a `DragCancel` injected by the tool manager).

use crate::config::GestureConfig;
use kurbo::{Point, Vec2};
use smallvec::{SmallVec, smallvec};
use std::time::{Duration, Instant};

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    /// Ctrl on Linux/Windows, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A key press or release. `key` is the `KeyboardEvent.key` value
/// (e.g. `"z"`, `"Escape"`, `"ArrowLeft"`, `" "`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }

    pub fn is(&self, key: &str) -> bool {
        self.key == key
    }
}

/// Geometry carried by every drag-family event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEvent {
    /// Current pointer position, scene space.
    pub point: Point,
    /// Current pointer position, screen space.
    pub screen_point: Point,
    /// Where the pointer went down, scene space.
    pub origin: Point,
    /// Where the pointer went down, screen space.
    pub screen_origin: Point,
    /// `point - origin`.
    pub delta: Vec2,
    /// `screen_point - screen_origin`.
    pub screen_delta: Vec2,
    pub modifiers: Modifiers,
}

/// Semantic, tool-agnostic interpretation of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    PointerMove {
        point: Point,
        screen_point: Point,
        modifiers: Modifiers,
    },
    Click {
        point: Point,
        screen_point: Point,
        modifiers: Modifiers,
    },
    DoubleClick {
        point: Point,
        screen_point: Point,
        modifiers: Modifiers,
    },
    /// Carries the original pointer-down position as both `point` and `origin`.
    DragStart(DragEvent),
    Drag(DragEvent),
    DragEnd(DragEvent),
    DragCancel,
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    SelectionChanged,
}

impl ToolEvent {
    /// Short tag used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ToolEvent::PointerMove { .. } => "pointerMove",
            ToolEvent::Click { .. } => "click",
            ToolEvent::DoubleClick { .. } => "doubleClick",
            ToolEvent::DragStart(_) => "dragStart",
            ToolEvent::Drag(_) => "drag",
            ToolEvent::DragEnd(_) => "dragEnd",
            ToolEvent::DragCancel => "dragCancel",
            ToolEvent::KeyDown(_) => "keyDown",
            ToolEvent::KeyUp(_) => "keyUp",
            ToolEvent::SelectionChanged => "selectionChanged",
        }
    }

    /// Scene position, for pointer-family events.
    pub fn point(&self) -> Option<Point> {
        match self {
            ToolEvent::PointerMove { point, .. }
            | ToolEvent::Click { point, .. }
            | ToolEvent::DoubleClick { point, .. } => Some(*point),
            ToolEvent::DragStart(d) | ToolEvent::Drag(d) | ToolEvent::DragEnd(d) => Some(d.point),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            ToolEvent::PointerMove { modifiers, .. }
            | ToolEvent::Click { modifiers, .. }
            | ToolEvent::DoubleClick { modifiers, .. } => *modifiers,
            ToolEvent::DragStart(d) | ToolEvent::Drag(d) | ToolEvent::DragEnd(d) => d.modifiers,
            ToolEvent::KeyDown(k) | ToolEvent::KeyUp(k) => k.modifiers,
            ToolEvent::DragCancel | ToolEvent::SelectionChanged => Modifiers::NONE,
        }
    }
}

/// Events produced by one raw input sample. Almost always 0 or 1.
pub type ToolEvents = SmallVec<[ToolEvent; 2]>;

// ─── Gesture Recognizer ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Press {
    point: Point,
    screen_point: Point,
    modifiers: Modifiers,
}

/// Turns pointer down/move/up into clicks, double-clicks and drags.
#[derive(Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    press: Option<Press>,
    dragging: bool,
    /// Most recent pointer sample while pressed.
    last: Option<(Point, Point, Modifiers)>,
    last_click: Option<(Instant, Point)>,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            press: None,
            dragging: false,
            last: None,
            last_click: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn pointer_down(&mut self, point: Point, screen_point: Point, modifiers: Modifiers) {
        self.press = Some(Press {
            point,
            screen_point,
            modifiers,
        });
        self.last = Some((point, screen_point, modifiers));
        self.dragging = false;
    }

    pub fn pointer_move(
        &mut self,
        point: Point,
        screen_point: Point,
        modifiers: Modifiers,
    ) -> ToolEvents {
        let Some(press) = self.press else {
            return smallvec![ToolEvent::PointerMove {
                point,
                screen_point,
                modifiers,
            }];
        };
        self.last = Some((point, screen_point, modifiers));

        if self.dragging {
            return smallvec![ToolEvent::Drag(drag_event(
                &press,
                point,
                screen_point,
                modifiers
            ))];
        }

        // Below threshold: swallow, so a slightly jittery click stays a click.
        if screen_point.distance(press.screen_point) <= self.config.drag_threshold {
            return ToolEvents::new();
        }

        self.dragging = true;
        smallvec![ToolEvent::DragStart(drag_event(
            &press,
            press.point,
            press.screen_point,
            modifiers
        ))]
    }

    pub fn pointer_up(&mut self, point: Point, screen_point: Point) -> ToolEvents {
        self.pointer_up_at(point, screen_point, Instant::now())
    }

    /// [`pointer_up`](Self::pointer_up) with an explicit timestamp.
    pub fn pointer_up_at(&mut self, point: Point, screen_point: Point, now: Instant) -> ToolEvents {
        let Some(press) = self.press.take() else {
            return ToolEvents::new();
        };
        let modifiers = self.last.map(|(_, _, m)| m).unwrap_or(press.modifiers);
        self.last = None;

        if std::mem::take(&mut self.dragging) {
            return smallvec![ToolEvent::DragEnd(drag_event(
                &press,
                point,
                screen_point,
                modifiers
            ))];
        }

        let window = Duration::from_millis(self.config.double_click_ms);
        let is_double = self.last_click.is_some_and(|(at, pos)| {
            now.saturating_duration_since(at) < window
                && screen_point.distance(pos) < self.config.double_click_distance
        });

        if is_double {
            // Consume history: a third click starts a new pair.
            self.last_click = None;
            smallvec![ToolEvent::DoubleClick {
                point,
                screen_point,
                modifiers,
            }]
        } else {
            self.last_click = Some((now, screen_point));
            smallvec![ToolEvent::Click {
                point,
                screen_point,
                modifiers,
            }]
        }
    }

    /// Forget the press and click history (tool switch, drag cancel).
    pub fn reset(&mut self) {
        self.press = None;
        self.dragging = false;
        self.last = None;
        self.last_click = None;
    }
}

fn drag_event(press: &Press, point: Point, screen_point: Point, modifiers: Modifiers) -> DragEvent {
    DragEvent {
        point,
        screen_point,
        origin: press.point,
        screen_origin: press.screen_point,
        delta: point - press.point,
        screen_delta: screen_point - press.screen_point,
        modifiers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn names(events: &ToolEvents) -> Vec<&'static str> {
        events.iter().map(ToolEvent::name).collect()
    }

    #[test]
    fn hover_moves_pass_through() {
        let mut r = GestureRecognizer::default();
        let events = r.pointer_move(p(1.0, 1.0), p(1.0, 1.0), Modifiers::NONE);
        assert_eq!(names(&events), vec!["pointerMove"]);
    }

    #[test]
    fn moves_within_threshold_are_swallowed() {
        let mut r = GestureRecognizer::default();
        r.pointer_down(p(0.0, 0.0), p(0.0, 0.0), Modifiers::NONE);
        assert!(r.pointer_move(p(3.0, 0.0), p(3.0, 0.0), Modifiers::NONE).is_empty());
        assert!(!r.is_dragging());
    }

    #[test]
    fn crossing_threshold_starts_drag_once() {
        let mut r = GestureRecognizer::default();
        r.pointer_down(p(10.0, 10.0), p(10.0, 10.0), Modifiers::NONE);

        let start = r.pointer_move(p(14.0, 10.0), p(14.0, 10.0), Modifiers::NONE);
        assert_eq!(names(&start), vec!["dragStart"]);
        match &start[0] {
            ToolEvent::DragStart(d) => {
                assert_eq!(d.point, p(10.0, 10.0));
                assert_eq!(d.origin, p(10.0, 10.0));
            }
            other => panic!("expected dragStart, got {other:?}"),
        }

        let drag = r.pointer_move(p(20.0, 15.0), p(20.0, 15.0), Modifiers::NONE);
        assert_eq!(names(&drag), vec!["drag"]);
        match &drag[0] {
            ToolEvent::Drag(d) => {
                assert_eq!(d.delta, Vec2::new(10.0, 5.0));
                assert_eq!(d.screen_delta, Vec2::new(10.0, 5.0));
            }
            other => panic!("expected drag, got {other:?}"),
        }

        let end = r.pointer_up(p(20.0, 15.0), p(20.0, 15.0));
        assert_eq!(names(&end), vec!["dragEnd"]);
        assert!(!r.is_dragging());
    }

    #[test]
    fn threshold_is_measured_in_screen_space() {
        let mut r = GestureRecognizer::default();
        // Zoomed out: small screen motion, large scene motion.
        r.pointer_down(p(0.0, 0.0), p(0.0, 0.0), Modifiers::NONE);
        let events = r.pointer_move(p(100.0, 0.0), p(2.0, 0.0), Modifiers::NONE);
        assert!(events.is_empty());
    }

    #[test]
    fn double_click_collapses_and_resets_history() {
        let mut r = GestureRecognizer::default();
        let t0 = Instant::now();
        let at = |ms| t0 + Duration::from_millis(ms);

        r.pointer_down(p(5.0, 5.0), p(5.0, 5.0), Modifiers::NONE);
        assert_eq!(
            names(&r.pointer_up_at(p(5.0, 5.0), p(5.0, 5.0), at(0))),
            vec!["click"]
        );

        r.pointer_down(p(5.0, 5.0), p(5.0, 5.0), Modifiers::NONE);
        assert_eq!(
            names(&r.pointer_up_at(p(5.0, 5.0), p(5.0, 5.0), at(100))),
            vec!["doubleClick"]
        );

        r.pointer_down(p(5.0, 5.0), p(5.0, 5.0), Modifiers::NONE);
        assert_eq!(
            names(&r.pointer_up_at(p(5.0, 5.0), p(5.0, 5.0), at(150))),
            vec!["click"]
        );
    }

    #[test]
    fn slow_or_distant_second_click_is_a_click() {
        let mut r = GestureRecognizer::default();
        let t0 = Instant::now();

        r.pointer_down(p(0.0, 0.0), p(0.0, 0.0), Modifiers::NONE);
        r.pointer_up_at(p(0.0, 0.0), p(0.0, 0.0), t0);
        r.pointer_down(p(0.0, 0.0), p(0.0, 0.0), Modifiers::NONE);
        let late = r.pointer_up_at(p(0.0, 0.0), p(0.0, 0.0), t0 + Duration::from_millis(400));
        assert_eq!(names(&late), vec!["click"]);

        r.pointer_down(p(10.0, 0.0), p(10.0, 0.0), Modifiers::NONE);
        let far = r.pointer_up_at(
            p(10.0, 0.0),
            p(10.0, 0.0),
            t0 + Duration::from_millis(450),
        );
        assert_eq!(names(&far), vec!["click"]);
    }

    #[test]
    fn reset_clears_press_and_history() {
        let mut r = GestureRecognizer::default();
        let t0 = Instant::now();
        r.pointer_down(p(0.0, 0.0), p(0.0, 0.0), Modifiers::NONE);
        r.pointer_up_at(p(0.0, 0.0), p(0.0, 0.0), t0);
        r.pointer_down(p(0.0, 0.0), p(0.0, 0.0), Modifiers::NONE);
        r.pointer_move(p(9.0, 0.0), p(9.0, 0.0), Modifiers::NONE);
        assert!(r.is_dragging());

        r.reset();
        assert!(!r.is_dragging());
        assert!(!r.is_pressed());
        assert!(r.pointer_up(p(0.0, 0.0), p(0.0, 0.0)).is_empty());

        r.pointer_down(p(0.0, 0.0), p(0.0, 0.0), Modifiers::NONE);
        let events = r.pointer_up_at(p(0.0, 0.0), p(0.0, 0.0), t0 + Duration::from_millis(10));
        assert_eq!(names(&events), vec!["click"]);
    }
}
