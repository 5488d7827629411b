//! Interaction engine for the glyph editor.
//!
//! Raw pointer and key input flows through the [`GestureRecognizer`] into
//! the [`ToolManager`], which routes [`ToolEvent`]s to the active tool's
//! behavior state machine. Tools edit the glyph through [`ToolAction`]s;
//! drags run inside preview transactions so a whole gesture lands on the
//! undo stack as one step.

pub mod canvas;
pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod input;
pub mod manager;
pub mod overlay;
pub mod selection;
pub mod shortcuts;
pub mod signal;
pub mod snap;
pub mod tools;
pub mod viewport;

pub use canvas::GlyphCanvas;
pub use commands::{Command, CommandStack, CompositeCommand};
pub use config::{EditorConfig, GestureConfig, NudgeConfig, SnapConfig, ZoomConfig};
pub use editor::{Editor, SelectMode, TextRun};
pub use error::{ConfigError, EditError};
pub use input::{DragEvent, GestureRecognizer, KeyEvent, Modifiers, ToolEvent};
pub use manager::{TemporaryOptions, ToolManager};
pub use overlay::{Overlay, OverlayItem};
pub use selection::Selection;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use signal::Signal;
pub use tools::{Cursor, Tool, ToolAction, ToolId, Transition};
pub use viewport::Viewport;

pub use glyph_core;
