//! Capability contracts bridging the engine to a hosting editor.
//!
//! The host owns editors, consoles, tool windows, and selection prompts; the
//! engine borrows them through these traits for the duration of one action
//! invocation and never caches a handle. Everything here is single-threaded
//! by contract: handles are `Rc`, continuations are `FnOnce` boxes, and the
//! type system enforces that each continuation fires at most once.

pub mod memory;

use std::path::PathBuf;
use std::rc::Rc;

use crate::domain::model::{FoldRegion, SurfaceKind};

/// Borrowed handle onto a host editor.
pub type EditorRef = Rc<dyn EditorContext>;

/// Borrowed handle onto a host console.
pub type SurfaceRef = Rc<dyn ConsoleSurface>;

/// Single-fire continuation for console creation.
pub type OnConsoleReady = Box<dyn FnOnce(SurfaceRef)>;

/// Single-fire continuation for a picker prompt. `None` means dismissed.
pub type OnPick = Box<dyn FnOnce(Option<SurfaceRef>)>;

/// Editor state bound to one action invocation.
pub trait EditorContext {
    /// Caret position as a byte offset into the document.
    fn caret_offset(&self) -> usize;

    /// Zero-based logical line of the caret.
    fn caret_line(&self) -> usize;

    /// Full document text.
    fn document_text(&self) -> String;

    /// Fold regions currently known to the host's folding model.
    fn fold_regions(&self) -> Vec<FoldRegion>;

    /// Host classification of the document's language, when known.
    fn language_id(&self) -> Option<String>;

    /// Path of the backing file, when the document has one.
    fn file_path(&self) -> Option<PathBuf>;

    /// Ask the host to hand keyboard focus back to this editor.
    fn request_focus(&self);
}

/// An interactive console able to run submitted code.
pub trait ConsoleSurface {
    /// Which part of the host UI owns this console.
    fn kind(&self) -> SurfaceKind;

    /// Label the host shows on the console's tab.
    fn display_name(&self) -> String;

    /// Whether the backing interpreter process is still running.
    fn is_alive(&self) -> bool;

    /// Whether this console accepts code for execution, as opposed to a
    /// plain output view attached to the same run content.
    fn executes_code(&self) -> bool;

    /// Make the console visible: show its tool window and select its tab,
    /// or select the debugger's console sub-tab.
    fn reveal(&self);

    /// Submit code for execution. `None` focuses the console without running
    /// anything. The editor reference is only used by the console for cursor
    /// and history bookkeeping. Failures are owned by the console.
    fn execute(&self, code: Option<&str>, editor: Option<&EditorRef>);
}

/// Project-scoped access to the host's console machinery.
pub trait ConsoleHost {
    /// Whether the dedicated console tool window is currently visible.
    fn tool_window_visible(&self) -> bool;

    /// The selected console tab, when the tool window is showing one.
    fn selected_console(&self) -> Option<SurfaceRef>;

    /// Console tabs owned by the tool window in tab order. Their backing
    /// processes may not have finished starting.
    fn console_tabs(&self) -> Vec<SurfaceRef>;

    /// Consoles reachable from the project's live run contents.
    fn running_consoles(&self) -> Vec<SurfaceRef>;

    /// Bring the tool window to front; `on_active` fires once it is.
    fn activate_tool_window(&self, on_active: Box<dyn FnOnce()>);

    /// Launch a new interpreter console. `on_ready` fires at most once,
    /// after the console finished initializing; if startup fails it never
    /// fires.
    fn create_console(&self, on_ready: OnConsoleReady);
}

/// Prompt capability for choosing among candidate consoles.
pub trait ConsolePicker {
    /// Ask the user to pick one of `candidates`; `on_choice` receives the
    /// pick, or `None` when the prompt is dismissed.
    fn pick(&self, title: &str, candidates: Vec<SurfaceRef>, on_choice: OnPick);
}
