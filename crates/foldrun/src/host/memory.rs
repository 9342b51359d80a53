//! In-memory reference host.
//!
//! Implements every capability trait against plain data structures so the
//! engine runs end-to-end in tests and headless embeddings. Consoles record
//! dispatched payloads in a transcript instead of running them, liveness is
//! toggleable, and console creation can be deferred to model a slowly
//! starting interpreter.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use crate::domain::errors::ConsoleError;
use crate::domain::model::{FoldRegion, SurfaceKind};
use crate::host::{
    ConsoleHost, ConsolePicker, ConsoleSurface, EditorContext, EditorRef, OnConsoleReady, OnPick,
    SurfaceRef,
};
use crate::infra::markers;

/// Editor over an in-memory document.
pub struct MemoryEditor {
    text: String,
    caret: Cell<usize>,
    path: Option<PathBuf>,
    language: Option<String>,
    regions: Vec<FoldRegion>,
    focus_requests: Cell<usize>,
}

impl MemoryEditor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            caret: Cell::new(0),
            path: None,
            language: None,
            regions: Vec::new(),
            focus_requests: Cell::new(0),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_language(mut self, id: impl Into<String>) -> Self {
        self.language = Some(id.into());
        self
    }

    pub fn with_regions(mut self, regions: Vec<FoldRegion>) -> Self {
        self.regions = regions;
        self
    }

    /// Derive fold regions from comment markers in the document.
    pub fn with_marker_folding(mut self, comment_prefix: &str) -> Self {
        self.regions = markers::scan(&self.text, comment_prefix);
        self
    }

    pub fn set_caret(&self, offset: usize) {
        self.caret.set(offset);
    }

    /// How many times the engine asked for focus to return here.
    pub fn focus_requests(&self) -> usize {
        self.focus_requests.get()
    }
}

impl EditorContext for MemoryEditor {
    fn caret_offset(&self) -> usize {
        self.caret.get()
    }

    fn caret_line(&self) -> usize {
        let upto = self.caret.get().min(self.text.len());
        self.text.as_bytes()[..upto]
            .iter()
            .filter(|&&byte| byte == b'\n')
            .count()
    }

    fn document_text(&self) -> String {
        self.text.clone()
    }

    fn fold_regions(&self) -> Vec<FoldRegion> {
        self.regions.clone()
    }

    fn language_id(&self) -> Option<String> {
        self.language.clone()
    }

    fn file_path(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    fn request_focus(&self) {
        self.focus_requests.set(self.focus_requests.get() + 1);
    }
}

/// Shared tool-window state: visibility, tabs, and the selected tab.
struct WindowState {
    visible: Cell<bool>,
    tabs: RefCell<Vec<Rc<MemoryConsole>>>,
    selected: Cell<Option<usize>>,
}

impl WindowState {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            visible: Cell::new(false),
            tabs: RefCell::new(Vec::new()),
            selected: Cell::new(None),
        })
    }

    fn select(&self, console: &MemoryConsole) {
        let index = self
            .tabs
            .borrow()
            .iter()
            .position(|tab| std::ptr::eq(Rc::as_ptr(tab), console));
        if index.is_some() {
            self.selected.set(index);
        }
    }
}

/// Console that records payloads instead of executing them.
pub struct MemoryConsole {
    name: String,
    kind: SurfaceKind,
    executes_code: bool,
    alive: Cell<bool>,
    revealed: Cell<bool>,
    transcript: RefCell<Vec<String>>,
    // Weak backref: the window already owns its tabs.
    window: RefCell<Option<Weak<WindowState>>>,
}

impl MemoryConsole {
    /// A code-executing console living in the console tool window.
    pub fn tool_window(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self::build(name, SurfaceKind::ToolWindow, true))
    }

    /// The console view of a debugger session.
    pub fn debugger(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self::build(name, SurfaceKind::Debugger, true))
    }

    /// A run content view that shows output but cannot execute code.
    pub fn output_only(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self::build(name, SurfaceKind::ToolWindow, false))
    }

    fn build(name: impl Into<String>, kind: SurfaceKind, executes_code: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            executes_code,
            alive: Cell::new(true),
            revealed: Cell::new(false),
            transcript: RefCell::new(Vec::new()),
            window: RefCell::new(None),
        }
    }

    /// Mark the backing process as terminated.
    pub fn terminate(&self) {
        self.alive.set(false);
    }

    /// Payloads dispatched to this console, oldest first.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.borrow().clone()
    }

    /// Whether the engine made this console visible.
    pub fn was_revealed(&self) -> bool {
        self.revealed.get()
    }

    /// Accept a payload, refusing when the console has terminated.
    pub fn try_execute(&self, code: Option<&str>) -> Result<(), ConsoleError> {
        if !self.alive.get() {
            return Err(ConsoleError::Terminated);
        }
        if let Some(code) = code {
            self.transcript.borrow_mut().push(code.to_owned());
        }
        Ok(())
    }

    fn attach_window(&self, window: &Rc<WindowState>) {
        *self.window.borrow_mut() = Some(Rc::downgrade(window));
    }
}

impl ConsoleSurface for MemoryConsole {
    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }

    fn executes_code(&self) -> bool {
        self.executes_code
    }

    fn reveal(&self) {
        self.revealed.set(true);
        let window = self.window.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(window) = window {
            window.visible.set(true);
            window.select(self);
        }
    }

    fn execute(&self, code: Option<&str>, _editor: Option<&EditorRef>) {
        if let Err(err) = self.try_execute(code) {
            tracing::warn!(console = %self.name, error = %err, "dropping payload");
        }
    }
}

/// Project console machinery backed by in-memory state.
pub struct MemoryConsoleHost {
    window: Rc<WindowState>,
    running: RefCell<Vec<Rc<MemoryConsole>>>,
    defer: Cell<bool>,
    pending: RefCell<Option<(Rc<MemoryConsole>, OnConsoleReady)>>,
    created: Cell<usize>,
}

impl MemoryConsoleHost {
    pub fn new() -> Self {
        Self {
            window: WindowState::new(),
            running: RefCell::new(Vec::new()),
            defer: Cell::new(false),
            pending: RefCell::new(None),
            created: Cell::new(0),
        }
    }

    /// Add a console tab to the tool window.
    pub fn add_tab(&self, console: Rc<MemoryConsole>) {
        console.attach_window(&self.window);
        self.window.tabs.borrow_mut().push(console);
    }

    /// Register run content reachable outside the tool window, such as a
    /// debugger console.
    pub fn add_running(&self, console: Rc<MemoryConsole>) {
        self.running.borrow_mut().push(console);
    }

    pub fn show_window(&self) {
        self.window.visible.set(true);
    }

    pub fn hide_window(&self) {
        self.window.visible.set(false);
    }

    pub fn select_tab(&self, index: usize) {
        self.window.selected.set(Some(index));
    }

    pub fn window_visible(&self) -> bool {
        self.window.visible.get()
    }

    /// Hold the next creation callback until [`Self::complete_creation`].
    pub fn defer_creation(&self) {
        self.defer.set(true);
    }

    /// Fire the held creation callback, if any.
    pub fn complete_creation(&self) {
        let pending = self.pending.borrow_mut().take();
        if let Some((console, on_ready)) = pending {
            self.finish_creation(console, on_ready);
        }
    }

    /// How many consoles were created through this host.
    pub fn created_count(&self) -> usize {
        self.created.get()
    }

    /// Concrete handle lookup by display name, for assertions.
    pub fn console_named(&self, name: &str) -> Option<Rc<MemoryConsole>> {
        self.running
            .borrow()
            .iter()
            .find(|console| console.name == name)
            .cloned()
            .or_else(|| {
                self.window
                    .tabs
                    .borrow()
                    .iter()
                    .find(|console| console.name == name)
                    .cloned()
            })
    }

    fn finish_creation(&self, console: Rc<MemoryConsole>, on_ready: OnConsoleReady) {
        self.add_tab(Rc::clone(&console));
        self.running.borrow_mut().push(Rc::clone(&console));
        on_ready(console);
    }
}

impl Default for MemoryConsoleHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleHost for MemoryConsoleHost {
    fn tool_window_visible(&self) -> bool {
        self.window.visible.get()
    }

    fn selected_console(&self) -> Option<SurfaceRef> {
        let tabs = self.window.tabs.borrow();
        self.window
            .selected
            .get()
            .and_then(|index| tabs.get(index).cloned())
            .map(|console| console as SurfaceRef)
    }

    fn console_tabs(&self) -> Vec<SurfaceRef> {
        self.window
            .tabs
            .borrow()
            .iter()
            .map(|console| Rc::clone(console) as SurfaceRef)
            .collect()
    }

    fn running_consoles(&self) -> Vec<SurfaceRef> {
        self.running
            .borrow()
            .iter()
            .map(|console| Rc::clone(console) as SurfaceRef)
            .collect()
    }

    fn activate_tool_window(&self, on_active: Box<dyn FnOnce()>) {
        self.window.visible.set(true);
        if self.window.selected.get().is_none() && !self.window.tabs.borrow().is_empty() {
            self.window.selected.set(Some(0));
        }
        on_active();
    }

    fn create_console(&self, on_ready: OnConsoleReady) {
        let count = self.created.get() + 1;
        self.created.set(count);
        let console = MemoryConsole::tool_window(format!("Console {count}"));
        tracing::debug!(console = %console.name, deferred = self.defer.get(), "console created");

        if self.defer.get() {
            *self.pending.borrow_mut() = Some((console, on_ready));
        } else {
            self.finish_creation(console, on_ready);
        }
    }
}

/// Scripted picker: always picks the candidate at a fixed index, or cancels.
///
/// Doubles as a headless host's picker (pick the first candidate) and as a
/// test double that records how often it was consulted.
pub struct StaticPicker {
    choice: Option<usize>,
    prompts: Cell<usize>,
    last_title: RefCell<Option<String>>,
}

impl StaticPicker {
    pub fn pick_first() -> Self {
        Self::pick_index(0)
    }

    pub fn pick_index(index: usize) -> Self {
        Self {
            choice: Some(index),
            prompts: Cell::new(0),
            last_title: RefCell::new(None),
        }
    }

    /// A picker whose prompt is always dismissed.
    pub fn cancelling() -> Self {
        Self {
            choice: None,
            prompts: Cell::new(0),
            last_title: RefCell::new(None),
        }
    }

    /// How many times a prompt was shown.
    pub fn prompt_count(&self) -> usize {
        self.prompts.get()
    }

    /// Title of the most recent prompt.
    pub fn last_title(&self) -> Option<String> {
        self.last_title.borrow().clone()
    }
}

impl ConsolePicker for StaticPicker {
    fn pick(&self, title: &str, candidates: Vec<SurfaceRef>, on_choice: OnPick) {
        self.prompts.set(self.prompts.get() + 1);
        *self.last_title.borrow_mut() = Some(title.to_owned());
        let choice = self
            .choice
            .and_then(|index| candidates.into_iter().nth(index));
        on_choice(choice);
    }
}
