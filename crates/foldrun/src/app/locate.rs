//! Locating or creating the execution surface for one dispatch.

use std::rc::Rc;

use crate::domain::model::SurfaceKind;
use crate::host::{ConsoleHost, ConsolePicker, EditorRef, SurfaceRef};

/// Single-fire continuation receiving the located executor.
pub type OnExecutor = Box<dyn FnOnce(SurfaceRef)>;

/// Decision procedure for choosing where submitted code runs.
///
/// Every invocation's state lives in the continuations it hands to the host,
/// so concurrent invocations share nothing and cannot observe each other.
pub struct ConsoleLocator {
    host: Rc<dyn ConsoleHost>,
    picker: Rc<dyn ConsolePicker>,
    prompt_title: String,
}

impl ConsoleLocator {
    pub fn new(
        host: Rc<dyn ConsoleHost>,
        picker: Rc<dyn ConsolePicker>,
        prompt_title: impl Into<String>,
    ) -> Self {
        Self {
            host,
            picker,
            prompt_title: prompt_title.into(),
        }
    }

    /// Locate an executor and hand it to `on_ready`, at most once.
    ///
    /// Zero candidates request console creation; a single candidate is used
    /// directly without prompting; two or more go through the picker. A
    /// dismissed prompt, or a creation that never completes, means `on_ready`
    /// is simply dropped.
    pub fn find_executor(&self, editor: Option<EditorRef>, on_ready: OnExecutor) {
        let mut candidates = self.candidates();
        tracing::debug!(count = candidates.len(), "console candidates located");

        match candidates.len() {
            0 => self.start_console(on_ready),
            1 => deliver(&self.host, candidates.remove(0), editor, on_ready),
            _ => {
                let host = Rc::clone(&self.host);
                self.picker.pick(
                    &self.prompt_title,
                    candidates,
                    Box::new(move |choice| match choice {
                        Some(surface) => deliver(&host, surface, editor, on_ready),
                        None => tracing::debug!("console selection dismissed"),
                    }),
                );
            }
        }
    }

    /// Candidate surfaces in preference order.
    ///
    /// A visible tool window short-circuits to its selected tab. Otherwise
    /// live code-executing run contents are preferred, falling back to the
    /// tool window's tabs.
    fn candidates(&self) -> Vec<SurfaceRef> {
        if self.host.tool_window_visible() {
            return self.host.selected_console().into_iter().collect();
        }

        let running: Vec<SurfaceRef> = self
            .host
            .running_consoles()
            .into_iter()
            .filter(|console| console.executes_code() && console.is_alive())
            .collect();
        if running.is_empty() {
            self.host.console_tabs()
        } else {
            running
        }
    }

    fn start_console(&self, on_ready: OnExecutor) {
        // A tool window that owns tabs but shows no selection only needs to
        // be activated; its first tab becomes the executor.
        if !self.host.console_tabs().is_empty() {
            let host = Rc::clone(&self.host);
            self.host.activate_tool_window(Box::new(move || {
                if let Some(first) = host.console_tabs().into_iter().next()
                    && first.executes_code()
                {
                    on_ready(first);
                }
            }));
            return;
        }

        tracing::debug!("no console available, requesting creation");
        self.host.create_console(Box::new(move |surface| {
            if surface.executes_code() {
                on_ready(Rc::clone(&surface));
                surface.reveal();
            }
        }));
    }
}

/// Hand the chosen surface to the continuation, then make it visible.
///
/// Debugger-owned consoles get their console sub-tab selected and keyboard
/// focus returned to the originating editor; tool-window consoles are only
/// revealed when their window is hidden.
fn deliver(
    host: &Rc<dyn ConsoleHost>,
    surface: SurfaceRef,
    editor: Option<EditorRef>,
    on_ready: OnExecutor,
) {
    on_ready(Rc::clone(&surface));

    match surface.kind() {
        SurfaceKind::Debugger => {
            surface.reveal();
            if let Some(editor) = editor {
                editor.request_focus();
            }
        }
        SurfaceKind::ToolWindow => {
            if !host.tool_window_visible() {
                surface.reveal();
            }
        }
    }
}
