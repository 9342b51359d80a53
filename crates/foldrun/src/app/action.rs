//! The "execute region in console" action surface.
//!
//! Hosts bind their action/menu machinery to the [`ExecuteRegionAction`]
//! function pair: `is_applicable` drives the enable/disable affordance,
//! `invoke` runs the action. Both take an [`ActionState`] the host assembles
//! per invocation; absent context disables or no-ops, it is never an error.

use std::rc::Rc;

use crate::app::extract;
use crate::app::locate::ConsoleLocator;
use crate::app::payload::AnnotatedPayload;
use crate::domain::model::SourceLocation;
use crate::host::{ConsoleHost, ConsolePicker, EditorRef};
use crate::infra::config::Config;

/// Host services scoped to the project of one invocation.
pub struct ProjectServices {
    pub consoles: Rc<dyn ConsoleHost>,
    pub picker: Rc<dyn ConsolePicker>,
}

/// Everything the host binds to one action invocation.
pub struct ActionState {
    pub editor: Option<EditorRef>,
    pub project: Option<ProjectServices>,
}

/// The editor action: decide applicability, extract, annotate, dispatch.
pub struct ExecuteRegionAction {
    config: Config,
}

impl ExecuteRegionAction {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Drives the host's enable/disable affordance.
    ///
    /// True only when an editor is bound, the document is classified as the
    /// configured language, and the caret sits inside a fold region with
    /// non-empty text. Side-effect free; hosts may call this on every UI
    /// refresh.
    pub fn is_applicable(&self, state: &ActionState) -> bool {
        let Some(editor) = &state.editor else {
            return false;
        };
        if !self.language_matches(editor) {
            return false;
        }
        self.region_text(editor)
            .is_some_and(|text| !text.is_empty())
    }

    /// Extract the folded region under the caret, annotate it with its
    /// origin, and send it to a located console.
    ///
    /// Missing context, a missing region, or a dismissed picker all end the
    /// invocation silently.
    pub fn invoke(&self, state: &ActionState) {
        let Some(editor) = &state.editor else {
            return;
        };
        let Some(code) = self.region_text(editor).filter(|text| !text.is_empty()) else {
            return;
        };
        let Some(project) = &state.project else {
            tracing::debug!("no project context bound, skipping dispatch");
            return;
        };

        let payload = self.annotate(editor, &code);
        let locator = ConsoleLocator::new(
            Rc::clone(&project.consoles),
            Rc::clone(&project.picker),
            self.config.picker.title(),
        );

        let editor_for_dispatch = Rc::clone(editor);
        locator.find_executor(
            Some(Rc::clone(editor)),
            Box::new(move |surface| {
                surface.execute(Some(payload.as_str()), Some(&editor_for_dispatch));
            }),
        );
    }

    /// Locate (or create) a console and focus it without executing anything.
    pub fn open_console(&self, state: &ActionState) {
        let Some(project) = &state.project else {
            return;
        };

        let locator = ConsoleLocator::new(
            Rc::clone(&project.consoles),
            Rc::clone(&project.picker),
            self.config.picker.title(),
        );

        let editor_for_dispatch = state.editor.clone();
        locator.find_executor(
            state.editor.clone(),
            Box::new(move |surface| {
                surface.execute(None, editor_for_dispatch.as_ref());
            }),
        );
    }

    fn language_matches(&self, editor: &EditorRef) -> bool {
        editor
            .language_id()
            .is_some_and(|id| id == self.config.language.id)
    }

    fn region_text(&self, editor: &EditorRef) -> Option<String> {
        extract::extract_region(
            editor.caret_offset(),
            &editor.fold_regions(),
            &editor.document_text(),
        )
    }

    fn annotate(&self, editor: &EditorRef, code: &str) -> AnnotatedPayload {
        match editor.file_path() {
            Some(path) => AnnotatedPayload::with_prefix(
                self.config.annotation.comment_prefix(),
                &SourceLocation {
                    path,
                    line: editor.caret_line(),
                },
                code,
            ),
            // An unsaved buffer has no origin worth annotating.
            None => AnnotatedPayload::raw(code),
        }
    }
}
