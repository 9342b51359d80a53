//! End-to-end action flows against the in-memory reference host.

use std::rc::Rc;

use foldrun::app::action::{ActionState, ExecuteRegionAction, ProjectServices};
use foldrun::domain::model::FoldRegion;
use foldrun::host::memory::{MemoryConsole, MemoryConsoleHost, MemoryEditor, StaticPicker};
use foldrun::host::{ConsoleHost, ConsolePicker, EditorRef};
use foldrun::infra::config::Config;

const SCRIPT: &str = "\
import sys
#%% setup
a = 1
b = 2
#%% run
print(a + b)
";

fn python_editor() -> MemoryEditor {
    MemoryEditor::new(SCRIPT)
        .with_path("/proj/x.py")
        .with_language("python")
        .with_marker_folding("#")
}

fn state(
    editor: Option<Rc<MemoryEditor>>,
    host: &Rc<MemoryConsoleHost>,
    picker: &Rc<StaticPicker>,
) -> ActionState {
    ActionState {
        editor: editor.map(|editor| editor as EditorRef),
        project: Some(ProjectServices {
            consoles: Rc::clone(host) as Rc<dyn ConsoleHost>,
            picker: Rc::clone(picker) as Rc<dyn ConsolePicker>,
        }),
    }
}

fn caret_at(editor: &MemoryEditor, needle: &str) {
    editor.set_caret(SCRIPT.find(needle).expect("needle present in script"));
}

#[test]
fn executes_annotated_region_in_existing_console() {
    let editor = Rc::new(python_editor());
    caret_at(&editor, "print");

    let host = Rc::new(MemoryConsoleHost::new());
    let console = MemoryConsole::tool_window("Console 1");
    host.add_running(Rc::clone(&console));
    let picker = Rc::new(StaticPicker::cancelling());

    let action = ExecuteRegionAction::new(Config::default());
    let state = state(Some(Rc::clone(&editor)), &host, &picker);
    assert!(action.is_applicable(&state));

    action.invoke(&state);

    // Caret sits on the line after "import sys" and the "#%% setup" cell,
    // i.e. zero-based line 5, and the run cell spans marker to end of file.
    assert_eq!(
        console.transcript(),
        vec!["#/proj/x.py:5\n#%% run\nprint(a + b)\n".to_owned()]
    );
    assert_eq!(picker.prompt_count(), 0);
}

#[test]
fn action_is_disabled_without_an_editor() {
    let host = Rc::new(MemoryConsoleHost::new());
    let picker = Rc::new(StaticPicker::pick_first());
    let action = ExecuteRegionAction::new(Config::default());

    let state = state(None, &host, &picker);
    assert!(!action.is_applicable(&state));

    action.invoke(&state);
    assert_eq!(host.created_count(), 0);
}

#[test]
fn action_is_disabled_for_other_languages() {
    let editor = Rc::new(
        MemoryEditor::new(SCRIPT)
            .with_language("rust")
            .with_marker_folding("#"),
    );
    caret_at(&editor, "print");

    let host = Rc::new(MemoryConsoleHost::new());
    let picker = Rc::new(StaticPicker::pick_first());
    let action = ExecuteRegionAction::new(Config::default());

    let state = state(Some(editor), &host, &picker);
    assert!(!action.is_applicable(&state));
}

#[test]
fn action_is_disabled_outside_any_region() {
    let editor = Rc::new(python_editor());
    caret_at(&editor, "import");

    let host = Rc::new(MemoryConsoleHost::new());
    let picker = Rc::new(StaticPicker::pick_first());
    let action = ExecuteRegionAction::new(Config::default());

    let state = state(Some(Rc::clone(&editor)), &host, &picker);
    assert!(!action.is_applicable(&state));

    action.invoke(&state);
    assert_eq!(host.created_count(), 0);
}

#[test]
fn invoke_without_project_context_is_a_noop() {
    let editor = Rc::new(python_editor());
    caret_at(&editor, "print");

    let action = ExecuteRegionAction::new(Config::default());
    let state = ActionState {
        editor: Some(editor as EditorRef),
        project: None,
    };

    assert!(action.is_applicable(&state));
    action.invoke(&state);
}

#[test]
fn invoke_creates_a_console_when_none_is_running() {
    let editor = Rc::new(python_editor());
    caret_at(&editor, "a = 1");

    let host = Rc::new(MemoryConsoleHost::new());
    let picker = Rc::new(StaticPicker::pick_first());
    let action = ExecuteRegionAction::new(Config::default());

    action.invoke(&state(Some(editor), &host, &picker));

    assert_eq!(host.created_count(), 1);
    assert!(host.window_visible());
    let created = host.console_named("Console 1").unwrap();
    assert_eq!(
        created.transcript(),
        vec!["#/proj/x.py:2\n#%% setup\na = 1\nb = 2\n".to_owned()]
    );
}

#[test]
fn ambiguous_consoles_are_resolved_through_the_picker_title_from_config() {
    let editor = Rc::new(python_editor());
    caret_at(&editor, "print");

    let host = Rc::new(MemoryConsoleHost::new());
    host.add_running(MemoryConsole::tool_window("first"));
    let second = MemoryConsole::tool_window("second");
    host.add_running(Rc::clone(&second));
    let picker = Rc::new(StaticPicker::pick_index(1));

    let action = ExecuteRegionAction::new(Config::default());
    action.invoke(&state(Some(editor), &host, &picker));

    assert_eq!(picker.prompt_count(), 1);
    assert_eq!(
        picker.last_title().as_deref(),
        Some("Select console to execute in")
    );
    assert_eq!(second.transcript().len(), 1);
}

#[test]
fn cancelled_picker_dispatches_nothing() {
    let editor = Rc::new(python_editor());
    caret_at(&editor, "print");

    let host = Rc::new(MemoryConsoleHost::new());
    let first = MemoryConsole::tool_window("first");
    let second = MemoryConsole::tool_window("second");
    host.add_running(Rc::clone(&first));
    host.add_running(Rc::clone(&second));
    let picker = Rc::new(StaticPicker::cancelling());

    let action = ExecuteRegionAction::new(Config::default());
    action.invoke(&state(Some(editor), &host, &picker));

    assert!(first.transcript().is_empty());
    assert!(second.transcript().is_empty());
}

#[test]
fn debugger_console_restores_focus_to_the_editor() {
    let editor = Rc::new(python_editor());
    caret_at(&editor, "print");

    let host = Rc::new(MemoryConsoleHost::new());
    let debug_console = MemoryConsole::debugger("Debug");
    host.add_running(Rc::clone(&debug_console));
    let picker = Rc::new(StaticPicker::cancelling());

    let action = ExecuteRegionAction::new(Config::default());
    action.invoke(&state(Some(Rc::clone(&editor)), &host, &picker));

    assert_eq!(debug_console.transcript().len(), 1);
    assert!(debug_console.was_revealed(), "console sub-tab selected");
    assert_eq!(editor.focus_requests(), 1);
}

#[test]
fn deferred_console_creation_dispatches_after_ready() {
    let editor = Rc::new(python_editor());
    caret_at(&editor, "print");

    let host = Rc::new(MemoryConsoleHost::new());
    host.defer_creation();
    let picker = Rc::new(StaticPicker::pick_first());

    let action = ExecuteRegionAction::new(Config::default());
    action.invoke(&state(Some(editor), &host, &picker));

    assert!(host.running_consoles().is_empty());

    host.complete_creation();
    let console = host.console_named("Console 1").unwrap();
    assert_eq!(console.transcript().len(), 1, "dispatch fired on readiness");
}

#[test]
fn unsaved_buffer_dispatches_without_an_origin_line() {
    let editor = Rc::new(
        MemoryEditor::new(SCRIPT)
            .with_language("python")
            .with_marker_folding("#"),
    );
    caret_at(&editor, "a = 1");

    let host = Rc::new(MemoryConsoleHost::new());
    let console = MemoryConsole::tool_window("Console 1");
    host.add_running(Rc::clone(&console));
    let picker = Rc::new(StaticPicker::cancelling());

    let action = ExecuteRegionAction::new(Config::default());
    action.invoke(&state(Some(editor), &host, &picker));

    assert_eq!(
        console.transcript(),
        vec!["#%% setup\na = 1\nb = 2\n".to_owned()]
    );
}

#[test]
fn open_console_focuses_without_executing() {
    let host = Rc::new(MemoryConsoleHost::new());
    let console = MemoryConsole::tool_window("Console 1");
    host.add_running(Rc::clone(&console));
    let picker = Rc::new(StaticPicker::cancelling());

    let action = ExecuteRegionAction::new(Config::default());
    action.open_console(&state(None, &host, &picker));

    assert!(console.transcript().is_empty());
    assert!(console.was_revealed());
}

#[test]
fn explicit_fold_regions_override_marker_scanning() {
    let text = "alpha\nbeta\ngamma\n";
    let editor = Rc::new(
        MemoryEditor::new(text)
            .with_path("/proj/y.py")
            .with_language("python")
            .with_regions(vec![
                FoldRegion::new(0, 16, "outer"),
                FoldRegion::new(6, 11, "inner"),
            ]),
    );
    editor.set_caret(8);

    let host = Rc::new(MemoryConsoleHost::new());
    let console = MemoryConsole::tool_window("Console 1");
    host.add_running(Rc::clone(&console));
    let picker = Rc::new(StaticPicker::cancelling());

    let action = ExecuteRegionAction::new(Config::default());
    action.invoke(&state(Some(editor), &host, &picker));

    assert_eq!(console.transcript(), vec!["#/proj/y.py:1\nbeta\n".to_owned()]);
}
