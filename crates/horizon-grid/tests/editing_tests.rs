//! Editing through the grid: opening editors, commits, validation and the
//! editor lock shared between grids.

mod common;

use std::sync::Arc;

use horizon_grid::edit::{EditCommand, EditCommandHandler, EditorLock, ValidationResult};
use horizon_grid::model::{ItemHandle, Value};
use horizon_grid::render::MemoryBackend;
use horizon_grid::{Column, Grid, GridOptions, Key, KeyboardModifiers};
use parking_lot::Mutex;

use common::{TextEditorFactory, init_tracing, tasks};

fn editable_grid(factory: &Arc<TextEditorFactory>, options: GridOptions) -> Grid<MemoryBackend> {
    // Keep tests off the process-wide lock.
    let options = match options.editor_lock {
        Some(_) => options,
        None => options.with_editor_lock(Arc::new(EditorLock::new())),
    };
    Grid::in_memory()
        .data(tasks(5))
        .columns([
            Column::new("id", "id"),
            Column::new("title", "title").with_editor(factory.clone()),
        ])
        .options(options.with_column_header(false).with_editable(true))
        .container_size(400.0, 300.0)
        .build()
        .unwrap()
}

fn manual_grid(factory: &Arc<TextEditorFactory>) -> Grid<MemoryBackend> {
    editable_grid(factory, GridOptions::new().with_auto_edit(false))
}

fn title(grid: &Grid<MemoryBackend>, row: usize) -> Value {
    grid.data_item(row).map(|item| item.value("title")).unwrap_or_default()
}

fn active(grid: &Grid<MemoryBackend>) -> Option<(usize, usize)> {
    grid.active_cell().map(|p| (p.row, p.cell))
}

#[test]
fn test_commit_writes_the_item() {
    init_tracing();
    let factory = TextEditorFactory::new();
    let mut grid = manual_grid(&factory);
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    grid.signals()
        .cell_change
        .connect(move |change| sink.lock().push((change.row, change.cell)));

    assert!(grid.set_active_cell(1, 1));
    assert!(!grid.is_editing());
    assert!(grid.edit_active_cell(None).unwrap());
    assert!(grid.is_editing());
    assert!(grid.editor_lock().is_active());

    let cell = grid.cell_node(1, 1).unwrap();
    assert!(grid.backend().has_class(cell, "editable"));
    assert_eq!(grid.backend().text(cell), "");
    assert_eq!(*factory.input.lock(), Value::from("Task 1"));

    factory.type_text("Write docs");
    assert!(grid.commit_current_edit());
    assert!(!grid.is_editing());
    assert!(!grid.editor_lock().is_active());
    assert_eq!(title(&grid, 1), Value::from("Write docs"));
    assert_eq!(grid.backend().text(cell), "Write docs");
    assert!(!grid.backend().has_class(cell, "editable"));
    assert_eq!(*changes.lock(), vec![(1, 1)]);
}

#[test]
fn test_unchanged_commit_leaves_the_item_alone() {
    let factory = TextEditorFactory::new();
    let mut grid = manual_grid(&factory);
    let changes = Arc::new(Mutex::new(0usize));
    let sink = changes.clone();
    grid.signals().cell_change.connect(move |_| *sink.lock() += 1);

    grid.set_active_cell(2, 1);
    grid.edit_active_cell(None).unwrap();
    assert!(grid.commit_current_edit());
    assert_eq!(*changes.lock(), 0);
    let cell = grid.cell_node(2, 1).unwrap();
    assert_eq!(grid.backend().text(cell), "Task 2");
}

#[test]
fn test_invalid_value_blocks_moving_on() {
    init_tracing();
    let factory = TextEditorFactory::new();
    let mut grid = manual_grid(&factory);
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    grid.signals()
        .validation_error
        .connect(move |error| sink.lock().push(error.clone()));

    grid.set_active_cell(1, 1);
    grid.edit_active_cell(None).unwrap();
    factory.type_text("");

    assert!(!grid.navigate_down());
    assert_eq!(active(&grid), Some((1, 1)));
    assert!(grid.is_editing());
    let cell = grid.cell_node(1, 1).unwrap();
    assert!(grid.backend().has_class(cell, "invalid"));

    assert!(!grid.handle_click(3, 1));
    assert!(!grid.set_active_cell(0, 0));
    assert_eq!(active(&grid), Some((1, 1)));

    {
        let errors = errors.lock();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].column_id, "title");
        assert_eq!(errors[0].msg.as_deref(), Some("a title is required"));
    }

    factory.type_text("Fixed");
    assert!(grid.navigate_down());
    assert_eq!(active(&grid), Some((2, 1)));
    assert!(!grid.is_editing());
    assert_eq!(title(&grid, 1), Value::from("Fixed"));
    assert!(!grid.backend().has_class(cell, "invalid"));
}

#[test]
fn test_column_validator_runs_after_the_editor() {
    let factory = TextEditorFactory::new();
    let mut grid = Grid::in_memory()
        .data(tasks(3))
        .columns([Column::new("title", "title")
            .with_editor(factory.clone())
            .with_validator(|value| match value.as_str() {
                Some(text) if text.len() > 10 => ValidationResult::invalid("too long"),
                _ => ValidationResult::valid(),
            })])
        .options(
            GridOptions::new()
                .with_editable(true)
                .with_auto_edit(false)
                .with_editor_lock(Arc::new(EditorLock::new())),
        )
        .build()
        .unwrap();

    grid.set_active_cell(0, 0);
    grid.edit_active_cell(None).unwrap();
    factory.type_text("a very long title");
    assert!(!grid.commit_current_edit());
    assert!(grid.is_editing());

    factory.type_text("short");
    assert!(grid.commit_current_edit());
    assert_eq!(title(&grid, 0), Value::from("short"));
}

#[test]
fn test_navigation_stops_at_the_last_row() {
    let factory = TextEditorFactory::new();
    let mut grid = manual_grid(&factory);

    assert!(grid.set_active_cell(4, 1));
    assert!(!grid.navigate_down());
    assert_eq!(active(&grid), Some((4, 1)));
    assert!(grid.navigate_up());
    assert_eq!(active(&grid), Some((3, 1)));
}

#[test]
fn test_escape_discards_the_edit() {
    let factory = TextEditorFactory::new();
    let mut grid = manual_grid(&factory);

    grid.set_active_cell(1, 1);
    assert!(grid.handle_key_down(Key::F2, KeyboardModifiers::NONE));
    assert!(grid.is_editing());
    factory.type_text("scratch");

    assert!(grid.handle_key_down(Key::Escape, KeyboardModifiers::NONE));
    assert!(!grid.is_editing());
    assert_eq!(title(&grid, 1), Value::from("Task 1"));
    let cell = grid.cell_node(1, 1).unwrap();
    assert_eq!(grid.backend().text(cell), "Task 1");

    assert!(!grid.handle_key_down(Key::Escape, KeyboardModifiers::NONE));
}

#[test]
fn test_enter_commits_and_moves_down() {
    let factory = TextEditorFactory::new();
    let mut grid = editable_grid(&factory, GridOptions::new());

    assert!(grid.set_active_cell(1, 1));
    assert!(grid.is_editing());
    factory.type_text("Done");

    assert!(grid.handle_key_down(Key::Enter, KeyboardModifiers::NONE));
    assert_eq!(title(&grid, 1), Value::from("Done"));
    assert_eq!(active(&grid), Some((2, 1)));
    assert!(grid.is_editing());
    assert_eq!(*factory.input.lock(), Value::from("Task 2"));
    let committed = grid.cell_node(1, 1).unwrap();
    assert_eq!(grid.backend().text(committed), "Done");
}

#[test]
fn test_editor_requests_go_through_the_event_loop() {
    let factory = TextEditorFactory::new();
    let mut grid = manual_grid(&factory);
    grid.set_active_cell(0, 1);
    grid.edit_active_cell(None).unwrap();
    factory.type_text("From the editor");

    grid.editor_host().commit_changes();
    assert!(grid.is_editing());
    assert!(grid.process_events());
    assert!(!grid.is_editing());
    assert_eq!(title(&grid, 0), Value::from("From the editor"));
}

#[test]
fn test_grids_share_one_editor_lock() {
    init_tracing();
    let lock = Arc::new(EditorLock::new());
    let first_factory = TextEditorFactory::new();
    let second_factory = TextEditorFactory::new();
    let mut first = editable_grid(
        &first_factory,
        GridOptions::new().with_auto_edit(false).with_editor_lock(lock.clone()),
    );
    let mut second = editable_grid(
        &second_factory,
        GridOptions::new().with_auto_edit(false).with_editor_lock(lock.clone()),
    );
    assert!(Arc::ptr_eq(&first.editor_lock(), &lock));

    first.set_active_cell(1, 1);
    first.edit_active_cell(None).unwrap();
    first_factory.type_text("");
    assert!(!second.set_active_cell(0, 0));
    assert!(first.is_editing());

    first_factory.type_text("Shared");
    assert!(second.set_active_cell(0, 0));
    assert!(!first.is_editing());
    assert!(!lock.is_active());

    assert!(first.process_events());
    assert_eq!(title(&first, 1), Value::from("Shared"));
    let cell = first.cell_node(1, 1).unwrap();
    assert_eq!(first.backend().text(cell), "Shared");
}

#[test]
fn test_edit_refused_while_another_grid_holds_the_lock() {
    let lock = Arc::new(EditorLock::new());
    let first_factory = TextEditorFactory::new();
    let second_factory = TextEditorFactory::new();
    let mut first = editable_grid(
        &first_factory,
        GridOptions::new().with_auto_edit(false).with_editor_lock(lock.clone()),
    );
    let mut second = editable_grid(
        &second_factory,
        GridOptions::new().with_auto_edit(false).with_editor_lock(lock.clone()),
    );

    second.set_active_cell(2, 1);
    first.set_active_cell(1, 1);
    assert!(first.edit_active_cell(None).unwrap());
    first_factory.type_text("Pending");

    assert!(!second.edit_active_cell(None).unwrap());
    assert!(first.is_editing());
    assert!(!second.is_editing());
    assert!(lock.is_active());
    assert_eq!(title(&first, 1), Value::from("Task 1"));

    assert!(first.commit_current_edit());
    assert!(second.edit_active_cell(None).unwrap());
    assert!(second.is_editing());
}

#[test]
fn test_before_edit_cell_can_veto() {
    let factory = TextEditorFactory::new();
    let mut grid = manual_grid(&factory);
    grid.signals().before_edit_cell.connect(|event| {
        if event.row == 2 {
            event.veto.set();
        }
    });

    grid.set_active_cell(2, 1);
    assert!(!grid.edit_active_cell(None).unwrap());
    grid.set_active_cell(3, 1);
    assert!(grid.edit_active_cell(None).unwrap());
}

#[test]
fn test_cells_without_editors_stay_read_only() {
    let factory = TextEditorFactory::new();
    let mut grid = manual_grid(&factory);
    grid.set_active_cell(1, 0);
    assert!(!grid.edit_active_cell(None).unwrap());

    let mut read_only = Grid::in_memory()
        .data(tasks(3))
        .columns([Column::new("title", "title").with_editor(factory.clone())])
        .options(GridOptions::new().with_editor_lock(Arc::new(EditorLock::new())))
        .build()
        .unwrap();
    read_only.set_active_cell(0, 0);
    assert!(!read_only.edit_active_cell(None).unwrap());
    assert!(!read_only.handle_dbl_click(1, 0));
}

#[test]
fn test_double_click_opens_the_editor() {
    let factory = TextEditorFactory::new();
    let mut grid = manual_grid(&factory);
    assert!(grid.handle_dbl_click(3, 1));
    assert_eq!(active(&grid), Some((3, 1)));
    assert!(grid.is_editing());
}

#[test]
fn test_command_handler_sees_both_values() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: EditCommandHandler = Arc::new(move |_item: &ItemHandle, column: &Column, command: EditCommand| {
        sink.lock().push((
            column.id.clone(),
            command.prev_serialized_value.clone(),
            command.serialized_value.clone(),
        ));
        command.execute();
    });
    let factory = TextEditorFactory::new();
    let mut grid = editable_grid(
        &factory,
        GridOptions::new().with_auto_edit(false).with_edit_command_handler(handler),
    );

    grid.set_active_cell(1, 1);
    grid.edit_active_cell(None).unwrap();
    factory.type_text("Renamed");
    assert!(grid.commit_current_edit());

    assert_eq!(
        *seen.lock(),
        vec![("title".to_string(), Value::from("Task 1"), Value::from("Renamed"))]
    );
    assert_eq!(title(&grid, 1), Value::from("Renamed"));
}
