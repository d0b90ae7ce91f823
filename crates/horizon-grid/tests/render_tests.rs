//! Virtual rendering: which rows and cells exist in the render tree.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use horizon_grid::model::{Group, RowItem, Value, VecDataSource};
use horizon_grid::render::MemoryBackend;
use horizon_grid::{Column, Grid, GridOptions};

use common::{init_tracing, tasks};

fn columns() -> Vec<Column> {
    vec![
        Column::new("id", "id").with_name("Id").with_width(60.0),
        Column::new("title", "title").with_name("Title").with_width(200.0),
    ]
}

fn grid_with(data: Arc<VecDataSource>, options: GridOptions) -> Grid<MemoryBackend> {
    Grid::in_memory()
        .data(data)
        .columns(columns())
        .options(options.with_column_header(false))
        .container_size(400.0, 500.0)
        .build()
        .unwrap()
}

/// Fire every timer that is due, including the ones the fired timers start.
fn run_timers(grid: &mut Grid<MemoryBackend>) {
    for _ in 0..1000 {
        if !grid.has_pending_timers() {
            return;
        }
        grid.process_timers(Instant::now() + Duration::from_secs(1));
    }
    panic!("timers never settled");
}

#[test]
fn test_viewport_adds_buffer_rows() {
    init_tracing();
    let grid = grid_with(tasks(100_000), GridOptions::new().with_row_height(25.0));

    let range = grid.viewport(Some(2500.0), None);
    assert_eq!(range.rows(), 97..124);
    assert_eq!(grid.visible_range().rows(), 0..21);
}

#[test]
fn test_initial_render_covers_the_top() {
    init_tracing();
    let grid = grid_with(tasks(100_000), GridOptions::new());

    let rendered = grid.rendered_rows();
    assert_eq!(rendered, (0..24).collect::<Vec<_>>());
    assert_eq!(grid.rendered_cells(0), vec![0, 1]);

    let node = grid.cell_node(3, 1).unwrap();
    assert_eq!(grid.backend().text(node), "Task 3");
    assert!(grid.backend().has_class(grid.row_nodes(3).unwrap()[0], "odd"));
}

#[test]
fn test_rendered_rows_follow_the_scroll() {
    init_tracing();
    let mut grid = grid_with(tasks(100_000), GridOptions::new());

    for top in [30.0, 400.0, 2500.0, 90_000.0, 2_499_500.0, 1_000.0, 0.0] {
        grid.set_scroll_position(top, 0.0);
        run_timers(&mut grid);

        let visible = grid.visible_range();
        let rendered = grid.rendered_range();
        assert!(rendered.contains(&visible), "{visible:?} not inside {rendered:?}");
        assert_eq!(grid.rendered_rows(), rendered.rows().collect::<Vec<_>>());
    }
}

#[test]
fn test_small_scrolls_do_not_render() {
    let mut grid = grid_with(tasks(1_000), GridOptions::new());
    let renders = Arc::new(AtomicUsize::new(0));
    let count = renders.clone();
    grid.signals().rendered.connect(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    });

    grid.set_scroll_position(15.0, 0.0);
    assert_eq!(renders.load(Ordering::SeqCst), 0);

    grid.set_scroll_position(50.0, 0.0);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

#[test]
fn test_long_jump_renders_later() {
    let mut grid = grid_with(tasks(100_000), GridOptions::new());

    grid.set_scroll_position(50_000.0, 0.0);
    assert!(grid.has_pending_timers());
    assert!(grid.rendered_rows().contains(&0));

    run_timers(&mut grid);
    assert!(!grid.rendered_rows().contains(&0));
    assert!(grid.rendered_rows().contains(&2000));
}

#[test]
fn test_changed_row_is_refreshed_in_place() {
    init_tracing();
    let data = tasks(100);
    let mut grid = grid_with(data.clone(), GridOptions::new());
    let row_node = grid.row_nodes(5).unwrap()[0];
    let cell = grid.cell_node(5, 1).unwrap();

    data.update_item(5, |record| record.set_value("title", Value::from("Renamed")));
    assert!(grid.process_events());

    assert_eq!(grid.row_nodes(5).unwrap()[0], row_node);
    assert_eq!(grid.cell_node(5, 1), Some(cell));
    assert_eq!(grid.backend().text(cell), "Renamed");
}

#[test]
fn test_row_turning_into_a_group_is_rebuilt() {
    let data = tasks(100);
    let mut grid = grid_with(data.clone(), GridOptions::new());
    let row_node = grid.row_nodes(5).unwrap()[0];

    data.set_row(5, RowItem::Group(Arc::new(Group::new("Open", "open", 3))));
    grid.process_events();

    let rebuilt = grid.row_nodes(5).unwrap()[0];
    assert_ne!(rebuilt, row_node);
    assert!(!grid.backend().contains(row_node));
    assert_eq!(grid.rendered_cells(5), vec![0]);
    assert!(grid.backend().has_class(rebuilt, "slick-group"));
}

#[test]
fn test_row_count_changes() {
    let data = tasks(10);
    let mut grid = grid_with(data.clone(), GridOptions::new());
    assert_eq!(grid.rendered_rows().len(), 10);

    data.push(common::task_rows(11).remove(10));
    grid.process_events();
    assert_eq!(grid.data_length(), 11);
    assert!(grid.rendered_rows().contains(&10));

    data.remove(0);
    data.remove(0);
    grid.process_events();
    assert_eq!(grid.rendered_rows(), (0..9).collect::<Vec<_>>());
    let node = grid.cell_node(0, 1).unwrap();
    assert_eq!(grid.backend().text(node), "Task 2");
}

#[test]
fn test_columns_follow_horizontal_scroll() {
    init_tracing();
    let columns: Vec<Column> = (0..30)
        .map(|i| Column::new(format!("c{i}"), "id").with_width(100.0))
        .collect();
    let mut grid = Grid::in_memory()
        .data(tasks(50))
        .columns(columns)
        .options(GridOptions::new().with_column_header(false))
        .container_size(400.0, 500.0)
        .build()
        .unwrap();
    assert_eq!(grid.rendered_cells(0), (0..8).collect::<Vec<_>>());

    grid.set_scroll_position(0.0, 1200.0);
    assert!(grid.has_pending_timers());
    run_timers(&mut grid);
    assert_eq!(grid.rendered_cells(0), (8..20).collect::<Vec<_>>());
    assert_eq!(grid.rendered_cells(10), (8..20).collect::<Vec<_>>());
}

#[test]
fn test_resized_column_brings_neighbours_into_view() {
    let columns: Vec<Column> = (0..10)
        .map(|i| Column::new(format!("c{i}"), "id").with_width(100.0).with_width_limits(5.0, None))
        .collect();
    let mut grid = Grid::in_memory()
        .data(tasks(20))
        .columns(columns)
        .options(GridOptions::new().with_column_header(false))
        .container_size(300.0, 250.0)
        .build()
        .unwrap();
    assert_eq!(grid.rendered_cells(0), (0..6).collect::<Vec<_>>());

    grid.set_column_width("c0", 10.0).unwrap();
    assert_eq!(grid.rendered_cells(0), (0..7).collect::<Vec<_>>());
    assert_eq!(grid.rendered_cells(5), (0..7).collect::<Vec<_>>());
    let cell = grid.cell_node(3, 6).unwrap();
    assert_eq!(grid.backend().node(cell).unwrap().left, 510.0);

    grid.set_column_width("c0", 300.0).unwrap();
    assert_eq!(grid.rendered_cells(0), (0..4).collect::<Vec<_>>());
}

#[test]
fn test_render_all_cells() {
    let columns: Vec<Column> = (0..30)
        .map(|i| Column::new(format!("c{i}"), "id").with_width(100.0))
        .collect();
    let grid = Grid::in_memory()
        .data(tasks(5))
        .columns(columns)
        .options(GridOptions::new().with_render_all_cells(true))
        .container_size(400.0, 500.0)
        .build()
        .unwrap();
    assert_eq!(grid.rendered_cells(0).len(), 30);
}

fn decorated_grid(cleanups: Arc<AtomicUsize>) -> Grid<MemoryBackend> {
    let columns = vec![
        Column::new("id", "id"),
        Column::new("spark", "id")
            .with_async_post_render(|args| args.backend.set_class(args.node, "decorated", true))
            .with_async_post_render_cleanup(move |_| {
                cleanups.fetch_add(1, Ordering::SeqCst);
            }),
    ];
    Grid::in_memory()
        .data(tasks(1_000))
        .columns(columns)
        .options(
            GridOptions::new()
                .with_column_header(false)
                .with_async_post_render(true, true)
                .with_force_sync_scrolling(true),
        )
        .container_size(400.0, 500.0)
        .build()
        .unwrap()
}

#[test]
fn test_post_render_decorates_visible_rows() {
    init_tracing();
    let mut grid = decorated_grid(Arc::new(AtomicUsize::new(0)));
    let cell = grid.cell_node(0, 1).unwrap();
    assert!(!grid.backend().has_class(cell, "decorated"));

    run_timers(&mut grid);
    assert!(grid.backend().has_class(cell, "decorated"));
    let buffer_row = grid.cell_node(22, 1).unwrap();
    assert!(!grid.backend().has_class(buffer_row, "decorated"));
}

#[test]
fn test_parked_row_is_rescued() {
    let cleanups = Arc::new(AtomicUsize::new(0));
    let mut grid = decorated_grid(cleanups.clone());
    run_timers(&mut grid);
    let row_node = grid.row_nodes(0).unwrap()[0];

    grid.set_scroll_position(2500.0, 0.0);
    assert!(grid.row_nodes(0).is_none());
    assert!(grid.backend().contains(row_node));
    assert!(!grid.backend().is_attached(row_node));

    grid.set_scroll_position(0.0, 0.0);
    assert_eq!(grid.row_nodes(0).unwrap()[0], row_node);
    assert!(grid.backend().is_attached(row_node));
    let cell = grid.cell_node(0, 1).unwrap();
    assert!(grid.backend().has_class(cell, "decorated"));

    run_timers(&mut grid);
    assert!(grid.backend().contains(row_node));
}

#[test]
fn test_parked_rows_are_cleaned_up() {
    let cleanups = Arc::new(AtomicUsize::new(0));
    let mut grid = decorated_grid(cleanups.clone());
    run_timers(&mut grid);
    let row_node = grid.row_nodes(0).unwrap()[0];

    grid.set_scroll_position(2500.0, 0.0);
    run_timers(&mut grid);

    assert!(!grid.backend().contains(row_node));
    assert!(cleanups.load(Ordering::SeqCst) >= 21);
}
