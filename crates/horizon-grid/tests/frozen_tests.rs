//! Frozen columns and rows: column order, pane placement and pinned rows.

mod common;

use horizon_grid::render::{MemoryBackend, NodeId};
use horizon_grid::{Column, Direction, Grid, GridError, GridOptions};

use common::{init_tracing, tasks};

fn five_columns() -> Vec<Column> {
    (0..5)
        .map(|i| {
            Column::new(format!("c{i}"), "title")
                .with_width(100.0)
                .with_frozen(i == 2 || i == 4)
        })
        .collect()
}

fn frozen_grid(rows: usize, options: GridOptions) -> Grid<MemoryBackend> {
    Grid::in_memory()
        .data(tasks(rows))
        .columns(five_columns())
        .options(options.with_column_header(false).with_force_sync_scrolling(true))
        .container_size(600.0, 500.0)
        .build()
        .unwrap()
}

fn parent_of(grid: &Grid<MemoryBackend>, node: NodeId) -> Option<NodeId> {
    grid.backend().node(node).and_then(|n| n.parent)
}

#[test]
fn test_flagged_columns_move_first() {
    init_tracing();
    let grid = frozen_grid(100, GridOptions::new());

    let ids: Vec<&str> = grid.columns().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c2", "c4", "c0", "c1", "c3"]);
    assert_eq!(grid.layout().frozen_cols(), 2);
    assert_eq!(grid.column_index("c4"), Some(1));
    assert_eq!(grid.initial_columns()[2].id, "c2");

    let metrics = grid.layout().column_metrics();
    assert_eq!(metrics.frozen_width(), 200.0);
    assert_eq!(metrics.left(2), 0.0);
    assert_eq!(metrics.left(4), 200.0);
}

#[test]
fn test_frozen_count_from_options() {
    let columns: Vec<Column> = (0..4).map(|i| Column::new(format!("c{i}"), "id")).collect();
    let grid = Grid::in_memory()
        .data(tasks(10))
        .columns(columns)
        .options(GridOptions::new().with_frozen_columns(1))
        .build()
        .unwrap();
    assert_eq!(grid.layout().layout_name(), "frozen");
    assert_eq!(grid.layout().frozen_cols(), 1);
    assert_eq!(grid.columns()[0].id, "c0");
}

#[test]
fn test_frozen_counts_are_validated() {
    let columns = || (0..5).map(|i| Column::new(format!("c{i}"), "id")).collect::<Vec<_>>();

    let too_many_columns = Grid::in_memory()
        .data(tasks(10))
        .columns(columns())
        .options(GridOptions::new().with_frozen_columns(9))
        .build();
    assert!(matches!(
        too_many_columns,
        Err(GridError::FrozenColumnsOutOfRange { frozen: 9, columns: 5 })
    ));

    let too_many_rows = Grid::in_memory()
        .data(tasks(5))
        .columns(columns())
        .options(GridOptions::new().with_frozen_rows(20))
        .build();
    assert!(matches!(
        too_many_rows,
        Err(GridError::FrozenRowsOutOfRange { frozen: 20, rows: 5 })
    ));
}

#[test]
fn test_rows_split_across_panes() {
    let grid = frozen_grid(100, GridOptions::new().with_frozen_rows(2));
    let layout = grid.layout();

    let frozen_row = grid.row_nodes(0).unwrap();
    assert_eq!(frozen_row.len(), 2);
    assert_eq!(parent_of(&grid, frozen_row[0]), layout.canvas_node_for(0, 0));
    assert_eq!(parent_of(&grid, frozen_row[1]), layout.canvas_node_for(2, 0));

    let scrolling_row = grid.row_nodes(10).unwrap();
    assert_eq!(parent_of(&grid, scrolling_row[0]), layout.canvas_node_for(0, 10));
    assert_ne!(layout.canvas_node_for(0, 0), layout.canvas_node_for(0, 10));
    assert_ne!(layout.canvas_node_for(0, 10), layout.canvas_node_for(3, 10));

    // Frozen cells hang off the left row node, the rest off the right one.
    let frozen_cell = grid.cell_node(10, 1).unwrap();
    let scrolling_cell = grid.cell_node(10, 3).unwrap();
    assert_eq!(parent_of(&grid, frozen_cell), Some(scrolling_row[0]));
    assert_eq!(parent_of(&grid, scrolling_cell), Some(scrolling_row[1]));
    assert!(grid.backend().has_class(frozen_cell, "frozen"));
    assert!(!grid.backend().has_class(scrolling_cell, "frozen"));
}

#[test]
fn test_row_tops_restart_per_pane() {
    let grid = frozen_grid(100, GridOptions::new().with_frozen_rows(2));
    let top = |row: usize| {
        let node = grid.row_nodes(row).unwrap()[0];
        grid.backend().node(node).unwrap().top
    };
    assert_eq!(top(1), 25.0);
    assert_eq!(top(2), 0.0);
    assert_eq!(top(10), 200.0);
}

#[test]
fn test_frozen_rows_stay_rendered() {
    init_tracing();
    let mut grid = frozen_grid(1_000, GridOptions::new().with_frozen_rows(2));
    assert_eq!(grid.visible_range().top, 2);

    grid.set_scroll_position(10_000.0, 0.0);
    let rendered = grid.rendered_rows();
    assert!(rendered.contains(&0));
    assert!(rendered.contains(&1));
    assert!(!rendered.contains(&2));
    assert_eq!(grid.visible_range().top, 402);
    assert!(rendered.contains(&402));
}

#[test]
fn test_rows_frozen_at_the_bottom() {
    let grid = frozen_grid(100, GridOptions::new().with_frozen_rows(2).with_frozen_bottom(true));
    let layout = grid.layout();

    assert!(layout.is_frozen_row(98));
    assert!(!layout.is_frozen_row(0));
    assert_eq!(layout.scroll_rows(100), 0..98);

    let rendered = grid.rendered_rows();
    assert!(rendered.contains(&98));
    assert!(rendered.contains(&99));
    let node = grid.row_nodes(98).unwrap()[0];
    assert_eq!(grid.backend().node(node).unwrap().top, 0.0);
    assert_ne!(layout.canvas_node_for(0, 98), layout.canvas_node_for(0, 0));
}

#[test]
fn test_frozen_cells_survive_horizontal_scroll() {
    let columns: Vec<Column> = (0..20)
        .map(|i| Column::new(format!("c{i}"), "id").with_width(100.0).with_frozen(i < 2))
        .collect();
    let mut grid = Grid::in_memory()
        .data(tasks(50))
        .columns(columns)
        .options(GridOptions::new().with_column_header(false).with_force_sync_scrolling(true))
        .container_size(600.0, 500.0)
        .build()
        .unwrap();
    assert_eq!(grid.max_scroll_left(), 1400.0);

    grid.set_scroll_position(0.0, 1400.0);
    let mut expected = vec![0, 1];
    expected.extend(12..20);
    assert_eq!(grid.rendered_cells(5), expected);
}

#[test]
fn test_navigation_crosses_pane_boundaries() {
    let mut grid = frozen_grid(100, GridOptions::new().with_frozen_rows(2));

    assert!(grid.set_active_cell(1, 1));
    assert!(grid.navigate(Direction::Right));
    assert_eq!(grid.active_cell().map(|p| (p.row, p.cell)), Some((1, 2)));
    assert!(grid.navigate(Direction::Down));
    assert_eq!(grid.active_cell().map(|p| (p.row, p.cell)), Some((2, 2)));

    let active = grid.cell_node(2, 2).unwrap();
    assert!(grid.backend().has_class(active, "active"));
}

#[test]
fn test_changing_frozen_rows_at_runtime() {
    let mut grid = frozen_grid(100, GridOptions::new().with_frozen_rows(2));

    assert!(grid.set_options(|options| options.frozen_rows = Some(4)).unwrap());
    assert_eq!(grid.layout().frozen_rows(), 4);
    assert!(grid.layout().is_frozen_row(3));

    let refused = grid.set_options(|options| options.frozen_rows = Some(500));
    assert!(matches!(refused, Err(GridError::FrozenRowsOutOfRange { .. })));
    assert_eq!(grid.layout().frozen_rows(), 4);
    assert_eq!(grid.options().frozen_rows, Some(4));
}
