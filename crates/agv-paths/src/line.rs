//! Rasterizing straight connections between two cells.

use agv_core::Point;

/// Cells of a 4-connected digital line from `a` to `b`, both included.
///
/// At every step the walk moves along whichever axis keeps it closest to the
/// ideal segment, so consecutive cells always differ by one axis-aligned
/// unit step.
pub fn line_cells(a: Point, b: Point) -> Vec<Point> {
    let d = b - a;
    let step = d.signum();
    let (dr, dc) = (i64::from(d.row.abs()), i64::from(d.col.abs()));
    let mut cells = Vec::with_capacity((dr + dc + 1) as usize);
    let mut cur = a;
    let (mut ir, mut ic) = (0i64, 0i64);
    cells.push(cur);
    while ir < dr || ic < dc {
        // Compare the parametric positions of the next row and column
        // crossings: (ir + 0.5) / dr against (ic + 0.5) / dc.
        let row_first = ic >= dc || (ir < dr && (1 + 2 * ir) * dc < (1 + 2 * ic) * dr);
        if row_first {
            cur.row += step.row;
            ir += 1;
        } else {
            cur.col += step.col;
            ic += 1;
        }
        cells.push(cur);
    }
    cells
}

/// Cells of an L-shaped path from `a` to `b`, both included: a full move
/// along one axis, then the other. `rows_first` picks the vertical leg first.
pub fn axis_path(a: Point, b: Point, rows_first: bool) -> Vec<Point> {
    let d = b - a;
    let step = d.signum();
    let mut cells = Vec::with_capacity((d.row.abs() + d.col.abs() + 1) as usize);
    let mut cur = a;
    cells.push(cur);
    let walk_rows = |cur: &mut Point, cells: &mut Vec<Point>| {
        while cur.row != b.row {
            cur.row += step.row;
            cells.push(*cur);
        }
    };
    let walk_cols = |cur: &mut Point, cells: &mut Vec<Point>| {
        while cur.col != b.col {
            cur.col += step.col;
            cells.push(*cur);
        }
    };
    if rows_first {
        walk_rows(&mut cur, &mut cells);
        walk_cols(&mut cur, &mut cells);
    } else {
        walk_cols(&mut cur, &mut cells);
        walk_rows(&mut cur, &mut cells);
    }
    cells
}
