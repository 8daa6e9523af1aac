//! Map fixtures shared by the search tests.

use agv_core::{Category, GridMap, PathPoint, Point};

/// Build a map from rows of `.` (path), `#` (obstacle) and `S` (station).
/// Physical size equals the cell count, so one cell is one unit long.
pub(crate) fn ascii_map(rows: &[&str]) -> GridMap {
    let mut points = Vec::new();
    for (r, line) in rows.iter().enumerate() {
        for (c, ch) in line.chars().enumerate() {
            let category = match ch {
                '#' => Category::Obstacle,
                'S' => Category::Station,
                _ => continue,
            };
            points.push(PathPoint::new(Point::new(r as i32, c as i32)).with_category(category));
        }
    }
    let n_rows = rows.len() as i32;
    let n_cols = rows[0].len() as i32;
    let stations = vec![Point::new(0, 0), Point::new(n_rows - 1, n_cols - 1)];
    GridMap::new(n_rows, n_cols, f64::from(n_cols), f64::from(n_rows), points, stations)
        .expect("fixture map is valid")
}

/// Whether `route` steps between adjacent passable cells only.
pub(crate) fn is_walkable(map: &GridMap, route: &[Point], diagonal: bool) -> bool {
    route.iter().all(|&p| map.is_passable(p))
        && route.windows(2).all(|w| {
            if diagonal {
                w[0].is_adjacent_8(w[1])
            } else {
                w[0].is_adjacent_4(w[1])
            }
        })
}
