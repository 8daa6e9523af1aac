//! Map fixtures shared by the planner tests.

use agv_core::{Category, GridMap, PathPoint, Point};

/// An obstacle-free map whose physical size equals its cell count.
pub(crate) fn open_map(rows: i32, cols: i32, stations: Vec<Point>) -> GridMap {
    GridMap::new(
        rows,
        cols,
        f64::from(cols),
        f64::from(rows),
        Vec::<PathPoint>::new(),
        stations,
    )
    .expect("fixture map is valid")
}

/// Build a map from rows of `.` (path) and `#` (obstacle). Station cells
/// get [`Category::Station`].
pub(crate) fn ascii_map(rows: &[&str], stations: Vec<Point>) -> GridMap {
    let mut points = Vec::new();
    for (r, line) in rows.iter().enumerate() {
        for (c, ch) in line.chars().enumerate() {
            if ch == '#' {
                let p = Point::new(r as i32, c as i32);
                points.push(PathPoint::new(p).with_category(Category::Obstacle));
            }
        }
    }
    points.extend(
        stations
            .iter()
            .map(|&s| PathPoint::new(s).with_category(Category::Station)),
    );
    let n_rows = rows.len() as i32;
    let n_cols = rows[0].len() as i32;
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

/// Whether `route` visits `stations` in order and ends on the last one.
pub(crate) fn visits_in_order(route: &[Point], stations: &[Point]) -> bool {
    let mut k = 0;
    for p in route {
        if k < stations.len() && *p == stations[k] {
            k += 1;
        }
    }
    k == stations.len() && route.last() == stations.last()
}
