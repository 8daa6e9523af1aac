//! Route post-processing: waypoint reduction and axis-aligned re-expansion.

use std::collections::HashSet;

use agv_core::{GridMap, Point};
use agv_paths::{Connectivity, axis_path, line_cells, shortest_path};

/// Reduce `route` to sparse waypoints, then expand every consecutive pair
/// into an L-shaped, 4-connected path. Routes shorter than three cells are
/// returned unchanged.
pub fn smooth(route: &[Point], map: &GridMap) -> Vec<Point> {
    if route.len() < 3 {
        return route.to_vec();
    }
    let sparse = waypoints(route, map);
    expand(&sparse, map)
}

/// Sparse waypoints of `route`.
///
/// A run grows from the last kept waypoint while every step keeps the same
/// direction, the straight line back to the waypoint stays off obstacles and
/// one of the two L-shaped legs to the waypoint is clear. When a step breaks
/// the run, the previous cell closes it. Stations of the map's visiting order
/// are always kept.
pub fn waypoints(route: &[Point], map: &GridMap) -> Vec<Point> {
    let Some(&first) = route.first() else {
        return Vec::new();
    };
    let stations: HashSet<Point> = map.stations().iter().copied().collect();
    let mut sparse = vec![first];
    let mut anchor = first;
    let mut dir: Option<Point> = None;

    for w in route.windows(2) {
        let (prev, p) = (w[0], w[1]);
        let step = (p - prev).signum();
        let extends = dir.is_none_or(|d| d == step)
            && clear(&line_cells(anchor, p), map)
            && (clear(&axis_path(anchor, p, true), map)
                || clear(&axis_path(anchor, p, false), map));
        if !extends {
            keep(prev, &mut sparse);
            anchor = prev;
        }
        if !extends || dir.is_none() {
            dir = Some(step);
        }
        if stations.contains(&p) {
            keep(p, &mut sparse);
            anchor = p;
            dir = None;
        }
    }
    if let Some(&last) = route.last() {
        keep(last, &mut sparse);
    }
    sparse
}

fn clear(cells: &[Point], map: &GridMap) -> bool {
    cells.iter().all(|&c| map.is_passable(c))
}

fn keep(p: Point, sparse: &mut Vec<Point>) {
    if sparse.last() != Some(&p) {
        sparse.push(p);
    }
}

/// Expand sparse waypoints into a dense path, moving along rows first unless
/// that leg crosses an obstacle and the columns-first leg does not.
///
/// A pair with both legs blocked (a diagonal squeeze between two obstacles)
/// is joined by the shortest 4-connected detour, or kept as the raw step if
/// no detour exists. The result never enters an obstacle.
pub fn expand(sparse: &[Point], map: &GridMap) -> Vec<Point> {
    let mut route: Vec<Point> = sparse.first().copied().into_iter().collect();
    for pair in sparse.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let rows_first = axis_path(a, b, true);
        let leg = if clear(&rows_first, map) {
            rows_first
        } else {
            let cols_first = axis_path(a, b, false);
            if clear(&cols_first, map) {
                cols_first
            } else {
                log::debug!("smooth: both legs of {a} -> {b} blocked, detouring");
                shortest_path(map, a, b, Connectivity::Four).unwrap_or_else(|| vec![a, b])
            }
        };
        route.extend_from_slice(&leg[1..]);
    }
    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ascii_map, is_walkable, open_map};

    fn p(r: i32, c: i32) -> Point {
        Point::new(r, c)
    }

    #[test]
    fn short_routes_pass_through() {
        let map = open_map(3, 3, vec![p(0, 0), p(0, 1)]);
        assert_eq!(smooth(&[p(0, 0), p(0, 1)], &map), vec![p(0, 0), p(0, 1)]);
        assert!(smooth(&[], &map).is_empty());
    }

    #[test]
    fn diagonal_becomes_l_shape() {
        let map = open_map(6, 6, vec![p(5, 0), p(0, 5)]);
        let raw: Vec<Point> = (0..6).map(|i| p(5 - i, i)).collect();
        assert_eq!(waypoints(&raw, &map), vec![p(5, 0), p(0, 5)]);
        let out = smooth(&raw, &map);
        assert_eq!(out.len(), 11);
        assert_eq!(out[5], p(0, 0));
        assert!(out.windows(2).all(|w| w[0].is_adjacent_4(w[1])));
    }

    #[test]
    fn axis_aligned_route_is_fixed_point() {
        let map = open_map(5, 5, vec![p(0, 0), p(4, 4)]);
        let route = vec![p(0, 0), p(0, 1), p(0, 2), p(1, 2), p(2, 2), p(2, 3), p(2, 4), p(3, 4), p(4, 4)];
        let once = smooth(&route, &map);
        assert_eq!(once, route);
        assert_eq!(smooth(&once, &map), once);
    }

    #[test]
    fn smoothing_is_idempotent() {
        let map = open_map(6, 6, vec![p(5, 0), p(0, 5)]);
        let raw = vec![p(5, 0), p(4, 1), p(4, 2), p(3, 3), p(2, 3), p(1, 4), p(0, 5)];
        let once = smooth(&raw, &map);
        assert_eq!(smooth(&once, &map), once);
    }

    #[test]
    fn stations_are_kept() {
        let map = open_map(3, 5, vec![p(0, 0), p(0, 2), p(0, 4)]);
        let route: Vec<Point> = (0..5).map(|c| p(0, c)).collect();
        assert_eq!(waypoints(&route, &map), vec![p(0, 0), p(0, 2), p(0, 4)]);
        assert_eq!(smooth(&route, &map), route);
    }

    #[test]
    fn obstacles_close_runs_and_pick_the_clear_leg() {
        let map = ascii_map(&["...", ".#.", "..."], vec![p(2, 0), p(0, 2)]);
        // The diagonal step beside the pillar expands through the free corner.
        let raw = vec![p(2, 0), p(1, 0), p(0, 1), p(0, 2)];
        let out = smooth(&raw, &map);
        assert!(out.iter().all(|&c| map.is_passable(c)));
        assert_eq!(out.first(), Some(&p(2, 0)));
        assert_eq!(out.last(), Some(&p(0, 2)));
    }

    #[test]
    fn runs_close_before_both_legs_are_blocked() {
        // The straight line from (2, 0) to (0, 2) is clear but both L legs
        // hit a corner obstacle.
        let map = ascii_map(&["#..", "...", "..#"], vec![p(2, 0), p(0, 2)]);
        let raw = vec![p(2, 0), p(1, 1), p(0, 2)];
        assert_eq!(waypoints(&raw, &map), raw);
        let out = smooth(&raw, &map);
        assert_eq!(out, vec![p(2, 0), p(1, 0), p(1, 1), p(0, 1), p(0, 2)]);
        assert!(is_walkable(&map, &out, false));
    }

    #[test]
    fn squeezed_diagonal_is_detoured() {
        let map = ascii_map(&["...", ".#.", "#.."], vec![p(1, 0), p(2, 1)]);
        let out = expand(&[p(1, 0), p(2, 1)], &map);
        assert!(out.iter().all(|&c| map.is_passable(c)));
        assert_eq!(out.first(), Some(&p(1, 0)));
        assert_eq!(out.last(), Some(&p(2, 1)));
        assert!(out.windows(2).all(|w| w[0].is_adjacent_4(w[1])));
    }
}
