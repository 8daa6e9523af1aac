use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use agv_core::Point;

use crate::cellset::CellSet;
use crate::neighbors::{Connectivity, Neighbors};
use crate::traits::Terrain;

/// Breadth-first reachability test.
///
/// Returns the number of steps from `from` to `to` over passable cells not
/// in `blocked`, or `None` if `to` cannot be reached. `to` itself may be
/// blocked; `from` must be passable.
pub fn steps_between<T: Terrain>(
    terrain: &T,
    from: Point,
    to: Point,
    conn: Connectivity,
    blocked: &CellSet,
) -> Option<usize> {
    steps_avoiding(terrain, from, to, conn, |p| blocked.contains(p))
}

/// [`steps_between`] with the blocked cells given as a predicate, so callers
/// can combine several sets without copying them.
pub fn steps_avoiding<T: Terrain>(
    terrain: &T,
    from: Point,
    to: Point,
    conn: Connectivity,
    is_blocked: impl Fn(Point) -> bool,
) -> Option<usize> {
    if !terrain.passable(from) || !terrain.passable(to) {
        return None;
    }
    if from == to {
        return Some(0);
    }

    let mut seen = CellSet::new(terrain.bounds());
    let mut queue: VecDeque<(Point, usize)> = VecDeque::new();
    let mut nb = Neighbors::new();
    seen.insert(from);
    queue.push_back((from, 0));

    while let Some((cp, dist)) = queue.pop_front() {
        let next = nb.of(conn, cp, |n| {
            terrain.passable(n) && (n == to || !is_blocked(n))
        });
        for &np in next {
            if np == to {
                return Some(dist + 1);
            }
            if seen.insert(np) {
                queue.push_back((np, dist + 1));
            }
        }
    }
    None
}

/// Whether `to` can be reached from `from`. See [`steps_between`].
#[inline]
pub fn reachable<T: Terrain>(
    terrain: &T,
    from: Point,
    to: Point,
    conn: Connectivity,
    blocked: &CellSet,
) -> bool {
    steps_between(terrain, from, to, conn, blocked).is_some()
}

/// A shortest path from `from` to `to` over passable cells, both ends
/// included.
pub fn shortest_path<T: Terrain>(
    terrain: &T,
    from: Point,
    to: Point,
    conn: Connectivity,
) -> Option<Vec<Point>> {
    if !terrain.passable(from) || !terrain.passable(to) {
        return None;
    }

    let mut parent: HashMap<Point, Point> = HashMap::new();
    let mut queue = VecDeque::from([from]);
    let mut nb = Neighbors::new();
    parent.insert(from, from);

    while let Some(cp) = queue.pop_front() {
        if cp == to {
            let mut path = vec![to];
            let mut cur = to;
            while cur != from {
                cur = parent[&cur];
                path.push(cur);
            }
            path.reverse();
            return Some(path);
        }
        for &np in nb.of(conn, cp, |n| terrain.passable(n)) {
            if let Entry::Vacant(e) = parent.entry(np) {
                e.insert(cp);
                queue.push_back(np);
            }
        }
    }
    None
}
