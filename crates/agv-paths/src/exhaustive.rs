//! Exhaustive depth-first enumeration of station-to-station paths.
//!
//! Every simple 8-connected path between two consecutive stations is a
//! candidate segment; full routes are the Cartesian product of the segment
//! candidates. This is exponential and only meant for small floors, where it
//! serves as ground truth for the approximate strategies.

use agv_core::Point;

use crate::bfs;
use crate::cellset::CellSet;
use crate::distance::{chebyshev, manhattan};
use crate::neighbors::{Connectivity, Neighbors};
use crate::stitch;
use crate::traits::Terrain;

/// Segments are enumerated over king moves.
const MOVES: Connectivity = Connectivity::Eight;

/// Enumeration bounds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExhaustiveConfig {
    /// Stop enumerating a segment after this many complete paths.
    pub max_paths_per_segment: usize,
    /// Stop enumerating a segment after this many cell expansions.
    pub max_expansions: usize,
    /// Keep at most this many cross-joined routes.
    pub max_routes: usize,
}

impl Default for ExhaustiveConfig {
    fn default() -> Self {
        Self {
            max_paths_per_segment: 256,
            max_expansions: 500_000,
            max_routes: 20_000,
        }
    }
}

/// One level of the explicit DFS stack: the moves still untried from a cell.
struct Frame {
    options: Vec<Point>,
    next: usize,
}

impl Frame {
    fn next_option(&mut self) -> Option<Point> {
        let p = self.options.get(self.next).copied();
        self.next += 1;
        p
    }
}

/// Depth-first enumeration with an explicit stack.
#[derive(Debug, Clone, Default)]
pub struct ExhaustiveSearch {
    pub config: ExhaustiveConfig,
}

impl ExhaustiveSearch {
    pub fn new(config: ExhaustiveConfig) -> Self {
        Self { config }
    }

    /// All candidate routes visiting `stations` in order.
    ///
    /// For each consecutive pair, every station other than the pair's own
    /// endpoints is forbidden so a segment cannot pass through an unrelated
    /// station. Returns an empty list as soon as one segment has no path.
    pub fn candidates<T: Terrain>(&self, terrain: &T, stations: &[Point]) -> Vec<Vec<Point>> {
        if stations.len() < 2 {
            return Vec::new();
        }

        let mut pools = Vec::with_capacity(stations.len() - 1);
        let mut forbidden = CellSet::new(terrain.bounds());
        for (i, pair) in stations.windows(2).enumerate() {
            let (start, goal) = (pair[0], pair[1]);
            forbidden.clear();
            for &s in stations {
                if s != start && s != goal {
                    forbidden.insert(s);
                }
            }

            let paths = self.segment_paths(terrain, start, goal, &forbidden);
            log::debug!(
                "exhaustive: segment {i} {start} -> {goal}: {} candidate(s)",
                paths.len()
            );
            if paths.is_empty() {
                return Vec::new();
            }
            pools.push(paths);
        }

        if stitch::product_len(&pools) > self.config.max_routes {
            log::warn!(
                "exhaustive: {} combined routes exceed cap {}, truncating",
                stitch::product_len(&pools),
                self.config.max_routes
            );
        }
        stitch::product(&pools, self.config.max_routes)
    }

    /// Every simple path from `start` to `goal` avoiding `forbidden`, up to
    /// the configured bounds. Neighbours closer to the goal are tried first,
    /// so the earliest paths found are short ones.
    ///
    /// A cell is only entered if the goal can still be reached from it
    /// without touching the partial path, so every subtree explored ends in
    /// at least one complete path.
    pub fn segment_paths<T: Terrain>(
        &self,
        terrain: &T,
        start: Point,
        goal: Point,
        forbidden: &CellSet,
    ) -> Vec<Vec<Point>> {
        if !bfs::reachable(terrain, start, goal, MOVES, forbidden) {
            return Vec::new();
        }
        if start == goal {
            return vec![vec![start]];
        }

        let mut found = Vec::new();
        let mut on_path = CellSet::new(terrain.bounds());
        let mut path = vec![start];
        let mut nb = Neighbors::new();
        let mut expansions = 0usize;
        on_path.insert(start);

        let options_from = |p: Point, nb: &mut Neighbors, on_path: &CellSet| {
            let mut opts = nb
                .of(MOVES, p, |n| {
                    terrain.passable(n) && !forbidden.contains(n) && !on_path.contains(n)
                })
                .to_vec();
            opts.sort_by_key(|&n| (chebyshev(n, goal), manhattan(n, goal)));
            Frame {
                options: opts,
                next: 0,
            }
        };

        let mut stack = vec![options_from(start, &mut nb, &on_path)];
        while let Some(top) = stack.len().checked_sub(1) {
            let Some(n) = stack[top].next_option() else {
                stack.pop();
                if let Some(p) = path.pop() {
                    on_path.remove(p);
                }
                continue;
            };
            if on_path.contains(n) {
                continue;
            }

            expansions += 1;
            if expansions > self.config.max_expansions {
                log::warn!(
                    "exhaustive: expansion budget {} spent on {start} -> {goal}",
                    self.config.max_expansions
                );
                break;
            }

            if n == goal {
                let mut complete = path.clone();
                complete.push(n);
                found.push(complete);
                if found.len() >= self.config.max_paths_per_segment {
                    break;
                }
                continue;
            }

            path.push(n);
            on_path.insert(n);
            let live = bfs::steps_avoiding(terrain, n, goal, MOVES, |c| {
                forbidden.contains(c) || on_path.contains(c)
            })
            .is_some();
            if !live {
                path.pop();
                on_path.remove(n);
                continue;
            }
            stack.push(options_from(n, &mut nb, &on_path));
        }
        found
    }
}
