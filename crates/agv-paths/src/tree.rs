//! Sampling-based tree search (RRT*) between stations.
//!
//! The tree grows over cell centres: each iteration samples a target, steers
//! a fixed step from the nearest node towards it, attaches the new node to
//! the cheapest collision-free parent within a radius, then rewires nearby
//! nodes through it. Tree edges are rasterized with [`line_cells`], so the
//! returned paths are 4-connected cell sequences.

use std::collections::HashMap;

use agv_core::Point;
use rand::rngs::StdRng;
use rand::{Rng, RngExt, SeedableRng};

use crate::cellset::CellSet;
use crate::distance::euclidean;
use crate::line::line_cells;
use crate::stitch;
use crate::traits::Terrain;

/// Tunables for [`TreeSearch`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeConfig {
    /// Independent trees grown per segment.
    pub variations: usize,
    /// Sampling iterations per tree.
    pub iterations: usize,
    /// Probability of sampling the goal instead of a random free cell.
    pub goal_bias: f64,
    /// Steering distance.
    pub step: f64,
    /// Parent-choice and rewiring radius.
    pub radius: f64,
    /// The goal is connected once within `connect_factor × step`.
    pub connect_factor: f64,
    /// Cap on stitched routes.
    pub stitch_cap: usize,
    /// Parent walks longer than this abort reconstruction.
    pub reconstruction_limit: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            variations: 6,
            iterations: 1500,
            goal_bias: 0.15,
            step: 3.0,
            radius: 5.0,
            connect_factor: 1.5,
            stitch_cap: 100,
            reconstruction_limit: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    pos: Point,
    parent: usize,
    cost: f64,
}

const ROOT: usize = usize::MAX;

/// RRT* path search.
#[derive(Debug, Clone, Default)]
pub struct TreeSearch {
    pub config: TreeConfig,
}

/// Read-only context shared by every tree grown for one segment.
struct Segment<'a, T> {
    terrain: &'a T,
    occupied: &'a CellSet,
    goal: Point,
    free: &'a [Point],
}

impl<T: Terrain> Segment<'_, T> {
    /// Whether the rasterized line from `a` to `b` stays on passable,
    /// unoccupied cells (the goal is always allowed).
    fn clear(&self, a: Point, b: Point) -> bool {
        line_cells(a, b).into_iter().all(|c| {
            self.terrain.passable(c) && (c == self.goal || !self.occupied.contains(c))
        })
    }
}

impl TreeSearch {
    pub fn new(config: TreeConfig) -> Self {
        Self { config }
    }

    /// Grow one tree from `start` towards `goal`. `None` when the goal was not
    /// connected within the iteration budget or reconstruction aborted.
    pub fn grow<T: Terrain, R: Rng>(
        &self,
        terrain: &T,
        start: Point,
        goal: Point,
        occupied: &CellSet,
        rng: &mut R,
    ) -> Option<Vec<Point>> {
        let free = free_cells(terrain, occupied);
        let seg = Segment {
            terrain,
            occupied,
            goal,
            free: &free,
        };
        self.grow_in(&seg, start, rng)
    }

    fn grow_in<T: Terrain, R: Rng>(
        &self,
        seg: &Segment<'_, T>,
        start: Point,
        rng: &mut R,
    ) -> Option<Vec<Point>> {
        let goal = seg.goal;
        if !seg.terrain.passable(start) || !seg.terrain.passable(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }
        if seg.free.is_empty() {
            return None;
        }

        let mut nodes = vec![Node {
            pos: start,
            parent: ROOT,
            cost: 0.0,
        }];
        let mut in_tree = CellSet::new(seg.terrain.bounds());
        in_tree.insert(start);
        let connect_dist = self.config.connect_factor * self.config.step;
        let mut reached = None;

        for _ in 0..self.config.iterations {
            let target = if rng.random_bool(self.config.goal_bias.clamp(0.0, 1.0)) {
                goal
            } else {
                seg.free[rng.random_range(0..seg.free.len())]
            };

            let Some(nearest) = nearest(&nodes, target) else {
                break;
            };
            let from = nodes[nearest].pos;
            let new_pos = steer(from, target, self.config.step);
            if new_pos == from || in_tree.contains(new_pos) || !seg.clear(from, new_pos) {
                continue;
            }

            // Cheapest collision-free parent in the neighbourhood.
            let near: Vec<usize> = nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| euclidean(n.pos, new_pos) <= self.config.radius)
                .map(|(i, _)| i)
                .collect();
            let mut parent = nearest;
            let mut cost = nodes[nearest].cost + euclidean(from, new_pos);
            for &i in &near {
                let c = nodes[i].cost + euclidean(nodes[i].pos, new_pos);
                if c < cost && seg.clear(nodes[i].pos, new_pos) {
                    parent = i;
                    cost = c;
                }
            }

            let new_idx = nodes.len();
            nodes.push(Node {
                pos: new_pos,
                parent,
                cost,
            });
            in_tree.insert(new_pos);

            // Rewire neighbours that become cheaper through the new node.
            for &i in &near {
                if i == parent {
                    continue;
                }
                let c = cost + euclidean(new_pos, nodes[i].pos);
                if c < nodes[i].cost && seg.clear(new_pos, nodes[i].pos) {
                    nodes[i].parent = new_idx;
                    nodes[i].cost = c;
                }
            }

            if new_pos == goal {
                reached = Some(new_idx);
                break;
            }
            if euclidean(new_pos, goal) <= connect_dist && seg.clear(new_pos, goal) {
                nodes.push(Node {
                    pos: goal,
                    parent: new_idx,
                    cost: cost + euclidean(new_pos, goal),
                });
                reached = Some(nodes.len() - 1);
                break;
            }
        }

        let tip = reached?;
        let waypoints = self.reconstruct(&nodes, tip)?;
        Some(densify(&waypoints))
    }

    /// Walk parent pointers back to the root.
    fn reconstruct(&self, nodes: &[Node], tip: usize) -> Option<Vec<Point>> {
        let mut waypoints = Vec::new();
        let mut idx = tip;
        let mut steps = 0usize;
        while idx != ROOT {
            steps += 1;
            if steps > self.config.reconstruction_limit {
                log::warn!(
                    "tree: reconstruction exceeded {} steps, dropping path",
                    self.config.reconstruction_limit
                );
                return None;
            }
            let node = &nodes[idx];
            if node.parent == idx {
                log::warn!("tree: self-loop at {}, dropping path", node.pos);
                return None;
            }
            waypoints.push(node.pos);
            idx = node.parent;
        }
        waypoints.reverse();
        Some(waypoints)
    }

    /// Paths for one segment from `variations` independently seeded trees.
    pub fn segment_pool<T: Terrain, R: Rng>(
        &self,
        terrain: &T,
        start: Point,
        goal: Point,
        occupied: &CellSet,
        rng: &mut R,
    ) -> Vec<Vec<Point>> {
        let free = free_cells(terrain, occupied);
        let seg = Segment {
            terrain,
            occupied,
            goal,
            free: &free,
        };
        let mut pool: Vec<Vec<Point>> = Vec::new();
        for v in 0..self.config.variations {
            let mut child = StdRng::seed_from_u64(rng.random());
            match self.grow_in(&seg, start, &mut child) {
                Some(path) if !pool.contains(&path) => pool.push(path),
                Some(_) => {}
                None => log::debug!("tree: variation {v} missed {start} -> {goal}"),
            }
        }
        pool
    }

    /// Segment pools for every consecutive station pair, stitched by capped
    /// Cartesian product.
    pub fn seeds<T: Terrain, R: Rng>(
        &self,
        terrain: &T,
        stations: &[Point],
        rng: &mut R,
    ) -> Vec<Vec<Point>> {
        let free = CellSet::new(terrain.bounds());
        let mut pools = Vec::with_capacity(stations.len().saturating_sub(1));
        for pair in stations.windows(2) {
            let pool = self.segment_pool(terrain, pair[0], pair[1], &free, rng);
            if pool.is_empty() {
                return Vec::new();
            }
            pools.push(pool);
        }
        let routes = stitch::sample_product(&pools, self.config.stitch_cap, rng);
        log::debug!("tree: {} seed route(s)", routes.len());
        routes
    }
}

fn free_cells<T: Terrain>(terrain: &T, occupied: &CellSet) -> Vec<Point> {
    terrain
        .bounds()
        .iter()
        .filter(|&p| terrain.passable(p) && !occupied.contains(p))
        .collect()
}

fn nearest(nodes: &[Node], target: Point) -> Option<usize> {
    nodes
        .iter()
        .enumerate()
        .min_by(|a, b| {
            euclidean(a.1.pos, target).total_cmp(&euclidean(b.1.pos, target))
        })
        .map(|(i, _)| i)
}

/// Move at most `step` from `from` towards `to`, snapped to the nearest cell.
fn steer(from: Point, to: Point, step: f64) -> Point {
    let d = euclidean(from, to);
    if d <= step {
        return to;
    }
    let t = step / d;
    let row = f64::from(from.row) + f64::from(to.row - from.row) * t;
    let col = f64::from(from.col) + f64::from(to.col - from.col) * t;
    Point::new(row.round() as i32, col.round() as i32)
}

/// Expand tree waypoints into a 4-connected cell path, cutting any loops the
/// rasterized edges introduce.
fn densify(waypoints: &[Point]) -> Vec<Point> {
    let mut path: Vec<Point> = Vec::new();
    let mut index: HashMap<Point, usize> = HashMap::new();
    for (i, pair) in waypoints.windows(2).enumerate() {
        let cells = line_cells(pair[0], pair[1]);
        let skip = usize::from(i > 0);
        for &c in &cells[skip..] {
            if let Some(&at) = index.get(&c) {
                for dropped in path.drain(at + 1..) {
                    index.remove(&dropped);
                }
                continue;
            }
            index.insert(c, path.len());
            path.push(c);
        }
    }
    if path.is_empty() {
        path.extend(waypoints.first().copied());
    }
    path
}
