//! Weighted, perturbed best-first search run under several configurations.
//!
//! A single A*-style search returns one path. To seed population-based
//! refinement we want a *diverse* pool instead, so the search here:
//!
//! - keeps partial paths (not just cells) in the open list, so a cell can be
//!   reached along several distinct paths;
//! - inflates the Manhattan heuristic by a per-configuration weight and adds
//!   bounded random noise to every priority;
//! - accepts up to a few goal-reaching paths per configuration, pruning any
//!   partial path costing more than a multiple of the best one found.
//!
//! Pools from all configurations are merged, subsampled, and stitched across
//! station pairs either independently ([`HeuristicSearch::pairwise`]) or with
//! earlier segments blocking later ones ([`HeuristicSearch::sequential`]).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use agv_core::Point;
use rand::seq::SliceRandom;
use rand::{Rng, RngExt};

use crate::cellset::CellSet;
use crate::distance::manhattan;
use crate::neighbors::{Connectivity, Neighbors};
use crate::stitch;
use crate::traits::Terrain;

/// Segments are searched with rook moves so they smooth without detours.
const MOVES: Connectivity = Connectivity::Four;

/// Tunables for [`HeuristicSearch`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HeuristicConfig {
    /// Heuristic weight of each configuration.
    pub weights: Vec<f64>,
    /// Perturbation bound as a fraction of the weight.
    pub perturbation_scale: f64,
    /// Goal-reaching paths accepted per configuration.
    pub solutions_per_config: usize,
    /// Partial paths costing more than `prune_factor × best` are dropped.
    pub prune_factor: f64,
    /// Segment pools are subsampled down to this size.
    pub pool_target: usize,
    /// Cap on stitched routes per stitching strategy.
    pub stitch_cap: usize,
    /// Open-list pops allowed per configuration run.
    pub max_expansions: usize,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            weights: vec![1.0, 1.35, 1.8, 2.5, 3.5],
            perturbation_scale: 0.25,
            solutions_per_config: 3,
            prune_factor: 2.5,
            pool_target: 8,
            stitch_cap: 200,
            max_expansions: 4_000,
        }
    }
}

/// One weight/perturbation pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weighting {
    pub weight: f64,
    pub perturbation: f64,
}

impl HeuristicConfig {
    /// The configurations a segment search runs under.
    pub fn weightings(&self) -> impl Iterator<Item = Weighting> + '_ {
        self.weights.iter().map(|&weight| Weighting {
            weight,
            perturbation: weight * self.perturbation_scale,
        })
    }
}

/// A partial path, stored as a parent-linked trail in an arena.
struct Trail {
    pos: Point,
    parent: usize,
    cost: u32,
}

const ROOT: usize = usize::MAX;

/// Open-list entry ordered by priority, smallest first.
struct Entry {
    priority: f64,
    trail: usize,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse so BinaryHeap (max-heap) pops smallest priority first.
        other
            .priority
            .total_cmp(&self.priority)
            .then(other.trail.cmp(&self.trail))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Multi-configuration best-first search.
#[derive(Debug, Clone, Default)]
pub struct HeuristicSearch {
    pub config: HeuristicConfig,
}

impl HeuristicSearch {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    /// Run one configuration from `start` to `goal` with 4-directional
    /// moves, never entering a cell of `occupied` other than `goal`.
    ///
    /// Returns up to `solutions_per_config` distinct paths, both endpoints
    /// included, in the order they were found.
    pub fn search<T: Terrain, R: Rng>(
        &self,
        terrain: &T,
        start: Point,
        goal: Point,
        weighting: Weighting,
        occupied: &CellSet,
        rng: &mut R,
    ) -> Vec<Vec<Point>> {
        let max_solutions = self.config.solutions_per_config.max(1);
        if !terrain.passable(start) || !terrain.passable(goal) {
            return Vec::new();
        }
        if start == goal {
            return vec![vec![start]];
        }

        let bounds = terrain.bounds();
        // How often each cell has been expanded; capping this at the
        // solution count keeps the trail arena from exploding.
        let mut expanded = vec![0usize; bounds.len()];
        let mut trails = vec![Trail {
            pos: start,
            parent: ROOT,
            cost: 0,
        }];
        let mut open = BinaryHeap::new();
        open.push(Entry {
            priority: 0.0,
            trail: 0,
        });

        let mut nb = Neighbors::new();
        let mut solutions = Vec::new();
        let mut best: Option<u32> = None;
        let mut pops = 0usize;

        while let Some(Entry { trail, .. }) = open.pop() {
            pops += 1;
            if pops > self.config.max_expansions {
                log::debug!("heuristic: expansion budget spent on {start} -> {goal}");
                break;
            }

            let (pos, cost) = (trails[trail].pos, trails[trail].cost);
            if best.is_some_and(|b| f64::from(cost) > self.config.prune_factor * f64::from(b)) {
                continue;
            }

            if pos == goal {
                solutions.push(reconstruct(&trails, trail));
                best = Some(best.map_or(cost, |b| b.min(cost)));
                if solutions.len() >= max_solutions {
                    break;
                }
                continue;
            }

            let Some(ci) = bounds.index(pos) else {
                continue;
            };
            if expanded[ci] >= max_solutions {
                continue;
            }
            expanded[ci] += 1;

            let next = nb.of(MOVES, pos, |n| {
                terrain.passable(n) && (n == goal || !occupied.contains(n))
            });
            for &np in next {
                if on_trail(&trails, trail, np) {
                    continue;
                }
                let g = cost + 1;
                let h = f64::from(manhattan(np, goal));
                let noise = if weighting.perturbation > 0.0 {
                    rng.random_range(0.0..weighting.perturbation)
                } else {
                    0.0
                };
                trails.push(Trail {
                    pos: np,
                    parent: trail,
                    cost: g,
                });
                open.push(Entry {
                    priority: f64::from(g) + weighting.weight * h + noise,
                    trail: trails.len() - 1,
                });
            }
        }
        solutions
    }

    /// A single path from `start` to `goal` under a randomly chosen
    /// configuration, or `None` if that run finds nothing.
    pub fn point_to_point<T: Terrain, R: Rng>(
        &self,
        terrain: &T,
        start: Point,
        goal: Point,
        occupied: &CellSet,
        rng: &mut R,
    ) -> Option<Vec<Point>> {
        let weightings: Vec<Weighting> = self.config.weightings().collect();
        if weightings.is_empty() {
            return None;
        }
        let w = weightings[rng.random_range(0..weightings.len())];
        let single = Self::new(HeuristicConfig {
            solutions_per_config: 1,
            ..self.config.clone()
        });
        single
            .search(terrain, start, goal, w, occupied, rng)
            .into_iter()
            .next()
    }

    /// Pooled paths for one segment across every configuration, deduplicated
    /// and uniformly subsampled (without replacement) to `pool_target`.
    pub fn segment_pool<T: Terrain, R: Rng>(
        &self,
        terrain: &T,
        start: Point,
        goal: Point,
        occupied: &CellSet,
        rng: &mut R,
    ) -> Vec<Vec<Point>> {
        let mut seen = HashSet::new();
        let mut pool = Vec::new();
        for w in self.config.weightings() {
            for path in self.search(terrain, start, goal, w, occupied, rng) {
                if seen.insert(path.clone()) {
                    pool.push(path);
                }
            }
        }
        if pool.len() > self.config.pool_target {
            pool.shuffle(rng);
            pool.truncate(self.config.pool_target);
        }
        pool
    }

    /// Segment pools searched independently of one another, stitched by
    /// capped Cartesian product. Segments may overlap each other.
    pub fn pairwise<T: Terrain, R: Rng>(
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
                log::debug!("heuristic: no path {} -> {}", pair[0], pair[1]);
                return Vec::new();
            }
            pools.push(pool);
        }
        stitch::sample_product(&pools, self.config.stitch_cap, rng)
    }

    /// Routes grown one segment at a time, where every later segment treats
    /// the non-station cells already used by the partial route as occupied.
    pub fn sequential<T: Terrain, R: Rng>(
        &self,
        terrain: &T,
        stations: &[Point],
        rng: &mut R,
    ) -> Vec<Vec<Point>> {
        let Some(&first) = stations.first() else {
            return Vec::new();
        };
        let station_set: HashSet<Point> = stations.iter().copied().collect();
        let mut partials = vec![vec![first]];
        let mut occupied = CellSet::new(terrain.bounds());

        for pair in stations.windows(2) {
            let mut grown = Vec::new();
            for partial in &partials {
                occupied.clear();
                for &p in partial {
                    if !station_set.contains(&p) {
                        occupied.insert(p);
                    }
                }
                for seg in self.segment_pool(terrain, pair[0], pair[1], &occupied, rng) {
                    grown.push(stitch::join(&[partial.as_slice(), seg.as_slice()]));
                }
            }
            if grown.len() > self.config.stitch_cap {
                grown.shuffle(rng);
                grown.truncate(self.config.stitch_cap);
            }
            if grown.is_empty() {
                log::debug!("heuristic: sequential stitching stuck at {} -> {}", pair[0], pair[1]);
                return Vec::new();
            }
            partials = grown;
        }
        partials
    }

    /// Union of the pairwise and sequential stitchings.
    pub fn seeds<T: Terrain, R: Rng>(
        &self,
        terrain: &T,
        stations: &[Point],
        rng: &mut R,
    ) -> Vec<Vec<Point>> {
        let mut routes = self.pairwise(terrain, stations, rng);
        routes.extend(self.sequential(terrain, stations, rng));
        let mut seen = HashSet::new();
        routes.retain(|r| seen.insert(r.clone()));
        log::debug!("heuristic: {} seed route(s)", routes.len());
        routes
    }
}

fn on_trail(trails: &[Trail], mut idx: usize, p: Point) -> bool {
    while idx != ROOT {
        if trails[idx].pos == p {
            return true;
        }
        idx = trails[idx].parent;
    }
    false
}

fn reconstruct(trails: &[Trail], mut idx: usize) -> Vec<Point> {
    let mut path = Vec::new();
    while idx != ROOT {
        path.push(trails[idx].pos);
        idx = trails[idx].parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ascii_map, is_walkable};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn open_map() -> agv_core::GridMap {
        ascii_map(&["......", "......", "......", "......", "......", "......"])
    }

    #[test]
    fn weightings_scale_perturbation() {
        let cfg = HeuristicConfig::default();
        let ws: Vec<_> = cfg.weightings().collect();
        assert_eq!(ws.len(), 5);
        assert_eq!(ws[0].weight, 1.0);
        assert_eq!(ws[4].weight, 3.5);
        assert!(ws.windows(2).all(|w| w[0].perturbation < w[1].perturbation));
    }

    #[test]
    fn search_returns_distinct_walkable_paths() {
        let m = open_map();
        let mut rng = StdRng::seed_from_u64(1);
        let hs = HeuristicSearch::default();
        let w = Weighting {
            weight: 1.0,
            perturbation: 0.25,
        };
        let from = Point::new(5, 0);
        let to = Point::new(0, 5);
        let paths = hs.search(&m, from, to, w, &CellSet::new(m.bounds()), &mut rng);
        assert!(!paths.is_empty() && paths.len() <= 3);
        let distinct: HashSet<_> = paths.iter().collect();
        assert_eq!(distinct.len(), paths.len());
        for p in &paths {
            assert_eq!(p.first(), Some(&from));
            assert_eq!(p.last(), Some(&to));
            assert!(is_walkable(&m, p, false));
        }
        // The first accepted path is optimal for an unperturbed-enough search.
        assert_eq!(paths[0].len(), 11);
    }

    #[test]
    fn occupied_cells_are_avoided_except_goal() {
        let m = ascii_map(&["...", "...", "..."]);
        let occupied = CellSet::from_points(
            m.bounds(),
            [Point::new(0, 1), Point::new(1, 1), Point::new(2, 2)],
        );
        let mut rng = StdRng::seed_from_u64(3);
        let hs = HeuristicSearch::default();
        let p = hs
            .point_to_point(&m, Point::new(0, 0), Point::new(2, 2), &occupied, &mut rng)
            .unwrap();
        assert!(!p.contains(&Point::new(0, 1)));
        assert!(!p.contains(&Point::new(1, 1)));
        assert_eq!(p.last(), Some(&Point::new(2, 2)));
    }

    #[test]
    fn pool_is_subsampled_to_target() {
        let m = open_map();
        let mut rng = StdRng::seed_from_u64(5);
        let hs = HeuristicSearch::new(HeuristicConfig {
            pool_target: 4,
            ..HeuristicConfig::default()
        });
        let pool = hs.segment_pool(
            &m,
            Point::new(5, 0),
            Point::new(0, 5),
            &CellSet::new(m.bounds()),
            &mut rng,
        );
        assert!(pool.len() <= 4);
        assert!(!pool.is_empty());
    }

    #[test]
    fn seeds_visit_stations_in_order() {
        let m = open_map();
        let stations = [Point::new(0, 0), Point::new(5, 5), Point::new(0, 5)];
        let mut rng = StdRng::seed_from_u64(9);
        let hs = HeuristicSearch::new(HeuristicConfig {
            stitch_cap: 20,
            ..HeuristicConfig::default()
        });
        let seeds = hs.seeds(&m, &stations, &mut rng);
        assert!(!seeds.is_empty());
        for r in &seeds {
            assert!(is_walkable(&m, r, false));
            assert_eq!(r.first(), Some(&stations[0]));
            assert_eq!(r.last(), Some(&stations[2]));
            assert!(r.contains(&stations[1]));
        }
    }

    #[test]
    fn sequential_segments_do_not_reuse_interior_cells() {
        let m = open_map();
        let stations = [Point::new(0, 0), Point::new(0, 5), Point::new(5, 5)];
        let mut rng = StdRng::seed_from_u64(11);
        let hs = HeuristicSearch::new(HeuristicConfig {
            stitch_cap: 10,
            ..HeuristicConfig::default()
        });
        for r in hs.sequential(&m, &stations, &mut rng) {
            let mut cells = r.clone();
            cells.sort();
            cells.dedup();
            assert_eq!(cells.len(), r.len(), "route revisits a cell: {r:?}");
        }
    }

    #[test]
    fn blocked_goal_yields_no_seeds() {
        let m = ascii_map(&[".....", ".###.", ".#.#.", ".###.", "....."]);
        let mut rng = StdRng::seed_from_u64(2);
        let hs = HeuristicSearch::default();
        assert!(hs.seeds(&m, &[Point::new(0, 0), Point::new(2, 2)], &mut rng).is_empty());
    }

    #[test]
    fn costly_trails_are_pruned_against_the_best() {
        // A three-step path over the top and a seven-step one around the
        // bottom of the block.
        let m = ascii_map(&["....", ".##.", "...."]);
        let w = Weighting {
            weight: 1.0,
            perturbation: 0.0,
        };
        let (from, to) = (Point::new(0, 0), Point::new(0, 3));
        let free = CellSet::new(m.bounds());
        let run = |prune_factor| {
            let hs = HeuristicSearch::new(HeuristicConfig {
                solutions_per_config: 2,
                prune_factor,
                ..HeuristicConfig::default()
            });
            let mut rng = StdRng::seed_from_u64(4);
            hs.search(&m, from, to, w, &free, &mut rng)
        };
        let lens = |paths: Vec<Vec<Point>>| paths.iter().map(Vec::len).collect::<Vec<_>>();
        assert_eq!(lens(run(1.0)), vec![4]);
        assert_eq!(lens(run(3.0)), vec![4, 8]);
    }

    #[test]
    fn sequential_stitching_respects_cap() {
        let m = open_map();
        let stations = [Point::new(0, 0), Point::new(5, 5), Point::new(0, 5)];
        let capped = HeuristicSearch::new(HeuristicConfig {
            stitch_cap: 5,
            ..HeuristicConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(13);
        let routes = capped.sequential(&m, &stations, &mut rng);
        assert!((1..=5).contains(&routes.len()), "{} routes", routes.len());

        let mut rng = StdRng::seed_from_u64(13);
        let uncapped = HeuristicSearch::default().sequential(&m, &stations, &mut rng);
        assert!(uncapped.len() > 5);
        assert!(uncapped.len() <= HeuristicConfig::default().stitch_cap);
    }
}
