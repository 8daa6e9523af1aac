//! Population-based route refinement.
//!
//! The initial population mixes greedy random walks with seed routes from
//! the heuristic and tree searches. Each generation keeps an elite slice and
//! breeds the rest through tournament selection, single-cell crossover and
//! sub-path mutation. Fitness rewards throughput and penalizes repeated
//! cells, turns and overlap with routes already committed by other flows.

use std::cmp::Ordering;
use std::collections::HashSet;

use agv_core::{GridMap, Point};
use agv_paths::{CellSet, Connectivity, HeuristicSearch, Neighbors, chebyshev, manhattan};
use rand::{Rng, RngExt};

use crate::eval::EvalConfig;

/// Tunables for [`GeneticSolver`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeneticConfig {
    pub population: usize,
    pub generations: usize,
    /// Share of each generation copied unchanged into the next.
    pub elite_fraction: f64,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    /// Longest route an individual may hold.
    pub max_chromosome: usize,
    /// Probability a random walk takes the step closest to its target.
    pub greedy_bias: f64,
    /// Longest stretch of a route a mutation rebuilds.
    pub mutation_span: usize,
    pub throughput_weight: f64,
    pub length_weight: f64,
    pub fleet_weight: f64,
    pub duplicate_penalty: f64,
    pub turn_penalty: f64,
    pub conflict_penalty: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population: 400,
            generations: 400,
            elite_fraction: 0.10,
            tournament_size: 5,
            crossover_rate: 0.70,
            mutation_rate: 0.20,
            max_chromosome: 1000,
            greedy_bias: 0.75,
            mutation_span: 12,
            throughput_weight: 0.8,
            length_weight: 0.1,
            fleet_weight: 0.1,
            duplicate_penalty: 20.0,
            turn_penalty: 20.0,
            conflict_penalty: 100.0,
        }
    }
}

/// Outcome of evaluating one individual.
#[derive(Debug, Clone, Copy)]
pub enum Fitness {
    /// Misses a station, breaks connectivity or touches an obstacle.
    Infeasible,
    Scored(f64),
}

impl Fitness {
    pub fn is_feasible(self) -> bool {
        matches!(self, Fitness::Scored(_))
    }
}

impl Ord for Fitness {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Fitness::Infeasible, Fitness::Infeasible) => Ordering::Equal,
            (Fitness::Infeasible, Fitness::Scored(_)) => Ordering::Less,
            (Fitness::Scored(_), Fitness::Infeasible) => Ordering::Greater,
            (Fitness::Scored(a), Fitness::Scored(b)) => a.total_cmp(b),
        }
    }
}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Fitness {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fitness {}

/// Evolutionary route search.
#[derive(Debug, Clone, Default)]
pub struct GeneticSolver {
    pub config: GeneticConfig,
    pub eval: EvalConfig,
    /// Point-to-point search used to rebuild mutated stretches.
    pub mutator: HeuristicSearch,
}

impl GeneticSolver {
    pub fn new(config: GeneticConfig, eval: EvalConfig, mutator: HeuristicSearch) -> Self {
        Self {
            config,
            eval,
            mutator,
        }
    }

    /// Fitness of `route` on `map` against the routes other flows have
    /// already committed.
    pub fn evaluate(&self, route: &[Point], map: &GridMap, committed: &[Vec<Point>]) -> Fitness {
        if !visits_in_order(route, map.stations())
            || !route.windows(2).all(|w| Connectivity::Eight.adjacent(w[0], w[1]))
            || !route.iter().all(|&p| map.is_passable(p))
        {
            return Fitness::Infeasible;
        }

        let c = &self.config;
        let score = self.eval.score(route, map);
        let conflicts: usize = committed.iter().map(|other| lcs_len(route, other)).sum();
        let value = c.throughput_weight * score.throughput
            + c.length_weight / score.track_length
            + c.fleet_weight / f64::from(score.num_of_rgvs)
            - c.duplicate_penalty * duplicate_cells(route) as f64
            - c.turn_penalty * turns(route) as f64
            - c.conflict_penalty * conflicts as f64;
        Fitness::Scored(value)
    }

    /// Evolve a route for `map`. `seeds` join the initial population as-is.
    /// Returns the best individual of the final generation, or an empty
    /// route when no feasible individual survived.
    pub fn evolve<R: Rng>(
        &self,
        map: &GridMap,
        seeds: Vec<Vec<Point>>,
        committed: &[Vec<Point>],
        rng: &mut R,
    ) -> Vec<Point> {
        let c = &self.config;
        let n_seeds = seeds.len();
        let mut population: Vec<Vec<Point>> = seeds
            .into_iter()
            .map(|mut r| {
                r.truncate(c.max_chromosome);
                r
            })
            .collect();
        while population.len() < c.population.max(1) {
            population.push(self.random_walk(map, rng));
        }
        log::debug!(
            "genetic: initial population {} ({n_seeds} seeded)",
            population.len()
        );

        let elite = ((c.population as f64 * c.elite_fraction).ceil() as usize).max(1);
        for generation in 0..c.generations {
            let ranked = self.rank(population, map, committed);
            if let Some((best, _)) = ranked.first() {
                log::trace!("genetic: generation {generation} best {best:?}");
            }

            let mut next: Vec<Vec<Point>> = ranked
                .iter()
                .take(elite)
                .map(|(_, r)| r.clone())
                .collect();
            while next.len() < c.population.max(1) {
                let p1 = tournament(&ranked, c.tournament_size, rng);
                let p2 = tournament(&ranked, c.tournament_size, rng);
                let mut child = if rng.random_bool(c.crossover_rate.clamp(0.0, 1.0)) {
                    crossover(p1, p2, c.max_chromosome, rng)
                } else {
                    p1.clone()
                };
                if rng.random_bool(c.mutation_rate.clamp(0.0, 1.0)) {
                    self.mutate(&mut child, map, rng);
                }
                next.push(child);
            }
            population = next;
        }

        let ranked = self.rank(population, map, committed);
        match ranked.into_iter().next() {
            Some((fitness @ Fitness::Scored(_), route)) => {
                log::info!(
                    "genetic: best fitness {fitness:?} after {} generation(s), {} cell(s)",
                    c.generations,
                    route.len()
                );
                route
            }
            _ => {
                log::info!("genetic: no feasible route after {} generation(s)", c.generations);
                Vec::new()
            }
        }
    }

    /// Population sorted by fitness, best first.
    fn rank(
        &self,
        population: Vec<Vec<Point>>,
        map: &GridMap,
        committed: &[Vec<Point>],
    ) -> Vec<(Fitness, Vec<Point>)> {
        let mut ranked: Vec<(Fitness, Vec<Point>)> = population
            .into_iter()
            .map(|r| (self.evaluate(&r, map, committed), r))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked
    }

    /// A walk through the stations in order, taking the step closest to the
    /// next station with probability `greedy_bias` and a random passable
    /// step otherwise. Stops at `max_chromosome` cells or when stuck.
    fn random_walk<R: Rng>(&self, map: &GridMap, rng: &mut R) -> Vec<Point> {
        let stations = map.stations();
        let Some(&first) = stations.first() else {
            return Vec::new();
        };
        let mut route = vec![first];
        let mut nb = Neighbors::new();
        let mut cur = first;
        for &target in &stations[1..] {
            while cur != target {
                if route.len() >= self.config.max_chromosome {
                    return route;
                }
                let options = nb.of(Connectivity::Eight, cur, |n| map.is_passable(n));
                if options.is_empty() {
                    return route;
                }
                let next = if rng.random_bool(self.config.greedy_bias.clamp(0.0, 1.0)) {
                    options
                        .iter()
                        .copied()
                        .min_by_key(|&n| (chebyshev(n, target), manhattan(n, target)))
                } else {
                    options.get(rng.random_range(0..options.len())).copied()
                };
                let Some(next) = next else {
                    return route;
                };
                route.push(next);
                cur = next;
            }
        }
        route
    }

    /// Rebuild the stretch between two random cut points with one
    /// point-to-point search. The route is left alone if the search fails.
    fn mutate<R: Rng>(&self, route: &mut Vec<Point>, map: &GridMap, rng: &mut R) {
        if route.len() < 3 {
            return;
        }
        let a = rng.random_range(0..route.len() - 2);
        let span = self.config.mutation_span.max(2);
        let b = rng.random_range(a + 2..route.len().min(a + span + 1));
        let free = CellSet::new(map.bounds());
        let Some(sub) = self
            .mutator
            .point_to_point(map, route[a], route[b], &free, rng)
        else {
            return;
        };
        let mut mutated = Vec::with_capacity(a + sub.len() + route.len() - b);
        mutated.extend_from_slice(&route[..a]);
        mutated.extend_from_slice(&sub);
        mutated.extend_from_slice(&route[b + 1..]);
        mutated.truncate(self.config.max_chromosome);
        *route = mutated;
    }
}

/// Best of `size` uniformly drawn individuals.
fn tournament<'a, R: Rng>(
    ranked: &'a [(Fitness, Vec<Point>)],
    size: usize,
    rng: &mut R,
) -> &'a Vec<Point> {
    // `ranked` is sorted best first, so the smallest index wins.
    let mut best = rng.random_range(0..ranked.len());
    for _ in 1..size.max(1) {
        best = best.min(rng.random_range(0..ranked.len()));
    }
    &ranked[best].1
}

/// Splice `p1`'s prefix onto `p2`'s suffix at a randomly chosen cell both
/// parents contain. Without a common cell the child is a copy of `p1`.
fn crossover<R: Rng>(p1: &[Point], p2: &[Point], cap: usize, rng: &mut R) -> Vec<Point> {
    let in_p2: HashSet<Point> = p2.iter().copied().collect();
    let common: Vec<usize> = p1
        .iter()
        .enumerate()
        .filter(|(_, p)| in_p2.contains(p))
        .map(|(i, _)| i)
        .collect();
    if common.is_empty() {
        return p1.to_vec();
    }
    let i = common[rng.random_range(0..common.len())];
    let Some(j) = p2.iter().position(|&p| p == p1[i]) else {
        return p1.to_vec();
    };
    let mut child = Vec::with_capacity(i + p2.len() - j);
    child.extend_from_slice(&p1[..i]);
    child.extend_from_slice(&p2[j..]);
    child.truncate(cap);
    child
}

/// Whether `route` starts on the first station, visits every station in
/// order and ends on the last one. Consecutive repeats of a station in the
/// order are satisfied by a single visit.
fn visits_in_order(route: &[Point], stations: &[Point]) -> bool {
    if route.first() != stations.first() || route.last() != stations.last() {
        return false;
    }
    let mut k = 0;
    for &p in route {
        if k < stations.len() && p == stations[k] {
            k += 1;
            while k < stations.len() && stations[k] == stations[k - 1] {
                k += 1;
            }
        }
    }
    k == stations.len()
}

/// Cells appearing more than once, counted per extra occurrence.
fn duplicate_cells(route: &[Point]) -> usize {
    let distinct: HashSet<Point> = route.iter().copied().collect();
    route.len() - distinct.len()
}

/// Number of direction changes between consecutive steps.
fn turns(route: &[Point]) -> usize {
    route
        .windows(3)
        .filter(|w| w[1] - w[0] != w[2] - w[1])
        .count()
}

/// Length of the longest common subsequence of two routes.
fn lcs_len(a: &[Point], b: &[Point]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &x in a {
        for (j, &y) in b.iter().enumerate() {
            cur[j + 1] = if x == y {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ascii_map, is_walkable, open_map, visits_in_order as in_order};
    use agv_paths::HeuristicConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn p(r: i32, c: i32) -> Point {
        Point::new(r, c)
    }

    fn small() -> GeneticSolver {
        GeneticSolver::new(
            GeneticConfig {
                population: 40,
                generations: 30,
                ..GeneticConfig::default()
            },
            EvalConfig::default(),
            HeuristicSearch::new(HeuristicConfig::default()),
        )
    }

    #[test]
    fn fitness_orders_infeasible_lowest() {
        assert!(Fitness::Infeasible < Fitness::Scored(-1e12));
        assert!(Fitness::Scored(1.0) > Fitness::Scored(0.5));
        assert_eq!(Fitness::Infeasible, Fitness::Infeasible);
    }

    #[test]
    fn evaluate_rejects_bad_routes() {
        let map = ascii_map(&["....", ".#..", "...."], vec![p(0, 0), p(2, 3)]);
        let ga = GeneticSolver::default();
        // Ends early.
        assert!(!ga.evaluate(&[p(0, 0), p(1, 0)], &map, &[]).is_feasible());
        // Gap between cells.
        assert!(!ga.evaluate(&[p(0, 0), p(2, 3)], &map, &[]).is_feasible());
        // Through the obstacle.
        let through = [p(0, 0), p(1, 1), p(2, 2), p(2, 3)];
        assert!(!ga.evaluate(&through, &map, &[]).is_feasible());
        let ok = [p(0, 0), p(0, 1), p(0, 2), p(1, 3), p(2, 3)];
        assert!(ga.evaluate(&ok, &map, &[]).is_feasible());
    }

    #[test]
    fn round_trip_order_needs_the_return_leg() {
        let (a, b) = (p(0, 0), p(0, 3));
        let map = open_map(3, 4, vec![a, b, a]);
        let ga = GeneticSolver::default();
        let there = [a, p(0, 1), p(0, 2), b];
        let back = [a, p(0, 1), p(0, 2), b, p(1, 2), p(1, 1), a];
        let skips_b = [a, p(1, 1), p(1, 2), p(0, 2), p(1, 1), a];
        assert!(!ga.evaluate(&there, &map, &[]).is_feasible());
        assert!(ga.evaluate(&back, &map, &[]).is_feasible());
        assert!(!ga.evaluate(&skips_b, &map, &[]).is_feasible());
        assert!(visits_in_order(&back, &[a, b, a]));
        assert!(!visits_in_order(&[a], &[a, b, a]));
    }

    #[test]
    fn penalties_lower_fitness() {
        let map = open_map(4, 4, vec![p(0, 0), p(0, 3)]);
        let ga = GeneticSolver::default();
        let straight = [p(0, 0), p(0, 1), p(0, 2), p(0, 3)];
        let wiggly = [p(0, 0), p(1, 1), p(0, 2), p(0, 3)];
        let s = ga.evaluate(&straight, &map, &[]);
        assert!(s > ga.evaluate(&wiggly, &map, &[]));
        assert!(s > ga.evaluate(&straight, &map, &[straight.to_vec()]));
    }

    #[test]
    fn helpers_count_correctly() {
        let r = [p(0, 0), p(0, 1), p(1, 1), p(0, 1), p(0, 2)];
        assert_eq!(duplicate_cells(&r), 1);
        assert_eq!(turns(&r), 3);
        assert_eq!(lcs_len(&r, &[p(0, 0), p(1, 1), p(0, 2)]), 3);
        assert_eq!(lcs_len(&r, &[]), 0);
        assert!(visits_in_order(&r, &[p(0, 0), p(1, 1), p(0, 2)]));
        assert!(!visits_in_order(&r, &[p(0, 0), p(0, 2), p(1, 1)]));
    }

    #[test]
    fn crossover_splices_at_common_cell() {
        let a = vec![p(0, 0), p(0, 1), p(0, 2), p(0, 3)];
        let b = vec![p(0, 0), p(1, 1), p(0, 2), p(1, 3)];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let child = crossover(&a, &b, 100, &mut rng);
            assert_eq!(child.first(), Some(&p(0, 0)));
            assert_eq!(child.last(), Some(&p(1, 3)));
        }
        assert_eq!(crossover(&a, &[p(5, 5)], 100, &mut rng), a);
    }

    #[test]
    fn random_walks_reach_stations_on_open_floor() {
        let map = open_map(6, 6, vec![p(5, 0), p(0, 5), p(5, 5)]);
        let ga = GeneticSolver::new(
            GeneticConfig {
                greedy_bias: 1.0,
                ..GeneticConfig::default()
            },
            EvalConfig::default(),
            HeuristicSearch::default(),
        );
        let mut rng = StdRng::seed_from_u64(1);
        let walk = ga.random_walk(&map, &mut rng);
        assert!(in_order(&walk, map.stations()));
        assert!(is_walkable(&map, &walk, true));
    }

    #[test]
    fn evolve_finds_feasible_route() {
        let map = ascii_map(
            &["......", "..##..", "..##..", "......", "......"],
            vec![p(4, 0), p(0, 5)],
        );
        let mut rng = StdRng::seed_from_u64(21);
        let route = small().evolve(&map, Vec::new(), &[], &mut rng);
        assert!(!route.is_empty());
        assert!(in_order(&route, map.stations()));
        assert!(is_walkable(&map, &route, true));
    }

    #[test]
    fn evolve_reports_nothing_when_walled_off() {
        let map = ascii_map(&[".....", ".###.", ".#.#.", ".###.", "....."], vec![p(0, 0), p(2, 2)]);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(small().evolve(&map, Vec::new(), &[], &mut rng).is_empty());
    }
}
