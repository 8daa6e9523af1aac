//! Algorithm selection and the per-flow planning pipeline.

use std::fmt;
use std::str::FromStr;

use agv_core::{GridMap, PathPoint, Point};
use agv_paths::{
    ExhaustiveConfig, ExhaustiveSearch, HeuristicConfig, HeuristicSearch, TreeConfig, TreeSearch,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::PlanError;
use crate::eval::{EvalConfig, Score};
use crate::genetic::{GeneticConfig, GeneticSolver};
use crate::smooth::smooth;

/// Algorithms a caller may request by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Algorithm {
    #[cfg_attr(feature = "serde", serde(rename = "dfs"))]
    Exhaustive,
    #[cfg_attr(feature = "serde", serde(rename = "geneticalgorithm"))]
    Genetic,
    ReinforcementLearning,
}

impl Algorithm {
    /// The wire name of this algorithm.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Exhaustive => "dfs",
            Algorithm::Genetic => "geneticalgorithm",
            Algorithm::ReinforcementLearning => "reinforcementlearning",
        }
    }

    /// The strategy that implements this algorithm.
    pub fn strategy(self) -> Result<Strategy, PlanError> {
        match self {
            Algorithm::Exhaustive => Ok(Strategy::Exhaustive),
            Algorithm::Genetic => Ok(Strategy::Genetic),
            Algorithm::ReinforcementLearning => Err(PlanError::NotImplemented(self)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dfs" => Ok(Algorithm::Exhaustive),
            "geneticalgorithm" => Ok(Algorithm::Genetic),
            "reinforcementlearning" => Ok(Algorithm::ReinforcementLearning),
            _ => Err(PlanError::UnknownAlgorithm(s.to_owned())),
        }
    }
}

/// Every search strategy the planner can run. Only
/// [`Exhaustive`](Strategy::Exhaustive) and [`Genetic`](Strategy::Genetic)
/// are reachable by algorithm name; the other two normally only seed the
/// genetic solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Strategy {
    Exhaustive,
    Heuristic,
    Tree,
    Genetic,
}

/// Settings for every strategy plus the evaluator.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    pub exhaustive: ExhaustiveConfig,
    pub heuristic: HeuristicConfig,
    pub tree: TreeConfig,
    pub genetic: GeneticConfig,
    pub eval: EvalConfig,
}

/// Result of solving one flow.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Route as produced by the solver. Empty when no route exists.
    pub raw: Vec<Point>,
    /// Route after post-processing.
    pub smoothed: Vec<Point>,
}

impl Solution {
    /// Whether a route was found.
    pub fn is_found(&self) -> bool {
        !self.raw.is_empty()
    }
}

/// Floor description shared by every flow of a request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Floor {
    pub rows: i32,
    pub cols: i32,
    pub width: f64,
    pub height: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub points: Vec<PathPoint>,
}

impl Floor {
    /// A map of this floor for one station order.
    pub fn map(&self, stations: Vec<Point>) -> Result<GridMap, PlanError> {
        Ok(GridMap::new(
            self.rows,
            self.cols,
            self.width,
            self.height,
            self.points.iter().cloned(),
            stations,
        )?)
    }
}

/// Outcome of one flow of a multi-flow request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowPlan {
    pub stations: Vec<Point>,
    pub solution: Solution,
    pub score: Score,
}

/// Owns the configuration and the random generator for a planning session.
#[derive(Debug)]
pub struct Planner {
    pub config: PlannerConfig,
    seed: u64,
    rng: StdRng,
}

impl Planner {
    /// A planner seeded with `seed`, or with a fresh random seed.
    pub fn new(config: PlannerConfig, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            config,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The seed this planner's generator started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Solve `map` with a named algorithm. `committed` holds the routes of
    /// flows already planned on the same floor.
    ///
    /// The map's solution slot holds the raw route after the search and the
    /// smoothed route on return.
    pub fn solve(
        &mut self,
        map: &mut GridMap,
        algorithm: Algorithm,
        committed: &[Vec<Point>],
    ) -> Result<Solution, PlanError> {
        let strategy = algorithm.strategy()?;
        Ok(self.run(map, strategy, committed))
    }

    /// Run a strategy directly.
    pub fn run(&mut self, map: &mut GridMap, strategy: Strategy, committed: &[Vec<Point>]) -> Solution {
        let raw = self.raw_route(map, strategy, committed);
        if raw.is_empty() {
            log::info!("{strategy:?}: no route for {} station(s)", map.stations().len());
        } else {
            log::info!("{strategy:?}: raw route of {} cell(s)", raw.len());
        }

        map.set_solution(raw);
        let smoothed = smooth(map.solution(), map);
        let raw = map.solution().to_vec();
        map.set_solution(smoothed.clone());
        Solution { raw, smoothed }
    }

    fn raw_route(&mut self, map: &GridMap, strategy: Strategy, committed: &[Vec<Point>]) -> Vec<Point> {
        let stations = map.stations();
        let eval = &self.config.eval;
        let candidates = match strategy {
            Strategy::Exhaustive => {
                ExhaustiveSearch::new(self.config.exhaustive.clone()).candidates(map, stations)
            }
            Strategy::Heuristic => {
                HeuristicSearch::new(self.config.heuristic.clone()).seeds(map, stations, &mut self.rng)
            }
            Strategy::Tree => {
                TreeSearch::new(self.config.tree.clone()).seeds(map, stations, &mut self.rng)
            }
            Strategy::Genetic => {
                let heuristic = HeuristicSearch::new(self.config.heuristic.clone());
                let mut seeds = heuristic.seeds(map, stations, &mut self.rng);
                seeds.extend(TreeSearch::new(self.config.tree.clone()).seeds(map, stations, &mut self.rng));
                log::debug!("genetic: {} seed route(s)", seeds.len());
                let solver = GeneticSolver::new(self.config.genetic.clone(), eval.clone(), heuristic);
                return solver.evolve(map, seeds, committed, &mut self.rng);
            }
        };
        log::debug!("{strategy:?}: ranking {} candidate(s)", candidates.len());
        eval.best_route(&candidates, map).unwrap_or_default()
    }

    /// Score a route with this planner's evaluator settings.
    pub fn score(&self, route: &[Point], map: &GridMap) -> Score {
        self.config.eval.score(route, map)
    }

    /// Plan every flow on `floor` in submission order. Flow `i` sees the
    /// smoothed routes of flows `0..i` as committed.
    pub fn plan_flows(
        &mut self,
        floor: &Floor,
        flows: &[Vec<Point>],
        algorithm: Algorithm,
    ) -> Result<Vec<FlowPlan>, PlanError> {
        let strategy = algorithm.strategy()?;
        let mut maps = flows
            .iter()
            .map(|stations| floor.map(stations.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut committed: Vec<Vec<Point>> = Vec::with_capacity(flows.len());
        let mut plans = Vec::with_capacity(flows.len());
        for (i, map) in maps.iter_mut().enumerate() {
            log::debug!("flow {i}: {} station(s)", map.stations().len());
            let solution = self.run(map, strategy, &committed);
            let score = self.score(&solution.smoothed, map);
            if solution.is_found() {
                committed.push(solution.smoothed.clone());
            }
            plans.push(FlowPlan {
                stations: map.stations().to_vec(),
                solution,
                score,
            });
        }
        Ok(plans)
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn algorithm_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Algorithm::Exhaustive).unwrap(), "\"dfs\"");
        let a: Algorithm = serde_json::from_str("\"reinforcementlearning\"").unwrap();
        assert_eq!(a, Algorithm::ReinforcementLearning);
    }

    #[test]
    fn planner_config_accepts_partial_json() {
        let cfg: PlannerConfig =
            serde_json::from_str(r#"{"genetic": {"generations": 5}, "tree": {"step": 2.0}}"#).unwrap();
        assert_eq!(cfg.genetic.generations, 5);
        assert_eq!(cfg.genetic.population, 400);
        assert_eq!(cfg.tree.step, 2.0);
        assert_eq!(cfg.heuristic, HeuristicConfig::default());
    }
}
