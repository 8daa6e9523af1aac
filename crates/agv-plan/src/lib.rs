//! Route planning for automated guided vehicles.
//!
//! Given a [`GridMap`](agv_core::GridMap) and an ordered list of stations,
//! [`Planner::solve`] searches for a route with the requested
//! [`Algorithm`], post-processes it into axis-aligned runs with [`smooth`]
//! and leaves both in a [`Solution`]. Routes are scored with the bottleneck
//! model in [`eval`], and the routes of several flows sharing one floor are
//! checked for crossings with [`find_intersections`].
//!
//! ```no_run
//! use agv_core::{GridMap, PathPoint, Point};
//! use agv_plan::{Algorithm, Planner, PlannerConfig};
//!
//! let stations = vec![Point::new(5, 0), Point::new(0, 5)];
//! let mut map = GridMap::new(6, 6, 6.0, 6.0, Vec::<PathPoint>::new(), stations)?;
//! let mut planner = Planner::new(PlannerConfig::default(), Some(7));
//! let solution = planner.solve(&mut map, Algorithm::Exhaustive, &[])?;
//! let score = planner.score(&solution.smoothed, &map);
//! println!("{} cells, {:.1} items/h", solution.smoothed.len(), score.throughput);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod eval;
pub mod genetic;
pub mod intersect;
pub mod smooth;
pub mod solver;

#[cfg(test)]
mod testutil;

pub use error::PlanError;
pub use eval::{EvalConfig, Score, score};
pub use genetic::{Fitness, GeneticConfig, GeneticSolver};
pub use intersect::find_intersections;
pub use smooth::smooth;
pub use solver::{Algorithm, Floor, FlowPlan, Planner, PlannerConfig, Solution, Strategy};
