//! Route search over AGV floor maps.
//!
//! Three families of station-to-station search share the primitives in this
//! crate:
//!
//! - **Exhaustive** depth-first enumeration of simple paths ([`ExhaustiveSearch`])
//! - **Heuristic** weighted best-first search with perturbation ([`HeuristicSearch`])
//! - **Tree** sampling-based RRT* growth ([`TreeSearch`])
//!
//! Each family produces per-segment path pools that are stitched into full
//! routes with [`stitch`]. All searches read the floor through the
//! [`Terrain`] trait, which [`agv_core::GridMap`] implements.

mod bfs;
mod cellset;
mod distance;
mod exhaustive;
mod heuristic;
mod line;
mod neighbors;
pub mod stitch;
mod traits;
mod tree;

#[cfg(test)]
mod testutil;

pub use bfs::{reachable, shortest_path, steps_avoiding, steps_between};
pub use cellset::CellSet;
pub use distance::{chebyshev, euclidean, manhattan};
pub use exhaustive::{ExhaustiveConfig, ExhaustiveSearch};
pub use heuristic::{HeuristicConfig, HeuristicSearch, Weighting};
pub use line::{axis_path, line_cells};
pub use neighbors::{Connectivity, Neighbors};
pub use traits::Terrain;
pub use tree::{TreeConfig, TreeSearch};
