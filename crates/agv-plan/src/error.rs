use agv_core::MapError;
use thiserror::Error;

use crate::solver::Algorithm;

/// Reasons a planning request is rejected before any search runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("unknown algorithm {0:?} (expected dfs, geneticalgorithm or reinforcementlearning)")]
    UnknownAlgorithm(String),

    #[error("algorithm {0} is declared but not implemented")]
    NotImplemented(Algorithm),

    #[error(transparent)]
    Map(#[from] MapError),
}
