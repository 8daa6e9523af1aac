//! JSON request and report formats.

use std::fs;
use std::path::{Path, PathBuf};

use agv_core::Point;
use agv_plan::{FlowPlan, Floor, PlanError, PlannerConfig, Score};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot write report: {0}")]
    Report(#[from] serde_json::Error),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// A planning request: one floor, one or more station orders.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(flatten)]
    pub floor: Floor,
    pub flows: Vec<Vec<Point>>,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub self_intersections: bool,
}

fn default_algorithm() -> String {
    "dfs".to_owned()
}

/// Read and parse a JSON file.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_owned(),
        source,
    })
}

/// Planner configuration from `path`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<PlannerConfig, CliError> {
    path.map_or_else(|| Ok(PlannerConfig::default()), load)
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub stations: Vec<Point>,
    pub found: bool,
    pub raw: Vec<Point>,
    pub smoothed: Vec<Point>,
    pub score: Score,
}

impl From<FlowPlan> for FlowReport {
    fn from(plan: FlowPlan) -> Self {
        Self {
            found: plan.solution.is_found(),
            stations: plan.stations,
            raw: plan.solution.raw,
            smoothed: plan.solution.smoothed,
            score: plan.score,
        }
    }
}

/// Everything printed for one request.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub algorithm: String,
    pub seed: u64,
    pub flows: Vec<FlowReport>,
    pub intersections: Vec<Point>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agv_core::Category;

    const REQUEST: &str = r#"{
        "rows": 4, "cols": 5, "width": 10.0, "height": 8.0,
        "points": [
            {"name": "wall", "row": 1, "col": 2, "category": "obstacle"},
            {"name": "load", "row": 0, "col": 0, "category": "station", "service_time": 30.0}
        ],
        "flows": [[{"row": 0, "col": 0}, {"row": 3, "col": 4}]],
        "algorithm": "geneticalgorithm",
        "seed": 11
    }"#;

    #[test]
    fn parses_request() {
        let req: Request = serde_json::from_str(REQUEST).unwrap();
        assert_eq!(req.floor.rows, 4);
        assert_eq!(req.floor.points.len(), 2);
        assert_eq!(req.floor.points[0].category, Category::Obstacle);
        assert_eq!(req.floor.points[1].service_time, 30.0);
        assert_eq!(req.flows, vec![vec![Point::new(0, 0), Point::new(3, 4)]]);
        assert_eq!(req.algorithm, "geneticalgorithm");
        assert_eq!(req.seed, Some(11));
        assert!(!req.self_intersections);

        let map = req.floor.map(req.flows[0].clone()).unwrap();
        assert!(!map.is_passable(Point::new(1, 2)));
    }

    #[test]
    fn algorithm_defaults_to_dfs() {
        let req: Request = serde_json::from_str(
            r#"{"rows": 3, "cols": 3, "width": 3, "height": 3,
                "flows": [[{"row": 0, "col": 0}, {"row": 2, "col": 2}]]}"#,
        )
        .unwrap();
        assert_eq!(req.algorithm, "dfs");
        assert!(req.floor.points.is_empty());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load::<Request>(Path::new("/nonexistent/agvplan.json")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
        assert!(load_config(None).is_ok());
    }

    #[test]
    fn report_serializes_flow_outcome() {
        let report = Report {
            algorithm: "dfs".into(),
            seed: 1,
            flows: vec![FlowReport {
                stations: vec![Point::new(0, 0), Point::new(0, 1)],
                found: false,
                raw: Vec::new(),
                smoothed: Vec::new(),
                score: Score::default(),
            }],
            intersections: vec![Point::new(2, 2)],
        };
        let v: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(v["flows"][0]["found"], false);
        assert_eq!(v["intersections"][0]["row"], 2);
        assert_eq!(v["flows"][0]["score"]["num_of_rgvs"], 0);
    }
}
