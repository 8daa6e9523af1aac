//! Route scoring modelled on production-line bottleneck analysis.
//!
//! The busiest station sets the minimum headway between vehicles; the fleet
//! is sized so that one round trip is covered at that headway. This assumes a
//! single dominant bottleneck and is not a general queueing model.

use std::cmp::Ordering;
use std::collections::HashSet;

use agv_core::{GridMap, Point};

/// Physical constants used by the evaluator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvalConfig {
    /// Vehicle speed in physical units per second.
    pub vehicle_speed: f64,
    /// Fixed load/unload time added at every station, in seconds.
    pub load_unload_secs: f64,
    /// Fraction of the theoretical throughput assumed achievable.
    pub derating: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            vehicle_speed: 1.0,
            load_unload_secs: 15.0,
            derating: 0.90,
        }
    }
}

/// Throughput, length and fleet size of one route.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Score {
    /// Items per hour for the whole fleet.
    pub throughput: f64,
    /// Physical track length.
    pub track_length: f64,
    /// Minimum number of vehicles.
    pub num_of_rgvs: u32,
}

impl EvalConfig {
    /// Score `route` on `map`. An empty route scores zero everywhere.
    pub fn score(&self, route: &[Point], map: &GridMap) -> Score {
        if route.is_empty() {
            return Score::default();
        }
        let track_length = route.len() as f64 * map.square_length();
        let travel = track_length / self.vehicle_speed;
        let headway = map
            .stations()
            .iter()
            .map(|&s| map.service_time_at(s) + self.load_unload_secs)
            .fold(0.0, f64::max);
        if headway <= 0.0 {
            return Score {
                throughput: 0.0,
                track_length,
                num_of_rgvs: 1,
            };
        }

        let cycle = travel + self.load_unload_secs;
        let num_of_rgvs = (cycle / headway).floor() as u32 + 1;
        let per_vehicle = 3600.0 / headway;
        Score {
            throughput: f64::from(num_of_rgvs) * per_vehicle * self.derating,
            track_length,
            num_of_rgvs,
        }
    }

    /// Quick throughput estimate used to rank candidate routes: one vehicle
    /// driving the whole track and stopping at every station cell on it.
    pub fn estimated_throughput(&self, route: &[Point], map: &GridMap) -> f64 {
        if route.is_empty() {
            return 0.0;
        }
        let stations: HashSet<Point> = map.stations().iter().copied().collect();
        let track_length = route.len() as f64 * map.square_length();
        let service: f64 = route
            .iter()
            .filter(|p| stations.contains(p))
            .map(|&p| map.service_time_at(p) + self.load_unload_secs)
            .sum();
        let cycle = track_length / self.vehicle_speed + service;
        if cycle <= 0.0 { 0.0 } else { 3600.0 / cycle }
    }

    /// The best of `candidates`: highest estimated throughput, then fewest
    /// vehicles, then shortest track. Ties keep the earliest candidate.
    pub fn best_route(&self, candidates: &[Vec<Point>], map: &GridMap) -> Option<Vec<Point>> {
        candidates
            .iter()
            .map(|r| {
                let s = self.score(r, map);
                (self.estimated_throughput(r, map), s, r)
            })
            .min_by(|a, b| rank(a.0, &a.1, b.0, &b.1))
            .map(|(_, _, r)| r.clone())
    }
}

fn rank(est_a: f64, a: &Score, est_b: f64, b: &Score) -> Ordering {
    est_b
        .total_cmp(&est_a)
        .then(a.num_of_rgvs.cmp(&b.num_of_rgvs))
        .then(a.track_length.total_cmp(&b.track_length))
}

/// Score `route` with the default constants.
pub fn score(route: &[Point], map: &GridMap) -> Score {
    EvalConfig::default().score(route, map)
}
