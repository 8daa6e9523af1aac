//! agvplan: plan AGV routes for a floor described in JSON.

mod cli;
mod request;

use std::io::{self, Write};

use agv_plan::{Algorithm, Planner, find_intersections};
use clap::Parser;

use cli::Cli;
use request::{CliError, FlowReport, Report, Request};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    run(&cli).map_err(|e| {
        log::error!("{e}");
        e.into()
    })
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let request: Request = request::load(&cli.request)?;
    let config = request::load_config(cli.config.as_deref())?;
    let name = cli.algorithm.as_deref().unwrap_or(&request.algorithm);
    let algorithm: Algorithm = name.parse()?;

    let mut planner = Planner::new(config, cli.seed.or(request.seed));
    log::info!(
        "planning {} flow(s) on a {}x{} floor with {algorithm} (seed {})",
        request.flows.len(),
        request.floor.rows,
        request.floor.cols,
        planner.seed()
    );
    let plans = planner.plan_flows(&request.floor, &request.flows, algorithm)?;

    let routes: Vec<_> = plans
        .iter()
        .filter(|p| p.solution.is_found())
        .map(|p| p.solution.smoothed.as_slice())
        .collect();
    let include_self = cli.self_intersections || request.self_intersections;
    let intersections = find_intersections(&routes, include_self);
    for (i, plan) in plans.iter().enumerate() {
        if !plan.solution.is_found() {
            log::warn!("flow {i}: no route between its stations");
        }
    }
    if !intersections.is_empty() {
        log::info!("{} intersection cell(s) between routes", intersections.len());
    }

    let report = Report {
        algorithm: algorithm.to_string(),
        seed: planner.seed(),
        flows: plans.into_iter().map(FlowReport::from).collect(),
        intersections: intersections.into_iter().collect(),
    };
    let mut out = io::stdout().lock();
    if cli.pretty {
        serde_json::to_writer_pretty(&mut out, &report)?;
    } else {
        serde_json::to_writer(&mut out, &report)?;
    }
    writeln!(out).map_err(|source| CliError::Io {
        path: "<stdout>".into(),
        source,
    })?;
    Ok(())
}
