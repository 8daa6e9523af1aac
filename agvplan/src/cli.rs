use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "agvplan")]
#[command(author, version, about)]
#[command(long_about = "Plan AGV routes across a grid floor.\n\n\
    Reads a JSON request describing the floor and one or more station\n\
    orders (flows), solves every flow in order and prints a JSON report.\n\n\
    Examples:\n  \
    agvplan floor.json                       Use the request's algorithm\n  \
    agvplan floor.json --algorithm dfs       Force exhaustive search\n  \
    agvplan floor.json --seed 7 --pretty     Reproducible, indented output")]
pub struct Cli {
    /// JSON planning request
    pub request: PathBuf,

    /// Algorithm name (dfs, geneticalgorithm, reinforcementlearning);
    /// overrides the request
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// Seed for the random generator; overrides the request
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// JSON planner configuration; missing fields keep their defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also report cells where a route crosses itself
    #[arg(long)]
    pub self_intersections: bool,

    /// Indent the JSON report
    #[arg(long)]
    pub pretty: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Default log filter implied by the verbosity flags.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
