//! Headless episode runner
//!
//! Plays seeded episodes with the autopilot player (always stepping along its
//! shortest path to the goal) and prints one JSON line per episode. With
//! `--trace`, every tick's snapshot is printed as well.

use gridchase::logging::init_logging;
use gridchase::{Config, Episode, Outcome};
use serde::Serialize;
use std::env;
use std::process;

/// Episodes that run longer than this are reported as still running
const MAX_TICKS: u64 = 10_000;

#[derive(Debug, Serialize)]
struct EpisodeReport {
    seed: u64,
    ticks: u64,
    outcome: Outcome,
}

struct Args {
    first_seed: u64,
    episodes: u64,
    trace: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut first_seed = None;
    let mut episodes = 10;
    let mut trace = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                first_seed = Some(value.parse().map_err(|e| format!("bad seed '{}': {}", value, e))?);
            }
            "--episodes" => {
                let value = args.next().ok_or("--episodes needs a value")?;
                episodes = value.parse().map_err(|e| format!("bad episode count '{}': {}", value, e))?;
            }
            "--trace" => trace = true,
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    Ok(Args {
        first_seed: first_seed.unwrap_or(0),
        episodes,
        trace,
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;
    let config = Config::load();
    init_logging(&config.logging.filter);

    let settings = config.episode_settings();
    let first_seed = config.map.seed.unwrap_or(args.first_seed);
    let mut tally = [0u64; 4];

    for seed in first_seed..first_seed + args.episodes {
        let mut episode = Episode::new(&settings, seed)?;
        while !episode.outcome().is_terminal() && episode.ticks() < MAX_TICKS {
            let intent = episode.autopilot_intent();
            episode.tick(intent);
            if args.trace {
                println!("{}", serde_json::to_string(&episode.snapshot())?);
            }
        }

        let report = EpisodeReport {
            seed,
            ticks: episode.ticks(),
            outcome: episode.outcome(),
        };
        tally[report.outcome as usize] += 1;
        println!("{}", serde_json::to_string(&report)?);
    }

    eprintln!(
        "running: {}, escaped: {}, caught: {}, agent won: {}",
        tally[Outcome::Running as usize],
        tally[Outcome::Escaped as usize],
        tally[Outcome::Caught as usize],
        tally[Outcome::AgentWon as usize]
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        eprintln!("Usage: simulate [--seed N] [--episodes N] [--trace]");
        process::exit(1);
    }
}
