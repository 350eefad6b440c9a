//! VighnaNav - reactive IR obstacle avoidance
//!
//! Runs one or more avoidance episodes against the built-in simulator, or
//! replays a recorded episode CSV, and writes per-episode output:
//!
//! ```bash
//! vighna-nav                              # defaults, vighna.toml if present
//! vighna-nav vighna.toml --runs 5         # five simulated episodes
//! vighna-nav --preset hardware --replay output/.../data_20250101-120000.csv
//! ```

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use vighna_nav::config::{Preset, VighnaConfig};
use vighna_nav::control::episode::run_episodes;
use vighna_nav::output::{OutputLayout, timestamp_now};
use vighna_nav::{Result, Robot, ScriptedRobot, SimulatedRobot};

#[derive(Parser, Debug)]
#[command(name = "vighna-nav", version)]
#[command(about = "Reactive IR obstacle avoidance controller")]
struct Args {
    /// Configuration file (TOML). Defaults to ./vighna.toml if present
    config: Option<PathBuf>,

    /// Threshold preset, overriding the config file
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Step budget per episode
    #[arg(long)]
    steps: Option<u32>,

    /// Number of episodes to run
    #[arg(long)]
    runs: Option<u32>,

    /// Replay frames from an exported episode CSV instead of simulating
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Output root directory
    #[arg(short, long)]
    output: Option<String>,

    /// Arena label used in output directory names
    #[arg(long)]
    arena: Option<String>,

    /// Noise seed for the simulator (0 = random)
    #[arg(long)]
    seed: Option<u64>,

    /// Run without writing any output files
    #[arg(long)]
    no_output: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vighna_nav=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let profile = config.profile.resolve()?;

    info!("VighnaNav v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Profile: {:?} preset, escalation after {} consecutive dodges",
        config.profile.preset,
        profile.consecutive()
    );

    let mut robot: Box<dyn Robot> = match &args.replay {
        Some(path) => Box::new(ScriptedRobot::from_csv(path)?),
        None => Box::new(SimulatedRobot::new(config.simulation.clone())?),
    };

    let mut runs = config.episode.runs;
    if args.replay.is_some() && runs > 1 {
        warn!("Replay supports a single run; ignoring runs = {}", runs);
        runs = 1;
    }

    let layout = OutputLayout::new(
        &config.output.root,
        timestamp_now(),
        robot.is_simulated(),
        &config.output.arena,
        runs,
    );

    let summaries = run_episodes(
        &mut robot,
        &profile,
        &config.episode.episode_config(),
        runs,
        |run, outcome| {
            if !args.no_output {
                layout.write_episode(run, outcome)?;
            }
            Ok(())
        },
    )?;

    let obstacle: u32 = summaries.iter().map(|s| s.obstacle_dodges).sum();
    let wall: u32 = summaries.iter().map(|s| s.wall_dodges).sum();
    let steps: u32 = summaries.iter().map(|s| s.steps_run).sum();
    info!(
        "{} episode(s): {} steps, {} obstacle dodges, {} wall dodges",
        summaries.len(),
        steps,
        obstacle,
        wall
    );

    info!("VighnaNav finished");
    Ok(())
}

/// Config file (explicit or ./vighna.toml) with command line overrides.
fn load_config(args: &Args) -> Result<VighnaConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            VighnaConfig::load(path)?
        }
        None if Path::new("vighna.toml").exists() => {
            info!("Loading configuration from vighna.toml");
            VighnaConfig::load(Path::new("vighna.toml"))?
        }
        None => {
            info!("Using default configuration");
            VighnaConfig::default()
        }
    };

    if let Some(preset) = args.preset {
        config.profile.preset = preset;
    }
    if let Some(steps) = args.steps {
        config.episode.steps = steps;
    }
    if let Some(runs) = args.runs {
        config.episode.runs = runs;
    }
    if let Some(ref root) = args.output {
        config.output.root = root.clone();
    }
    if let Some(ref arena) = args.arena {
        config.output.arena = arena.clone();
    }
    if let Some(seed) = args.seed {
        config.simulation.random_seed = seed;
    }

    config.validate()?;
    Ok(config)
}
