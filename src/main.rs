//! `rplay`: play the built-in grid world with random actions.
//!
//! Ctrl-C stops the run after the current step; the environment is still
//! closed and the logs are still written.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use random_play::{
    common::{
        cancel::CancelToken,
        logger::{CsvLogger, Logger, MemoryLogger},
    },
    env::{base::Env, gridworld::GridWorldEnv, scripted::OneStepEnv, wrappers::TimeLimitWrapper},
    PlayConfig, PlaySummary, RandomPlayer,
};
use tracing::Level;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EnvKind {
    /// Grid with holes and a goal
    Grid,
    /// Single step episodes with a constant reward
    OneStep,
}

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Environment to play
    #[arg(short, long, value_enum, default_value_t = EnvKind::Grid)]
    env: EnvKind,

    /// Number of random steps to take [default: 500]
    #[arg(short, long)]
    steps: Option<usize>,

    /// JSON file with play settings; flags given here override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Side length of the grid
    #[arg(long, default_value_t = 4)]
    dim: usize,

    /// Steps after which the grid world truncates an episode
    #[arg(long, default_value_t = 20)]
    maxlen: usize,

    /// Probability of each cell being a hole
    #[arg(long, default_value_t = 0.1)]
    obstacle_prob: f32,

    /// Additionally truncate episodes after this many steps
    #[arg(long)]
    max_episode_steps: Option<usize>,

    /// Seed for action sampling and the first reset
    #[arg(long)]
    seed: Option<u64>,

    /// Don't render frames
    #[arg(long)]
    no_render: bool,

    /// Don't show a progress bar
    #[arg(long)]
    no_progress: bool,

    /// Log per-phase timings
    #[arg(long)]
    profile: bool,

    /// Write episode records to this csv file
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Whether or not to turn on debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn play_config(&self) -> Result<PlayConfig, Box<dyn std::error::Error>> {
        let mut cfg = match &self.config {
            Some(path) => PlayConfig::load(path)?,
            None => PlayConfig::new(),
        };

        if let Some(steps) = self.steps {
            cfg = cfg.with_steps(steps);
        }
        if self.seed.is_some() {
            cfg = cfg.with_seed(self.seed);
        }
        if self.no_render {
            cfg = cfg.with_render(false);
        }
        if self.no_progress {
            cfg = cfg.with_progress(false);
        }
        if self.profile {
            cfg = cfg.with_profile_timers(true);
        }

        Ok(cfg)
    }

    fn make_env(&self) -> Box<dyn Env<Vec<f32>, usize>> {
        let env: Box<dyn Env<Vec<f32>, usize>> = match self.env {
            EnvKind::Grid => Box::new(GridWorldEnv::new(self.dim, self.maxlen, self.obstacle_prob)),
            EnvKind::OneStep => Box::new(OneStepEnv::default()),
        };

        match self.max_episode_steps {
            Some(max_steps) => Box::new(TimeLimitWrapper::new(env, max_steps)),
            None => env,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.debug {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = args.play_config()?;
    tracing::debug!("play config: {config:?}");

    let cancel = CancelToken::new();
    cancel.cancel_on_ctrlc()?;

    let mut player: RandomPlayer<Vec<f32>> = RandomPlayer::new(config).with_cancel_token(cancel);

    if let Some(path) = &args.log_path {
        let logger = CsvLogger::new(path.clone(), false, true);
        logger.check_can_log(true).map_err(|e| e.to_string())?;
        player = player.with_logger(Box::new(logger));
    } else if player.config().profile_timers {
        // nowhere to write timings, so echo them
        player = player.with_logger(Box::new(MemoryLogger::new(true)));
    }

    let mut env = args.make_env();
    let PlaySummary {
        steps,
        episodes,
        total_reward,
        interrupted,
    } = player.play(&mut *env)?;

    tracing::info!(
        steps,
        episodes,
        total_reward,
        interrupted,
        "random play finished"
    );

    Ok(())
}
