//! Random play: drive an environment with uniformly sampled actions.
//!
//! The loop resets whenever the previous episode ended, samples an action from
//! the environment's action space, steps, reports the step through a
//! [`Callback`] and renders. It stops after the configured number of steps,
//! when the [`CancelToken`] is cancelled, or when the environment returns
//! [`EnvError::Interrupted`]. The environment is closed exactly once on every
//! exit path.

mod config;

pub use config::{ConfigError, PlayConfig};

use core::fmt::Debug;
use std::time::Instant;

use thiserror::Error;

use crate::{
    common::{
        callback::{Callback, EmptyCallback, ProgressBarCallback},
        cancel::CancelToken,
        logger::{LogData, LogItem, Logger, MemoryLogger},
        spaces::seed_spaces_rng,
        timer::Profiler,
    },
    env::base::{Env, EnvError},
};

#[derive(Error, Debug)]
pub enum PlayError {
    #[error("environment failed: {0}")]
    Env(#[from] EnvError),
}

/// What a run did before it stopped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaySummary {
    /// Successful calls to `step`
    pub steps: usize,
    /// Episodes started, i.e. calls to `reset` that succeeded
    pub episodes: usize,
    pub total_reward: f32,
    /// Whether the run stopped early because of a cancellation
    pub interrupted: bool,
}

/// Plays `env` for `steps` random steps with a progress bar, rendering after
/// every step. Environments whose `renderable` is false are never rendered.
/// An interrupt ends the run early without error.
pub fn play_random<O, A>(env: &mut dyn Env<O, A>, steps: usize) -> Result<(), PlayError>
where
    O: Clone + Debug,
    A: Clone,
{
    RandomPlayer::new(PlayConfig::new().with_steps(steps))
        .play(env)
        .map(|_| ())
}

// Closes the environment when dropped, including during unwinding.
struct CloseOnDrop<'a, O: Clone, A: Clone> {
    env: &'a mut dyn Env<O, A>,
}

impl<O: Clone, A: Clone> Drop for CloseOnDrop<'_, O, A> {
    fn drop(&mut self) {
        tracing::debug!("closing environment");
        self.env.close();
    }
}

struct Episode {
    reward: f32,
    len: usize,
    start: Instant,
}

impl Episode {
    fn new() -> Self {
        Self {
            reward: 0.0,
            len: 0,
            start: Instant::now(),
        }
    }

    fn fps(&self) -> Option<f32> {
        steps_per_sec(self.len, self.start.elapsed().as_secs_f32())
    }
}

// None when no measurable time has passed
fn steps_per_sec(steps: usize, secs: f32) -> Option<f32> {
    Some(secs).filter(|s| *s > 0.0).map(|s| steps as f32 / s)
}

pub struct RandomPlayer<O> {
    config: PlayConfig,
    cancel: CancelToken,
    callback: Box<dyn Callback<O>>,
    logger: Box<dyn Logger>,
}

impl<O: Clone + Debug> RandomPlayer<O> {
    pub fn new(config: PlayConfig) -> Self {
        let callback: Box<dyn Callback<O>> = if config.progress {
            Box::new(ProgressBarCallback::new())
        } else {
            Box::new(EmptyCallback {})
        };

        Self {
            config,
            cancel: CancelToken::new(),
            callback,
            logger: Box::new(MemoryLogger::new(false)),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_callback(mut self, callback: Box<dyn Callback<O>>) -> Self {
        self.callback = callback;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &PlayConfig {
        &self.config
    }

    /// Renders after each step only when `config.render` is set and
    /// `env.renderable()` is true.
    pub fn play<A: Clone>(&mut self, env: &mut dyn Env<O, A>) -> Result<PlaySummary, PlayError> {
        let guard = CloseOnDrop { env };

        if let Some(seed) = self.config.seed {
            seed_spaces_rng(seed);
        }

        tracing::debug!(steps = self.config.steps, "starting random play");
        self.callback.on_play_start(self.config.steps);

        let mut summary = PlaySummary::default();
        let result = match self.run(&mut *guard.env, &mut summary) {
            Err(EnvError::Interrupted) => {
                tracing::info!(steps = summary.steps, "random play interrupted");
                summary.interrupted = true;
                Ok(())
            }
            other => other,
        };

        drop(guard);

        self.callback.on_play_end(&summary);
        self.logger.log(
            LogItem::default()
                .push(
                    "total_steps".to_string(),
                    LogData::Int(summary.steps as i32),
                )
                .push(
                    "episodes".to_string(),
                    LogData::Int(summary.episodes as i32),
                )
                .push(
                    "total_reward".to_string(),
                    LogData::Float(summary.total_reward),
                ),
        );
        if let Err(e) = self.logger.dump() {
            tracing::warn!("failed to dump logs: {e}");
        }

        match result {
            Ok(()) => Ok(summary),
            Err(e) => {
                tracing::error!(steps = summary.steps, "random play failed: {e}");
                Err(e.into())
            }
        }
    }

    fn run<A: Clone>(
        &mut self,
        env: &mut dyn Env<O, A>,
        summary: &mut PlaySummary,
    ) -> Result<(), EnvError> {
        let render = self.config.render && env.renderable();
        let mut prof = Profiler::new(self.config.profile_timers);
        let mut episode = Episode::new();

        // the first iteration always resets
        let mut terminated = true;
        let mut truncated = true;

        for i in 0..self.config.steps {
            if self.cancel.is_cancelled() {
                return Err(EnvError::Interrupted);
            }

            let loop_start = Instant::now();

            if terminated | truncated {
                // only the first episode gets the seed
                let seed = if summary.episodes == 0 {
                    self.config.seed
                } else {
                    None
                };
                let (_obs, _info) = prof.time("reset", || env.reset(seed, None))?;

                summary.episodes += 1;
                episode = Episode::new();
                tracing::debug!(step = i, episode = summary.episodes, "environment reset");
            }

            let mut space = env.action_space();
            if space.is_empty() {
                return Err(EnvError::EmptyActionSpace);
            }
            let action = prof.time("sample", || space.sample());
            let step_res = prof.time("step", || env.step(&action))?;

            terminated = step_res.terminated;
            truncated = step_res.truncated;
            summary.steps += 1;
            summary.total_reward += step_res.reward;
            episode.reward += step_res.reward;
            episode.len += 1;

            self.callback.on_step(i, &step_res);

            if render {
                prof.time("render", || env.render())?;
            }

            if step_res.done() {
                let mut item = LogItem::default()
                    .push("global_step".to_string(), LogData::Int(i as i32))
                    .push(
                        "ep_num".to_string(),
                        LogData::Int(summary.episodes as i32 - 1),
                    )
                    .push("ep_reward".to_string(), LogData::Float(episode.reward))
                    .push("ep_len".to_string(), LogData::Int(episode.len as i32));
                if let Some(fps) = episode.fps() {
                    item = item.push("ep_fps".to_string(), LogData::Float(fps));
                }
                self.logger.log(item);
            }

            if prof.enabled() {
                prof.record("loop", loop_start.elapsed().as_secs_f64());

                let every = self.config.profile_log_every_steps;
                if every > 0 && (i + 1) % every == 0 {
                    if let Some(item) = prof.to_logitem(i) {
                        self.logger.log(item);
                    }
                    prof.reset();
                }
            }
        }

        Ok(())
    }
}
