use core::fmt::Debug;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::{
    env::base::{DisplayInfo, EnvObservation},
    play::PlaySummary,
};

/// Hooks called by the play loop. Progress reporting lives here, so the loop
/// itself never decides how updates are presented.
pub trait Callback<O> {
    fn on_play_start(&mut self, steps: usize);
    /// Called once per completed iteration with the result of its `step`.
    fn on_step(&mut self, step: usize, env_obs: &EnvObservation<O>);
    fn on_play_end(&mut self, summary: &PlaySummary);
}

// A stub callback that does nothing.
pub struct EmptyCallback {}

impl<O> Callback<O> for EmptyCallback {
    fn on_play_start(&mut self, _steps: usize) {}

    fn on_step(&mut self, _step: usize, _env_obs: &EnvObservation<O>) {}

    fn on_play_end(&mut self, _summary: &PlaySummary) {}
}

/// Progress bar over the step budget. The bar message carries the reward and
/// info of the latest step.
pub struct ProgressBarCallback {
    bar: Option<ProgressBar>,
    draw_target: fn() -> ProgressDrawTarget,
}

impl Default for ProgressBarCallback {
    fn default() -> Self {
        Self {
            bar: None,
            draw_target: ProgressDrawTarget::stderr,
        }
    }
}

impl ProgressBarCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bar that tracks progress without drawing anything.
    pub fn hidden() -> Self {
        Self {
            bar: None,
            draw_target: ProgressDrawTarget::hidden,
        }
    }

    pub fn position(&self) -> Option<u64> {
        self.bar.as_ref().map(|b| b.position())
    }

    pub fn message(&self) -> Option<String> {
        self.bar.as_ref().map(|b| b.message())
    }
}

impl<O: Debug> Callback<O> for ProgressBarCallback {
    fn on_play_start(&mut self, steps: usize) {
        let style = ProgressStyle::default_bar()
            .template("{pos:>7}/{len:7} {bar} [{elapsed_precise}], eta: [{eta}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        let bar = ProgressBar::with_draw_target(Some(steps as u64), (self.draw_target)());
        bar.set_style(style);
        self.bar = Some(bar);
    }

    fn on_step(&mut self, _step: usize, env_obs: &EnvObservation<O>) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!(
                "reward={}, info={}",
                env_obs.reward,
                DisplayInfo(&env_obs.info)
            ));
            bar.inc(1);
        }
    }

    // the bar only fills up when every step of the budget was taken
    fn on_play_end(&mut self, summary: &PlaySummary) {
        if let Some(bar) = &self.bar {
            if !summary.interrupted && bar.length() == Some(summary.steps as u64) {
                bar.finish();
            } else {
                bar.abandon();
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Callback, ProgressBarCallback};
    use crate::{
        env::base::{EnvObservation, Info, InfoData},
        play::PlaySummary,
    };

    #[test]
    fn test_progress_bar_tracks_steps() {
        let mut cb = ProgressBarCallback::hidden();
        assert!(cb.position().is_none());

        Callback::<usize>::on_play_start(&mut cb, 3);

        let mut info: Info<usize> = Info::new();
        info.insert("lives".to_string(), InfoData::Int(2));
        let obs = EnvObservation {
            obs: 0usize,
            reward: 1.0,
            terminated: false,
            truncated: false,
            info,
        };

        cb.on_step(0, &obs);
        cb.on_step(1, &obs);

        assert_eq!(cb.position(), Some(2));
        assert_eq!(cb.message().unwrap(), "reward=1, info={lives: 2}");

        // a run that ended early leaves the bar where it stopped
        let summary = PlaySummary {
            steps: 2,
            ..Default::default()
        };
        Callback::<usize>::on_play_end(&mut cb, &summary);
        assert_eq!(cb.position(), Some(2));
    }

    #[test]
    fn test_progress_bar_finishes_full_run() {
        let mut cb = ProgressBarCallback::hidden();
        Callback::<usize>::on_play_start(&mut cb, 2);

        let obs = EnvObservation {
            obs: 0usize,
            reward: 0.0,
            terminated: false,
            truncated: false,
            info: Info::new(),
        };
        cb.on_step(0, &obs);
        cb.on_step(1, &obs);

        let summary = PlaySummary {
            steps: 2,
            ..Default::default()
        };
        Callback::<usize>::on_play_end(&mut cb, &summary);
        assert_eq!(cb.position(), Some(2));
        assert!(cb.bar.as_ref().unwrap().is_finished());
    }
}
