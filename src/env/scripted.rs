use crate::common::spaces::{BoxSpace, Discrete, Space};

use super::base::{Env, EnvError, EnvObservation, Info, InfoData, ResetOptions, RewardRange};

/// A call made on a [`ScriptedEnv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Reset,
    Step,
    Render,
    Close,
}

/// Deterministic environment for checking drivers.
///
/// Every call is recorded in order. Each step pays a reward of 1 and observes
/// the number of steps taken so far. Episodes end only where scripted:
/// `terminate_at` and `truncate_at` take 1-based step numbers counted over the
/// whole run. `fail_on` makes the n-th call of a kind return an error; the call
/// is still recorded.
#[derive(Debug, Clone)]
pub struct ScriptedEnv {
    n_actions: usize,
    calls: Vec<Call>,
    steps: usize,
    terminate_at: Vec<usize>,
    truncate_at: Vec<usize>,
    fail: Option<(Call, usize, EnvError)>,
    panic_on_step: Option<usize>,
    renderable: bool,
    needs_reset: bool,
}

impl ScriptedEnv {
    pub fn new(n_actions: usize) -> Self {
        Self {
            n_actions,
            calls: Vec::new(),
            steps: 0,
            terminate_at: Vec::new(),
            truncate_at: Vec::new(),
            fail: None,
            panic_on_step: None,
            renderable: true,
            needs_reset: true,
        }
    }

    pub fn terminate_at(mut self, steps: &[usize]) -> Self {
        self.terminate_at = steps.to_vec();
        self
    }

    pub fn truncate_at(mut self, steps: &[usize]) -> Self {
        self.truncate_at = steps.to_vec();
        self
    }

    pub fn fail_on(mut self, call: Call, nth: usize, err: EnvError) -> Self {
        self.fail = Some((call, nth, err));
        self
    }

    pub fn panic_on_step(mut self, nth: usize) -> Self {
        self.panic_on_step = Some(nth);
        self
    }

    pub fn with_renderable(mut self, renderable: bool) -> Self {
        self.renderable = renderable;
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    fn enter(&mut self, call: Call) -> Result<(), EnvError> {
        self.calls.push(call);

        match &self.fail {
            Some((c, nth, err)) if *c == call && self.count(call) == *nth => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

impl Env<usize, usize> for ScriptedEnv {
    fn step(&mut self, action: &usize) -> Result<EnvObservation<usize>, EnvError> {
        self.enter(Call::Step)?;

        if self.panic_on_step == Some(self.count(Call::Step)) {
            panic!("scripted panic");
        }

        if self.needs_reset {
            return Err(EnvError::NeedsReset);
        }

        if *action >= self.n_actions {
            return Err(EnvError::InvalidAction(format!(
                "{action} not in [0, {})",
                self.n_actions
            )));
        }

        self.steps += 1;
        let terminated = self.terminate_at.contains(&self.steps);
        let truncated = self.truncate_at.contains(&self.steps);
        self.needs_reset = terminated | truncated;

        let mut info = Info::new();
        info.insert("action".to_string(), InfoData::Int(*action as i32));

        Ok(EnvObservation {
            obs: self.steps,
            reward: 1.0,
            terminated,
            truncated,
            info,
        })
    }

    fn reset(
        &mut self,
        _seed: Option<u64>,
        _options: Option<ResetOptions>,
    ) -> Result<(usize, Info<usize>), EnvError> {
        self.enter(Call::Reset)?;
        self.needs_reset = false;

        Ok((self.steps, Info::new()))
    }

    fn action_space(&self) -> Box<dyn Space<usize>> {
        Box::new(Discrete::from(self.n_actions))
    }

    fn observation_space(&self) -> Box<dyn Space<usize>> {
        Box::new(Discrete::from(usize::MAX))
    }

    fn reward_range(&self) -> RewardRange {
        RewardRange {
            low: 1.0,
            high: 1.0,
        }
    }

    fn render(&mut self) -> Result<(), EnvError> {
        self.enter(Call::Render)
    }

    fn renderable(&self) -> bool {
        self.renderable
    }

    fn close(&mut self) {
        self.calls.push(Call::Close);
    }
}

/// One action, a single continuous observation in `[0, 1]`, one step long,
/// +1 reward. The smallest environment a driver can play.
#[derive(Debug, Default, Clone, Copy)]
pub struct OneStepEnv {}

impl Env<Vec<f32>, usize> for OneStepEnv {
    fn step(&mut self, _action: &usize) -> Result<EnvObservation<Vec<f32>>, EnvError> {
        Ok(EnvObservation {
            obs: self.observation_space().sample(),
            reward: 1.0,
            terminated: true,
            truncated: false,
            info: Info::new(),
        })
    }

    fn reset(
        &mut self,
        _seed: Option<u64>,
        _options: Option<ResetOptions>,
    ) -> Result<(Vec<f32>, Info<Vec<f32>>), EnvError> {
        Ok((self.observation_space().sample(), Info::new()))
    }

    fn action_space(&self) -> Box<dyn Space<usize>> {
        Box::new(Discrete::from(1))
    }

    fn observation_space(&self) -> Box<dyn Space<Vec<f32>>> {
        Box::new(BoxSpace::from((vec![0.0], vec![1.0])))
    }

    fn reward_range(&self) -> RewardRange {
        RewardRange {
            low: 1.0,
            high: 1.0,
        }
    }

    fn render(&mut self) -> Result<(), EnvError> {
        Ok(())
    }

    fn renderable(&self) -> bool {
        false
    }

    fn close(&mut self) {}
}

#[cfg(test)]
mod test {
    use super::{Call, OneStepEnv, ScriptedEnv};
    use crate::env::base::{Env, EnvError};

    #[test]
    fn test_step_without_reset_errors() {
        let mut env = ScriptedEnv::new(2);

        assert_eq!(env.step(&0).unwrap_err(), EnvError::NeedsReset);
    }

    #[test]
    fn test_invalid_action_errors() {
        let mut env = ScriptedEnv::new(2);
        env.reset(None, None).unwrap();

        assert!(matches!(env.step(&2), Err(EnvError::InvalidAction(_))));
    }

    #[test]
    fn test_scripted_termination() {
        let mut env = ScriptedEnv::new(2).terminate_at(&[2]);
        env.reset(None, None).unwrap();

        assert!(!env.step(&0).unwrap().terminated);
        assert!(env.step(&1).unwrap().terminated);
        assert_eq!(env.step(&1).unwrap_err(), EnvError::NeedsReset);

        env.reset(None, None).unwrap();
        let obs = env.step(&0).unwrap();
        assert_eq!(obs.obs, 3);
        assert!(!obs.terminated);
    }

    #[test]
    fn test_scripted_failure_is_recorded() {
        let mut env = ScriptedEnv::new(2).fail_on(Call::Render, 2, EnvError::Interrupted);

        assert!(env.render().is_ok());
        assert_eq!(env.render().unwrap_err(), EnvError::Interrupted);
        assert!(env.render().is_ok());
        assert_eq!(env.count(Call::Render), 3);
    }

    #[test]
    fn test_one_step_env() {
        let mut env = OneStepEnv::default();
        let (obs, _) = env.reset(None, None).unwrap();
        assert!(env.observation_space().contains(&obs));

        let step = env.step(&env.action_space().sample()).unwrap();
        assert!(step.terminated);
        assert_eq!(step.reward, 1.0);
    }
}
