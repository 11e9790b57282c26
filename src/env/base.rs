use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::common::{logger::LogData, spaces::Space};

#[derive(Debug, Clone)]
pub enum InfoData<O> {
    String(String),
    Float(f32),
    Int(i32),
    Obs(O),
    InfoDict(Info<O>),
}

pub type ResetOptions = HashMap<String, LogData>;
pub type Info<O> = HashMap<String, InfoData<O>>;

/// Formats an info map as `{key: value, ...}` with keys in sorted order,
/// so that consecutive progress updates are comparable.
pub struct DisplayInfo<'a, O>(pub &'a Info<O>);

impl<O: fmt::Debug> fmt::Display for DisplayInfo<'_, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.0.keys().collect();
        keys.sort();

        write!(f, "{{")?;
        for (i, k) in keys.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: ")?;
            match &self.0[k] {
                InfoData::String(s) => write!(f, "{s}")?,
                InfoData::Float(v) => write!(f, "{v}")?,
                InfoData::Int(v) => write!(f, "{v}")?,
                InfoData::Obs(o) => write!(f, "{o:?}")?,
                InfoData::InfoDict(d) => write!(f, "{}", DisplayInfo(d))?,
            }
        }
        write!(f, "}}")
    }
}

#[derive(Clone, Debug)]
pub struct EnvObservation<O> {
    pub obs: O,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info<O>,
}

impl<O> EnvObservation<O> {
    pub fn done(&self) -> bool {
        self.terminated | self.truncated
    }
}

#[derive(Clone, Debug, Copy)]
pub struct RewardRange {
    pub low: f32,
    pub high: f32,
}

impl Default for RewardRange {
    fn default() -> Self {
        Self {
            low: f32::NEG_INFINITY,
            high: f32::INFINITY,
        }
    }
}

/// Errors an environment can raise from any of its calls.
///
/// `Interrupted` is the cancellation signal: an environment blocked inside
/// `step` or `render` returns it when the user asks to stop, and drivers treat
/// it as a clean early exit rather than a failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("interrupted")]
    Interrupted,
    #[error("environment must be reset before stepping")]
    NeedsReset,
    #[error("action space is empty")]
    EmptyActionSpace,
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("render failed: {0}")]
    Render(String),
    #[error("{0}")]
    Other(String),
}

pub trait Env<O: Clone, A: Clone> {
    fn step(&mut self, action: &A) -> Result<EnvObservation<O>, EnvError>;
    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<ResetOptions>,
    ) -> Result<(O, Info<O>), EnvError>;
    fn action_space(&self) -> Box<dyn Space<A>>;
    fn observation_space(&self) -> Box<dyn Space<O>>;
    fn reward_range(&self) -> RewardRange;
    fn render(&mut self) -> Result<(), EnvError>;
    fn renderable(&self) -> bool;
    fn close(&mut self);
}
