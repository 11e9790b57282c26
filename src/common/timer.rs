use std::collections::BTreeMap;
use std::time::Instant;

use crate::common::logger::{LogData, LogItem};

/// Per-phase profiler for the play loop.
///
/// Phases are recorded by name, either from a closure with `time` or from a
/// measured duration with `record`. `to_logitem` averages each phase over the
/// current interval in milliseconds; `reset` starts a new interval.
/// A disabled profiler records nothing and never produces a log item.
#[derive(Default, Debug, Clone)]
pub struct Profiler {
    enabled: bool,
    // phase -> (total seconds, samples)
    phases: BTreeMap<&'static str, (f64, usize)>,
}

impl Profiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, name: &'static str, secs: f64) {
        if !self.enabled {
            return;
        }
        let entry = self.phases.entry(name).or_insert((0.0, 0));
        entry.0 += secs;
        entry.1 += 1;
    }

    pub fn time<T, F: FnOnce() -> T>(&mut self, name: &'static str, f: F) -> T {
        if !self.enabled {
            return f();
        }
        let t0 = Instant::now();
        let out = f();
        self.record(name, t0.elapsed().as_secs_f64());
        out
    }

    /// Average of a phase in milliseconds, if it was recorded this interval.
    pub fn avg_ms(&self, name: &str) -> Option<f64> {
        self.phases
            .get(name)
            .filter(|(_, n)| *n > 0)
            .map(|(sum, n)| sum / (*n as f64) * 1000.0)
    }

    /// Keys look like `avg_step_ms`. When a `loop` phase was recorded,
    /// `steps_per_sec` is derived from it.
    pub fn to_logitem(&self, step: usize) -> Option<LogItem> {
        if !self.enabled || self.phases.is_empty() {
            return None;
        }

        let mut item =
            LogItem::default().push("global_step".to_string(), LogData::Int(step as i32));

        for name in self.phases.keys() {
            if let Some(ms) = self.avg_ms(name) {
                item = item.push(format!("avg_{name}_ms"), LogData::Float(ms as f32));
            }
        }

        if let Some(loop_ms) = self.avg_ms("loop").filter(|ms| *ms > 0.0) {
            item = item.push(
                "steps_per_sec".to_string(),
                LogData::Float((1000.0 / loop_ms) as f32),
            );
        }

        Some(item)
    }

    pub fn reset(&mut self) {
        self.phases.clear();
    }
}

#[cfg(test)]
mod test {
    use assert_approx_eq::assert_approx_eq;

    use super::Profiler;
    use crate::common::logger::LogData;

    #[test]
    fn test_disabled_profiler_is_noop() {
        let mut prof = Profiler::new(false);
        prof.record("step", 1.0);
        let out = prof.time("render", || 5);

        assert_eq!(out, 5);
        assert!(prof.avg_ms("step").is_none());
        assert!(prof.to_logitem(0).is_none());
    }

    #[test]
    fn test_averages() {
        let mut prof = Profiler::new(true);
        prof.record("step", 0.002);
        prof.record("step", 0.004);
        prof.record("loop", 0.010);

        assert_approx_eq!(prof.avg_ms("step").unwrap(), 3.0, 1e-9);

        let item = prof.to_logitem(9).unwrap();
        assert_eq!(item.get("global_step"), Some(&LogData::Int(9)));
        match item.get("steps_per_sec") {
            Some(LogData::Float(sps)) => assert_approx_eq!(*sps, 100.0, 1e-3),
            other => panic!("unexpected steps_per_sec: {other:?}"),
        }

        prof.reset();
        assert!(prof.to_logitem(10).is_none());
    }
}
