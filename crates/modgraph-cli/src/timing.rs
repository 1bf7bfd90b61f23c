//! Per-stage wall-clock timings for one invocation.
//!
//! A [`Timings`] value is created in `main` and passed to every command, so
//! nothing is recorded unless the caller asked for it and no state outlives
//! the run.

use std::fmt::Write as FmtWrite;
use std::time::{Duration, Instant};

/// Accumulated time spent in one named stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub name: &'static str,
    pub total: Duration,
    pub count: usize,
}

/// Stage timings in first-seen order.
#[derive(Debug, Default)]
pub struct Timings {
    enabled: bool,
    stages: Vec<StageTiming>,
}

/// Returns true when `MODGRAPH_TIMING` enables timing collection.
///
/// Supported truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("MODGRAPH_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(value.as_str()))
}

impl Timings {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stages: Vec::new(),
        }
    }

    /// Run `f`, charging its duration to `stage` when enabled.
    pub fn time<R>(&mut self, stage: &'static str, f: impl FnOnce() -> R) -> R {
        if !self.enabled {
            return f();
        }
        let started = Instant::now();
        let result = f();
        self.record(stage, started.elapsed());
        result
    }

    fn record(&mut self, stage: &'static str, elapsed: Duration) {
        if let Some(existing) = self.stages.iter_mut().find(|s| s.name == stage) {
            existing.total += elapsed;
            existing.count += 1;
        } else {
            self.stages.push(StageTiming {
                name: stage,
                total: elapsed,
                count: 1,
            });
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub const fn stages(&self) -> &[StageTiming] {
        self.stages.as_slice()
    }

    /// Render the stages as a simple table for terminal output.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.stages().is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("stage            count      total\n");
        out.push_str("----------------------------------\n");
        for stage in self.stages() {
            let _ = writeln!(
                out,
                "{:<16} {:>5} {:>10}",
                stage.name,
                stage.count,
                format_duration(stage.total)
            );
        }
        out
    }
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1_000_000 {
        let secs = micros / 1_000_000;
        let millis = (micros % 1_000_000) / 1_000;
        format!("{secs}.{millis:03}s")
    } else if micros >= 1_000 {
        let millis = micros / 1_000;
        let rem = micros % 1_000;
        format!("{millis}.{rem:03}ms")
    } else {
        format!("{micros}µs")
    }
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("1")
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
}
