// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-query stage timings

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Execution stage measured by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Parse,
    Plan,
    Match,
    Merge,
    Group,
    Sort,
    Project,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parse => "parse",
            Stage::Plan => "plan",
            Stage::Match => "match",
            Stage::Merge => "merge",
            Stage::Group => "group",
            Stage::Sort => "sort",
            Stage::Project => "project",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTiming {
    pub stage: Stage,
    pub duration: Duration,
}

impl StageTiming {
    /// Duration in milliseconds
    pub fn millis(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

/// Timing sink for one query execution
///
/// The engine records into it; callers read it back after execution.
#[derive(Debug, Default)]
pub struct QueryTelemetry {
    timings: Mutex<Vec<StageTiming>>,
    matched: AtomicU64,
}

impl QueryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, stage: Stage, duration: Duration) {
        self.timings.lock().push(StageTiming { stage, duration });
    }

    /// Run `f` and record its duration under `stage`
    pub fn time<T>(&self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record(stage, start.elapsed());
        result
    }

    pub fn set_matched(&self, matched: u64) {
        self.matched.store(matched, Ordering::Relaxed);
    }

    pub fn matched(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }

    pub fn timings(&self) -> Vec<StageTiming> {
        self.timings.lock().clone()
    }

    pub fn total(&self) -> Duration {
        self.timings.lock().iter().map(|t| t.duration).sum()
    }

    pub fn stage_duration(&self, stage: Stage) -> Option<Duration> {
        let timings = self.timings.lock();
        let mut found = timings.iter().filter(|t| t.stage == stage).peekable();
        found.peek()?;
        Some(found.map(|t| t.duration).sum())
    }

    /// Render a plain-text report
    pub fn format(&self) -> String {
        let mut out = String::new();
        for timing in self.timings() {
            out.push_str(&format!("{:<8} {:>10.3} ms\n", timing.stage, timing.millis()));
        }
        out.push_str(&format!(
            "{:<8} {:>10.3} ms\nmatched  {:>10}\n",
            "total",
            self.total().as_secs_f64() * 1000.0,
            self.matched()
        ));
        out
    }
}
