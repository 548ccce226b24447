// src/progress.rs

//! Progress reporting for search fan-out
//!
//! A coordinator announces how many producers it expects and reports each
//! one as it finishes, so progress is counted in searched repositories.
//! Implementations:
//! - `SilentProgress`: counts only (nested coordinators, tests)
//! - `LogProgress`: a `tracing` line every tenth of the way for non-interactive runs
//! - `BarProgress`: an indicatif bar for terminals

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Progress sink shared between producer tasks
pub trait ProgressTracker: Send + Sync {
    /// A fan-out of `producers` tasks begins
    fn start(&self, producers: u64);

    /// One producer finished, successfully or not
    fn producer_done(&self);

    /// Producers finished since the last [`ProgressTracker::start`]
    fn completed(&self) -> u64;

    fn expected(&self) -> u64;

    /// The search ended with `summary`
    fn finish(&self, summary: &str);

    /// The search was given up because of `reason`
    fn abandon(&self, reason: &str);

    fn is_finished(&self) -> bool;
}

/// Shared counters of the non-drawing trackers
#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    expected: AtomicU64,
    finished: AtomicBool,
}

impl Counters {
    fn start(&self, producers: u64) {
        self.expected.store(producers, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
    }

    /// Returns `(before, after)` completion counts
    fn advance(&self) -> (u64, u64) {
        let before = self.completed.fetch_add(1, Ordering::Relaxed);
        (before, before + 1)
    }
}

/// Counts but never prints
#[derive(Debug, Default)]
pub struct SilentProgress {
    counters: Counters,
}

impl SilentProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressTracker for SilentProgress {
    fn start(&self, producers: u64) {
        self.counters.start(producers);
    }

    fn producer_done(&self) {
        self.counters.advance();
    }

    fn completed(&self) -> u64 {
        self.counters.completed.load(Ordering::Relaxed)
    }

    fn expected(&self) -> u64 {
        self.counters.expected.load(Ordering::Relaxed)
    }

    fn finish(&self, _summary: &str) {
        self.counters.finished.store(true, Ordering::Relaxed);
    }

    fn abandon(&self, _reason: &str) {
        self.counters.finished.store(true, Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.counters.finished.load(Ordering::Relaxed)
    }
}

/// Logs roughly every tenth of the way through
#[derive(Debug)]
pub struct LogProgress {
    distro: String,
    counters: Counters,
}

impl LogProgress {
    pub fn new(distro: impl Into<String>) -> Self {
        Self {
            distro: distro.into(),
            counters: Counters::default(),
        }
    }
}

impl ProgressTracker for LogProgress {
    fn start(&self, producers: u64) {
        self.counters.start(producers);
        info!("{}: searching {} repositories", self.distro, producers);
    }

    fn producer_done(&self) {
        let (before, after) = self.counters.advance();
        let expected = self.expected();
        if expected == 0 {
            return;
        }

        let step = std::cmp::max(1, expected / 10);
        if after / step > before / step || after == expected {
            info!("{}: {}/{} repositories searched", self.distro, after, expected);
        }
    }

    fn completed(&self) -> u64 {
        self.counters.completed.load(Ordering::Relaxed)
    }

    fn expected(&self) -> u64 {
        self.counters.expected.load(Ordering::Relaxed)
    }

    fn finish(&self, summary: &str) {
        self.counters.finished.store(true, Ordering::Relaxed);
        info!("{}: {}", self.distro, summary);
    }

    fn abandon(&self, reason: &str) {
        self.counters.finished.store(true, Ordering::Relaxed);
        warn!("{}: {}", self.distro, reason);
    }

    fn is_finished(&self) -> bool {
        self.counters.finished.load(Ordering::Relaxed)
    }
}

/// Terminal progress bar
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(distro: &str) -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} ({pos}/{len}) [{bar:30.cyan/dim}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        bar.set_style(style);
        bar.set_message(distro.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Bar that renders nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressTracker for BarProgress {
    fn start(&self, producers: u64) {
        self.bar.set_length(producers);
        self.bar.set_position(0);
    }

    fn producer_done(&self) {
        self.bar.inc(1);
    }

    fn completed(&self) -> u64 {
        self.bar.position()
    }

    fn expected(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }

    fn finish(&self, summary: &str) {
        self.bar.finish_with_message(summary.to_string());
    }

    fn abandon(&self, reason: &str) {
        self.bar.abandon_with_message(format!("{reason} [FAILED]"));
    }

    fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}
