// src/pipeline/stats.rs

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::pipeline::RunReport;

/// Counters shared by the workers of one run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub pages_fetched: AtomicUsize,
    pub pages_failed: AtomicUsize,
    pub items_seen: AtomicUsize,
    pub succeeded: AtomicUsize,
    pub skipped: AtomicUsize,
    pub failed: AtomicUsize,
    pub recorded: AtomicUsize,
    pub record_failed: AtomicUsize,
}

/// Plain copy of `RunStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub items_seen: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub recorded: usize,
    pub record_failed: usize,
}

impl RunStats {
    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            items_seen: self.items_seen.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            recorded: self.recorded.load(Ordering::Relaxed),
            record_failed: self.record_failed.load(Ordering::Relaxed),
        }
    }

    /// Log a one-line summary of the run.
    pub fn log_summary(&self, title: &str, success_label: &str, report: &RunReport) {
        let s = self.snapshot();
        log::info!(
            "{} finished: units={} pages={} (failed {}) items={} {}={} skipped={} failed={} recorded={} (failed {})",
            title,
            report.units_processed,
            s.pages_fetched,
            s.pages_failed,
            s.items_seen,
            success_label,
            s.succeeded,
            s.skipped,
            s.failed,
            s.recorded,
            s.record_failed
        );
        if report.units_panicked > 0 {
            log::warn!("{} units panicked while processing", report.units_panicked);
        }
        if report.halted {
            log::warn!(
                "{} stopped early, {} queued units were not processed",
                title,
                report.units_discarded
            );
        }
    }
}
