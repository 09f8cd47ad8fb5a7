// src/models/outcome.rs

use std::fmt;

/// Why an item was not acted upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Title or employer contains a blacklisted word
    BlacklistedWord(String),
    /// Item id is blacklisted
    BlacklistedId,
    /// Test run, nothing is sent
    TestRun,
    /// Created before the requested cut-off
    CreatedBefore,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::BlacklistedWord(word) => write!(f, "blacklist word '{word}'"),
            SkipReason::BlacklistedId => write!(f, "blacklist ID"),
            SkipReason::TestRun => write!(f, "test run"),
            SkipReason::CreatedBefore => write!(f, "created before cut-off"),
        }
    }
}

/// Classified result of acting on one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Remote action succeeded; `record_url` identifies the created record
    Applied { record_url: String },
    Skipped(SkipReason),
    /// Rejected by the remote side; the run continues
    SoftFailure(String),
    /// Remote quota is exhausted; the run must stop
    QuotaExceeded,
}

impl ActionOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ActionOutcome::QuotaExceeded)
    }
}
