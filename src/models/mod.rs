// src/models/mod.rs

//! Domain models for the applier.
//!
//! This module contains the data structures shared by the transports and the
//! pipeline, organized by their primary purpose.

mod blacklist;
mod config;
mod listing;
mod outcome;

// Re-export all public types
pub use blacklist::BlacklistSet;
pub use config::{ApplyConfig, Config, HhConfig, NotionConfig, SearchConfig};
pub use listing::{
    Employer, ListingPage, MessageAuthor, Negotiation, NegotiationMessage, NegotiationRecord,
    NegotiationState, Vacancy, WorkUnit,
};
pub use outcome::{ActionOutcome, SkipReason};

/// Which listing the apply run walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SearchMode {
    /// Vacancies similar to the configured resume
    Similar,
    /// Vacancy search with the `[search]` parameters
    Query,
}
