//! Service layer for the applier.
//!
//! This module contains the remote transports:
//! - Listing pages of vacancies and negotiations (`PageFetcher`)
//! - Applying to a vacancy (`ItemAction`)
//! - Recording applications in Notion (`ResultRecorder`)

mod hh;
mod notion;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ActionOutcome, ListingPage, Vacancy};

pub use hh::{HhClient, NegotiationListing, VacancyListing, classify_apply_response};
pub use notion::{NotionClient, STATUS_APPLIED, STATUS_UNSUCCESSFUL, STATUS_WRONG};

/// Fetches one page of a paginated listing.
#[async_trait]
pub trait PageFetcher<I>: Send + Sync {
    /// Fetch page `page` (zero based).
    ///
    /// A non-success status is returned as `AppError::Status`.
    async fn fetch(&self, page: u32) -> Result<ListingPage<I>>;
}

/// Performs the side-effecting action on one eligible vacancy.
#[async_trait]
pub trait ItemAction: Send + Sync {
    async fn act(&self, vacancy: &Vacancy) -> Result<ActionOutcome>;
}

/// Persists a successful action into the secondary system.
#[async_trait]
pub trait ResultRecorder: Send + Sync {
    /// Whether `record` does anything at all.
    fn is_enabled(&self) -> bool;

    async fn record(&self, vacancy: &Vacancy, record_url: &str) -> Result<()>;
}
