// src/pipeline/apply.rs

//! Vacancy application pipeline.
//!
//! Per item: filter → apply → record. A quota error from the job board halts
//! the whole run; every other failure only affects its own item.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ActionOutcome, BlacklistSet, Config, SearchMode, SkipReason, Vacancy, WorkUnit};
use crate::pipeline::paginate::{fetch_page, run_paginated};
use crate::pipeline::{ItemFilter, RunReport, RunStats, UnitOutcome, UnitProcessor, WorkQueue, WorkerPool};
use crate::services::{HhClient, ItemAction, NotionClient, PageFetcher, ResultRecorder, VacancyListing};

/// Processes vacancy listing pages.
pub struct ApplyProcessor {
    fetcher: Arc<dyn PageFetcher<Vacancy>>,
    filter: ItemFilter,
    action: Arc<dyn ItemAction>,
    recorder: Arc<dyn ResultRecorder>,
    test_run: bool,
    stats: RunStats,
}

impl ApplyProcessor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher<Vacancy>>,
        filter: ItemFilter,
        action: Arc<dyn ItemAction>,
        recorder: Arc<dyn ResultRecorder>,
        test_run: bool,
    ) -> Self {
        Self {
            fetcher,
            filter,
            action,
            recorder,
            test_run,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Run one vacancy through the pipeline.
    pub async fn process_item(&self, vacancy: &Vacancy, prefix: &str) -> ActionOutcome {
        RunStats::incr(&self.stats.items_seen);

        if let Some(reason) = self.filter.check(vacancy) {
            RunStats::incr(&self.stats.skipped);
            log::info!("{} SKIPPED due to {}", prefix, reason);
            return ActionOutcome::Skipped(reason);
        }
        if self.test_run {
            RunStats::incr(&self.stats.skipped);
            log::info!("{} TEST RUN", prefix);
            return ActionOutcome::Skipped(SkipReason::TestRun);
        }

        let outcome = match self.action.act(vacancy).await {
            Ok(outcome) => outcome,
            Err(e) => ActionOutcome::SoftFailure(e.to_string()),
        };

        match &outcome {
            ActionOutcome::Applied { record_url } => {
                RunStats::incr(&self.stats.succeeded);
                log::info!(
                    "{} APPLIED successfully, GOT negotiation url: {}",
                    prefix,
                    record_url
                );
                record(self.recorder.as_ref(), vacancy, record_url, prefix, &self.stats).await;
            }
            ActionOutcome::SoftFailure(message) => {
                RunStats::incr(&self.stats.failed);
                log::error!("{} apply FAILED with error: {}", prefix, message);
            }
            ActionOutcome::QuotaExceeded => {
                log::error!("{} LIMIT EXCEEDED. Stopping...", prefix);
            }
            ActionOutcome::Skipped(_) => {}
        }
        outcome
    }
}

#[async_trait]
impl UnitProcessor<WorkUnit> for ApplyProcessor {
    async fn process(&self, unit: WorkUnit, queue: &WorkQueue<WorkUnit>) -> UnitOutcome {
        let vacancies = fetch_page(self.fetcher.as_ref(), unit, queue, "vacancies", &self.stats).await;

        for (idx, vacancy) in vacancies.iter().enumerate() {
            let prefix = item_prefix(unit.page, idx, vacancy);
            if self.process_item(vacancy, &prefix).await.is_fatal() {
                return UnitOutcome::Halt;
            }
        }
        UnitOutcome::Completed
    }
}

/// Log prefix identifying one item of one page.
pub(crate) fn item_prefix(page: u32, idx: usize, vacancy: &Vacancy) -> String {
    format!(
        "Page={:02} idx={:02}: {} {} {}",
        page,
        idx,
        vacancy.id,
        vacancy.name,
        vacancy.employer_name()
    )
}

/// Record a successful action; failures are logged and swallowed.
pub(crate) async fn record(
    recorder: &dyn ResultRecorder,
    vacancy: &Vacancy,
    record_url: &str,
    prefix: &str,
    stats: &RunStats,
) {
    if !recorder.is_enabled() {
        return;
    }
    match recorder.record(vacancy, record_url).await {
        Ok(()) => {
            RunStats::incr(&stats.recorded);
            log::info!("{} NOTION: page created", prefix);
        }
        Err(e) => {
            RunStats::incr(&stats.record_failed);
            log::error!("{} NOTION: Could not create a page: {}", prefix, e);
        }
    }
}

/// Apply to every eligible vacancy of the selected listing.
pub async fn run_apply(
    config: &Config,
    mode: SearchMode,
    workers: usize,
    test_run: bool,
) -> Result<RunReport> {
    config.require_hh_credentials()?;
    let pool = WorkerPool::new(workers)?;

    let blacklist = Arc::new(BlacklistSet::load(&config.apply)?);
    let hh = HhClient::new(config.hh.clone(), config.apply.load_cover_letter()?)?;
    let notion = NotionClient::new(config.notion.clone(), config.hh.timeout_secs)?;
    if !notion.is_enabled() {
        log::info!("NOTION: Notion is disabled");
    }
    if test_run {
        log::info!("Test run: no applications will be sent");
    }

    let listing = VacancyListing::new(hh.clone(), mode, config.search.clone());
    let processor = Arc::new(ApplyProcessor::new(
        Arc::new(listing),
        ItemFilter::new(blacklist),
        Arc::new(hh),
        Arc::new(notion),
        test_run,
    ));

    let report = run_paginated(pool, Arc::clone(&processor)).await;
    processor.stats().log_summary("Apply", "applied", &report);
    Ok(report)
}

/// Apply to the first vacancy of page 0 and record it.
///
/// Returns `None` when the listing is empty.
pub async fn run_apply_one(config: &Config, mode: SearchMode) -> Result<Option<ActionOutcome>> {
    config.require_hh_credentials()?;
    let hh = HhClient::new(config.hh.clone(), config.apply.load_cover_letter()?)?;
    let notion = NotionClient::new(config.notion.clone(), config.hh.timeout_secs)?;
    let listing = VacancyListing::new(hh.clone(), mode, config.search.clone());

    let page = listing.fetch(0).await?;
    let Some(vacancy) = page.items.first() else {
        log::warn!("Listing is empty, nothing to apply to");
        return Ok(None);
    };

    let processor = ApplyProcessor::new(
        Arc::new(listing),
        ItemFilter::new(Arc::new(BlacklistSet::default())),
        Arc::new(hh),
        Arc::new(notion),
        false,
    );
    let outcome = processor
        .process_item(vacancy, &item_prefix(0, 0, vacancy))
        .await;
    Ok(Some(outcome))
}
