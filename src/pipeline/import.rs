// src/pipeline/import.rs

//! Copies existing job board applications into Notion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::error::Result;
use crate::models::{ActionOutcome, Config, Negotiation, SkipReason, WorkUnit};
use crate::pipeline::apply::{item_prefix, record};
use crate::pipeline::paginate::{fetch_page, run_paginated};
use crate::pipeline::{RunReport, RunStats, UnitOutcome, UnitProcessor, WorkQueue, WorkerPool};
use crate::services::{HhClient, NegotiationListing, NotionClient, PageFetcher, ResultRecorder};

pub struct ImportProcessor {
    fetcher: Arc<dyn PageFetcher<Negotiation>>,
    recorder: Arc<dyn ResultRecorder>,
    since: Option<DateTime<FixedOffset>>,
    test_run: bool,
    stats: RunStats,
}

impl ImportProcessor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher<Negotiation>>,
        recorder: Arc<dyn ResultRecorder>,
        since: Option<DateTime<FixedOffset>>,
        test_run: bool,
    ) -> Self {
        Self {
            fetcher,
            recorder,
            since,
            test_run,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    async fn process_item(&self, negotiation: &Negotiation, prefix: &str) -> ActionOutcome {
        RunStats::incr(&self.stats.items_seen);

        if self.since.is_some_and(|since| negotiation.created_at < since) {
            RunStats::incr(&self.stats.skipped);
            log::info!("{} SKIPPED due to {}", prefix, SkipReason::CreatedBefore);
            return ActionOutcome::Skipped(SkipReason::CreatedBefore);
        }
        if self.test_run {
            RunStats::incr(&self.stats.skipped);
            log::info!("{} TEST RUN, created at {}", prefix, negotiation.created_at);
            return ActionOutcome::Skipped(SkipReason::TestRun);
        }

        let record_url = negotiation.url();
        RunStats::incr(&self.stats.succeeded);
        record(
            self.recorder.as_ref(),
            &negotiation.vacancy,
            &record_url,
            prefix,
            &self.stats,
        )
        .await;
        ActionOutcome::Applied { record_url }
    }
}

#[async_trait]
impl UnitProcessor<WorkUnit> for ImportProcessor {
    async fn process(&self, unit: WorkUnit, queue: &WorkQueue<WorkUnit>) -> UnitOutcome {
        let negotiations =
            fetch_page(self.fetcher.as_ref(), unit, queue, "negotiations", &self.stats).await;

        for (idx, negotiation) in negotiations.iter().enumerate() {
            let prefix = item_prefix(unit.page, idx, &negotiation.vacancy);
            self.process_item(negotiation, &prefix).await;
        }
        UnitOutcome::Completed
    }
}

/// Record every negotiation created at or after `since` in Notion.
pub async fn run_import(
    config: &Config,
    workers: usize,
    since: Option<DateTime<FixedOffset>>,
    test_run: bool,
) -> Result<RunReport> {
    config.require_hh_credentials()?;
    let pool = WorkerPool::new(workers)?;

    let notion = NotionClient::new(config.notion.clone(), config.hh.timeout_secs)?;
    if !test_run {
        notion.require_enabled()?;
    }
    let hh = HhClient::new(config.hh.clone(), "")?;

    let processor = Arc::new(ImportProcessor::new(
        Arc::new(NegotiationListing::new(hh)),
        Arc::new(notion),
        since,
        test_run,
    ));
    let report = run_paginated(pool, Arc::clone(&processor)).await;
    processor.stats().log_summary("Import", "imported", &report);
    Ok(report)
}
