// src/pipeline/maintenance.rs

//! Commands that keep Notion and the job board in sync.
//!
//! `rejections` and `remove` work on a queue pre-filled from a Notion query;
//! `messages` is a one-shot copy of a negotiation thread.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Config, NegotiationRecord};
use crate::pipeline::{RunReport, RunStats, UnitOutcome, UnitProcessor, WorkQueue, WorkerPool};
use crate::services::{HhClient, NotionClient, STATUS_APPLIED, STATUS_UNSUCCESSFUL, STATUS_WRONG};

/// Negotiation state the job board uses for a rejection.
const STATE_DISCARD: &str = "discard";

/// Marks Notion pages as Unsuccessful once the employer rejected them.
pub struct RejectionProcessor {
    hh: HhClient,
    notion: NotionClient,
    stats: RunStats,
}

impl RejectionProcessor {
    pub fn new(hh: HhClient, notion: NotionClient) -> Self {
        Self {
            hh,
            notion,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    async fn check(&self, record: &NegotiationRecord) -> Result<bool> {
        let state = self.hh.negotiation_state(&record.negotiation_url).await?;
        if state.as_deref() != Some(STATE_DISCARD) {
            return Ok(false);
        }
        self.notion
            .set_status(&record.page_id, STATUS_UNSUCCESSFUL)
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl UnitProcessor<NegotiationRecord> for RejectionProcessor {
    async fn process(
        &self,
        record: NegotiationRecord,
        _queue: &WorkQueue<NegotiationRecord>,
    ) -> UnitOutcome {
        RunStats::incr(&self.stats.items_seen);
        match self.check(&record).await {
            Ok(true) => {
                RunStats::incr(&self.stats.succeeded);
                log::info!("{} marked as {}", record.negotiation_url, STATUS_UNSUCCESSFUL);
            }
            Ok(false) => {
                RunStats::incr(&self.stats.skipped);
                log::debug!("{} is still active", record.negotiation_url);
            }
            Err(e) => {
                RunStats::incr(&self.stats.failed);
                log::error!("{} rejection check FAILED: {}", record.negotiation_url, e);
            }
        }
        UnitOutcome::Completed
    }
}

/// Withdraws negotiations marked Wrong and archives their pages.
pub struct RemovalProcessor {
    hh: HhClient,
    notion: NotionClient,
    stats: RunStats,
}

impl RemovalProcessor {
    pub fn new(hh: HhClient, notion: NotionClient) -> Self {
        Self {
            hh,
            notion,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    async fn remove(&self, record: &NegotiationRecord) -> Result<()> {
        let id = record.negotiation_id();
        if id.is_empty() {
            return Err(AppError::validation(format!(
                "no negotiation id in {}",
                record.negotiation_url
            )));
        }
        self.hh.delete_negotiation(id).await?;
        self.notion.archive_page(&record.page_id).await
    }
}

#[async_trait]
impl UnitProcessor<NegotiationRecord> for RemovalProcessor {
    async fn process(
        &self,
        record: NegotiationRecord,
        _queue: &WorkQueue<NegotiationRecord>,
    ) -> UnitOutcome {
        RunStats::incr(&self.stats.items_seen);
        match self.remove(&record).await {
            Ok(()) => {
                RunStats::incr(&self.stats.succeeded);
                log::info!("{} removed", record.negotiation_url);
            }
            Err(e) => {
                RunStats::incr(&self.stats.failed);
                log::error!("{} removal FAILED: {}", record.negotiation_url, e);
            }
        }
        UnitOutcome::Completed
    }
}

/// Queue every record up front; these runs never expand.
fn prefilled(records: Vec<NegotiationRecord>) -> Result<Arc<WorkQueue<NegotiationRecord>>> {
    let queue = Arc::new(WorkQueue::new());
    for record in records {
        queue.put(record)?;
    }
    Ok(queue)
}

fn clients(config: &Config) -> Result<(HhClient, NotionClient)> {
    config.require_hh_credentials()?;
    let notion = NotionClient::new(config.notion.clone(), config.hh.timeout_secs)?;
    notion.require_enabled()?;
    let hh = HhClient::new(config.hh.clone(), "")?;
    Ok((hh, notion))
}

/// Mark applications the employer rejected as Unsuccessful.
pub async fn run_rejections(config: &Config, workers: usize) -> Result<RunReport> {
    let pool = WorkerPool::new(workers)?;
    let (hh, notion) = clients(config)?;

    let records = notion.query_by_status(STATUS_APPLIED).await?;
    log::info!("Got {} applications to check", records.len());

    let processor = Arc::new(RejectionProcessor::new(hh, notion));
    let report = pool.run(prefilled(records)?, Arc::clone(&processor)).await;
    processor.stats().log_summary("Rejections", "rejected", &report);
    Ok(report)
}

/// Withdraw applications marked Wrong and archive their pages.
pub async fn run_remove(config: &Config, workers: usize) -> Result<RunReport> {
    let pool = WorkerPool::new(workers)?;
    let (hh, notion) = clients(config)?;

    let records = notion.query_by_status(STATUS_WRONG).await?;
    log::info!("Got {} applications to remove", records.len());

    let processor = Arc::new(RemovalProcessor::new(hh, notion));
    let report = pool.run(prefilled(records)?, Arc::clone(&processor)).await;
    processor.stats().log_summary("Remove", "removed", &report);
    Ok(report)
}

/// Copy a negotiation thread into its Notion page. Returns the number of
/// messages appended.
pub async fn run_messages(config: &Config, negotiation_id: &str) -> Result<usize> {
    let (hh, notion) = clients(config)?;

    let negotiation_url = format!("/negotiations/{negotiation_id}");
    let page_id = notion
        .find_by_negotiation(&negotiation_url)
        .await?
        .ok_or_else(|| AppError::validation(format!("no Notion page for {negotiation_url}")))?;

    // the first message is the cover letter
    let messages = hh.negotiation_messages(negotiation_id).await?;
    let mut appended = 0;
    for message in messages.iter().skip(1) {
        notion.append_message(&page_id, message).await?;
        appended += 1;
    }
    log::info!("Appended {} messages to page {}", appended, page_id);
    Ok(appended)
}
