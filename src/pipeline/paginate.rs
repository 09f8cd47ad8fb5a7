// src/pipeline/paginate.rs

//! Self-expanding pagination over a listing.
//!
//! The run starts with a single unit for page 0. Whoever processes page 0
//! learns the page count and enqueues pages `1..pages` while still holding
//! unit 0, so the queue cannot look finished in between.

use std::sync::Arc;

use crate::models::WorkUnit;
use crate::pipeline::{RunReport, RunStats, UnitProcessor, WorkQueue, WorkerPool};
use crate::services::PageFetcher;

/// Seed the queue with page 0 and run the pool over it.
pub async fn run_paginated<P>(pool: WorkerPool, processor: Arc<P>) -> RunReport
where
    P: UnitProcessor<WorkUnit> + 'static,
{
    let queue = Arc::new(WorkQueue::new());
    if queue.put(WorkUnit::new(0)).is_err() {
        return RunReport::default();
    }
    log::info!("Starting {} workers", pool.workers());
    pool.run(queue, processor).await
}

/// Fetch the unit's page; page 0 also enqueues the remaining pages.
///
/// A failed fetch is logged and yields no items.
pub async fn fetch_page<I>(
    fetcher: &dyn PageFetcher<I>,
    unit: WorkUnit,
    queue: &WorkQueue<WorkUnit>,
    label: &str,
    stats: &RunStats,
) -> Vec<I> {
    let page = match fetcher.fetch(unit.page).await {
        Ok(page) => page,
        Err(e) => {
            RunStats::incr(&stats.pages_failed);
            log::error!("Error fetching page {}: {}", unit.page, e);
            return Vec::new();
        }
    };
    RunStats::incr(&stats.pages_fetched);

    if unit.page == 0 {
        log::info!("Got {} {}, {} pages", page.found, label, page.pages);
        for next in 1..page.pages {
            if queue.put(WorkUnit::new(next)).is_err() {
                log::warn!("Queue closed while adding page {}", next);
                break;
            }
            log::debug!("Add page {} to queue", next);
        }
    }

    log::info!("Page={} got {} {}", unit.page, page.items.len(), label);
    page.items
}
