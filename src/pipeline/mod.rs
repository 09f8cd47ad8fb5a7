//! Pipeline entry points for applier operations.
//!
//! - `run_apply`: Apply to vacancies page by page
//! - `run_import`: Record existing applications in Notion
//! - `run_rejections` / `run_remove`: Sync Notion pages with negotiation state
//!
//! The concurrent engine underneath is a `WorkQueue` drained by a
//! `WorkerPool`; listing runs seed page 0 and let it enqueue the rest.

pub mod apply;
pub mod filter;
pub mod import;
pub mod maintenance;
pub mod paginate;
pub mod pool;
pub mod queue;
pub mod stats;

pub use apply::{ApplyProcessor, run_apply, run_apply_one};
pub use filter::ItemFilter;
pub use import::{ImportProcessor, run_import};
pub use maintenance::{RejectionProcessor, RemovalProcessor, run_messages, run_rejections, run_remove};
pub use paginate::{fetch_page, run_paginated};
pub use pool::{RunReport, UnitOutcome, UnitProcessor, WorkerPool};
pub use queue::WorkQueue;
pub use stats::{RunStats, StatsSnapshot};
