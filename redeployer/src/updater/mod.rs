//! Updater layer
//!
//! The single background worker that turns queued notifications into job
//! updates. It talks to the orchestrator through the `JobsApi` trait so the
//! scan logic can run against an in-memory double in tests.

mod jobs_api;
mod worker;

pub use jobs_api::JobsApi;
pub use worker::{CycleOutcome, CycleReport, Updater};
