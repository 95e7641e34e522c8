//! Updater worker
//!
//! Consumes notifications one at a time. For each one it lists jobs, keeps
//! the service jobs, rewrites matching task images and submits plan then
//! register for every job that changed. A failure on one job never stops the
//! scan of the others; a failure to list jobs drops the notification.

use redeployer_core::domain::job::{Job, JobListStub};
use redeployer_core::patch::rewrite_job_images;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, error, info, warn};

use super::JobsApi;
use crate::queue::{NotificationReceiver, QueuedNotification};

/// How a processing cycle ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleOutcome {
    #[default]
    Completed,
    /// The notification named no image or no tag
    Skipped,
    /// Listing jobs failed; nothing was inspected
    ListFailed,
    Cancelled,
}

/// Summary of one notification's processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Service jobs considered
    pub jobs_inspected: usize,
    /// Jobs registered with new images
    pub jobs_updated: usize,
    /// Jobs whose read, plan or register failed
    pub jobs_failed: usize,
    pub tasks_rewritten: usize,
}

enum JobOutcome {
    Unchanged,
    Updated { tasks: usize },
    Failed,
    Cancelled,
}

/// Single consumer of the notification queue
pub struct Updater {
    api: Arc<dyn JobsApi>,
    span: Span,
}

impl Updater {
    /// Creates a new updater
    ///
    /// # Arguments
    /// * `api` - Orchestrator operations
    /// * `span` - Parent span for everything the updater logs
    pub fn new(api: Arc<dyn JobsApi>, span: Span) -> Self {
        Self { api, span }
    }

    /// Processes notifications until the queue closes or `cancel` fires
    pub async fn run(&self, mut queue: NotificationReceiver, cancel: CancellationToken) {
        info!(parent: &self.span, "updater started");

        loop {
            let queued = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = queue.next() => match next {
                    Some(queued) => queued,
                    None => break,
                },
            };

            let report = self.process(&queued, &cancel).await;
            if report.outcome == CycleOutcome::Cancelled {
                break;
            }
        }

        queue.close();
        info!(parent: &self.span, "updater stopped");
    }

    /// Runs one full scan for a notification
    pub async fn process(
        &self,
        queued: &QueuedNotification,
        cancel: &CancellationToken,
    ) -> CycleReport {
        let span = tracing::info_span!(
            parent: &self.span,
            "cycle",
            delivery_id = %queued.delivery_id,
            docker_url = %queued.notification.docker_url,
        );

        self.scan(queued, cancel).instrument(span).await
    }

    async fn scan(&self, queued: &QueuedNotification, cancel: &CancellationToken) -> CycleReport {
        let notification = &queued.notification;
        let mut report = CycleReport::default();

        let Some(tag) = notification.deploy_tag() else {
            warn!("notification carries no docker tag, skipping");
            report.outcome = CycleOutcome::Skipped;
            return report;
        };
        if notification.docker_url.is_empty() {
            warn!("notification carries no docker url, skipping");
            report.outcome = CycleOutcome::Skipped;
            return report;
        }

        let queued_for = (chrono::Utc::now() - queued.received_at)
            .to_std()
            .unwrap_or_default();
        info!(
            tag,
            commit = %notification.trigger_metadata.commit,
            committed_at = ?notification.committed_at(),
            queued_for = ?queued_for,
            "processing build notification"
        );

        let jobs = match until_cancelled(cancel, self.api.list_jobs(false)).await {
            None => {
                report.outcome = CycleOutcome::Cancelled;
                return report;
            }
            Some(Err(e)) => {
                error!(error = %e, "failed to list jobs");
                report.outcome = CycleOutcome::ListFailed;
                return report;
            }
            Some(Ok(jobs)) => jobs,
        };

        for stub in jobs.iter().filter(|stub| stub.job_type.is_service()) {
            report.jobs_inspected += 1;

            match self
                .update_job(stub, &notification.docker_url, tag, cancel)
                .await
            {
                JobOutcome::Unchanged => {}
                JobOutcome::Updated { tasks } => {
                    report.jobs_updated += 1;
                    report.tasks_rewritten += tasks;
                }
                JobOutcome::Failed => report.jobs_failed += 1,
                JobOutcome::Cancelled => {
                    report.outcome = CycleOutcome::Cancelled;
                    return report;
                }
            }
        }

        info!(
            jobs_inspected = report.jobs_inspected,
            jobs_updated = report.jobs_updated,
            jobs_failed = report.jobs_failed,
            "build notification processed"
        );
        report
    }

    async fn update_job(
        &self,
        stub: &JobListStub,
        docker_url: &str,
        tag: &str,
        cancel: &CancellationToken,
    ) -> JobOutcome {
        let mut job: Job = match until_cancelled(cancel, self.api.job_info(&stub.id)).await {
            None => return JobOutcome::Cancelled,
            Some(Err(e)) => {
                error!(error = %e, job_id = %stub.id, "failed to read job");
                return JobOutcome::Failed;
            }
            Some(Ok(job)) => job,
        };

        let patch = rewrite_job_images(&mut job, docker_url, tag);

        for skipped in &patch.skipped {
            warn!(
                job_id = %stub.id,
                task_group = %skipped.task_group,
                task = %skipped.task,
                found = %skipped.found,
                "task image is not a string, leaving task unchanged"
            );
        }
        for rewrite in &patch.rewrites {
            info!(
                job_id = %stub.id,
                task_group = %rewrite.task_group,
                task = %rewrite.task,
                from = %rewrite.previous,
                to = %rewrite.image,
                "scheduling update"
            );
        }

        if !patch.is_dirty() {
            return JobOutcome::Unchanged;
        }

        match until_cancelled(cancel, self.api.plan_job(&job)).await {
            None => return JobOutcome::Cancelled,
            Some(Err(e)) => {
                error!(error = %e, job_id = %stub.id, "failed to plan image update");
                return JobOutcome::Failed;
            }
            Some(Ok(plan)) if !plan.warnings.is_empty() => {
                warn!(job_id = %stub.id, warnings = %plan.warnings, "plan returned warnings");
            }
            Some(Ok(_)) => {}
        }

        match until_cancelled(cancel, self.api.register_job(&job)).await {
            None => JobOutcome::Cancelled,
            Some(Err(e)) => {
                error!(error = %e, job_id = %stub.id, "failed to update image");
                JobOutcome::Failed
            }
            Some(Ok(registered)) => {
                info!(
                    job_id = %stub.id,
                    eval_id = %registered.eval_id,
                    job_modify_index = registered.job_modify_index,
                    "image updated"
                );
                JobOutcome::Updated {
                    tasks: patch.rewrites.len(),
                }
            }
        }
    }
}

/// Awaits `future` unless `cancel` fires first
async fn until_cancelled<F: Future>(cancel: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = future => Some(output),
    }
}
