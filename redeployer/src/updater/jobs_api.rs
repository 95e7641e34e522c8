//! Orchestrator operations used by the updater

use async_trait::async_trait;
use redeployer_client::{ClientError, NomadClient, PlanResponse, RegisterResponse};
use redeployer_core::domain::job::{Job, JobListStub};

#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Lists every job
    ///
    /// # Arguments
    /// * `allow_stale` - Whether a possibly lagging replica may answer
    async fn list_jobs(&self, allow_stale: bool) -> Result<Vec<JobListStub>, ClientError>;

    /// Fetches the full definition of a job
    async fn job_info(&self, job_id: &str) -> Result<Job, ClientError>;

    /// Dry-runs an update of the job
    async fn plan_job(&self, job: &Job) -> Result<PlanResponse, ClientError>;

    /// Applies the job definition
    async fn register_job(&self, job: &Job) -> Result<RegisterResponse, ClientError>;
}

#[async_trait]
impl JobsApi for NomadClient {
    async fn list_jobs(&self, allow_stale: bool) -> Result<Vec<JobListStub>, ClientError> {
        NomadClient::list_jobs(self, allow_stale).await
    }

    async fn job_info(&self, job_id: &str) -> Result<Job, ClientError> {
        NomadClient::job_info(self, job_id).await
    }

    async fn plan_job(&self, job: &Job) -> Result<PlanResponse, ClientError> {
        NomadClient::plan_job(self, job, false).await
    }

    async fn register_job(&self, job: &Job) -> Result<RegisterResponse, ClientError> {
        NomadClient::register_job(self, job).await
    }
}
