//! Job-related API endpoints

use crate::NomadClient;
use crate::error::Result;
use redeployer_core::domain::job::{Job, JobListStub};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of plan requests
#[derive(Debug, Serialize)]
struct PlanRequest<'a> {
    #[serde(rename = "Job")]
    job: &'a Job,
    #[serde(rename = "Diff")]
    diff: bool,
    #[serde(rename = "PolicyOverride")]
    policy_override: bool,
}

/// Body of register requests
#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    #[serde(rename = "Job")]
    job: &'a Job,
}

/// Result of a dry-run plan
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanResponse {
    #[serde(rename = "JobModifyIndex", default)]
    pub job_modify_index: u64,
    #[serde(rename = "Warnings", default)]
    pub warnings: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of registering a job
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(rename = "EvalID", default)]
    pub eval_id: String,
    #[serde(rename = "JobModifyIndex", default)]
    pub job_modify_index: u64,
    #[serde(rename = "Warnings", default)]
    pub warnings: String,
}

impl NomadClient {
    /// List all jobs
    ///
    /// # Arguments
    /// * `allow_stale` - Whether any server may answer, instead of only the leader
    pub async fn list_jobs(&self, allow_stale: bool) -> Result<Vec<JobListStub>> {
        let url = self.endpoint(&["v1", "jobs"])?;
        let mut request = self.request(Method::GET, url);
        if allow_stale {
            request = request.query(&[("stale", "true")]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Get the full definition of a job
    pub async fn job_info(&self, job_id: &str) -> Result<Job> {
        let url = self.endpoint(&["v1", "job", job_id])?;
        let response = self.request(Method::GET, url).send().await?;

        self.handle_response(response).await
    }

    /// Dry-run a job update
    ///
    /// # Arguments
    /// * `job` - The updated job definition
    /// * `diff` - Whether to ask for a structural diff in the response
    pub async fn plan_job(&self, job: &Job, diff: bool) -> Result<PlanResponse> {
        let url = self.endpoint(&["v1", "job", job.id.as_str(), "plan"])?;
        let response = self
            .request(Method::PUT, url)
            .json(&PlanRequest {
                job,
                diff,
                policy_override: false,
            })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Register (apply) a job definition
    pub async fn register_job(&self, job: &Job) -> Result<RegisterResponse> {
        let url = self.endpoint(&["v1", "jobs"])?;
        let response = self
            .request(Method::PUT, url)
            .json(&RegisterRequest { job })
            .send()
            .await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_request_shape() {
        let job = Job {
            id: "web".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(PlanRequest {
            job: &job,
            diff: false,
            policy_override: false,
        })
        .unwrap();
        assert_eq!(body["Job"]["ID"], json!("web"));
        assert_eq!(body["Diff"], json!(false));
    }

    #[test]
    fn test_register_response_parsing() {
        let response: RegisterResponse = serde_json::from_value(json!({
            "EvalID": "d092fdc0",
            "EvalCreateIndex": 35,
            "JobModifyIndex": 34,
            "Warnings": "",
            "Index": 35
        }))
        .unwrap();
        assert_eq!(response.eval_id, "d092fdc0");
        assert_eq!(response.job_modify_index, 34);
    }
}
