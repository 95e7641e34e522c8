//! Orchestrator job types
//!
//! Typed view over the scheduler's job JSON. Only the fields the updater reads
//! are modelled; everything else is kept in `extra` and written back as-is.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Entry returned by the job listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListStub {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Type")]
    pub job_type: JobType,
    #[serde(rename = "Status", default)]
    pub status: String,
}

/// Scheduler job type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobType {
    Service,
    Batch,
    System,
    Sysbatch,
    Other(String),
}

impl From<String> for JobType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "service" => JobType::Service,
            "batch" => JobType::Batch,
            "system" => JobType::System,
            "sysbatch" => JobType::Sysbatch,
            _ => JobType::Other(value),
        }
    }
}

impl From<JobType> for String {
    fn from(value: JobType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobType::Service => f.write_str("service"),
            JobType::Batch => f.write_str("batch"),
            JobType::System => f.write_str("system"),
            JobType::Sysbatch => f.write_str("sysbatch"),
            JobType::Other(other) => f.write_str(other),
        }
    }
}

/// Full job definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(rename = "TaskGroups", default, deserialize_with = "null_as_default")]
    pub task_groups: Vec<TaskGroup>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskGroup {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Tasks", default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Config", default, deserialize_with = "null_as_default")]
    pub config: TaskConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Driver configuration of a task
///
/// The schema depends on the task driver, so it stays an open map with typed
/// accessors for the keys we touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskConfig(pub Map<String, Value>);

/// Result of reading the `image` key of a task configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageField<'a> {
    Absent,
    NotAString(&'a Value),
    Image(&'a str),
}

impl TaskConfig {
    pub const IMAGE_KEY: &'static str = "image";

    pub fn image(&self) -> ImageField<'_> {
        match self.0.get(Self::IMAGE_KEY) {
            None => ImageField::Absent,
            Some(Value::String(image)) => ImageField::Image(image),
            Some(other) => ImageField::NotAString(other),
        }
    }

    pub fn set_image(&mut self, image: String) {
        self.0.insert(Self::IMAGE_KEY.to_string(), Value::String(image));
    }
}

impl JobType {
    pub fn is_service(&self) -> bool {
        matches!(self, JobType::Service)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
