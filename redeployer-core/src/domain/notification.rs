//! Build notification types

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Payload of a "build succeeded" webhook
///
/// Every field defaults when missing so that a partial or empty payload still
/// produces a value. Webhook bodies should go through `decode_lenient`, which
/// also tolerates `null` and wrong-typed fields one field at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildNotification {
    pub repository: String,
    pub namespace: String,
    pub name: String,
    /// Registry path of the image, without a tag (e.g. `quay.io/acme/app`)
    pub docker_url: String,
    pub homepage: String,
    pub visibility: String,
    pub build_id: String,
    /// Tags produced by the build; the first one is deployed
    pub docker_tags: Vec<String>,
    pub trigger_kind: String,
    pub trigger_id: String,
    pub trigger_metadata: TriggerMetadata,
}

/// Source control context of the build trigger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerMetadata {
    pub default_branch: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub commit: String,
    pub commit_info: CommitInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitInfo {
    pub url: String,
    pub message: String,
    /// Unix seconds
    pub date: i64,
    pub author: GitUser,
    pub committer: GitUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitUser {
    pub username: String,
    pub url: String,
    pub avatar_url: String,
}

impl BuildNotification {
    /// The tag selected for deployment
    ///
    /// Only the first tag counts; an empty first tag means there is none.
    pub fn deploy_tag(&self) -> Option<&str> {
        self.docker_tags
            .first()
            .map(String::as_str)
            .filter(|tag| !tag.is_empty())
    }

    /// Full image reference to deploy, `<docker_url>:<deploy_tag>`
    ///
    /// Returns `None` when the notification names no image or no tag.
    pub fn image_reference(&self) -> Option<String> {
        if self.docker_url.is_empty() {
            return None;
        }
        self.deploy_tag()
            .map(|tag| format!("{}:{}", self.docker_url, tag))
    }

    /// Commit timestamp, when the trigger carried one
    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        match self.trigger_metadata.commit_info.date {
            0 => None,
            secs => DateTime::from_timestamp(secs, 0),
        }
    }
}

/// A field that could not be decoded and was left at its default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeProblem {
    /// Dotted path of the field, empty for the whole body
    pub field: String,
    pub message: String,
}

impl fmt::Display for DecodeProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Outcome of `BuildNotification::decode_lenient`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub notification: BuildNotification,
    pub problems: Vec<DecodeProblem>,
}

impl BuildNotification {
    /// Decodes a webhook body field by field
    ///
    /// `null` and missing fields keep their defaults silently. A field of the
    /// wrong type keeps its default and is reported in `problems`; every
    /// other field is still filled. A body that is not JSON at all yields the
    /// default notification plus one problem.
    pub fn decode_lenient(body: &[u8]) -> Decoded {
        let mut problems = Vec::new();

        let notification = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Self::from_fields(&fields, &mut problems),
            Ok(Value::Null) => BuildNotification::default(),
            Ok(other) => {
                problems.push(DecodeProblem {
                    field: String::new(),
                    message: format!("expected a JSON object, found {}", json_kind(&other)),
                });
                BuildNotification::default()
            }
            Err(e) => {
                problems.push(DecodeProblem {
                    field: String::new(),
                    message: e.to_string(),
                });
                BuildNotification::default()
            }
        };

        Decoded {
            notification,
            problems,
        }
    }

    fn from_fields(map: &Map<String, Value>, problems: &mut Vec<DecodeProblem>) -> Self {
        let path = "";
        Self {
            repository: field(map, path, "repository", problems),
            namespace: field(map, path, "namespace", problems),
            name: field(map, path, "name", problems),
            docker_url: field(map, path, "docker_url", problems),
            homepage: field(map, path, "homepage", problems),
            visibility: field(map, path, "visibility", problems),
            build_id: field(map, path, "build_id", problems),
            docker_tags: field(map, path, "docker_tags", problems),
            trigger_kind: field(map, path, "trigger_kind", problems),
            trigger_id: field(map, path, "trigger_id", problems),
            trigger_metadata: object(map, path, "trigger_metadata", problems)
                .map(|nested| TriggerMetadata::from_fields(nested, "trigger_metadata", problems))
                .unwrap_or_default(),
        }
    }
}

impl TriggerMetadata {
    fn from_fields(map: &Map<String, Value>, path: &str, problems: &mut Vec<DecodeProblem>) -> Self {
        let commit_info_path = join(path, "commit_info");
        Self {
            default_branch: field(map, path, "default_branch", problems),
            git_ref: field(map, path, "ref", problems),
            commit: field(map, path, "commit", problems),
            commit_info: object(map, path, "commit_info", problems)
                .map(|nested| CommitInfo::from_fields(nested, &commit_info_path, problems))
                .unwrap_or_default(),
        }
    }
}

impl CommitInfo {
    fn from_fields(map: &Map<String, Value>, path: &str, problems: &mut Vec<DecodeProblem>) -> Self {
        let author_path = join(path, "author");
        let committer_path = join(path, "committer");
        Self {
            url: field(map, path, "url", problems),
            message: field(map, path, "message", problems),
            date: field(map, path, "date", problems),
            author: object(map, path, "author", problems)
                .map(|nested| GitUser::from_fields(nested, &author_path, problems))
                .unwrap_or_default(),
            committer: object(map, path, "committer", problems)
                .map(|nested| GitUser::from_fields(nested, &committer_path, problems))
                .unwrap_or_default(),
        }
    }
}

impl GitUser {
    fn from_fields(map: &Map<String, Value>, path: &str, problems: &mut Vec<DecodeProblem>) -> Self {
        Self {
            username: field(map, path, "username", problems),
            url: field(map, path, "url", problems),
            avatar_url: field(map, path, "avatar_url", problems),
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads one leaf field, falling back to the default on null or mismatch
fn field<T>(map: &Map<String, Value>, path: &str, key: &str, problems: &mut Vec<DecodeProblem>) -> T
where
    T: DeserializeOwned + Default,
{
    match map.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => T::deserialize(value).unwrap_or_else(|e| {
            problems.push(DecodeProblem {
                field: join(path, key),
                message: e.to_string(),
            });
            T::default()
        }),
    }
}

/// Reads a nested object; `None` when absent, null or not an object
fn object<'a>(
    map: &'a Map<String, Value>,
    path: &str,
    key: &str,
    problems: &mut Vec<DecodeProblem>,
) -> Option<&'a Map<String, Value>> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::Object(nested)) => Some(nested),
        Some(other) => {
            problems.push(DecodeProblem {
                field: join(path, key),
                message: format!("expected an object, found {}", json_kind(other)),
            });
            None
        }
    }
}
