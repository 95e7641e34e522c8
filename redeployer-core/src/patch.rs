//! Image rewrite rule
//!
//! A task is rewritten when its `image` is a string starting with the
//! notification's docker URL. The new value is `<docker_url>:<tag>`.

use crate::domain::job::{ImageField, Job};

/// One rewritten task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRewrite {
    pub task_group: String,
    pub task: String,
    pub previous: String,
    pub image: String,
}

/// A task whose `image` could not be read as a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTask {
    pub task_group: String,
    pub task: String,
    pub found: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    pub rewrites: Vec<ImageRewrite>,
    pub skipped: Vec<SkippedTask>,
}

impl PatchOutcome {
    /// True when at least one task was rewritten and the job must be resubmitted
    pub fn is_dirty(&self) -> bool {
        !self.rewrites.is_empty()
    }
}

/// Rewrites every matching task image in `job` in place
///
/// An empty `docker_url` matches nothing.
pub fn rewrite_job_images(job: &mut Job, docker_url: &str, tag: &str) -> PatchOutcome {
    let mut outcome = PatchOutcome::default();
    if docker_url.is_empty() {
        return outcome;
    }

    let target = format!("{}:{}", docker_url, tag);

    for group in &mut job.task_groups {
        for task in &mut group.tasks {
            let previous = match task.config.image() {
                ImageField::Image(image) if image.starts_with(docker_url) => image.to_string(),
                ImageField::Image(_) | ImageField::Absent => continue,
                ImageField::NotAString(value) => {
                    outcome.skipped.push(SkippedTask {
                        task_group: group.name.clone(),
                        task: task.name.clone(),
                        found: value.to_string(),
                    });
                    continue;
                }
            };

            task.config.set_image(target.clone());
            outcome.rewrites.push(ImageRewrite {
                task_group: group.name.clone(),
                task: task.name.clone(),
                previous,
                image: target.clone(),
            });
        }
    }

    outcome
}
