//! Core domain types
//!
//! The notification types describe what the image registry sends us.
//! The job types are a typed view over the orchestrator's job definitions,
//! kept lossless so a patched job can be written back whole.

pub mod job;
pub mod notification;
