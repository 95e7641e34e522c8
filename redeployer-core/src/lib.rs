//! Redeployer Core
//!
//! Core types shared by the redeployer listener, updater and orchestrator client.
//!
//! This crate contains:
//! - Domain types: build notifications and the orchestrator job model
//! - Patch: the image match-and-rewrite rule applied to job definitions

pub mod domain;
pub mod patch;
