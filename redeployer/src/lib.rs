//! Redeployer
//!
//! Receives image build notifications over HTTP and rolls the new tag out to
//! every orchestrator service job running that image.
//!
//! Architecture:
//! - Listener (`api`): accepts webhooks and pushes them onto a bounded queue
//! - Queue (`queue`): five-slot FIFO between the listener and the updater
//! - Updater (`updater`): single worker that scans jobs, rewrites images, and
//!   submits plan + register to the orchestrator
//! - Server (`server`): plain or TLS listener wiring for `axum::serve`
//! - Configuration, logging and TLS bootstrap for the binary

pub mod api;
pub mod config;
pub mod logging;
pub mod queue;
pub mod server;
pub mod tls;
pub mod updater;
