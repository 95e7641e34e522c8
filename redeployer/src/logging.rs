//! Logging bootstrap
//!
//! `init` installs the subscriber and hands back a guard that must live
//! until the process exits. Components get their own span at construction
//! and log through it.

use std::io::Write;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogFormat;

const DEFAULT_FILTER: &str = "redeployer=info,tower_http=info";

/// Flushes buffered log output when dropped
#[must_use = "logs may be lost if the guard is dropped early"]
pub struct LogGuard {
    _private: (),
}

/// Installs the global subscriber
pub fn init(format: LogFormat) -> LogGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }

    LogGuard { _private: () }
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        tracing::info!("Redeployer stopped");
        let _ = std::io::stdout().flush();
    }
}
