//! Service configuration
//!
//! Everything comes from the process environment. The orchestrator
//! connection settings live in `redeployer_client::ClientConfig`.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Port used for plain TCP
pub const PLAIN_PORT: u16 = 8080;

/// Port used when TLS is enabled
pub const TLS_PORT: u16 = 8081;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

/// Certificate material for the TLS listener
///
/// The files are provisioned by the secret manager; we only read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    /// Common name the certificate was issued for
    pub common_name: String,
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_host: String,
    pub tls: Option<TlsSettings>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            tls: None,
            log_format: LogFormat::Json,
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - TLS_CN (optional, enables TLS on port 8081)
    /// - TLS_CERT_FILE (required with TLS_CN, PEM certificate chain)
    /// - TLS_KEY_FILE (required with TLS_CN, PEM private key)
    /// - LISTEN_HOST (optional, default: 0.0.0.0)
    /// - LOG_FORMAT (optional, "json" or "text", default: json)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let tls = match non_empty("TLS_CN") {
            Some(common_name) => {
                let cert_file = non_empty("TLS_CERT_FILE")
                    .context("TLS_CERT_FILE must be set when TLS_CN is set")?;
                let key_file = non_empty("TLS_KEY_FILE")
                    .context("TLS_KEY_FILE must be set when TLS_CN is set")?;
                Some(TlsSettings {
                    common_name,
                    cert_file: cert_file.into(),
                    key_file: key_file.into(),
                })
            }
            None => None,
        };

        let log_format = match non_empty("LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("text") => LogFormat::Text,
            Some(other) => anyhow::bail!("LOG_FORMAT must be json or text, got {}", other),
        };

        let config = Self {
            listen_host: non_empty("LISTEN_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            tls,
            log_format,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.listen_host.is_empty() {
            anyhow::bail!("listen_host cannot be empty");
        }

        if let Some(tls) = &self.tls {
            if tls.common_name.is_empty() {
                anyhow::bail!("TLS common name cannot be empty");
            }
        }

        Ok(())
    }

    pub fn port(&self) -> u16 {
        if self.tls.is_some() { TLS_PORT } else { PLAIN_PORT }
    }

    pub fn transport(&self) -> &'static str {
        if self.tls.is_some() { "tls" } else { "tcp" }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.port())
    }
}
