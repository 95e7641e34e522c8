//! Orchestrator connection settings
//!
//! Read from the same environment variables the Nomad CLI uses, so the
//! service picks up whatever the deployment already provides.

use crate::error::{ClientError, Result};

pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:4646";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL (e.g., "http://127.0.0.1:4646")
    pub address: String,
    /// ACL token, sent as `X-Nomad-Token`
    pub token: Option<String>,
    pub region: Option<String>,
    pub namespace: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: None,
            region: None,
            namespace: None,
        }
    }
}

impl ClientConfig {
    /// Creates configuration from environment variables
    ///
    /// - NOMAD_ADDR (optional, default: http://127.0.0.1:4646)
    /// - NOMAD_TOKEN (optional)
    /// - NOMAD_REGION (optional)
    /// - NOMAD_NAMESPACE (optional)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        Self {
            address: non_empty("NOMAD_ADDR").unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            token: non_empty("NOMAD_TOKEN"),
            region: non_empty("NOMAD_REGION"),
            namespace: non_empty("NOMAD_NAMESPACE"),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(ClientError::InvalidConfig(
                "address cannot be empty".to_string(),
            ));
        }

        if !self.address.starts_with("http://") && !self.address.starts_with("https://") {
            return Err(ClientError::InvalidConfig(format!(
                "address must start with http:// or https://, got {}",
                self.address
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config, ClientConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reads_variables() {
        let vars = HashMap::from([
            ("NOMAD_ADDR", "https://nomad.internal:4646"),
            ("NOMAD_TOKEN", "secret"),
            ("NOMAD_REGION", "eu"),
            ("NOMAD_NAMESPACE", ""),
        ]);
        let config = ClientConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.address, "https://nomad.internal:4646");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.region.as_deref(), Some("eu"));
        assert_eq!(config.namespace, None);
    }

    #[test]
    fn test_validation() {
        let mut config = ClientConfig::default();

        config.address = "nomad:4646".to_string();
        assert!(config.validate().is_err());

        config.address = String::new();
        assert!(config.validate().is_err());

        config.address = "https://nomad:4646".to_string();
        assert!(config.validate().is_ok());
    }
}
