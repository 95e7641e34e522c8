//! Redeployer Orchestrator Client
//!
//! A small, type-safe HTTP client for the parts of the Nomad job API the
//! updater needs: listing jobs, reading a job, planning and registering.
//!
//! # Example
//!
//! ```no_run
//! use redeployer_client::{ClientConfig, NomadClient};
//!
//! # async fn example() -> redeployer_client::Result<()> {
//! let client = NomadClient::new(ClientConfig::from_env())?;
//! let jobs = client.list_jobs(false).await?;
//! println!("{} jobs registered", jobs.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
mod jobs;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use jobs::{PlanResponse, RegisterResponse};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

const TOKEN_HEADER: &str = "x-nomad-token";

/// HTTP client for the Nomad API
///
/// No request timeout is configured: a slow orchestrator holds the caller
/// until it answers.
#[derive(Debug, Clone)]
pub struct NomadClient {
    base_url: Url,
    region: Option<String>,
    namespace: Option<String>,
    client: Client,
}

impl NomadClient {
    /// Create a new client from connection settings
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(token).map_err(|_| {
                ClientError::InvalidConfig("token contains invalid header characters".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(TOKEN_HEADER, value);
        }

        let client = Client::builder().default_headers(headers).build()?;
        Self::with_client(config, client)
    }

    /// Create a new client with a custom HTTP client
    ///
    /// The token in `config` is ignored; configure it on `client` instead.
    pub fn with_client(config: ClientConfig, client: Client) -> Result<Self> {
        let base_url = Url::parse(&config.address).map_err(|e| {
            ClientError::InvalidConfig(format!("invalid address {}: {}", config.address, e))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "address {} cannot be used as a base URL",
                config.address
            )));
        }

        Ok(Self {
            base_url,
            region: config.region,
            namespace: config.namespace,
            client,
        })
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidRequest(format!("cannot extend {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request carrying the region and namespace selectors
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "orchestrator request");
        let mut builder = self.client.request(method, url);
        if let Some(region) = &self.region {
            builder = builder.query(&[("region", region)]);
        }
        if let Some(namespace) = &self.namespace {
            builder = builder.query(&[("namespace", namespace)]);
        }
        builder
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    ///
    /// Nomad answers errors with a plain-text body such as `job not found` or
    /// `Permission denied`, not JSON. That text is kept verbatim (trimmed) as
    /// the `ApiError` message; an empty body falls back to the status reason.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(nomad_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

/// Turn a Nomad plain-text error body into an `ApiError`
fn nomad_error(status: StatusCode, body: &str) -> ClientError {
    let message = body.trim();
    let message = if message.is_empty() {
        status.canonical_reason().unwrap_or("Unknown error")
    } else {
        message
    };
    ClientError::api_error(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(address: &str) -> NomadClient {
        NomadClient::new(ClientConfig {
            address: address.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client("http://localhost:4646");
        assert_eq!(client.base_url().as_str(), "http://localhost:4646/");
    }

    #[test]
    fn test_rejects_invalid_address() {
        let result = NomadClient::new(ClientConfig {
            address: "localhost:4646".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_invalid_token() {
        let result = NomadClient::new(ClientConfig {
            token: Some("bad\ntoken".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("http://localhost:4646/");
        let url = client.endpoint(&["v1", "job", "web/api v2"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4646/v1/job/web%2Fapi%20v2");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("https://proxy.internal/nomad");
        let url = client.endpoint(&["v1", "jobs"]).unwrap();
        assert_eq!(url.as_str(), "https://proxy.internal/nomad/v1/jobs");
    }

    #[test]
    fn test_request_adds_selectors() {
        let client = NomadClient::new(ClientConfig {
            region: Some("eu".to_string()),
            namespace: Some("apps".to_string()),
            ..Default::default()
        })
        .unwrap();
        let url = client.endpoint(&["v1", "jobs"]).unwrap();
        let request = client.request(Method::GET, url).build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://127.0.0.1:4646/v1/jobs?region=eu&namespace=apps"
        );
    }

    #[test]
    fn test_nomad_error_keeps_plain_text_body() {
        let error = nomad_error(StatusCode::NOT_FOUND, "job not found\n");
        assert!(error.is_not_found());
        assert!(matches!(
            error,
            ClientError::ApiError { status: 404, ref message } if message == "job not found"
        ));
    }

    #[test]
    fn test_nomad_error_falls_back_to_status_reason() {
        let error = nomad_error(StatusCode::FORBIDDEN, "  ");
        assert!(matches!(
            error,
            ClientError::ApiError { status: 403, ref message } if message == "Forbidden"
        ));
    }
}
