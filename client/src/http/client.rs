//! HTTP client implementation

use reqwest::{header, Client};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::Config;
use crate::errors::ClientError;

/// HTTP client for the Cloud Deploy API
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    config: Config,
}

impl RestClient {
    /// Create a new REST client
    pub fn new(mut config: Config) -> Result<Self, ClientError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("text/plain"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        config.base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self { client, config })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Make a GET request and decode the JSON response
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(self.config.password.expose_secret()))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }
}
