//! Client configuration options

use std::time::Duration;

use secrecy::SecretString;

/// Connection settings for the Cloud Deploy API.
///
/// All configuration is carried explicitly by this struct; there is no
/// process-global state. Credentials are sent as HTTP basic auth on every
/// request.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Cloud Deploy API, e.g. `https://deploy.example.com`
    pub base_url: String,

    /// API username
    pub username: String,

    /// API password
    pub password: SecretString,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Config {
    /// Create a config with the default request timeout
    pub fn new(base_url: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password,
            timeout: Duration::from_secs(30),
        }
    }
}
