//! Job API client

use async_trait::async_trait;
use tracing::debug;

use crate::errors::ClientError;
use crate::http::client::RestClient;
use crate::models::job::{Job, WebsocketToken};

/// Read access to job records, as a trait for testability.
///
/// The log stream controller only ever observes jobs through this trait.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Retrieve a job by ID
    async fn job(&self, job_id: &str) -> Result<Job, ClientError>;

    /// Fetch a fresh websocket token for one job's log stream
    async fn websocket_token(&self, job_id: &str) -> Result<WebsocketToken, ClientError>;
}

impl RestClient {
    /// Stream a job's log output to a pair of callbacks.
    ///
    /// Convenience wrapper wiring this client to the WebSocket channel
    /// opener; see [`LogStreamer::run`](crate::stream::LogStreamer::run)
    /// for the delivery and error contract.
    pub async fn stream_job_logs(
        &self,
        job_id: &str,
        options: crate::stream::Options,
        on_message: impl FnMut(String),
        on_error: impl FnMut(ClientError),
    ) -> Result<(), ClientError> {
        let opener = crate::stream::WsChannelOpener::new(self.base_url())?;
        crate::stream::LogStreamer::new(self.clone(), opener, options)
            .run(job_id, on_message, on_error)
            .await
    }
}

#[async_trait]
impl JobSource for RestClient {
    async fn job(&self, job_id: &str) -> Result<Job, ClientError> {
        let path = format!("/jobs/{}", job_id);
        self.get_json(&path).await
    }

    async fn websocket_token(&self, job_id: &str) -> Result<WebsocketToken, ClientError> {
        let path = format!("/jobs/{}/websocket_token/", job_id);
        debug!("Fetching websocket token for job {}", job_id);
        self.get_json(&path)
            .await
            .map_err(|e| ClientError::TokenError(e.to_string()))
    }
}
