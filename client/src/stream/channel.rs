//! WebSocket log channel

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info};
use url::Url;

use crate::errors::ClientError;
use crate::stream::wire::{ChannelFrame, LogMessage, SubscribeParams, EVENT_JOB, EVENT_JOB_LOGGING};

/// A live subscription channel delivering one job's log messages.
///
/// Implementations must deliver messages in arrival order. `recv` returns
/// `Ok(None)` once the server has closed the channel.
#[async_trait]
pub trait LogChannel: Send {
    /// Send the subscription request
    async fn subscribe(&mut self, params: &SubscribeParams) -> Result<(), ClientError>;

    /// Receive the next log message, skipping unrelated frames
    async fn recv(&mut self) -> Result<Option<LogMessage>, ClientError>;

    /// Close the channel. Idempotent.
    async fn close(&mut self);
}

/// Opens log channels against one streaming endpoint
#[async_trait]
pub trait ChannelOpener: Send + Sync {
    type Channel: LogChannel;

    /// Lightweight reachability check against the streaming endpoint
    async fn probe(&self) -> Result<(), ClientError>;

    /// Open a new channel
    async fn open(&self) -> Result<Self::Channel, ClientError>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket-backed log channel
pub struct WsLogChannel {
    ws: WsStream,
}

#[async_trait]
impl LogChannel for WsLogChannel {
    async fn subscribe(&mut self, params: &SubscribeParams) -> Result<(), ClientError> {
        let frame = ChannelFrame {
            event: EVENT_JOB_LOGGING.to_string(),
            data: serde_json::to_value(params)?,
        };
        let text = serde_json::to_string(&frame)?;
        self.ws.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<LogMessage>, ClientError> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    let frame: ChannelFrame = match serde_json::from_str(text.as_str()) {
                        Ok(frame) => frame,
                        Err(_) => {
                            debug!("Skipping unparseable channel frame");
                            continue;
                        }
                    };
                    if frame.event != EVENT_JOB {
                        debug!("Ignoring channel event: {}", frame.event);
                        continue;
                    }
                    let message = serde_json::from_value(frame.data)
                        .map_err(|e| ClientError::DecodeError(e.to_string()))?;
                    return Ok(Some(message));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}

/// Opens WebSocket channels against the Cloud Deploy streaming endpoint
pub struct WsChannelOpener {
    http: reqwest::Client,
    base_url: String,
}

impl WsChannelOpener {
    /// Create an opener for the given API base URL
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn stream_url(&self) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::ConfigError(e.to_string()))?;

        // Change http/https to ws/wss
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            _ => return Err(ClientError::ConfigError("Invalid base URL scheme".to_string())),
        };

        url.set_scheme(scheme)
            .map_err(|_| ClientError::ConfigError("Failed to set scheme".to_string()))?;
        url.set_path("/socket.io/");

        Ok(url)
    }
}

#[async_trait]
impl ChannelOpener for WsChannelOpener {
    type Channel = WsLogChannel;

    async fn probe(&self) -> Result<(), ClientError> {
        let url = format!("{}/socket.io/", self.base_url);
        debug!("Probing streaming endpoint: {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::StreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::StreamUnavailable(format!(
                "probe returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn open(&self) -> Result<Self::Channel, ClientError> {
        let url = self.stream_url()?;
        info!("Connecting to log stream: {}", url);

        let request = http::Request::builder()
            .uri(url.as_str())
            .header("User-Agent", "cloud-deploy-client")
            .body(())
            .map_err(|e| ClientError::ChannelError(e.to_string()))?;

        let (ws, _) = connect_async(request).await?;
        Ok(WsLogChannel { ws })
    }
}
