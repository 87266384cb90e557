//! Wire types for the log streaming channel

use serde::{Deserialize, Serialize};

/// Outbound event name for log subscriptions
pub const EVENT_JOB_LOGGING: &str = "job_logging";

/// Inbound event name carrying log messages
pub const EVENT_JOB: &str = "job";

/// Subscription parameters emitted on the channel after connecting.
///
/// `auth_token` is `None` when the token endpoint failed; the subscription
/// is still sent, with `auth_token: null` on the wire, and the server
/// decides whether to honor the degraded request. Callers relying on
/// authenticated streams should treat a missing token as suspect.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeParams {
    /// Job whose log to stream
    pub log_id: String,

    /// Byte offset to resume from
    pub last_pos: u64,

    /// Request base64 payloads instead of legacy HTML
    pub raw_mode: bool,

    /// Per-job websocket token, if one could be fetched
    pub auth_token: Option<String>,
}

impl SubscribeParams {
    /// Subscription for a full log replay of one job
    pub fn new(job_id: &str, auth_token: Option<String>) -> Self {
        Self {
            log_id: job_id.to_string(),
            last_pos: 0,
            raw_mode: true,
            auth_token,
        }
    }
}

/// A single message pushed over the streaming channel.
///
/// Exactly one of the fields is expected to be set: `raw` on current
/// servers, `html` on older ones, `error` when the server rejects or
/// aborts the subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogMessage {
    /// Base64-encoded log chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,

    /// Legacy HTML-formatted log chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    /// Server-side failure for this stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Envelope framing every channel message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelFrame {
    /// Event name (`job_logging` outbound, `job` inbound)
    pub event: String,

    /// Event payload
    pub data: serde_json::Value,
}
