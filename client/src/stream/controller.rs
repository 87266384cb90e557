//! Log stream controller
//!
//! Drives the full lifecycle of observing a job's output: pre-stream
//! status polling, channel handshake, message decoding and stream
//! termination. Decoded log chunks and classified failures are handed to
//! caller-supplied callbacks; the call itself only fails on status-poll
//! transport errors (see [`PollFailurePolicy`]).

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::ClientError;
use crate::http::jobs::JobSource;
use crate::models::job::JobStatus;
use crate::sanitize::{trim_ansi_sequences, trim_markup_tags};
use crate::stream::channel::{ChannelOpener, LogChannel};
use crate::stream::wire::{LogMessage, SubscribeParams};

/// Signal that ends a streaming call early, in the worker-shutdown idiom
pub type ShutdownSignal = Pin<Box<dyn Future<Output = ()> + Send>>;

/// What to do when a status re-fetch fails mid-stream.
///
/// The historical behavior is `Fatal`: the whole call aborts and in-flight
/// trailing messages are lost. `Retry` absorbs a bounded number of
/// consecutive failures instead.
#[derive(Debug, Clone)]
pub enum PollFailurePolicy {
    /// Abort the call on the first failed status poll
    Fatal,

    /// Retry failed status polls before giving up
    Retry {
        /// Consecutive failures tolerated per poll
        attempts: u32,

        /// Delay between retries
        delay: Duration,
    },
}

/// Streaming options
#[derive(Debug, Clone)]
pub struct Options {
    /// Block until the job leaves `init` instead of refusing to stream
    pub wait_for_start: bool,

    /// Strip ANSI escape sequences from every delivered chunk
    pub strip_color: bool,

    /// Interval for start-polling, message windows and the final drain
    pub poll_interval: Duration,

    /// Mid-stream status poll failure handling
    pub poll_failure: PollFailurePolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            wait_for_start: false,
            strip_color: false,
            poll_interval: Duration::from_secs(3),
            poll_failure: PollFailurePolicy::Fatal,
        }
    }
}

/// Streams one job's log output to a pair of callbacks.
///
/// Each call to [`run`](Self::run) owns exactly one channel session; the
/// session never outlives the call, including on early-error paths.
pub struct LogStreamer<S, O> {
    jobs: S,
    opener: O,
    options: Options,
}

impl<S, O> LogStreamer<S, O>
where
    S: JobSource,
    O: ChannelOpener,
{
    /// Create a streamer over a job source and a channel opener
    pub fn new(jobs: S, opener: O, options: Options) -> Self {
        Self {
            jobs,
            opener,
            options,
        }
    }

    /// Stream the job's log until the job reaches a terminal status.
    ///
    /// `on_message` receives each decoded chunk in arrival order.
    /// `on_error` receives classified failures; only status-poll transport
    /// errors abort the call (returned as `Err`), everything else is
    /// reported through the callback and the stream continues or stops per
    /// the failure kind.
    pub async fn run(
        &self,
        job_id: &str,
        on_message: impl FnMut(String),
        on_error: impl FnMut(ClientError),
    ) -> Result<(), ClientError> {
        self.run_with_shutdown(job_id, on_message, on_error, Box::pin(std::future::pending()))
            .await
    }

    /// Like [`run`](Self::run), but ends early when `shutdown` completes.
    ///
    /// On shutdown the controller still performs the final drain window and
    /// releases the channel before returning `Ok`.
    pub async fn run_with_shutdown(
        &self,
        job_id: &str,
        mut on_message: impl FnMut(String),
        mut on_error: impl FnMut(ClientError),
        mut shutdown: ShutdownSignal,
    ) -> Result<(), ClientError> {
        let on_message: &mut dyn FnMut(String) = &mut on_message;
        let on_error: &mut dyn FnMut(ClientError) = &mut on_error;

        let mut job = self.jobs.job(job_id).await?;

        if self.options.wait_for_start {
            while job.status == JobStatus::Init {
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("Shutdown requested while waiting for job {} to start", job_id);
                        return Ok(());
                    }
                    _ = tokio::time::sleep(self.options.poll_interval) => {}
                }
                job = self.jobs.job(job_id).await?;
            }
        }

        if job.status == JobStatus::Init {
            on_error(ClientError::JobNotStarted);
            return Ok(());
        }

        if let Err(e) = self.opener.probe().await {
            on_error(e);
            return Ok(());
        }

        // Quirk kept from earlier client generations: a failed token fetch
        // does not abort the stream. The subscription is sent with a null
        // token and the server decides whether to honor it.
        let token = match self.jobs.websocket_token(job_id).await {
            Ok(t) => Some(t.token),
            Err(e) => {
                warn!("Websocket token fetch failed, subscribing without auth: {}", e);
                None
            }
        };

        let mut channel = self.opener.open().await?;
        let params = SubscribeParams::new(job_id, token);

        // The channel must be released on every path from here on
        let result = self
            .stream_until_done(&mut channel, &params, job.status, job_id, on_message, on_error, &mut shutdown)
            .await;
        channel.close().await;
        result
    }

    /// Streaming and draining states: interleave message windows with
    /// status polls until the job terminates, then drain one final window.
    #[allow(clippy::too_many_arguments)]
    async fn stream_until_done<C: LogChannel>(
        &self,
        channel: &mut C,
        params: &SubscribeParams,
        mut status: JobStatus,
        job_id: &str,
        on_message: &mut dyn FnMut(String),
        on_error: &mut dyn FnMut(ClientError),
        shutdown: &mut ShutdownSignal,
    ) -> Result<(), ClientError> {
        channel.subscribe(params).await?;

        let mut channel_open = true;
        while status == JobStatus::Started {
            let interrupted = tokio::select! {
                _ = &mut *shutdown => true,
                _ = pump_window(channel, &mut channel_open, &self.options, on_message, on_error) => false,
            };
            if interrupted {
                info!("Shutdown requested, draining log stream for job {}", job_id);
                break;
            }
            status = self.poll_status(job_id).await?;
        }

        debug!("Job {} is no longer running ({}), draining", job_id, status);
        pump_window(channel, &mut channel_open, &self.options, on_message, on_error).await;
        Ok(())
    }

    /// Re-fetch job status between windows. Failures here are fatal under
    /// the default policy; `Retry` absorbs a bounded number of them.
    async fn poll_status(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        match self.options.poll_failure {
            PollFailurePolicy::Fatal => Ok(self.jobs.job(job_id).await?.status),
            PollFailurePolicy::Retry { attempts, delay } => {
                let mut failures = 0;
                loop {
                    match self.jobs.job(job_id).await {
                        Ok(job) => return Ok(job.status),
                        Err(e) if failures < attempts => {
                            failures += 1;
                            warn!("Status poll failed ({}/{}): {}", failures, attempts, e);
                            tokio::time::sleep(delay).await;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }
}

/// Deliver messages for up to one poll interval.
///
/// Once the server has closed the channel the remainder of the window is
/// slept out, so the status-poll cadence is unchanged.
async fn pump_window<C: LogChannel>(
    channel: &mut C,
    channel_open: &mut bool,
    options: &Options,
    on_message: &mut dyn FnMut(String),
    on_error: &mut dyn FnMut(ClientError),
) {
    let deadline = Instant::now() + options.poll_interval;
    while *channel_open {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        match tokio::time::timeout(remaining, channel.recv()).await {
            Err(_) => return,
            Ok(Ok(Some(message))) => dispatch(options, message, on_message, on_error),
            Ok(Ok(None)) => {
                debug!("Log channel closed by server");
                *channel_open = false;
            }
            Ok(Err(e)) => on_error(e),
        }
    }
    tokio::time::sleep_until(deadline).await;
}

/// Per-message pipeline. Failures are reported, never propagated; the
/// stream keeps going.
fn dispatch(
    options: &Options,
    message: LogMessage,
    on_message: &mut dyn FnMut(String),
    on_error: &mut dyn FnMut(ClientError),
) {
    if let Some(error) = message.error {
        on_error(ClientError::StreamError(error));
        return;
    }
    match decode_message(options, message) {
        Ok(text) => on_message(text),
        Err(e) => on_error(e),
    }
}

fn decode_message(options: &Options, message: LogMessage) -> Result<String, ClientError> {
    let mut text = match message.raw {
        Some(raw) => {
            let bytes = BASE64
                .decode(raw.as_bytes())
                .map_err(|e| ClientError::DecodeError(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| ClientError::DecodeError(e.to_string()))?
        }
        None => {
            // Backward compatibility: old servers push HTML meant for the web UI
            let html = message.html.ok_or_else(|| {
                ClientError::DecodeError("log message carries neither raw nor html".to_string())
            })?;
            let mut text = trim_markup_tags(&html);
            text.push('\n');
            text
        }
    };

    if options.strip_color {
        text = trim_ansi_sequences(&text);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(strip_color: bool) -> Options {
        Options {
            strip_color,
            ..Options::default()
        }
    }

    fn raw(payload: &str) -> LogMessage {
        LogMessage {
            raw: Some(BASE64.encode(payload)),
            ..LogMessage::default()
        }
    }

    #[test]
    fn test_decode_raw_payload() {
        let text = decode_message(&options(false), raw("hello")).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_decode_html_fallback_appends_newline() {
        let message = LogMessage {
            html: Some("<h1>hi</h1><div class=\"panel panel-default\">bye".to_string()),
            ..LogMessage::default()
        };
        let text = decode_message(&options(false), message).unwrap();
        assert_eq!(text, "hi\nbye\n");
    }

    #[test]
    fn test_decode_strips_color_when_asked() {
        let text = decode_message(&options(true), raw("\x1b[32mSTATE: Started\x1b[0m")).unwrap();
        assert_eq!(text, "STATE: Started");

        let text = decode_message(&options(false), raw("\x1b[32mx\x1b[0m")).unwrap();
        assert_eq!(text, "\x1b[32mx\x1b[0m");
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let message = LogMessage {
            raw: Some("not base64!".to_string()),
            ..LogMessage::default()
        };
        assert!(matches!(
            decode_message(&options(false), message),
            Err(ClientError::DecodeError(_))
        ));
    }

    #[test]
    fn test_decode_rejects_empty_message() {
        assert!(matches!(
            decode_message(&options(false), LogMessage::default()),
            Err(ClientError::DecodeError(_))
        ));
    }

    #[test]
    fn test_dispatch_routes_error_field() {
        let mut received = Vec::new();
        let mut errors = Vec::new();
        let message = LogMessage {
            error: Some("boom".to_string()),
            ..LogMessage::default()
        };
        dispatch(
            &options(false),
            message,
            &mut |text| received.push(text),
            &mut |e| errors.push(e),
        );
        assert!(received.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ClientError::StreamError(msg) if msg == "boom"));
    }
}
