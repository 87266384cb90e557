//! Job models

use serde::{Deserialize, Serialize};

/// Lifecycle status of a job, as reported by the API.
///
/// `Init` and `Started` are the only non-terminal states. Transitions are
/// driven entirely server-side; the client only observes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, not yet picked up by a worker
    Init,

    /// Currently executing
    Started,

    /// Cancelled before execution
    Cancelled,

    /// Completed successfully
    Done,

    /// Completed with an error
    Failed,

    /// Interrupted while executing
    Aborted,
}

impl JobStatus {
    /// True once the job can no longer produce output
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Init | JobStatus::Started)
    }

    /// True while the job is executing
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Started)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Init => "init",
            JobStatus::Started => "started",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::Aborted => "aborted",
        };
        write!(f, "{}", s)
    }
}

/// Orchestration command a job carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobCommand {
    BuildImage,
    CreateInstance,
    Deploy,
    DestroyAllInstances,
    ExecuteScript,
    PrepareBlueGreen,
    PurgeBlueGreen,
    RecreateInstances,
    Redeploy,
    SwapBlueGreen,
    UpdateAutoscaling,
    UpdateLifecycleHooks,
    DestroyInstance,
    Rollback,
}

/// A job record retrieved from the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    #[serde(rename = "_id")]
    pub id: String,

    /// Application this job belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Command being executed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<JobCommand>,

    /// Current status
    pub status: JobStatus,

    /// User that created the job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Opaque command options (deployment strategies etc.)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Last update timestamp, as received from the API
    #[serde(rename = "_updated", default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

/// Short-lived credential authorizing one job's log subscription.
///
/// Fetched fresh for every streaming session, never cached.
#[derive(Debug, Clone, Deserialize)]
pub struct WebsocketToken {
    pub token: String,
}
