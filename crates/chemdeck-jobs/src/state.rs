//! Job lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Status of a tool page's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged job state. The result is shared so snapshots stay cheap.
#[derive(Debug)]
pub enum JobState<R> {
    Idle,
    Running {
        job_id: Uuid,
        started_at: DateTime<Utc>,
    },
    Completed {
        job_id: Uuid,
        result: Arc<R>,
        finished_at: DateTime<Utc>,
    },
    Failed {
        job_id: Uuid,
        error: String,
        retryable: bool,
    },
}

// Manual impl: `R` itself need not be `Clone`.
impl<R> Clone for JobState<R> {
    fn clone(&self) -> Self {
        match self {
            JobState::Idle => JobState::Idle,
            JobState::Running { job_id, started_at } => JobState::Running {
                job_id: *job_id,
                started_at: *started_at,
            },
            JobState::Completed { job_id, result, finished_at } => JobState::Completed {
                job_id: *job_id,
                result: Arc::clone(result),
                finished_at: *finished_at,
            },
            JobState::Failed { job_id, error, retryable } => JobState::Failed {
                job_id: *job_id,
                error: error.clone(),
                retryable: *retryable,
            },
        }
    }
}

impl<R> JobState<R> {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Idle => JobStatus::Idle,
            JobState::Running { .. } => JobStatus::Running,
            JobState::Completed { .. } => JobStatus::Completed,
            JobState::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            JobState::Idle => None,
            JobState::Running { job_id, .. }
            | JobState::Completed { job_id, .. }
            | JobState::Failed { job_id, .. } => Some(*job_id),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, JobState::Running { .. })
    }

    pub fn result(&self) -> Option<&Arc<R>> {
        match self {
            JobState::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            JobState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl<R> Default for JobState<R> {
    fn default() -> Self {
        JobState::Idle
    }
}
