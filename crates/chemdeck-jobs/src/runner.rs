//! The generic job trigger and state machine behind every tool page.
//!
//! `JobRunner` owns a tagged [`JobState`] published through a
//! `tokio::sync::watch` channel and an injectable [`JobExecutor`]. It allows one
//! job in flight; the spawned task is aborted on `reset` and when the runner
//! is dropped, so a closed page never leaks its timer.

use chemdeck_common::ValidationError;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::executor::JobExecutor;
use crate::state::{JobState, JobStatus};

pub type Validator<I> = Arc<dyn Fn(&I) -> Result<(), ValidationError> + Send + Sync>;

/// Why a trigger did not start a job. The runner's state is unchanged in both cases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error("A job is already running")]
    AlreadyRunning,
}

pub struct JobRunner<I, R> {
    label: String,
    executor: Arc<dyn JobExecutor<I, R>>,
    validator: Option<Validator<I>>,
    state: Arc<watch::Sender<JobState<R>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<I, R> JobRunner<I, R>
where
    I: Send + 'static,
    R: Send + Sync + 'static,
{
    pub fn new(label: impl Into<String>, executor: Arc<dyn JobExecutor<I, R>>) -> Self {
        let (tx, _rx) = watch::channel(JobState::Idle);
        Self {
            label: label.into(),
            executor,
            validator: None,
            state: Arc::new(tx),
            task: Mutex::new(None),
        }
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&I) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn label(&self) -> &str { &self.label }

    pub fn executor_name(&self) -> &str { self.executor.name() }

    pub fn status(&self) -> JobStatus {
        self.state.borrow().status()
    }

    pub fn snapshot(&self) -> JobState<R> {
        self.state.borrow().clone()
    }

    /// False while a job is in flight.
    pub fn can_trigger(&self) -> bool {
        !self.state.borrow().is_running()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobState<R>> {
        self.state.subscribe()
    }

    /// Validate `input` and start a job. On success the runner is `Running`
    /// before this returns and any previous result is discarded.
    pub fn run(&self, input: I) -> Result<Uuid, TriggerError> {
        if !self.can_trigger() {
            warn!(runner = %self.label, "Trigger ignored: job already running");
            return Err(TriggerError::AlreadyRunning);
        }

        if let Some(validate) = &self.validator {
            if let Err(err) = validate(&input) {
                warn!(runner = %self.label, "Validation failed: {}", err);
                return Err(TriggerError::Invalid(err));
            }
        }

        let job_id = Uuid::new_v4();
        let started = self.state.send_if_modified(|current| {
            if current.is_running() {
                return false;
            }
            *current = JobState::Running { job_id, started_at: Utc::now() };
            true
        });
        if !started {
            return Err(TriggerError::AlreadyRunning);
        }

        info!(runner = %self.label, %job_id, executor = self.executor.name(), "Job started");

        let executor = Arc::clone(&self.executor);
        let state = Arc::clone(&self.state);
        let label = self.label.clone();
        let handle = tokio::spawn(async move {
            let next = match executor.execute(input).await {
                Ok(result) => JobState::Completed {
                    job_id,
                    result: Arc::new(result),
                    finished_at: Utc::now(),
                },
                Err(err) => {
                    warn!(runner = %label, %job_id, "Job failed: {}", err);
                    JobState::Failed {
                        job_id,
                        retryable: err.is_retryable(),
                        error: err.to_string(),
                    }
                }
            };

            // A reset or newer job owns the state now.
            let applied = state.send_if_modified(|current| {
                if current.is_running() && current.job_id() == Some(job_id) {
                    *current = next;
                    true
                } else {
                    false
                }
            });
            if applied {
                info!(runner = %label, %job_id, "Job settled");
            } else {
                debug!(runner = %label, %job_id, "Discarding stale job outcome");
            }
        });

        if let Some(previous) = self.lock_task().replace(handle) {
            previous.abort();
        }
        Ok(job_id)
    }

    /// Abort any in-flight job and return to `Idle`.
    pub fn reset(&self) {
        self.abort_task();
        self.state.send_replace(JobState::Idle);
        debug!(runner = %self.label, "Runner reset");
    }

    /// Wait until no job is running and return that state.
    pub async fn wait_settled(&self) -> JobState<R> {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|s| !s.is_running()).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }

    fn abort_task(&self) {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
        }
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<I, R> Drop for JobRunner<I, R> {
    fn drop(&mut self) {
        let slot = self.task.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::FixedDelayExecutor;
    use async_trait::async_trait;
    use chemdeck_common::ChemdeckError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn counting_runner(calls: Arc<AtomicUsize>, delay_ms: u64) -> JobRunner<String, Vec<String>> {
        let exec = FixedDelayExecutor::new(Duration::from_millis(delay_ms), move |name: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![format!("result for {name}")]
        });
        JobRunner::new("docking", Arc::new(exec)).with_validator(|name: &String| {
            if name.trim().is_empty() {
                Err(ValidationError::single("ligand", "A ligand file is required"))
            } else {
                Ok(())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_input_stays_idle() {
        let runner = counting_runner(Arc::new(AtomicUsize::new(0)), 2000);
        let rx = runner.subscribe();

        let err = runner.run(String::new()).unwrap_err();
        assert!(matches!(err, TriggerError::Invalid(ref v) if v.fields.len() == 1));
        assert_eq!(runner.status(), JobStatus::Idle);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_running_completed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = counting_runner(calls.clone(), 3000);
        let start = Instant::now();

        runner.run("ligand.pdb".to_string()).unwrap();
        assert_eq!(runner.status(), JobStatus::Running);
        assert!(!runner.can_trigger());
        assert_eq!(runner.run("again.pdb".to_string()), Err(TriggerError::AlreadyRunning));

        let settled = runner.wait_settled().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1500) && elapsed <= Duration::from_millis(3100));
        assert_eq!(settled.status(), JobStatus::Completed);
        assert_eq!(**settled.result().unwrap(), vec!["result for ligand.pdb".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(runner.can_trigger());
    }

    #[tokio::test]
    async fn test_wait_settled_returns_idle_without_job() {
        let runner = counting_runner(Arc::new(AtomicUsize::new(0)), 1500);
        let settled = runner.wait_settled().await;
        assert_eq!(settled.status(), JobStatus::Idle);
        assert!(settled.result().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rerun_discards_previous_result() {
        let runner = counting_runner(Arc::new(AtomicUsize::new(0)), 1500);
        runner.run("a.pdb".to_string()).unwrap();
        runner.wait_settled().await;

        let second = runner.run("b.pdb".to_string()).unwrap();
        let snapshot = runner.snapshot();
        assert!(snapshot.result().is_none());
        assert_eq!(snapshot.job_id(), Some(second));
        let settled = runner.wait_settled().await;
        assert_eq!(settled.result().unwrap()[0], "result for b.pdb");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_job() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = counting_runner(calls.clone(), 2000);
        runner.run("ligand.pdb".to_string()).unwrap();
        runner.reset();
        assert_eq!(runner.status(), JobStatus::Idle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runner.status(), JobStatus::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_job() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = counting_runner(calls.clone(), 2000);
        runner.run("ligand.pdb".to_string()).unwrap();
        drop(runner);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    struct Broken;

    #[async_trait]
    impl JobExecutor<String, Vec<String>> for Broken {
        async fn execute(&self, _input: String) -> chemdeck_common::Result<Vec<String>> {
            Err(ChemdeckError::Backend("queue unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_executor_error_fails_job() {
        let runner: JobRunner<String, Vec<String>> = JobRunner::new("similarity", Arc::new(Broken));
        runner.run("CCO".to_string()).unwrap();
        match runner.wait_settled().await {
            JobState::Failed { error, retryable, .. } => {
                assert!(error.contains("queue unavailable"));
                assert!(retryable);
            }
            other => panic!("expected failure, got {:?}", other.status()),
        }
    }
}
