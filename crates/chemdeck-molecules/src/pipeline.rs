//! Wires a tool to a job runner using the configured backend.

use chemdeck_common::{ChemdeckError, Result};
use chemdeck_config::{JobBackend, JobsConfig};
use chemdeck_jobs::{FixedDelayExecutor, HttpJobExecutor, JobExecutor, JobRunner, ResultSet};
use std::sync::Arc;
use tracing::debug;

use crate::tool::{MoleculeTool, ToolInput};

pub type ToolRunner = JobRunner<ToolInput, ResultSet>;

/// Build the runner for one page session of `tool`.
///
/// The simulated backend sleeps for the tool's delay (scaled by
/// `delay_scale`) and returns its placeholder table; the http backend
/// ships the input to `backend_url`. Both reject input the tool's
/// validator refuses before anything is started.
pub fn build_runner(tool: Arc<dyn MoleculeTool>, jobs: &JobsConfig) -> Result<ToolRunner> {
    let executor: Arc<dyn JobExecutor<ToolInput, ResultSet>> = match jobs.backend {
        JobBackend::Simulated => {
            let delay = jobs.scaled_delay(tool.simulated_delay());
            let producer = Arc::clone(&tool);
            Arc::new(FixedDelayExecutor::new(delay, move |input: ToolInput| {
                producer.placeholder_results(&input)
            }))
        }
        JobBackend::Http => {
            let url = jobs.backend_url.as_deref().ok_or_else(|| {
                ChemdeckError::Config("jobs.backend = \"http\" requires jobs.backend_url".into())
            })?;
            Arc::new(HttpJobExecutor::new(url, jobs.poll_interval(), jobs.max_polls)?)
        }
    };

    debug!(tool = tool.slug(), backend = ?jobs.backend, "Building job runner");
    let validator = Arc::clone(&tool);
    Ok(JobRunner::new(tool.slug(), executor).with_validator(move |input: &ToolInput| validator.validate(input)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docking::DockingTool;
    use crate::registry::build_default_registry;
    use chemdeck_jobs::{JobStatus, TriggerError, UploadedFile};
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_docking_scenario() {
        let runner = build_runner(Arc::new(DockingTool), &JobsConfig::default()).unwrap();
        assert_eq!(runner.executor_name(), "fixed_delay");
        let input = ToolInput::new("docking")
            .with_file("ligand", UploadedFile::new("ligand.pdb", None, b"HETATM".to_vec()));

        let start = Instant::now();
        runner.run(input).unwrap();
        assert_eq!(runner.status(), JobStatus::Running);

        let settled = runner.wait_settled().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1500) && elapsed <= Duration::from_millis(3100));
        assert_eq!(settled.status(), JobStatus::Completed);
        assert!(!settled.result().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_inputs_never_start() {
        let registry = build_default_registry();
        for tool in registry.iter() {
            let runner = build_runner(Arc::clone(tool), &JobsConfig::default()).unwrap();
            let err = runner.run(ToolInput::new(tool.slug())).unwrap_err();
            assert!(matches!(err, TriggerError::Invalid(_)), "{} started without input", tool.slug());
            assert_eq!(runner.status(), JobStatus::Idle);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_scale_applies() {
        let jobs = JobsConfig { delay_scale: 0.5, ..Default::default() };
        let runner = build_runner(Arc::new(DockingTool), &jobs).unwrap();
        let input = ToolInput::new("docking")
            .with_file("ligand", UploadedFile::new("ligand.pdb", None, vec![1]));

        let start = Instant::now();
        runner.run(input).unwrap();
        runner.wait_settled().await;
        assert!(start.elapsed() < Duration::from_millis(1600));
    }

    #[test]
    fn test_http_backend_needs_url() {
        let jobs = JobsConfig { backend: JobBackend::Http, ..Default::default() };
        let err = build_runner(Arc::new(DockingTool), &jobs).err().unwrap();
        assert!(matches!(err, ChemdeckError::Config(_)));
    }

    #[tokio::test]
    async fn test_http_backend_selected() {
        let jobs = JobsConfig {
            backend: JobBackend::Http,
            backend_url: Some("http://127.0.0.1:9/api".into()),
            ..Default::default()
        };
        let runner = build_runner(Arc::new(DockingTool), &jobs).unwrap();
        assert_eq!(runner.executor_name(), "http");
    }
}
