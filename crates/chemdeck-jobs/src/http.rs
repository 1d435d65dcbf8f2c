//! Executor backed by a remote job API (submit / poll / fetch).
//!
//! Wire contract:
//!   POST {base}/jobs              multipart: `input` JSON part + one part per file
//!                                 -> { "job_id": "..." }
//!   GET  {base}/jobs/{id}         -> { "status": "queued|running|completed|failed", "error"? }
//!   GET  {base}/jobs/{id}/result  -> { "records": [ { field: scalar, ... }, ... ] }

use async_trait::async_trait;
use chemdeck_common::{ChemdeckError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::executor::JobExecutor;
use crate::results::{ResultRecord, ResultSet};
use crate::upload::UploadedFile;

/// What an input must expose to be shipped to the remote API.
pub trait JobPayload: Send + Sync + 'static {
    /// Tool slug the backend dispatches on.
    fn tool(&self) -> &str;
    /// Non-file parameters as a JSON object.
    fn params(&self) -> Value;
    /// Files keyed by form field.
    fn attachments(&self) -> Vec<(&str, &UploadedFile)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: RemoteStatus,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultResponse {
    records: Vec<serde_json::Map<String, Value>>,
}

pub struct HttpJobExecutor {
    client: Client,
    base_url: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl HttpJobExecutor {
    pub fn new(base_url: impl Into<String>, poll_interval: Duration, max_polls: u32) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval,
            max_polls,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a job and return the backend's job id.
    pub async fn submit<I: JobPayload>(&self, input: &I) -> Result<String> {
        let envelope = serde_json::json!({
            "tool": input.tool(),
            "input": input.params(),
        });
        let mut form = Form::new().part(
            "input",
            Part::text(serde_json::to_string(&envelope)?).mime_str("application/json")?,
        );
        for (field, file) in input.attachments() {
            let mut part = Part::bytes(file.content.to_vec()).file_name(file.name.clone());
            if let Some(mime) = &file.mime {
                part = part.mime_str(mime)?;
            }
            form = form.part(field.to_string(), part);
        }

        let resp: SubmitResponse = self.client
            .post(format!("{}/jobs", self.base_url))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(tool = input.tool(), job_id = %resp.job_id, "Submitted job to backend");
        Ok(resp.job_id)
    }

    pub async fn poll(&self, job_id: &str) -> Result<(RemoteStatus, Option<String>)> {
        let resp: StatusResponse = self.client
            .get(format!("{}/jobs/{}", self.base_url, job_id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok((resp.status, resp.error))
    }

    pub async fn fetch(&self, job_id: &str) -> Result<ResultSet> {
        let resp: ResultResponse = self.client
            .get(format!("{}/jobs/{}/result", self.base_url, job_id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let records = resp.records.into_iter().map(ResultRecord::from_json_object).collect();
        ResultSet::new(records).map_err(|e| ChemdeckError::Backend(format!("Malformed result for job {job_id}: {e}")))
    }

    /// Poll until the job settles, sleeping `poll_interval` between checks.
    async fn wait_for(&self, job_id: &str) -> Result<()> {
        for attempt in 1..=self.max_polls {
            match self.poll(job_id).await? {
                (RemoteStatus::Completed, _) => return Ok(()),
                (RemoteStatus::Failed, error) => {
                    let msg = error.unwrap_or_else(|| "no reason given".to_string());
                    warn!(job_id, "Backend reported failure: {}", msg);
                    return Err(ChemdeckError::Backend(format!("Job {job_id} failed: {msg}")));
                }
                (status, _) => {
                    debug!(job_id, attempt, ?status, "Job still pending");
                    if attempt < self.max_polls {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }
        Err(ChemdeckError::Backend(format!(
            "Job {job_id} did not finish after {} polls",
            self.max_polls
        )))
    }
}

#[async_trait]
impl<I: JobPayload> JobExecutor<I, ResultSet> for HttpJobExecutor {
    async fn execute(&self, input: I) -> Result<ResultSet> {
        let job_id = self.submit(&input).await?;
        self.wait_for(&job_id).await?;
        self.fetch(&job_id).await
    }

    fn name(&self) -> &str { "http" }
}
