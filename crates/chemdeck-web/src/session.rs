//! Per-page server-side state.
//!
//! A `ToolSession` is what one open tool page owns: its drop zones, text
//! parameters, job runner and result view. Nothing is shared between
//! sessions. Dropping a session aborts its pending job and its event
//! forwarder.

use chemdeck_common::{Result, ValidationError};
use chrono::{DateTime, Utc};
use chemdeck_config::Config;
use chemdeck_jobs::{FileDropZone, JobState, ResultDisplay, ResultSet, ResultView, TriggerError, UploadedFile};
use chemdeck_molecules::pdb::RcsbEngine;
use chemdeck_molecules::pipeline::{build_runner, ToolRunner};
use chemdeck_molecules::viewer::StructureViewer;
use chemdeck_molecules::{MoleculeTool, ToolInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::{AppEvent, SharedState};

/// Which input path delivered an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadVia {
    Drop,
    #[default]
    Browse,
}

/// JSON view of a session for `/api/sessions/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session: Uuid,
    pub tool: String,
    pub opened_at: DateTime<Utc>,
    pub status: String,
    pub job_id: Option<Uuid>,
    pub error: Option<String>,
    pub can_run: bool,
    pub results_visible: bool,
    pub files: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub validation: Option<ValidationError>,
    pub display: ResultDisplay,
}

pub struct ToolSession {
    id: Uuid,
    tool: Arc<dyn MoleculeTool>,
    zones: BTreeMap<String, FileDropZone>,
    params: BTreeMap<String, String>,
    runner: ToolRunner,
    view: ResultView,
    validation: Option<ValidationError>,
    opened_at: DateTime<Utc>,
    last_seen: Instant,
    forwarder: JoinHandle<()>,
}

impl ToolSession {
    pub fn open(tool: Arc<dyn MoleculeTool>, config: &Config, events: broadcast::Sender<AppEvent>) -> Result<Self> {
        let id = Uuid::new_v4();
        let runner = build_runner(Arc::clone(&tool), &config.jobs)?;

        let mut zones = BTreeMap::new();
        for field in tool.fields() {
            let Some(upload) = field.upload_config(config.uploads.max_upload_bytes) else {
                continue;
            };
            let tx = events.clone();
            let name = field.name.to_string();
            let zone = FileDropZone::new(field.name, upload).with_on_select(move |file: &UploadedFile| {
                let _ = tx.send(AppEvent::FileSelected {
                    session: id,
                    field: name.clone(),
                    name: file.name.clone(),
                    size: file.size,
                });
            });
            zones.insert(field.name.to_string(), zone);
        }

        let forwarder = spawn_forwarder(id, tool.slug(), &runner, events);
        Ok(Self {
            id,
            tool,
            zones,
            params: BTreeMap::new(),
            runner,
            view: ResultView::default(),
            validation: None,
            opened_at: Utc::now(),
            last_seen: Instant::now(),
            forwarder,
        })
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn tool(&self) -> &Arc<dyn MoleculeTool> { &self.tool }
    pub fn runner(&self) -> &ToolRunner { &self.runner }
    pub fn view(&self) -> &ResultView { &self.view }
    pub fn params(&self) -> &BTreeMap<String, String> { &self.params }
    pub fn validation(&self) -> Option<&ValidationError> { self.validation.as_ref() }

    pub fn zone(&self, field: &str) -> Option<&FileDropZone> {
        self.zones.get(field)
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }

    /// Hand files to a drop zone; only the first is kept.
    pub fn upload(
        &mut self,
        field: &str,
        files: Vec<UploadedFile>,
        via: UploadVia,
    ) -> std::result::Result<(), ValidationError> {
        let zone = self
            .zones
            .get_mut(field)
            .ok_or_else(|| ValidationError::single(field, "this page has no such file input"))?;
        let outcome = match via {
            UploadVia::Drop => {
                zone.drag_over();
                zone.drop_files(files).map(|_| ())
            }
            UploadVia::Browse => zone.browse(files).map(|_| ()),
        };
        match &outcome {
            Ok(()) => {
                if let Some(v) = self.validation.as_mut() {
                    v.fields.retain(|f| f.field != field);
                }
            }
            Err(err) => self.validation = Some(err.clone()),
        }
        outcome
    }

    pub fn clear_file(&mut self, field: &str) -> bool {
        match self.zones.get_mut(field) {
            Some(zone) => {
                zone.clear();
                true
            }
            None => false,
        }
    }

    /// Everything collected so far.
    pub fn input(&self) -> ToolInput {
        let mut input = ToolInput::new(self.tool.slug());
        for (field, zone) in &self.zones {
            if let Some(file) = zone.selected() {
                input = input.with_file(field.clone(), file.clone());
            }
        }
        for (key, value) in &self.params {
            input = input.with_param(key.clone(), value.clone());
        }
        input
    }

    /// Store submitted parameters and trigger the job.
    pub fn run(&mut self, submitted: BTreeMap<String, String>) -> std::result::Result<Uuid, TriggerError> {
        let known: Vec<&'static str> = self
            .tool
            .fields()
            .iter()
            .filter(|f| !f.is_file())
            .map(|f| f.name)
            .collect();
        for (key, value) in submitted {
            if known.contains(&key.as_str()) {
                self.params.insert(key, value);
            }
        }

        match self.runner.run(self.input()) {
            Ok(job_id) => {
                self.validation = None;
                Ok(job_id)
            }
            Err(TriggerError::Invalid(err)) => {
                self.validation = Some(err.clone());
                Err(TriggerError::Invalid(err))
            }
            Err(other) => Err(other),
        }
    }

    pub fn toggle_results(&mut self) -> bool {
        self.view.toggle()
    }

    pub fn result(&self) -> Option<Arc<ResultSet>> {
        self.runner.snapshot().result().cloned()
    }

    pub fn display(&self) -> ResultDisplay {
        let snapshot = self.runner.snapshot();
        self.view.display(snapshot.result().map(|r| r.as_ref()), snapshot.is_running())
    }

    pub fn status(&self) -> SessionStatus {
        let snapshot = self.runner.snapshot();
        SessionStatus {
            session: self.id,
            tool: self.tool.slug().to_string(),
            opened_at: self.opened_at,
            status: snapshot.status().to_string(),
            job_id: snapshot.job_id(),
            error: snapshot.error().map(str::to_string),
            can_run: self.runner.can_trigger(),
            results_visible: self.view.is_visible(),
            files: self
                .zones
                .iter()
                .filter_map(|(field, zone)| zone.selected().map(|f| (field.clone(), f.name.clone())))
                .collect(),
            params: self.params.clone(),
            validation: self.validation.clone(),
            display: self.display(),
        }
    }
}

impl Drop for ToolSession {
    fn drop(&mut self) {
        self.forwarder.abort();
        debug!(session = %self.id, "Session dropped");
    }
}

/// Republish runner state changes as `AppEvent::JobStatus`.
fn spawn_forwarder(
    session: Uuid,
    tool: &str,
    runner: &ToolRunner,
    events: broadcast::Sender<AppEvent>,
) -> JoinHandle<()> {
    let mut rx = runner.subscribe();
    let tool = tool.to_string();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let event = {
                let state = rx.borrow_and_update();
                job_event(session, &tool, &state)
            };
            let _ = events.send(event);
        }
    })
}

fn job_event(session: Uuid, tool: &str, state: &JobState<ResultSet>) -> AppEvent {
    AppEvent::JobStatus {
        session,
        tool: tool.to_string(),
        status: state.status().to_string(),
        job_id: state.job_id(),
        records: state.result().map(|r| r.len()),
        error: state.error().map(str::to_string),
    }
}

/// A structure viewer plus its idle clock.
pub struct ViewerSession {
    pub viewer: StructureViewer<RcsbEngine>,
    last_seen: std::sync::Mutex<Instant>,
}

impl ViewerSession {
    pub fn new(viewer: StructureViewer<RcsbEngine>) -> Self {
        Self { viewer, last_seen: std::sync::Mutex::new(Instant::now()) }
    }

    pub fn id(&self) -> Uuid {
        self.viewer.id()
    }

    pub fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|p| p.into_inner()) = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.lock().unwrap_or_else(|p| p.into_inner()).elapsed()
    }
}

/// Periodically close idle sessions and viewers.
pub fn spawn_sweeper(state: SharedState) -> JoinHandle<()> {
    let period = state.config.sessions.sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let closed = state.sweep_idle().await;
            if closed > 0 {
                info!(closed, "Swept idle sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemdeck_jobs::JobStatus;
    use chemdeck_molecules::build_default_registry;

    fn docking_session(events: broadcast::Sender<AppEvent>) -> ToolSession {
        let registry = build_default_registry();
        let tool = Arc::clone(registry.get("docking").unwrap());
        ToolSession::open(tool, &Config::default(), events).unwrap()
    }

    fn ligand() -> UploadedFile {
        UploadedFile::new("ligand.pdb", Some("chemical/x-pdb".into()), b"HETATM    1  C1  LIG".to_vec())
    }

    #[tokio::test(start_paused = true)]
    async fn test_docking_session_runs_to_completion() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut session = docking_session(tx);

        session.upload("ligand", vec![ligand(), UploadedFile::new("second.pdb", None, vec![1])], UploadVia::Drop).unwrap();
        assert_eq!(session.zone("ligand").unwrap().display_text(), "ligand.pdb");
        assert!(matches!(rx.recv().await.unwrap(), AppEvent::FileSelected { ref name, .. } if name == "ligand.pdb"));

        session.run(BTreeMap::new()).unwrap();
        assert_eq!(session.display(), ResultDisplay::Spinner);
        assert!(matches!(rx.recv().await.unwrap(), AppEvent::JobStatus { ref status, .. } if status == "running"));

        let settled = session.runner().wait_settled().await;
        assert_eq!(settled.status(), JobStatus::Completed);
        match rx.recv().await.unwrap() {
            AppEvent::JobStatus { status, records, .. } => {
                assert_eq!(status, "completed");
                assert_eq!(records, Some(5));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(session.display(), ResultDisplay::Table { .. }));
    }

    #[tokio::test]
    async fn test_empty_run_records_validation() {
        let (tx, _rx) = broadcast::channel(16);
        let mut session = docking_session(tx);

        let err = session.run(BTreeMap::new()).unwrap_err();
        assert!(matches!(err, TriggerError::Invalid(_)));
        assert_eq!(session.runner().status(), JobStatus::Idle);
        assert_eq!(session.validation().unwrap().fields.len(), 1);

        session.upload("ligand", vec![ligand()], UploadVia::Browse).unwrap();
        assert!(session.validation().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_upload_keeps_previous_file() {
        let (tx, _rx) = broadcast::channel(16);
        let mut session = docking_session(tx);
        session.upload("ligand", vec![ligand()], UploadVia::Browse).unwrap();

        let err = session
            .upload("ligand", vec![UploadedFile::new("notes.txt", None, b"hi".to_vec())], UploadVia::Drop)
            .unwrap_err();
        assert!(err.message_for("ligand").unwrap().contains("notes.txt"));
        assert_eq!(session.zone("ligand").unwrap().selected().unwrap().name, "ligand.pdb");
        assert!(!session.zone("ligand").unwrap().is_drag_active());
    }

    #[tokio::test]
    async fn test_unknown_params_are_ignored() {
        let (tx, _rx) = broadcast::channel(16);
        let mut session = docking_session(tx);
        session.upload("ligand", vec![ligand()], UploadVia::Browse).unwrap();

        let mut submitted = BTreeMap::new();
        submitted.insert("exhaustiveness".to_string(), "16".to_string());
        submitted.insert("ligand".to_string(), "spoofed".to_string());
        submitted.insert("bogus".to_string(), "1".to_string());
        session.run(submitted).unwrap();

        let status = session.status();
        assert_eq!(status.params.len(), 1);
        assert_eq!(status.files.get("ligand").map(String::as_str), Some("ligand.pdb"));
    }

    #[tokio::test]
    async fn test_toggle_never_touches_results() {
        let (tx, _rx) = broadcast::channel(16);
        let mut session = docking_session(tx);
        assert!(!session.toggle_results());
        assert!(session.toggle_results());
        assert!(session.result().is_none());
        assert_eq!(session.display(), ResultDisplay::Nothing);
    }
}
