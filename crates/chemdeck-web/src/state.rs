//! Shared application state for the web server.

use chemdeck_config::Config;
use chemdeck_molecules::pdb::RcsbEngine;
use chemdeck_molecules::viewer::{ColorScheme, Representation, StructureViewer};
use chemdeck_molecules::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{WebError, WebResult};
use crate::session::{ToolSession, ViewerSession};

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A tool page session was opened
    SessionOpened { session: Uuid, tool: String },
    /// A session was closed, reset or swept
    SessionClosed { session: Uuid, tool: String, reason: String },
    /// A drop zone accepted a file
    FileSelected { session: Uuid, field: String, name: String, size: u64 },
    /// A job changed state
    JobStatus {
        session: Uuid,
        tool: String,
        status: String,
        job_id: Option<Uuid>,
        records: Option<usize>,
        error: Option<String>,
    },
    /// A viewer finished (or failed) a load
    ViewerUpdated { viewer: Uuid, loaded: Option<String>, error: Option<String> },
}

impl AppEvent {
    /// Matches the serialized `type` tag; used as the SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            AppEvent::SessionOpened { .. } => "session_opened",
            AppEvent::SessionClosed { .. } => "session_closed",
            AppEvent::FileSelected { .. } => "file_selected",
            AppEvent::JobStatus { .. } => "job_status",
            AppEvent::ViewerUpdated { .. } => "viewer_updated",
        }
    }

    /// The page session or viewer this event belongs to.
    pub fn scope(&self) -> Uuid {
        match self {
            AppEvent::SessionOpened { session, .. }
            | AppEvent::SessionClosed { session, .. }
            | AppEvent::FileSelected { session, .. }
            | AppEvent::JobStatus { session, .. } => *session,
            AppEvent::ViewerUpdated { viewer, .. } => *viewer,
        }
    }
}

pub type SessionHandle = Arc<Mutex<ToolSession>>;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub config: Config,
    pub registry: ToolRegistry,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    viewers: RwLock<HashMap<Uuid, Arc<ViewerSession>>>,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new(config: Config, registry: ToolRegistry) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config,
            registry,
            sessions: RwLock::new(HashMap::new()),
            viewers: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Publish to SSE subscribers; having none is fine.
    pub fn emit(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }

    // ── Tool sessions ────────────────────────────────────────────────────────

    pub async fn open_session(&self, slug: &str) -> WebResult<Uuid> {
        let tool = self
            .registry
            .get(slug)
            .cloned()
            .ok_or_else(|| WebError::NotFound(format!("tool {slug}")))?;
        let session = ToolSession::open(tool, &self.config, self.event_tx.clone())?;
        let id = session.id();

        self.sessions.write().await.insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, tool = slug, "Session opened");
        self.emit(AppEvent::SessionOpened { session: id, tool: slug.to_string() });
        Ok(id)
    }

    pub async fn session(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// The session `id`, provided it belongs to tool `slug`.
    pub async fn tool_session(&self, slug: &str, id: Uuid) -> WebResult<SessionHandle> {
        let handle = self
            .session(id)
            .await
            .ok_or_else(|| WebError::NotFound(format!("session {id}")))?;
        if handle.lock().await.tool().slug() != slug {
            return Err(WebError::NotFound(format!("session {id} for tool {slug}")));
        }
        Ok(handle)
    }

    /// Remove a session. Dropping it aborts any pending job.
    pub async fn close_session(&self, id: Uuid, reason: &str) -> bool {
        let Some(handle) = self.sessions.write().await.remove(&id) else {
            return false;
        };
        let tool = handle.lock().await.tool().slug().to_string();
        info!(session = %id, tool = %tool, reason, "Session closed");
        self.emit(AppEvent::SessionClosed { session: id, tool, reason: reason.to_string() });
        true
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    // ── Viewers ──────────────────────────────────────────────────────────────

    pub async fn open_viewer(&self) -> WebResult<Uuid> {
        let cfg = &self.config.viewer;
        let representation = cfg.default_representation.parse().unwrap_or_else(|_| {
            warn!("Unknown default representation {:?}; using cartoon", cfg.default_representation);
            Representation::default()
        });
        let scheme = cfg.default_color_scheme.parse().unwrap_or_else(|_| {
            warn!("Unknown default color scheme {:?}; using chainid", cfg.default_color_scheme);
            ColorScheme::default()
        });

        let engine = RcsbEngine::new(&cfg.rcsb_base_url)?;
        let viewer = ViewerSession::new(StructureViewer::new(engine, representation, scheme));
        let id = viewer.id();
        self.viewers.write().await.insert(id, Arc::new(viewer));
        info!(viewer = %id, "Viewer opened");
        Ok(id)
    }

    pub async fn viewer(&self, id: Uuid) -> WebResult<Arc<ViewerSession>> {
        let viewer = self
            .viewers
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| WebError::NotFound(format!("viewer {id}")))?;
        viewer.touch();
        Ok(viewer)
    }

    pub async fn close_viewer(&self, id: Uuid) -> bool {
        let Some(viewer) = self.viewers.write().await.remove(&id) else {
            return false;
        };
        viewer.viewer.close().await;
        true
    }

    // ── Idle sweep ───────────────────────────────────────────────────────────

    /// Close sessions and viewers idle for longer than `sessions.ttl_secs`.
    pub async fn sweep_idle(&self) -> usize {
        let ttl = self.config.sessions.ttl();

        let mut idle_sessions = Vec::new();
        for (id, handle) in self.sessions.read().await.iter() {
            // A locked session is being used right now.
            if let Ok(session) = handle.try_lock() {
                if session.idle_for() > ttl {
                    idle_sessions.push(*id);
                }
            }
        }
        let idle_viewers: Vec<Uuid> = self
            .viewers
            .read()
            .await
            .iter()
            .filter(|(_, v)| v.idle_for() > ttl)
            .map(|(id, _)| *id)
            .collect();

        let mut closed = 0;
        for id in idle_sessions {
            if self.close_session(id, "idle").await {
                closed += 1;
            }
        }
        for id in idle_viewers {
            if self.close_viewer(id).await {
                closed += 1;
            }
        }
        closed
    }
}

pub type SharedState = Arc<AppState>;
