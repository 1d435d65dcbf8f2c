//! Tool pages: one server-side session per open page.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chemdeck_jobs::{TriggerError, UploadedFile};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{WebError, WebResult};
use crate::render;
use crate::session::{SessionStatus, ToolSession, UploadVia};
use crate::state::SharedState;

#[derive(Debug, Deserialize, Default)]
pub struct UploadQuery {
    #[serde(default)]
    pub via: UploadVia,
}

fn page_url(slug: &str, session: Uuid) -> String {
    format!("/tools/{slug}/{session}")
}

/// The page re-rendered with inline validation messages.
fn invalid_page(session: &ToolSession) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Html(render::tool_page(session))).into_response()
}

/// GET /tools/{slug} - open a fresh session
pub async fn open_tool(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> WebResult<Redirect> {
    let id = state.open_session(&slug).await?;
    Ok(Redirect::to(&page_url(&slug, id)))
}

/// GET /tools/{slug}/{session}
///
/// A session that no longer exists (closed or swept) is replaced by a fresh one.
pub async fn tool_page(
    State(state): State<SharedState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> WebResult<Response> {
    let handle = match state.tool_session(&slug, id).await {
        Ok(handle) => handle,
        Err(WebError::NotFound(_)) if state.registry.get(&slug).is_some() => {
            debug!(session = %id, tool = %slug, "Stale session; opening a new one");
            return Ok(Redirect::to(&format!("/tools/{slug}")).into_response());
        }
        Err(e) => return Err(e),
    };
    let mut session = handle.lock().await;
    session.touch();
    Ok(Html(render::tool_page(&session)).into_response())
}

/// POST /tools/{slug}/{session}/upload?via=drop|browse
pub async fn upload(
    State(state): State<SharedState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> WebResult<Response> {
    let handle = state.tool_session(&slug, id).await?;

    let mut offered: BTreeMap<String, Vec<UploadedFile>> = BTreeMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else { continue };
        // Browsers send an empty part for a file input with nothing chosen.
        let Some(file_name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_string) else {
            continue;
        };
        let mime = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| WebError::BadRequest(e.to_string()))?;
        offered.entry(name).or_default().push(UploadedFile::new(file_name, mime, bytes.to_vec()));
    }

    let mut session = handle.lock().await;
    session.touch();
    let mut rejected = false;
    for (field, files) in offered {
        if let Err(err) = session.upload(&field, files, query.via) {
            warn!(session = %id, field = %field, "Upload rejected: {}", err);
            rejected = true;
        }
    }
    if rejected {
        return Ok(invalid_page(&session));
    }
    Ok(Redirect::to(&page_url(&slug, id)).into_response())
}

/// POST /tools/{slug}/{session}/files/{field}/clear
pub async fn clear_file(
    State(state): State<SharedState>,
    Path((slug, id, field)): Path<(String, Uuid, String)>,
) -> WebResult<Redirect> {
    let handle = state.tool_session(&slug, id).await?;
    let mut session = handle.lock().await;
    session.touch();
    if !session.clear_file(&field) {
        return Err(WebError::NotFound(format!("file input {field}")));
    }
    Ok(Redirect::to(&page_url(&slug, id)))
}

/// POST /tools/{slug}/{session}/run
pub async fn run(
    State(state): State<SharedState>,
    Path((slug, id)): Path<(String, Uuid)>,
    Form(params): Form<BTreeMap<String, String>>,
) -> WebResult<Response> {
    let handle = state.tool_session(&slug, id).await?;
    let mut session = handle.lock().await;
    session.touch();
    match session.run(params) {
        Ok(_) => Ok(Redirect::to(&page_url(&slug, id)).into_response()),
        Err(TriggerError::Invalid(_)) => Ok(invalid_page(&session)),
        Err(e) => Err(e.into()),
    }
}

/// POST /tools/{slug}/{session}/results/toggle
pub async fn toggle_results(
    State(state): State<SharedState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> WebResult<Redirect> {
    let handle = state.tool_session(&slug, id).await?;
    let mut session = handle.lock().await;
    session.touch();
    session.toggle_results();
    Ok(Redirect::to(&page_url(&slug, id)))
}

/// POST /tools/{slug}/{session}/reset - discard the session and start over
pub async fn reset(
    State(state): State<SharedState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> WebResult<Redirect> {
    state.tool_session(&slug, id).await?;
    state.close_session(id, "reset").await;
    let fresh = state.open_session(&slug).await?;
    Ok(Redirect::to(&page_url(&slug, fresh)))
}

/// POST /tools/{slug}/{session}/close - page teardown (sent with `sendBeacon`)
pub async fn close(
    State(state): State<SharedState>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> WebResult<StatusCode> {
    state.tool_session(&slug, id).await?;
    state.close_session(id, "closed").await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/sessions/{session}
pub async fn api_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> WebResult<Json<SessionStatus>> {
    let handle = state
        .session(id)
        .await
        .ok_or_else(|| WebError::NotFound(format!("session {id}")))?;
    let session = handle.lock().await;
    Ok(Json(session.status()))
}
