//! Structure viewer pages.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chemdeck_common::{Result, ValidationError};
use chemdeck_jobs::UploadedFile;
use chemdeck_molecules::viewer::{ColorScheme, Representation, StructureSource};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{WebError, WebResult};
use crate::render;
use crate::session::ViewerSession;
use crate::state::{AppEvent, SharedState};

#[derive(Debug, Deserialize)]
pub struct LoadForm {
    pub pdb_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StyleForm {
    pub representation: Option<String>,
    pub color_scheme: Option<String>,
}

/// The page re-rendered with inline field messages.
fn invalid_page(session: &ViewerSession, err: &ValidationError) -> Response {
    let status = session.viewer.status();
    (StatusCode::UNPROCESSABLE_ENTITY, Html(render::viewer_page(&status, Some(err)))).into_response()
}

/// Redirect back on success; on a failed load show the page with its notification.
fn after_load(state: &SharedState, session: &ViewerSession, outcome: Result<()>) -> WebResult<Response> {
    let status = session.viewer.status();
    state.emit(AppEvent::ViewerUpdated {
        viewer: session.id(),
        loaded: status.loaded.clone(),
        error: outcome.as_ref().err().map(|e| e.to_string()),
    });
    match outcome {
        Ok(()) => Ok(Redirect::to(&format!("/viewer/{}", session.id())).into_response()),
        Err(err) => {
            let code = WebError::from(err).status();
            Ok((code, Html(render::viewer_page(&status, None))).into_response())
        }
    }
}

/// GET /viewer - open a fresh viewer
pub async fn open_viewer(State(state): State<SharedState>) -> WebResult<Redirect> {
    let id = state.open_viewer().await?;
    Ok(Redirect::to(&format!("/viewer/{id}")))
}

/// GET /viewer/{id}
pub async fn viewer_page(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> WebResult<Response> {
    match state.viewer(id).await {
        Ok(session) => Ok(Html(render::viewer_page(&session.viewer.status(), None)).into_response()),
        Err(WebError::NotFound(_)) => Ok(Redirect::to("/viewer").into_response()),
        Err(e) => Err(e),
    }
}

/// POST /viewer/{id}/load - by PDB identifier
pub async fn load(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Form(form): Form<LoadForm>,
) -> WebResult<Response> {
    let session = state.viewer(id).await?;
    let source = match StructureSource::identifier(&form.pdb_id) {
        Ok(source) => source,
        Err(err) => return Ok(invalid_page(&session, &err)),
    };
    let outcome = session.viewer.load(source).await;
    after_load(&state, &session, outcome)
}

/// POST /viewer/{id}/upload - first file of the `structure` field
pub async fn upload(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> WebResult<Response> {
    let session = state.viewer(id).await?;

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(e.to_string()))?
    {
        if file.is_some() || field.name() != Some("structure") {
            continue;
        }
        let Some(name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_string) else {
            continue;
        };
        let mime = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| WebError::BadRequest(e.to_string()))?;
        file = Some(UploadedFile::new(name, mime, bytes.to_vec()));
    }

    let Some(file) = file else {
        return Ok(invalid_page(&session, &ValidationError::single("structure", "Choose a structure file")));
    };
    let outcome = session.viewer.load(StructureSource::File(file)).await;
    after_load(&state, &session, outcome)
}

/// POST /viewer/{id}/style
pub async fn style(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Form(form): Form<StyleForm>,
) -> WebResult<Response> {
    let session = state.viewer(id).await?;
    let representation = form.representation.as_deref().map(str::parse::<Representation>).transpose();
    let scheme = form.color_scheme.as_deref().map(str::parse::<ColorScheme>).transpose();
    let (representation, scheme) = match (representation, scheme) {
        (Ok(r), Ok(c)) => (r, c),
        (r, c) => {
            let mut invalid = ValidationError::new();
            for err in [r.err(), c.err()].into_iter().flatten() {
                invalid.fields.extend(err.fields);
            }
            return Ok(invalid_page(&session, &invalid));
        }
    };
    if let Some(rep) = representation {
        session.viewer.set_representation(rep).await?;
    }
    if let Some(scheme) = scheme {
        session.viewer.set_color_scheme(scheme).await?;
    }
    Ok(Redirect::to(&format!("/viewer/{id}")).into_response())
}

/// POST /viewer/{id}/retry - re-issue the last failed load
pub async fn retry(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> WebResult<Response> {
    let session = state.viewer(id).await?;
    let outcome = session.viewer.retry().await.map(|_| ());
    after_load(&state, &session, outcome)
}

/// POST /viewer/{id}/close
pub async fn close(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> WebResult<StatusCode> {
    if !state.close_viewer(id).await {
        return Err(WebError::NotFound(format!("viewer {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/viewers/{id}/scene - what the NGL stage should draw
pub async fn api_scene(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> WebResult<Json<serde_json::Value>> {
    let session: Arc<ViewerSession> = state.viewer(id).await?;
    let status = session.viewer.status();
    let scene = match status.loaded {
        Some(_) => session.viewer.inspect(|engine| engine.scene().cloned()).await.flatten(),
        None => None,
    };
    Ok(Json(serde_json::json!({ "status": status, "scene": scene })))
}
