//! Axum router: maps all URL paths to handlers.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{
    dashboard::{api_tools, dashboard},
    tools::{api_session, clear_file, close, open_tool, reset, run, toggle_results, tool_page, upload},
    viewer::{self, api_scene, open_viewer, viewer_page},
};
use crate::sse::sse_handler;
use crate::state::SharedState;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build and return the full Axum router.
pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.config.uploads.max_upload_bytes as usize + MULTIPART_OVERHEAD;
    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        // Pages
        .route("/",                                    get(dashboard))
        .route("/tools/{slug}",                        get(open_tool))
        .route("/tools/{slug}/{session}",              get(tool_page))
        .route("/tools/{slug}/{session}/upload",       post(upload))
        .route("/tools/{slug}/{session}/files/{field}/clear", post(clear_file))
        .route("/tools/{slug}/{session}/run",          post(run))
        .route("/tools/{slug}/{session}/results/toggle", post(toggle_results))
        .route("/tools/{slug}/{session}/reset",        post(reset))
        .route("/tools/{slug}/{session}/close",        post(close))

        // Structure viewer
        .route("/viewer",              get(open_viewer))
        .route("/viewer/{id}",         get(viewer_page))
        .route("/viewer/{id}/load",    post(viewer::load))
        .route("/viewer/{id}/upload",  post(viewer::upload))
        .route("/viewer/{id}/style",   post(viewer::style))
        .route("/viewer/{id}/retry",   post(viewer::retry))
        .route("/viewer/{id}/close",   post(viewer::close))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // API endpoints
        .route("/api/tools",               get(api_tools))
        .route("/api/sessions/{session}",  get(api_session))
        .route("/api/viewers/{id}/scene",  get(api_scene))

        // Static files
        .nest_service("/static", ServeDir::new(static_dir))

        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
