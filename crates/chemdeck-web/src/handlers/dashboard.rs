//! Dashboard handler: landing page listing every tool.

use axum::{extract::State, response::Html, Json};
use chemdeck_molecules::MoleculeTool;
use crate::render;
use crate::state::SharedState;

/// Navigation HTML template shared across all pages
pub const NAV_HTML: &str = include_str!("../../templates/nav.html");

pub async fn dashboard(State(state): State<SharedState>) -> Html<String> {
    let tools: Vec<&dyn MoleculeTool> = state.registry.iter().map(|t| t.as_ref()).collect();
    let sessions = state.session_count().await;
    Html(render::dashboard(&tools, sessions))
}

/// GET /api/tools - tool manifest
pub async fn api_tools(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(state.registry.manifest())
}
