//! HTML fragments shared by the page handlers.

use chemdeck_common::ValidationError;
use chemdeck_jobs::{FileDropZone, JobStatus, ResultDisplay};
use chemdeck_molecules::viewer::{ColorScheme, NotificationLevel, Representation, ViewerStatus};
use chemdeck_molecules::{FieldKind, FieldSpec, MoleculeTool};

use crate::handlers::dashboard::NAV_HTML;
use crate::session::ToolSession;

/// Escape text for HTML bodies and double-quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full document around `body`.
pub fn page(title: &str, body: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{} — ChemDeck</title>
    <link rel="stylesheet" href="/static/css/main.css?v=0.1.0">
</head>
<body>
<div class="app-container">
{}
<main class="main-content">
{}
</main>
</div>
<script src="/static/js/main.js"></script>
</body>
</html>"#, escape(title), NAV_HTML, body)
}

pub fn status_badge(status: JobStatus) -> String {
    let class = match status {
        JobStatus::Idle => "badge-outline",
        JobStatus::Running => "badge-warning",
        JobStatus::Completed => "badge-success",
        JobStatus::Failed => "badge-danger",
    };
    format!(r#"<span class="badge {}" data-status="{}">{}</span>"#, class, status, status)
}

fn field_error(message: Option<&str>) -> String {
    message
        .map(|m| format!(r#"<div class="field-error" role="alert">{}</div>"#, escape(m)))
        .unwrap_or_default()
}

/// One drop zone: a browse form plus the drag target the script wires up.
pub fn drop_zone(zone: &FileDropZone, base: &str, error: Option<&str>, locked: bool) -> String {
    let field = escape(zone.field());
    let config = zone.config();
    let selected = zone.selected();
    let class = if selected.is_some() { "dropzone has-file" } else { "dropzone" };
    let text = escape(zone.display_text());
    let size = selected
        .map(|f| format!(r#"<span class="text-muted small">{} bytes</span>"#, f.size))
        .unwrap_or_default();
    let clear = match selected {
        Some(_) if !locked => format!(
            r#"<form method="post" action="{base}/files/{field}/clear" class="inline">
                <button type="submit" class="btn btn-outline btn-sm">Remove</button>
            </form>"#
        ),
        _ => String::new(),
    };
    let disabled = if locked { " disabled" } else { "" };

    format!(r#"
    <div class="form-group">
        <label class="form-label">{label}</label>
        <form method="post" action="{base}/upload?via=browse" enctype="multipart/form-data"
              class="{class}" data-field="{field}" data-upload="{base}/upload?via=drop">
            <input type="file" name="{field}" id="file-{field}" accept="{accept}" class="dropzone-input"{disabled}>
            <label for="file-{field}" class="dropzone-text">{text}</label>
            {size}
            <noscript><button type="submit" class="btn btn-outline btn-sm">Upload</button></noscript>
        </form>
        {clear}
        {error}
    </div>"#,
        label = escape(&config.label),
        accept = escape(&config.accept_attr()),
        error = field_error(error),
    )
}

/// A text or select input inside the run form.
pub fn field_input(field: &FieldSpec, value: Option<&str>, error: Option<&str>) -> String {
    let name = field.name;
    let control = match field.kind {
        FieldKind::Text { placeholder } => format!(
            r#"<input type="text" name="{name}" id="{name}" class="form-control" placeholder="{}" value="{}">"#,
            escape(placeholder),
            escape(value.unwrap_or_default()),
        ),
        FieldKind::Select { options } => {
            let opts: String = options
                .iter()
                .map(|o| {
                    let selected = if value == Some(*o) { " selected" } else { "" };
                    format!(r#"<option value="{0}"{1}>{0}</option>"#, escape(o), selected)
                })
                .collect();
            format!(r#"<select name="{name}" id="{name}" class="form-control">{opts}</select>"#)
        }
        FieldKind::File { .. } => return String::new(),
    };
    let required = if field.required { r#" <span class="text-danger">*</span>"# } else { "" };

    format!(r#"
        <div class="form-group">
            <label class="form-label" for="{name}">{}{required}</label>
            {control}
            <div class="text-muted small">{}</div>
            {}
        </div>"#,
        escape(field.label),
        escape(field.description),
        field_error(error),
    )
}

/// The result area for a `ResultDisplay`.
pub fn results(display: &ResultDisplay, base: &str) -> String {
    match display {
        ResultDisplay::Spinner => r#"<div class="card results" aria-busy="true">
            <div class="spinner"></div>
            <p class="text-muted text-center">Running…</p>
        </div>"#.to_string(),
        ResultDisplay::Nothing => String::new(),
        ResultDisplay::Collapsed { records } => format!(r#"<div class="card results">
            <div class="card-header">
                <div>Results <span class="text-muted">({records} hidden)</span></div>
                <form method="post" action="{base}/results/toggle"><button class="btn btn-outline btn-sm">Show</button></form>
            </div>
        </div>"#),
        ResultDisplay::Table { columns, rows } => {
            let head: String = columns.iter().map(|c| format!("<th>{}</th>", escape(c))).collect();
            let body: String = rows
                .iter()
                .map(|row| {
                    let cells: String = row.cells.iter().map(|c| format!("<td>{}</td>", escape(c))).collect();
                    let actions: String = row
                        .actions
                        .iter()
                        .map(|a| format!(r#"<button type="button" class="btn btn-outline btn-sm" disabled>{}</button>"#, a.label()))
                        .collect();
                    format!(r#"<tr>{cells}<td class="actions">{actions}</td></tr>"#)
                })
                .collect();
            format!(r#"<div class="card results">
            <div class="card-header">
                <div>Results <span class="text-muted">({} rows)</span></div>
                <form method="post" action="{base}/results/toggle"><button class="btn btn-outline btn-sm">Hide</button></form>
            </div>
            <div class="table-container">
                <table class="table">
                    <thead><tr>{head}</tr></thead>
                    <tbody>{body}</tbody>
                </table>
            </div>
        </div>"#, rows.len())
        }
    }
}

pub fn tool_page(session: &ToolSession) -> String {
    let tool = session.tool();
    let base = format!("/tools/{}/{}", tool.slug(), session.id());
    let snapshot = session.runner().snapshot();
    let running = snapshot.is_running();
    let validation = session.validation();
    let error_for = |name: &str| validation.and_then(|v| v.message_for(name));

    let mut zones = String::new();
    let mut inputs = String::new();
    for field in tool.fields() {
        if field.is_file() {
            if let Some(zone) = session.zone(field.name) {
                zones.push_str(&drop_zone(zone, &base, error_for(field.name), running));
            }
        } else {
            let value = session.params().get(field.name).map(String::as_str);
            inputs.push_str(&field_input(&field, value, error_for(field.name)));
        }
    }

    let failure = snapshot
        .error()
        .map(|e| format!(r#"<div class="alert alert-danger">{}</div>"#, escape(e)))
        .unwrap_or_default();
    let disabled = if running { " disabled" } else { "" };

    let body = format!(r#"
    <div class="page-header" data-session="{session}" data-tool="{slug}">
        <div>
            <h1 class="page-title">{title}</h1>
            <p class="text-muted">{description}</p>
        </div>
        <div class="d-flex gap-3 align-center">
            {badge}
            <form method="post" action="{base}/reset"><button class="btn btn-outline">Reset</button></form>
        </div>
    </div>

    <div class="card mb-4">
        {zones}
        <form method="post" action="{base}/run" class="run-form">
            {inputs}
            <button type="submit" class="btn btn-primary"{disabled}>{run_label}</button>
        </form>
    </div>
    {failure}
    {results}"#,
        session = session.id(),
        slug = tool.slug(),
        title = escape(tool.title()),
        description = escape(tool.description()),
        badge = status_badge(snapshot.status()),
        run_label = escape(tool.run_label()),
        results = results(&session.display(), &base),
    );
    page(tool.title(), &body)
}

pub fn dashboard(tools: &[&dyn MoleculeTool], sessions: usize) -> String {
    let cards: String = tools
        .iter()
        .map(|t| format!(r#"
        <div class="card card-hover">
            <div class="card-header">{}</div>
            <p class="text-muted mb-4">{}</p>
            <a href="/tools/{}" class="btn btn-outline">{}</a>
        </div>"#, escape(t.title()), escape(t.description()), t.slug(), escape(t.run_label())))
        .collect();

    let body = format!(r#"
    <div class="page-header">
        <div>
            <h1 class="page-title">Tools</h1>
            <p class="text-muted">{} tools, {} open sessions</p>
        </div>
        <a href="/viewer" class="btn btn-primary">Structure Viewer</a>
    </div>
    <div class="tools-grid">{}</div>"#, tools.len(), sessions, cards);
    page("Dashboard", &body)
}

/// The viewer page; `invalid` puts field messages under the offending form.
pub fn viewer_page(status: &ViewerStatus, invalid: Option<&ValidationError>) -> String {
    let error_for = |name: &str| field_error(invalid.and_then(|v| v.message_for(name)));
    let base = format!("/viewer/{}", status.id);
    let notification = status
        .notification
        .as_ref()
        .map(|n| {
            let class = match n.level {
                NotificationLevel::Info => "alert-info",
                NotificationLevel::Error => "alert-danger",
            };
            let retry = if n.retryable {
                format!(r#"<form method="post" action="{base}/retry" class="inline"><button class="btn btn-outline btn-sm">Retry</button></form>"#)
            } else {
                String::new()
            };
            format!(r#"<div class="alert {class}" role="status">{} {retry}</div>"#, escape(&n.message))
        })
        .unwrap_or_default();

    let reps: String = Representation::ALL
        .iter()
        .map(|r| {
            let sel = if *r == status.representation { " selected" } else { "" };
            format!(r#"<option value="{r}"{sel}>{r}</option>"#)
        })
        .collect();
    let colors: String = ColorScheme::ALL
        .iter()
        .map(|c| {
            let sel = if *c == status.color_scheme { " selected" } else { "" };
            format!(r#"<option value="{c}"{sel}>{c}</option>"#)
        })
        .collect();
    let loaded = status
        .loaded
        .as_deref()
        .map(|l| format!("Showing <strong>{}</strong>", escape(l)))
        .unwrap_or_else(|| "No structure loaded".to_string());

    let body = format!(r#"
    <div class="page-header" data-viewer="{id}">
        <div>
            <h1 class="page-title">Structure Viewer</h1>
            <p class="text-muted">{loaded}</p>
        </div>
    </div>
    {notification}
    <div class="grid-2 mb-4">
        <div class="card">
            <form method="post" action="{base}/load" class="d-flex gap-3">
                <input type="text" name="pdb_id" class="form-control" placeholder="PDB ID, e.g. 1CRN" maxlength="4">
                <button type="submit" class="btn btn-primary">Load</button>
            </form>
            {pdb_id_error}
            <form method="post" action="{base}/upload" enctype="multipart/form-data" class="dropzone" data-upload="{base}/upload">
                <input type="file" name="structure" id="structure-file" accept=".pdb,.cif,.mmcif,.sdf,.mol2" class="dropzone-input">
                <label for="structure-file" class="dropzone-text">Drop a structure file here or click to browse</label>
            </form>
            {structure_error}
        </div>
        <div class="card">
            <form method="post" action="{base}/style" class="style-form">
                <label class="form-label" for="representation">Representation</label>
                <select name="representation" id="representation" class="form-control">{reps}</select>
                <label class="form-label" for="color_scheme">Color scheme</label>
                <select name="color_scheme" id="color_scheme" class="form-control">{colors}</select>
                <button type="submit" class="btn btn-outline">Apply</button>
            </form>
            {representation_error}
            {color_scheme_error}
        </div>
    </div>
    <div id="stage" class="viewer-stage" data-scene="/api/viewers/{id}/scene"></div>
    <script src="https://unpkg.com/ngl@2.3.1/dist/ngl.js"></script>"#,
        id = status.id,
        pdb_id_error = error_for("pdb_id"),
        structure_error = error_for("structure"),
        representation_error = error_for("representation"),
        color_scheme_error = error_for("color_scheme"),
    );
    page("Structure Viewer", &body)
}
