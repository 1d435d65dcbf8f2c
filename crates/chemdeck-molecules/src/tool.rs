//! The contract every tool page implements.

use chemdeck_common::ValidationError;
use chemdeck_jobs::http::JobPayload;
use chemdeck_jobs::{ResultRecord, ResultSet, UploadConfig, UploadedFile};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::error;

/// How a field is collected on the page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    File { accept: &'static [&'static str] },
    Text { placeholder: &'static str },
    Select { options: &'static [&'static str] },
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn file(
        name: &'static str,
        label: &'static str,
        description: &'static str,
        accept: &'static [&'static str],
    ) -> Self {
        Self { name, label, description, kind: FieldKind::File { accept }, required: true }
    }

    pub fn text(
        name: &'static str,
        label: &'static str,
        description: &'static str,
        placeholder: &'static str,
    ) -> Self {
        Self { name, label, description, kind: FieldKind::Text { placeholder }, required: true }
    }

    /// Select fields are optional by default; the first option is preselected.
    pub fn select(
        name: &'static str,
        label: &'static str,
        description: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self { name, label, description, kind: FieldKind::Select { options }, required: false }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, FieldKind::File { .. })
    }

    /// Drop zone settings for file fields.
    pub fn upload_config(&self, max_bytes: u64) -> Option<UploadConfig> {
        match self.kind {
            FieldKind::File { accept } => Some(
                UploadConfig::new(self.label, self.description)
                    .with_accept(accept)
                    .with_max_bytes(max_bytes),
            ),
            _ => None,
        }
    }
}

/// Everything a page collected before "Run".
#[derive(Debug, Clone, Default)]
pub struct ToolInput {
    pub tool: String,
    pub files: BTreeMap<String, UploadedFile>,
    pub params: BTreeMap<String, String>,
}

impl ToolInput {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into(), ..Default::default() }
    }

    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(field.into(), file);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.get(field)
    }

    /// Trimmed parameter value; blank counts as absent.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    /// Stem of an uploaded file's name, for labelling placeholder rows.
    pub fn file_stem(&self, field: &str) -> Option<&str> {
        let name = self.file(field)?.name.as_str();
        Some(name.rsplit_once('.').map_or(name, |(stem, _)| stem))
    }
}

impl JobPayload for ToolInput {
    fn tool(&self) -> &str {
        &self.tool
    }

    fn params(&self) -> Value {
        let map = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }

    fn attachments(&self) -> Vec<(&str, &UploadedFile)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }
}

/// A single tool page.
pub trait MoleculeTool: Send + Sync {
    /// URL segment, unique across the registry (kebab-case, e.g. `"docking"`).
    fn slug(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Caption of the trigger button.
    fn run_label(&self) -> &'static str { "Run" }

    fn fields(&self) -> Vec<FieldSpec>;

    /// Nominal time the simulated backend takes.
    fn simulated_delay(&self) -> Duration;

    /// Literal sample output shaped like the real tool's output.
    fn placeholder_records(&self, input: &ToolInput) -> Vec<ResultRecord>;

    fn validate(&self, input: &ToolInput) -> Result<(), ValidationError> {
        validate_fields(&self.fields(), input)
    }

    fn placeholder_results(&self, input: &ToolInput) -> ResultSet {
        match ResultSet::new(self.placeholder_records(input)) {
            Ok(set) => set,
            Err(e) => {
                error!(tool = self.slug(), "Placeholder records are malformed: {}", e);
                ResultSet::empty()
            }
        }
    }
}

/// Presence check for required fields, plus option membership for selects.
pub fn validate_fields(fields: &[FieldSpec], input: &ToolInput) -> Result<(), ValidationError> {
    let mut errors = ValidationError::new();
    for field in fields {
        match field.kind {
            FieldKind::File { .. } => {
                if field.required && input.file(field.name).is_none() {
                    errors.push(field.name, format!("{} is required", field.label));
                }
            }
            FieldKind::Text { .. } => {
                if field.required && input.param(field.name).is_none() {
                    errors.push(field.name, format!("{} is required", field.label));
                }
            }
            FieldKind::Select { options } => match input.param(field.name) {
                Some(value) if !options.contains(&value) => {
                    errors.push(field.name, format!("{value} is not a valid {}", field.label));
                }
                None if field.required => {
                    errors.push(field.name, format!("{} is required", field.label));
                }
                _ => {}
            },
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::file("ligand", "Ligand file", "Drop a ligand", &[".pdb"]),
            FieldSpec::text("smiles", "SMILES", "Query structure", "CCO").optional(),
            FieldSpec::select("mode", "Search mode", "", &["fast", "exhaustive"]),
        ]
    }

    #[test]
    fn test_missing_required_file() {
        let err = validate_fields(&fields(), &ToolInput::new("docking")).unwrap_err();
        assert_eq!(err.fields.len(), 1);
        assert_eq!(err.message_for("ligand"), Some("Ligand file is required"));
    }

    #[test]
    fn test_blank_text_counts_as_missing() {
        let fields = vec![FieldSpec::text("smiles", "SMILES", "", "")];
        let input = ToolInput::new("similarity").with_param("smiles", "   ");
        assert!(validate_fields(&fields, &input).is_err());
    }

    #[test]
    fn test_unknown_select_option() {
        let input = ToolInput::new("docking")
            .with_file("ligand", UploadedFile::new("ligand.pdb", None, vec![1]))
            .with_param("mode", "turbo");
        let err = validate_fields(&fields(), &input).unwrap_err();
        assert!(err.message_for("mode").unwrap().contains("turbo"));
    }

    #[test]
    fn test_payload_exposes_params_and_files() {
        let input = ToolInput::new("docking")
            .with_file("ligand", UploadedFile::new("ligand.pdb", None, vec![1, 2]))
            .with_param("mode", "fast");
        assert_eq!(input.tool(), "docking");
        assert_eq!(input.params(), serde_json::json!({ "mode": "fast" }));
        assert_eq!(input.attachments().len(), 1);
        assert_eq!(input.file_stem("ligand"), Some("ligand"));
    }
}
