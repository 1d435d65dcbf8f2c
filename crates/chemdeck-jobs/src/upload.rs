//! File drop zones: the input collector shared by every tool page.
//!
//! A drop zone accepts files through two paths, drag-and-drop and the
//! click-to-browse fallback. Both converge on [`FileDropZone::select_first`],
//! which keeps exactly the first file offered and notifies the
//! `on_select` callback once.

use chemdeck_common::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A user-selected file held in page state.
#[derive(Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub mime: Option<String>,
    #[serde(skip)]
    pub content: Arc<Vec<u8>>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime: Option<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: content.len() as u64,
            mime,
            content: Arc::new(content),
        }
    }

    /// Lowercase extension including the leading dot, e.g. `.pdb`.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(format!(".{}", ext.to_ascii_lowercase()))
    }

    pub fn content_utf8(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime", &self.mime)
            .finish()
    }
}

/// Display and acceptance settings for one drop zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub label: String,
    pub description: String,
    /// Allowed extensions (`.pdb`, `.sdf`, ...). Empty accepts anything.
    pub accept: Vec<String>,
    pub max_bytes: Option<u64>,
}

impl UploadConfig {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            accept: Vec::new(),
            max_bytes: None,
        }
    }

    pub fn with_accept(mut self, extensions: &[&str]) -> Self {
        self.accept = extensions.iter().map(|e| normalise_extension(e)).collect();
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Value for an HTML `accept` attribute.
    pub fn accept_attr(&self) -> String {
        self.accept.join(",")
    }

    /// Check a file against the extension list and size cap.
    pub fn check(&self, file: &UploadedFile) -> Result<(), String> {
        if !self.accept.is_empty() {
            let ext = file.extension().unwrap_or_default();
            if !self.accept.iter().any(|a| *a == ext) {
                return Err(format!(
                    "{} is not an accepted file type (expected {})",
                    file.name,
                    self.accept.join(", ")
                ));
            }
        }
        if let Some(max) = self.max_bytes {
            if file.size > max {
                return Err(format!(
                    "{} is {} bytes, larger than the {} byte limit",
                    file.name, file.size, max
                ));
            }
        }
        Ok(())
    }
}

fn normalise_extension(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') { ext } else { format!(".{ext}") }
}

pub type SelectCallback = Arc<dyn Fn(&UploadedFile) + Send + Sync>;

/// Per-field upload state: drag highlight plus the current selection.
pub struct FileDropZone {
    field: String,
    config: UploadConfig,
    drag_active: bool,
    selected: Option<UploadedFile>,
    on_select: Option<SelectCallback>,
}

impl FileDropZone {
    pub fn new(field: impl Into<String>, config: UploadConfig) -> Self {
        Self {
            field: field.into(),
            config,
            drag_active: false,
            selected: None,
            on_select: None,
        }
    }

    pub fn with_on_select<F>(mut self, callback: F) -> Self
    where
        F: Fn(&UploadedFile) + Send + Sync + 'static,
    {
        self.on_select = Some(Arc::new(callback));
        self
    }

    pub fn field(&self) -> &str { &self.field }
    pub fn config(&self) -> &UploadConfig { &self.config }
    pub fn is_drag_active(&self) -> bool { self.drag_active }
    pub fn selected(&self) -> Option<&UploadedFile> { self.selected.as_ref() }

    pub fn drag_over(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_active = false;
    }

    /// Drop handler. Ends the drag highlight and selects the first file.
    pub fn drop_files(
        &mut self,
        files: Vec<UploadedFile>,
    ) -> Result<Option<&UploadedFile>, ValidationError> {
        self.drag_active = false;
        self.select_first(files)
    }

    /// Click-to-browse fallback.
    pub fn browse(
        &mut self,
        files: Vec<UploadedFile>,
    ) -> Result<Option<&UploadedFile>, ValidationError> {
        self.select_first(files)
    }

    /// Replace the selection with the first of `files`. An empty offer keeps
    /// the current selection; a rejected file keeps it too.
    fn select_first(
        &mut self,
        files: Vec<UploadedFile>,
    ) -> Result<Option<&UploadedFile>, ValidationError> {
        let Some(file) = files.into_iter().next() else {
            return Ok(self.selected.as_ref());
        };

        if let Err(message) = self.config.check(&file) {
            warn!(field = %self.field, file = %file.name, "Rejected upload: {}", message);
            return Err(ValidationError::single(self.field.clone(), message));
        }

        debug!(field = %self.field, file = %file.name, size = file.size, "File selected");
        if let Some(callback) = &self.on_select {
            callback(&file);
        }
        self.selected = Some(file);
        Ok(self.selected.as_ref())
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.drag_active = false;
    }

    /// Selected file name, or the placeholder description.
    pub fn display_text(&self) -> &str {
        match &self.selected {
            Some(file) => &file.name,
            None => &self.config.description,
        }
    }
}

impl fmt::Debug for FileDropZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDropZone")
            .field("field", &self.field)
            .field("config", &self.config)
            .field("drag_active", &self.drag_active)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}
