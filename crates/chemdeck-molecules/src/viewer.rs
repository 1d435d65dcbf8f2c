//! 3D structure viewer.
//!
//! `StructureViewer` owns one `StructureEngine` for its whole lifetime and
//! only forwards requests to it: fetching, parsing and drawing all happen in
//! the engine. Loads are serialized; a failed load leaves a retryable
//! notification instead of an error page.

use async_trait::async_trait;
use chemdeck_common::{ChemdeckError, Result, ValidationError};
use chemdeck_jobs::UploadedFile;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What to show.
#[derive(Debug, Clone)]
pub enum StructureSource {
    /// A four-character PDB identifier, upper-cased.
    Identifier(String),
    File(UploadedFile),
}

impl StructureSource {
    /// Parse a PDB id such as `1crn`; surrounding whitespace is ignored.
    pub fn identifier(raw: &str) -> std::result::Result<Self, ValidationError> {
        let id = raw.trim();
        let valid = id.len() == 4
            && id.chars().all(|c| c.is_ascii_alphanumeric())
            && id.starts_with(|c: char| c.is_ascii_digit());
        if !valid {
            return Err(ValidationError::single(
                "pdb_id",
                format!("'{id}' is not a PDB identifier (e.g. 1CRN)"),
            ));
        }
        Ok(Self::Identifier(id.to_ascii_uppercase()))
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Identifier(id) => id,
            Self::File(file) => &file.name,
        }
    }
}

macro_rules! style_enum {
    ($name:ident, $field:literal, { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self { $($name::$variant => $s),+ }
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ValidationError::single($field, format!("unknown {}: {s}", $field)))
            }
        }
    };
}

style_enum!(Representation, "representation", {
    Cartoon => "cartoon",
    BallAndStick => "ball+stick",
    Licorice => "licorice",
    Surface => "surface",
    Spacefill => "spacefill",
});

style_enum!(ColorScheme, "color_scheme", {
    ChainId => "chainid",
    Element => "element",
    ResidueIndex => "residueindex",
    BFactor => "bfactor",
    Hydrophobicity => "hydrophobicity",
});

/// Capabilities the viewer needs from a rendering engine.
#[async_trait]
pub trait StructureEngine: Send + Sync {
    async fn load(&mut self, source: &StructureSource) -> Result<()>;

    async fn clear_representations(&mut self) -> Result<()>;

    async fn set_representation(&mut self, representation: Representation) -> Result<()>;

    async fn set_color_scheme(&mut self, scheme: ColorScheme) -> Result<()>;

    /// Release engine resources. Called at most once.
    fn dispose(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A user-visible, non-blocking message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub retryable: bool,
}

/// Displayable state of a viewer.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerStatus {
    pub id: Uuid,
    pub representation: Representation,
    pub color_scheme: ColorScheme,
    /// Label of the structure currently shown.
    pub loaded: Option<String>,
    pub loading: bool,
    pub notification: Option<Notification>,
    pub can_retry: bool,
    pub closed: bool,
}

struct Tracked {
    status: ViewerStatus,
    failed: Option<StructureSource>,
}

pub struct StructureViewer<E: StructureEngine> {
    id: Uuid,
    engine: tokio::sync::Mutex<Option<E>>,
    tracked: Mutex<Tracked>,
}

impl<E: StructureEngine> StructureViewer<E> {
    pub fn new(engine: E, representation: Representation, color_scheme: ColorScheme) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            engine: tokio::sync::Mutex::new(Some(engine)),
            tracked: Mutex::new(Tracked {
                status: ViewerStatus {
                    id,
                    representation,
                    color_scheme,
                    loaded: None,
                    loading: false,
                    notification: None,
                    can_retry: false,
                    closed: false,
                },
                failed: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid { self.id }

    pub fn status(&self) -> ViewerStatus {
        self.tracked().status.clone()
    }

    /// Load a structure, replacing whatever is shown. Concurrent loads queue
    /// behind each other.
    pub async fn load(&self, source: StructureSource) -> Result<()> {
        let mut guard = self.engine.lock().await;
        let engine = guard.as_mut().ok_or_else(closed)?;

        let (representation, scheme) = {
            let mut t = self.tracked();
            t.status.loading = true;
            t.status.notification = None;
            (t.status.representation, t.status.color_scheme)
        };

        debug!(viewer = %self.id, source = source.label(), "Loading structure");
        let outcome = async {
            engine.clear_representations().await?;
            engine.load(&source).await?;
            engine.set_representation(representation).await?;
            engine.set_color_scheme(scheme).await
        }
        .await;

        let mut t = self.tracked();
        t.status.loading = false;
        match outcome {
            Ok(()) => {
                info!(viewer = %self.id, source = source.label(), "Structure loaded");
                t.status.loaded = Some(source.label().to_string());
                t.status.can_retry = false;
                t.failed = None;
                Ok(())
            }
            Err(err) => {
                warn!(viewer = %self.id, source = source.label(), "Structure load failed: {}", err);
                t.status.loaded = None;
                t.status.can_retry = err.is_retryable();
                t.status.notification = Some(Notification {
                    level: NotificationLevel::Error,
                    message: format!("Could not load {}: {}", source.label(), err),
                    retryable: err.is_retryable(),
                });
                t.failed = Some(source);
                Err(err)
            }
        }
    }

    /// Re-issue the last failed load. Returns `Ok(false)` when there is nothing to retry.
    pub async fn retry(&self) -> Result<bool> {
        let failed = self.tracked().failed.take();
        match failed {
            Some(source) => self.load(source).await.map(|_| true),
            None => Ok(false),
        }
    }

    pub async fn set_representation(&self, representation: Representation) -> Result<()> {
        let mut guard = self.engine.lock().await;
        let engine = guard.as_mut().ok_or_else(closed)?;
        let loaded = {
            let mut t = self.tracked();
            t.status.representation = representation;
            t.status.loaded.is_some()
        };
        if loaded {
            engine.clear_representations().await?;
            engine.set_representation(representation).await?;
        }
        Ok(())
    }

    pub async fn set_color_scheme(&self, scheme: ColorScheme) -> Result<()> {
        let mut guard = self.engine.lock().await;
        let engine = guard.as_mut().ok_or_else(closed)?;
        let loaded = {
            let mut t = self.tracked();
            t.status.color_scheme = scheme;
            t.status.loaded.is_some()
        };
        if loaded {
            engine.set_color_scheme(scheme).await?;
        }
        Ok(())
    }

    pub fn dismiss_notification(&self) {
        self.tracked().status.notification = None;
    }

    /// Read engine state (e.g. the scene to draw). `None` once closed.
    pub async fn inspect<T>(&self, f: impl FnOnce(&E) -> T) -> Option<T> {
        self.engine.lock().await.as_ref().map(f)
    }

    /// Dispose the engine now instead of on drop.
    pub async fn close(&self) {
        if let Some(mut engine) = self.engine.lock().await.take() {
            engine.dispose();
            self.tracked().status.closed = true;
            info!(viewer = %self.id, "Viewer closed");
        }
    }

    fn tracked(&self) -> MutexGuard<'_, Tracked> {
        self.tracked.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<E: StructureEngine> Drop for StructureViewer<E> {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.get_mut().take() {
            engine.dispose();
        }
    }
}

fn closed() -> ChemdeckError {
    ChemdeckError::Other(anyhow::anyhow!("viewer has been closed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    /// Records every call; ids starting with "9" fail.
    #[derive(Clone, Default)]
    struct FakeEngine {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeEngine {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    #[async_trait]
    impl StructureEngine for FakeEngine {
        async fn load(&mut self, source: &StructureSource) -> Result<()> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.record(format!("load {}", source.label()));
            if source.label().starts_with('9') {
                return Err(ChemdeckError::ExternalLoad(format!("{} not found", source.label())));
            }
            Ok(())
        }

        async fn clear_representations(&mut self) -> Result<()> {
            self.record("clear");
            Ok(())
        }

        async fn set_representation(&mut self, r: Representation) -> Result<()> {
            self.record(format!("rep {r}"));
            Ok(())
        }

        async fn set_color_scheme(&mut self, c: ColorScheme) -> Result<()> {
            self.record(format!("color {c}"));
            Ok(())
        }

        fn dispose(&mut self) {
            self.record("dispose");
        }
    }

    fn viewer() -> (StructureViewer<FakeEngine>, FakeEngine) {
        let engine = FakeEngine::default();
        (StructureViewer::new(engine.clone(), Representation::Cartoon, ColorScheme::ChainId), engine)
    }

    #[test]
    fn test_identifier_parsing() {
        assert!(matches!(StructureSource::identifier(" 1crn "), Ok(StructureSource::Identifier(ref id)) if id == "1CRN"));
        assert!(StructureSource::identifier("crn1").is_err());
        assert!(StructureSource::identifier("1crn5").is_err());
        assert_eq!("Ball+Stick".parse::<Representation>().unwrap(), Representation::BallAndStick);
        assert!("wireframe".parse::<Representation>().is_err());
        assert_eq!("bfactor".parse::<ColorScheme>().unwrap(), ColorScheme::BFactor);
    }

    #[tokio::test]
    async fn test_load_clears_then_applies_style() {
        let (viewer, engine) = viewer();
        viewer.load(StructureSource::identifier("1CRN").unwrap()).await.unwrap();

        assert_eq!(engine.calls(), vec!["clear", "load 1CRN", "rep cartoon", "color chainid"]);
        let status = viewer.status();
        assert_eq!(status.loaded.as_deref(), Some("1CRN"));
        assert!(!status.loading);
        assert!(status.notification.is_none());
    }

    #[tokio::test]
    async fn test_failed_load_notifies_and_retries() {
        let (viewer, engine) = viewer();
        let err = viewer.load(StructureSource::Identifier("9XYZ".into())).await.unwrap_err();
        assert!(matches!(err, ChemdeckError::ExternalLoad(_)));

        let status = viewer.status();
        let note = status.notification.unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert!(note.retryable);
        assert!(note.message.contains("9XYZ"));
        assert!(status.can_retry);

        assert!(viewer.retry().await.is_err());
        let loads = engine.calls().iter().filter(|c| c.starts_with("load")).count();
        assert_eq!(loads, 2);
    }

    #[tokio::test]
    async fn test_retry_without_failure_is_noop() {
        let (viewer, engine) = viewer();
        assert!(!viewer.retry().await.unwrap());
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_style_changes_reapply_only_when_loaded() {
        let (viewer, engine) = viewer();
        viewer.set_representation(Representation::Surface).await.unwrap();
        assert!(engine.calls().is_empty());

        viewer.load(StructureSource::identifier("4HHB").unwrap()).await.unwrap();
        viewer.set_color_scheme(ColorScheme::Element).await.unwrap();
        let calls = engine.calls();
        assert_eq!(calls[2], "rep surface");
        assert_eq!(calls.last().unwrap(), "color element");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_loads_are_serialized() {
        let (viewer, engine) = viewer();
        let viewer = Arc::new(viewer);
        let a = tokio::spawn({
            let v = viewer.clone();
            async move { v.load(StructureSource::identifier("1CRN").unwrap()).await }
        });
        let b = tokio::spawn({
            let v = viewer.clone();
            async move { v.load(StructureSource::identifier("4HHB").unwrap()).await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Each load is a contiguous clear/load/rep/color block.
        let calls = engine.calls();
        assert_eq!(calls.len(), 8);
        for block in calls.chunks(4) {
            assert_eq!(block[0], "clear");
            assert!(block[1].starts_with("load"));
        }
    }

    #[tokio::test]
    async fn test_dispose_exactly_once() {
        let (viewer, engine) = viewer();
        viewer.close().await;
        viewer.close().await;
        assert!(viewer.status().closed);
        assert!(viewer.load(StructureSource::identifier("1CRN").unwrap()).await.is_err());
        drop(viewer);
        assert_eq!(engine.calls(), vec!["dispose"]);
    }

    #[tokio::test]
    async fn test_drop_disposes() {
        let (viewer, engine) = viewer();
        drop(viewer);
        assert_eq!(engine.calls(), vec!["dispose"]);
    }
}
