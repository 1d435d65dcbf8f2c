//! RCSB-backed structure engine.
//!
//! Resolves PDB identifiers against the RCSB file service and uploaded files
//! from their content, then describes the scene for the browser-side NGL
//! stage. It does not parse structures.

use async_trait::async_trait;
use chemdeck_common::{ChemdeckError, Result};
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::viewer::{ColorScheme, Representation, StructureEngine, StructureSource};

/// What the browser should draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDescriptor {
    pub title: String,
    /// NGL file extension hint: `pdb`, `cif`, `sdf`, ...
    pub format: String,
    /// Raw structure text.
    pub data: String,
    pub source_url: Option<String>,
    pub representation: Option<Representation>,
    pub color_scheme: ColorScheme,
}

pub struct RcsbEngine {
    client: Client,
    base_url: String,
    scene: Option<SceneDescriptor>,
    color_scheme: ColorScheme,
}

impl RcsbEngine {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            scene: None,
            color_scheme: ColorScheme::default(),
        })
    }

    pub fn scene(&self) -> Option<&SceneDescriptor> {
        self.scene.as_ref()
    }

    /// Fetch `{base}/{ID}.pdb`.
    async fn fetch_pdb(&self, pdb_id: &str) -> Result<(String, String)> {
        let url = format!("{}/{}.pdb", self.base_url, pdb_id);
        info!("Fetching PDB {} from RCSB", pdb_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ChemdeckError::ExternalLoad(format!("{pdb_id}: {e}")))?;
        let text = response
            .text()
            .await
            .map_err(|e| ChemdeckError::ExternalLoad(format!("{pdb_id}: {e}")))?;
        Ok((url, text))
    }
}

#[async_trait]
impl StructureEngine for RcsbEngine {
    async fn load(&mut self, source: &StructureSource) -> Result<()> {
        let (format, data, source_url) = match source {
            StructureSource::Identifier(id) => {
                let (url, text) = self.fetch_pdb(id).await?;
                ("pdb".to_string(), text, Some(url))
            }
            StructureSource::File(file) => {
                let text = file.content_utf8().ok_or_else(|| {
                    ChemdeckError::ExternalLoad(format!("{} is not a text structure file", file.name))
                })?;
                let format = file
                    .extension()
                    .map(|ext| ext.trim_start_matches('.').to_string())
                    .unwrap_or_else(|| "pdb".to_string());
                (format, text.to_string(), None)
            }
        };

        if data.trim().is_empty() {
            return Err(ChemdeckError::ExternalLoad(format!("{} is empty", source.label())));
        }

        debug!(title = source.label(), bytes = data.len(), "Scene ready");
        self.scene = Some(SceneDescriptor {
            title: source.label().to_string(),
            format,
            data,
            source_url,
            representation: None,
            color_scheme: self.color_scheme,
        });
        Ok(())
    }

    async fn clear_representations(&mut self) -> Result<()> {
        if let Some(scene) = self.scene.as_mut() {
            scene.representation = None;
        }
        Ok(())
    }

    async fn set_representation(&mut self, representation: Representation) -> Result<()> {
        if let Some(scene) = self.scene.as_mut() {
            scene.representation = Some(representation);
        }
        Ok(())
    }

    async fn set_color_scheme(&mut self, scheme: ColorScheme) -> Result<()> {
        self.color_scheme = scheme;
        if let Some(scene) = self.scene.as_mut() {
            scene.color_scheme = scheme;
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.scene = None;
        debug!("RCSB engine disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::get, Router};
    use chemdeck_jobs::UploadedFile;

    const CRAMBIN: &str = "HEADER    PLANT PROTEIN                           30-APR-81   1CRN\nATOM      1  N   THR A   1      17.047  14.099   3.625  1.00 13.79           N\n";

    async fn structure(Path(file): Path<String>) -> std::result::Result<String, StatusCode> {
        match file.as_str() {
            "1CRN.pdb" => Ok(CRAMBIN.to_string()),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    async fn spawn_rcsb() -> String {
        let app = Router::new().route("/download/{file}", get(structure));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/download/")
    }

    #[tokio::test]
    async fn test_fetch_pdb_by_identifier() {
        let mut engine = RcsbEngine::new(spawn_rcsb().await).unwrap();
        engine.load(&StructureSource::Identifier("1CRN".into())).await.unwrap();
        engine.set_representation(Representation::Cartoon).await.unwrap();

        let scene = engine.scene().unwrap();
        assert_eq!(scene.title, "1CRN");
        assert_eq!(scene.format, "pdb");
        assert!(scene.data.contains("THR A"));
        assert!(scene.source_url.as_deref().unwrap().ends_with("/download/1CRN.pdb"));
        assert_eq!(scene.representation, Some(Representation::Cartoon));
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_external_load_error() {
        let mut engine = RcsbEngine::new(spawn_rcsb().await).unwrap();
        let err = engine.load(&StructureSource::Identifier("9ZZZ".into())).await.unwrap_err();
        assert!(matches!(err, ChemdeckError::ExternalLoad(ref m) if m.contains("9ZZZ")));
        assert!(err.is_retryable());
        assert!(engine.scene().is_none());
    }

    #[tokio::test]
    async fn test_uploaded_file_scene() {
        let mut engine = RcsbEngine::new("http://unused.invalid").unwrap();
        let file = UploadedFile::new("complex.CIF", None, b"data_complex\n".to_vec());
        engine.load(&StructureSource::File(file)).await.unwrap();
        assert_eq!(engine.scene().unwrap().format, "cif");

        let binary = UploadedFile::new("model.pdb", None, vec![0xff, 0xfe, 0x00]);
        assert!(engine.load(&StructureSource::File(binary)).await.is_err());
    }

    #[tokio::test]
    async fn test_dispose_drops_scene() {
        let mut engine = RcsbEngine::new("http://unused.invalid").unwrap();
        engine
            .load(&StructureSource::File(UploadedFile::new("a.pdb", None, CRAMBIN.as_bytes().to_vec())))
            .await
            .unwrap();
        engine.dispose();
        assert!(engine.scene().is_none());
    }
}
