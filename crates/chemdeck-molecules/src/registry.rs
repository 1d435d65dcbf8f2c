//! Slug-keyed catalog of tool pages.
//!
//! Built once at startup with `build_default_registry()` and shared via `Arc`.
//! Iteration follows registration order, which is the dashboard order.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::tool::MoleculeTool;
use crate::{admet, docking, ligand, md, pocket, prep, retrosynthesis, scoring, similarity};

pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn MoleculeTool>>,
    order: Vec<&'static str>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new(), order: Vec::new() }
    }

    /// Register a tool. Panics if the slug is already registered.
    pub fn register<T: MoleculeTool + 'static>(&mut self, tool: T) {
        let slug = tool.slug();
        assert!(!self.tools.contains_key(slug), "Duplicate tool slug: {slug}");
        self.tools.insert(slug, Arc::new(tool));
        self.order.push(slug);
    }

    pub fn get(&self, slug: &str) -> Option<&Arc<dyn MoleculeTool>> {
        self.tools.get(slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MoleculeTool>> {
        self.order.iter().filter_map(|slug| self.tools.get(slug))
    }

    pub fn len(&self) -> usize { self.tools.len() }

    pub fn is_empty(&self) -> bool { self.tools.is_empty() }

    /// All registered tools as JSON, for `/api/tools`.
    pub fn manifest(&self) -> Value {
        let tools: Vec<Value> = self
            .iter()
            .map(|t| {
                serde_json::json!({
                    "slug": t.slug(),
                    "title": t.title(),
                    "description": t.description(),
                    "run_label": t.run_label(),
                    "fields": t.fields(),
                    "simulated_delay_ms": t.simulated_delay().as_millis() as u64,
                })
            })
            .collect();
        serde_json::json!({ "tools": tools })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self { Self::new() }
}

/// The full ChemDeck catalog.
pub fn build_default_registry() -> ToolRegistry {
    let mut reg = ToolRegistry::new();
    reg.register(docking::DockingTool);
    reg.register(pocket::PocketFinderTool);
    reg.register(ligand::DeNovoTool);
    reg.register(similarity::SimilarityTool);
    reg.register(admet::PropertiesTool);
    reg.register(admet::AdmetTool);
    reg.register(md::MdSetupTool);
    reg.register(scoring::BindingAffinityTool);
    reg.register(retrosynthesis::RetrosynthesisTool);
    reg.register(prep::ProteinPrepTool);
    tracing::info!("ToolRegistry ready with {} tools", reg.len());
    reg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{FieldKind, FieldSpec, ToolInput};
    use chemdeck_jobs::{ResultRecord, UploadedFile};
    use std::collections::HashSet;
    use std::time::Duration;

    struct EchoTool;

    impl MoleculeTool for EchoTool {
        fn slug(&self) -> &'static str { "echo" }
        fn title(&self) -> &'static str { "Echo" }
        fn description(&self) -> &'static str { "Echoes the message back." }
        fn fields(&self) -> Vec<FieldSpec> {
            vec![FieldSpec::text("message", "Message", "", "hello")]
        }
        fn simulated_delay(&self) -> Duration { Duration::from_millis(10) }
        fn placeholder_records(&self, input: &ToolInput) -> Vec<ResultRecord> {
            vec![ResultRecord::new().with("echo", input.param("message").unwrap_or_default())]
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("echo").unwrap().title(), "Echo");
        assert!(reg.get("nonexistent").is_none());
    }

    #[test]
    fn test_manifest_json() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool);
        let manifest = reg.manifest();
        let tools = manifest["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["slug"], "echo");
        assert_eq!(tools[0]["run_label"], "Run");
        assert_eq!(tools[0]["fields"][0]["kind"]["type"], "text");
    }

    #[test]
    #[should_panic(expected = "Duplicate tool slug")]
    fn test_duplicate_registration_panics() {
        let mut reg = ToolRegistry::new();
        reg.register(EchoTool);
        reg.register(EchoTool);
    }

    #[test]
    fn test_default_registry_catalog() {
        let reg = build_default_registry();
        assert_eq!(reg.len(), 10);
        let slugs: HashSet<_> = reg.iter().map(|t| t.slug()).collect();
        assert_eq!(slugs.len(), 10);
        assert_eq!(reg.iter().next().unwrap().slug(), "docking");
        assert_eq!(reg.get("docking").unwrap().run_label(), "Run Prediction");

        for tool in reg.iter() {
            let delay = tool.simulated_delay();
            assert!(
                delay >= Duration::from_millis(1500) && delay <= Duration::from_secs(3),
                "{} delay out of range",
                tool.slug()
            );
        }
    }

    #[test]
    fn test_every_tool_rejects_empty_input() {
        let reg = build_default_registry();
        for tool in reg.iter() {
            let err = tool.validate(&ToolInput::new(tool.slug())).unwrap_err();
            assert!(!err.is_empty(), "{} accepted empty input", tool.slug());
        }
    }

    /// Satisfies every required field with a plausible value.
    fn complete_input(tool: &dyn MoleculeTool) -> ToolInput {
        let mut input = ToolInput::new(tool.slug());
        for field in tool.fields() {
            input = match field.kind {
                FieldKind::File { accept } => {
                    let name = format!("input{}", accept.first().copied().unwrap_or(".pdb"));
                    input.with_file(field.name, UploadedFile::new(name, None, b"ATOM".to_vec()))
                }
                FieldKind::Text { placeholder } => input.with_param(field.name, placeholder),
                FieldKind::Select { options } => input.with_param(field.name, options[0]),
            };
        }
        input
    }

    #[test]
    fn test_every_tool_produces_placeholder_table() {
        let reg = build_default_registry();
        for tool in reg.iter() {
            let input = complete_input(tool.as_ref());
            tool.validate(&input).unwrap();
            let set = tool.placeholder_results(&input);
            assert!(!set.is_empty(), "{} has no placeholder rows", tool.slug());
            for record in set.records() {
                assert_eq!(record.keys().collect::<Vec<_>>(), set.columns().iter().map(String::as_str).collect::<Vec<_>>());
            }
        }
    }
}
