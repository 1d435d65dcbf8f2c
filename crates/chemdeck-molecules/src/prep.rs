//! Protein preparation page.

use chemdeck_jobs::ResultRecord;
use std::time::Duration;

use crate::tool::{FieldSpec, MoleculeTool, ToolInput};

pub struct ProteinPrepTool;

impl MoleculeTool for ProteinPrepTool {
    fn slug(&self) -> &'static str { "protein-prep" }

    fn title(&self) -> &'static str { "Protein Preparation" }

    fn description(&self) -> &'static str {
        "Add hydrogens, assign protonation states and repair missing atoms."
    }

    fn run_label(&self) -> &'static str { "Prepare Protein" }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::file("protein", "Protein structure", "Drop a PDB or mmCIF file here or click to browse", &[".pdb", ".cif"]),
            FieldSpec::select("ph", "Protonation pH", "", &["7.4", "6.5", "5.0"]),
        ]
    }

    fn simulated_delay(&self) -> Duration { Duration::from_millis(1500) }

    fn placeholder_records(&self, input: &ToolInput) -> Vec<ResultRecord> {
        let ph = input.param("ph").unwrap_or("7.4");
        let checks: [(&str, i64, String); 5] = [
            ("Hydrogens added", 2_318, "polar and non-polar".to_string()),
            ("Missing side chains rebuilt", 4, "LYS33 GLU51 ARG126 LYS129".to_string()),
            ("Protonation states assigned", 37, format!("at pH {ph}")),
            ("Waters removed", 112, "beyond 5 Å of ligand".to_string()),
            ("Alternate locations resolved", 6, "highest occupancy kept".to_string()),
        ];
        checks
            .into_iter()
            .map(|(operation, count, details)| {
                ResultRecord::new()
                    .with("operation", operation)
                    .with("count", count)
                    .with("details", details)
            })
            .collect()
    }
}
