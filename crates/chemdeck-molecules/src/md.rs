//! Molecular dynamics setup page.

use chemdeck_jobs::ResultRecord;
use std::time::Duration;

use crate::tool::{FieldSpec, MoleculeTool, ToolInput};

const FORCE_FIELDS: &[&str] = &["amber14", "charmm36", "opls-aa"];
const WATER_MODELS: &[&str] = &["tip3p", "spce", "tip4p-ew"];

pub struct MdSetupTool;

impl MoleculeTool for MdSetupTool {
    fn slug(&self) -> &'static str { "md-setup" }

    fn title(&self) -> &'static str { "Molecular Dynamics Setup" }

    fn description(&self) -> &'static str {
        "Solvate, neutralize and parameterize a protein for simulation."
    }

    fn run_label(&self) -> &'static str { "Prepare System" }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::file("protein", "Protein structure", "Drop a PDB file here or click to browse", &[".pdb"]),
            FieldSpec::select("force_field", "Force field", "", FORCE_FIELDS),
            FieldSpec::select("water_model", "Water model", "", WATER_MODELS),
        ]
    }

    fn simulated_delay(&self) -> Duration { Duration::from_millis(2500) }

    fn placeholder_records(&self, input: &ToolInput) -> Vec<ResultRecord> {
        let force_field = input.param("force_field").unwrap_or(FORCE_FIELDS[0]);
        let water = input.param("water_model").unwrap_or(WATER_MODELS[0]);
        let steps: [(&str, &str, String); 6] = [
            ("Topology", "Done", format!("{force_field} parameters assigned")),
            ("Solvation", "Done", format!("{water} box, 10 Å padding, 18,432 waters")),
            ("Neutralization", "Done", "62 Na+ / 58 Cl- at 0.15 M".to_string()),
            ("Minimization", "Done", "5,000 steps, Fmax 842.1 kJ/mol/nm".to_string()),
            ("NVT equilibration", "Done", "100 ps at 300 K".to_string()),
            ("NPT equilibration", "Done", "100 ps at 1 bar".to_string()),
        ];
        steps
            .into_iter()
            .enumerate()
            .map(|(i, (stage, status, details))| {
                ResultRecord::new()
                    .with("step", (i + 1) as i64)
                    .with("stage", stage)
                    .with("status", status)
                    .with("details", details)
            })
            .collect()
    }
}
