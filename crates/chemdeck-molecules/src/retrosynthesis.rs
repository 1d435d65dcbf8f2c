//! Retrosynthesis planning page.

use chemdeck_jobs::ResultRecord;
use std::time::Duration;

use crate::tool::{FieldSpec, MoleculeTool, ToolInput};

/// (steps, score, starting materials, first disconnection)
const ROUTES: &[(i64, f64, &str, &str)] = &[
    (3, 0.92, "4-methyl-3-nitroaniline; 4-(chloromethyl)benzoyl chloride", "Amide coupling"),
    (4, 0.81, "2-chloropyrimidine; 3-acetylpyridine; N-methylpiperazine", "Buchwald-Hartwig amination"),
    (5, 0.67, "p-toluidine; methyl 4-formylbenzoate", "Reductive amination"),
];

pub struct RetrosynthesisTool;

impl MoleculeTool for RetrosynthesisTool {
    fn slug(&self) -> &'static str { "retrosynthesis" }

    fn title(&self) -> &'static str { "Retrosynthesis Planning" }

    fn description(&self) -> &'static str {
        "Propose synthetic routes from purchasable building blocks."
    }

    fn run_label(&self) -> &'static str { "Plan Routes" }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::text("smiles", "Target SMILES", "Molecule to synthesize", "CC(=O)Nc1ccc(O)cc1"),
            FieldSpec::select("max_steps", "Maximum steps", "", &["5", "8", "12"]),
        ]
    }

    fn simulated_delay(&self) -> Duration { Duration::from_millis(3000) }

    fn placeholder_records(&self, _input: &ToolInput) -> Vec<ResultRecord> {
        ROUTES
            .iter()
            .enumerate()
            .map(|(i, &(steps, score, materials, key_step))| {
                ResultRecord::new()
                    .with("route", (i + 1) as i64)
                    .with("steps", steps)
                    .with("score", score)
                    .with("key_step", key_step)
                    .with("starting_materials", materials)
                    .with("purchasable", true)
            })
            .collect()
    }
}
