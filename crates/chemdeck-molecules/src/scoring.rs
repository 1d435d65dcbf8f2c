//! Binding affinity estimation page.
//!
//! The composite score rewards tight binding and penalizes drug-likeness
//! violations, so the table ranks the same way a screening run would.

use chemdeck_jobs::ResultRecord;
use std::time::Duration;

use crate::tool::{FieldSpec, MoleculeTool, ToolInput};

const METHODS: &[&str] = &["vina", "mm-gbsa", "ml-rescore"];

/// Composite of a docking score (kcal/mol, negative is better), QED and Ro5 violations.
pub fn composite_score(docking_score: f64, qed: f64, ro5_violations: u32) -> f64 {
    (-docking_score * qed) - ro5_violations as f64 * 2.5
}

/// (scoring term, ΔG kcal/mol, estimated Kd)
const TERMS: &[(&str, f64, &str)] = &[
    ("Vina score", -9.1, "210 nM"),
    ("MM-GBSA ΔG bind", -41.7, "n/a"),
    ("Rescored ΔG", -10.3, "28 nM"),
];

pub struct BindingAffinityTool;

impl MoleculeTool for BindingAffinityTool {
    fn slug(&self) -> &'static str { "binding-affinity" }

    fn title(&self) -> &'static str { "Binding Affinity Estimation" }

    fn description(&self) -> &'static str {
        "Estimate the binding free energy of a protein-ligand complex."
    }

    fn run_label(&self) -> &'static str { "Estimate Affinity" }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::file("complex", "Complex structure", "Drop a protein-ligand complex PDB here", &[".pdb"]),
            FieldSpec::select("method", "Scoring method", "", METHODS),
        ]
    }

    fn simulated_delay(&self) -> Duration { Duration::from_millis(2000) }

    fn placeholder_records(&self, _input: &ToolInput) -> Vec<ResultRecord> {
        TERMS
            .iter()
            .map(|&(term, dg, kd)| {
                ResultRecord::new()
                    .with("term", term)
                    .with("delta_g_kcal_mol", dg)
                    .with("kd_estimate", kd)
                    .with("composite", (composite_score(dg, 0.8, 0) * 100.0).round() / 100.0)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_penalizes_violations() {
        let clean = composite_score(-9.0, 1.0, 0);
        let dirty = composite_score(-9.0, 0.6, 2);
        assert!((clean - 9.0).abs() < 1e-9);
        assert!(dirty < clean);
    }
}
