//! Protein-ligand docking page (AutoDock Vina style output).

use chemdeck_jobs::ResultRecord;
use std::time::Duration;

use crate::tool::{FieldSpec, MoleculeTool, ToolInput};

pub const LIGAND_FORMATS: &[&str] = &[".pdb", ".pdbqt", ".sdf", ".mol2"];

/// Vina `--exhaustiveness` presets offered on the page.
const EXHAUSTIVENESS: &[&str] = &["8", "16", "32"];

/// (affinity kcal/mol, rmsd l.b., rmsd u.b.) for the sample poses.
const POSES: &[(f64, f64, f64)] = &[
    (-9.4, 0.0, 0.0),
    (-8.9, 1.82, 2.47),
    (-8.6, 2.13, 3.05),
    (-8.1, 3.41, 5.92),
    (-7.7, 4.08, 6.71),
];

pub struct DockingTool;

impl MoleculeTool for DockingTool {
    fn slug(&self) -> &'static str { "docking" }

    fn title(&self) -> &'static str { "Protein-Ligand Docking" }

    fn description(&self) -> &'static str {
        "Predict binding poses and affinities of a ligand against a prepared receptor."
    }

    fn run_label(&self) -> &'static str { "Run Prediction" }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::file(
                "ligand",
                "Ligand file",
                "Drop a ligand structure here or click to browse",
                LIGAND_FORMATS,
            ),
            FieldSpec::select("exhaustiveness", "Exhaustiveness", "Search effort per run", EXHAUSTIVENESS),
        ]
    }

    fn simulated_delay(&self) -> Duration { Duration::from_millis(3000) }

    fn placeholder_records(&self, input: &ToolInput) -> Vec<ResultRecord> {
        let ligand = input.file_stem("ligand").unwrap_or("ligand");
        POSES
            .iter()
            .enumerate()
            .map(|(i, &(affinity, rmsd_lb, rmsd_ub))| {
                ResultRecord::new()
                    .with("pose", (i + 1) as i64)
                    .with("ligand", ligand)
                    .with("affinity_kcal_mol", affinity)
                    .with("rmsd_lb", rmsd_lb)
                    .with("rmsd_ub", rmsd_ub)
            })
            .collect()
    }
}
