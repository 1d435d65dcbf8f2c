//! Binding pocket detection page (fpocket style output).

use chemdeck_jobs::ResultRecord;
use std::time::Duration;

use crate::tool::{FieldSpec, MoleculeTool, ToolInput};

/// (score, druggability, volume Å^3, alpha spheres, lining residues)
const POCKETS: &[(f64, f64, f64, i64, &str)] = &[
    (0.87, 0.92, 812.4, 64, "LEU83 GLU81 PHE80 LYS33"),
    (0.61, 0.74, 533.9, 41, "ASP145 ASN132 GLN131"),
    (0.42, 0.38, 301.2, 27, "TYR15 GLY13 THR14"),
];

pub struct PocketFinderTool;

impl MoleculeTool for PocketFinderTool {
    fn slug(&self) -> &'static str { "pocket-finder" }

    fn title(&self) -> &'static str { "Binding Pocket Detection" }

    fn description(&self) -> &'static str {
        "Locate and rank candidate binding cavities on a protein surface."
    }

    fn run_label(&self) -> &'static str { "Find Pockets" }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::file("protein", "Protein structure", "Drop a PDB file here or click to browse", &[".pdb"]),
            FieldSpec::select("min_spheres", "Minimum alpha spheres", "Smaller pockets are discarded", &["15", "30", "50"]),
        ]
    }

    fn simulated_delay(&self) -> Duration { Duration::from_millis(2000) }

    fn placeholder_records(&self, _input: &ToolInput) -> Vec<ResultRecord> {
        POCKETS
            .iter()
            .enumerate()
            .map(|(i, &(score, druggability, volume, spheres, residues))| {
                ResultRecord::new()
                    .with("pocket", (i + 1) as i64)
                    .with("score", score)
                    .with("druggability", druggability)
                    .with("volume_a3", volume)
                    .with("alpha_spheres", spheres)
                    .with("residues", residues)
            })
            .collect()
    }
}
