//! De novo molecule generation page.

use chemdeck_jobs::ResultRecord;
use std::time::Duration;

use crate::admet::{qed_estimate, ro5_violations, Descriptors};
use crate::tool::{FieldSpec, MoleculeTool, ToolInput};

/// A sample generated molecule.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub smiles: &'static str,
    pub descriptors: Descriptors,
    pub sa_score: f64,
}

pub const CANDIDATES: &[Candidate] = &[
    Candidate {
        smiles: "Cc1ccc(NC(=O)c2ccc(CN3CCN(C)CC3)cc2)cc1Nc1nccc(-c2cccnc2)n1",
        descriptors: Descriptors { mw: 493.6, logp: 4.59, hbd: 2, hba: 7 },
        sa_score: 2.41,
    },
    Candidate {
        smiles: "COc1cc2ncnc(Nc3ccc(F)c(Cl)c3)c2cc1OCCCN1CCOCC1",
        descriptors: Descriptors { mw: 446.9, logp: 4.28, hbd: 1, hba: 7 },
        sa_score: 2.63,
    },
    Candidate {
        smiles: "CC(C)n1nc(-c2ccc(N)cc2)c2c(N)ncnc21",
        descriptors: Descriptors { mw: 268.3, logp: 2.11, hbd: 2, hba: 6 },
        sa_score: 2.89,
    },
    Candidate {
        smiles: "O=C(Nc1ccc(Cl)cc1)N1CCC(c2nc3ccccc3[nH]2)CC1",
        descriptors: Descriptors { mw: 354.8, logp: 4.02, hbd: 2, hba: 3 },
        sa_score: 2.17,
    },
];

const BATCH_SIZES: &[&str] = &["4", "16", "64"];

pub struct DeNovoTool;

impl MoleculeTool for DeNovoTool {
    fn slug(&self) -> &'static str { "de-novo" }

    fn title(&self) -> &'static str { "De Novo Molecule Generation" }

    fn description(&self) -> &'static str {
        "Generate novel drug-like molecules conditioned on a binding pocket."
    }

    fn run_label(&self) -> &'static str { "Generate Molecules" }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::file("pocket", "Pocket structure", "Drop a pocket PDB file here or click to browse", &[".pdb"]),
            FieldSpec::select("count", "Molecules to generate", "", BATCH_SIZES),
        ]
    }

    fn simulated_delay(&self) -> Duration { Duration::from_millis(3000) }

    fn placeholder_records(&self, _input: &ToolInput) -> Vec<ResultRecord> {
        CANDIDATES
            .iter()
            .enumerate()
            .map(|(i, c)| {
                ResultRecord::new()
                    .with("id", format!("GEN-{:03}", i + 1))
                    .with("smiles", c.smiles)
                    .with("mw", c.descriptors.mw)
                    .with("qed", qed_estimate(ro5_violations(&c.descriptors)))
                    .with("sa_score", c.sa_score)
            })
            .collect()
    }
}
