//! Similarity search page.

use chemdeck_jobs::ResultRecord;
use std::time::Duration;

use crate::tool::{FieldSpec, MoleculeTool, ToolInput};

const FINGERPRINTS: &[&str] = &["morgan", "maccs", "atompair"];

/// (ChEMBL id, preferred name, SMILES, Tanimoto)
const HITS: &[(&str, &str, &str, f64)] = &[
    ("CHEMBL941", "IMATINIB", "Cc1ccc(NC(=O)c2ccc(CN3CCN(C)CC3)cc2)cc1Nc1nccc(-c2cccnc2)n1", 0.94),
    ("CHEMBL255863", "NILOTINIB", "Cc1cn(-c2cc(NC(=O)c3ccc(C)c(Nc4nccc(-c5cccnc5)n4)c3)cc(C(F)(F)F)c2)cn1", 0.71),
    ("CHEMBL1421", "DASATINIB", "Cc1nc(Nc2ncc(C(=O)Nc3c(C)cccc3Cl)s2)cc(N2CCN(CCO)CC2)n1", 0.52),
    ("CHEMBL1171837", "PONATINIB", "Cc1ccc(C(=O)Nc2ccc(CN3CCN(C)CC3)c(C(F)(F)F)c2)cc1C#Cc1cnc2cccnn12", 0.49),
];

pub struct SimilarityTool;

impl MoleculeTool for SimilarityTool {
    fn slug(&self) -> &'static str { "similarity" }

    fn title(&self) -> &'static str { "Similarity Search" }

    fn description(&self) -> &'static str {
        "Find structurally similar compounds in a reference library."
    }

    fn run_label(&self) -> &'static str { "Search" }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::text("smiles", "Query SMILES", "Structure to search with", "Cc1ccc(NC(=O)c2ccccc2)cc1"),
            FieldSpec::select("fingerprint", "Fingerprint", "", FINGERPRINTS),
            FieldSpec::select("threshold", "Minimum similarity", "", &["0.4", "0.6", "0.8"]),
        ]
    }

    fn simulated_delay(&self) -> Duration { Duration::from_millis(1500) }

    fn placeholder_records(&self, input: &ToolInput) -> Vec<ResultRecord> {
        let fingerprint = input.param("fingerprint").unwrap_or(FINGERPRINTS[0]);
        HITS.iter()
            .map(|&(id, name, smiles, tanimoto)| {
                ResultRecord::new()
                    .with("chembl_id", id)
                    .with("name", name)
                    .with("smiles", smiles)
                    .with("tanimoto", tanimoto)
                    .with("fingerprint", fingerprint)
            })
            .collect()
    }
}
