//! Property prediction and ADMET profiling pages.

use chemdeck_jobs::ResultRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::tool::{FieldSpec, MoleculeTool, ToolInput};

/// Lipinski descriptors of a molecule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Descriptors {
    pub mw: f64,
    pub logp: f64,
    pub hbd: u32,
    pub hba: u32,
}

/// Rule-of-five violations.
pub fn ro5_violations(d: &Descriptors) -> u32 {
    let mut violations = 0;
    if d.mw > 500.0 { violations += 1; }
    if d.logp > 5.0 { violations += 1; }
    if d.hbd > 5 { violations += 1; }
    if d.hba > 10 { violations += 1; }
    violations
}

/// Coarse drug-likeness in [0.2, 1.0], 0.2 lost per violation.
pub fn qed_estimate(violations: u32) -> f64 {
    1.0 - (violations as f64 * 0.2).min(0.8)
}

/// Sample descriptors shown for any submitted structure (aspirin-like).
const SAMPLE: Descriptors = Descriptors { mw: 180.16, logp: 1.31, hbd: 1, hba: 4 };

pub struct PropertiesTool;

impl MoleculeTool for PropertiesTool {
    fn slug(&self) -> &'static str { "properties" }

    fn title(&self) -> &'static str { "Molecular Property Prediction" }

    fn description(&self) -> &'static str {
        "Estimate physicochemical descriptors and drug-likeness from a SMILES string."
    }

    fn run_label(&self) -> &'static str { "Predict Properties" }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FieldSpec::text("smiles", "SMILES", "Structure to profile", "CC(=O)OC1=CC=CC=C1C(=O)O")]
    }

    fn simulated_delay(&self) -> Duration { Duration::from_millis(1500) }

    fn placeholder_records(&self, _input: &ToolInput) -> Vec<ResultRecord> {
        let violations = ro5_violations(&SAMPLE);
        let rows: [(&str, String, &str); 7] = [
            ("Molecular weight", SAMPLE.mw.to_string(), "g/mol"),
            ("cLogP", SAMPLE.logp.to_string(), ""),
            ("H-bond donors", SAMPLE.hbd.to_string(), ""),
            ("H-bond acceptors", SAMPLE.hba.to_string(), ""),
            ("TPSA", "63.6".to_string(), "Å²"),
            ("Rule-of-five violations", violations.to_string(), ""),
            ("QED estimate", qed_estimate(violations).to_string(), ""),
        ];
        rows.into_iter()
            .map(|(property, value, unit)| {
                ResultRecord::new()
                    .with("property", property)
                    .with("value", value)
                    .with("unit", unit)
            })
            .collect()
    }
}

/// (endpoint, prediction, probability, flagged)
const ENDPOINTS: &[(&str, &str, f64, bool)] = &[
    ("Caco-2 permeability", "High", 0.91, false),
    ("Human intestinal absorption", "High", 0.96, false),
    ("BBB penetration", "No", 0.72, false),
    ("CYP3A4 inhibition", "Yes", 0.64, true),
    ("CYP2D6 inhibition", "No", 0.83, false),
    ("hERG blockade", "Low risk", 0.77, false),
    ("AMES mutagenicity", "Negative", 0.88, false),
    ("Hepatotoxicity", "Possible", 0.55, true),
];

pub struct AdmetTool;

impl MoleculeTool for AdmetTool {
    fn slug(&self) -> &'static str { "admet" }

    fn title(&self) -> &'static str { "ADMET Profiling" }

    fn description(&self) -> &'static str {
        "Predict absorption, distribution, metabolism, excretion and toxicity endpoints."
    }

    fn run_label(&self) -> &'static str { "Run ADMET" }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::text("smiles", "SMILES", "Structure to profile", "CN1C=NC2=C1C(=O)N(C(=O)N2C)C"),
            FieldSpec::select("species", "Species", "", &["human", "rat", "mouse"]),
        ]
    }

    fn simulated_delay(&self) -> Duration { Duration::from_millis(2000) }

    fn placeholder_records(&self, _input: &ToolInput) -> Vec<ResultRecord> {
        ENDPOINTS
            .iter()
            .map(|&(endpoint, prediction, probability, flagged)| {
                ResultRecord::new()
                    .with("endpoint", endpoint)
                    .with("prediction", prediction)
                    .with("probability", probability)
                    .with("flagged", flagged)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemdeck_jobs::Scalar;

    #[test]
    fn test_ro5_violations() {
        let heavy = Descriptors { mw: 612.0, logp: 5.8, hbd: 6, hba: 12 };
        assert_eq!(ro5_violations(&heavy), 4);
        assert_eq!(ro5_violations(&SAMPLE), 0);
        assert!((qed_estimate(4) - 0.2).abs() < 1e-9);
        assert_eq!(qed_estimate(0), 1.0);
    }

    #[test]
    fn test_properties_table_reports_violations() {
        let input = ToolInput::new("properties").with_param("smiles", "CCO");
        let set = PropertiesTool.placeholder_results(&input);
        assert_eq!(set.columns(), &["property", "value", "unit"]);
        let ro5 = set
            .records()
            .iter()
            .find(|r| r.get("property") == Some(&Scalar::Text("Rule-of-five violations".into())))
            .unwrap();
        assert_eq!(ro5.get("value"), Some(&Scalar::Text("0".into())));
    }
}
