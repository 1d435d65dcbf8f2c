//! ChemDeck Molecules - the tool catalog and the structure viewer.
//!
//! Each tool page is a `MoleculeTool`: a set of input fields, a nominal
//! run time, and the placeholder table it shows on completion.
//! 1. Protein-ligand docking
//! 2. Binding pocket detection
//! 3. De novo molecule generation
//! 4. Similarity search
//! 5. Property prediction and ADMET profiling
//! 6. Molecular dynamics setup
//! 7. Binding affinity estimation
//! 8. Retrosynthesis planning
//! 9. Protein preparation
//!
//! `viewer` wraps an external rendering engine; `pdb` is the RCSB-backed engine.

pub mod tool;
pub mod registry;
pub mod docking;
pub mod pocket;
pub mod ligand;
pub mod similarity;
pub mod admet;
pub mod md;
pub mod scoring;
pub mod retrosynthesis;
pub mod prep;
pub mod pipeline;
pub mod viewer;
pub mod pdb;

pub use registry::{build_default_registry, ToolRegistry};
pub use tool::{FieldKind, FieldSpec, MoleculeTool, ToolInput};
