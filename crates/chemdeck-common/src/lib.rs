//! chemdeck-common: Shared error types used across all ChemDeck crates.

pub mod error;

pub use error::{ChemdeckError, FieldError, Result, ValidationError};
