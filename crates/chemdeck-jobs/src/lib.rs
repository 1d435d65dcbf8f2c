//! chemdeck-jobs: The pattern every ChemDeck tool page is built from:
//!   - input collection (file drop zones)
//!   - a job trigger and tagged state machine (`JobRunner`)
//!   - pluggable executors (fixed-delay placeholder, HTTP job API)
//!   - result tables with derived columns and a visibility toggle

pub mod upload;
pub mod state;
pub mod results;
pub mod executor;
pub mod http;
pub mod runner;

pub use executor::{FixedDelayExecutor, JobExecutor};
pub use http::HttpJobExecutor;
pub use results::{ResultDisplay, ResultRecord, ResultSet, ResultView, RowAction, Scalar, TableRow};
pub use runner::{JobRunner, TriggerError};
pub use state::{JobState, JobStatus};
pub use upload::{FileDropZone, UploadConfig, UploadedFile};
