//! chemdeck-web: Web front end for ChemDeck
//! Provides:
//!   - A dashboard of every tool
//!   - One server-side session per open tool page (uploads, parameters, job, results)
//!   - The 3D structure viewer
//!   - Live job status over SSE

pub mod error;
pub mod router;
pub mod handlers;
pub mod render;
pub mod session;
pub mod state;
pub mod sse;
