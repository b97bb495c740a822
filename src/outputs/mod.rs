//! Output files written alongside the archived documents.
//!
//! - [`json`]: per-account manifest of the archived batch

pub mod json;
