//! Curated lab knowledge: reference ranges and traditional remedies.
//!
//! Both tables are ordered sequences. Lookups are first-match substring
//! searches, so declaration order decides ties (`hemoglobin` before `hb`,
//! `mch` before `mchc`). Built-in tables are constructed once per process and
//! shared read-only.

pub mod reference;
pub mod remedies;

pub use reference::*;
pub use remedies::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Failed to read {0}: {1}")]
    Load(PathBuf, std::io::Error),

    #[error("Failed to parse {0}: {1}")]
    Parse(&'static str, serde_json::Error),

    #[error("Invalid reference range for '{key}': min {min} is not below max {max}")]
    InvertedRange { key: String, min: f64, max: f64 },

    #[error("Empty test key in {0}")]
    EmptyKey(&'static str),
}
