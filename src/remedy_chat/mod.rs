//! Traditional household-remedy chatbot.
//!
//! Free-text complaints are triaged by urgency, then matched against a JSON
//! dataset of remedies, through an optional semantic index or plain
//! string similarity. Emergencies always get a "seek medical help" reply.

pub mod chatbot;
pub mod dataset;
pub mod intensity;
pub mod search;

pub use chatbot::{ChatReply, ChatStats, RemedyAdded, RemedyChatbot, SearchMethod};
pub use dataset::{DatasetStats, RemedyDataset, RemedyRecord};
pub use intensity::classify_intensity;
pub use search::{keyword_search, similarity, SearchHit, SemanticIndex};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Please provide a query")]
    EmptyQuery,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Failed to access {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Invalid remedy JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semantic index error: {0}")]
    Index(String),
}
