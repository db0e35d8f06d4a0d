use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::dataset::{DatasetStats, RemedyDataset, RemedyRecord};
use super::intensity::classify_intensity;
use super::search::{keyword_search, SearchHit, SemanticIndex, MATCH_THRESHOLD};
use super::ChatError;
use crate::models::{as_percent, Intensity};

pub const EMERGENCY_RESPONSE: &str = "🚨 This sounds like a serious medical situation. Please seek IMMEDIATE medical help. Call emergency services or visit the nearest hospital. Traditional remedies are not appropriate for emergencies.";

pub const SAFETY_DISCLAIMER: &str = "\n\n⚠️ **Important:** This is a traditional remedy based on cultural practices, not a medical treatment. For emergencies or symptoms that worsen, seek medical help immediately.";

const GENERAL_CATEGORY: &str = "general";
const EMERGENCY_CATEGORY: &str = "emergency";

/// How a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    EmergencyDetection,
    Semantic,
    Keyword,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub intensity: Intensity,
    pub category: String,
    /// Match score as a percentage. Absent for emergency replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub timestamp: NaiveDateTime,
    pub search_method: SearchMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemedyAdded {
    pub message: String,
    pub remedy: RemedyRecord,
    pub total_remedies: usize,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatStats {
    #[serde(flatten)]
    pub dataset: DatasetStats,
    pub semantic_search_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    pub timestamp: NaiveDateTime,
}

/// Traditional household-remedy chatbot.
///
/// Answers free-text complaints from the remedy dataset, preferring the
/// semantic index when one is attached and keyword similarity otherwise.
/// Emergencies are never answered with a remedy.
pub struct RemedyChatbot {
    dataset: RemedyDataset,
    index: Option<Box<dyn SemanticIndex>>,
}

impl RemedyChatbot {
    pub fn new(dataset: RemedyDataset) -> Self {
        Self {
            dataset,
            index: None,
        }
    }

    pub fn with_index(mut self, index: Box<dyn SemanticIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn dataset(&self) -> &RemedyDataset {
        &self.dataset
    }

    pub fn respond(&self, query: &str, use_semantic: bool) -> Result<ChatReply, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }

        let intensity = classify_intensity(query);
        if intensity == Intensity::Emergency {
            info!("Emergency query detected, skipping remedy search");
            return Ok(ChatReply {
                response: EMERGENCY_RESPONSE.to_string(),
                intensity,
                category: EMERGENCY_CATEGORY.to_string(),
                confidence: None,
                timestamp: Local::now().naive_local(),
                search_method: SearchMethod::EmergencyDetection,
            });
        }

        let (hit, method) = self.find_best_remedy(query, use_semantic);
        debug!(
            method = ?method,
            matched = hit.is_some(),
            score = hit.as_ref().map(|h| h.score),
            "Remedy search finished"
        );

        let reply = match hit {
            Some(SearchHit { record, score }) => ChatReply {
                response: with_disclaimer(&record.remedy),
                intensity: record.intensity,
                category: record.category,
                confidence: Some(as_percent(score)),
                timestamp: Local::now().naive_local(),
                search_method: method,
            },
            None => ChatReply {
                response: general_response(query),
                intensity,
                category: GENERAL_CATEGORY.to_string(),
                confidence: Some(0.0),
                timestamp: Local::now().naive_local(),
                search_method: method,
            },
        };
        Ok(reply)
    }

    /// Semantic hit when enabled and available, otherwise the keyword
    /// search result. The method reported is the one that produced the hit.
    fn find_best_remedy(&self, query: &str, use_semantic: bool) -> (Option<SearchHit>, SearchMethod) {
        if let Some(index) = self.index.as_deref().filter(|_| use_semantic) {
            match index.search(query, 1, MATCH_THRESHOLD) {
                Ok(hits) => {
                    if let Some(hit) = hits.into_iter().next() {
                        return (Some(hit), SearchMethod::Semantic);
                    }
                }
                Err(e) => warn!(error = %e, "Semantic search failed, falling back to keyword search"),
            }
        }
        (
            keyword_search(self.dataset.records(), query),
            SearchMethod::Keyword,
        )
    }

    /// Dataset first, then the index. A failed dataset write touches
    /// neither; a failed index insert undoes the dataset add.
    pub fn add_remedy(&mut self, record: RemedyRecord) -> Result<RemedyAdded, ChatError> {
        record.validate()?;
        self.dataset.add(record.clone())?;
        if let Some(index) = self.index.as_deref_mut() {
            if let Err(e) = index.insert(&record) {
                if let Err(undo) = self.dataset.undo_last_add() {
                    warn!(error = %undo, "Could not restore remedy dataset file after index failure");
                }
                return Err(e);
            }
        }
        info!(
            category = %record.category,
            total = self.dataset.len(),
            "Remedy added"
        );
        Ok(RemedyAdded {
            message: "Remedy added successfully".to_string(),
            remedy: record,
            total_remedies: self.dataset.len(),
            timestamp: Local::now().naive_local(),
        })
    }

    pub fn stats(&self) -> ChatStats {
        ChatStats {
            dataset: self.dataset.stats(),
            semantic_search_enabled: self.index.is_some(),
            index_size: self.index.as_ref().map(|i| i.len()),
            model_name: self.index.as_ref().map(|i| i.model_name().to_string()),
            timestamp: Local::now().naive_local(),
        }
    }
}

fn with_disclaimer(remedy: &str) -> String {
    let lower = remedy.to_lowercase();
    if lower.contains("medical") || lower.contains("doctor") {
        remedy.to_string()
    } else {
        format!("{remedy}{SAFETY_DISCLAIMER}")
    }
}

fn general_response(query: &str) -> String {
    format!(
        "I understand you're asking about: '{query}'. \
         While I provide traditional Indian/Pakistani household remedies, \
         I don't have specific information about this query in my knowledge base. \
         For personalized advice, please consult a healthcare professional. \
         If this is an emergency, seek immediate medical help."
    )
}
