use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ChatError;
use crate::config;
use crate::models::Intensity;

/// Fields every dataset record must carry, in validation order.
const REQUIRED_FIELDS: [&str; 4] = ["query", "category", "remedy", "intensity"];

/// One traditional remedy, keyed by the complaint it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemedyRecord {
    pub category: String,
    pub query: String,
    pub remedy: String,
    pub intensity: Intensity,
}

impl RemedyRecord {
    /// Parse a single record from a JSON object, naming the first missing
    /// field rather than failing with a generic serde message.
    pub fn from_json(json: &str) -> Result<Self, ChatError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        for field in REQUIRED_FIELDS {
            if value.get(field).is_none() {
                return Err(ChatError::MissingField(field));
            }
        }
        let record: Self = serde_json::from_value(value)?;
        record.validate()?;
        Ok(record)
    }

    /// Text fields must be non-blank.
    pub fn validate(&self) -> Result<(), ChatError> {
        let fields = [
            ("query", &self.query),
            ("category", &self.category),
            ("remedy", &self.remedy),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ChatError::MissingField(name));
            }
        }
        Ok(())
    }
}

/// Record counts for the stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total_remedies: usize,
    pub categories: BTreeMap<String, usize>,
    pub intensities: BTreeMap<String, usize>,
}

/// The chatbot's remedy records, optionally backed by a JSON file.
#[derive(Debug, Clone, Default)]
pub struct RemedyDataset {
    records: Vec<RemedyRecord>,
    path: Option<PathBuf>,
}

impl RemedyDataset {
    /// In-memory dataset. `add` will not persist anything.
    pub fn new(records: Vec<RemedyRecord>) -> Self {
        Self {
            records,
            path: None,
        }
    }

    /// Load a JSON array of records. Later `add` calls write back to `path`.
    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Io(path.to_path_buf(), e))?;
        let records: Vec<RemedyRecord> = serde_json::from_str(&json)?;
        tracing::info!(
            path = %path.display(),
            entries = records.len(),
            "Loaded remedy dataset"
        );
        Ok(Self {
            records,
            path: Some(path.to_path_buf()),
        })
    }

    /// Like `load`, but a missing or unreadable file yields an empty dataset
    /// bound to `path`, so the first `add` creates it.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(dataset) => dataset,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Remedy dataset unavailable, starting empty");
                Self {
                    records: Vec::new(),
                    path: Some(path.to_path_buf()),
                }
            }
        }
    }

    /// The dataset at `config::remedy_dataset_path()`, or an empty one.
    pub fn load_default() -> Self {
        Self::load_or_empty(&config::remedy_dataset_path())
    }

    pub fn records(&self) -> &[RemedyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Validate and append a record, then persist when file-backed. A failed
    /// write leaves the records as they were.
    pub fn add(&mut self, record: RemedyRecord) -> Result<(), ChatError> {
        record.validate()?;
        self.records.push(record);
        if let Some(path) = self.path.clone() {
            if let Err(e) = self.save_to(&path) {
                self.records.pop();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Drop the most recently added record and persist the shorter list.
    /// The in-memory list shrinks even when the write fails.
    pub fn undo_last_add(&mut self) -> Result<Option<RemedyRecord>, ChatError> {
        let removed = self.records.pop();
        if removed.is_some() {
            if let Some(path) = self.path.clone() {
                self.save_to(&path)?;
            }
        }
        Ok(removed)
    }

    /// Write the records as pretty-printed JSON (non-ASCII kept as is).
    pub fn save_to(&self, path: &Path) -> Result<(), ChatError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ChatError::Io(parent.to_path_buf(), e))?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(path, json).map_err(|e| ChatError::Io(path.to_path_buf(), e))?;
        tracing::debug!(path = %path.display(), entries = self.records.len(), "Saved remedy dataset");
        Ok(())
    }

    pub fn stats(&self) -> DatasetStats {
        let mut categories = BTreeMap::new();
        let mut intensities = BTreeMap::new();
        for record in &self.records {
            *categories.entry(record.category.clone()).or_insert(0) += 1;
            *intensities
                .entry(record.intensity.as_str().to_string())
                .or_insert(0) += 1;
        }
        DatasetStats {
            total_remedies: self.records.len(),
            categories,
            intensities,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_record(category: &str, query: &str, remedy: &str) -> RemedyRecord {
        RemedyRecord {
            category: category.into(),
            query: query.into(),
            remedy: remedy.into(),
            intensity: Intensity::Mild,
        }
    }

    #[test]
    fn from_json_names_missing_field() {
        let err = RemedyRecord::from_json(
            r#"{"query": "cough", "category": "cold", "intensity": "mild"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ChatError::MissingField("remedy")));
    }

    #[test]
    fn from_json_checks_query_first() {
        let err = RemedyRecord::from_json(r#"{}"#).unwrap_err();
        assert!(matches!(err, ChatError::MissingField("query")));
    }

    #[test]
    fn from_json_rejects_unknown_intensity() {
        let err = RemedyRecord::from_json(
            r#"{"query": "cough", "category": "cold", "remedy": "Adrak", "intensity": "extreme"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ChatError::Json(_)));
    }

    #[test]
    fn from_json_accepts_complete_record() {
        let record = RemedyRecord::from_json(
            r#"{"query": "dry cough", "category": "cold", "remedy": "Shahad aur adrak", "intensity": "moderate"}"#,
        )
        .unwrap();
        assert_eq!(record.intensity, Intensity::Moderate);
        assert_eq!(record.category, "cold");
    }

    #[test]
    fn add_rejects_blank_text() {
        let mut dataset = RemedyDataset::default();
        let err = dataset.add(make_record("cold", "  ", "Adrak")).unwrap_err();
        assert!(matches!(err, ChatError::MissingField("query")));
        assert!(dataset.is_empty());
    }

    #[test]
    fn save_and_load_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remedies.json");

        let mut dataset = RemedyDataset::load_or_empty(&path);
        assert!(dataset.is_empty());
        dataset
            .add(make_record("cold", "sore throat", "Namak ke paani se garare karein"))
            .unwrap();

        let reloaded = RemedyDataset::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.records()[0].remedy, "Namak ke paani se garare karein");
        assert_eq!(reloaded.path(), Some(path.as_path()));
    }

    #[test]
    fn failed_write_keeps_records_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut dataset = RemedyDataset::load_or_empty(&blocker.join("remedies.json"));
        let err = dataset
            .add(make_record("skin", "dry skin", "Nariyal tel"))
            .unwrap_err();
        assert!(matches!(err, ChatError::Io(_, _)));
        assert!(dataset.is_empty());
    }

    #[test]
    fn undo_last_add_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remedies.json");
        let mut dataset = RemedyDataset::load_or_empty(&path);
        dataset.add(make_record("cold", "sore throat", "Garare")).unwrap();
        dataset.add(make_record("digestion", "gas", "Ajwain")).unwrap();

        let removed = dataset.undo_last_add().unwrap().unwrap();
        assert_eq!(removed.category, "digestion");
        assert_eq!(RemedyDataset::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn undo_on_empty_dataset_is_noop() {
        let mut dataset = RemedyDataset::default();
        assert!(dataset.undo_last_add().unwrap().is_none());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RemedyDataset::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ChatError::Io(_, _)));
    }

    #[test]
    fn in_memory_add_does_not_persist() {
        let mut dataset = RemedyDataset::new(vec![]);
        dataset.add(make_record("digestion", "gas", "Ajwain")).unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(dataset.path().is_none());
    }

    #[test]
    fn stats_count_by_category_and_intensity() {
        let mut moderate = make_record("cold", "persistent cough", "Haldi doodh");
        moderate.intensity = Intensity::Moderate;
        let dataset = RemedyDataset::new(vec![
            make_record("cold", "sore throat", "Garare"),
            moderate,
            make_record("digestion", "gas", "Ajwain"),
        ]);
        let stats = dataset.stats();
        assert_eq!(stats.total_remedies, 3);
        assert_eq!(stats.categories["cold"], 2);
        assert_eq!(stats.intensities["mild"], 2);
        assert_eq!(stats.intensities["moderate"], 1);
    }
}
