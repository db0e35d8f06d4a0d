use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::KnowledgeError;
use crate::models::{Gender, NumericRange};

/// Normal range for one test key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    /// Lower-case substring matched against free-text test names.
    pub test_key: String,
    pub normal: NumericRange,
    pub unit: String,
    #[serde(default)]
    pub gender_specific: bool,
    #[serde(default)]
    pub male: Option<NumericRange>,
    #[serde(default)]
    pub female: Option<NumericRange>,
    /// Informational sub-ranges (glucose only in the built-in table).
    #[serde(default)]
    pub fasting: Option<NumericRange>,
    #[serde(default)]
    pub random: Option<NumericRange>,
}

impl ReferenceRange {
    /// Range to judge a value against. Gender-specific sub-ranges apply only
    /// when the entry is gender-specific and the gender is known.
    pub fn range_for(&self, gender: Option<Gender>) -> NumericRange {
        if !self.gender_specific {
            return self.normal;
        }
        match gender {
            Some(Gender::Male) => self.male.unwrap_or(self.normal),
            Some(Gender::Female) => self.female.unwrap_or(self.normal),
            None => self.normal,
        }
    }

    fn validate(&self) -> Result<(), KnowledgeError> {
        if self.test_key.trim().is_empty() {
            return Err(KnowledgeError::EmptyKey("reference range table"));
        }
        let ranges = [Some(self.normal), self.male, self.female, self.fasting, self.random];
        for range in ranges.into_iter().flatten() {
            if range.min >= range.max {
                return Err(KnowledgeError::InvertedRange {
                    key: self.test_key.clone(),
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

/// Ordered reference range table. Lookup is first-match-wins.
#[derive(Debug, Clone)]
pub struct ReferenceRangeTable {
    entries: Vec<ReferenceRange>,
}

static BUILTIN: LazyLock<ReferenceRangeTable> = LazyLock::new(ReferenceRangeTable::builtin);

impl ReferenceRangeTable {
    /// Process-wide built-in table.
    pub fn shared() -> &'static ReferenceRangeTable {
        &BUILTIN
    }

    /// Build from entries, validating every range. Order is preserved.
    pub fn new(entries: Vec<ReferenceRange>) -> Result<Self, KnowledgeError> {
        for entry in &entries {
            entry.validate()?;
        }
        Ok(Self { entries })
    }

    /// Parse a JSON array of entries. Array order is lookup order.
    pub fn from_json(json: &str) -> Result<Self, KnowledgeError> {
        let entries: Vec<ReferenceRange> = serde_json::from_str(json)
            .map_err(|e| KnowledgeError::Parse("reference range table", e))?;
        Self::new(entries)
    }

    /// Load a curated table from disk.
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| KnowledgeError::Load(path.to_path_buf(), e))?;
        let table = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            entries = table.len(),
            "Loaded reference range table"
        );
        Ok(table)
    }

    /// First entry whose key is a substring of the normalized test name.
    pub fn lookup(&self, test_name: &str) -> Option<&ReferenceRange> {
        let normalized = test_name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|entry| normalized.contains(entry.test_key.as_str()))
    }

    pub fn entries(&self) -> &[ReferenceRange] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn builtin() -> Self {
        let r = NumericRange::new;
        let hb_male = r(13.5, 17.5);
        let hb_female = r(12.0, 15.5);
        let hct_male = r(40.0, 50.0);
        let hct_female = r(36.0, 46.0);

        let entries = vec![
            gendered("hemoglobin", r(12.0, 16.0), "g/dL", hb_male, hb_female),
            gendered("hb", r(12.0, 16.0), "gm/dl", hb_male, hb_female),
            plain("rbc", r(4.5, 5.5), "million/μL"),
            plain("rbc count", r(3.8, 4.8), "millions/cmm"),
            gendered("haemoglobin", r(12.0, 16.0), "gm/dl", hb_male, hb_female),
            gendered("pcv", r(36.0, 46.0), "%", hct_male, hct_female),
            gendered("hematocrit", r(36.0, 46.0), "%", hct_male, hct_female),
            plain("mcv", r(83.0, 101.0), "fL"),
            plain("mch", r(27.0, 32.0), "pg"),
            plain("mchc", r(31.5, 34.5), "g/dL"),
            plain("rdw", r(11.6, 14.0), "%"),
            plain("mpv", r(6.0, 9.0), "fL"),
            plain("pdw", r(11.0, 18.0), "%"),
            plain("neutrophil", r(40.0, 80.0), "%"),
            plain("lymphocytes", r(20.0, 40.0), "%"),
            plain("eosinophils", r(1.0, 6.0), "%"),
            plain("monocytes", r(2.0, 10.0), "%"),
            plain("basophils", r(0.0, 1.0), "%"),
            plain("tlc", r(4000.0, 11000.0), "/cumm"),
            plain("wbc", r(4000.0, 11000.0), "/μL"),
            plain("platelet", r(150000.0, 450000.0), "/μL"),
            plain("platelets", r(150000.0, 450000.0), "/μL"),
            plain("vitamin d", r(30.0, 100.0), "ng/mL"),
            plain("vitamin d3", r(30.0, 100.0), "ng/mL"),
            plain("calcium", r(8.5, 10.5), "mg/dL"),
            plain("vitamin b12", r(200.0, 900.0), "pg/mL"),
            plain("vitamin b 12", r(200.0, 900.0), "pg/mL"),
            plain("iron", r(60.0, 170.0), "μg/dL"),
            plain("ferritin", r(15.0, 200.0), "ng/mL"),
            plain("tsh", r(0.4, 4.0), "mIU/L"),
            plain("t3", r(80.0, 200.0), "ng/dL"),
            plain("t4", r(5.0, 12.0), "μg/dL"),
            plain("cholesterol", r(0.0, 200.0), "mg/dL"),
            plain("hdl", r(40.0, 60.0), "mg/dL"),
            plain("ldl", r(0.0, 100.0), "mg/dL"),
            plain("triglycerides", r(0.0, 150.0), "mg/dL"),
            plain("blood sugar", r(70.0, 100.0), "mg/dL"),
            ReferenceRange {
                fasting: Some(r(70.0, 100.0)),
                random: Some(r(70.0, 140.0)),
                ..plain("glucose", r(70.0, 100.0), "mg/dL")
            },
            plain("creatinine", r(0.6, 1.2), "mg/dL"),
            plain("urea", r(7.0, 20.0), "mg/dL"),
            plain("bilirubin", r(0.1, 1.2), "mg/dL"),
            plain("sgot", r(10.0, 40.0), "U/L"),
            plain("sgpt", r(10.0, 40.0), "U/L"),
            plain("alt", r(10.0, 40.0), "U/L"),
            plain("ast", r(10.0, 40.0), "U/L"),
        ];

        Self { entries }
    }
}

fn plain(key: &str, normal: NumericRange, unit: &str) -> ReferenceRange {
    ReferenceRange {
        test_key: key.to_string(),
        normal,
        unit: unit.to_string(),
        gender_specific: false,
        male: None,
        female: None,
        fasting: None,
        random: None,
    }
}

fn gendered(
    key: &str,
    normal: NumericRange,
    unit: &str,
    male: NumericRange,
    female: NumericRange,
) -> ReferenceRange {
    ReferenceRange {
        gender_specific: true,
        male: Some(male),
        female: Some(female),
        ..plain(key, normal, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ranges_are_valid() {
        for entry in ReferenceRangeTable::shared().entries() {
            assert!(
                entry.normal.min < entry.normal.max,
                "{} has an inverted range",
                entry.test_key
            );
            assert!(entry.validate().is_ok(), "{} failed validation", entry.test_key);
        }
    }

    #[test]
    fn builtin_keys_are_lowercase() {
        for entry in ReferenceRangeTable::shared().entries() {
            assert_eq!(entry.test_key, entry.test_key.to_lowercase());
        }
    }

    #[test]
    fn lookup_is_first_match() {
        let table = ReferenceRangeTable::shared();
        // "mch" is declared before "mchc" and wins the tie.
        assert_eq!(table.lookup("MCHC").unwrap().test_key, "mch");
        // "hemoglobin" is declared before "hb".
        assert_eq!(table.lookup("Hemoglobin (Hb)").unwrap().test_key, "hemoglobin");
        assert_eq!(table.lookup("HAEMOGLOBIN").unwrap().test_key, "haemoglobin");
        assert_eq!(table.lookup("  Vitamin D3 ").unwrap().test_key, "vitamin d");
    }

    #[test]
    fn lookup_unknown_is_none() {
        assert!(ReferenceRangeTable::shared().lookup("Sodium").is_none());
    }

    #[test]
    fn hb_keeps_first_position_with_later_unit() {
        let table = ReferenceRangeTable::shared();
        let keys: Vec<&str> = table.entries().iter().map(|e| e.test_key.as_str()).collect();
        assert_eq!(&keys[..3], &["hemoglobin", "hb", "rbc"]);
        assert_eq!(table.entries()[1].unit, "gm/dl");
        assert_eq!(keys.iter().filter(|k| **k == "hb").count(), 1);
    }

    #[test]
    fn gender_specific_selection() {
        let hb = ReferenceRangeTable::shared().lookup("hemoglobin").unwrap();
        assert_eq!(hb.range_for(Some(Gender::Male)), NumericRange::new(13.5, 17.5));
        assert_eq!(hb.range_for(Some(Gender::Female)), NumericRange::new(12.0, 15.5));
        assert_eq!(hb.range_for(None), NumericRange::new(12.0, 16.0));
    }

    #[test]
    fn non_gendered_ignores_gender() {
        let ca = ReferenceRangeTable::shared().lookup("calcium").unwrap();
        assert_eq!(ca.range_for(Some(Gender::Male)), ca.normal);
    }

    #[test]
    fn glucose_carries_sub_ranges() {
        let glucose = ReferenceRangeTable::shared().lookup("glucose fasting").unwrap();
        assert_eq!(glucose.random, Some(NumericRange::new(70.0, 140.0)));
    }

    #[test]
    fn from_json_preserves_order_and_validates() {
        let json = r#"[
            {"test_key": "zinc", "normal": {"min": 60, "max": 120}, "unit": "ug/dL"},
            {"test_key": "zin", "normal": {"min": 1, "max": 2}, "unit": "x"}
        ]"#;
        let table = ReferenceRangeTable::from_json(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("Serum Zinc").unwrap().test_key, "zinc");
    }

    #[test]
    fn from_json_rejects_inverted_range() {
        let json = r#"[{"test_key": "zinc", "normal": {"min": 120, "max": 60}, "unit": "ug/dL"}]"#;
        let err = ReferenceRangeTable::from_json(json).unwrap_err();
        assert!(matches!(err, KnowledgeError::InvertedRange { .. }));
    }

    #[test]
    fn from_json_rejects_empty_key() {
        let json = r#"[{"test_key": " ", "normal": {"min": 1, "max": 2}, "unit": ""}]"#;
        assert!(matches!(
            ReferenceRangeTable::from_json(json),
            Err(KnowledgeError::EmptyKey(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranges.json");
        std::fs::write(
            &path,
            r#"[{"test_key": "sodium", "normal": {"min": 135, "max": 145}, "unit": "mmol/L"}]"#,
        )
        .unwrap();
        let table = ReferenceRangeTable::load(&path).unwrap();
        assert!(table.lookup("Serum Sodium").is_some());
    }

    #[test]
    fn load_missing_file_errors() {
        let err = ReferenceRangeTable::load(Path::new("/nonexistent/ranges.json")).unwrap_err();
        assert!(matches!(err, KnowledgeError::Load(..)));
    }
}
