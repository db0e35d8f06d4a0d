use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::KnowledgeError;
use crate::models::Direction;

/// Home-remedy guidance for one test key in one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemedyEntry {
    pub test_key: String,
    pub direction: Direction,
    pub meaning: String,
    pub remedies: Vec<String>,
    pub doctor_note: String,
}

/// Words that carry no identity in a test name ("Total Cholesterol", "RBC Count").
const FILLER_WORDS: &[&str] = &[
    "total",
    "count",
    "mean",
    "corp",
    "distribution",
    "width",
    "concentration",
    "conc",
];

/// Ordered remedy knowledge base.
#[derive(Debug, Clone)]
pub struct RemedyKnowledgeBase {
    entries: Vec<RemedyEntry>,
    /// Distinct keys in first-appearance order.
    keys: Vec<String>,
}

static BUILTIN: LazyLock<RemedyKnowledgeBase> = LazyLock::new(RemedyKnowledgeBase::builtin);

impl RemedyKnowledgeBase {
    /// Process-wide built-in knowledge base.
    pub fn shared() -> &'static RemedyKnowledgeBase {
        &BUILTIN
    }

    pub fn new(entries: Vec<RemedyEntry>) -> Result<Self, KnowledgeError> {
        let mut keys: Vec<String> = Vec::new();
        for entry in &entries {
            if entry.test_key.trim().is_empty() {
                return Err(KnowledgeError::EmptyKey("remedy knowledge base"));
            }
            if !keys.iter().any(|k| k == &entry.test_key) {
                keys.push(entry.test_key.clone());
            }
        }
        Ok(Self { entries, keys })
    }

    /// Parse a JSON array of entries. Array order is lookup order.
    pub fn from_json(json: &str) -> Result<Self, KnowledgeError> {
        let entries: Vec<RemedyEntry> = serde_json::from_str(json)
            .map_err(|e| KnowledgeError::Parse("remedy knowledge base", e))?;
        Self::new(entries)
    }

    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| KnowledgeError::Load(path.to_path_buf(), e))?;
        let kb = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            entries = kb.entries.len(),
            "Loaded remedy knowledge base"
        );
        Ok(kb)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn entries(&self) -> &[RemedyEntry] {
        &self.entries
    }

    fn has_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Entry for an exact key and direction.
    pub fn entry(&self, key: &str, direction: Direction) -> Option<&RemedyEntry> {
        self.entries
            .iter()
            .find(|e| e.test_key == key && e.direction == direction)
    }

    /// Resolve a free-text test name and fetch the entry for `direction`.
    /// A resolved key without an entry for that direction yields `None`.
    pub fn find(&self, test_name: &str, direction: Direction) -> Option<&RemedyEntry> {
        let key = self.resolve_key(test_name)?;
        self.entry(key, direction)
    }

    /// Map a free-text test name to a knowledge-base key.
    ///
    /// Direct substring match first (raw name, then with filler words
    /// removed), then the alias rules.
    pub fn resolve_key(&self, test_name: &str) -> Option<&str> {
        let normalized = test_name.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        if let Some(key) = self.substring_match(&normalized) {
            trace!(key, "Remedy key matched directly");
            return Some(key);
        }

        let cleaned = strip_filler_words(&normalized);
        if !cleaned.is_empty() && cleaned != normalized {
            if let Some(key) = self.substring_match(&cleaned) {
                trace!(key, "Remedy key matched after filler removal");
                return Some(key);
            }
        }

        let alias = alias_for(&normalized)?;
        if self.has_key(alias) {
            trace!(key = alias, "Remedy key matched by alias");
            self.keys.iter().find(|k| *k == alias).map(String::as_str)
        } else {
            None
        }
    }

    fn substring_match(&self, name: &str) -> Option<&str> {
        if let Some(key) = self.keys.iter().find(|k| name.contains(k.as_str())) {
            return Some(key);
        }
        if name.chars().count() < 3 {
            return None;
        }
        self.keys
            .iter()
            .find(|k| k.contains(name))
            .map(String::as_str)
    }

    fn builtin() -> Self {
        let anaemia_remedies = [
            "Roz 1 glass anaar ka juice piyein",
            "Chukandar (beetroot) + gajar ka salad khayein",
            "Palak, bathua, aur leafy greens khayein",
            "Gur (jaggery) ka paani piyein",
            "Black raisins (kishmish) pani me bhigo kar khayein",
            "Dates (khajur) aur dry fruits khayein",
            "Iron-rich foods: chana, dal, rajma",
        ];
        let volume_remedies = [
            "Roz 1 glass anaar ka juice piyein",
            "Chukandar (beetroot) ka juice",
            "Palak aur leafy greens khayein",
            "Gur (jaggery) ka paani piyein",
            "Dates (khajur) aur dry fruits khayein",
            "Iron-rich foods: chana, dal, rajma, spinach",
        ];
        let weakness_note =
            "Agar weakness bahut zyada ho ya chakkar aaye toh doctor se checkup karwa lena.";
        let rbc_meaning = "RBC count kam hai. Isse anemia ho sakta hai, weakness ho sakti hai. \
                           Body me lahu (blood) cells kam ban rahe hain.";

        let entries = vec![
            remedy(
                "hemoglobin",
                Direction::Low,
                "Body me lahu kam ban raha hai, energy kam ho sakti hai.",
                &[
                    "Roz 1 glass anaar ka juice",
                    "Chukandar + gajar ka salad",
                    "Palak / bathua / leafy greens",
                    "Gur (jaggery) ka paani",
                    "Black raisins (kishmish) pani me bhigo kar",
                ],
                "Agar weakness bahut zyada ho toh checkup karwa lena.",
            ),
            remedy(
                "hemoglobin",
                Direction::High,
                "Body me lahu zyada ban raha hai. Yeh polycythemia ka sign ho sakta hai.",
                &[
                    "Zyada pani piyein",
                    "Regular exercise karein",
                    "Smoking avoid karein",
                ],
                "Please consult doctor for proper evaluation.",
            ),
            remedy(
                "vitamin d",
                Direction::Low,
                "Body me Vitamin D ki kami hai. Isse bones kamzor ho sakte hain, pain ho sakta hai.",
                &[
                    "Roz subah 15-20 minutes dhoop me baithiye (sunlight)",
                    "Mushrooms khayein (sun-dried)",
                    "Egg yolk khayein",
                    "Fatty fish (if non-veg)",
                    "Fortified milk piyein",
                ],
                "Agar pain bahut ho ya bones me problem ho toh doctor se consult karein.",
            ),
            remedy(
                "calcium",
                Direction::Low,
                "Body me calcium kam hai. Isse bones aur teeth kamzor ho sakte hain.",
                &[
                    "Roz 2 glass doodh piyein",
                    "Curd (dahi) khayein",
                    "Ragi (finger millet) khayein",
                    "Sesame seeds (til) khayein",
                    "Green leafy vegetables khayein",
                    "Almonds (badam) khayein",
                ],
                "Agar bones me pain ho ya teeth me problem ho toh doctor se checkup karwa lena.",
            ),
            remedy(
                "vitamin b12",
                Direction::Low,
                "Vitamin B12 ki kami hai. Isse weakness, memory issues, aur tingling ho sakti hai.",
                &[
                    "Dairy products: doodh, dahi, paneer",
                    "Eggs khayein",
                    "Fortified cereals",
                    "If non-veg: fish, chicken",
                ],
                "Agar tingling ya numbness ho toh doctor se consult karein.",
            ),
            remedy(
                "iron",
                Direction::Low,
                "Body me iron kam hai. Isse anemia ho sakta hai, weakness ho sakti hai.",
                &[
                    "Chukandar (beetroot) ka juice",
                    "Palak aur leafy greens",
                    "Dates (khajur) aur dry fruits",
                    "Jaggery (gur) ka paani",
                    "Black sesame seeds (til)",
                    "Legumes: chana, dal, rajma",
                ],
                "Agar weakness bahut zyada ho toh doctor se checkup karwa lena.",
            ),
            remedy(
                "cholesterol",
                Direction::High,
                "Cholesterol zyada hai. Isse heart problems ho sakte hain.",
                &[
                    "Oats (jai) khayein",
                    "Garlic (lehsun) khayein",
                    "Green tea piyein",
                    "Regular exercise karein",
                    "Oily aur fried food avoid karein",
                    "Fiber-rich foods khayein",
                ],
                "Please consult doctor for proper cholesterol management.",
            ),
            remedy(
                "blood sugar",
                Direction::High,
                "Blood sugar zyada hai. Yeh diabetes ka sign ho sakta hai.",
                &[
                    "Bitter gourd (karela) ka juice",
                    "Fenugreek (methi) seeds",
                    "Cinnamon (dalchini)",
                    "Regular exercise",
                    "Sugar aur sweets avoid karein",
                ],
                "Please consult doctor for proper diabetes management.",
            ),
            remedy(
                "blood sugar",
                Direction::Low,
                "Blood sugar kam hai. Isse weakness, chakkar, ya confusion ho sakti hai.",
                &[
                    "Immediate: glucose, sugar water, or fruit juice",
                    "Regular meals khayein",
                    "Complex carbs khayein",
                ],
                "Agar chakkar ya confusion ho toh immediately doctor se consult karein.",
            ),
            remedy(
                "immunity",
                Direction::Low,
                "Immunity kam hai. Isse jaldi jaldi illness ho sakti hai.",
                &[
                    "Roz subah haldi doodh piyein",
                    "Giloy ka juice",
                    "Tulsi (basil) ki chai",
                    "Amla (Indian gooseberry) khayein",
                    "Citrus fruits: orange, lemon",
                    "Proper sleep lein (7-8 hours)",
                    "Regular exercise karein",
                ],
                "Agar bahut jaldi jaldi illness ho rahi ho toh doctor se consult karein.",
            ),
            remedy(
                "acidity",
                Direction::High,
                "Acidity zyada hai. Isse stomach me burning, discomfort ho sakti hai.",
                &[
                    "Saunf (fennel seeds) ka paani piyein",
                    "Cold milk piyein",
                    "Jeera (cumin) water",
                    "Ajwain (carom seeds)",
                    "Spicy aur oily food avoid karein",
                    "Regular meals khayein, skip mat karein",
                ],
                "Agar acidity bahut zyada ho ya regular ho toh doctor se consult karein.",
            ),
            remedy("rbc", Direction::Low, rbc_meaning, &anaemia_remedies, weakness_note),
            remedy("rbc count", Direction::Low, rbc_meaning, &anaemia_remedies, weakness_note),
            remedy(
                "pcv",
                Direction::Low,
                "PCV/Hematocrit kam hai. Yeh bhi anemia ka sign hai. Body me lahu (blood) volume kam hai.",
                &volume_remedies,
                weakness_note,
            ),
            remedy(
                "hematocrit",
                Direction::Low,
                "Hematocrit kam hai. Yeh bhi anemia ka sign hai. Body me lahu (blood) volume kam hai.",
                &volume_remedies,
                weakness_note,
            ),
        ];

        // Built-in keys are non-empty literals.
        let mut keys: Vec<String> = Vec::new();
        for entry in &entries {
            if !keys.contains(&entry.test_key) {
                keys.push(entry.test_key.clone());
            }
        }
        Self { entries, keys }
    }
}

fn remedy(
    key: &str,
    direction: Direction,
    meaning: &str,
    remedies: &[&str],
    doctor_note: &str,
) -> RemedyEntry {
    RemedyEntry {
        test_key: key.to_string(),
        direction,
        meaning: meaning.to_string(),
        remedies: remedies.iter().map(|r| r.to_string()).collect(),
        doctor_note: doctor_note.to_string(),
    }
}

fn strip_filler_words(name: &str) -> String {
    name.split_whitespace()
        .filter(|word| !FILLER_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn has_token(name: &str, token: &str) -> bool {
    name.split(|c: char| !c.is_alphanumeric())
        .any(|t| t == token)
}

/// Hard-coded spellings and abbreviations seen on Indian lab reports.
fn alias_for(name: &str) -> Option<&'static str> {
    // Red-cell indices with no home-remedy guidance.
    if name.contains("mchc")
        || name.contains("mean corp hb conc")
        || has_token(name, "rdw")
        || has_token(name, "pdw")
    {
        return None;
    }
    if name.contains("haemoglobin") || name.contains("hemoglobin") || has_token(name, "hb") {
        return Some("hemoglobin");
    }
    if has_token(name, "rbc") {
        return Some(if name.contains("count") { "rbc count" } else { "rbc" });
    }
    if name.contains("hematocrit") || name.contains("hamatocrit") {
        return Some("hematocrit");
    }
    if has_token(name, "pcv") || name.contains("p.c.v") {
        return Some("pcv");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> &'static RemedyKnowledgeBase {
        RemedyKnowledgeBase::shared()
    }

    #[test]
    fn keys_in_declaration_order() {
        let keys: Vec<&str> = kb().keys().collect();
        assert_eq!(keys[0], "hemoglobin");
        assert_eq!(keys[1], "vitamin d");
        assert_eq!(keys.last(), Some(&"hematocrit"));
        assert_eq!(keys.iter().filter(|k| **k == "blood sugar").count(), 1);
    }

    #[test]
    fn every_entry_has_remedies_and_note() {
        for entry in kb().entries() {
            assert!(!entry.remedies.is_empty(), "{} has no remedies", entry.test_key);
            assert!(!entry.doctor_note.is_empty());
            assert!(!entry.meaning.is_empty());
        }
    }

    #[test]
    fn direct_substring_match() {
        assert_eq!(kb().resolve_key("Serum Calcium"), Some("calcium"));
        assert_eq!(kb().resolve_key("Vitamin B12"), Some("vitamin b12"));
        assert_eq!(kb().resolve_key("HEMOGLOBIN"), Some("hemoglobin"));
    }

    #[test]
    fn filler_words_removed_before_matching() {
        assert_eq!(kb().resolve_key("Total Cholesterol"), Some("cholesterol"));
        // "total acid" only matches "acidity" once "total" is dropped.
        assert_eq!(kb().resolve_key("Total Acid"), Some("acidity"));
    }

    #[test]
    fn aliases_for_indian_spellings() {
        assert_eq!(kb().resolve_key("HAEMOGLOBIN (Hb)"), Some("hemoglobin"));
        assert_eq!(kb().resolve_key("Hb"), Some("hemoglobin"));
        assert_eq!(kb().resolve_key("P.C.V."), Some("pcv"));
        assert_eq!(kb().resolve_key("Hamatocrit"), Some("hematocrit"));
    }

    #[test]
    fn rbc_count_resolution() {
        // "rbc" is declared before "rbc count" and wins the direct match.
        assert_eq!(kb().resolve_key("RBC Count"), Some("rbc"));
        assert!(kb().find("RBC Count", Direction::Low).is_some());
    }

    #[test]
    fn indices_without_remedies_resolve_to_nothing() {
        assert_eq!(kb().resolve_key("MCHC"), None);
        assert_eq!(kb().resolve_key("MEAN CORP HB CONC"), None);
        assert_eq!(kb().resolve_key("RDW-CV"), None);
        assert_eq!(kb().resolve_key("PDW"), None);
    }

    #[test]
    fn short_alias_needs_whole_token() {
        assert_eq!(kb().resolve_key("HbA1c"), None);
    }

    #[test]
    fn unknown_test_is_none() {
        assert_eq!(kb().resolve_key("Serum Sodium"), None);
        assert_eq!(kb().resolve_key("   "), None);
    }

    #[test]
    fn missing_direction_is_none() {
        // Calcium only has guidance for low values.
        assert!(kb().find("Calcium", Direction::Low).is_some());
        assert!(kb().find("Calcium", Direction::High).is_none());
    }

    #[test]
    fn entry_by_key_and_direction() {
        let high = kb().entry("hemoglobin", Direction::High).unwrap();
        assert!(high.meaning.contains("polycythemia"));
        assert_eq!(high.remedies.len(), 3);
    }

    #[test]
    fn custom_kb_alias_requires_key() {
        let json = r#"[{
            "test_key": "zinc", "direction": "Low", "meaning": "m",
            "remedies": ["r"], "doctor_note": "d"
        }]"#;
        let custom = RemedyKnowledgeBase::from_json(json).unwrap();
        assert_eq!(custom.resolve_key("Serum Zinc"), Some("zinc"));
        // Alias points at "hemoglobin", which this base does not have.
        assert_eq!(custom.resolve_key("Hb"), None);
    }

    #[test]
    fn custom_kb_rejects_empty_key() {
        let json = r#"[{"test_key": "", "direction": "Low", "meaning": "", "remedies": [], "doctor_note": ""}]"#;
        assert!(matches!(
            RemedyKnowledgeBase::from_json(json),
            Err(KnowledgeError::EmptyKey(_))
        ));
    }
}
