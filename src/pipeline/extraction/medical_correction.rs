//! Post-OCR correction of lab-test vocabulary.
//!
//! OCR on low-quality report photos routinely misreads one or two letters
//! of long test names (`Haemog1obin`, `Vitamln`). Words that land within a
//! small edit distance of exactly one known term are rewritten to that
//! term, keeping the original capitalisation.

use tracing::trace;

/// Words shorter than this are never touched.
const MIN_WORD_CHARS: usize = 5;

/// Largest edit distance that still counts as a misread.
const MAX_EDIT_DISTANCE: usize = 2;

/// Lab vocabulary. Lowercase, sorted for binary search. Both British and
/// American spellings are listed so neither is "corrected" into the other.
const LAB_TERMS: &[&str] = &[
    "albumin",
    "basophils",
    "bilirubin",
    "calcium",
    "cholesterol",
    "creatinine",
    "eosinophils",
    "fasting",
    "ferritin",
    "glucose",
    "haematocrit",
    "haemoglobin",
    "hematocrit",
    "hemoglobin",
    "lymphocytes",
    "monocytes",
    "neutrophil",
    "neutrophils",
    "platelet",
    "platelets",
    "potassium",
    "random",
    "sodium",
    "triglycerides",
    "vitamin",
];

/// Rewrite near-miss lab terms in `text`. Returns the corrected text and
/// how many words changed. Everything that is not a word is kept verbatim.
pub fn correct_lab_terms(text: &str) -> (String, usize) {
    let mut output = String::with_capacity(text.len());
    let mut corrections = 0;
    let mut word_start: Option<usize> = None;

    let mut flush = |word: &str, output: &mut String| match correct_word(word) {
        Some(fixed) => {
            trace!(from = word, to = %fixed, "Lab term corrected");
            corrections += 1;
            output.push_str(&fixed);
        }
        None => output.push_str(word),
    };

    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            word_start.get_or_insert(idx);
            continue;
        }
        if let Some(start) = word_start.take() {
            flush(&text[start..idx], &mut output);
        }
        output.push(ch);
    }
    if let Some(start) = word_start {
        flush(&text[start..], &mut output);
    }

    (output, corrections)
}

/// The replacement for `word`, or `None` when it should stay as is.
fn correct_word(word: &str) -> Option<String> {
    let length = word.chars().count();
    if length < MIN_WORD_CHARS || !word.chars().any(char::is_alphabetic) {
        return None;
    }

    let lower = word.to_lowercase();
    if LAB_TERMS.binary_search(&lower.as_str()).is_ok() {
        return None;
    }

    let mut best: Option<(&str, usize)> = None;
    let mut tied = false;
    for &term in LAB_TERMS {
        if term.chars().count().abs_diff(length) > MAX_EDIT_DISTANCE {
            continue;
        }
        let distance = levenshtein(&lower, term);
        if distance > MAX_EDIT_DISTANCE {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance == best_distance => tied = true,
            Some((_, best_distance)) if distance > best_distance => {}
            _ => {
                best = Some((term, distance));
                tied = false;
            }
        }
    }

    match best {
        Some((term, _)) if !tied => Some(match_case(word, term)),
        _ => None,
    }
}

/// Give `term` the capitalisation pattern of `original`: ALL CAPS,
/// Leading capital, or lowercase.
fn match_case(original: &str, term: &str) -> String {
    let letters = || original.chars().filter(|c| c.is_alphabetic());
    if letters().all(char::is_uppercase) {
        return term.to_uppercase();
    }
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = term.chars();
        return chars
            .next()
            .map(|first| first.to_uppercase().chain(chars).collect())
            .unwrap_or_default();
    }
    term.to_string()
}

/// Levenshtein distance over chars, single-row table.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(ca != cb);
            row[j + 1] = substitution.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }
    row[b.len()]
}
