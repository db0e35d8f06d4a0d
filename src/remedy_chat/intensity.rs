use crate::models::Intensity;

/// Classify a chat query by urgency using keyword heuristics.
///
/// Emergency phrases are checked first, so a query mentioning both "severe
/// pain" and "chronic" is an emergency.
pub fn classify_intensity(query: &str) -> Intensity {
    let lower = query.to_lowercase();

    if has_emergency_pattern(&lower) {
        return Intensity::Emergency;
    }

    if has_moderate_pattern(&lower) {
        return Intensity::Moderate;
    }

    Intensity::Mild
}

fn has_emergency_pattern(text: &str) -> bool {
    let patterns = [
        "heart attack",
        "chest pain",
        "stroke",
        "severe",
        "emergency",
        "poisoning",
        "unconscious",
        "severe bleeding",
        "severe burn",
        "difficulty breathing",
        "severe injury",
        "severe headache",
        "severe pain",
        "can't breathe",
        "choking",
        "severe allergic reaction",
        "severe fever",
        "severe diarrhea",
    ];
    patterns.iter().any(|p| text.contains(p))
}

fn has_moderate_pattern(text: &str) -> bool {
    let patterns = [
        "persistent",
        "chronic",
        "frequent",
        "severe",
        "worsening",
        "high fever",
    ];
    patterns.iter().any(|p| text.contains(p))
}
