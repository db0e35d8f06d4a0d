use std::sync::LazyLock;

use regex::Regex;

/// Words that mark a column-header line in tabular reports.
pub const HEADER_KEYWORDS: &[&str] = &["test", "result", "unit", "range", "value", "bri"];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid parser regex")
}

/// `Name: value unit (Status)`, status word optional parentheses.
pub static LABELED_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)([^:]+):\s*([0-9]+\.?[0-9]*)\s*([a-zA-Zµμ/%]+)\s*\(?(low|high|critical|normal|abnormal)\)?",
    )
});

/// `Name: value (Status)`.
pub static LABELED_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)([^:]+):\s*([0-9]+\.?[0-9]*)\s*\(?(low|high|critical|normal|abnormal)\)?")
});

/// `Name: value [unit]` and nothing else on the line.
pub static LABELED_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^([^:]+):\s*([0-9]+\.?[0-9]*)\s*([a-zA-Zµμ/%]+)?\s*$")
});

/// All-caps label such as `HAEMOGLOBIN (Hb)` or `PACKED CELL VOLUME`.
pub static NAME_LINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[A-Z][A-Z\s/()]+(?:\([A-Za-z]+\))?\s*$"));

/// `NAME   value   unit ...` on a single line. Title case allowed, as is a
/// colon after the name when a range follows (`Hb: 8.5 g/dL 12-15`).
/// The token after the value must be a whole unit or start with a non-letter,
/// so `WBC: 4.5 x10^3/uL` does not read as a unitless 4.5.
pub static TABULAR_ROW: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^([A-Z][A-Za-z0-9 \t/().,-]*?[A-Za-z0-9)]):?\s+([0-9]+\.?[0-9]*)(?:\s*$|\s+(?:([a-zA-Zµμ/%]+)(?:\s|$)|[^a-zA-Zµμ/%\s]))",
    )
});

/// A bare number, optionally followed by a unit.
pub static VALUE_LINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^([0-9]+\.?[0-9]*)\s*([a-zA-Zµμ/%]+)?\s*$"));

/// A bare number and nothing else.
pub static BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(r"^([0-9]+\.?[0-9]*)\s*$"));

/// A bare unit token (`g/dL`, `%`, `fL`).
pub static BARE_UNIT: LazyLock<Regex> = LazyLock::new(|| compile(r"^[a-zA-Zµμ/%]+$"));

/// `min-max` pair, hyphen or en-dash, anywhere on the line.
pub static RANGE_PAIR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"([0-9]+\.?[0-9]*)\s*[-–]\s*([0-9]+\.?[0-9]*)"));

/// Parse a captured numeric token. Malformed or non-finite values yield `None`.
pub fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

pub fn contains_digit(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_digit())
}

pub fn contains_header_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    HEADER_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// A line that is probably a test name on its own: all caps, no digits.
pub fn is_name_line(line: &str) -> bool {
    line.chars().count() > 3 && !contains_digit(line) && NAME_LINE.is_match(line)
}
