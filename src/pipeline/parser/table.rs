//! Column-header strategy for OCR'd report tables.
//!
//! OCR engines usually emit a table column by column: every test name, then
//! the `Result` header and its values, then `Unit` and its units, then the
//! `Range` header and its ranges. Rows are rebuilt by positional index.

use tracing::debug;

use super::patterns::{
    contains_digit, contains_header_keyword, parse_number, BARE_NUMBER, BARE_UNIT, HEADER_KEYWORDS,
    NAME_LINE, RANGE_PAIR,
};
use crate::models::{NumericRange, ParsedResult};

/// First line index of each column header, tracked independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderPositions {
    pub result: Option<usize>,
    pub unit: Option<usize>,
    pub range: Option<usize>,
}

impl HeaderPositions {
    pub fn locate(lines: &[&str]) -> Self {
        let mut positions = Self::default();
        for (i, line) in lines.iter().enumerate() {
            let lower = line.to_lowercase();
            if positions.result.is_none() && lower.contains("result") {
                positions.result = Some(i);
            }
            if positions.unit.is_none() && lower.contains("unit") {
                positions.unit = Some(i);
            }
            if positions.range.is_none() && (lower.contains("range") || lower.contains("bri")) {
                positions.range = Some(i);
            }
        }
        positions
    }

    fn earliest(&self) -> Option<usize> {
        [self.result, self.unit, self.range].into_iter().flatten().min()
    }
}

/// Half-open window `(header, end)` of line indices below a header.
/// Empty when `end` does not lie past `header`.
fn window(header: usize, end: Option<usize>, len: usize) -> std::ops::Range<usize> {
    let start = header + 1;
    let end = end.unwrap_or(len).min(len);
    if end < start {
        start..start
    } else {
        start..end
    }
}

fn is_table_name(line: &str) -> bool {
    if line.is_empty() || contains_header_keyword(line) || contains_digit(line) {
        return false;
    }
    let starts_upper = line.chars().next().is_some_and(|c| c.is_uppercase());
    NAME_LINE.is_match(line) || (starts_upper && line.chars().count() > 3)
}

fn is_unit(line: &str) -> bool {
    BARE_UNIT.is_match(line) && !HEADER_KEYWORDS.contains(&line.to_lowercase().as_str())
}

fn parse_range(line: &str) -> Option<NumericRange> {
    let caps = RANGE_PAIR.captures(line)?;
    let min = parse_number(&caps[1])?;
    let max = parse_number(&caps[2])?;
    Some(NumericRange::new(min, max))
}

/// Rebuild rows from a column-ordered table. Empty when there is no
/// `Result` header or no value lines under it.
pub fn parse_table(lines: &[&str]) -> Vec<ParsedResult> {
    let headers = HeaderPositions::locate(lines);
    let Some(result_idx) = headers.result else {
        return Vec::new();
    };
    let first_header = headers.earliest().unwrap_or(result_idx);

    let names: Vec<&str> = lines[..first_header]
        .iter()
        .copied()
        .filter(|line| is_table_name(line))
        .collect();

    let values: Vec<f64> = lines[window(result_idx, headers.unit, lines.len())]
        .iter()
        .filter_map(|line| BARE_NUMBER.captures(line))
        .filter_map(|caps| parse_number(&caps[1]))
        .collect();

    let units: Vec<&str> = match headers.unit {
        Some(unit_idx) => lines[window(unit_idx, headers.range, lines.len())]
            .iter()
            .copied()
            .filter(|line| is_unit(line))
            .collect(),
        None => Vec::new(),
    };

    let ranges: Vec<NumericRange> = match headers.range {
        Some(range_idx) => lines[window(range_idx, None, lines.len())]
            .iter()
            .filter_map(|line| parse_range(line))
            .collect(),
        None => Vec::new(),
    };

    debug!(
        names = names.len(),
        values = values.len(),
        units = units.len(),
        ranges = ranges.len(),
        "Column-header table candidates"
    );

    names
        .iter()
        .zip(values.iter())
        .enumerate()
        .map(|(idx, (name, &value))| {
            let unit = units.get(idx).copied().unwrap_or_default();
            let range = ranges.get(idx).copied();
            let range_text = range.map_or_else(|| "N/A".to_string(), |r| r.display());
            ParsedResult {
                test_name: name.to_string(),
                value,
                unit: unit.to_string(),
                status: range.map(|r| r.classify(value)),
                reference_range: range,
                raw_line: format!("{name} | {value} | {unit} | {range_text}"),
            }
        })
        .collect()
}
