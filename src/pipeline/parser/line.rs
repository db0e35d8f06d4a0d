//! Line-by-line fallback for reports without column headers.
//!
//! Each line is offered to an ordered cascade of matchers; the first
//! matcher that accepts it wins. Matchers that look ahead mark the lines
//! they used as consumed so the cascade never reads them twice.

use tracing::trace;

use super::patterns::{
    contains_header_keyword, is_name_line, parse_number, BARE_NUMBER, BARE_UNIT, LABELED_STATUS,
    LABELED_VALUE, LABELED_WITH_UNIT, TABULAR_ROW, VALUE_LINE,
};
use crate::models::{ParsedResult, ResultStatus};

/// How far below a name line a split row may place its value.
const SPLIT_ROW_LOOKAHEAD: usize = 3;

/// One line-level layout the parser recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMatcher {
    /// `Hemoglobin: 8.5 g/dL (Low)`
    LabeledWithUnit,
    /// `Hemoglobin: 8.5 (Low)`
    LabeledStatus,
    /// `Hemoglobin: 8.5 g/dL`
    LabeledValue,
    /// `HAEMOGLOBIN` with `8.5` (and optionally `g/dL`) on following lines.
    SplitRow,
    /// `RBC Count    1.24    millions/cmm    3.8-4.8`
    TabularRow,
    /// A bare number attributed to the last unmatched name line.
    OrphanValue,
}

/// The line under inspection plus the state the matchers may consult.
pub struct LineCursor<'a> {
    pub lines: &'a [&'a str],
    pub index: usize,
    pub consumed: &'a [bool],
    pub pending_name: Option<&'a str>,
}

impl<'a> LineCursor<'a> {
    fn line(&self) -> &'a str {
        self.lines[self.index]
    }

    /// Indices of non-empty, unconsumed lines after the current one.
    fn following(&self) -> impl Iterator<Item = usize> + '_ {
        (self.index + 1..self.lines.len())
            .filter(move |&j| !self.lines[j].is_empty() && !self.consumed[j])
    }
}

/// A successful match and the extra lines it used.
#[derive(Debug, Clone, PartialEq)]
pub struct LineMatch {
    pub result: ParsedResult,
    pub consumed: Vec<usize>,
}

impl LineMatcher {
    /// Priority order of the cascade.
    pub const CASCADE: [LineMatcher; 6] = [
        LineMatcher::LabeledWithUnit,
        LineMatcher::LabeledStatus,
        LineMatcher::LabeledValue,
        LineMatcher::SplitRow,
        LineMatcher::TabularRow,
        LineMatcher::OrphanValue,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::LabeledWithUnit => "labeled_with_unit",
            Self::LabeledStatus => "labeled_status",
            Self::LabeledValue => "labeled_value",
            Self::SplitRow => "split_row",
            Self::TabularRow => "tabular_row",
            Self::OrphanValue => "orphan_value",
        }
    }

    pub fn apply(&self, cursor: &LineCursor<'_>) -> Option<LineMatch> {
        match self {
            Self::LabeledWithUnit => labeled_with_unit(cursor.line()),
            Self::LabeledStatus => labeled_status(cursor.line()),
            Self::LabeledValue => labeled_value(cursor.line()),
            Self::SplitRow => split_row(cursor),
            Self::TabularRow => tabular_row(cursor.line()),
            Self::OrphanValue => orphan_value(cursor),
        }
    }
}

fn single(
    test_name: &str,
    value: f64,
    unit: &str,
    status: Option<ResultStatus>,
    raw_line: String,
) -> Option<LineMatch> {
    let test_name = test_name.trim();
    if test_name.is_empty() {
        return None;
    }
    Some(LineMatch {
        result: ParsedResult {
            test_name: test_name.to_string(),
            value,
            unit: unit.trim().to_string(),
            status,
            reference_range: None,
            raw_line,
        },
        consumed: Vec::new(),
    })
}

fn labeled_with_unit(line: &str) -> Option<LineMatch> {
    let caps = LABELED_WITH_UNIT.captures(line)?;
    let value = parse_number(&caps[2])?;
    let unit = &caps[3];
    // A status word swallowed as the unit is not a unit.
    let unit = if ResultStatus::from_word(unit).is_some() { "" } else { unit };
    single(&caps[1], value, unit, ResultStatus::from_word(&caps[4]), line.to_string())
}

fn labeled_status(line: &str) -> Option<LineMatch> {
    let caps = LABELED_STATUS.captures(line)?;
    let value = parse_number(&caps[2])?;
    single(&caps[1], value, "", ResultStatus::from_word(&caps[3]), line.to_string())
}

fn labeled_value(line: &str) -> Option<LineMatch> {
    let caps = LABELED_VALUE.captures(line)?;
    let value = parse_number(&caps[2])?;
    let unit = caps.get(3).map_or("", |m| m.as_str());
    single(&caps[1], value, unit, None, line.to_string())
}

/// Short all-caps tokens (`RBC`, `PCV`, `TSH`) are test names, not units.
fn is_abbreviation(token: &str) -> bool {
    token.chars().count() >= 3 && token.chars().all(|c| c.is_ascii_uppercase())
}

/// A line that may own a value printed further down.
fn is_pending_name(line: &str) -> bool {
    is_name_line(line) || is_abbreviation(line)
}

fn is_unit_line(line: &str) -> bool {
    BARE_UNIT.is_match(line) && !contains_header_keyword(line) && !is_abbreviation(line)
}

fn split_row(cursor: &LineCursor<'_>) -> Option<LineMatch> {
    let name_line = cursor.line();
    if !is_name_line(name_line) {
        return None;
    }

    for j in cursor.following().take(SPLIT_ROW_LOOKAHEAD) {
        let candidate = cursor.lines[j];
        if is_name_line(candidate) {
            return None;
        }
        let Some(caps) = VALUE_LINE.captures(candidate) else {
            continue;
        };
        let value = parse_number(&caps[1])?;
        let mut consumed = vec![j];

        let unit = match caps.get(2) {
            Some(m) => m.as_str().to_string(),
            None => {
                let unit_line = cursor
                    .following()
                    .find(|&k| k > j)
                    .filter(|&k| is_unit_line(cursor.lines[k]));
                match unit_line {
                    Some(k) => {
                        consumed.push(k);
                        cursor.lines[k].to_string()
                    }
                    None => String::new(),
                }
            }
        };

        let mut hit = single(
            name_line,
            value,
            &unit,
            None,
            format!("{name_line} | {candidate}"),
        )?;
        hit.consumed = consumed;
        return Some(hit);
    }
    None
}

fn tabular_row(line: &str) -> Option<LineMatch> {
    let caps = TABULAR_ROW.captures(line)?;
    let value = parse_number(&caps[2])?;
    let unit = caps.get(3).map_or("", |m| m.as_str());
    single(&caps[1], value, unit, None, line.to_string())
}

fn orphan_value(cursor: &LineCursor<'_>) -> Option<LineMatch> {
    let name = cursor.pending_name?;
    let caps = BARE_NUMBER.captures(cursor.line())?;
    let value = parse_number(&caps[1])?;
    single(name, value, "", None, cursor.line().to_string())
}

/// Run the cascade over every line. Unmatched lines are dropped.
pub fn parse_lines(lines: &[&str]) -> Vec<ParsedResult> {
    let mut consumed = vec![false; lines.len()];
    let mut pending_name: Option<&str> = None;
    let mut results = Vec::new();

    for index in 0..lines.len() {
        let line = lines[index];
        if line.is_empty() || consumed[index] {
            continue;
        }

        let cursor = LineCursor {
            lines,
            index,
            consumed: &consumed,
            pending_name,
        };
        let matched = LineMatcher::CASCADE
            .iter()
            .find_map(|matcher| matcher.apply(&cursor).map(|hit| (*matcher, hit)));

        match matched {
            Some((matcher, hit)) => {
                trace!(matcher = matcher.label(), line = index, "Line matched");
                if matcher == LineMatcher::OrphanValue {
                    pending_name = None;
                }
                for j in hit.consumed {
                    consumed[j] = true;
                }
                results.push(hit.result);
            }
            None if is_pending_name(line) => pending_name = Some(line),
            None => {}
        }
    }

    results
}
