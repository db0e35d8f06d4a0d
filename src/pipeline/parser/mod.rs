//! Report Parser: raw report text to an ordered list of `ParsedResult`.
//!
//! Two strategies, tried in order. The column-header table strategy wins
//! whenever it produces anything; otherwise the line cascade runs. The
//! parser never fails: unreadable lines are skipped and an empty document
//! yields an empty list.

pub mod line;
pub mod patterns;
pub mod table;

pub use line::{LineMatcher, parse_lines};
pub use table::{HeaderPositions, parse_table};

use tracing::debug;

use crate::models::ParsedResult;

/// Which strategy produced a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    ColumnTable,
    LineCascade,
}

impl ParseStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ColumnTable => "column_table",
            Self::LineCascade => "line_cascade",
        }
    }
}

/// Parse with strategy attribution.
pub fn parse_report_with_strategy(text: &str) -> (Vec<ParsedResult>, ParseStrategy) {
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();

    let table = parse_table(&lines);
    if !table.is_empty() {
        debug!(
            strategy = ParseStrategy::ColumnTable.as_str(),
            lines = lines.len(),
            results = table.len(),
            "Report parsed"
        );
        return (table, ParseStrategy::ColumnTable);
    }

    let results = parse_lines(&lines);
    debug!(
        strategy = ParseStrategy::LineCascade.as_str(),
        lines = lines.len(),
        results = results.len(),
        "Report parsed"
    );
    (results, ParseStrategy::LineCascade)
}

/// Parse a report into results in document order.
pub fn parse_report(text: &str) -> Vec<ParsedResult> {
    parse_report_with_strategy(text).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NumericRange, ResultStatus};
    use proptest::prelude::*;

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_report("").is_empty());
        assert!(parse_report("\n\n   \n").is_empty());
    }

    #[test]
    fn column_table_report() {
        let (rows, strategy) =
            parse_report_with_strategy("HAEMOGLOBIN\nResult\n8.5\nUnit\ng/dL\nRange\n12-15");
        assert_eq!(strategy, ParseStrategy::ColumnTable);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, Some(ResultStatus::Low));
        assert_eq!(rows[0].reference_range, Some(NumericRange::new(12.0, 15.0)));
    }

    #[test]
    fn labeled_line_report() {
        let (rows, strategy) = parse_report_with_strategy("Hemoglobin: 8.5 g/dL (Low)");
        assert_eq!(strategy, ParseStrategy::LineCascade);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].test_name, "Hemoglobin");
        assert_eq!(rows[0].value, 8.5);
        assert_eq!(rows[0].unit, "g/dL");
        assert_eq!(rows[0].status, Some(ResultStatus::Low));
    }

    #[test]
    fn crlf_line_endings() {
        let rows = parse_report("Hemoglobin: 8.5 g/dL (Low)\r\nCalcium: 7.2 mg/dL (Low)\r\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].test_name, "Calcium");
    }

    #[test]
    fn single_line_header_falls_through_to_lines() {
        let text = "Test Result Unit Range\nHemoglobin 10.2 g/dL 12-15\nRBC Count 4.5 millions/cmm 3.8-4.8";
        let (rows, strategy) = parse_report_with_strategy(text);
        assert_eq!(strategy, ParseStrategy::LineCascade);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].test_name, "Hemoglobin");
        assert_eq!(rows[1].value, 4.5);
    }

    #[test]
    fn mixed_line_layouts_keep_document_order() {
        let text = "PATIENT REPORT\n\
                    Hemoglobin: 11 g/dL\n\
                    VITAMIN D\n\
                    18\n\
                    ng/mL\n\
                    Serum Calcium 8.1 mg/dL";
        let rows = parse_report(text);
        let names: Vec<&str> = rows.iter().map(|r| r.test_name.as_str()).collect();
        assert_eq!(names, vec!["Hemoglobin", "VITAMIN D", "Serum Calcium"]);
        assert_eq!(rows[1].unit, "ng/mL");
    }

    proptest! {
        #[test]
        fn never_panics_and_values_are_non_negative(text in "\\PC{0,200}") {
            for row in parse_report(&text) {
                prop_assert!(row.value >= 0.0);
                prop_assert!(!row.test_name.is_empty());
            }
        }

        #[test]
        fn never_panics_on_report_like_lines(
            lines in proptest::collection::vec("[A-Za-z :()/%.0-9-]{0,30}", 0..20)
        ) {
            let text = lines.join("\n");
            let _ = parse_report(&text);
        }
    }
}
