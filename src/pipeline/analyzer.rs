//! Value Analyzer: classify one result against the reference table and
//! attach the matching remedy entry.

use tracing::{debug, trace};

use crate::config::AnalyzerConfig;
use crate::knowledge::{ReferenceRangeTable, RemedyEntry, RemedyKnowledgeBase};
use crate::models::{Direction, Finding, Gender, NumericRange, Severity};

/// Read-only view over the knowledge tables plus severity thresholds.
#[derive(Debug, Clone, Copy)]
pub struct ValueAnalyzer<'k> {
    ranges: &'k ReferenceRangeTable,
    remedies: &'k RemedyKnowledgeBase,
    config: AnalyzerConfig,
}

impl Default for ValueAnalyzer<'static> {
    fn default() -> Self {
        Self::new(
            ReferenceRangeTable::shared(),
            RemedyKnowledgeBase::shared(),
            AnalyzerConfig::default(),
        )
    }
}

impl<'k> ValueAnalyzer<'k> {
    pub fn new(
        ranges: &'k ReferenceRangeTable,
        remedies: &'k RemedyKnowledgeBase,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            ranges,
            remedies,
            config,
        }
    }

    /// Classify a value. `None` when the test is unrecognized or in range.
    /// A blank `unit` takes the reference table's unit.
    pub fn analyze(
        &self,
        test_name: &str,
        value: f64,
        unit: &str,
        gender: Option<Gender>,
    ) -> Option<Finding> {
        let Some(reference) = self.ranges.lookup(test_name) else {
            trace!(test = test_name, "No reference range");
            return None;
        };
        let range = reference.range_for(gender);
        let direction = range.classify(value).direction()?;

        let unit = if unit.trim().is_empty() {
            reference.unit.as_str()
        } else {
            unit
        };
        Some(self.build_finding(test_name, value, unit, range, &reference.unit, direction))
    }

    /// Finding for a result whose range and direction are already known,
    /// as read off a report table. The unit falls back to the reference
    /// table's unit when blank.
    pub fn finding_from_range(
        &self,
        test_name: &str,
        value: f64,
        unit: &str,
        range: NumericRange,
        direction: Direction,
    ) -> Finding {
        let fallback_unit = self
            .ranges
            .lookup(test_name)
            .map(|r| r.unit.as_str())
            .unwrap_or_default();
        let unit = if unit.trim().is_empty() {
            fallback_unit
        } else {
            unit
        };
        self.build_finding(test_name, value, unit, range, unit, direction)
    }

    /// `range_unit` is the unit the range is expressed in, which for
    /// reference-table ranges may differ from the report's unit.
    fn build_finding(
        &self,
        test_name: &str,
        value: f64,
        unit: &str,
        range: NumericRange,
        range_unit: &str,
        direction: Direction,
    ) -> Finding {
        let severity = self.severity(&range, value, direction);
        let remedy_info = self.remedy_for(test_name, direction);
        debug!(
            test = test_name,
            status = direction.as_str(),
            severity = severity.as_str(),
            has_remedy = remedy_info.is_some(),
            "Abnormal result"
        );
        Finding {
            test_name: test_name.to_string(),
            value,
            unit: unit.trim().to_string(),
            normal_range: format!("{} {}", range.display(), range_unit.trim())
                .trim_end()
                .to_string(),
            status: direction,
            severity,
            remedy_info,
        }
    }

    /// Severity tier from the relative deviation past the crossed boundary.
    pub fn severity(&self, range: &NumericRange, value: f64, direction: Direction) -> Severity {
        let deviation = range.relative_deviation(value, direction);
        let thresholds = &self.config.severity;
        if deviation > thresholds.critical {
            Severity::Critical
        } else if deviation > thresholds.moderate {
            Severity::Moderate
        } else {
            Severity::Mild
        }
    }

    /// Remedy entry for a test name and direction, if the knowledge base has one.
    pub fn remedy_for(&self, test_name: &str, direction: Direction) -> Option<RemedyEntry> {
        self.remedies.find(test_name, direction).cloned()
    }
}
