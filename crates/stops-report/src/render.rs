//! Plain-text rendering of report documents.

use crate::document::{IndexSummary, RollupReport, ScanSummary};
use stops_common::{Category, RollupMetric};

const RULE_WIDTH: usize = 80;
const SECTION_WIDTH: usize = 40;

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Format a count rounded to a whole number with thousands separators.
pub fn format_count(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a percentage with one decimal place.
pub fn format_pct(value: f64) -> String {
    format!("{value:.1}%")
}

// ---------------------------------------------------------------------------
// Rollup report
// ---------------------------------------------------------------------------

/// Render the rollup as a three-section text report.
pub fn render_rollup(report: &RollupReport) -> String {
    let mut lines = Vec::new();
    let rule = "=".repeat(RULE_WIDTH);
    let section_rule = "-".repeat(SECTION_WIDTH);

    lines.push(rule.clone());
    lines.push(format!("{} TRAFFIC STOP DATA", report.year));
    lines.push(rule);
    lines.push(String::new());

    lines.push("1. TOTAL STOPS".to_string());
    lines.push(section_rule.clone());
    lines.push(format!("Total stops: {}", format_count(report.total_stops)));
    lines.push(format!("Agencies reporting: {}", report.agency_count));
    lines.push(String::new());
    lines.push("By race:".to_string());
    for category in Category::breakdowns() {
        let count = report.sum(RollupMetric::AllStops, category);
        let share = report
            .race_rates
            .get(&category)
            .map(|r| r.stop_share)
            .unwrap_or(0.0);
        lines.push(format!(
            "  {:20}: {:>10} ({:>6})",
            category.as_str(),
            format_count(count),
            format_pct(share),
        ));
    }
    lines.push(String::new());

    lines.push("2. SEARCHES AND CONTRABAND".to_string());
    lines.push(section_rule.clone());
    let searches = report.sum(RollupMetric::Searches, Category::Total);
    let contraband = report.sum(RollupMetric::Contraband, Category::Total);
    lines.push(format!("Total searches: {}", format_count(searches)));
    lines.push(format!("Search rate: {}", format_pct(report.summary.search_rate)));
    lines.push(format!("Contraband found: {}", format_count(contraband)));
    lines.push(format!("Hit rate: {}", format_pct(report.summary.hit_rate)));
    lines.push(String::new());
    lines.push("By race:".to_string());
    for category in Category::breakdowns() {
        let rates = report.race_rates.get(&category).copied().unwrap_or_default();
        lines.push(format!(
            "  {:20}: {:>8} searches ({:>5}), {:>8} contraband ({:>5})",
            category.as_str(),
            format_count(report.sum(RollupMetric::Searches, category)),
            format_pct(rates.search_rate),
            format_count(report.sum(RollupMetric::Contraband, category)),
            format_pct(rates.hit_rate),
        ));
    }
    lines.push(String::new());

    lines.push("3. OUTCOMES".to_string());
    lines.push(section_rule);
    let outcomes = [
        ("Citations", RollupMetric::Citations, report.summary.citation_rate),
        ("Arrests", RollupMetric::Arrests, report.summary.arrest_rate),
        ("Warnings", RollupMetric::Warnings, report.summary.warning_rate),
    ];
    for (label, metric, rate) in outcomes {
        lines.push(format!(
            "{}: {} ({})",
            label,
            format_count(report.sum(metric, Category::Total)),
            format_pct(rate),
        ));
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Index and scan summaries
// ---------------------------------------------------------------------------

/// Render a compact index summary.
pub fn render_index_summary(summary: &IndexSummary) -> String {
    let mut lines = Vec::new();
    lines.push(format!("  {} agencies", summary.agency_count));
    match (summary.first_year, summary.last_year) {
        (Some(first), Some(last)) => {
            lines.push(format!("  {} years: {}-{}", summary.year_count, first, last))
        }
        _ => lines.push(format!("  {} years", summary.year_count)),
    }
    lines.push(format!("  {} metric keys", summary.rows_by_key.len()));
    for (key, count) in &summary.rows_by_key {
        lines.push(format!("    - {key}: {count} rows"));
    }
    lines.join("\n")
}

/// One-line description of a source scan.
pub fn render_scan_summary(scan: &ScanSummary) -> String {
    let mut line = format!(
        "Scanned {} files: {} loaded",
        scan.files_found, scan.files_loaded
    );
    if scan.files_skipped > 0 {
        line.push_str(&format!(", {} skipped", scan.files_skipped));
    }
    line
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CategoryRates, RateSummary};
    use std::collections::BTreeMap;

    fn sample_report() -> RollupReport {
        let mut by_race = BTreeMap::new();
        by_race.insert(
            RollupMetric::AllStops,
            [(Category::Total, 1_234_567.0), (Category::White, 1_000_000.0)]
                .into_iter()
                .collect(),
        );
        by_race.insert(
            RollupMetric::Searches,
            [(Category::Total, 50_000.0), (Category::White, 40_000.0)]
                .into_iter()
                .collect(),
        );
        by_race.insert(
            RollupMetric::Citations,
            [(Category::Total, 600_000.0)].into_iter().collect(),
        );
        let mut race_rates = BTreeMap::new();
        race_rates.insert(
            Category::White,
            CategoryRates {
                search_rate: 4.0,
                hit_rate: 30.25,
                stop_share: 81.0,
            },
        );
        RollupReport {
            year: 2024,
            total_stops: 1_234_567.0,
            agency_count: 512,
            by_race,
            summary: RateSummary {
                search_rate: 4.05,
                hit_rate: 31.0,
                citation_rate: 48.6,
                arrest_rate: 0.0,
                warning_rate: 0.0,
            },
            race_rates,
        }
    }

    #[test]
    fn test_format_count_separators() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1000.0), "1,000");
        assert_eq!(format_count(1_234_567.4), "1,234,567");
        assert_eq!(format_count(-12_345.0), "-12,345");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(25.0), "25.0%");
        assert_eq!(format_pct(4.04), "4.0%");
    }

    #[test]
    fn test_rollup_sections() {
        let output = render_rollup(&sample_report());
        assert!(output.contains("2024 TRAFFIC STOP DATA"));
        assert!(output.contains("1. TOTAL STOPS"));
        assert!(output.contains("Total stops: 1,234,567"));
        assert!(output.contains("Agencies reporting: 512"));
        assert!(output.contains("2. SEARCHES AND CONTRABAND"));
        assert!(output.contains("Hit rate: 31.0%"));
        assert!(output.contains("3. OUTCOMES"));
        assert!(output.contains("Citations: 600,000 (48.6%)"));
    }

    #[test]
    fn test_rollup_lists_every_breakdown() {
        let output = render_rollup(&sample_report());
        for category in Category::breakdowns() {
            assert!(output.contains(category.as_str()), "missing {category}");
        }
        assert!(output.contains("81.0%"));
    }

    #[test]
    fn test_unreported_metrics_render_as_zero() {
        let output = render_rollup(&sample_report());
        assert!(output.contains("Arrests: 0 (0.0%)"));
        assert!(output.contains("Contraband found: 0"));
    }

    #[test]
    fn test_index_summary() {
        let mut rows_by_key = BTreeMap::new();
        rows_by_key.insert("totals--all-stops".to_string(), 12);
        let summary = IndexSummary {
            agency_count: 3,
            year_count: 4,
            first_year: Some(2020),
            last_year: Some(2023),
            rows_by_key,
        };
        let output = render_index_summary(&summary);
        assert!(output.contains("3 agencies"));
        assert!(output.contains("4 years: 2020-2023"));
        assert!(output.contains("- totals--all-stops: 12 rows"));
    }

    #[test]
    fn test_index_summary_without_years() {
        let summary = IndexSummary {
            agency_count: 0,
            year_count: 0,
            first_year: None,
            last_year: None,
            rows_by_key: BTreeMap::new(),
        };
        let output = render_index_summary(&summary);
        assert!(output.contains("0 years"));
        assert!(!output.contains('-'));
    }

    #[test]
    fn test_scan_summary_mentions_skips_only_when_present() {
        let clean = ScanSummary {
            files_found: 3,
            files_loaded: 3,
            files_skipped: 0,
        };
        assert_eq!(render_scan_summary(&clean), "Scanned 3 files: 3 loaded");
        let dirty = ScanSummary {
            files_skipped: 1,
            files_loaded: 2,
            ..clean
        };
        assert!(render_scan_summary(&dirty).ends_with("1 skipped"));
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(sample_report()).unwrap();
        assert_eq!(json["year"], 2024);
        assert_eq!(json["agency_count"], 512);
        assert_eq!(json["by_race"]["all_stops"]["White"], 1_000_000.0);
        assert_eq!(json["summary"]["hit_rate"], 31.0);
        assert_eq!(json["race_rates"]["White"]["stop_share"], 81.0);
    }
}
