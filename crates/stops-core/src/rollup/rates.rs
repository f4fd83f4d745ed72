//! Derived rates over accumulated sums.

use super::accumulator::Accumulator;
use std::collections::BTreeMap;
use stops_common::{Category, RollupMetric};
use stops_report::{CategoryRates, RateSummary, RollupReport};

/// `numerator / denominator * 100`, or `0` when the denominator is not
/// positive.
pub fn rate(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

/// Overall rates.
pub fn compute_summary(acc: &Accumulator) -> RateSummary {
    let total = |metric| acc.sum(metric, Category::Total);
    let stops = total(RollupMetric::AllStops);
    let searches = total(RollupMetric::Searches);

    RateSummary {
        search_rate: rate(searches, stops),
        hit_rate: rate(total(RollupMetric::Contraband), searches),
        citation_rate: rate(total(RollupMetric::Citations), stops),
        arrest_rate: rate(total(RollupMetric::Arrests), stops),
        warning_rate: rate(total(RollupMetric::Warnings), stops),
    }
}

/// Rates for one category.
pub fn compute_category_rates(acc: &Accumulator, category: Category) -> CategoryRates {
    let stops = acc.sum(RollupMetric::AllStops, category);
    let searches = acc.sum(RollupMetric::Searches, category);
    CategoryRates {
        search_rate: rate(searches, stops),
        hit_rate: rate(acc.sum(RollupMetric::Contraband, category), searches),
        stop_share: rate(stops, acc.sum(RollupMetric::AllStops, Category::Total)),
    }
}

/// Assemble the rollup document from finished sums.
pub fn build_report(acc: &Accumulator) -> RollupReport {
    let by_race = RollupMetric::ALL
        .into_iter()
        .map(|metric| (metric, acc.sums(metric).to_map()))
        .collect();
    let race_rates: BTreeMap<_, _> = Category::breakdowns()
        .map(|category| (category, compute_category_rates(acc, category)))
        .collect();

    RollupReport {
        year: acc.year(),
        total_stops: acc.sum(RollupMetric::AllStops, Category::Total),
        agency_count: acc.entity_count(),
        by_race,
        summary: compute_summary(acc),
        race_rates,
    }
}
