//! Benchmark Planner
//!
//! Selects registered benchmarks by regex on their id.
//!
//! Ordering: benchmarks are sorted alphabetically by id for deterministic listing.

use paceline_core::BenchmarkDef;
use regex::Regex;

/// Registered benchmarks whose id matches `filter`, sorted by id.
pub fn select<'a>(
    benchmarks: impl IntoIterator<Item = &'a BenchmarkDef>,
    filter: Option<&Regex>,
) -> Vec<&'a BenchmarkDef> {
    let mut selected: Vec<_> = benchmarks
        .into_iter()
        .filter(|def| filter.is_none_or(|re| re.is_match(def.id)))
        .collect();
    selected.sort_by_key(|def| def.id);
    selected
}
