use crate::aggregate::{Aggregated, GroupBy};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Column, Metric};
use log::debug;

/// Return the `k` countries with the largest `metric`, highest first.
///
/// The input must be grouped by country alone. Ties keep the input order, so
/// identical input always ranks identically. Countries with a missing value are not
/// ranked. Asking for more countries than are rankable returns all of them;
/// `k == 0` is an error.
pub fn top_k(table: &Aggregated, metric: Metric, k: usize) -> PipelineResult<Vec<String>> {
    if k == 0 {
        return Err(PipelineError::InvalidRank(k));
    }
    table.schema.require(Column::Metric(metric), "rank metric")?;
    table.expect_grouping(GroupBy::Country, "top_k")?;

    let mut ranked: Vec<(&str, f64)> = table
        .rows
        .iter()
        .filter_map(|r| r.value(metric).map(|v| (r.country(), v)))
        .filter(|(_, v)| !v.is_nan())
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);

    debug!("top_k({}, k={}): {} countries", metric, k, ranked.len());
    Ok(ranked.into_iter().map(|(c, _)| c.to_string()).collect())
}
