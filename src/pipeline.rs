//! Panel pipeline: filters → aggregator → ranker → shaper, driven by a [`PanelConfig`].
//!
//! Every panel runs independently against the same read-only table; no state is
//! carried between panels or between runs.

use crate::aggregate::{GroupBy, aggregate_with};
use crate::config::{CountrySource, DashboardConfig, PanelConfig};
use crate::error::PipelineResult;
use crate::filter::{filter_countries, filter_whitelist, filter_years};
use crate::models::YearSpec;
use crate::rank::top_k;
use crate::shape::{Shaped, shape_for};
use crate::stats::{LinearTrend, trend_for};
use crate::table::Table;
use crate::whitelist::Whitelist;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Everything a renderer needs for one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelOutput {
    pub name: String,
    /// Years actually shown; `None` when a relative selection met an empty table.
    pub years: Option<YearSpec>,
    /// Countries kept by the ranking step, best first.
    pub ranked: Option<Vec<String>>,
    pub shaped: Shaped,
    pub trend: Option<LinearTrend>,
}

/// Restrict `table` to the countries `source` allows.
pub fn select_countries(table: &Table, whitelist: &Whitelist, source: &CountrySource) -> Table {
    match source {
        CountrySource::All => table.clone(),
        CountrySource::Whitelist => filter_whitelist(table, whitelist),
        CountrySource::Selection { countries } => filter_countries(table, countries),
        CountrySource::SelectionInWhitelist { countries } => {
            filter_whitelist(&filter_countries(table, countries), whitelist)
        }
    }
}

fn years_of(table: &Table, years: Option<YearSpec>) -> Table {
    match years {
        Some(spec) => filter_years(table, spec),
        None => table.filter(|_| false),
    }
}

/// Run one panel end to end.
pub fn run_panel(table: &Table, whitelist: &Whitelist, panel: &PanelConfig) -> PipelineResult<PanelOutput> {
    let base = select_countries(table, whitelist, &panel.countries);
    let years = panel.years.resolve(table);
    let mut shown = years_of(&base, years);

    let ranked = match &panel.rank {
        Some(rank) => {
            let window_years = rank.years.unwrap_or(panel.years).resolve(table);
            let window = years_of(&base, window_years);
            let collapsed = aggregate_with(&window, GroupBy::Country, rank.reduction, &[rank.metric])?;
            let top = top_k(&collapsed, rank.metric, rank.k)?;
            shown = filter_countries(&shown, &top);
            Some(top)
        }
        None => None,
    };

    let relevant = panel.chart.relevant_metrics();
    let aggregated = aggregate_with(&shown, panel.group_by(), panel.reduction, &relevant)?;
    let shaped = shape_for(&aggregated, &panel.chart)?;
    let trend = if panel.chart.wants_trendline() {
        trend_for(&shaped)
    } else {
        None
    };

    if shaped.is_empty() {
        warn!("panel {}: no rows to plot", panel.name);
    } else {
        debug!("panel {}: {} {:?} rows", panel.name, shaped.len(), shaped.kind());
    }

    Ok(PanelOutput {
        name: panel.name.clone(),
        years,
        ranked,
        shaped,
        trend,
    })
}

/// Run every panel, keeping each panel's result separate so one failing panel does
/// not hide the others. `selection`, when given, replaces the configured user selection.
pub fn run_panels(
    table: &Table,
    whitelist: &Whitelist,
    config: &DashboardConfig,
    selection: Option<&[String]>,
) -> Vec<(String, PipelineResult<PanelOutput>)> {
    info!("running {} panels over {} rows", config.panels.len(), table.len());
    config
        .panels
        .iter()
        .map(|p| {
            let result = match selection {
                Some(sel) if p.countries.uses_selection() => run_panel(table, whitelist, &p.with_selection(sel)),
                _ => run_panel(table, whitelist, p),
            };
            (p.name.clone(), result)
        })
        .collect()
}

/// Run every panel; the first failing panel fails the whole dashboard.
pub fn run_dashboard(
    table: &Table,
    whitelist: &Whitelist,
    config: &DashboardConfig,
    selection: Option<&[String]>,
) -> PipelineResult<Vec<PanelOutput>> {
    run_panels(table, whitelist, config, selection)
        .into_iter()
        .map(|(_, result)| result)
        .collect()
}
