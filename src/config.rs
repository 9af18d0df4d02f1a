//! Dashboard configuration: one explicit record per chart panel.
//!
//! Loaded from JSON; [`DashboardConfig::default`] reproduces the classic CO₂ dashboard
//! (map, selection bar chart, top-emitter lines, GDP scatter, bubble view).

use crate::aggregate::{GroupBy, Reduction};
use crate::models::{Metric, YearSpec};
use crate::shape::{BubbleScale, ChartSpec};
use crate::table::Table;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// First year offered by the dashboard's range panels.
pub const DEFAULT_MIN_YEAR: i32 = 2008;
/// Year shown by the single-year panels until the user moves the slider.
pub const DEFAULT_SELECTED_YEAR: i32 = 2011;
/// Countries kept by the ranking panels.
pub const DEFAULT_TOP_K: usize = 25;

/// Year selection as configured, possibly relative to the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum YearSelection {
    Year { year: i32 },
    Range { start: i32, end: i32 },
    /// The most recent year in the table.
    Latest,
    /// From `start` through the most recent year in the table.
    Since { start: i32 },
}

impl YearSelection {
    /// Turn into a concrete selection. Relative modes need a non-empty table.
    pub fn resolve(&self, table: &Table) -> Option<YearSpec> {
        match *self {
            YearSelection::Year { year } => Some(YearSpec::Year(year)),
            YearSelection::Range { start, end } => Some(YearSpec::Range { start, end }),
            YearSelection::Latest => table.year_bounds().map(|(_, max)| YearSpec::Year(max)),
            YearSelection::Since { start } => table
                .year_bounds()
                .map(|(_, max)| YearSpec::Range { start, end: max }),
        }
    }
}

impl From<YearSpec> for YearSelection {
    fn from(spec: YearSpec) -> Self {
        match spec {
            YearSpec::Year(year) => YearSelection::Year { year },
            YearSpec::Range { start, end } => YearSelection::Range { start, end },
        }
    }
}

/// Where a panel's country set comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CountrySource {
    /// Every row, aggregates included.
    All,
    /// Whitelisted countries only.
    Whitelist,
    /// The user's multiselect. Empty means nothing selected.
    Selection {
        #[serde(default)]
        countries: Vec<String>,
    },
    /// The user's multiselect, further restricted to the whitelist.
    SelectionInWhitelist {
        #[serde(default)]
        countries: Vec<String>,
    },
}

impl CountrySource {
    pub fn uses_selection(&self) -> bool {
        matches!(
            self,
            CountrySource::Selection { .. } | CountrySource::SelectionInWhitelist { .. }
        )
    }
}

/// Top-K restriction applied before shaping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSpec {
    pub metric: Metric,
    pub k: usize,
    /// How the ranking window collapses per country.
    #[serde(default)]
    pub reduction: Reduction,
    /// Ranking window; defaults to the panel's own years.
    #[serde(default)]
    pub years: Option<YearSelection>,
}

/// One chart panel's pipeline parameters. The grouping is fixed by the chart kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelConfig {
    pub name: String,
    pub years: YearSelection,
    pub countries: CountrySource,
    #[serde(default)]
    pub reduction: Reduction,
    #[serde(default)]
    pub rank: Option<RankSpec>,
    pub chart: ChartSpec,
}

impl PanelConfig {
    /// `country,year` for lines, `country` for every other chart.
    pub fn group_by(&self) -> GroupBy {
        self.chart.grouping()
    }

    /// Copy of this panel with the user's selection swapped in.
    /// Panels that do not read a selection are returned unchanged.
    pub fn with_selection(&self, selection: &[String]) -> PanelConfig {
        let mut out = self.clone();
        match &mut out.countries {
            CountrySource::Selection { countries } | CountrySource::SelectionInWhitelist { countries } => {
                *countries = selection.to_vec();
            }
            _ => {}
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub panels: Vec<PanelConfig>,
}

impl DashboardConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: DashboardConfig = serde_json::from_str(s).context("parse dashboard config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("load config {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configs that would fail on every run.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for p in &self.panels {
            if p.name.trim().is_empty() {
                bail!("panel name must not be empty");
            }
            if !seen.insert(p.name.as_str()) {
                bail!("duplicate panel name: {}", p.name);
            }
            if let Some(rank) = &p.rank
                && rank.k == 0
            {
                bail!("panel {}: rank.k must be at least 1", p.name);
            }
        }
        Ok(())
    }

    /// Look a panel up by name.
    pub fn panel(&self, name: &str) -> Option<&PanelConfig> {
        self.panels.iter().find(|p| p.name == name)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let selected = YearSelection::Year {
            year: DEFAULT_SELECTED_YEAR,
        };
        let since = YearSelection::Since {
            start: DEFAULT_MIN_YEAR,
        };
        Self {
            panels: vec![
                PanelConfig {
                    name: "co2_per_capita_map".into(),
                    years: selected,
                    countries: CountrySource::All,
                    reduction: Reduction::Mean,
                    rank: None,
                    chart: ChartSpec::Map {
                        color: Metric::Co2PerCapita,
                    },
                },
                PanelConfig {
                    name: "co2_per_capita_bar".into(),
                    years: selected,
                    countries: CountrySource::Selection { countries: vec![] },
                    reduction: Reduction::Mean,
                    rank: None,
                    chart: ChartSpec::Bar {
                        metric: Metric::Co2PerCapita,
                    },
                },
                PanelConfig {
                    name: "top_co2_per_capita_lines".into(),
                    years: since,
                    countries: CountrySource::Whitelist,
                    reduction: Reduction::Mean,
                    rank: Some(RankSpec {
                        metric: Metric::Co2PerCapita,
                        k: DEFAULT_TOP_K,
                        reduction: Reduction::Mean,
                        years: None,
                    }),
                    chart: ChartSpec::Line {
                        metric: Metric::Co2PerCapita,
                    },
                },
                PanelConfig {
                    name: "gdp_vs_luc_co2_scatter".into(),
                    years: since,
                    countries: CountrySource::Whitelist,
                    reduction: Reduction::Mean,
                    rank: Some(RankSpec {
                        metric: Metric::Gdp,
                        k: DEFAULT_TOP_K,
                        reduction: Reduction::Mean,
                        years: Some(YearSelection::Latest),
                    }),
                    chart: ChartSpec::Scatter {
                        x: Metric::CumulativeLucCo2,
                        y: Metric::Gdp,
                        color: None,
                        trendline: true,
                    },
                },
                PanelConfig {
                    name: "gdp_vs_co2_bubble".into(),
                    years: selected,
                    countries: CountrySource::Whitelist,
                    reduction: Reduction::Mean,
                    rank: Some(RankSpec {
                        metric: Metric::Co2,
                        k: DEFAULT_TOP_K,
                        reduction: Reduction::Mean,
                        years: None,
                    }),
                    chart: ChartSpec::Bubble {
                        x: Metric::Gdp,
                        y: Metric::Co2,
                        size: Metric::Population,
                        color: Some(Metric::PrimaryEnergyConsumption),
                        scale: BubbleScale::default(),
                        trendline: false,
                    },
                },
            ],
        }
    }
}
