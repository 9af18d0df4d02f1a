use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to select years when filtering a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearSpec {
    /// Single year like 2020
    Year(i32),
    /// Inclusive range like 2000..=2020
    Range { start: i32, end: i32 },
}

impl YearSpec {
    /// True if `year` falls inside this selection.
    pub fn contains(&self, year: i32) -> bool {
        match *self {
            YearSpec::Year(y) => year == y,
            YearSpec::Range { start, end } => start <= year && year <= end,
        }
    }
}

impl fmt::Display for YearSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            YearSpec::Year(y) => write!(f, "{}", y),
            YearSpec::Range { start, end } => write!(f, "{}:{}", start, end),
        }
    }
}

/// Numeric columns carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Co2PerCapita,
    CumulativeLucCo2,
    Gdp,
    Population,
    PrimaryEnergyConsumption,
    Co2,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Co2PerCapita,
        Metric::CumulativeLucCo2,
        Metric::Gdp,
        Metric::Population,
        Metric::PrimaryEnergyConsumption,
        Metric::Co2,
    ];

    /// Column name as it appears in the source CSV header.
    pub fn column_name(&self) -> &'static str {
        match self {
            Metric::Co2PerCapita => "co2_per_capita",
            Metric::CumulativeLucCo2 => "cumulative_luc_co2",
            Metric::Gdp => "gdp",
            Metric::Population => "population",
            Metric::PrimaryEnergyConsumption => "primary_energy_consumption",
            Metric::Co2 => "co2",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Metric {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.column_name() == s.trim())
            .ok_or_else(|| PipelineError::UnknownColumn {
                column: s.to_string(),
                context: "metric",
            })
    }
}

/// A column of the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Country,
    IsoCode,
    Year,
    Metric(Metric),
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Country => "country",
            Column::IsoCode => "iso_code",
            Column::Year => "year",
            Column::Metric(m) => m.column_name(),
        }
    }

    /// Resolve a header name to a known column. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Column> {
        match name {
            "country" => Some(Column::Country),
            "iso_code" => Some(Column::IsoCode),
            "year" => Some(Column::Year),
            other => Metric::ALL
                .into_iter()
                .find(|m| m.column_name() == other)
                .map(Column::Metric),
        }
    }
}

/// The optional metric values of one observation (or one aggregated group).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub co2_per_capita: Option<f64>,
    pub cumulative_luc_co2: Option<f64>,
    pub gdp: Option<f64>,
    pub population: Option<f64>,
    pub primary_energy_consumption: Option<f64>,
    pub co2: Option<f64>,
}

impl Metrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Co2PerCapita => self.co2_per_capita,
            Metric::CumulativeLucCo2 => self.cumulative_luc_co2,
            Metric::Gdp => self.gdp,
            Metric::Population => self.population,
            Metric::PrimaryEnergyConsumption => self.primary_energy_consumption,
            Metric::Co2 => self.co2,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::Co2PerCapita => &mut self.co2_per_capita,
            Metric::CumulativeLucCo2 => &mut self.cumulative_luc_co2,
            Metric::Gdp => &mut self.gdp,
            Metric::Population => &mut self.population,
            Metric::PrimaryEnergyConsumption => &mut self.primary_energy_consumption,
            Metric::Co2 => &mut self.co2,
        };
        *slot = value;
    }

    /// Builder-style setter, handy for fixtures.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }
}

/// Tidy structure used by this crate (one row = one country in one year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub country: String,
    /// ISO 3166-1 alpha-3; empty for aggregate regions such as "World".
    pub iso_code: String,
    pub year: i32,
    pub metrics: Metrics,
}

impl Record {
    pub fn new(country: impl Into<String>, iso_code: impl Into<String>, year: i32) -> Self {
        Self {
            country: country.into(),
            iso_code: iso_code.into(),
            year,
            metrics: Metrics::default(),
        }
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.metrics.set(metric, Some(value));
        self
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(metric)
    }
}

/// Grouping key used by the aggregator. `year` is `None` when grouping by country alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub country: String,
    pub year: Option<i32>,
}
