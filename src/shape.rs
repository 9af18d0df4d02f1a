//! Shaping aggregated rows into the exact layout each chart kind expects.
//!
//! - `map`: one row per country with `iso_code` and a color value
//! - `bar`: one row per country, sorted descending by value (missing last)
//! - `line`: long format, one row per country per year, years increasing per country
//! - `scatter` / `bubble`: one row per country with x/y (+ size, color)
//!
//! Shaping selects, renames and orders. The only transform applied to values is the
//! bubble size clamp, see [`BubbleScale`].

use crate::aggregate::{AggRow, Aggregated, GroupBy};
use crate::error::PipelineResult;
use crate::models::{Column, Metric};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Chart kinds understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Map,
    Bar,
    Line,
    Scatter,
    Bubble,
}

/// Linear bubble sizing with a floor and a ceiling.
///
/// `scaled = raw / unit`, then raised to `floor` or capped at `ceiling`. Values in
/// between pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleScale {
    /// Raw units per display unit (population 500 000 → size 1).
    pub unit: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for BubbleScale {
    fn default() -> Self {
        Self {
            unit: 500_000.0,
            floor: 5.0,
            ceiling: 100.0,
        }
    }
}

impl BubbleScale {
    /// Display size for a raw value. Missing or NaN input gets the floor.
    pub fn clamp(&self, raw: Option<f64>) -> f64 {
        match raw {
            Some(v) if !v.is_nan() => {
                let scaled = v / self.unit;
                if scaled < self.floor {
                    self.floor
                } else if scaled > self.ceiling {
                    self.ceiling
                } else {
                    scaled
                }
            }
            _ => self.floor,
        }
    }
}

/// What a panel plots and with which metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Map {
        color: Metric,
    },
    Bar {
        metric: Metric,
    },
    Line {
        metric: Metric,
    },
    Scatter {
        x: Metric,
        y: Metric,
        #[serde(default)]
        color: Option<Metric>,
        /// Overlay an OLS trend line.
        #[serde(default)]
        trendline: bool,
    },
    Bubble {
        x: Metric,
        y: Metric,
        size: Metric,
        #[serde(default)]
        color: Option<Metric>,
        #[serde(default)]
        scale: BubbleScale,
        #[serde(default)]
        trendline: bool,
    },
}

impl ChartSpec {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartSpec::Map { .. } => ChartKind::Map,
            ChartSpec::Bar { .. } => ChartKind::Bar,
            ChartSpec::Line { .. } => ChartKind::Line,
            ChartSpec::Scatter { .. } => ChartKind::Scatter,
            ChartSpec::Bubble { .. } => ChartKind::Bubble,
        }
    }

    /// Grouping the shaper needs for this chart.
    pub fn grouping(&self) -> GroupBy {
        match self {
            ChartSpec::Line { .. } => GroupBy::CountryYear,
            _ => GroupBy::Country,
        }
    }

    /// Metrics whose joint absence makes a row worthless for this chart.
    pub fn relevant_metrics(&self) -> Vec<Metric> {
        match *self {
            ChartSpec::Map { color } => vec![color],
            ChartSpec::Bar { metric } | ChartSpec::Line { metric } => vec![metric],
            ChartSpec::Scatter { x, y, .. } | ChartSpec::Bubble { x, y, .. } => vec![x, y],
        }
    }

    /// Every metric the shaped output reads.
    pub fn metrics(&self) -> Vec<Metric> {
        match *self {
            ChartSpec::Map { color } => vec![color],
            ChartSpec::Bar { metric } | ChartSpec::Line { metric } => vec![metric],
            ChartSpec::Scatter { x, y, color, .. } => [Some(x), Some(y), color].into_iter().flatten().collect(),
            ChartSpec::Bubble { x, y, size, color, .. } => {
                [Some(x), Some(y), Some(size), color].into_iter().flatten().collect()
            }
        }
    }

    pub fn wants_trendline(&self) -> bool {
        matches!(
            self,
            ChartSpec::Scatter { trendline: true, .. } | ChartSpec::Bubble { trendline: true, .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRow {
    pub iso_code: String,
    pub country: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRow {
    pub country: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRow {
    pub country: String,
    pub year: i32,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterRow {
    pub country: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Clamped display size; only set for bubble charts.
    pub size: Option<f64>,
    pub color: Option<f64>,
}

/// A chart-ready table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum Shaped {
    Map(Vec<MapRow>),
    Bar(Vec<BarRow>),
    Line(Vec<LineRow>),
    Scatter(Vec<ScatterRow>),
    Bubble(Vec<ScatterRow>),
}

impl Shaped {
    pub fn kind(&self) -> ChartKind {
        match self {
            Shaped::Map(_) => ChartKind::Map,
            Shaped::Bar(_) => ChartKind::Bar,
            Shaped::Line(_) => ChartKind::Line,
            Shaped::Scatter(_) => ChartKind::Scatter,
            Shaped::Bubble(_) => ChartKind::Bubble,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Shaped::Map(r) => r.len(),
            Shaped::Bar(r) => r.len(),
            Shaped::Line(r) => r.len(),
            Shaped::Scatter(r) | Shaped::Bubble(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shape `table` for `chart`.
///
/// Fails when the grouping does not match the chart (`line` needs `country,year`,
/// the others `country`) or a metric is absent from the schema.
pub fn shape_for(table: &Aggregated, chart: &ChartSpec) -> PipelineResult<Shaped> {
    table.expect_grouping(chart.grouping(), "shape_for")?;
    for m in chart.metrics() {
        table.schema.require(Column::Metric(m), "chart metric")?;
    }

    let shaped = match *chart {
        ChartSpec::Map { color } => {
            table.schema.require(Column::IsoCode, "map location")?;
            Shaped::Map(
                table
                    .rows
                    .iter()
                    .map(|r| MapRow {
                        iso_code: r.iso_code.clone(),
                        country: r.key.country.clone(),
                        value: r.value(color),
                    })
                    .collect(),
            )
        }
        ChartSpec::Bar { metric } => {
            let mut rows: Vec<BarRow> = table
                .rows
                .iter()
                .map(|r| BarRow {
                    country: r.key.country.clone(),
                    value: r.value(metric),
                })
                .collect();
            let present = |v: Option<f64>| v.filter(|x| !x.is_nan());
            rows.sort_by(|a, b| match (present(a.value), present(b.value)) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
            Shaped::Bar(rows)
        }
        ChartSpec::Line { metric } => Shaped::Line(line_rows(&table.rows, metric)),
        ChartSpec::Scatter { x, y, color, .. } => Shaped::Scatter(
            table
                .rows
                .iter()
                .map(|r| ScatterRow {
                    country: r.key.country.clone(),
                    x: r.value(x),
                    y: r.value(y),
                    size: None,
                    color: color.and_then(|c| r.value(c)),
                })
                .collect(),
        ),
        ChartSpec::Bubble {
            x,
            y,
            size,
            color,
            scale,
            ..
        } => Shaped::Bubble(
            table
                .rows
                .iter()
                .map(|r| ScatterRow {
                    country: r.key.country.clone(),
                    x: r.value(x),
                    y: r.value(y),
                    size: Some(scale.clamp(r.value(size))),
                    color: color.and_then(|c| r.value(c)),
                })
                .collect(),
        ),
    };
    Ok(shaped)
}

/// Long-format series: countries in first-appearance order, years ascending within each.
fn line_rows(rows: &[AggRow], metric: Metric) -> Vec<LineRow> {
    let mut order: AHashMap<&str, usize> = AHashMap::new();
    for r in rows {
        let next = order.len();
        order.entry(r.country()).or_insert(next);
    }
    let mut out: Vec<(usize, LineRow)> = rows
        .iter()
        .filter_map(|r| {
            let year = r.key.year?;
            Some((
                order[r.country()],
                LineRow {
                    country: r.key.country.clone(),
                    year,
                    value: r.value(metric),
                },
            ))
        })
        .collect();
    out.sort_by_key(|(idx, row)| (*idx, row.year));
    out.into_iter().map(|(_, row)| row).collect()
}
