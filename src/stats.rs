use crate::error::PipelineResult;
use crate::models::{Column, Metric};
use crate::shape::Shaped;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics of one metric for one country.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub country: String,
    pub metric: Metric,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Compute per-country statistics for `metric`, sorted by country name.
pub fn grouped_summary(table: &Table, metric: Metric) -> PipelineResult<Vec<Summary>> {
    table.schema().require(Column::Metric(metric), "summary metric")?;

    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    let mut missing: BTreeMap<&str, usize> = BTreeMap::new();
    for r in table {
        let key = r.country.as_str();
        match r.value(metric) {
            Some(v) if !v.is_nan() => groups.entry(key).or_default().push(v),
            _ => {
                groups.entry(key).or_default();
                *missing.entry(key).or_default() += 1
            }
        }
    }

    let mut out = Vec::new();
    for (country, mut vals) in groups {
        vals.sort_by(|a, b| a.total_cmp(b));
        let count = vals.len();
        let min = vals.first().cloned();
        let max = vals.last().cloned();
        let mean = if count > 0 {
            Some(vals.iter().copied().sum::<f64>() / count as f64)
        } else {
            None
        };
        let median = if count == 0 {
            None
        } else if count % 2 == 1 {
            Some(vals[count / 2])
        } else {
            Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
        };
        let miss = missing.get(country).cloned().unwrap_or(0);
        out.push(Summary {
            country: country.to_string(),
            metric,
            count,
            missing: miss,
            min,
            max,
            mean,
            median,
        });
    }
    Ok(out)
}

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination; 1.0 when all y are equal and on the line.
    pub r_squared: f64,
    pub n: usize,
}

impl LinearTrend {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a trend line through finite `(x, y)` pairs.
///
/// Returns `None` with fewer than two points or when all x are equal.
pub fn linear_fit<I>(points: I) -> Option<LinearTrend>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let pts: Vec<(f64, f64)> = points
        .into_iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    let n = pts.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / nf;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pts {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy == 0.0 { 1.0 } else { (sxy * sxy) / (sxx * syy) };
    Some(LinearTrend {
        slope,
        intercept,
        r_squared,
        n,
    })
}

/// Trend over the x/y rows of a scatter or bubble output; `None` for other shapes.
pub fn trend_for(shaped: &Shaped) -> Option<LinearTrend> {
    match shaped {
        Shaped::Scatter(rows) | Shaped::Bubble(rows) => {
            linear_fit(rows.iter().filter_map(|r| Some((r.x?, r.y?))))
        }
        _ => None,
    }
}
