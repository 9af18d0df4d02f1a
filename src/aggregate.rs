//! Collapse rows into one summary row per group.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{Column, GroupKey, Metric, Metrics};
use crate::table::{Schema, Table};
use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which columns form the group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// One row per country; the year range collapses into one value.
    Country,
    /// One row per (country, year); collapses duplicate observations.
    CountryYear,
}

impl GroupBy {
    pub fn columns(&self) -> &'static [Column] {
        match self {
            GroupBy::Country => &[Column::Country],
            GroupBy::CountryYear => &[Column::Country, Column::Year],
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            GroupBy::Country => "country",
            GroupBy::CountryYear => "country,year",
        }
    }

    fn key(&self, country: &str, year: i32) -> GroupKey {
        GroupKey {
            country: country.to_string(),
            year: match self {
                GroupBy::Country => None,
                GroupBy::CountryYear => Some(year),
            },
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse a comma-separated list of key columns, e.g. `"country"` or `"country,year"`.
impl FromStr for GroupBy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cols: Vec<&str> = s
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        match cols.as_slice() {
            ["country"] => Ok(GroupBy::Country),
            ["country", "year"] | ["year", "country"] => Ok(GroupBy::CountryYear),
            _ => Err(PipelineError::InvalidGroupKey(s.to_string())),
        }
    }
}

/// How the non-missing values of a group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    #[default]
    Mean,
    Sum,
}

/// One aggregated row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggRow {
    pub key: GroupKey,
    /// First non-empty ISO code seen for the group.
    pub iso_code: String,
    /// Number of source rows folded into this one.
    pub rows: usize,
    pub metrics: Metrics,
}

impl AggRow {
    pub fn country(&self) -> &str {
        &self.key.country
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(metric)
    }
}

/// Output of the aggregator: rows in first-appearance order of their group.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    pub group_by: GroupBy,
    pub schema: Schema,
    pub rows: Vec<AggRow>,
}

impl Aggregated {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Fail unless this output was grouped by `expected`.
    pub(crate) fn expect_grouping(&self, expected: GroupBy, stage: &'static str) -> PipelineResult<()> {
        if self.group_by == expected {
            Ok(())
        } else {
            Err(PipelineError::WrongGrouping {
                stage,
                expected: expected.label(),
                actual: self.group_by.label(),
            })
        }
    }
}

/// Mean-aggregate `table` by `group_by`; see [`aggregate_with`].
pub fn aggregate(table: &Table, group_by: GroupBy, relevant: &[Metric]) -> PipelineResult<Aggregated> {
    aggregate_with(table, group_by, Reduction::Mean, relevant)
}

/// Group rows and fold each metric over the group's non-missing values.
///
/// A metric with no values in a group stays missing. After grouping, rows missing
/// every metric in `relevant` are dropped; an empty `relevant` drops nothing.
pub fn aggregate_with(
    table: &Table,
    group_by: GroupBy,
    reduction: Reduction,
    relevant: &[Metric],
) -> PipelineResult<Aggregated> {
    let schema = table.schema();
    for col in group_by.columns() {
        schema.require(*col, "group key")?;
    }
    for m in relevant {
        schema.require(Column::Metric(*m), "aggregation metric")?;
    }

    struct Acc {
        key: GroupKey,
        iso_code: String,
        rows: usize,
        sums: [f64; Metric::ALL.len()],
        counts: [usize; Metric::ALL.len()],
    }

    let mut index: AHashMap<GroupKey, usize> = AHashMap::new();
    let mut groups: Vec<Acc> = Vec::new();
    for r in table {
        let key = group_by.key(&r.country, r.year);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Acc {
                key,
                iso_code: String::new(),
                rows: 0,
                sums: [0.0; Metric::ALL.len()],
                counts: [0; Metric::ALL.len()],
            });
            groups.len() - 1
        });
        let acc = &mut groups[slot];
        acc.rows += 1;
        if acc.iso_code.is_empty() && !r.iso_code.is_empty() {
            acc.iso_code = r.iso_code.clone();
        }
        for (i, m) in Metric::ALL.into_iter().enumerate() {
            if let Some(v) = r.value(m)
                && !v.is_nan()
            {
                acc.sums[i] += v;
                acc.counts[i] += 1;
            }
        }
    }

    let before = groups.len();
    let rows: Vec<AggRow> = groups
        .into_iter()
        .map(|acc| {
            let mut metrics = Metrics::default();
            for (i, m) in Metric::ALL.into_iter().enumerate() {
                let value = match (acc.counts[i], reduction) {
                    (0, _) => None,
                    (_, Reduction::Sum) => Some(acc.sums[i]),
                    (n, Reduction::Mean) => Some(acc.sums[i] / n as f64),
                };
                metrics.set(m, value);
            }
            AggRow {
                key: acc.key,
                iso_code: acc.iso_code,
                rows: acc.rows,
                metrics,
            }
        })
        .filter(|row| relevant.is_empty() || relevant.iter().any(|m| row.value(*m).is_some()))
        .collect();

    debug!(
        "aggregate(by {}, {:?}): {} rows -> {} groups, {} kept",
        group_by,
        reduction,
        table.len(),
        before,
        rows.len()
    );

    Ok(Aggregated {
        group_by,
        schema: schema.clone(),
        rows,
    })
}
