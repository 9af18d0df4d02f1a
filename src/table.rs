//! The in-memory observation table and its column schema.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{Column, Metric, Record};
use ahash::AHashSet;
use std::collections::BTreeSet;

/// Columns available in a table. Fixed at load time and inherited by every derived table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: BTreeSet<Column>,
}

impl Schema {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut columns: BTreeSet<Column> = columns.into_iter().collect();
        columns.insert(Column::Country);
        columns.insert(Column::Year);
        Self { columns }
    }

    /// Schema with every known column.
    pub fn full() -> Self {
        Self::new(
            [Column::Country, Column::IsoCode, Column::Year]
                .into_iter()
                .chain(Metric::ALL.into_iter().map(Column::Metric)),
        )
    }

    pub fn contains(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn has_metric(&self, metric: Metric) -> bool {
        self.contains(Column::Metric(metric))
    }

    /// Fail with `MissingColumn` unless `column` is present.
    pub fn require(&self, column: Column, context: &'static str) -> PipelineResult<()> {
        if self.contains(column) {
            Ok(())
        } else {
            Err(PipelineError::MissingColumn {
                column: column.name(),
                context,
            })
        }
    }

    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.columns.iter().filter_map(|c| match c {
            Column::Metric(m) => Some(*m),
            _ => None,
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.iter().copied()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::full()
    }
}

/// Ordered, read-only collection of records.
///
/// Filtering never mutates a table; it returns a new one with the same schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    schema: Schema,
    records: Vec<Record>,
}

impl Table {
    /// Table with the full schema.
    pub fn new(records: Vec<Record>) -> Self {
        Self::with_schema(Schema::full(), records)
    }

    pub fn with_schema(schema: Schema, records: Vec<Record>) -> Self {
        Self { schema, records }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// New table holding the rows matching `keep`, in their original order.
    pub fn filter<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&Record) -> bool,
    {
        Table {
            schema: self.schema.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Smallest and largest year present, or `None` for an empty table.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    /// Distinct country names in order of first appearance.
    pub fn country_options(&self) -> Vec<String> {
        let mut seen: AHashSet<&str> = AHashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.country.as_str()))
            .map(|r| r.country.clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_always_has_key_columns() {
        let s = Schema::new([Column::Metric(Metric::Gdp)]);
        assert!(s.contains(Column::Country));
        assert!(s.contains(Column::Year));
        assert!(!s.contains(Column::IsoCode));
        assert_eq!(s.metrics().collect::<Vec<_>>(), vec![Metric::Gdp]);
    }

    #[test]
    fn country_options_keep_first_appearance_order() {
        let t = Table::new(vec![
            Record::new("Chad", "TCD", 2000),
            Record::new("Angola", "AGO", 2000),
            Record::new("Chad", "TCD", 2001),
        ]);
        assert_eq!(t.country_options(), vec!["Chad", "Angola"]);
        assert_eq!(t.year_bounds(), Some((2000, 2001)));
        assert_eq!(Table::default().year_bounds(), None);
    }
}
