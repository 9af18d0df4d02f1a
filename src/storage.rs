use crate::models::{Column, Record};
use crate::pipeline::PanelOutput;
use crate::shape::Shaped;
use crate::table::{Schema, Table};
use crate::whitelist::Whitelist;
use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::info;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Cell contents that mean "no value", as spreadsheet and pandas exports write them.
const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
];

/// Read a metric cell: null tokens and non-finite numbers become missing.
fn metric_cell<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(d)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if NULL_TOKENS.contains(&raw) {
        return Ok(None);
    }
    let v: f64 = raw
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid number `{raw}`")))?;
    Ok(v.is_finite().then_some(v))
}

/// One CSV row as it appears in the OWID export. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    country: String,
    #[serde(default)]
    iso_code: String,
    year: i32,
    #[serde(default, deserialize_with = "metric_cell")]
    co2_per_capita: Option<f64>,
    #[serde(default, deserialize_with = "metric_cell")]
    cumulative_luc_co2: Option<f64>,
    #[serde(default, deserialize_with = "metric_cell")]
    gdp: Option<f64>,
    #[serde(default, deserialize_with = "metric_cell")]
    population: Option<f64>,
    #[serde(default, deserialize_with = "metric_cell")]
    primary_energy_consumption: Option<f64>,
    #[serde(default, deserialize_with = "metric_cell")]
    co2: Option<f64>,
}

impl From<RawRecord> for Record {
    fn from(r: RawRecord) -> Self {
        let mut rec = Record::new(r.country, r.iso_code, r.year);
        rec.metrics.co2_per_capita = r.co2_per_capita;
        rec.metrics.cumulative_luc_co2 = r.cumulative_luc_co2;
        rec.metrics.gdp = r.gdp;
        rec.metrics.population = r.population;
        rec.metrics.primary_energy_consumption = r.primary_energy_consumption;
        rec.metrics.co2 = r.co2;
        rec
    }
}

/// Read a per-country-per-year table from any CSV reader.
///
/// The schema is the set of known columns present in the header; `country` and `year`
/// are required. Header names are trimmed. Empty cells and null tokens (`NA`, `NaN`,
/// `null`, ...) become missing values.
pub fn read_table<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);
    let headers = rdr.headers().context("read csv header")?.clone();
    let columns: Vec<Column> = headers.iter().filter_map(Column::from_name).collect();
    for required in [Column::Country, Column::Year] {
        if !columns.contains(&required) {
            bail!("csv header lacks required column `{}`", required.name());
        }
    }

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<RawRecord>().enumerate() {
        // header is line 1
        let raw = row.with_context(|| format!("parse csv row {}", i + 2))?;
        records.push(Record::from(raw));
    }
    Ok(Table::with_schema(Schema::new(columns), records))
}

/// Load the emissions table from a CSV file.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let table = read_table(file).with_context(|| format!("load {}", path.display()))?;
    info!(
        "loaded {} rows ({} metric columns) from {}",
        table.len(),
        table.schema().metrics().count(),
        path.display()
    );
    Ok(table)
}

/// Load a newline- or comma-separated list of country names.
pub fn load_whitelist<P: AsRef<Path>>(path: P) -> Result<Whitelist> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let whitelist = Whitelist::parse(&text);
    info!("loaded {} whitelisted countries from {}", whitelist.len(), path.display());
    Ok(whitelist)
}

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn safe_cell(s: &str) -> Cow<'_, str> {
    if s.starts_with(['=', '+', '-', '@']) {
        Cow::Owned(format!("'{s}"))
    } else {
        Cow::Borrowed(s)
    }
}

/// Save one chart-ready table as CSV with header.
pub fn save_csv<P: AsRef<Path>>(shaped: &Shaped, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    match shaped {
        Shaped::Map(rows) => {
            wtr.serialize(("iso_code", "country", "value"))?;
            for r in rows {
                wtr.serialize((safe_cell(&r.iso_code), safe_cell(&r.country), r.value))?;
            }
        }
        Shaped::Bar(rows) => {
            wtr.serialize(("country", "value"))?;
            for r in rows {
                wtr.serialize((safe_cell(&r.country), r.value))?;
            }
        }
        Shaped::Line(rows) => {
            wtr.serialize(("country", "year", "value"))?;
            for r in rows {
                wtr.serialize((safe_cell(&r.country), r.year, r.value))?;
            }
        }
        Shaped::Scatter(rows) | Shaped::Bubble(rows) => {
            wtr.serialize(("country", "x", "y", "size", "color"))?;
            for r in rows {
                wtr.serialize((safe_cell(&r.country), r.x, r.y, r.size, r.color))?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Save panel outputs as pretty JSON array.
pub fn save_json<P: AsRef<Path>>(outputs: &[PanelOutput], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(outputs)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
