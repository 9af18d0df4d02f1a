//! co2_dash
//!
//! Data-selection and aggregation pipeline behind a country-level CO₂ emissions
//! dashboard. Pairs with the `co2dash` CLI.
//!
//! ### Features
//! - Filter a per-country-per-year table by year or inclusive year range
//! - Restrict to a user selection and/or a whitelist of real countries
//! - Aggregate years into per-country means (missing values excluded)
//! - Rank the top K countries by a metric with stable tie-breaking
//! - Shape results for map, bar, line, scatter and bubble charts
//!
//! ### Example
//! ```no_run
//! use co2_dash::{GroupBy, Metric, YearSpec};
//! use co2_dash::{aggregate, filter, rank, storage};
//!
//! let table = storage::load_table("owid-co2-data.csv")?;
//! let whitelist = storage::load_whitelist("countries.txt")?;
//! let rows = filter::filter_years(&table, YearSpec::Range { start: 2008, end: 2021 });
//! let rows = filter::filter_whitelist(&rows, &whitelist);
//! let per_country = aggregate::aggregate(&rows, GroupBy::Country, &[Metric::Co2PerCapita])?;
//! let top = rank::top_k(&per_country, Metric::Co2PerCapita, 10)?;
//! println!("{:?}", top);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod rank;
pub mod shape;
pub mod stats;
pub mod storage;
pub mod table;
pub mod whitelist;

pub use aggregate::{AggRow, Aggregated, GroupBy, Reduction};
pub use config::{DashboardConfig, PanelConfig};
pub use error::PipelineError;
pub use models::{GroupKey, Metric, Metrics, Record, YearSpec};
pub use shape::{ChartKind, ChartSpec, Shaped};
pub use table::{Schema, Table};
pub use whitelist::Whitelist;
