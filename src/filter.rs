//! Row filters: year selection and country membership.
//!
//! All filters are pure: they return a fresh `Table` with the input's schema and
//! leave the input untouched. An empty result is a valid result.

use crate::models::YearSpec;
use crate::table::Table;
use crate::whitelist::Whitelist;
use ahash::AHashSet;
use log::debug;

/// Keep rows whose year matches `years`. A range with `start > end` yields an empty table.
pub fn filter_years(table: &Table, years: YearSpec) -> Table {
    let out = table.filter(|r| years.contains(r.year));
    debug!("filter_years({}): {} -> {} rows", years, table.len(), out.len());
    out
}

/// Keep rows whose country is one of `names`.
///
/// An empty `names` means "nothing selected" and yields an empty table. Names that
/// match no row are ignored.
pub fn filter_countries<S: AsRef<str>>(table: &Table, names: &[S]) -> Table {
    let wanted: AHashSet<&str> = names.iter().map(|s| s.as_ref()).collect();
    let out = table.filter(|r| wanted.contains(r.country.as_str()));
    debug!(
        "filter_countries({} names): {} -> {} rows",
        wanted.len(),
        table.len(),
        out.len()
    );
    out
}

/// Drop rows whose country is not on the whitelist (continents, income groups, "World").
pub fn filter_whitelist(table: &Table, whitelist: &Whitelist) -> Table {
    let out = table.filter(|r| whitelist.contains(&r.country));
    debug!("filter_whitelist: {} -> {} rows", table.len(), out.len());
    out
}
