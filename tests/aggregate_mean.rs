use co2_dash::aggregate::{aggregate, aggregate_with};
use co2_dash::models::Column;
use co2_dash::{GroupBy, Metric, PipelineError, Record, Reduction, Schema, Table};

fn dp(country: &str, year: i32, co2pc: Option<f64>) -> Record {
    let mut r = Record::new(country, "XXX", year);
    r.metrics.co2_per_capita = co2pc;
    r
}

#[test]
fn mean_excludes_missing_values_from_denominator() {
    let t = Table::new(vec![
        dp("X", 2008, Some(10.0)),
        dp("X", 2009, None),
        dp("X", 2010, Some(20.0)),
    ]);
    let agg = aggregate(&t, GroupBy::Country, &[Metric::Co2PerCapita]).unwrap();
    assert_eq!(agg.len(), 1);
    let x = &agg.rows[0];
    assert_eq!(x.country(), "X");
    assert_eq!(x.key.year, None);
    assert_eq!(x.rows, 3);
    assert!((x.value(Metric::Co2PerCapita).unwrap() - 15.0).abs() < 1e-9);
}

#[test]
fn nan_values_count_as_missing() {
    let t = Table::new(vec![
        dp("X", 2008, Some(10.0)),
        dp("X", 2009, Some(f64::NAN)),
        dp("X", 2010, Some(20.0)),
        dp("Y", 2010, Some(f64::NAN)),
    ]);
    let agg = aggregate(&t, GroupBy::Country, &[Metric::Co2PerCapita]).unwrap();
    // Y has no real value left and is dropped
    assert_eq!(agg.len(), 1);
    assert_eq!(agg.rows[0].value(Metric::Co2PerCapita), Some(15.0));
}

#[test]
fn country_year_grouping_collapses_duplicates_only() {
    let t = Table::new(vec![
        dp("A", 2009, Some(2.0)),
        dp("A", 2009, Some(4.0)),
        dp("A", 2010, Some(7.0)),
    ]);
    let agg = aggregate(&t, GroupBy::CountryYear, &[Metric::Co2PerCapita]).unwrap();
    assert_eq!(agg.len(), 2);
    assert_eq!(agg.rows[0].key.year, Some(2009));
    assert_eq!(agg.rows[0].value(Metric::Co2PerCapita), Some(3.0));
    assert_eq!(agg.rows[1].value(Metric::Co2PerCapita), Some(7.0));
}

#[test]
fn rows_missing_every_relevant_metric_are_dropped_after_grouping() {
    let t = Table::new(vec![
        dp("Sparse", 2008, None),
        dp("Sparse", 2009, Some(1.0)),
        dp("Empty", 2008, None),
        Record::new("GdpOnly", "GDO", 2008).with(Metric::Gdp, 5.0),
    ]);
    let agg = aggregate(&t, GroupBy::Country, &[Metric::Co2PerCapita]).unwrap();
    let names: Vec<&str> = agg.rows.iter().map(|r| r.country()).collect();
    assert_eq!(names, vec!["Sparse"]);

    // a row survives when any relevant metric is present
    let agg = aggregate(&t, GroupBy::Country, &[Metric::Co2PerCapita, Metric::Gdp]).unwrap();
    let names: Vec<&str> = agg.rows.iter().map(|r| r.country()).collect();
    assert_eq!(names, vec!["Sparse", "GdpOnly"]);
    assert_eq!(agg.rows[1].value(Metric::Co2PerCapita), None);
}

#[test]
fn groups_keep_first_appearance_order() {
    let t = Table::new(vec![
        dp("Zambia", 2008, Some(1.0)),
        dp("Angola", 2008, Some(1.0)),
        dp("Zambia", 2009, Some(1.0)),
    ]);
    let agg = aggregate(&t, GroupBy::Country, &[]).unwrap();
    let names: Vec<&str> = agg.rows.iter().map(|r| r.country()).collect();
    assert_eq!(names, vec!["Zambia", "Angola"]);
}

#[test]
fn sum_reduction_adds_present_values() {
    let t = Table::new(vec![
        dp("X", 2008, Some(1.5)),
        dp("X", 2009, None),
        dp("X", 2010, Some(2.5)),
        dp("Y", 2010, None),
    ]);
    let agg = aggregate_with(&t, GroupBy::Country, Reduction::Sum, &[]).unwrap();
    assert_eq!(agg.rows[0].value(Metric::Co2PerCapita), Some(4.0));
    assert_eq!(agg.rows[1].value(Metric::Co2PerCapita), None);
}

#[test]
fn empty_table_aggregates_to_empty() {
    let agg = aggregate(&Table::default(), GroupBy::Country, &[Metric::Co2]).unwrap();
    assert!(agg.is_empty());
}

#[test]
fn metric_absent_from_schema_fails_fast() {
    let schema = Schema::new([Column::IsoCode, Column::Metric(Metric::Gdp)]);
    let t = Table::with_schema(schema, vec![Record::new("A", "AAA", 2000).with(Metric::Gdp, 1.0)]);
    let err = aggregate(&t, GroupBy::Country, &[Metric::Co2]).unwrap_err();
    assert_eq!(
        err,
        PipelineError::MissingColumn {
            column: "co2",
            context: "aggregation metric"
        }
    );
    assert!(err.to_string().contains("co2"));
}

#[test]
fn group_keys_parse_from_column_names() {
    assert_eq!("country".parse::<GroupBy>().unwrap(), GroupBy::Country);
    assert_eq!("country, year".parse::<GroupBy>().unwrap(), GroupBy::CountryYear);
    let err = "continent".parse::<GroupBy>().unwrap_err();
    assert_eq!(err, PipelineError::InvalidGroupKey("continent".into()));
}

#[test]
fn iso_code_comes_from_first_non_empty_row() {
    let t = Table::new(vec![
        Record::new("Kosovo", "", 2008).with(Metric::Co2, 1.0),
        Record::new("Kosovo", "OWID_KOS", 2009).with(Metric::Co2, 2.0),
    ]);
    let agg = aggregate(&t, GroupBy::Country, &[Metric::Co2]).unwrap();
    assert_eq!(agg.rows[0].iso_code, "OWID_KOS");
}
