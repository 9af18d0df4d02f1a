use co2_dash::aggregate::aggregate;
use co2_dash::pipeline::PanelOutput;
use co2_dash::shape::{LineRow, MapRow, Shaped, shape_for};
use co2_dash::storage;
use co2_dash::{ChartSpec, GroupBy, Metric, YearSpec};
use std::fs;
use tempfile::tempdir;

const OWID_SAMPLE: &str = "\
country,year,iso_code,population,gdp,cement_co2,co2,co2_per_capita,cumulative_luc_co2,primary_energy_consumption
Afghanistan,2010,AFG,28189672,,0.1,8.5,0.3,,
Afghanistan,2011,AFG,29249156,5.6e10,0.1,12.2,0.42,1.5,40.1
World,2011,,7.0e9,1.0e14,1500,34000,4.8,,
";

#[test]
fn load_table_reads_owid_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("owid.csv");
    fs::write(&path, OWID_SAMPLE).unwrap();

    let t = storage::load_table(&path).unwrap();
    assert_eq!(t.len(), 3);
    assert!(Metric::ALL.iter().all(|m| t.schema().has_metric(*m)));
    let afg = &t.records()[0];
    assert_eq!(afg.iso_code, "AFG");
    assert_eq!(afg.value(Metric::Gdp), None);
    assert_eq!(afg.value(Metric::Co2PerCapita), Some(0.3));
    assert_eq!(t.records()[1].value(Metric::Gdp), Some(5.6e10));
    assert_eq!(t.year_bounds(), Some((2010, 2011)));
}

#[test]
fn null_tokens_load_as_missing_values() {
    let csv = "\
country,year,iso_code,co2_per_capita,gdp
X,2008,XXX,10,NA
X,2009,XXX,NaN,N/A
X,2010,XXX,20,null
Y,2010,YYY,50,
";
    let t = storage::read_table(csv.as_bytes()).unwrap();
    assert_eq!(t.len(), 4);
    assert_eq!(t.records()[1].value(Metric::Co2PerCapita), None);
    assert!(t.records().iter().all(|r| r.value(Metric::Gdp).is_none()));

    let agg = aggregate(&t, GroupBy::Country, &[Metric::Co2PerCapita]).unwrap();
    assert_eq!(agg.rows[0].value(Metric::Co2PerCapita), Some(15.0));
    let chart = ChartSpec::Bar {
        metric: Metric::Co2PerCapita,
    };
    let Shaped::Bar(rows) = shape_for(&agg, &chart).unwrap() else {
        panic!("expected bar rows")
    };
    let order: Vec<(&str, Option<f64>)> = rows.iter().map(|r| (r.country.as_str(), r.value)).collect();
    assert_eq!(order, vec![("Y", Some(50.0)), ("X", Some(15.0))]);
}

#[test]
fn padded_header_names_still_match_columns() {
    let t = storage::read_table("country, year , gdp\nX,2008,1.5\n".as_bytes()).unwrap();
    assert!(t.schema().has_metric(Metric::Gdp));
    assert_eq!(t.records()[0].year, 2008);
    assert_eq!(t.records()[0].value(Metric::Gdp), Some(1.5));
}

#[test]
fn garbage_metric_cell_is_an_error() {
    let err = storage::read_table("country,year,gdp\nX,2008,lots\n".as_bytes()).unwrap_err();
    assert!(format!("{err:#}").contains("row 2"));
}

#[test]
fn load_table_reports_bad_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "country,year\nChad,twenty\n").unwrap();
    let err = storage::load_table(&path).unwrap_err();
    assert!(format!("{err:#}").contains("row 2"));
}

#[test]
fn load_whitelist_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("countries.txt");
    fs::write(&path, "Afghanistan\nAlbania\r\nAlgeria\n").unwrap();
    let w = storage::load_whitelist(&path).unwrap();
    assert_eq!(w.len(), 3);
    assert!(w.contains("Albania"));
}

#[test]
fn save_line_csv_and_dashboard_json() {
    let dir = tempdir().unwrap();
    let shaped = Shaped::Line(vec![
        LineRow {
            country: "Chad".into(),
            year: 2010,
            value: Some(0.1),
        },
        LineRow {
            country: "Chad".into(),
            year: 2011,
            value: None,
        },
    ]);

    let csv_path = dir.path().join("lines.csv");
    storage::save_csv(&shaped, &csv_path).unwrap();
    let csv_txt = fs::read_to_string(&csv_path).unwrap();
    assert!(csv_txt.starts_with("country,year,value\n"));
    assert_eq!(csv_txt.lines().count(), 3);
    assert!(csv_txt.contains("Chad,2011,\n"));

    let outputs = vec![PanelOutput {
        name: "lines".into(),
        years: Some(YearSpec::Range { start: 2010, end: 2011 }),
        ranked: None,
        shaped,
        trend: None,
    }];
    let json_path = dir.path().join("dashboard.json");
    storage::save_json(&outputs, &json_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(v[0]["name"], "lines");
    assert_eq!(v[0]["shaped"]["kind"], "line");
    assert_eq!(v[0]["shaped"]["rows"].as_array().unwrap().len(), 2);
}

// A spreadsheet would evaluate cells starting with =, +, - or @ as formulas;
// such cells are written with a leading single quote.
#[test]
fn csv_cells_are_prefixed_to_avoid_formulas() {
    let dir = tempdir().unwrap();
    let shaped = Shaped::Map(vec![MapRow {
        iso_code: "=HYPERLINK(\"http://evil\")".into(),
        country: "@foo".into(),
        value: Some(-1.0),
    }]);
    let path = dir.path().join("map.csv");
    storage::save_csv(&shaped, &path).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let row = rdr.records().next().expect("one data row expected").unwrap();
    assert!(row[0].starts_with('\''), "iso_code not prefixed: {}", &row[0]);
    assert!(row[0].contains("=HYPERLINK"));
    assert_eq!(&row[1], "'@foo");
    // numbers are left alone
    assert_eq!(&row[2], "-1.0");
}
