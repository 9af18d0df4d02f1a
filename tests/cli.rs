use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const DATA: &str = "\
country,iso_code,year,co2_per_capita,gdp,population
Qatar,QAT,2010,40.0,1.0e11,1800000
Qatar,QAT,2011,38.0,1.2e11,1900000
Chad,TCD,2010,0.1,1.0e10,12000000
Chad,TCD,2011,0.1,1.1e10,12400000
World,,2010,4.6,6.6e13,6900000000
World,,2011,4.7,7.0e13,7000000000
";

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("co2dash").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("co2dash"));
}

#[test]
fn config_prints_default_dashboard() {
    let mut cmd = Command::cargo_bin("co2dash").unwrap();
    cmd.arg("config");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("top_co2_per_capita_lines"));
}

#[test]
fn top_ranks_whitelisted_countries() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("owid.csv");
    let whitelist = dir.path().join("countries.txt");
    fs::write(&data, DATA).unwrap();
    fs::write(&whitelist, "Qatar\nChad\n").unwrap();

    let mut cmd = Command::cargo_bin("co2dash").unwrap();
    cmd.args(["top", "--metric", "co2_per_capita", "--years", "2010:2011", "-k", "1"])
        .arg("--data")
        .arg(&data)
        .arg("--whitelist")
        .arg(&whitelist);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1. Qatar  co2_per_capita=39"))
        .stdout(predicate::str::contains("World").not());
}

#[test]
fn top_rejects_zero_k() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("owid.csv");
    fs::write(&data, DATA).unwrap();

    let mut cmd = Command::cargo_bin("co2dash").unwrap();
    cmd.args(["top", "--metric", "gdp", "-k", "0"]).arg("--data").arg(&data);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("k >= 1"));
}

#[test]
fn run_writes_one_csv_per_panel() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("owid.csv");
    let whitelist = dir.path().join("countries.txt");
    let out = dir.path().join("out");
    fs::write(&data, DATA).unwrap();
    fs::write(&whitelist, "Qatar,Chad").unwrap();

    let mut cmd = Command::cargo_bin("co2dash").unwrap();
    cmd.args(["run", "--year", "2011", "--select", "Chad;Qatar"])
        .arg("--data")
        .arg(&data)
        .arg("--whitelist")
        .arg(&whitelist)
        .arg("--out-dir")
        .arg(&out);
    // the sample has no cumulative_luc_co2 or co2 column
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Skipping panel gdp_vs_luc_co2_scatter"))
        .stderr(predicate::str::contains("Skipping panel gdp_vs_co2_bubble"));

    let bar = fs::read_to_string(out.join("co2_per_capita_bar.csv")).unwrap();
    assert_eq!(bar, "country,value\nQatar,38.0\nChad,0.1\n");
    let map = fs::read_to_string(out.join("co2_per_capita_map.csv")).unwrap();
    assert_eq!(map.lines().count(), 4);
    assert!(out.join("top_co2_per_capita_lines.csv").exists());
    assert!(!out.join("gdp_vs_co2_bubble.csv").exists());
    assert!(out.join("dashboard.json").exists());
}

#[test]
fn stats_prints_summary_per_country() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("owid.csv");
    fs::write(&data, DATA).unwrap();

    let mut cmd = Command::cargo_bin("co2dash").unwrap();
    cmd.args(["stats", "--metric", "gdp", "--countries", "Qatar", "--locale", "de"])
        .arg("--data")
        .arg(&data);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Qatar • gdp  count=2 missing=0"))
        .stdout(predicate::str::contains("mean=110.000.000.000"));
}
