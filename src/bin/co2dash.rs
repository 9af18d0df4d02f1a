use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use co2_dash::config::{DEFAULT_MIN_YEAR, DEFAULT_TOP_K, YearSelection};
use co2_dash::{DashboardConfig, GroupBy, Metric, Reduction, Table, Whitelist, YearSpec};
use co2_dash::{aggregate, filter, pipeline, rank, stats, storage};
use num_format::{Locale, ToFormattedString};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "co2dash",
    version,
    about = "Filter, aggregate, rank & shape country-level CO2 emission data for dashboards"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every dashboard panel and write chart-ready tables.
    Run(RunArgs),
    /// Rank countries by a metric over a year selection.
    Top(TopArgs),
    /// Print per-country summary statistics for a metric.
    Stats(StatsArgs),
    /// Print the default dashboard configuration as JSON.
    Config,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// OWID-style CSV with one row per country and year.
    #[arg(short = 'D', long)]
    data: PathBuf,
    /// Newline- or comma-separated list of real country names.
    #[arg(short, long)]
    whitelist: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Dashboard configuration (JSON). Defaults to the built-in dashboard.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Selected countries separated by semicolon (e.g., "Germany;France").
    #[arg(short, long)]
    select: Option<String>,
    /// Override the year of every single-year panel.
    #[arg(short, long)]
    year: Option<i32>,
    /// Directory for `<panel>.csv` files and `dashboard.json`.
    #[arg(short, long, default_value = "dashboard")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct TopArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Metric column, e.g. co2_per_capita or gdp.
    #[arg(short, long)]
    metric: String,
    /// Year (YYYY) or range (YYYY:YYYY). Defaults to 2008 through the latest year.
    #[arg(short = 'd', long)]
    years: Option<String>,
    /// How many countries to keep.
    #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
    k: usize,
    /// Rank by the sum over the years instead of the mean.
    #[arg(long, default_value_t = false)]
    sum: bool,
    /// Locale for number formatting (en, de, fr, ...).
    #[arg(long, default_value = "en")]
    locale: String,
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Metric column, e.g. co2_per_capita or gdp.
    #[arg(short, long)]
    metric: String,
    /// Year (YYYY) or range (YYYY:YYYY). Defaults to all years.
    #[arg(short = 'd', long)]
    years: Option<String>,
    /// Countries separated by semicolon. Defaults to all (or all whitelisted).
    #[arg(short, long)]
    countries: Option<String>,
    /// Locale for number formatting (en, de, fr, ...).
    #[arg(long, default_value = "en")]
    locale: String,
}

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'),
    }
}

fn fmt_opt(v: Option<f64>, locale: &str) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let (loc, dec) = map_locale(locale);
            // Up to 2 decimals, trailing zeros trimmed.
            let s = format!("{:.2}", x.abs());
            let (int, frac) = s.split_once('.').unwrap_or((s.as_str(), ""));
            let int = int.parse::<u64>().map(|n| n.to_formatted_string(loc)).unwrap_or_else(|_| int.to_string());
            let frac = frac.trim_end_matches('0');
            let sign = if x < 0.0 { "-" } else { "" };
            if frac.is_empty() {
                format!("{sign}{int}")
            } else {
                format!("{sign}{int}{dec}{frac}")
            }
        }
        _ => "NA".to_string(),
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(';')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_years(s: &str) -> Option<YearSpec> {
    if let Some((a, b)) = s.split_once(':') {
        let start = a.trim().parse::<i32>().ok()?;
        let end = b.trim().parse::<i32>().ok()?;
        Some(YearSpec::Range { start, end })
    } else {
        s.trim().parse::<i32>().ok().map(YearSpec::Year)
    }
}

fn years_arg(s: Option<&str>, default: YearSelection) -> Result<YearSelection> {
    match s {
        Some(s) => parse_years(s)
            .map(YearSelection::from)
            .ok_or_else(|| anyhow::anyhow!("invalid --years, expected YYYY or YYYY:YYYY")),
        None => Ok(default),
    }
}

fn load_inputs(args: &DataArgs) -> Result<(Table, Option<Whitelist>)> {
    let table = storage::load_table(&args.data)?;
    let whitelist = args.whitelist.as_ref().map(storage::load_whitelist).transpose()?;
    Ok((table, whitelist))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Top(args) => cmd_top(args),
        Command::Stats(args) => cmd_stats(args),
        Command::Config => {
            println!("{}", DashboardConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let (table, whitelist) = load_inputs(&args.data)?;
    let whitelist = whitelist.unwrap_or_default();
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(year) = args.year {
        for p in &mut config.panels {
            if let YearSelection::Year { .. } = p.years {
                p.years = YearSelection::Year { year };
            }
        }
    }
    let selection = args.select.as_deref().map(parse_list);

    let mut outputs = Vec::new();
    for (name, result) in pipeline::run_panels(&table, &whitelist, &config, selection.as_deref()) {
        match result {
            Ok(out) => outputs.push(out),
            Err(e) => eprintln!("Skipping panel {}: {}", name, e),
        }
    }
    if outputs.is_empty() && !config.panels.is_empty() {
        anyhow::bail!("no panel could be computed from {}", args.data.data.display());
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create {}", args.out_dir.display()))?;
    for out in &outputs {
        let path = args.out_dir.join(format!("{}.csv", out.name));
        storage::save_csv(&out.shaped, &path)?;
        eprintln!("Saved {} rows to {}", out.shaped.len(), path.display());
    }
    let json_path = args.out_dir.join("dashboard.json");
    storage::save_json(&outputs, &json_path)?;
    eprintln!("Wrote {} panels to {}", outputs.len(), json_path.display());
    Ok(())
}

fn cmd_top(args: TopArgs) -> Result<()> {
    let metric: Metric = args.metric.parse()?;
    let (table, whitelist) = load_inputs(&args.data)?;
    let selection = years_arg(args.years.as_deref(), YearSelection::Since { start: DEFAULT_MIN_YEAR })?;

    let rows = match &whitelist {
        Some(w) => filter::filter_whitelist(&table, w),
        None => table.clone(),
    };
    let rows = match selection.resolve(&table) {
        Some(spec) => filter::filter_years(&rows, spec),
        None => rows.filter(|_| false),
    };
    let reduction = if args.sum { Reduction::Sum } else { Reduction::Mean };
    let per_country = aggregate::aggregate_with(&rows, GroupBy::Country, reduction, &[metric])?;
    let top = rank::top_k(&per_country, metric, args.k)?;

    for (i, country) in top.iter().enumerate() {
        let value = per_country
            .rows
            .iter()
            .find(|r| r.country() == country)
            .and_then(|r| r.value(metric));
        println!("{:>3}. {}  {}={}", i + 1, country, metric, fmt_opt(value, &args.locale));
    }
    Ok(())
}

fn cmd_stats(args: StatsArgs) -> Result<()> {
    let metric: Metric = args.metric.parse()?;
    let (table, whitelist) = load_inputs(&args.data)?;

    let mut rows = match &whitelist {
        Some(w) => filter::filter_whitelist(&table, w),
        None => table.clone(),
    };
    if let Some(s) = args.years.as_deref() {
        let spec = parse_years(s).ok_or_else(|| anyhow::anyhow!("invalid --years, expected YYYY or YYYY:YYYY"))?;
        rows = filter::filter_years(&rows, spec);
    }
    if let Some(c) = args.countries.as_deref() {
        rows = filter::filter_countries(&rows, &parse_list(c));
    }

    for s in stats::grouped_summary(&rows, metric)? {
        println!(
            "{} • {}  count={} missing={}  min={} max={} mean={} median={}",
            s.country,
            s.metric,
            s.count,
            s.missing,
            fmt_opt(s.min, &args.locale),
            fmt_opt(s.max, &args.locale),
            fmt_opt(s.mean, &args.locale),
            fmt_opt(s.median, &args.locale)
        );
    }
    Ok(())
}
