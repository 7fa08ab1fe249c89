mod config;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use config::VitaltrendConfig;
use std::path::{Path, PathBuf};
use vitaltrend_core::{
    build_dashboard, load_exports, scan_all, sleep_hours, step_values, weight_values,
    CalendarDate, Coverage, Dashboard, DataRange, Freshness, HeartRateLines, LoadResult,
    MetricKind, SummarySet, Window,
};

/// Ten years of daily slots.
const MAX_WINDOW_DAYS: u32 = 3660;

#[derive(Parser)]
#[command(name = "vitaltrend")]
#[command(author, version, about = "Daily health metric series and windowed summaries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable debug logging")]
    debug: bool,
}

#[derive(clap::Args)]
struct WindowArgs {
    #[arg(required = true, help = "Export files or directories to scan for *.json")]
    paths: Vec<PathBuf>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_WINDOW_DAYS as i64), help = "Window length in days (default from config, else 7)")]
    days: Option<u32>,

    #[arg(long, help = "Reference date (YYYY-MM-DD), defaults to the local date")]
    today: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show summary cards for the window")]
    Summary {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    #[command(about = "Show one metric day by day")]
    Series {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, value_parser = parse_metric, help = "weight, heart_rate, activity or sleep")]
        metric: MetricKind,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    #[command(about = "Export the full dashboard as JSON")]
    Dashboard {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, help = "Write to file instead of stdout")]
        output: Option<PathBuf>,
    },
    #[command(about = "Show the data range and freshness")]
    Range {
        #[arg(required = true, help = "Export files or directories to scan for *.json")]
        paths: Vec<PathBuf>,
        #[arg(long, help = "Reference date (YYYY-MM-DD), defaults to the local date")]
        today: Option<String>,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

fn parse_metric(s: &str) -> std::result::Result<MetricKind, String> {
    MetricKind::from_str(s).ok_or_else(|| {
        let known: Vec<&str> = MetricKind::iter().map(|m| m.as_str()).collect();
        format!("unknown metric '{}' (expected one of: {})", s, known.join(", "))
    })
}

fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = VitaltrendConfig::load();

    match cli.command {
        Commands::Summary { window, json } => run_summary(&window, json, config),
        Commands::Series {
            window,
            metric,
            json,
        } => run_series(&window, metric, json, config),
        Commands::Dashboard { window, output } => run_dashboard(&window, output.as_deref(), config),
        Commands::Range { paths, today, json } => run_range(&paths, today.as_deref(), json),
    }
}

fn reference_date(today: Option<&str>) -> Result<CalendarDate> {
    match today {
        Some(raw) => raw.parse::<CalendarDate>().context("invalid --today"),
        None => Ok(CalendarDate::today()),
    }
}

fn load_inputs(paths: &[PathBuf]) -> Result<LoadResult> {
    let files = scan_all(paths);
    if files.is_empty() {
        let shown: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        bail!("no export files found in {}", shown.join(", "));
    }

    let result = load_exports(&files);
    for path in &result.files_skipped {
        eprintln!(
            "{}",
            format!("  Skipped unreadable export: {}", path.display()).yellow()
        );
    }
    if result.files_loaded == 0 {
        bail!("none of the {} export files could be read", files.len());
    }
    Ok(result)
}

fn load_dashboard(args: &WindowArgs, config: &VitaltrendConfig) -> Result<(Dashboard, LoadResult)> {
    let reference = reference_date(args.today.as_deref())?;
    let days = args.days.unwrap_or_else(|| config.default_days());
    let window = Window::new(days, reference)?;

    let loaded = load_inputs(&args.paths)?;
    let dashboard = build_dashboard(&loaded.dataset, window)?;
    Ok((dashboard, loaded))
}

fn run_summary(args: &WindowArgs, json: bool, config: &VitaltrendConfig) -> Result<()> {
    let (dashboard, loaded) = load_dashboard(args, config)?;

    if json {
        #[derive(serde::Serialize)]
        struct SummaryJson<'a> {
            window: &'a Window,
            summary: &'a SummarySet,
            data_range: Option<DataRange>,
            freshness: Freshness,
            discarded: usize,
        }

        let output = SummaryJson {
            window: &dashboard.meta.window,
            summary: &dashboard.summary,
            data_range: dashboard.data_range,
            freshness: dashboard.freshness,
            discarded: loaded.dataset.discarded.total(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let window = &dashboard.meta.window;
    println!(
        "\n  {}\n",
        format!(
            "Last {} days ({} to {})",
            window.days(),
            window.start(),
            window.end()
        )
        .cyan()
    );

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Metric", "Value", "Detail", "Coverage"]);

    let summary = &dashboard.summary;
    for kind in MetricKind::iter() {
        let (value, detail) = summary_cells(summary, kind);
        table.add_row(vec![
            kind.display_name().to_string(),
            value,
            detail,
            dashboard.coverage.get(kind).to_string(),
        ]);
    }
    println!("{table}");

    if let Some(change) = summary.weight.as_ref().map(|w| w.change) {
        // Weight going down is shown as an improvement.
        let trend = if change < 0.0 {
            "Weight trending down".green()
        } else if change > 0.0 {
            "Weight trending up".red()
        } else {
            "Weight unchanged".normal()
        };
        println!("\n  {}", trend);
    }

    print_footer(&dashboard, &loaded);
    Ok(())
}

fn summary_cells(summary: &SummarySet, kind: MetricKind) -> (String, String) {
    let no_data = || ("No data".to_string(), String::new());
    match kind {
        MetricKind::Weight => summary.weight.as_ref().map_or_else(no_data, |w| {
            (
                format!("{:.2} {}", w.latest, w.unit),
                w.change_label(),
            )
        }),
        MetricKind::HeartRate => summary.heart_rate.as_ref().map_or_else(no_data, |hr| {
            (
                format!("{:.0} {}", hr.avg, hr.unit),
                format!("Range: {}", hr.range_label()),
            )
        }),
        MetricKind::Activity => summary.activity.as_ref().map_or_else(no_data, |a| {
            (
                format!("{} steps/day", format_thousands(a.avg_steps)),
                format!("Total: {} steps", format_thousands(a.total_steps)),
            )
        }),
        MetricKind::Sleep => summary.sleep.as_ref().map_or_else(no_data, |s| {
            let mut detail = format!("Best: {:.2} h", s.best_duration_hours);
            if let Some(percent) = s.good_quality_percent {
                detail.push_str(&format!(", {:.0}% good quality sleep", percent));
            }
            (format!("{:.2} h", s.avg_duration_hours), detail)
        }),
    }
}

fn run_series(
    args: &WindowArgs,
    metric: MetricKind,
    json: bool,
    config: &VitaltrendConfig,
) -> Result<()> {
    let (dashboard, loaded) = load_dashboard(args, config)?;
    let series = &dashboard.series;

    if json {
        #[derive(serde::Serialize)]
        struct SeriesJson<'a> {
            metric: MetricKind,
            window: &'a Window,
            calendar: &'a [CalendarDate],
            values: serde_json::Value,
            coverage: Coverage,
        }

        let values = match metric {
            MetricKind::Weight => serde_json::to_value(&series.weight)?,
            MetricKind::HeartRate => serde_json::to_value(&series.heart_rate)?,
            MetricKind::Activity => serde_json::to_value(&series.activity)?,
            MetricKind::Sleep => serde_json::to_value(&series.sleep)?,
        };
        let output = SeriesJson {
            metric,
            window: &dashboard.meta.window,
            calendar: &dashboard.calendar,
            values,
            coverage: dashboard.coverage.get(metric),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let gap = config.gap_marker();
    let cell = |value: Option<f64>, precision: usize| -> String {
        value.map_or_else(|| gap.to_string(), |v| format!("{:.*}", precision, v))
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    match metric {
        MetricKind::Weight => {
            table.set_header(vec!["Date", "Weight", "Unit"]);
            let values = weight_values(&series.weight);
            for ((date, value), record) in dashboard.calendar.iter().zip(values).zip(&series.weight) {
                let unit = record.as_ref().map_or(gap, |r| r.unit.as_str());
                table.add_row(vec![date.to_string(), cell(value, 2), unit.to_string()]);
            }
        }
        MetricKind::HeartRate => {
            table.set_header(vec!["Date", "Avg", "Min", "Max"]);
            let lines = HeartRateLines::from_series(&series.heart_rate);
            for (i, date) in dashboard.calendar.iter().enumerate() {
                table.add_row(vec![
                    date.to_string(),
                    cell(lines.avg[i], 0),
                    cell(lines.min[i], 0),
                    cell(lines.max[i], 0),
                ]);
            }
        }
        MetricKind::Activity => {
            table.set_header(vec!["Date", "Steps"]);
            for (date, value) in dashboard.calendar.iter().zip(step_values(&series.activity)) {
                let steps = value.map_or_else(|| gap.to_string(), format_thousands);
                table.add_row(vec![date.to_string(), steps]);
            }
        }
        MetricKind::Sleep => {
            table.set_header(vec!["Date", "Hours", "Quality"]);
            let hours = sleep_hours(&series.sleep);
            for ((date, value), record) in dashboard.calendar.iter().zip(hours).zip(&series.sleep) {
                let quality = record
                    .as_ref()
                    .and_then(|r| r.quality)
                    .map_or(gap, |q| q.as_str());
                table.add_row(vec![date.to_string(), cell(value, 2), quality.to_string()]);
            }
        }
    }

    println!("\n  {}\n", format!("{} ({})", metric.display_name(), metric.default_unit()).cyan());
    println!("{table}");
    println!("\n  Coverage: {}", dashboard.coverage.get(metric));
    print_footer(&dashboard, &loaded);
    Ok(())
}

fn run_dashboard(args: &WindowArgs, output: Option<&Path>, config: &VitaltrendConfig) -> Result<()> {
    let (dashboard, _) = load_dashboard(args, config)?;
    let json = dashboard.to_json_pretty()?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "{}",
                format!("✓ Dashboard written to {}", path.display()).green()
            );
            eprintln!(
                "{}",
                format!(
                    "  {} days, {} to {}",
                    dashboard.meta.window.days(),
                    dashboard.meta.window.start(),
                    dashboard.meta.window.end()
                )
                .bright_black()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_range(paths: &[PathBuf], today: Option<&str>, json: bool) -> Result<()> {
    let reference = reference_date(today)?;
    let loaded = load_inputs(paths)?;
    let range = vitaltrend_core::data_range(&loaded.dataset);
    let freshness = vitaltrend_core::freshness(range.map(|r| r.latest), reference);

    if json {
        #[derive(serde::Serialize)]
        struct RangeJson {
            reference: CalendarDate,
            data_range: Option<DataRange>,
            freshness: Freshness,
            files_loaded: usize,
        }

        let output = RangeJson {
            reference,
            data_range: range,
            freshness,
            files_loaded: loaded.files_loaded,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match range {
        Some(range) => {
            println!("\n  Earliest: {}", range.earliest);
            println!("  Latest:   {}", range.latest);
            println!("  Span:     {} days", range.span_days());
        }
        None => println!("\n  {}", "No records found".yellow()),
    }
    println!("  {}", freshness_line(freshness));
    println!(
        "{}",
        format!("  {} export files loaded", loaded.files_loaded).bright_black()
    );
    Ok(())
}

fn freshness_line(freshness: Freshness) -> colored::ColoredString {
    let text = format!("Freshness: {} ({})", freshness, freshness.describe());
    match freshness {
        Freshness::Today | Freshness::Yesterday => text.green(),
        Freshness::Recent => text.normal(),
        Freshness::Old => text.yellow(),
        Freshness::VeryOld | Freshness::NoData => text.red(),
    }
}

fn print_footer(dashboard: &Dashboard, loaded: &LoadResult) {
    println!("\n  {}", freshness_line(dashboard.freshness));

    let discarded = loaded.dataset.discarded.total();
    let mut note = format!("  {} export files loaded", loaded.files_loaded);
    if discarded > 0 {
        note.push_str(&format!(", {} unusable records skipped", discarded));
    }
    println!("{}", note.bright_black());
}

fn format_thousands(n: f64) -> String {
    let rounded = n.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
