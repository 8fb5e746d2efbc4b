use analytics::{
    analyze_series, analyze_volatility, classify, compare_methods, compute_statistics,
    find_similar_events, forecast_volatility, AnalysisReport, HistoricalSimilarEvent,
};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use configuration::{AnalysisConfig, CurrentWindowPolicy, DetectionMethod};
use core_types::{slice_by_date, DataPoint, Locale};
use futures::future::join_all;
use reporter::TableStyle;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the Econlens command-line tool.
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; ECONLENS_* variables may come from the shell.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;

    let output = match cli.command {
        Commands::Stats(args) => handle_stats(args)?,
        Commands::Anomaly(args) => handle_anomaly(args)?,
        Commands::Volatility(args) => handle_volatility(args)?,
        Commands::Forecast(args) => handle_forecast(args)?,
        Commands::Compare(args) => handle_compare(args)?,
        Commands::Similar(args) => handle_similar(args)?,
        Commands::Report(args) => handle_report(args)?,
        Commands::Batch(args) => handle_batch(args).await?,
    };
    println!("{}", output.trim_end());

    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .context("--log-file must point to a file")?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(Some(guard))
        }
        None => {
            // Results go to stdout, so logs stay on stderr.
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(None)
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Anomaly, volatility and historical-similarity analysis for economic time series.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Descriptive statistics of a series.
    Stats(SeriesArgs),
    /// Classify the current value against its history.
    Anomaly(CurrentArgs),
    /// Conditional volatility, bands and value-at-risk for the current value.
    Volatility(CurrentArgs),
    /// Forecast conditional volatility over the next periods.
    Forecast(SeriesArgs),
    /// Run plain Z-score and conditional-volatility classification side by side.
    Compare(CurrentArgs),
    /// Find historical periods shaped like the most recent window.
    Similar(SeriesArgs),
    /// Every analysis of one series in a single report.
    Report(SeriesArgs),
    /// Reports for many series files, analyzed concurrently.
    Batch(BatchArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    /// Text, with similar events as a terminal table.
    Table,
    /// Text, with similar events as a Markdown table.
    Markdown,
}

impl OutputFormat {
    fn table_style(self) -> Option<TableStyle> {
        match self {
            OutputFormat::Table => Some(TableStyle::Utf8),
            OutputFormat::Markdown => Some(TableStyle::Markdown),
            OutputFormat::Json | OutputFormat::Text => None,
        }
    }
}

/// Parameters that override the loaded configuration field by field.
#[derive(Args, Debug, Clone, Default)]
struct AnalysisOverrides {
    /// Detection method for the anomaly classifier.
    #[arg(long, value_enum)]
    method: Option<DetectionMethod>,

    /// EWMA decay factor, strictly between 0 and 1.
    #[arg(long)]
    lambda: Option<f64>,

    #[arg(long)]
    warning_z: Option<f64>,

    #[arg(long)]
    critical_z: Option<f64>,

    /// Similarity window length in points (5-365).
    #[arg(long)]
    window_size: Option<usize>,

    /// Minimum similarity score of a match (0.5-1.0).
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Minimum length of a merged event, in points (1-365).
    #[arg(long)]
    min_event_duration: Option<usize>,

    /// Maximum number of similar events returned (1-50).
    #[arg(long)]
    max_events: Option<usize>,

    /// Step between candidate windows (1-365).
    #[arg(long)]
    stride: Option<usize>,

    #[arg(long, value_enum)]
    current_window_policy: Option<CurrentWindowPolicy>,

    /// Forecast horizon in periods (1-30).
    #[arg(long)]
    horizon: Option<usize>,
}

impl AnalysisOverrides {
    fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(lambda) = self.lambda {
            config.lambda = lambda;
        }
        if let Some(warning_z) = self.warning_z {
            config.warning_z = warning_z;
        }
        if let Some(critical_z) = self.critical_z {
            config.critical_z = critical_z;
        }
        if let Some(window_size) = self.window_size {
            config.window_size = window_size;
        }
        if let Some(threshold) = self.similarity_threshold {
            config.similarity_threshold = threshold;
        }
        if let Some(duration) = self.min_event_duration {
            config.min_event_duration = duration;
        }
        if let Some(max_events) = self.max_events {
            config.max_events = max_events;
        }
        if let Some(stride) = self.stride {
            config.stride = stride;
        }
        if let Some(policy) = self.current_window_policy {
            config.current_window_policy = policy;
        }
        if let Some(horizon) = self.horizon {
            config.forecast_horizon = horizon;
        }
    }
}

/// Options shared by every single-series subcommand.
#[derive(Args, Debug, Clone)]
struct SeriesArgs {
    /// JSON file holding an array of `{"date": "YYYY-MM-DD", "value": number}`.
    #[arg(long)]
    input: PathBuf,

    /// Series identifier used in the output. Defaults to the input file name.
    #[arg(long)]
    series_id: Option<String>,

    /// First date to include (format: YYYY-MM-DD).
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last date to include (format: YYYY-MM-DD).
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// TOML file with analysis parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output language: en or zh.
    #[arg(long)]
    locale: Option<Locale>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(flatten)]
    overrides: AnalysisOverrides,
}

#[derive(Args, Debug, Clone)]
struct CurrentArgs {
    #[command(flatten)]
    series: SeriesArgs,

    /// Value to classify. Defaults to the last observation, which then leaves the history.
    #[arg(long)]
    current: Option<f64>,
}

#[derive(Args, Debug, Clone)]
struct BatchArgs {
    /// Series files, one JSON array each. The file name is the series id.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    locale: Option<Locale>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(flatten)]
    overrides: AnalysisOverrides,
}

// ==============================================================================
// Input Loading
// ==============================================================================

fn resolve_config(
    path: Option<&Path>,
    locale: Option<Locale>,
    overrides: &AnalysisOverrides,
) -> Result<AnalysisConfig> {
    let mut config =
        configuration::load_config(path).context("Failed to load analysis configuration")?;
    overrides.apply(&mut config);
    if let Some(locale) = locale {
        config.locale = locale;
    }
    config.validate().context("Invalid analysis parameters")?;
    Ok(config)
}

fn series_id_for(path: &Path, explicit: Option<&str>) -> String {
    match explicit {
        Some(id) => id.to_string(),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "series".to_string()),
    }
}

/// Reads a JSON array of observations and orders it by date.
fn load_points(path: &Path) -> Result<Vec<DataPoint>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read series file {}", path.display()))?;
    let mut points: Vec<DataPoint> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse series file {}", path.display()))?;
    points.sort_by_key(|p| p.date);
    tracing::debug!(path = %path.display(), points = points.len(), "Loaded series.");
    Ok(points)
}

/// A loaded, date-filtered series with its resolved configuration.
struct LoadedSeries {
    series_id: String,
    points: Vec<DataPoint>,
    config: AnalysisConfig,
}

fn load_series(args: &SeriesArgs) -> Result<LoadedSeries> {
    let config = resolve_config(args.config.as_deref(), args.locale, &args.overrides)?;
    let points = load_points(&args.input)?;
    let selected = slice_by_date(&points, args.start_date, args.end_date)
        .context("Invalid date range")?
        .to_vec();
    if selected.is_empty() {
        bail!("No observations in {} for the selected date range", args.input.display());
    }
    Ok(LoadedSeries {
        series_id: series_id_for(&args.input, args.series_id.as_deref()),
        points: selected,
        config,
    })
}

/// Splits off the value under analysis: `--current` if given, else the last point.
fn split_current(points: &[DataPoint], current: Option<f64>) -> Result<(f64, &[DataPoint])> {
    match current {
        Some(value) => Ok((value, points)),
        None => match points.split_last() {
            Some((last, history)) => Ok((last.value, history)),
            None => bail!("The series is empty"),
        },
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_stats(args: SeriesArgs) -> Result<String> {
    let series = load_series(&args)?;
    let stats = compute_statistics(&series.points)?;
    Ok(match args.format {
        OutputFormat::Json => reporter::render_json(&stats)?,
        _ => reporter::format_statistics(&series.series_id, &stats, series.config.locale),
    })
}

fn handle_anomaly(args: CurrentArgs) -> Result<String> {
    let series = load_series(&args.series)?;
    let (current, history) = split_current(&series.points, args.current)?;
    let result = classify(&series.series_id, current, history, &series.config)?;
    Ok(match args.series.format {
        OutputFormat::Json => reporter::render_json(&result)?,
        _ => reporter::format_anomaly(&result, series.config.locale),
    })
}

fn handle_volatility(args: CurrentArgs) -> Result<String> {
    let series = load_series(&args.series)?;
    let (current, history) = split_current(&series.points, args.current)?;
    let result = analyze_volatility(current, history, &series.config)?;
    Ok(match args.series.format {
        OutputFormat::Json => reporter::render_json(&result)?,
        _ => reporter::format_volatility(&series.series_id, &result, series.config.locale),
    })
}

fn handle_forecast(args: SeriesArgs) -> Result<String> {
    let series = load_series(&args)?;
    let forecast = forecast_volatility(&series.points, &series.config)?;
    Ok(match args.format {
        OutputFormat::Json => reporter::render_json(&forecast)?,
        _ => reporter::format_forecast(&series.series_id, &forecast, series.config.locale),
    })
}

fn handle_compare(args: CurrentArgs) -> Result<String> {
    let series = load_series(&args.series)?;
    let (current, history) = split_current(&series.points, args.current)?;
    let comparison = compare_methods(&series.series_id, current, history, &series.config)?;
    Ok(match args.series.format {
        OutputFormat::Json => reporter::render_json(&comparison)?,
        _ => reporter::format_comparison(&comparison, series.config.locale),
    })
}

fn render_events(
    events: &[HistoricalSimilarEvent],
    format: OutputFormat,
    locale: Locale,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => reporter::render_json(&events)?,
        OutputFormat::Text => reporter::format_similar_events(events, locale),
        OutputFormat::Table | OutputFormat::Markdown => {
            let style = format.table_style().unwrap_or(TableStyle::Utf8);
            reporter::events_table(events, locale, style)
        }
    })
}

fn handle_similar(args: SeriesArgs) -> Result<String> {
    let series = load_series(&args)?;
    let window_size = series.config.window_size;
    let events = if series.points.len() < window_size {
        tracing::warn!(
            points = series.points.len(),
            window_size,
            "Series shorter than the similarity window."
        );
        Vec::new()
    } else {
        let current = &series.points[series.points.len() - window_size..];
        find_similar_events(current, &series.points, &series.config)?
    };
    render_events(&events, args.format, series.config.locale)
}

fn render_report(report: &AnalysisReport, format: OutputFormat, locale: Locale) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => reporter::render_json(report)?,
        OutputFormat::Text => reporter::format_full_report(report, locale),
        OutputFormat::Table | OutputFormat::Markdown => {
            let style = format.table_style().unwrap_or(TableStyle::Utf8);
            let mut sections = reporter::format_analysis_sections(report, locale);
            sections.push(reporter::events_table(&report.similar_events, locale, style));
            sections.join("\n")
        }
    })
}

fn handle_report(args: SeriesArgs) -> Result<String> {
    let series = load_series(&args)?;
    let report = analyze_series(&series.series_id, &series.points, &series.config)?;
    render_report(&report, args.format, series.config.locale)
}

// ==============================================================================
// Batch Command Logic
// ==============================================================================

/// Analyzes every file on the blocking pool and prints the reports in input order.
async fn handle_batch(args: BatchArgs) -> Result<String> {
    let config = resolve_config(args.config.as_deref(), args.locale, &args.overrides)?;
    tracing::info!(files = args.files.len(), "Starting batch analysis.");

    let tasks: Vec<_> = args
        .files
        .iter()
        .cloned()
        .map(|path| {
            let config = config.clone();
            tokio::task::spawn_blocking(move || {
                let series_id = series_id_for(&path, None);
                let points = load_points(&path)?;
                let report = analyze_series(&series_id, &points, &config)
                    .with_context(|| format!("Analysis of {} failed", path.display()))?;
                Ok::<AnalysisReport, anyhow::Error>(report)
            })
        })
        .collect();

    // Wait for all concurrent analyses to complete
    let results = join_all(tasks).await;

    let mut reports = Vec::new();
    let mut failures = 0usize;
    for (path, result) in args.files.iter().zip(results) {
        match result {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => {
                failures += 1;
                tracing::error!(file = %path.display(), error = ?e, "Series analysis failed.");
            }
            Err(e) => {
                failures += 1;
                tracing::error!(file = %path.display(), error = %e, "Analysis task panicked.");
            }
        }
    }

    if failures > 0 {
        eprintln!("{failures} of {} series failed; see the log for details.", args.files.len());
    }
    if reports.is_empty() {
        bail!("No series could be analyzed");
    }

    if args.format == OutputFormat::Json {
        return Ok(reporter::render_json(&reports)?);
    }
    let rendered = reports
        .iter()
        .map(|report| render_report(report, args.format, config.locale))
        .collect::<Result<Vec<_>>>()?;
    Ok(rendered.join("\n\n"))
}
