use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use repchart::export::{export_predictions, input_stem};
use repchart::import::format_workout_time;
use repchart::logging::init_logging;
use repchart::{
    load_table, AppConfig, ChartPipeline, ColorScheme, FrameRenderer, LogFormat, RepChartError,
    SeriesExtractor, TrendMethod, WorkoutTable,
};

/// repchart - Workout Progress Charts
///
/// Turns a daily log of per-set repetition counts into a 3D bar chart of
/// every set, a repetition trend chart and a workout time trend chart.
#[derive(Parser)]
#[command(name = "repchart")]
#[command(version)]
#[command(about = "Workout progress charts from a repetition log", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    /// Also write JSON logs to this file
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the bar, trend and workout time charts
    Render {
        /// Workout CSV file
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Days the trend lines run past the last record
        #[arg(long, value_name = "DAYS")]
        extrapolate: Option<u32>,

        /// Colour scheme (normal, inverted)
        #[arg(long)]
        scheme: Option<ColorScheme>,

        /// Image resolution in dots per inch
        #[arg(long)]
        dpi: Option<u32>,

        /// Polynomial degree of the trend lines (1 = linear)
        #[arg(long)]
        degree: Option<usize>,

        /// Write a JSON report next to the charts
        #[arg(long)]
        manifest: bool,

        /// Stop at the first chart that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// Render per-day frame sequences for a progress video
    Frames {
        /// Workout CSV file
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Last day of the trend frames
        #[arg(long, value_name = "DAYS")]
        horizon: Option<usize>,

        /// Worker threads
        #[arg(long)]
        threads: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Show the loaded records and their trends
    Summary {
        /// Workout CSV file
        input: PathBuf,
    },

    /// Predict the coming days from the trend lines
    Predict {
        /// Workout CSV file
        input: PathBuf,

        /// Days ahead to predict
        #[arg(short, long)]
        days: Option<usize>,

        /// Write every observed and predicted day to a CSV file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },

    /// Show or create the configuration file
    Config {
        /// Write the default configuration
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    config.logging.level = config.logging.level.raised_by(cli.verbose);
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(path) = cli.log_file.clone() {
        config.logging.file_path = Some(path);
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Render {
            input,
            output,
            extrapolate,
            scheme,
            dpi,
            degree,
            manifest,
            fail_fast,
        } => {
            if let Some(days) = extrapolate {
                config.trend.extrapolation_days = days;
            }
            if let Some(scheme) = scheme {
                config.charts.color_scheme = scheme;
            }
            if let Some(dpi) = dpi {
                config.charts.dpi = dpi;
            }
            if let Some(degree) = degree {
                config.trend.method = friendly(TrendMethod::from_degree(degree))?;
            }
            config.output.manifest |= manifest;
            if fail_fast {
                config.output.continue_on_error = false;
            }
            let output_dir = output.unwrap_or_else(|| config.output.directory.clone());

            run_render(&config, &input, &output_dir)?;
        }

        Commands::Frames {
            input,
            output,
            horizon,
            threads,
            no_progress,
        } => {
            if let Some(horizon) = horizon {
                config.frames.horizon_days = horizon;
            }
            if threads.is_some() {
                config.frames.threads = threads;
            }
            if no_progress {
                config.frames.show_progress = false;
            }
            let output_dir = output.unwrap_or_else(|| config.output.directory.clone());

            run_frames(&config, &input, &output_dir)?;
        }

        Commands::Summary { input } => {
            let table = friendly(load_table(&input))?;
            print_summary(&config, &table);
        }

        Commands::Predict { input, days, csv } => {
            let days = days.unwrap_or(config.trend.prediction_days as usize);
            run_predict(&config, &input, days, csv.as_deref())?;
        }

        Commands::Config { init, show } => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(AppConfig::default_config_path);

            if init {
                if path.exists() {
                    bail!(
                        "Config file already exists: {} (remove it first to reset)",
                        path.display()
                    );
                }
                AppConfig::default().save_to_file(&path)?;
                println!("{} {}", "✓ Config written to".green(), path.display());
            }
            if show || !init {
                let text = toml::to_string_pretty(&config)
                    .context("Failed to serialize configuration")?;
                println!("{}", format!("# {}", path.display()).dimmed());
                println!("{}", text);
            }
        }
    }

    Ok(())
}

/// Attach the user-facing message to a library error
fn friendly<T>(result: repchart::Result<T>) -> Result<T> {
    result.map_err(|err: RepChartError| {
        let message = err.user_message();
        anyhow::Error::new(err).context(message)
    })
}

fn run_render(config: &AppConfig, input: &Path, output_dir: &Path) -> Result<()> {
    println!("{}", "Rendering charts...".green().bold());
    println!("  Input: {}", input.display());
    println!("  Output: {}", output_dir.display());

    let pipeline = ChartPipeline::from_config(config);
    let report = friendly(pipeline.run(input, output_dir))?;

    for chart in &report.charts {
        match (&chart.path, &chart.error) {
            (Some(path), None) => println!(
                "  {} {} ({} bytes)",
                "✓".green(),
                path.display(),
                chart.bytes
            ),
            (_, Some(error)) => println!("  {} {}: {}", "✗".yellow(), chart.kind, error),
            (None, None) => {}
        }
    }

    if report.failed_count() > 0 {
        println!(
            "{}",
            format!(
                "⚠ {} of {} charts skipped",
                report.failed_count(),
                report.charts.len()
            )
            .yellow()
        );
    } else {
        println!("{}", "✓ All charts written".green());
    }
    Ok(())
}

fn run_frames(config: &AppConfig, input: &Path, output_dir: &Path) -> Result<()> {
    println!("{}", "Rendering frames...".cyan().bold());

    let table = friendly(load_table(input))?;
    let renderer = FrameRenderer::new(
        config.charts.clone(),
        config.trend.clone(),
        config.frames.clone(),
    );
    let summary = friendly(renderer.render_all(&table, &input_stem(input), output_dir))?;

    for failure in summary.failures.iter().take(10) {
        println!("  {} {}: {}", "✗".yellow(), failure.file_name, failure.error);
    }
    if summary.failures.len() > 10 {
        println!("  ... and {} more", summary.failures.len() - 10);
    }
    println!(
        "{}",
        format!(
            "✓ {} of {} frames written to {} in {:.1}s",
            summary.written,
            summary.total,
            output_dir.display(),
            summary.duration_ms as f64 / 1000.0
        )
        .cyan()
    );
    Ok(())
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Series")]
    series: String,
    #[tabled(rename = "Days")]
    points: usize,
    #[tabled(rename = "Per day")]
    slope: String,
    #[tabled(rename = "R²")]
    r_squared: String,
    #[tabled(rename = "Next day")]
    next: String,
}

fn print_summary(config: &AppConfig, table: &WorkoutTable) {
    println!("{}", "Workout log".magenta().bold());

    let mut builder = Builder::default();
    let mut header = vec!["Day".to_string(), "Date".to_string()];
    header.extend((1..=table.set_count()).map(|k| format!("Set {}", k)));
    header.push("Sum".to_string());
    if table.has_duration() {
        header.push("Time".to_string());
    }
    builder.push_record(header);

    for (idx, record) in table.records().iter().enumerate() {
        let mut row = vec![
            (idx + 1).to_string(),
            record.date.format("%Y-%m-%d").to_string(),
        ];
        row.extend(record.sets.iter().map(|reps| reps.to_string()));
        row.push(record.sum.to_string());
        if table.has_duration() {
            row.push(
                record
                    .duration_seconds
                    .map(format_workout_time)
                    .unwrap_or_default(),
            );
        }
        builder.push_record(row);
    }
    let mut records = builder.build();
    records.with(Style::rounded());
    println!("{}", records);

    let pipeline = ChartPipeline::from_config(config);
    let estimator = pipeline.estimator();
    let mut series = SeriesExtractor::repetition_series(table);
    if let Ok(duration) = SeriesExtractor::duration_series(table) {
        series.push(duration);
    }

    let next_x = table.len() as f64;
    let rows: Vec<TrendRow> = series
        .iter()
        .map(|s| match estimator.fit(s) {
            Ok(fit) => TrendRow {
                series: s.name.clone(),
                points: s.len(),
                slope: format!("{:+.2}", fit.slope_at(next_x)),
                r_squared: format!("{:.3}", fit.r_squared),
                next: format!("{:.1}", fit.evaluate(next_x)),
            },
            Err(_) => TrendRow {
                series: s.name.clone(),
                points: s.len(),
                slope: "-".to_string(),
                r_squared: "-".to_string(),
                next: "-".to_string(),
            },
        })
        .collect();

    println!(
        "{}",
        format!("Trends ({:?} fit)", estimator.method()).magenta().bold()
    );
    let mut trends = Table::new(rows);
    trends.with(Style::rounded());
    println!("{}", trends);
}

fn run_predict(config: &AppConfig, input: &Path, days: usize, csv: Option<&Path>) -> Result<()> {
    let table = friendly(load_table(input))?;
    let pipeline = ChartPipeline::from_config(config);
    let prediction = friendly(pipeline.predict(&table, days))?;

    println!(
        "{}",
        format!("Predictions for the next {} days", days).blue().bold()
    );

    let mut builder = Builder::default();
    let mut header = vec!["Day".to_string(), "Date".to_string()];
    header.extend(prediction.series.iter().cloned());
    builder.push_record(header);
    for row in prediction.rows.iter().filter(|r| r.is_projected()) {
        let mut fields = vec![
            row.day.to_string(),
            row.date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        ];
        fields.extend(row.fitted.iter().map(|v| format!("{:.1}", v)));
        builder.push_record(fields);
    }
    let mut table_view = builder.build();
    table_view.with(Style::rounded());
    println!("{}", table_view);

    if let Some(path) = csv {
        friendly(export_predictions(&prediction, path))?;
        println!("{} {}", "✓ Predictions written to".blue(), path.display());
    }
    Ok(())
}
