//! End-to-end chart generation for one workout file
//!
//! Loading is all-or-nothing: a parse error aborts before any chart is drawn.
//! After that each chart is rendered and written on its own, and a failing
//! chart is recorded in the [`RunReport`] unless `continue_on_error` is off.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, info_span};

use crate::config::AppConfig;
use crate::error::{RepChartError, Result};
use crate::export::{
    chart_file_name, export_run_report, input_stem, report_file_name, write_png, PredictionRow,
    PredictionTable,
};
use crate::import::load_table;
use crate::logging::log_error;
use crate::models::WorkoutTable;
use crate::render::{
    render_bar_chart, render_duration_chart, render_repetition_chart, BarView, ChartKind,
    ChartStyle, RenderedFigure, TrendView,
};
use crate::series::{NamedSeries, SeriesExtractor};
use crate::trend::{TrendEstimator, TrendFit, TrendSettings};

/// Charts produced by a run, in order
pub const PIPELINE_CHARTS: [ChartKind; 3] = [
    ChartKind::Bars3d,
    ChartKind::RepetitionTrend,
    ChartKind::DurationTrend,
];

/// Longest horizon `predict` accepts, about ten years
pub const MAX_PREDICTION_DAYS: usize = 3650;

/// Where charts are written and how chart failures are treated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: PathBuf,

    /// Also write `<stem>_report.json`
    pub manifest: bool,

    /// Record a failing chart and go on with the next one
    pub continue_on_error: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("Output"),
            manifest: false,
            continue_on_error: true,
        }
    }
}

/// Result of one chart of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOutcome {
    pub kind: ChartKind,
    pub path: Option<PathBuf>,
    pub bytes: u64,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl ChartOutcome {
    pub fn is_written(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub rows: usize,
    pub set_count: usize,
    pub charts: Vec<ChartOutcome>,
}

impl RunReport {
    pub fn written_count(&self) -> usize {
        self.charts.iter().filter(|c| c.is_written()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.charts.len() - self.written_count()
    }
}

/// A rendered chart with the file name it will be written under
#[derive(Debug)]
pub struct PlannedChart {
    pub kind: ChartKind,
    pub file_name: String,
    pub figure: Result<RenderedFigure>,
}

/// Loads a workout file and produces its three charts
#[derive(Debug, Clone, Default)]
pub struct ChartPipeline {
    style: ChartStyle,
    trend: TrendSettings,
    output: OutputSettings,
}

impl ChartPipeline {
    pub fn new(style: ChartStyle, trend: TrendSettings, output: OutputSettings) -> Self {
        Self {
            style,
            trend,
            output,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.charts.clone(),
            config.trend.clone(),
            config.output.clone(),
        )
    }

    pub fn estimator(&self) -> TrendEstimator {
        TrendEstimator::new(self.trend.method)
    }

    /// Load `input` and write every chart into `output_dir`
    pub fn run(&self, input: &Path, output_dir: &Path) -> Result<RunReport> {
        let _span = info_span!("run", input = %input.display()).entered();
        let started = Instant::now();

        self.style.validate()?;
        let table = load_table(input)?;
        let stem = input_stem(input);

        let mut report = RunReport {
            input: input.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            rows: table.len(),
            set_count: table.set_count(),
            charts: Vec::with_capacity(PIPELINE_CHARTS.len()),
        };

        for kind in PIPELINE_CHARTS {
            let chart_started = Instant::now();
            let path = output_dir.join(chart_file_name(&stem, kind));
            let result = self
                .render_chart(&table, kind)
                .and_then(|figure| write_png(&figure, &path));
            let duration_ms = chart_started.elapsed().as_millis() as u64;

            match result {
                Ok(bytes) => report.charts.push(ChartOutcome {
                    kind,
                    path: Some(path),
                    bytes,
                    duration_ms,
                    error: None,
                }),
                Err(err) => {
                    log_error(&kind.to_string(), &err);
                    if !self.output.continue_on_error {
                        return Err(err);
                    }
                    report.charts.push(ChartOutcome {
                        kind,
                        path: None,
                        bytes: 0,
                        duration_ms,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        if self.output.manifest {
            export_run_report(&report, output_dir.join(report_file_name(&stem)))?;
        }

        info!(
            written = report.written_count(),
            failed = report.failed_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Run finished"
        );
        Ok(report)
    }

    /// Render the three charts without writing anything
    pub fn render_all(&self, table: &WorkoutTable, stem: &str) -> Vec<PlannedChart> {
        PIPELINE_CHARTS
            .iter()
            .map(|&kind| PlannedChart {
                kind,
                file_name: chart_file_name(stem, kind),
                figure: self.render_chart(table, kind),
            })
            .collect()
    }

    /// Render one of the pipeline charts over the whole table
    pub fn render_chart(&self, table: &WorkoutTable, kind: ChartKind) -> Result<RenderedFigure> {
        debug!(chart = %kind, rows = table.len(), "Rendering");
        let estimator = self.estimator();
        let view = TrendView::for_table(table, table.len(), self.trend.extrapolation_days as f64);

        match kind {
            ChartKind::Bars3d => render_bar_chart(table, &BarView::full(table), &self.style),
            ChartKind::RepetitionTrend => {
                render_repetition_chart(table, &estimator, &view, &self.style)
            }
            ChartKind::DurationTrend => {
                render_duration_chart(table, &estimator, &view, &self.style)
            }
        }
    }

    /// Observed and fitted values for every recorded day plus `days_ahead`
    /// future days
    ///
    /// Covers the first set, the daily total, and workout time in seconds when
    /// the table records it.
    pub fn predict(&self, table: &WorkoutTable, days_ahead: usize) -> Result<PredictionTable> {
        if days_ahead > MAX_PREDICTION_DAYS {
            return Err(RepChartError::Configuration(format!(
                "Cannot predict {} days ahead, the limit is {}",
                days_ahead, MAX_PREDICTION_DAYS
            )));
        }
        let estimator = self.estimator();

        let mut series = SeriesExtractor::repetition_series(table);
        match SeriesExtractor::duration_series(table) {
            Ok(duration) => series.push(duration),
            Err(RepChartError::DataUnavailable { .. }) => {}
            Err(err) => return Err(err),
        }

        let mut fitted: Vec<(NamedSeries, TrendFit)> = Vec::with_capacity(series.len());
        for s in series {
            match estimator.fit(&s) {
                Ok(fit) => fitted.push((s, fit)),
                // Workout time is optional; a too-short record of it is skipped
                Err(err @ RepChartError::InsufficientData { .. }) if s.name == "Workout time" => {
                    log_error("workout time prediction", &err);
                }
                Err(err) => return Err(err),
            }
        }

        let rows = (1..=table.len().saturating_add(days_ahead))
            .map(|day| {
                let x = (day - 1) as f64;
                PredictionRow {
                    day,
                    date: table.date_of_day(day),
                    observed: fitted.iter().map(|(s, _)| observed_at(s, x)).collect(),
                    fitted: fitted.iter().map(|(_, fit)| fit.evaluate(x)).collect(),
                }
            })
            .collect();

        Ok(PredictionTable {
            series: fitted.iter().map(|(s, _)| s.name.clone()).collect(),
            rows,
        })
    }
}

fn observed_at(series: &NamedSeries, x: f64) -> Option<f64> {
    series
        .points()
        .find(|(px, _)| (px - x).abs() < f64::EPSILON)
        .map(|(_, y)| y)
}
