//! Progressive frame sequences for turning a training log into a video
//!
//! Each frame is an independent job over the shared, immutable table, so
//! jobs run on a rayon pool and write distinct files.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{RepChartError, Result};
use crate::export::{bar_frame_name, duration_frame_name, trend_frame_name, write_png};
use crate::models::WorkoutTable;
use crate::render::{
    render_bar_chart, render_duration_chart, render_repetition_chart, BarView, ChartStyle,
    RenderedFigure, TrendView,
};
use crate::trend::{TrendEstimator, TrendSettings};

/// Frame sequence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    /// Last day of the trend frame sequence
    pub horizon_days: usize,

    /// Worker threads, rayon's default when unset
    pub threads: Option<usize>,

    pub show_progress: bool,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            horizon_days: 365,
            threads: None,
            show_progress: true,
        }
    }
}

/// One image of a frame sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "sequence")]
pub enum FrameJob {
    /// Days `1..=day`, with sets `1..=set` done on the last one
    Bars { day: usize, set: usize },
    /// Repetition trend with the axis running through `day`
    Trend { day: usize },
    /// Workout time trend through `day`
    Duration { day: usize },
}

impl FrameJob {
    pub fn file_name(&self, stem: &str) -> String {
        match *self {
            FrameJob::Bars { day, set } => bar_frame_name(stem, day, set),
            FrameJob::Trend { day } => trend_frame_name(stem, day),
            FrameJob::Duration { day } => duration_frame_name(stem, day),
        }
    }
}

/// Every frame for `table`: bars per (day, set), trend frames for days
/// `2..=horizon_days`, and duration frames for the recorded days when the
/// table has workout time
pub fn plan_frames(table: &WorkoutTable, horizon_days: usize) -> Vec<FrameJob> {
    let rows = table.len();
    let mut jobs = Vec::new();

    for day in 1..=rows {
        for set in 1..=table.set_count() {
            jobs.push(FrameJob::Bars { day, set });
        }
    }

    if rows > 0 {
        jobs.extend((2..=horizon_days).map(|day| FrameJob::Trend { day }));
    }

    if table.has_duration() {
        jobs.extend((2..=rows).map(|day| FrameJob::Duration { day }));
    }

    jobs
}

/// A frame that could not be produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameFailure {
    pub file_name: String,
    pub error: String,
}

/// Outcome of a frame run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub total: usize,
    pub written: usize,
    pub bytes: u64,
    pub failures: Vec<FrameFailure>,
    pub duration_ms: u64,
}

/// Renders and writes frame sequences
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    style: ChartStyle,
    trend: TrendSettings,
    settings: FrameSettings,
}

impl FrameRenderer {
    pub fn new(style: ChartStyle, trend: TrendSettings, settings: FrameSettings) -> Self {
        Self {
            style,
            trend,
            settings,
        }
    }

    /// Draw one frame
    pub fn render(&self, table: &WorkoutTable, job: FrameJob) -> Result<RenderedFigure> {
        let estimator = TrendEstimator::new(self.trend.method);
        let extrapolation = self.trend.extrapolation_days as f64;

        match job {
            FrameJob::Bars { day, set } => render_bar_chart(
                table,
                &BarView {
                    days: day,
                    sets_in_last_day: set,
                },
                &self.style,
            ),
            FrameJob::Trend { day } => {
                let view =
                    TrendView::for_table(table, day, extrapolation).wide(day > table.len());
                render_repetition_chart(table, &estimator, &view, &self.style)
            }
            FrameJob::Duration { day } => {
                let view = TrendView::for_table(table, day, extrapolation);
                render_duration_chart(table, &estimator, &view, &self.style)
            }
        }
    }

    /// Render and write every planned frame into `output_dir`
    ///
    /// Failing frames are collected in the summary; only an unusable thread
    /// pool or chart style fails the whole call.
    pub fn render_all(
        &self,
        table: &WorkoutTable,
        stem: &str,
        output_dir: &Path,
    ) -> Result<FrameSummary> {
        self.style.validate()?;
        let started = Instant::now();
        let jobs = plan_frames(table, self.settings.horizon_days);

        info!(
            frames = jobs.len(),
            output = %output_dir.display(),
            "Starting frame rendering"
        );

        let progress = self.progress_bar(jobs.len());

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.settings.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build().map_err(|e| {
            RepChartError::Configuration(format!("Failed to create thread pool: {}", e))
        })?;

        let results: Vec<(String, Result<u64>)> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let file_name = job.file_name(stem);
                    let result = self
                        .render(table, *job)
                        .and_then(|figure| write_png(&figure, &output_dir.join(&file_name)));
                    progress.inc(1);
                    (file_name, result)
                })
                .collect()
        });

        progress.finish_with_message("Complete");

        let mut summary = FrameSummary {
            total: jobs.len(),
            written: 0,
            bytes: 0,
            failures: Vec::new(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        for (file_name, result) in results {
            match result {
                Ok(bytes) => {
                    summary.written += 1;
                    summary.bytes += bytes;
                }
                Err(err) => {
                    debug!(frame = %file_name, error = %err, "Frame failed");
                    summary.failures.push(FrameFailure {
                        file_name,
                        error: err.to_string(),
                    });
                }
            }
        }

        if !summary.failures.is_empty() {
            warn!(
                failed = summary.failures.len(),
                total = summary.total,
                "Some frames were not written"
            );
        }
        info!(
            written = summary.written,
            duration_ms = summary.duration_ms,
            "Frame rendering finished"
        );

        Ok(summary)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} frames ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutRecord;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn table(rows: u32, with_duration: bool) -> WorkoutTable {
        let records = (1..=rows)
            .map(|day| WorkoutRecord {
                date: NaiveDate::from_ymd_opt(2020, 4, day).unwrap(),
                sets: vec![day + 4, day + 2],
                sum: 2 * day + 6,
                duration_seconds: with_duration.then_some(600 + day * 30),
            })
            .collect();
        WorkoutTable::new(2, with_duration, records).unwrap()
    }

    #[test]
    fn test_plan_frames() {
        let table = table(3, true);
        let jobs = plan_frames(&table, 5);

        let bars = jobs.iter().filter(|j| matches!(j, FrameJob::Bars { .. })).count();
        let trend = jobs.iter().filter(|j| matches!(j, FrameJob::Trend { .. })).count();
        let duration = jobs.iter().filter(|j| matches!(j, FrameJob::Duration { .. })).count();

        assert_eq!(bars, 6);
        assert_eq!(trend, 4);
        assert_eq!(duration, 2);
        assert_eq!(jobs[0], FrameJob::Bars { day: 1, set: 1 });
        assert_eq!(jobs[5], FrameJob::Bars { day: 3, set: 2 });
    }

    #[test]
    fn test_plan_frames_without_duration() {
        let jobs = plan_frames(&table(2, false), 2);
        assert!(!jobs.iter().any(|j| matches!(j, FrameJob::Duration { .. })));
        assert_eq!(jobs.last(), Some(&FrameJob::Trend { day: 2 }));
    }

    #[test]
    fn test_frame_file_names() {
        assert_eq!(
            FrameJob::Bars { day: 2, set: 3 }.file_name("p"),
            "p_bar_day_2_set_3.png"
        );
        assert_eq!(FrameJob::Trend { day: 9 }.file_name("p"), "p_trend_day_9.png");
        assert_eq!(FrameJob::Duration { day: 4 }.file_name("p"), "p_time_day_4.png");
    }

    #[test]
    fn test_render_all_writes_every_frame() {
        let dir = TempDir::new().unwrap();
        let table = table(3, true);
        let renderer = FrameRenderer::new(
            ChartStyle {
                dpi: 20,
                ..ChartStyle::default()
            },
            TrendSettings::default(),
            FrameSettings {
                horizon_days: 5,
                threads: Some(2),
                show_progress: false,
            },
        );

        let summary = renderer.render_all(&table, "pullups", dir.path()).unwrap();

        assert_eq!(summary.total, 12);
        assert_eq!(summary.written, 12);
        assert!(summary.failures.is_empty());
        assert!(dir.path().join("pullups_trend_day_5.png").exists());
        assert!(dir.path().join("pullups_time_day_3.png").exists());
    }
}
