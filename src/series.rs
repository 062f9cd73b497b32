//! Named numeric series derived from a workout table
//!
//! Every renderer consumes [`NamedSeries`]; x values are 0-based day indices
//! into the table, so day `i` of the file is plotted at `x = i`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{RepChartError, Result};
use crate::models::WorkoutTable;

/// An x/y sequence with a display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    /// Day index of each point
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Calendar date of each point
    pub dates: Vec<NaiveDate>,
}

impl NamedSeries {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Keep only the points of the first `days` days
    pub fn head(&self, days: usize) -> NamedSeries {
        let keep = self.x.iter().take_while(|&&x| x < days as f64).count();
        NamedSeries {
            name: self.name.clone(),
            x: self.x[..keep].to_vec(),
            y: self.y[..keep].to_vec(),
            dates: self.dates[..keep].to_vec(),
        }
    }
}

/// Derives the charted series from a loaded table
pub struct SeriesExtractor;

impl SeriesExtractor {
    /// Repetitions of the 1-based set `k` for every day
    pub fn set_series(table: &WorkoutTable, k: usize) -> Result<NamedSeries> {
        if k == 0 || k > table.set_count() {
            return Err(RepChartError::DataUnavailable {
                series: format!("Set {}", k),
            });
        }

        Ok(Self::collect(table, format!("Set {}", k), |r| {
            r.set(k).map(f64::from)
        }))
    }

    /// Daily totals exactly as recorded in the Sum column
    pub fn daily_total_series(table: &WorkoutTable) -> NamedSeries {
        Self::collect(table, "Sum".to_string(), |r| Some(f64::from(r.sum)))
    }

    /// Workout time in seconds, skipping days without a recorded time
    pub fn duration_series(table: &WorkoutTable) -> Result<NamedSeries> {
        if !table.has_duration() {
            return Err(RepChartError::DataUnavailable {
                series: "workout time".to_string(),
            });
        }

        let series = Self::collect(table, "Workout time".to_string(), |r| {
            r.duration_seconds.map(f64::from)
        });
        if series.is_empty() {
            return Err(RepChartError::DataUnavailable {
                series: "workout time".to_string(),
            });
        }
        Ok(series)
    }

    /// Series charted on the repetition trend plot: first set and daily total
    pub fn repetition_series(table: &WorkoutTable) -> Vec<NamedSeries> {
        let mut series = Vec::with_capacity(2);
        if let Ok(first) = Self::set_series(table, 1) {
            series.push(first);
        }
        series.push(Self::daily_total_series(table));
        series
    }

    fn collect<F>(table: &WorkoutTable, name: String, value: F) -> NamedSeries
    where
        F: Fn(&crate::models::WorkoutRecord) -> Option<f64>,
    {
        let mut series = NamedSeries {
            name,
            x: Vec::with_capacity(table.len()),
            y: Vec::with_capacity(table.len()),
            dates: Vec::with_capacity(table.len()),
        };

        for (idx, record) in table.records().iter().enumerate() {
            if let Some(y) = value(record) {
                series.x.push(idx as f64);
                series.y.push(y);
                series.dates.push(record.date);
            }
        }

        series
    }
}
