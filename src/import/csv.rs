use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ParseError, RepChartError, Result};
use crate::models::{WorkoutRecord, WorkoutTable};

/// Column positions resolved from the header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    pub date: usize,
    /// Position of `Set k` at index `k - 1`
    pub sets: Vec<usize>,
    pub sum: usize,
    pub workout_time: Option<usize>,
    /// Field count every data row must match
    pub width: usize,
}

impl HeaderLayout {
    /// Resolve column positions from a header row
    pub fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut date = None;
        let mut sum = None;
        let mut workout_time = None;
        let mut numbered_sets: Vec<(usize, usize)> = Vec::new();

        for (pos, name) in headers.iter().enumerate() {
            let normalized = normalize_column_name(name);
            match normalized.as_str() {
                "date" => claim_column(&mut date, pos, "Date")?,
                "sum" | "total" => claim_column(&mut sum, pos, "Sum")?,
                "workouttime" | "duration" => {
                    claim_column(&mut workout_time, pos, "WorkoutTime")?
                }
                other => match other.strip_prefix("set").map(str::parse::<usize>) {
                    Some(Ok(k)) => numbered_sets.push((k, pos)),
                    _ => warn!(column = name, "Ignoring unknown column"),
                },
            }
        }

        let date = date.ok_or_else(|| ParseError::MissingColumn {
            column: "Date".to_string(),
        })?;
        let sum = sum.ok_or_else(|| ParseError::MissingColumn {
            column: "Sum".to_string(),
        })?;

        numbered_sets.sort_unstable();
        for (expected, (k, _)) in (1..).zip(numbered_sets.iter()) {
            if *k != expected {
                return Err(ParseError::InvalidSetColumns {
                    reason: format!("expected Set {} but found Set {}", expected, k),
                }
                .into());
            }
        }

        Ok(Self {
            date,
            sets: numbered_sets.into_iter().map(|(_, pos)| pos).collect(),
            sum,
            workout_time,
            width: headers.len(),
        })
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }
}

/// Record `pos` as the position of `column`, which may appear only once
fn claim_column(slot: &mut Option<usize>, pos: usize, column: &str) -> Result<()> {
    if slot.replace(pos).is_some() {
        return Err(ParseError::DuplicateColumn {
            column: column.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Loader for workout CSV files of the form
/// `Date, Set 1 .. Set N, Sum[, WorkoutTime]`
#[derive(Debug, Default)]
pub struct CsvLoader;

impl CsvLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a workout table from a file path
    pub fn load_file(&self, file_path: &Path) -> Result<WorkoutTable> {
        let file = std::fs::File::open(file_path)?;
        let table = self.load_reader(file)?;
        info!(
            file = %file_path.display(),
            rows = table.len(),
            sets = table.set_count(),
            duration = table.has_duration(),
            "Loaded workout records"
        );
        Ok(table)
    }

    /// Load a workout table from any CSV source
    pub fn load_reader<R: Read>(&self, source: R) -> Result<WorkoutTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let layout = HeaderLayout::from_headers(&headers)?;

        let mut records = Vec::new();
        let mut previous_date: Option<NaiveDate> = None;

        for result in reader.records() {
            let row = result?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let record = Self::parse_row(&layout, &row, line)?;

            if let Some(prev) = previous_date {
                if record.date < prev {
                    warn!(line, date = %record.date, "Rows are not in date order");
                }
            }
            if record.sets_total() != record.sum {
                debug!(
                    line,
                    sum = record.sum,
                    sets_total = record.sets_total(),
                    "Recorded sum differs from set total"
                );
            }

            previous_date = Some(record.date);
            records.push(record);
        }

        WorkoutTable::new(layout.set_count(), layout.workout_time.is_some(), records)
    }

    fn parse_row(layout: &HeaderLayout, row: &StringRecord, line: u64) -> Result<WorkoutRecord> {
        if row.len() != layout.width {
            return Err(ParseError::FieldCount {
                line,
                expected: layout.width,
                found: row.len(),
            }
            .into());
        }

        let field = |pos: usize| row.get(pos).unwrap_or("");

        let date = parse_date(field(layout.date)).ok_or_else(|| ParseError::InvalidDate {
            line,
            value: field(layout.date).to_string(),
        })?;

        let sets = layout
            .sets
            .iter()
            .enumerate()
            .map(|(i, &pos)| parse_count(field(pos), &format!("Set {}", i + 1), line))
            .collect::<Result<Vec<u32>>>()?;

        let sum = parse_count(field(layout.sum), "Sum", line)?;

        let duration_seconds = match layout.workout_time.map(field) {
            Some(value) if !value.is_empty() => Some(parse_workout_time(value).ok_or_else(|| {
                ParseError::InvalidDuration {
                    line,
                    value: value.to_string(),
                }
            })?),
            _ => None,
        };

        Ok(WorkoutRecord {
            date,
            sets,
            sum,
            duration_seconds,
        })
    }
}

fn normalize_column_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect()
}

fn parse_count(value: &str, column: &str, line: u64) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        RepChartError::Parse(ParseError::InvalidNumber {
            line,
            column: column.to_string(),
            value: value.to_string(),
        })
    })
}

/// Parse a calendar date in any of the accepted formats
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    // Month-first dates take precedence over day-first ones
    let formats = ["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value.trim(), format).ok())
}

/// Parse an `h:mm:ss` elapsed time into seconds
///
/// Hours may exceed 23; minutes and seconds are exactly two digits below 60.
pub fn parse_workout_time(value: &str) -> Option<u32> {
    let mut parts = value.trim().split(':');
    let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !digits(h) || !digits(m) || !digits(s) || m.len() != 2 || s.len() != 2 {
        return None;
    }

    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    let seconds: u32 = s.parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)
}

/// Format seconds as `h:mm:ss`, the inverse of [`parse_workout_time`]
pub fn format_workout_time(seconds: u32) -> String {
    format!("{}:{:02}:{:02}", seconds / 3600, seconds / 60 % 60, seconds % 60)
}
