use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{RepChartError, Result};

/// One day of training: the repetitions of every set plus the recorded total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Calendar date of the session
    pub date: NaiveDate,

    /// Repetition count of each set, in set order
    pub sets: Vec<u32>,

    /// Daily total as written in the file (not recomputed)
    pub sum: u32,

    /// Elapsed session time in seconds, when recorded
    pub duration_seconds: Option<u32>,
}

impl WorkoutRecord {
    /// Repetitions of the 1-based set `k`
    pub fn set(&self, k: usize) -> Option<u32> {
        k.checked_sub(1).and_then(|i| self.sets.get(i).copied())
    }

    /// Sum of the per-set values, which may differ from `sum`
    pub fn sets_total(&self) -> u32 {
        self.sets.iter().sum()
    }
}

/// All records of one workout file, in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTable {
    set_count: usize,
    has_duration: bool,
    records: Vec<WorkoutRecord>,
}

impl WorkoutTable {
    /// Build a table, checking every record carries exactly `set_count` sets
    pub fn new(set_count: usize, has_duration: bool, records: Vec<WorkoutRecord>) -> Result<Self> {
        if let Some((idx, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.sets.len() != set_count)
        {
            return Err(RepChartError::UnevenRecord {
                record: idx + 1,
                expected: set_count,
                found: record.sets.len(),
            });
        }

        Ok(Self {
            set_count,
            has_duration,
            records,
        })
    }

    pub fn set_count(&self) -> usize {
        self.set_count
    }

    /// Whether the source file had a workout time column
    pub fn has_duration(&self) -> bool {
        self.has_duration
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Date of the 1-based day `day`, projected past the last record
    pub fn date_of_day(&self, day: usize) -> Option<NaiveDate> {
        let idx = day.checked_sub(1)?;
        if let Some(record) = self.records.get(idx) {
            return Some(record.date);
        }
        let last = self.last_date()?;
        let ahead = (idx + 1 - self.records.len()) as u64;
        last.checked_add_days(chrono::Days::new(ahead))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, sets: Vec<u32>) -> WorkoutRecord {
        let sum = sets.iter().sum();
        WorkoutRecord {
            date: NaiveDate::from_ymd_opt(2020, 4, day).unwrap(),
            sets,
            sum,
            duration_seconds: None,
        }
    }

    #[test]
    fn test_table_rejects_uneven_sets() {
        let records = vec![record(1, vec![5, 4, 3]), record(2, vec![6, 5])];
        let err = WorkoutTable::new(3, false, records).unwrap_err();
        assert!(matches!(
            err,
            RepChartError::UnevenRecord {
                record: 2,
                expected: 3,
                found: 2
            }
        ));
        assert!(!err.to_string().contains("Line"));
    }

    #[test]
    fn test_set_lookup_is_one_based() {
        let r = record(1, vec![8, 6, 5]);
        assert_eq!(r.set(1), Some(8));
        assert_eq!(r.set(3), Some(5));
        assert_eq!(r.set(0), None);
        assert_eq!(r.set(4), None);
        assert_eq!(r.sets_total(), 19);
    }

    #[test]
    fn test_date_of_day_projects_forward() {
        let table =
            WorkoutTable::new(2, false, vec![record(1, vec![3, 2]), record(2, vec![4, 3])]).unwrap();
        assert_eq!(table.date_of_day(2), NaiveDate::from_ymd_opt(2020, 4, 2));
        assert_eq!(table.date_of_day(5), NaiveDate::from_ymd_opt(2020, 4, 5));
        assert_eq!(table.date_of_day(0), None);
    }
}
