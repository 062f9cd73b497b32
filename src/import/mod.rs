use std::path::Path;

use crate::error::Result;
use crate::models::WorkoutTable;

pub mod csv;

pub use self::csv::{format_workout_time, parse_date, parse_workout_time, CsvLoader, HeaderLayout};

/// Load a workout CSV file into a validated table
pub fn load_table(file_path: &Path) -> Result<WorkoutTable> {
    CsvLoader::new().load_file(file_path)
}
