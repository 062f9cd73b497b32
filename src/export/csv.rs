use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Observed and fitted values per series for a run of days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionTable {
    pub series: Vec<String>,
    pub rows: Vec<PredictionRow>,
}

/// One day of a [`PredictionTable`]; `observed` and `fitted` line up with
/// `PredictionTable::series`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    /// 1-based day number
    pub day: usize,
    pub date: Option<NaiveDate>,
    pub observed: Vec<Option<f64>>,
    pub fitted: Vec<f64>,
}

impl PredictionRow {
    /// Day lies past the recorded data
    pub fn is_projected(&self) -> bool {
        self.observed.iter().all(Option::is_none)
    }
}

/// Write the prediction table as CSV: `Day,Date` then an observed and a
/// fitted column per series. Missing observations stay empty.
pub fn write_predictions<W: Write>(table: &PredictionTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["Day".to_string(), "Date".to_string()];
    for name in &table.series {
        header.push(format!("{} observed", name));
        header.push(format!("{} fitted", name));
    }
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut fields = vec![
            row.day.to_string(),
            row.date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        ];
        for (observed, fitted) in row.observed.iter().zip(row.fitted.iter()) {
            fields.push(observed.map(|v| v.to_string()).unwrap_or_default());
            fields.push(format!("{:.2}", fitted));
        }
        wtr.write_record(&fields)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the prediction table to a CSV file
pub fn export_predictions<P: AsRef<Path>>(table: &PredictionTable, output_path: P) -> Result<()> {
    let mut buffer = Vec::new();
    write_predictions(table, &mut buffer)?;
    fs::write(output_path, buffer)?;
    Ok(())
}
