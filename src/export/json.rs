use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{RepChartError, Result};
use crate::pipeline::RunReport;

/// Export any serializable value as pretty-printed JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let json_data = serde_json::to_string_pretty(data)
        .map_err(|e| RepChartError::Encode(format!("JSON: {}", e)))?;

    if let Some(parent) = output_path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, json_data)?;

    Ok(())
}

/// Write the manifest of a pipeline run
pub fn export_run_report<P: AsRef<Path>>(report: &RunReport, output_path: P) -> Result<()> {
    export_json(report, output_path.as_ref())?;
    info!(
        path = %output_path.as_ref().display(),
        charts = report.charts.len(),
        failed = report.failed_count(),
        "Run report written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ChartOutcome;
    use crate::render::ChartKind;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_export_run_report() {
        let report = RunReport {
            input: PathBuf::from("pullups.csv"),
            output_dir: PathBuf::from("Output"),
            rows: 5,
            set_count: 3,
            charts: vec![
                ChartOutcome {
                    kind: ChartKind::Bars3d,
                    path: Some(PathBuf::from("Output/pullups_bars3d.png")),
                    bytes: 1234,
                    duration_ms: 12,
                    error: None,
                },
                ChartOutcome {
                    kind: ChartKind::DurationTrend,
                    path: None,
                    bytes: 0,
                    duration_ms: 0,
                    error: Some("Data unavailable: Workout time".to_string()),
                },
            ],
        };

        let temp_file = NamedTempFile::new().unwrap();
        export_run_report(&report, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"rows\": 5"));
        assert!(content.contains("\"kind\": \"bars3d\""));
        assert!(content.contains("\"kind\": \"duration_trend\""));
        assert!(content.contains("Data unavailable: Workout time"));
    }

    #[test]
    fn test_export_json_generic() {
        #[derive(serde::Serialize)]
        struct TestData {
            name: String,
            value: u32,
        }

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        let temp_file = NamedTempFile::new().unwrap();
        export_json(&data, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"name\": \"test\""));
        assert!(content.contains("\"value\": 42"));
    }
}
