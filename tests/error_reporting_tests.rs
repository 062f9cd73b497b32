//! Integration tests for error reporting and logging
//!
//! Loader failures must carry enough context (line, column, value) for a
//! user to fix the file, and chart-local failures must map to warnings.

use repchart::logging::{init_logging, log_error, LogConfig, LogFormat, LogLevel};
use repchart::{CsvLoader, ErrorSeverity, ParseError, RepChartError};
use std::fs;
use tempfile::TempDir;

fn load(content: &str) -> Result<repchart::WorkoutTable, RepChartError> {
    CsvLoader::new().load_reader(content.as_bytes())
}

#[test]
fn test_missing_date_column() {
    let err = load("Set 1,Sum\n5,5\n").unwrap_err();
    match err {
        RepChartError::Parse(ParseError::MissingColumn { column }) => assert_eq!(column, "Date"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_invalid_date_reports_line_and_value() {
    let err = load("Date,Set 1,Sum\n4/1/2020,5,5\nyesterday,6,6\n").unwrap_err();
    match &err {
        RepChartError::Parse(ParseError::InvalidDate { line, value }) => {
            assert_eq!(*line, 3);
            assert_eq!(value, "yesterday");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.severity(), ErrorSeverity::Error);
    assert!(!err.is_chart_local());
}

#[test]
fn test_invalid_number_names_the_column() {
    let err = load("Date,Set 1,Set 2,Sum\n4/1/2020,5,five,10\n").unwrap_err();
    match err {
        RepChartError::Parse(ParseError::InvalidNumber { line, column, value }) => {
            assert_eq!(line, 2);
            assert_eq!(column, "Set 2");
            assert_eq!(value, "five");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_invalid_workout_time() {
    let err = load("Date,Set 1,Sum,WorkoutTime\n4/1/2020,5,5,12 minutes\n").unwrap_err();
    assert!(matches!(
        err,
        RepChartError::Parse(ParseError::InvalidDuration { line: 2, .. })
    ));
}

#[test]
fn test_field_count_user_message() {
    let err = load("Date,Set 1,Set 2,Sum\n4/1/2020,5,10\n").unwrap_err();
    let message = err.user_message();
    assert!(message.contains("line 2"), "{}", message);
    assert!(message.contains("3 fields"), "{}", message);
}

#[test]
fn test_chart_errors_are_warnings() {
    let err = RepChartError::DataUnavailable {
        series: "workout time".to_string(),
    };
    assert!(err.is_chart_local());
    assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);
    assert!(err.user_message().contains("workout time"));
}

#[test]
fn test_file_logging_writes_json_lines() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("logs").join("repchart.log");

    init_logging(&LogConfig {
        level: LogLevel::Warn,
        format: LogFormat::Compact,
        file_path: Some(log_path.clone()),
        rotation: false,
        include_spans: false,
    })
    .unwrap();

    log_error(
        "workout time trend chart",
        &RepChartError::DataUnavailable {
            series: "workout time".to_string(),
        },
    );

    let content = fs::read_to_string(&log_path).unwrap();
    let line = content
        .lines()
        .find(|l| l.contains("workout time trend chart"))
        .expect("warning was not logged");
    let entry: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(entry["level"], "WARN");
    assert_eq!(entry["fields"]["chart_local"], true);

    log_error(
        "bars3d chart",
        &RepChartError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only output",
        )),
    );

    let content = fs::read_to_string(&log_path).unwrap();
    let line = content
        .lines()
        .find(|l| l.contains("bars3d chart"))
        .expect("write failure was not logged");
    let entry: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(entry["level"], "ERROR");
    assert_eq!(entry["fields"]["chart_local"], false);
    assert_eq!(entry["fields"]["critical"], false);
}
