use repchart::export::{encode_png, report_file_name};
use repchart::pipeline::PIPELINE_CHARTS;
use repchart::{
    load_table, ChartKind, ChartPipeline, ChartStyle, OutputSettings, ParseError, RepChartError,
    RunReport, SeriesExtractor, TrendEstimator, TrendSettings,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Integration tests that run the complete load, render and write workflow

const FIVE_DAYS: &str = "\"Date\",\"Set 1\",\"Set 2\",\"Set 3\",\"Sum\",\"WorkoutTime\"\n\
4/1/2020,8,6,5,19,0:12:30\n\
4/2/2020,8,7,5,20,0:12:10\n\
4/3/2020,9,7,6,22,0:13:05\n\
4/4/2020,9,8,6,23,0:12:45\n\
4/5/2020,10,8,7,25,0:13:20\n";

const NO_WORKOUT_TIME: &str = "Date,Set 1,Set 2,Set 3,Sum\n\
4/1/2020,8,6,5,19\n\
4/2/2020,8,7,5,20\n\
4/3/2020,9,7,6,22\n";

fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn small_style() -> ChartStyle {
    ChartStyle {
        dpi: 30,
        ..ChartStyle::default()
    }
}

fn pipeline(output: OutputSettings) -> ChartPipeline {
    ChartPipeline::new(small_style(), TrendSettings::default(), output)
}

fn png_files(dir: &Path) -> Vec<PathBuf> {
    let pattern = format!("{}/*.png", dir.display());
    glob::glob(&pattern)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .collect()
}

fn failed_kinds(report: &RunReport) -> Vec<ChartKind> {
    report
        .charts
        .iter()
        .filter(|c| !c.is_written())
        .map(|c| c.kind)
        .collect()
}

#[test]
fn test_end_to_end_writes_three_charts() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "pullups.csv", FIVE_DAYS);
    let output_dir = dir.path().join("Output");

    let report = pipeline(OutputSettings::default())
        .run(&input, &output_dir)
        .unwrap();

    assert_eq!(report.rows, 5);
    assert_eq!(report.set_count, 3);
    assert_eq!(report.failed_count(), 0);

    let files = png_files(&output_dir);
    assert_eq!(files.len(), 3);
    for file in &files {
        assert!(fs::metadata(file).unwrap().len() > 0);
    }

    for name in ["pullups_bars3d.png", "pullups_trend.png", "pullups_duration.png"] {
        assert!(output_dir.join(name).exists(), "{} missing", name);
    }
    assert!(!output_dir.join(report_file_name("pullups")).exists());
}

#[test]
fn test_rendering_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "pullups.csv", FIVE_DAYS);
    let table = load_table(&input).unwrap();
    let pipeline = pipeline(OutputSettings::default());

    let first = pipeline.render_all(&table, "pullups");
    let second = pipeline.render_all(&table, "pullups");

    assert_eq!(first.len(), PIPELINE_CHARTS.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.file_name, b.file_name);
        let a = encode_png(a.figure.as_ref().unwrap()).unwrap();
        let b = encode_png(b.figure.as_ref().unwrap()).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_written_files_are_byte_identical_across_runs() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "pullups.csv", FIVE_DAYS);
    let pipeline = pipeline(OutputSettings::default());

    pipeline.run(&input, &dir.path().join("a")).unwrap();
    pipeline.run(&input, &dir.path().join("b")).unwrap();

    for kind in PIPELINE_CHARTS {
        let name = format!("pullups_{}.png", kind.file_suffix());
        let a = fs::read(dir.path().join("a").join(&name)).unwrap();
        let b = fs::read(dir.path().join("b").join(&name)).unwrap();
        assert_eq!(a, b, "{} differs", name);
    }
}

#[test]
fn test_short_row_aborts_before_any_chart() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        dir.path(),
        "broken.csv",
        "Date,Set 1,Set 2,Set 3,Sum\n4/1/2020,8,6,5,19\n4/2/2020,8,7,15\n",
    );
    let output_dir = dir.path().join("Output");

    let err = pipeline(OutputSettings::default())
        .run(&input, &output_dir)
        .unwrap_err();

    match err {
        RepChartError::Parse(ParseError::FieldCount { line, .. }) => assert_eq!(line, 3),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(png_files(&output_dir).is_empty());
}

#[test]
fn test_missing_input_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = pipeline(OutputSettings::default())
        .run(&dir.path().join("absent.csv"), dir.path())
        .unwrap_err();
    assert!(matches!(err, RepChartError::Io(_)));
    assert!(err.user_message().contains("Could not find"));
}

#[test]
fn test_without_workout_time_the_other_charts_still_run() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "pushups.csv", NO_WORKOUT_TIME);
    let output_dir = dir.path().join("Output");

    let table = load_table(&input).unwrap();
    assert!(matches!(
        SeriesExtractor::duration_series(&table),
        Err(RepChartError::DataUnavailable { .. })
    ));

    let report = pipeline(OutputSettings::default())
        .run(&input, &output_dir)
        .unwrap();

    assert_eq!(report.written_count(), 2);
    assert_eq!(failed_kinds(&report), vec![ChartKind::DurationTrend]);
    assert_eq!(png_files(&output_dir).len(), 2);
}

#[test]
fn test_fail_fast_stops_at_first_chart_error() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "pushups.csv", NO_WORKOUT_TIME);

    let err = pipeline(OutputSettings {
        continue_on_error: false,
        ..OutputSettings::default()
    })
    .run(&input, &dir.path().join("Output"))
    .unwrap_err();

    assert!(matches!(err, RepChartError::DataUnavailable { .. }));
}

#[test]
fn test_manifest_lists_every_chart() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "pushups.csv", NO_WORKOUT_TIME);
    let output_dir = dir.path().join("Output");

    pipeline(OutputSettings {
        manifest: true,
        ..OutputSettings::default()
    })
    .run(&input, &output_dir)
    .unwrap();

    let manifest = fs::read_to_string(output_dir.join("pushups_report.json")).unwrap();
    let report: RunReport = serde_json::from_str(&manifest).unwrap();
    assert_eq!(report.charts.len(), 3);
    assert_eq!(report.written_count(), 2);
    assert!(report.charts[2]
        .error
        .as_deref()
        .unwrap()
        .contains("workout time"));
}

#[test]
fn test_sum_mismatch_is_accepted() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        dir.path(),
        "mismatch.csv",
        "Date,Set 1,Set 2,Sum\n4/1/2020,8,6,99\n4/2/2020,8,7,15\n",
    );

    let table = load_table(&input).unwrap();
    assert_eq!(table.records()[0].sum, 99);
    let totals = SeriesExtractor::daily_total_series(&table);
    assert_eq!(totals.y, vec![99.0, 15.0]);
}

#[test]
fn test_trend_of_first_set_extrapolates() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "pullups.csv", FIVE_DAYS);
    let table = load_table(&input).unwrap();

    let series = SeriesExtractor::set_series(&table, 1).unwrap();
    let fit = TrendEstimator::default().fit(&series).unwrap();

    // 8, 8, 9, 9, 10 over days 0..4
    assert!((fit.coefficients[1] - 0.5).abs() < 1e-9);
    assert!((fit.evaluate(0.0) - 7.8).abs() < 1e-9);
    assert!(fit.evaluate(10.0) > fit.evaluate(4.0));
}

#[test]
fn test_prediction_csv_export() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "pullups.csv", FIVE_DAYS);
    let table = load_table(&input).unwrap();

    let prediction = pipeline(OutputSettings::default())
        .predict(&table, 7)
        .unwrap();
    let csv_path = dir.path().join("prediction.csv");
    repchart::export::export_predictions(&prediction, &csv_path).unwrap();

    let content = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1 + 12);
    assert!(lines[0].starts_with("Day,Date,Set 1 observed,Set 1 fitted"));
    assert!(lines[12].starts_with("12,2020-04-12,,"));
}
