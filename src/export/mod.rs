//! Writing charts and reports to disk
//!
//! Everything here is deterministic: file names depend only on the input
//! stem and the chart, and images are encoded in memory before a single
//! write so a failed chart never leaves a partial file behind.

use std::path::Path;

use crate::render::ChartKind;

pub mod csv;
pub mod json;
pub mod png;

pub use self::csv::{export_predictions, PredictionRow, PredictionTable};
pub use self::json::{export_json, export_run_report};
pub use self::png::{encode_png, write_png};

/// Stem used when the input path has no usable file name
const FALLBACK_STEM: &str = "workouts";

/// File stem of the input, used as the prefix of every output name
pub fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_STEM.to_string())
}

/// `<stem>_<suffix>.png` for the three pipeline charts
pub fn chart_file_name(stem: &str, kind: ChartKind) -> String {
    format!("{}_{}.png", stem, kind.file_suffix())
}

pub fn bar_frame_name(stem: &str, day: usize, set: usize) -> String {
    format!("{}_bar_day_{}_set_{}.png", stem, day, set)
}

pub fn trend_frame_name(stem: &str, day: usize) -> String {
    format!("{}_trend_day_{}.png", stem, day)
}

pub fn duration_frame_name(stem: &str, day: usize) -> String {
    format!("{}_time_day_{}.png", stem, day)
}

pub fn report_file_name(stem: &str) -> String {
    format!("{}_report.json", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_input_stem() {
        assert_eq!(input_stem(&PathBuf::from("data/pullups.csv")), "pullups");
        assert_eq!(input_stem(&PathBuf::from("pushups")), "pushups");
        assert_eq!(input_stem(&PathBuf::from("/")), FALLBACK_STEM);
    }

    #[test]
    fn test_chart_file_names() {
        assert_eq!(chart_file_name("pullups", ChartKind::Bars3d), "pullups_bars3d.png");
        assert_eq!(
            chart_file_name("pullups", ChartKind::RepetitionTrend),
            "pullups_trend.png"
        );
        assert_eq!(
            chart_file_name("pullups", ChartKind::DurationTrend),
            "pullups_duration.png"
        );
    }

    #[test]
    fn test_frame_file_names() {
        assert_eq!(bar_frame_name("p", 3, 2), "p_bar_day_3_set_2.png");
        assert_eq!(trend_frame_name("p", 40), "p_trend_day_40.png");
        assert_eq!(duration_frame_name("p", 7), "p_time_day_7.png");
        assert_eq!(report_file_name("p"), "p_report.json");
    }
}
