use super::trend::{render_with_axis, TrendPlot, TrendView, ValueAxis};
use super::{ChartKind, ChartStyle, RenderedFigure};
use crate::error::Result;
use crate::models::WorkoutTable;
use crate::series::SeriesExtractor;
use crate::trend::TrendEstimator;

/// Daily workout time with its trend line; the y axis is in minutes while
/// the series and its fit stay in seconds.
///
/// Fails with `DataUnavailable` when the table carries no workout time.
pub fn render_duration_chart(
    table: &WorkoutTable,
    estimator: &TrendEstimator,
    view: &TrendView,
    style: &ChartStyle,
) -> Result<RenderedFigure> {
    let series = SeriesExtractor::duration_series(table)?.head(view.through_day);
    let fit = estimator.fit(&series)?;

    render_with_axis(
        ChartKind::DurationTrend,
        &[TrendPlot {
            series: &series,
            fit: Some(&fit),
        }],
        view,
        ValueAxis {
            description: "Workout time (min)",
            scale: 1.0 / 60.0,
            from_zero: false,
        },
        style,
    )
}
