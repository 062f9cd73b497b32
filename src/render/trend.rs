use plotters::coord::Shift;
use plotters::prelude::*;

use super::{day_title, integer_label, rasterize, ChartKind, ChartStyle, DrawResult, RenderedFigure, PALETTE};
use crate::error::{RepChartError, Result};
use crate::models::WorkoutTable;
use crate::series::{NamedSeries, SeriesExtractor};
use crate::trend::{TrendEstimator, TrendFit};

/// Points of the fitted curve drawn per line segment
const CURVE_STEPS: usize = 64;

/// One raw series and its optional fitted curve
#[derive(Debug, Clone, Copy)]
pub struct TrendPlot<'a> {
    pub series: &'a NamedSeries,
    pub fit: Option<&'a TrendFit>,
}

/// Horizontal extent and framing of a trend chart
#[derive(Debug, Clone, PartialEq)]
pub struct TrendView {
    /// Last day (1-based) whose data is shown
    pub through_day: usize,
    /// Extra days the trend line runs past `through_day`
    pub extrapolation_days: f64,
    /// The shown day lies past the data, so the whole curve is a prediction
    pub prediction: bool,
    /// Use the wide figure size
    pub wide: bool,
    pub title: String,
}

impl TrendView {
    pub fn for_table(table: &WorkoutTable, through_day: usize, extrapolation_days: f64) -> Self {
        Self {
            through_day,
            extrapolation_days: extrapolation_days.max(0.0),
            prediction: through_day > table.len(),
            wide: false,
            title: day_title(table, through_day),
        }
    }

    pub fn wide(mut self, wide: bool) -> Self {
        self.wide = wide;
        self
    }

    /// x of the last shown day
    fn last_x(&self) -> f64 {
        self.through_day.saturating_sub(1) as f64
    }
}

/// Y axis description plus a factor applied to every y value before drawing
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueAxis<'a> {
    pub description: &'a str,
    pub scale: f64,
    /// Anchor the axis at zero instead of the smallest value
    pub from_zero: bool,
}

/// Raw series as markers with their trend lines
pub fn render_trend_chart(
    kind: ChartKind,
    plots: &[TrendPlot<'_>],
    view: &TrendView,
    style: &ChartStyle,
) -> Result<RenderedFigure> {
    render_with_axis(
        kind,
        plots,
        view,
        ValueAxis {
            description: "Repetitions",
            scale: 1.0,
            from_zero: true,
        },
        style,
    )
}

pub(crate) fn render_with_axis(
    kind: ChartKind,
    plots: &[TrendPlot<'_>],
    view: &TrendView,
    axis: ValueAxis<'_>,
    style: &ChartStyle,
) -> Result<RenderedFigure> {
    if plots.is_empty() || plots.iter().all(|p| p.series.is_empty()) {
        return Err(RepChartError::empty(kind.to_string(), "no series to plot"));
    }

    let size = if view.wide {
        style.wide_figure_inches
    } else {
        style.trend_figure_inches
    };

    rasterize(kind, style.pixels(size), |root| {
        draw_trend_figure(root, plots, view, axis, style)
    })
}

/// First-set and daily-total repetitions with their trend lines, using the
/// rows up to `view.through_day`
pub fn render_repetition_chart(
    table: &WorkoutTable,
    estimator: &TrendEstimator,
    view: &TrendView,
    style: &ChartStyle,
) -> Result<RenderedFigure> {
    let series: Vec<NamedSeries> = SeriesExtractor::repetition_series(table)
        .iter()
        .map(|s| s.head(view.through_day))
        .collect();
    let fits = series
        .iter()
        .map(|s| estimator.fit(s))
        .collect::<Result<Vec<TrendFit>>>()?;

    let plots: Vec<TrendPlot<'_>> = series
        .iter()
        .zip(fits.iter())
        .map(|(series, fit)| TrendPlot {
            series,
            fit: Some(fit),
        })
        .collect();

    render_trend_chart(ChartKind::RepetitionTrend, &plots, view, style)
}

fn draw_trend_figure<DB>(
    root: DrawingArea<DB, Shift>,
    plots: &[TrendPlot<'_>],
    view: &TrendView,
    axis: ValueAxis<'_>,
    style: &ChartStyle,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&style.background())?;

    let last_x = view.last_x();
    let x_end = last_x + view.extrapolation_days;
    let visible = |series: &NamedSeries| visible_points(series, last_x, axis.scale);
    let y_range = value_range(plots, last_x, x_end, axis);
    let fg = style.foreground();

    let mut chart = ChartBuilder::on(&root)
        .caption(&view.title, style.font(style.title_size))
        .margin(style.px(8.0) as u32)
        .x_label_area_size(style.px(style.label_size * 2.0) as u32)
        .y_label_area_size(style.px(style.label_size * 2.5) as u32)
        .build_cartesian_2d(-0.5..(x_end.max(1.0) + 0.5), y_range)?;

    chart
        .configure_mesh()
        .x_desc("Day")
        .y_desc(axis.description)
        .axis_desc_style(style.font(style.label_size))
        .label_style(style.font(style.tick_size))
        .x_labels(8)
        .y_labels(6)
        .x_label_formatter(&day_label)
        .y_label_formatter(&integer_label)
        .bold_line_style(fg.mix(0.2))
        .light_line_style(fg.mix(0.05))
        .axis_style(fg)
        .draw()?;

    let line_width = if view.prediction {
        style.stroke(style.prediction_line_width)
    } else {
        style.stroke(style.line_width)
    };
    let prediction_width = style.stroke(style.prediction_line_width);
    let marker = style.stroke(style.marker_size);

    for (idx, plot) in plots.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        let scale = axis.scale;

        if let Some(fit) = plot.fit {
            let observed_end = fit.x_max.min(x_end);
            chart
                .draw_series(LineSeries::new(
                    fit.sample(0.0, observed_end, CURVE_STEPS)
                        .into_iter()
                        .map(|(x, y)| (x, y * scale)),
                    color.stroke_width(line_width),
                ))?
                .label(format!("{} trend", plot.series.name))
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 24, y)], color.stroke_width(line_width))
                });

            if x_end > observed_end {
                chart.draw_series(LineSeries::new(
                    fit.sample(observed_end, x_end, CURVE_STEPS)
                        .into_iter()
                        .map(|(x, y)| (x, y * scale)),
                    color.mix(0.55).stroke_width(prediction_width),
                ))?;
            }
        }

        chart
            .draw_series(
                visible(plot.series)
                    .into_iter()
                    .map(|point| Circle::new(point, marker, color.filled())),
            )?
            .label(plot.series.name.clone())
            .legend(move |(x, y)| Circle::new((x + 12, y), marker, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(style.background().mix(0.8))
        .border_style(fg.mix(0.4))
        .label_font(style.font(style.tick_size))
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Points up to `last_x`, with y scaled for drawing
fn visible_points(series: &NamedSeries, last_x: f64, scale: f64) -> Vec<(f64, f64)> {
    series
        .points()
        .filter(|(x, _)| *x <= last_x)
        .map(|(x, y)| (x, y * scale))
        .collect()
}

/// Padded y range covering the visible points and the sampled curves
///
/// A zero-anchored axis never starts above 0; otherwise the range hugs the
/// data.
fn value_range(
    plots: &[TrendPlot<'_>],
    last_x: f64,
    x_end: f64,
    axis: ValueAxis<'_>,
) -> std::ops::Range<f64> {
    let mut values: Vec<f64> = Vec::new();
    for plot in plots {
        values.extend(
            visible_points(plot.series, last_x, axis.scale)
                .into_iter()
                .map(|(_, y)| y),
        );
        if let Some(fit) = plot.fit {
            values.extend(
                fit.sample(0.0, x_end, CURVE_STEPS)
                    .into_iter()
                    .map(|(_, y)| y * axis.scale),
            );
        }
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }

    if axis.from_zero {
        let (lo, hi) = (lo.min(0.0), hi.max(1.0));
        let pad = (hi - lo) * 0.1;
        (lo - pad.min(lo.abs()))..(hi + pad)
    } else {
        let pad = ((hi - lo) * 0.1).max(0.5);
        (lo - pad)..(hi + pad)
    }
}

/// Ticks show 1-based day numbers
fn day_label(x: &f64) -> String {
    integer_label(&(x + 1.0))
}
