use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{day_title, integer_label, rasterize, ChartKind, ChartStyle, DrawResult, RenderedFigure, PALETTE};
use crate::error::{RepChartError, Result};
use crate::models::WorkoutTable;

/// Set slots always shown on the single-day chart
const MIN_SET_SLOTS: usize = 5;

/// Older days fade out by this much per day, down to `MIN_ALPHA`
const ALPHA_STEP: f64 = 0.1;
const MIN_ALPHA: f64 = 0.3;

/// How much of the table a bar chart shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarView {
    /// Number of leading days shown
    pub days: usize,
    /// Sets of the last shown day that are already done
    pub sets_in_last_day: usize,
}

impl BarView {
    /// Every day and every set
    pub fn full(table: &WorkoutTable) -> Self {
        Self {
            days: table.len(),
            sets_in_last_day: table.set_count(),
        }
    }
}

/// Repetitions per (day, set), one bar each; day runs into depth with the
/// latest day in front.
pub fn render_bar_chart(
    table: &WorkoutTable,
    view: &BarView,
    style: &ChartStyle,
) -> Result<RenderedFigure> {
    if table.is_empty() {
        return Err(RepChartError::empty(ChartKind::Bars3d.to_string(), "the table has no rows"));
    }
    if table.set_count() == 0 {
        return Err(RepChartError::empty(ChartKind::Bars3d.to_string(), "the table has no set columns"));
    }
    if view.days == 0 || view.sets_in_last_day == 0 {
        return Err(RepChartError::empty(ChartKind::Bars3d.to_string(), "the view selects no bars"));
    }

    let days = view.days.min(table.len());
    let visible = view.sets_in_last_day.min(table.set_count());
    let grid = bar_heights(table, days, visible);
    let title = day_title(table, days);

    rasterize(
        ChartKind::Bars3d,
        style.pixels(style.bar_figure_inches),
        |root| {
            if days == 1 {
                draw_single_day(root, &grid[0], visible, &title, style)
            } else {
                draw_history(root, &grid, visible, &title, style)
            }
        },
    )
}

/// Bar heights of the first `days` rows; sets past `visible` on the last
/// day are still to come and stay at zero.
fn bar_heights(table: &WorkoutTable, days: usize, visible: usize) -> Vec<Vec<u32>> {
    table
        .records()
        .iter()
        .take(days)
        .enumerate()
        .map(|(idx, record)| {
            let mut row = record.sets.clone();
            if idx + 1 == days {
                row.iter_mut().skip(visible).for_each(|reps| *reps = 0);
            }
            row
        })
        .collect()
}

/// Opacity of the bars `days_back` days before the latest one
fn fade_alpha(days_back: usize) -> f64 {
    (1.0 - days_back as f64 * ALPHA_STEP).max(MIN_ALPHA)
}

fn draw_history<DB>(
    root: DrawingArea<DB, Shift>,
    grid: &[Vec<u32>],
    visible: usize,
    title: &str,
    style: &ChartStyle,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&style.background())?;

    let days = grid.len();
    let sets = grid[0].len();
    let y_max = grid.iter().flatten().copied().max().unwrap_or(0).max(1) as f64 * 1.15;

    let (width, height) = root.dim_in_pixel();
    root.draw(&Text::new(
        "x: set   z: days ago   height: repetitions",
        (width as i32 / 2, height as i32 - style.px(style.label_size) as i32),
        style
            .font(style.label_size * 0.7)
            .pos(Pos::new(HPos::Center, VPos::Bottom)),
    ))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, style.font(style.title_size))
        .margin(style.px(8.0) as u32)
        .build_cartesian_3d(
            0.5..(sets as f64 + 0.5),
            0.0..y_max,
            -0.5..(days as f64 - 0.5),
        )?;

    chart.with_projection(|mut pb| {
        pb.pitch = style.camera.pitch;
        pb.yaw = style.camera.yaw;
        pb.scale = style.camera.scale;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .label_style(style.font(style.tick_size))
        .bold_grid_style(style.foreground().mix(0.25))
        .light_grid_style(style.foreground().mix(0.08))
        .axis_panel_style(style.foreground().mix(0.04))
        .max_light_lines(2)
        .x_labels(sets.min(10))
        .z_labels(days.min(5))
        .x_formatter(&integer_label)
        .y_formatter(&integer_label)
        .z_formatter(&integer_label)
        .draw()?;

    // Oldest day first so the latest bars are painted over the history
    for (idx, row) in grid.iter().enumerate() {
        let days_back = days - 1 - idx;
        let z = days_back as f64;
        let alpha = fade_alpha(days_back);
        let color = PALETTE[idx % PALETTE.len()];
        let edge = style.foreground().mix(alpha * 0.5);

        chart.draw_series(
            row.iter()
                .enumerate()
                .filter(|(_, reps)| **reps > 0)
                .map(|(set_idx, &reps)| {
                    let x = set_idx as f64 + 1.0;
                    Cubiod::new(
                        [(x - 0.4, 0.0, z - 0.35), (x + 0.4, reps as f64, z + 0.35)],
                        color.mix(alpha).filled(),
                        edge,
                    )
                }),
        )?;
    }

    let label_style = style
        .font(style.tick_size)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(
        grid[days - 1]
            .iter()
            .take(visible)
            .enumerate()
            .filter(|(_, reps)| **reps > 0)
            .map(|(set_idx, &reps)| {
                Text::new(
                    reps.to_string(),
                    (set_idx as f64 + 1.0, reps as f64 + y_max * 0.02, 0.0),
                    label_style.clone(),
                )
            }),
    )?;

    root.present()?;
    Ok(())
}

/// With only one day there is no history axis, so draw plain 2D bars
fn draw_single_day<DB>(
    root: DrawingArea<DB, Shift>,
    row: &[u32],
    visible: usize,
    title: &str,
    style: &ChartStyle,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&style.background())?;

    let slots = row.len().max(MIN_SET_SLOTS);
    let y_max = row.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.2;
    let fg = style.foreground();

    let mut chart = ChartBuilder::on(&root)
        .caption(title, style.font(style.title_size))
        .margin(style.px(8.0) as u32)
        .x_label_area_size(style.px(style.label_size * 2.0) as u32)
        .y_label_area_size(style.px(style.label_size * 2.5) as u32)
        .build_cartesian_2d(0.5..(slots as f64 + 0.5), 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Set")
        .y_desc("Repetitions")
        .axis_desc_style(style.font(style.label_size))
        .label_style(style.font(style.tick_size))
        .x_labels(slots)
        .x_label_formatter(&integer_label)
        .y_label_formatter(&integer_label)
        .bold_line_style(fg.mix(0.3))
        .light_line_style(fg.mix(0.1))
        .axis_style(fg)
        .draw()?;

    let color = PALETTE[0];
    chart.draw_series(row.iter().take(visible).enumerate().map(|(idx, &reps)| {
        let x = idx as f64 + 1.0;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, reps as f64)], color.mix(0.8).filled())
    }))?;

    let label_style = style
        .font(style.tick_size)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(
        row.iter()
            .take(visible)
            .enumerate()
            .filter(|(_, reps)| **reps > 0)
            .map(|(idx, &reps)| {
                Text::new(
                    reps.to_string(),
                    (idx as f64 + 1.0, reps as f64),
                    label_style.clone(),
                )
            }),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutRecord;
    use chrono::NaiveDate;

    fn table(rows: u32, sets: usize) -> WorkoutTable {
        let records = (1..=rows)
            .map(|day| {
                let values: Vec<u32> = (0..sets as u32).map(|s| day + 6 - s).collect();
                WorkoutRecord {
                    date: NaiveDate::from_ymd_opt(2020, 4, day).unwrap(),
                    sum: values.iter().sum(),
                    sets: values,
                    duration_seconds: None,
                }
            })
            .collect();
        WorkoutTable::new(sets, false, records).unwrap()
    }

    fn small_style() -> ChartStyle {
        ChartStyle {
            dpi: 20,
            ..ChartStyle::default()
        }
    }

    #[test]
    fn test_fade_alpha() {
        assert!((fade_alpha(0) - 1.0).abs() < 1e-9);
        assert!((fade_alpha(3) - 0.7).abs() < 1e-9);
        assert!((fade_alpha(20) - MIN_ALPHA).abs() < 1e-9);
    }

    #[test]
    fn test_bar_heights_hide_future_sets() {
        let table = table(3, 3);
        let grid = bar_heights(&table, 2, 1);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0], vec![7, 6, 5]);
        assert_eq!(grid[1], vec![8, 0, 0]);
    }

    #[test]
    fn test_render_full_history() {
        let table = table(4, 3);
        let style = small_style();
        let figure = render_bar_chart(&table, &BarView::full(&table), &style).unwrap();
        assert_eq!(figure.kind(), ChartKind::Bars3d);
        assert_eq!((figure.width(), figure.height()), (180, 320));
    }

    #[test]
    fn test_render_single_day() {
        let table = table(1, 2);
        let figure = render_bar_chart(&table, &BarView::full(&table), &small_style()).unwrap();
        assert_eq!(figure.pixels().len(), 180 * 320 * 3);
    }

    #[test]
    fn test_empty_tables_are_rejected() {
        let empty = WorkoutTable::new(3, false, Vec::new()).unwrap();
        let err = render_bar_chart(&empty, &BarView::full(&empty), &small_style()).unwrap_err();
        assert!(matches!(err, RepChartError::EmptyInput { .. }));

        let no_sets = table(2, 0);
        let err = render_bar_chart(&no_sets, &BarView::full(&no_sets), &small_style()).unwrap_err();
        assert!(matches!(err, RepChartError::EmptyInput { .. }));
    }
}
