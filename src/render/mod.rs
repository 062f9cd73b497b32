//! Chart rendering into in-memory raster figures
//!
//! Renderers never touch the filesystem. Each one draws with `plotters` into a
//! pixel buffer and hands back a [`RenderedFigure`]; the export module decides
//! where and how it is written.

use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RepChartError, Result};
use crate::models::WorkoutTable;

pub mod backend;
pub mod bars;
pub mod duration;
pub mod trend;

pub use backend::TextSafeBackend;
pub use bars::{render_bar_chart, BarView};
pub use duration::render_duration_chart;
pub use trend::{render_repetition_chart, render_trend_chart, TrendPlot, TrendView};

/// Outcome of a drawing closure; plotters errors are boxed at this seam
pub(crate) type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// MATLAB's default line colours, cycled per series and per day
pub const PALETTE: [RGBColor; 7] = [
    RGBColor(0, 114, 189),
    RGBColor(217, 83, 25),
    RGBColor(237, 177, 32),
    RGBColor(126, 47, 142),
    RGBColor(119, 172, 48),
    RGBColor(77, 190, 238),
    RGBColor(162, 20, 47),
];

/// Chart categories produced by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bars3d,
    RepetitionTrend,
    DurationTrend,
}

impl ChartKind {
    /// Suffix used in output file names
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ChartKind::Bars3d => "bars3d",
            ChartKind::RepetitionTrend => "trend",
            ChartKind::DurationTrend => "duration",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Bars3d => write!(f, "3D bar chart"),
            ChartKind::RepetitionTrend => write!(f, "repetition trend chart"),
            ChartKind::DurationTrend => write!(f, "workout time trend chart"),
        }
    }
}

/// Light or dark chart background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Normal,
    /// White ink on black, for dark slides and videos
    Inverted,
}

impl std::str::FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" | "light" => Ok(ColorScheme::Normal),
            "inverted" | "dark" => Ok(ColorScheme::Inverted),
            _ => Err(format!("Invalid color scheme: {}", s)),
        }
    }
}

/// Camera angles of the 3D bar chart, in radians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraView {
    pub pitch: f64,
    pub yaw: f64,
    pub scale: f64,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            pitch: 0.35,
            yaw: 0.6,
            scale: 0.8,
        }
    }
}

/// Visual settings shared by every renderer
///
/// Sizes follow print conventions: figures in inches, text and lines in
/// points, converted to pixels through `dpi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub dpi: u32,
    pub bar_figure_inches: (f64, f64),
    pub trend_figure_inches: (f64, f64),
    /// Used by prediction frames
    pub wide_figure_inches: (f64, f64),
    pub color_scheme: ColorScheme,
    pub font_family: String,
    pub label_size: f64,
    pub title_size: f64,
    pub tick_size: f64,
    pub line_width: f64,
    pub prediction_line_width: f64,
    pub marker_size: f64,
    pub camera: CameraView,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            dpi: 100,
            bar_figure_inches: (9.0, 16.0),
            trend_figure_inches: (9.0, 8.0),
            wide_figure_inches: (16.0, 9.0),
            color_scheme: ColorScheme::Normal,
            font_family: "sans-serif".to_string(),
            label_size: 30.0,
            title_size: 40.0,
            tick_size: 30.0,
            line_width: 5.0,
            prediction_line_width: 3.0,
            marker_size: 6.0,
            camera: CameraView::default(),
        }
    }
}

impl ChartStyle {
    /// Points to pixels at the configured resolution
    pub fn px(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    /// Pixel size of a figure given in inches
    pub fn pixels(&self, (w, h): (f64, f64)) -> (u32, u32) {
        let dpi = self.dpi as f64;
        ((w * dpi).round() as u32, (h * dpi).round() as u32)
    }

    pub fn background(&self) -> RGBColor {
        match self.color_scheme {
            ColorScheme::Normal => WHITE,
            ColorScheme::Inverted => BLACK,
        }
    }

    pub fn foreground(&self) -> RGBColor {
        match self.color_scheme {
            ColorScheme::Normal => BLACK,
            ColorScheme::Inverted => WHITE,
        }
    }

    pub fn font(&self, points: f64) -> TextStyle<'_> {
        FontDesc::new(
            FontFamily::from(self.font_family.as_str()),
            self.px(points),
            FontStyle::Normal,
        )
        .color(&self.foreground())
    }

    pub(crate) fn stroke(&self, points: f64) -> u32 {
        self.px(points).round().max(1.0) as u32
    }

    pub fn validate(&self) -> Result<()> {
        let sizes = [
            self.bar_figure_inches,
            self.trend_figure_inches,
            self.wide_figure_inches,
        ];
        if self.dpi == 0 || sizes.iter().any(|&(w, h)| w <= 0.0 || h <= 0.0) {
            return Err(RepChartError::Configuration(
                "figure sizes and dpi must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A fully drawn chart held as an RGB8 pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFigure {
    kind: ChartKind,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RenderedFigure {
    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGB bytes, `width * height * 3` long
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Run `draw` against a fresh in-memory bitmap of `size` pixels
pub(crate) fn rasterize<F>(kind: ChartKind, (width, height): (u32, u32), draw: F) -> Result<RenderedFigure>
where
    F: for<'a> FnOnce(DrawingArea<TextSafeBackend<BitMapBackend<'a>>, Shift>) -> DrawResult,
{
    if width == 0 || height == 0 {
        return Err(RepChartError::Configuration(format!(
            "{} has an empty canvas ({}x{})",
            kind, width, height
        )));
    }

    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let backend = BitMapBackend::with_buffer(&mut pixels, (width, height));
        let root = TextSafeBackend::new(backend).into_drawing_area();
        draw(root).map_err(|e| RepChartError::Render(format!("{}: {}", kind, e)))?;
    }

    Ok(RenderedFigure {
        kind,
        width,
        height,
        pixels,
    })
}

/// "Day N (date)" title; days past the table get a projected date
pub fn day_title(table: &WorkoutTable, day: usize) -> String {
    match table.date_of_day(day) {
        Some(date) if day > table.len() => {
            format!("Day {} ({}, projected)", day, date.format("%Y-%m-%d"))
        }
        Some(date) => format!("Day {} ({})", day, date.format("%Y-%m-%d")),
        None => format!("Day {}", day),
    }
}

/// Tick label for whole-number positions, blank in between
pub(crate) fn integer_label(value: &f64) -> String {
    if (value - value.round()).abs() < 1e-6 {
        format!("{:.0}", value)
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutRecord;
    use chrono::NaiveDate;

    #[test]
    fn test_style_conversions() {
        let style = ChartStyle::default();
        assert_eq!(style.pixels(style.bar_figure_inches), (900, 1600));
        assert!((style.px(72.0) - 100.0).abs() < 1e-9);
        assert_eq!(style.stroke(0.1), 1);
        assert!(style.validate().is_ok());

        let style = ChartStyle {
            dpi: 0,
            ..ChartStyle::default()
        };
        assert!(style.validate().is_err());
    }

    #[test]
    fn test_color_scheme() {
        let mut style = ChartStyle::default();
        assert_eq!(style.background(), WHITE);
        style.color_scheme = "inverted".parse().unwrap();
        assert_eq!(style.background(), BLACK);
        assert_eq!(style.foreground(), WHITE);
        assert!("sepia".parse::<ColorScheme>().is_err());
    }

    #[test]
    fn test_rasterize_fills_buffer() {
        let figure = rasterize(ChartKind::Bars3d, (4, 3), |root| {
            root.fill(&RED)?;
            root.present()?;
            Ok(())
        })
        .unwrap();
        assert_eq!(figure.pixels().len(), 4 * 3 * 3);
        assert_eq!(&figure.pixels()[..3], &[255, 0, 0]);
    }

    #[test]
    fn test_rasterize_rejects_empty_canvas() {
        let err = rasterize(ChartKind::Bars3d, (0, 10), |_| Ok(())).unwrap_err();
        assert!(matches!(err, RepChartError::Configuration(_)));
    }

    #[test]
    fn test_day_title() {
        let table = WorkoutTable::new(
            1,
            false,
            vec![WorkoutRecord {
                date: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
                sets: vec![5],
                sum: 5,
                duration_seconds: None,
            }],
        )
        .unwrap();
        assert_eq!(day_title(&table, 1), "Day 1 (2020-04-01)");
        assert_eq!(day_title(&table, 3), "Day 3 (2020-04-03, projected)");
    }

    #[test]
    fn test_integer_label() {
        assert_eq!(integer_label(&3.0), "3");
        assert_eq!(integer_label(&2.5), "");
    }
}
