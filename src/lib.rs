// Library interface for repchart modules
// This allows integration tests and benches to access the core functionality

pub mod config;
pub mod error;
pub mod export;
pub mod frames;
pub mod import;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod series;
pub mod trend;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use error::{ErrorSeverity, ParseError, RepChartError, Result};
pub use frames::{FrameJob, FrameRenderer, FrameSettings, FrameSummary};
pub use import::{load_table, CsvLoader};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::{WorkoutRecord, WorkoutTable};
pub use pipeline::{ChartOutcome, ChartPipeline, OutputSettings, RunReport};
pub use render::{ChartKind, ChartStyle, ColorScheme, RenderedFigure};
pub use series::{NamedSeries, SeriesExtractor};
pub use trend::{TrendEstimator, TrendFit, TrendMethod, TrendSettings};
