//! Unified error hierarchy for repchart
//!
//! Every stage of the chart pipeline reports failures through [`RepChartError`],
//! so the CLI can log them with a severity and show a user-facing message.

use thiserror::Error;

/// Top-level error type for all repchart operations
#[derive(Debug, Error)]
pub enum RepChartError {
    /// Malformed header or row in the workout CSV
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A record built outside the loader has the wrong number of sets
    #[error("Record {record}: expected {expected} sets, found {found}")]
    UnevenRecord {
        record: usize,
        expected: usize,
        found: usize,
    },

    /// A requested series does not exist in the loaded table
    #[error("Data unavailable: {series}")]
    DataUnavailable { series: String },

    /// Too few points for a calculation
    #[error("Insufficient data for {calculation}: {reason}")]
    InsufficientData { calculation: String, reason: String },

    /// A chart needs at least one row and one set
    #[error("Nothing to draw for {chart}: {reason}")]
    EmptyInput { chart: String, reason: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Drawing backend failure while rasterizing a chart
    #[error("Render error: {0}")]
    Render(String),

    /// Image encoding failure
    #[error("Encode error: {0}")]
    Encode(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Workout CSV parsing errors
///
/// Line numbers are 1-based positions in the source file, header included.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Header lacks a required column
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// A fixed column appears more than once
    #[error("Duplicate column: {column}")]
    DuplicateColumn { column: String },

    /// Set columns are not numbered 1..N
    #[error("Invalid set columns: {reason}")]
    InvalidSetColumns { reason: String },

    /// Row has a different number of fields than the header
    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Numeric field could not be parsed
    #[error("Line {line}: invalid number in {column}: {value:?}")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },

    /// Date field could not be parsed
    #[error("Line {line}: invalid date {value:?}")]
    InvalidDate { line: u64, value: String },

    /// Workout time is not h:mm:ss
    #[error("Line {line}: invalid workout time {value:?}, expected h:mm:ss")]
    InvalidDuration { line: u64, value: String },

    /// Low-level CSV reader failure
    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<csv::Error> for RepChartError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => RepChartError::Io(io),
                other => RepChartError::Parse(ParseError::Csv(format!("{:?}", other))),
            }
        } else {
            RepChartError::Parse(ParseError::Csv(err.to_string()))
        }
    }
}

/// Result type alias for repchart operations
pub type Result<T> = std::result::Result<T, RepChartError>;

impl RepChartError {
    pub(crate) fn insufficient(calculation: impl Into<String>, reason: impl Into<String>) -> Self {
        RepChartError::InsufficientData {
            calculation: calculation.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn empty(chart: impl Into<String>, reason: impl Into<String>) -> Self {
        RepChartError::EmptyInput {
            chart: chart.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure belongs to a single chart rather than the whole run
    pub fn is_chart_local(&self) -> bool {
        matches!(
            self,
            RepChartError::DataUnavailable { .. }
                | RepChartError::InsufficientData { .. }
                | RepChartError::EmptyInput { .. }
                | RepChartError::Render(_)
                | RepChartError::Encode(_)
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RepChartError::DataUnavailable { .. } => ErrorSeverity::Warning,
            RepChartError::InsufficientData { .. } => ErrorSeverity::Warning,
            RepChartError::EmptyInput { .. } => ErrorSeverity::Warning,
            RepChartError::Render(_) | RepChartError::Encode(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RepChartError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                format!("Could not find the workout file: {}", err)
            }
            RepChartError::Parse(ParseError::FieldCount {
                line,
                expected,
                found,
            }) => format!(
                "Row on line {} has {} fields but the header declares {}. Every day must list the same sets.",
                line, found, expected
            ),
            RepChartError::DataUnavailable { series } => {
                format!("The workout file has no {} data to chart.", series)
            }
            RepChartError::InsufficientData { calculation, .. } => format!(
                "Not enough data to calculate {}. At least two days of records are needed.",
                calculation
            ),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Unexpected internal failure
    Critical,
    /// Error that prevents the operation
    Error,
    /// Chart skipped, the rest of the run is unaffected
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
