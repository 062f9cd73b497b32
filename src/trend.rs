//! Least-squares trend fitting for daily series
//!
//! The estimator is agnostic to what a series measures: repetition counts and
//! workout durations go through the same fit.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

use crate::error::{RepChartError, Result};
use crate::series::NamedSeries;

/// Highest polynomial degree the estimator accepts
pub const MAX_DEGREE: usize = 3;

/// Curve family used for the trend line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum TrendMethod {
    /// Ordinary least-squares line
    Linear,
    /// Least-squares polynomial of the given degree
    Polynomial { degree: usize },
}

impl TrendMethod {
    /// Method for a polynomial degree, where degree 1 is the plain line
    pub fn from_degree(degree: usize) -> Result<Self> {
        match degree {
            1 => Ok(TrendMethod::Linear),
            2..=MAX_DEGREE => Ok(TrendMethod::Polynomial { degree }),
            _ => Err(RepChartError::Configuration(format!(
                "trend degree must be between 1 and {}, got {}",
                MAX_DEGREE, degree
            ))),
        }
    }

    pub fn degree(&self) -> usize {
        match self {
            TrendMethod::Linear => 1,
            TrendMethod::Polynomial { degree } => *degree,
        }
    }
}

impl Default for TrendMethod {
    fn default() -> Self {
        TrendMethod::Linear
    }
}

/// Trend settings shared by the repetition and duration charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendSettings {
    pub method: TrendMethod,

    /// Days past the last record the trend line is extended on charts
    pub extrapolation_days: u32,

    /// Days ahead listed by the `predict` command
    pub prediction_days: u32,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            method: TrendMethod::Linear,
            extrapolation_days: 7,
            prediction_days: 14,
        }
    }
}

/// A fitted curve `y = c0 + c1 x + c2 x^2 + ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    pub method: TrendMethod,
    /// Coefficients from the constant term upward
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
}

impl TrendFit {
    /// Evaluate the curve at any x, inside or beyond the fitted range
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c)
    }

    /// Change per day at x
    pub fn slope_at(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(power, c)| power as f64 * c * x.powi(power as i32 - 1))
            .sum()
    }

    /// `steps + 1` evenly spaced points from `from` to `to`
    pub fn sample(&self, from: f64, to: f64, steps: usize) -> Vec<(f64, f64)> {
        let steps = steps.max(1);
        let dx = (to - from) / steps as f64;
        (0..=steps)
            .map(|i| {
                let x = from + dx * i as f64;
                (x, self.evaluate(x))
            })
            .collect()
    }
}

/// Fits trend curves to series
#[derive(Debug, Clone, Default)]
pub struct TrendEstimator {
    method: TrendMethod,
}

impl TrendEstimator {
    pub fn new(method: TrendMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> TrendMethod {
        self.method
    }

    /// Fit the series' (x, y) points
    pub fn fit(&self, series: &NamedSeries) -> Result<TrendFit> {
        let fit = self.fit_points(&series.x, &series.y)?;
        debug!(
            series = %series.name,
            coefficients = ?fit.coefficients,
            r_squared = fit.r_squared,
            "Fitted trend"
        );
        Ok(fit)
    }

    /// Fit raw coordinate slices of equal length
    pub fn fit_points(&self, xs: &[f64], ys: &[f64]) -> Result<TrendFit> {
        if xs.len() != ys.len() {
            return Err(RepChartError::insufficient(
                "trend fit",
                format!("{} x values for {} y values", xs.len(), ys.len()),
            ));
        }

        let degree = self.method.degree();
        let required = (degree + 1).max(2);
        if xs.len() < required {
            return Err(RepChartError::insufficient(
                "trend fit",
                format!("{} points supplied, at least {} required", xs.len(), required),
            ));
        }

        let coefficients = match self.method {
            TrendMethod::Linear => linear_coefficients(xs, ys)?,
            TrendMethod::Polynomial { degree } => polynomial_coefficients(xs, ys, degree)?,
        };

        let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut fit = TrendFit {
            method: self.method,
            coefficients,
            r_squared: 1.0,
            n_points: xs.len(),
            x_min,
            x_max,
        };
        fit.r_squared = r_squared(&fit, xs, ys);
        Ok(fit)
    }
}

fn linear_coefficients(xs: &[f64], ys: &[f64]) -> Result<Vec<f64>> {
    let var_x = xs.iter().variance();
    if var_x.abs() < f64::EPSILON {
        return Err(RepChartError::insufficient(
            "trend fit",
            "all points share the same x",
        ));
    }

    let slope = xs.iter().covariance(ys.iter()) / var_x;
    let intercept = ys.iter().mean() - slope * xs.iter().mean();
    Ok(vec![intercept, slope])
}

/// Solve the normal equations of a degree-`degree` least-squares polynomial
fn polynomial_coefficients(xs: &[f64], ys: &[f64], degree: usize) -> Result<Vec<f64>> {
    let n = degree + 1;

    // power_sums[k] = sum(x^k), k up to 2 * degree
    let power_sums: Vec<f64> = (0..=2 * degree)
        .map(|k| xs.iter().map(|x| x.powi(k as i32)).sum::<f64>())
        .collect();

    let mut matrix: Vec<Vec<f64>> = (0..n)
        .map(|row| {
            let mut line: Vec<f64> = (0..n).map(|col| power_sums[row + col]).collect();
            line.push(
                xs.iter()
                    .zip(ys)
                    .map(|(x, y)| y * x.powi(row as i32))
                    .sum::<f64>(),
            );
            line
        })
        .collect();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot][col].abs() < 1e-12 {
            return Err(RepChartError::insufficient(
                "trend fit",
                format!("not enough distinct days for a degree {} curve", degree),
            ));
        }
        matrix.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..=n {
                let delta = factor * matrix[col][k];
                matrix[row][k] -= delta;
            }
        }
    }

    let mut coefficients = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n)
            .map(|k| matrix[row][k] * coefficients[k])
            .sum();
        coefficients[row] = (matrix[row][n] - tail) / matrix[row][row];
    }

    Ok(coefficients)
}

fn r_squared(fit: &TrendFit, xs: &[f64], ys: &[f64]) -> f64 {
    let mean = ys.iter().mean();
    let ss_tot: f64 = ys.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot.abs() < f64::EPSILON {
        return 1.0;
    }
    let ss_res: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (y - fit.evaluate(*x)).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}
