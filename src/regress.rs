//! Least-squares regression and Pearson correlation over `(x, y)` points.

use crate::error::{ReportError, Result};
use crate::stats::{log_erfc, BIG};

/// A fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    /// `sqrt(sum of squared residuals) / n`
    pub rms_error: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    /// Sample Pearson correlation coefficient
    pub r: f64,
    /// Regression line and its error, when requested
    pub line: Option<Regression>,
    /// One-tailed log p-value of `r` being this large
    pub log_pvalue: f64,
}

#[derive(Default)]
struct Sums {
    n: f64,
    sx: f64,
    sy: f64,
    sxx: f64,
    sxy: f64,
    syy: f64,
}

impl Sums {
    fn of(points: &[(f64, f64)]) -> Self {
        let mut s = Sums {
            n: points.len() as f64,
            ..Default::default()
        };
        for &(x, y) in points {
            s.sx += x;
            s.sy += y;
            s.sxx += x * x;
            s.sxy += x * y;
            s.syy += y * y;
        }
        s
    }

    fn line(&self) -> (f64, f64) {
        let denom = self.n * self.sxx - self.sx * self.sx;
        if denom != 0.0 {
            let slope = (self.n * self.sxy - self.sy * self.sx) / denom;
            (slope, (self.sy - slope * self.sx) / self.n)
        } else {
            (0.0, 0.0)
        }
    }
}

fn rms_error(points: &[(f64, f64)], slope: f64, intercept: f64) -> f64 {
    let sse: f64 = points
        .iter()
        .map(|&(x, y)| {
            let err = y - (slope * x + intercept);
            err * err
        })
        .sum();
    sse.sqrt() / points.len() as f64
}

/// Ordinary least-squares fit.
///
/// Constant `x` (a zero denominator in the normal equations) yields a slope and
/// intercept of zero rather than an error.
pub fn regress(points: &[(f64, f64)]) -> Regression {
    let (slope, intercept) = Sums::of(points).line();
    Regression {
        slope,
        intercept,
        rms_error: rms_error(points, slope, intercept),
    }
}

/// Weighted least-squares fit.
///
/// Each residual is multiplied by its weight before squaring, and the error is
/// divided by the number of points, not by the total weight.
///
/// # Errors
/// * `ReportError::InvalidInput` if `points` and `weights` differ in length
pub fn weighted_regress(points: &[(f64, f64)], weights: &[f64]) -> Result<Regression> {
    if points.len() != weights.len() {
        return Err(ReportError::invalid_input(format!(
            "weighted regression: {} points but {} weights",
            points.len(),
            weights.len()
        )));
    }

    let (mut s, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&(x, y), &w) in points.iter().zip(weights) {
        s += w;
        sx += x * w;
        sy += y * w;
        sxx += x * x * w;
        sxy += x * y * w;
    }

    let denom = s * sxx - sx * sx;
    let (slope, intercept) = if denom != 0.0 {
        ((s * sxy - sx * sy) / denom, (sxx * sy - sx * sxy) / denom)
    } else {
        (0.0, 0.0)
    };

    let sse: f64 = points
        .iter()
        .zip(weights)
        .map(|(&(x, y), &w)| {
            let err = (y - (slope * x + intercept)) * w;
            err * err
        })
        .sum();

    Ok(Regression {
        slope,
        intercept,
        rms_error: sse.sqrt() / points.len() as f64,
    })
}

/// Pearson correlation with a Fisher z-transform significance estimate.
///
/// Fewer than three points give `log_pvalue == 0` (p = 1); `r >= 1` gives
/// `-BIG` (p = 0). When `with_line` is set the regression line is fitted with
/// the same formulas as [`regress`].
pub fn pearson_correlation(points: &[(f64, f64)], with_line: bool) -> Correlation {
    let s = Sums::of(points);

    let line = with_line.then(|| {
        let (slope, intercept) = s.line();
        Regression {
            slope,
            intercept,
            rms_error: rms_error(points, slope, intercept),
        }
    });

    let denom = (s.n * s.sxx - s.sx * s.sx) * (s.n * s.syy - s.sy * s.sy);
    let r = if denom == 0.0 {
        0.0
    } else {
        (s.n * s.sxy - s.sx * s.sy) / denom.sqrt()
    };

    let log_pvalue = if points.len() < 3 {
        0.0
    } else if r < 1.0 {
        let z = 0.5 * (s.n - 3.0).sqrt() * ((1.0 + r) / (1.0 - r)).ln();
        0.5f64.ln() + log_erfc(z / std::f64::consts::SQRT_2)
    } else {
        -BIG
    };

    Correlation {
        r,
        line,
        log_pvalue,
    }
}
