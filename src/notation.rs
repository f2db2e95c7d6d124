//! Number formatting for report output.
//!
//! E-values are carried around as natural logs and only turned into a
//! `mantissa x 10^exponent` pair when written, so values far below the
//! smallest `f64` can still be reported.

use std::fmt;

/// A value written as `mantissa` times ten to the `exponent`.
///
/// The mantissa is rounded to `precision` decimals and always lies in `[1, 10)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scientific {
    pub mantissa: f64,
    pub exponent: i32,
    precision: usize,
}

fn round_to(x: f64, precision: usize) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (x * scale + 0.5).floor() / scale
}

impl Scientific {
    /// Split a base-10 logarithm into a rounded mantissa and an exponent.
    pub fn from_log10(log10x: f64, precision: usize) -> Self {
        let mut exponent = log10x.floor();
        let mut mantissa = round_to(10f64.powf(log10x - exponent), precision);
        if mantissa >= 10.0 {
            mantissa = 1.0;
            exponent += 1.0;
        }
        Self {
            mantissa,
            exponent: exponent as i32,
            precision,
        }
    }

    /// Same as [`Scientific::from_log10`], starting from a natural logarithm.
    pub fn from_ln(lnx: f64, precision: usize) -> Self {
        Self::from_log10(lnx / std::f64::consts::LN_10, precision)
    }

    /// Render with a fixed number of mantissa decimals, independent of the
    /// rounding precision.
    pub fn with_decimals(&self, decimals: usize) -> String {
        format!("{:.*}e{:+04}", decimals, self.mantissa, self.exponent)
    }

    /// Approximate value, for comparisons in tests and diagnostics
    pub fn value(&self) -> f64 {
        self.mantissa * 10f64.powi(self.exponent)
    }
}

impl fmt::Display for Scientific {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.with_decimals(self.precision))
    }
}

/// Format like C's `%g`: six significant digits, trailing zeros removed,
/// exponent form for very small or very large magnitudes.
pub fn format_g(x: f64) -> String {
    const PRECISION: i32 = 6;

    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:.*e}", (PRECISION - 1) as usize, x);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_zeros(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (PRECISION - 1 - exponent).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, x)).to_string()
    }
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
