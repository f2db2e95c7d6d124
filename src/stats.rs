//! Log-domain probability helpers shared by the scoring and regression code.

use statrs::function::erf::erfc;
use statrs::function::factorial::ln_binomial;

/// Magnitude of the sentinel used for "log of zero"
pub const BIG: f64 = 1e300;

/// Below this log p-value, `1 - (1 - p)^n` is indistinguishable from `n * p`
const LOG_SMALL: f64 = -46.0;

/// Past this point `erfc` underflows and the asymptotic series is used
const ERFC_ASYMPTOTIC: f64 = 25.0;

/// Natural log of the complementary error function.
///
/// Stays finite for large `x`, where `erfc(x)` itself underflows to zero.
pub fn log_erfc(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x < ERFC_ASYMPTOTIC {
        return erfc(x).ln();
    }
    // erfc(x) ~ exp(-x^2) / (x sqrt(pi)) * (1 - 1/(2x^2) + 3/(4x^4) - 15/(8x^6))
    let x2 = x * x;
    let series = 1.0 - 1.0 / (2.0 * x2) + 3.0 / (4.0 * x2 * x2) - 15.0 / (8.0 * x2 * x2 * x2);
    -x2 - x.ln() - 0.5 * std::f64::consts::PI.ln() + series.ln()
}

/// `ln(exp(a) + exp(b))` without leaving the log domain
pub fn log_add(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

fn ln_choose(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    ln_binomial(n, k)
}

/// One-sided Fisher exact test, as a natural log p-value.
///
/// Foreground and background are pooled into one population of
/// `fg_size + bg_size` items, `fg_size` of which are "foreground". Drawing the
/// `fg_match + bg_match` matching items, this is the log probability of seeing
/// at least `fg_match` foreground items among them.
///
/// Returns `0.0` (p = 1) when nothing matched.
pub fn log_fisher_exact(fg_match: u64, fg_size: u64, bg_match: u64, bg_size: u64) -> f64 {
    let draws = fg_match + bg_match;
    if draws == 0 {
        return 0.0;
    }
    let total = fg_size + bg_size;
    let log_denom = ln_choose(total, draws);
    let hi = draws.min(fg_size);

    let mut log_p = f64::NEG_INFINITY;
    for i in fg_match..=hi {
        let rest = draws - i;
        if rest > bg_size {
            continue;
        }
        let term = ln_choose(fg_size, i) + ln_choose(bg_size, rest) - log_denom;
        log_p = log_add(log_p, term);
    }
    log_p.min(0.0)
}

/// Probability that the best of `n` independent tests reaches p-value `p`,
/// i.e. `ln(1 - (1 - p)^n)`, from `ln n` and `ln p`.
pub fn log_normalized_pvalue(log_n: f64, log_p: f64) -> f64 {
    if log_p < LOG_SMALL {
        return log_p + log_n;
    }
    let p = log_p.exp();
    let n = log_n.exp();
    (-(n * (-p).ln_1p()).exp_m1()).ln()
}
