//! Least-squares fit and PCR amplification efficiency.
//!
//! Pure functions, no state. Degenerate input never errors: it yields
//! [`Regression::ZERO`] from [`fit`] and `f64::INFINITY` from [`efficiency`].

/// Variance / slope magnitude below which input is treated as degenerate.
pub const DEGENERATE_EPS: f64 = 1e-9;
/// Largest base-10 exponent that `10^x` can take without overflowing an `f64`.
pub const MAX_POW10_EXPONENT: f64 = 308.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl Regression {
    pub const ZERO: Self = Self {
        slope: 0.0,
        intercept: 0.0,
        r_squared: 0.0,
    };
}

/// Mean-centered ordinary least squares of `y` on `x`.
///
/// Returns [`Regression::ZERO`] for mismatched lengths, fewer than two
/// points, or when every `x` is (nearly) identical. `r_squared` is 0 when
/// `y` has no variance.
pub fn fit(x: &[f64], y: &[f64]) -> Regression {
    let n = x.len();
    if n != y.len() || n < 2 {
        return Regression::ZERO;
    }
    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let (mut sxx, mut syy, mut sxy) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx.abs() < DEGENERATE_EPS {
        return Regression::ZERO;
    }
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let r_squared = if syy > DEGENERATE_EPS {
        let r = sxy / (sxx * syy).sqrt();
        r * r
    } else {
        0.0
    };
    Regression {
        slope,
        intercept,
        r_squared,
    }
}

/// Percent amplification efficiency for a standard-curve slope:
/// `(10^(-1/slope) - 1) * 100`.
///
/// A slope of about -3.3219 is a perfect doubling per cycle (100%). Steeper
/// slopes give lower efficiency; shallow or positive slopes give values above
/// 100% or negative ones. A flat slope, or one so shallow that the power would
/// overflow, gives `+inf`.
pub fn efficiency(slope: f64) -> f64 {
    if slope.abs() < DEGENERATE_EPS {
        return f64::INFINITY;
    }
    let exponent = -1.0 / slope;
    if exponent > MAX_POW10_EXPONENT {
        return f64::INFINITY;
    }
    (10f64.powf(exponent) - 1.0) * 100.0
}
