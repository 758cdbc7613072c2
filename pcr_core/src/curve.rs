//! Standard (calibration) curve: dilution points and their fit.
use crate::error::{PcrError, Result};
use crate::regression::{self, Regression};
use std::fmt;

/// Fewer points than this are not fitted.
pub const MIN_POINTS: usize = 5;
/// `r_squared` at or above this marks a curve usable for quantification.
pub const RELIABLE_R_SQUARED: f64 = 0.98;
/// Summary text for a curve with fewer than [`MIN_POINTS`] points.
pub const INSUFFICIENT_SUMMARY: &str = "insufficient dilution points";

/// Acceptable efficiency band, in percent.
const EFFICIENCY_LOW: f64 = 90.0;
const EFFICIENCY_HIGH: f64 = 110.0;

/// `x` is log10 of the dilution factor, `ct` the cycle threshold measured for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardCurvePoint {
    pub x: f64,
    pub ct: i64,
}

impl StandardCurvePoint {
    pub const fn new(x: f64, ct: i64) -> Self {
        Self { x, ct }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reliability {
    Insufficient,
    Reliable,
    NotReliable,
}

impl Reliability {
    pub fn classify(r_squared: f64) -> Self {
        if r_squared >= RELIABLE_R_SQUARED {
            Self::Reliable
        } else {
            Self::NotReliable
        }
    }
}

impl fmt::Display for Reliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Insufficient => INSUFFICIENT_SUMMARY,
            Self::Reliable => "reliable for quantification",
            Self::NotReliable => "not reliable for quantification",
        })
    }
}

/// Result of fitting a [`StandardCurveSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct CurveAnalysis {
    pub regression: Regression,
    /// Percent; 0 when the curve is insufficient, `+inf` when the slope is flat.
    pub efficiency: f64,
    pub reliability: Reliability,
    pub summary: String,
}

impl CurveAnalysis {
    fn insufficient() -> Self {
        Self {
            regression: Regression::ZERO,
            efficiency: 0.0,
            reliability: Reliability::Insufficient,
            summary: INSUFFICIENT_SUMMARY.to_string(),
        }
    }
}

/// Points in insertion order. Fitting works on a copy stably sorted by `x`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardCurveSet {
    points: Vec<StandardCurvePoint>,
}

impl StandardCurveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<StandardCurvePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[StandardCurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn add(&mut self, point: StandardCurvePoint) -> Result<()> {
        if !point.x.is_finite() {
            return Err(PcrError::InvalidData(format!(
                "standard curve x must be finite, got {}",
                point.x
            )));
        }
        if point.ct < 0 {
            return Err(PcrError::InvalidData(format!(
                "standard curve ct must be >= 0, got {}",
                point.ct
            )));
        }
        self.points.push(point);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<StandardCurvePoint> {
        if index >= self.points.len() {
            return Err(PcrError::OutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(self.points.remove(index))
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Copy sorted by `x` ascending; equal `x` keep insertion order.
    pub fn sorted(&self) -> Vec<StandardCurvePoint> {
        let mut pts = self.points.clone();
        pts.sort_by(|a, b| a.x.total_cmp(&b.x));
        pts
    }

    pub fn analyze(&self) -> CurveAnalysis {
        if self.points.len() < MIN_POINTS {
            return CurveAnalysis::insufficient();
        }
        let sorted = self.sorted();
        let x: Vec<f64> = sorted.iter().map(|p| p.x).collect();
        let y: Vec<f64> = sorted.iter().map(|p| p.ct as f64).collect();
        let regression = regression::fit(&x, &y);
        let efficiency = regression::efficiency(regression.slope);
        let reliability = Reliability::classify(regression.r_squared);
        let summary = summarize(&regression, efficiency, reliability);
        CurveAnalysis {
            regression,
            efficiency,
            reliability,
            summary,
        }
    }
}

fn summarize(r: &Regression, efficiency: f64, reliability: Reliability) -> String {
    let mut s = format!(
        "R² {:.4}, slope {:.4}, efficiency {}: {reliability}",
        r.r_squared,
        r.slope,
        if efficiency.is_finite() {
            format!("{efficiency:.1}%")
        } else {
            "undefined".to_string()
        }
    );
    if !efficiency.is_finite() {
        s.push_str("; Ct does not change with dilution");
    } else if efficiency > EFFICIENCY_HIGH {
        s.push_str("; efficiency above 110% suggests inhibition or pipetting error");
    } else if efficiency < EFFICIENCY_LOW {
        s.push_str("; efficiency below 90% suggests a suboptimal reaction");
    }
    s
}
