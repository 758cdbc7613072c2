//! One named experiment: samples, standard curve, settings and derived results.
use crate::buffer::SampleBuffer;
use crate::curve::{CurveAnalysis, Reliability, StandardCurvePoint, StandardCurveSet};
use crate::error::{PcrError, Result};
use crate::events::EventBus;
use pcr_config::{ExperimentDocument, MAX_CYCLES_LIMIT};

#[derive(Debug, Clone)]
pub struct ExperimentRecord {
    name: String,
    samples: SampleBuffer,
    curve: StandardCurveSet,
    led_intensity_level: u8,
    max_cycle: u32,
    intensity_threshold: f64,
    /// 1-based; 0 means no sample crossed the threshold.
    cycle_threshold: u32,
    concentration_coefficient: String,
    concentration_multiplier: f64,
    slope: f64,
    y_intercept: f64,
    r_squared: f64,
    efficiency: f64,
    summary: String,
    last_saved: String,
}

fn invalid(name: &str, what: impl std::fmt::Display) -> PcrError {
    PcrError::InvalidData(format!("{name}: {what}"))
}

fn check_max_cycle(name: &str, n: i64) -> Result<u32> {
    if n < 1 || n > i64::from(MAX_CYCLES_LIMIT) {
        return Err(invalid(
            name,
            format_args!("max_cycle must be in 1..={MAX_CYCLES_LIMIT}, got {n}"),
        ));
    }
    u32::try_from(n).map_err(|_| invalid(name, format_args!("max_cycle {n} out of range")))
}

fn check_led_level(name: &str, level: i64) -> Result<u8> {
    u8::try_from(level).map_err(|_| {
        invalid(
            name,
            format_args!("led_intensity_level must be in 0..=255, got {level}"),
        )
    })
}

fn check_threshold(name: &str, t: f64) -> Result<f64> {
    if !t.is_finite() || t < 0.0 {
        return Err(invalid(
            name,
            format_args!("intensity_threshold must be a finite value >= 0, got {t}"),
        ));
    }
    Ok(t)
}

fn check_multiplier(name: &str, m: f64) -> Result<f64> {
    if !m.is_finite() {
        return Err(invalid(
            name,
            format_args!("concentration_multiplier must be finite, got {m}"),
        ));
    }
    Ok(m)
}

impl ExperimentRecord {
    /// Build a record from a stored document.
    ///
    /// Fails with `InvalidData` on a negative or non-finite intensity and on
    /// out-of-range settings; nothing is built in that case. The sample
    /// buffer is truncated or zero-filled to `max_cycle`.
    pub fn from_document(name: &str, doc: &ExperimentDocument) -> Result<Self> {
        if let Some((i, v)) = doc
            .light_sensor_data
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(invalid(
                name,
                format_args!("light_sensor_data[{i}] = {v} is not a valid intensity"),
            ));
        }
        let max_cycle = check_max_cycle(name, doc.max_cycle)?;
        let led_intensity_level = check_led_level(name, doc.led_intensity_level)?;
        let intensity_threshold = check_threshold(name, doc.intensity_threshold)?;
        let concentration_multiplier = check_multiplier(name, doc.concentration_multiplier)?;
        let cycle_threshold = u32::try_from(doc.cycle_threshold).map_err(|_| {
            invalid(
                name,
                format_args!("cycle_threshold must be >= 0, got {}", doc.cycle_threshold),
            )
        })?;

        let mut curve = StandardCurveSet::new();
        for &(x, ct) in &doc.standard_curve_points {
            curve
                .add(StandardCurvePoint::new(x, ct))
                .map_err(|e| invalid(name, e))?;
        }

        let mut samples = SampleBuffer::from_values(doc.light_sensor_data.clone());
        samples.resize(max_cycle as usize);

        Ok(Self {
            name: name.to_string(),
            samples,
            curve,
            led_intensity_level,
            max_cycle,
            intensity_threshold,
            cycle_threshold,
            concentration_coefficient: doc.concentration_coefficient.clone(),
            concentration_multiplier,
            slope: doc.slope,
            y_intercept: doc.y_intercept,
            r_squared: doc.r_squared,
            efficiency: doc.efficiency,
            summary: doc.summary.clone(),
            last_saved: doc.last_saved.clone(),
        })
    }

    pub fn to_document(&self) -> ExperimentDocument {
        ExperimentDocument {
            experiment_name: self.name.clone(),
            last_saved: self.last_saved.clone(),
            led_intensity_level: i64::from(self.led_intensity_level),
            max_cycle: i64::from(self.max_cycle),
            intensity_threshold: self.intensity_threshold,
            cycle_threshold: i64::from(self.cycle_threshold),
            concentration_coefficient: self.concentration_coefficient.clone(),
            concentration_multiplier: self.concentration_multiplier,
            r_squared: self.r_squared,
            slope: self.slope,
            y_intercept: self.y_intercept,
            efficiency: self.efficiency,
            summary: self.summary.clone(),
            light_sensor_data: self.samples.values().to_vec(),
            standard_curve_points: self.curve.points().iter().map(|p| (p.x, p.ct)).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }
    pub fn samples_mut(&mut self) -> &mut SampleBuffer {
        &mut self.samples
    }
    pub fn curve(&self) -> &StandardCurveSet {
        &self.curve
    }
    pub fn curve_mut(&mut self) -> &mut StandardCurveSet {
        &mut self.curve
    }
    pub fn led_intensity_level(&self) -> u8 {
        self.led_intensity_level
    }
    pub fn max_cycle(&self) -> u32 {
        self.max_cycle
    }
    pub fn intensity_threshold(&self) -> f64 {
        self.intensity_threshold
    }
    pub fn cycle_threshold(&self) -> u32 {
        self.cycle_threshold
    }
    pub fn concentration_coefficient(&self) -> &str {
        &self.concentration_coefficient
    }
    pub fn concentration_multiplier(&self) -> f64 {
        self.concentration_multiplier
    }
    pub fn slope(&self) -> f64 {
        self.slope
    }
    pub fn y_intercept(&self) -> f64 {
        self.y_intercept
    }
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }
    pub fn summary(&self) -> &str {
        &self.summary
    }
    pub fn last_saved(&self) -> &str {
        &self.last_saved
    }

    /// `coefficient × multiplier`, or `None` when the coefficient text is not a number.
    pub fn concentration(&self) -> Option<f64> {
        self.concentration_coefficient
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|c| c.is_finite())
            .map(|c| c * self.concentration_multiplier)
    }

    pub fn set_intensity_threshold(&mut self, t: f64) -> Result<()> {
        self.intensity_threshold = check_threshold(&self.name, t)?;
        Ok(())
    }

    pub fn set_led_intensity_level(&mut self, level: i64) -> Result<()> {
        self.led_intensity_level = check_led_level(&self.name, level)?;
        Ok(())
    }

    pub fn set_concentration_multiplier(&mut self, m: f64) -> Result<()> {
        self.concentration_multiplier = check_multiplier(&self.name, m)?;
        Ok(())
    }

    /// Stored verbatim so the operator's precision survives; must parse as a finite number.
    pub fn set_concentration_coefficient(&mut self, text: &str) -> Result<()> {
        let t = text.trim();
        match t.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                self.concentration_coefficient = t.to_string();
                Ok(())
            }
            _ => Err(invalid(
                &self.name,
                format_args!("concentration_coefficient {text:?} is not a number"),
            )),
        }
    }

    /// Change the cycle cap; the sample buffer follows.
    pub fn set_max_cycle(&mut self, n: i64) -> Result<()> {
        self.max_cycle = check_max_cycle(&self.name, n)?;
        self.samples.resize(self.max_cycle as usize);
        Ok(())
    }

    pub(crate) fn attach_events(&mut self, bus: EventBus) {
        self.samples.attach(bus);
    }

    pub(crate) fn stamp_saved(&mut self, stamp: String) {
        self.last_saved = stamp;
    }

    /// 1-based cycle of the first sample at or above `threshold`, stored on the
    /// record. No crossing leaves the threshold unset (0) and returns `None`.
    pub fn compute_cycle_threshold(&mut self, threshold: f64) -> Option<u32> {
        let crossing = self
            .samples
            .first_crossing(threshold)
            .and_then(|i| u32::try_from(i + 1).ok());
        self.cycle_threshold = crossing.unwrap_or(0);
        crossing
    }

    /// Refit the standard curve and store slope, intercept, R², efficiency and summary.
    pub fn recompute_standard_curve(&mut self) -> CurveAnalysis {
        let analysis = self.curve.analyze();
        self.slope = analysis.regression.slope;
        self.y_intercept = analysis.regression.intercept;
        self.r_squared = analysis.regression.r_squared;
        self.efficiency = analysis.efficiency;
        self.summary = analysis.summary.clone();
        analysis
    }

    /// End-of-run analysis: cycle threshold at the record's own intensity threshold, then the curve fit.
    pub fn finalize(&mut self) -> Reliability {
        let t = self.intensity_threshold;
        self.compute_cycle_threshold(t);
        self.recompute_standard_curve().reliability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ExperimentDocument {
        ExperimentDocument::template()
    }

    #[test]
    fn negative_intensity_aborts_construction() {
        let mut doc = template();
        doc.light_sensor_data[3] = -0.5;
        let err = ExperimentRecord::from_document("bad", &doc).unwrap_err();
        assert!(matches!(err, PcrError::InvalidData(m) if m.contains("light_sensor_data[3]")));
    }

    #[test]
    fn buffer_follows_max_cycle() {
        let mut doc = template();
        doc.max_cycle = 40;
        let r = ExperimentRecord::from_document("x", &doc).unwrap();
        assert_eq!(r.samples().len(), 40);

        doc.max_cycle = 10;
        let r = ExperimentRecord::from_document("x", &doc).unwrap();
        assert_eq!(r.samples().len(), 10);
    }

    #[test]
    fn out_of_range_settings_are_invalid() {
        let cases: [fn(&mut ExperimentDocument); 7] = [
            |d| d.max_cycle = 0,
            |d| d.max_cycle = 5000,
            |d| d.led_intensity_level = 300,
            |d| d.led_intensity_level = -1,
            |d| d.cycle_threshold = -2,
            |d| d.intensity_threshold = f64::NAN,
            |d| d.standard_curve_points = vec![(0.0, -4)],
        ];
        for mutate in cases {
            let mut doc = template();
            mutate(&mut doc);
            assert!(matches!(
                ExperimentRecord::from_document("x", &doc),
                Err(PcrError::InvalidData(_))
            ));
        }
    }

    #[test]
    fn cycle_threshold_is_one_based_or_unset() {
        let mut doc = template();
        doc.light_sensor_data[4] = 12.0;
        doc.cycle_threshold = 9;
        let mut r = ExperimentRecord::from_document("x", &doc).unwrap();
        assert_eq!(r.compute_cycle_threshold(10.0), Some(5));
        assert_eq!(r.cycle_threshold(), 5);
        assert_eq!(r.compute_cycle_threshold(50.0), None);
        assert_eq!(r.cycle_threshold(), 0);
    }

    #[test]
    fn concentration_multiplies_coefficient() {
        let mut r = ExperimentRecord::from_document("x", &template()).unwrap();
        r.set_concentration_coefficient("2.50").unwrap();
        r.set_concentration_multiplier(4.0).unwrap();
        assert_eq!(r.concentration(), Some(10.0));
        assert_eq!(r.concentration_coefficient(), "2.50");
        assert!(r.set_concentration_coefficient("lots").is_err());
        assert_eq!(r.concentration_coefficient(), "2.50");
    }

    #[test]
    fn document_round_trip_keeps_fields() {
        let mut doc = template();
        doc.summary = "s".into();
        doc.standard_curve_points = vec![(0.0, 30), (-1.0, 27)];
        doc.light_sensor_data[0] = 1.25;
        let r = ExperimentRecord::from_document("keep", &doc).unwrap();
        let back = r.to_document();
        assert_eq!(back.experiment_name, "keep");
        assert_eq!(back.standard_curve_points, doc.standard_curve_points);
        assert_eq!(back.light_sensor_data, doc.light_sensor_data);
        assert_eq!(back.summary, "s");
    }
}
