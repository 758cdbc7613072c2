//! On-disk experiment document.
//!
//! Every key is optional when reading; a missing key takes the value of
//! `ExperimentDocument::default()`. Validation of the values (negative
//! intensities, out-of-range integers) happens when the core builds a record
//! from the document, not here.
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// Cycle count of the built-in template.
pub const DEFAULT_MAX_CYCLE: i64 = 31;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentDocument {
    /// Derived from the file name on load; written for human readers.
    pub experiment_name: String,
    /// `YYYY-MM-DD HH:MM:SS.cc +HHMM`, empty until first save.
    pub last_saved: String,
    pub led_intensity_level: i64,
    pub max_cycle: i64,
    pub intensity_threshold: f64,
    pub cycle_threshold: i64,
    /// Kept as text so the operator's precision survives a round trip.
    #[serde(deserialize_with = "de_numeric_text")]
    pub concentration_coefficient: String,
    pub concentration_multiplier: f64,
    pub r_squared: f64,
    pub slope: f64,
    pub y_intercept: f64,
    pub efficiency: f64,
    pub summary: String,
    pub light_sensor_data: Vec<f32>,
    /// `[log10(dilution), cycle threshold]` pairs.
    pub standard_curve_points: Vec<(f64, i64)>,
}

impl Default for ExperimentDocument {
    fn default() -> Self {
        Self {
            experiment_name: String::new(),
            last_saved: String::new(),
            led_intensity_level: 100,
            max_cycle: DEFAULT_MAX_CYCLE,
            intensity_threshold: 10.0,
            cycle_threshold: 0,
            concentration_coefficient: "0".to_string(),
            concentration_multiplier: 1.0,
            r_squared: 0.0,
            slope: 0.0,
            y_intercept: 0.0,
            efficiency: 0.0,
            summary: String::new(),
            light_sensor_data: Vec::new(),
            standard_curve_points: Vec::new(),
        }
    }
}

impl ExperimentDocument {
    /// Built-in template: default settings with a zeroed buffer of `max_cycle` samples.
    pub fn template() -> Self {
        Self::template_with_max_cycle(DEFAULT_MAX_CYCLE)
    }

    /// Built-in template with a different cycle cap. Negative caps give an empty buffer.
    pub fn template_with_max_cycle(max_cycle: i64) -> Self {
        Self {
            max_cycle,
            light_sensor_data: vec![0.0; usize::try_from(max_cycle).unwrap_or(0)],
            ..Self::default()
        }
    }
}

/// Scalar text exactly as written, so `1.50` keeps its trailing zero. The YAML
/// deserializer hands string visitors the raw scalar whether or not it is quoted.
fn de_numeric_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.map_or_else(|| "0".to_string(), |s| s.trim().to_string()))
}

/// Parse a YAML experiment document. Empty input yields the defaults.
pub fn parse_document(yaml: &str) -> Result<ExperimentDocument, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(ExperimentDocument::default());
    }
    serde_yaml::from_str(yaml)
}

pub fn to_yaml(doc: &ExperimentDocument) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(doc)
}
