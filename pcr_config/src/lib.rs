#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas, experiment documents and standard-curve CSV parsing.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - `document` holds the on-disk experiment schema and its YAML codec.
//! - The standard-curve CSV loader enforces headers and rejects rows that
//!   cannot be a dilution point.
use serde::Deserialize;
use std::path::PathBuf;

pub mod document;

pub use document::{ExperimentDocument, parse_document, to_yaml};

/// Largest cycle cap accepted anywhere in the system.
pub const MAX_CYCLES_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AcquisitionCfg {
    /// Period between cycle ticks (ms).
    pub tick_ms: u64,
    /// Wait between triggering the sensor and reading it (ms). Must stay below `tick_ms`.
    pub settle_ms: u64,
    /// Cycle cap for newly templated experiments.
    pub max_cycles: u32,
}

impl Default for AcquisitionCfg {
    fn default() -> Self {
        Self {
            tick_ms: 2000,
            settle_ms: 180,
            max_cycles: 31,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HardwareCfg {
    /// BH1750 I2C address (0x23 with ADDR low, 0x5C with ADDR high)
    pub sensor_addr: u16,
    pub i2c_bus: u8,
    /// Hardware PWM channel driving the LED (0 = GPIO18 on a Pi)
    pub led_pwm_channel: u8,
    pub led_pwm_frequency_hz: f64,
    /// LED level that maps to 100% duty
    pub led_max_level: u8,
}

impl Default for HardwareCfg {
    fn default() -> Self {
        Self {
            sensor_addr: 0x23,
            i2c_bus: 1,
            led_pwm_channel: 0,
            led_pwm_frequency_hz: 1000.0,
            led_max_level: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageCfg {
    /// Directory holding one `<name>.yml` document per experiment.
    pub resource_dir: PathBuf,
    /// Optional template document; falls back to `<resource_dir>/template.yml`, then built-in.
    pub template: Option<PathBuf>,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            resource_dir: PathBuf::from("resources"),
            template: None,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub acquisition: AcquisitionCfg,
    pub hardware: HardwareCfg,
    pub storage: StorageCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Acquisition
        if self.acquisition.tick_ms == 0 {
            eyre::bail!("acquisition.tick_ms must be >= 1");
        }
        if self.acquisition.settle_ms == 0 {
            eyre::bail!("acquisition.settle_ms must be >= 1");
        }
        if self.acquisition.settle_ms >= self.acquisition.tick_ms {
            eyre::bail!(
                "acquisition.settle_ms ({}) must be shorter than acquisition.tick_ms ({})",
                self.acquisition.settle_ms,
                self.acquisition.tick_ms
            );
        }
        if self.acquisition.max_cycles == 0 {
            eyre::bail!("acquisition.max_cycles must be >= 1");
        }
        if self.acquisition.max_cycles > MAX_CYCLES_LIMIT {
            eyre::bail!("acquisition.max_cycles is unreasonably large (>{MAX_CYCLES_LIMIT})");
        }

        // Hardware
        if self.hardware.sensor_addr > 0x7F {
            eyre::bail!("hardware.sensor_addr must be a 7-bit I2C address");
        }
        if self.hardware.led_pwm_channel > 1 {
            eyre::bail!("hardware.led_pwm_channel must be 0 or 1");
        }
        if !(self.hardware.led_pwm_frequency_hz.is_finite()
            && self.hardware.led_pwm_frequency_hz > 0.0)
        {
            eyre::bail!("hardware.led_pwm_frequency_hz must be > 0");
        }
        if self.hardware.led_max_level == 0 {
            eyre::bail!("hardware.led_max_level must be >= 1");
        }

        // Storage
        if self.storage.resource_dir.as_os_str().is_empty() {
            eyre::bail!("storage.resource_dir must not be empty");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}

/// Standard-curve CSV schema.
///
/// Expected headers:
/// log_dilution,ct
///
/// Example:
/// log_dilution,ct
/// 0,14
/// -1,17
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct StandardCurveRow {
    pub log_dilution: f64,
    pub ct: i64,
}

pub fn load_standard_curve_csv(path: &std::path::Path) -> eyre::Result<Vec<StandardCurveRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open standard curve CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["log_dilution", "ct"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "standard curve CSV must have headers 'log_dilution,ct', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<StandardCurveRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        if !row.log_dilution.is_finite() {
            eyre::bail!("CSV row {}: log_dilution must be finite", idx + 2);
        }
        if row.ct < 0 {
            eyre::bail!("CSV row {}: ct must be >= 0, got {}", idx + 2, row.ct);
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = load_toml("").unwrap();
        assert_eq!(cfg.acquisition.tick_ms, 2000);
        assert_eq!(cfg.acquisition.settle_ms, 180);
        assert_eq!(cfg.acquisition.max_cycles, 31);
        assert_eq!(cfg.hardware.sensor_addr, 0x23);
        cfg.validate().unwrap();
    }
}
