//! Runtime configuration for the acquisition engine.
//!
//! Separate from the TOML-deserialized config in `pcr_config`; see
//! `conversions` for the bridge.

/// Tick scheduling for one acquisition run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionCfg {
    /// Period between ticks (ms). Must exceed `settle_ms`.
    pub tick_ms: u64,
    /// Wait between triggering the sensor and reading it (ms).
    pub settle_ms: u64,
}

impl Default for AcquisitionCfg {
    fn default() -> Self {
        Self {
            tick_ms: 2000,
            settle_ms: 180,
        }
    }
}

impl AcquisitionCfg {
    /// A reading must settle inside one tick.
    pub fn is_consistent(&self) -> bool {
        self.tick_ms > self.settle_ms
    }
}

/// LED scaling passed to hardware drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedCfg {
    /// Level that maps to 100% duty cycle.
    pub max_level: u8,
}

impl Default for LedCfg {
    fn default() -> Self {
        Self { max_level: 100 }
    }
}
