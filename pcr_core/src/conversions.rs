//! `From` implementations bridging `pcr_config` types to `pcr_core` types.

use crate::config::{AcquisitionCfg, LedCfg};
use crate::curve::StandardCurvePoint;

impl From<&pcr_config::AcquisitionCfg> for AcquisitionCfg {
    fn from(c: &pcr_config::AcquisitionCfg) -> Self {
        Self {
            tick_ms: c.tick_ms,
            settle_ms: c.settle_ms,
        }
    }
}

impl From<&pcr_config::HardwareCfg> for LedCfg {
    fn from(c: &pcr_config::HardwareCfg) -> Self {
        Self {
            max_level: c.led_max_level,
        }
    }
}

impl From<pcr_config::StandardCurveRow> for StandardCurvePoint {
    fn from(r: pcr_config::StandardCurveRow) -> Self {
        Self::new(r.log_dilution, r.ct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquisition_cfg_from_toml_defaults() {
        let cfg = AcquisitionCfg::from(&pcr_config::AcquisitionCfg::default());
        assert_eq!(cfg, AcquisitionCfg::default());
        assert!(cfg.is_consistent());
    }

    #[test]
    fn csv_row_becomes_point() {
        let p = StandardCurvePoint::from(pcr_config::StandardCurveRow {
            log_dilution: -2.0,
            ct: 24,
        });
        assert_eq!(p, StandardCurvePoint::new(-2.0, 24));
    }
}
