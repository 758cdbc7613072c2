//! Maps `Box<dyn Error>` from the sensor port boundary to typed `PcrError`s.
//!
//! `pcr_traits::SensorPort` returns boxed errors so any driver can plug in;
//! this module classifies them, with an optional feature-gated path for
//! `pcr_hardware::HwError` downcasting.

use crate::error::PcrError;

/// Which port operation produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOp {
    Initialize,
    Actuator,
    Trigger,
    Read,
}

/// Map a port error to a typed `PcrError`.
///
/// Initialization failures are fatal to a run; everything else is a
/// per-reading `ReadError` that the controller absorbs.
pub fn map_port_error(op: PortOp, e: &(dyn std::error::Error + 'static)) -> PcrError {
    let detail = describe(e);
    match op {
        PortOp::Initialize => PcrError::InitializationFailure(detail),
        PortOp::Actuator => PcrError::InitializationFailure(format!("LED: {detail}")),
        PortOp::Trigger => PcrError::ReadError(format!("trigger: {detail}")),
        PortOp::Read => PcrError::ReadError(detail),
    }
}

fn describe(e: &(dyn std::error::Error + 'static)) -> String {
    // Feature-gated: name the bus for typed hardware errors
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<pcr_hardware::error::HwError>() {
            return match hw {
                pcr_hardware::error::HwError::I2c(m) => format!("i2c bus: {m}"),
                pcr_hardware::error::HwError::Pwm(m) => format!("pwm: {m}"),
                other => other.to_string(),
            };
        }
    }

    e.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_errors_stay_recoverable() {
        let e = std::io::Error::other("nack");
        assert_eq!(
            map_port_error(PortOp::Read, &e),
            PcrError::ReadError("nack".into())
        );
        assert!(matches!(
            map_port_error(PortOp::Trigger, &e),
            PcrError::ReadError(_)
        ));
    }

    #[test]
    fn init_errors_are_fatal_kind() {
        let e = std::io::Error::other("no device");
        assert!(matches!(
            map_port_error(PortOp::Initialize, &e),
            PcrError::InitializationFailure(_)
        ));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_errors_name_the_bus() {
        let e = pcr_hardware::error::HwError::I2c("address 0x23: nack".into());
        assert_eq!(
            map_port_error(PortOp::Initialize, &e),
            PcrError::InitializationFailure("i2c bus: address 0x23: nack".into())
        );
    }
}
