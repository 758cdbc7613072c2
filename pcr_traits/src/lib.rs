pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type crossing the hardware boundary.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// The light sensor plus the excitation LED it is paired with.
///
/// One reading is a two-step exchange: `trigger_reading()` starts a one-shot
/// measurement, and after the sensor's acquisition time `read_value()` returns
/// the intensity in lux.
pub trait SensorPort {
    /// Bring up the bus, the sensor and the LED driver.
    fn initialize(&mut self) -> Result<(), PortError>;
    /// Set the LED drive level (0 = off).
    fn set_actuator_level(&mut self, level: u8) -> Result<(), PortError>;
    fn trigger_reading(&mut self) -> Result<(), PortError>;
    fn read_value(&mut self) -> Result<f32, PortError>;
}

impl<T: SensorPort + ?Sized> SensorPort for Box<T> {
    fn initialize(&mut self) -> Result<(), PortError> {
        (**self).initialize()
    }
    fn set_actuator_level(&mut self, level: u8) -> Result<(), PortError> {
        (**self).set_actuator_level(level)
    }
    fn trigger_reading(&mut self) -> Result<(), PortError> {
        (**self).trigger_reading()
    }
    fn read_value(&mut self) -> Result<f32, PortError> {
        (**self).read_value()
    }
}
