#[cfg(feature = "hardware")]
pub mod bh1750;
pub mod error;

use error::HwError;
use pcr_traits::{PortError, SensorPort};

/// Last cycle of the exponential phase of the synthetic curve.
const SIM_EXPONENTIAL_UNTIL: u32 = 24;

/// Simulated light sensor replaying a synthetic amplification curve.
///
/// Each trigger advances an internal cycle counter `c` (1-based, reset by
/// `initialize()`): `lux = 2^c * 1e-5` through cycle 24, then the plateau
/// `187 - 0.5^(c - 28)`.
#[derive(Debug, Default)]
pub struct SimulatedSensor {
    initialized: bool,
    cycle: u32,
    led_level: u8,
    fail_init: bool,
    fail_every: Option<u32>,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `initialize()` fail, as a missing I2C device would.
    pub fn with_init_failure(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Fail every `n`-th reading (by internal cycle number).
    pub fn with_read_failure_every(mut self, n: u32) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    pub fn led_level(&self) -> u8 {
        self.led_level
    }

    /// Intensity the synthetic curve produces at `cycle`.
    pub fn curve_value(cycle: u32) -> f32 {
        if cycle <= SIM_EXPONENTIAL_UNTIL {
            (2f64.powf(f64::from(cycle)) * 0.00001) as f32
        } else {
            (187.0 - 0.5f64.powf(f64::from(cycle) - 28.0)) as f32
        }
    }
}

impl SensorPort for SimulatedSensor {
    fn initialize(&mut self) -> Result<(), PortError> {
        if self.fail_init {
            return Err(Box::new(HwError::Simulated("sensor did not acknowledge")));
        }
        self.initialized = true;
        self.cycle = 0;
        tracing::debug!("simulated sensor initialized");
        Ok(())
    }

    fn set_actuator_level(&mut self, level: u8) -> Result<(), PortError> {
        self.led_level = level;
        tracing::debug!(level, "simulated LED level");
        Ok(())
    }

    fn trigger_reading(&mut self) -> Result<(), PortError> {
        if !self.initialized {
            return Err(Box::new(HwError::NotInitialized));
        }
        self.cycle = self.cycle.saturating_add(1);
        Ok(())
    }

    fn read_value(&mut self) -> Result<f32, PortError> {
        if !self.initialized {
            return Err(Box::new(HwError::NotInitialized));
        }
        if let Some(n) = self.fail_every
            && self.cycle % n == 0
        {
            return Err(Box::new(HwError::ShortRead { got: 0 }));
        }
        let lux = Self::curve_value(self.cycle);
        tracing::trace!(cycle = self.cycle, lux, "simulated reading");
        Ok(lux)
    }
}

/// BH1750 light sensor plus PWM-driven LED.
#[cfg(feature = "hardware")]
pub struct HardwareSensor {
    i2c_bus: u8,
    sensor_addr: u16,
    led_channel: u8,
    led_frequency_hz: f64,
    led_max_level: u8,
    sensor: Option<bh1750::Bh1750>,
    led: Option<bh1750::PwmLed>,
}

#[cfg(feature = "hardware")]
impl HardwareSensor {
    pub fn new(
        i2c_bus: u8,
        sensor_addr: u16,
        led_channel: u8,
        led_frequency_hz: f64,
        led_max_level: u8,
    ) -> Self {
        Self {
            i2c_bus,
            sensor_addr,
            led_channel,
            led_frequency_hz,
            led_max_level,
            sensor: None,
            led: None,
        }
    }
}

#[cfg(feature = "hardware")]
impl SensorPort for HardwareSensor {
    fn initialize(&mut self) -> Result<(), PortError> {
        let mut led =
            bh1750::PwmLed::open(self.led_channel, self.led_frequency_hz, self.led_max_level)?;
        led.set_level(0)?;
        let sensor = bh1750::Bh1750::open(self.i2c_bus, self.sensor_addr)?;
        tracing::info!(
            bus = self.i2c_bus,
            addr = self.sensor_addr,
            led_channel = self.led_channel,
            "light sensor and LED initialized"
        );
        self.led = Some(led);
        self.sensor = Some(sensor);
        Ok(())
    }

    fn set_actuator_level(&mut self, level: u8) -> Result<(), PortError> {
        let led = self.led.as_mut().ok_or(HwError::NotInitialized)?;
        led.set_level(level)?;
        Ok(())
    }

    fn trigger_reading(&mut self) -> Result<(), PortError> {
        let sensor = self.sensor.as_mut().ok_or(HwError::NotInitialized)?;
        sensor.trigger()?;
        Ok(())
    }

    fn read_value(&mut self) -> Result<f32, PortError> {
        let sensor = self.sensor.as_mut().ok_or(HwError::NotInitialized)?;
        match sensor.read_lux() {
            Ok(lux) => Ok(lux),
            Err(e) => {
                tracing::error!("light sensor read error: {}", e);
                Err(Box::new(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_curve_rises_then_plateaus() {
        let mut s = SimulatedSensor::new();
        s.initialize().unwrap();
        let mut values = Vec::new();
        for _ in 0..31 {
            s.trigger_reading().unwrap();
            values.push(s.read_value().unwrap());
        }
        assert!(values[0] < 1e-4);
        assert!(values.windows(2).take(23).all(|w| w[1] > w[0]));
        assert!((values[30] - 186.875).abs() < 1e-3);
    }

    #[test]
    fn reading_before_initialize_fails() {
        let mut s = SimulatedSensor::new();
        assert!(s.trigger_reading().is_err());
        assert!(s.read_value().is_err());
    }

    #[test]
    fn led_level_is_recorded() {
        let mut s = SimulatedSensor::new();
        s.set_actuator_level(42).unwrap();
        assert_eq!(s.led_level(), 42);
    }
}
