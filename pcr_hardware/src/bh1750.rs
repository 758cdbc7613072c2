use rppal::i2c::I2c;
use rppal::pwm::{Channel, Polarity, Pwm};
use tracing::trace;

use crate::error::{HwError, Result};

/// One-time high-resolution mode 2 (0.5 lx resolution, powers down after the read).
pub const ONETIME_H_RES_MODE_2: u8 = 0x21;

/// Counts-per-lux divisor from the BH1750 datasheet.
const COUNTS_PER_LUX: f32 = 1.2;

/// BH1750 ambient light sensor on an I2C bus.
pub struct Bh1750 {
    i2c: I2c,
}

impl Bh1750 {
    pub fn open(bus: u8, addr: u16) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
        i2c.set_slave_address(addr)
            .map_err(|e| HwError::I2c(format!("address {addr:#04x}: {e}")))?;
        Ok(Self { i2c })
    }

    /// Start a one-shot measurement. The result is ready after ~120 ms (180 ms max).
    pub fn trigger(&mut self) -> Result<()> {
        let n = self
            .i2c
            .write(&[ONETIME_H_RES_MODE_2])
            .map_err(|e| HwError::I2c(e.to_string()))?;
        if n != 1 {
            return Err(HwError::I2c("mode byte not written".into()));
        }
        Ok(())
    }

    pub fn read_lux(&mut self) -> Result<f32> {
        let mut data = [0u8; 2];
        let got = self
            .i2c
            .read(&mut data)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        if got != 2 {
            return Err(HwError::ShortRead { got });
        }
        let raw = u16::from_be_bytes(data);
        let lux = f32::from(raw) / COUNTS_PER_LUX;
        trace!(raw, lux, "bh1750 read");
        Ok(lux)
    }
}

/// Excitation LED driven by a hardware PWM channel.
pub struct PwmLed {
    pwm: Pwm,
    max_level: u8,
}

impl PwmLed {
    pub fn open(channel: u8, frequency_hz: f64, max_level: u8) -> Result<Self> {
        let channel = match channel {
            0 => Channel::Pwm0,
            1 => Channel::Pwm1,
            other => return Err(HwError::Pwm(format!("unsupported channel {other}"))),
        };
        let pwm = Pwm::with_frequency(channel, frequency_hz, 0.0, Polarity::Normal, true)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(Self { pwm, max_level })
    }

    pub fn set_level(&mut self, level: u8) -> Result<()> {
        let level = level.min(self.max_level);
        let duty = f64::from(level) / f64::from(self.max_level.max(1));
        self.pwm
            .set_duty_cycle(duty)
            .map_err(|e| HwError::Pwm(e.to_string()))
    }
}

impl Drop for PwmLed {
    fn drop(&mut self) {
        // LED off on shutdown
        let _ = self.pwm.set_duty_cycle(0.0);
    }
}
