//! Test and helper mocks for pcr_core

use pcr_traits::{PortError, SensorPort};
use std::collections::VecDeque;

/// A sensor port that replays a fixed script of readings.
///
/// `None` entries in the script fail that reading. When the script runs out
/// the last successful value repeats. LED levels are recorded in order.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSensor {
    script: VecDeque<Option<f32>>,
    last: f32,
    fail_init: bool,
    pub initialized: u32,
    pub triggers: u32,
    pub led_levels: Vec<u8>,
}

impl ScriptedSensor {
    pub fn new(script: impl IntoIterator<Item = Option<f32>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Every reading succeeds with the given values.
    pub fn values(values: impl IntoIterator<Item = f32>) -> Self {
        Self::new(values.into_iter().map(Some))
    }

    #[must_use]
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }
}

impl SensorPort for ScriptedSensor {
    fn initialize(&mut self) -> Result<(), PortError> {
        if self.fail_init {
            return Err(Box::new(std::io::Error::other("scripted init failure")));
        }
        self.initialized += 1;
        Ok(())
    }

    fn set_actuator_level(&mut self, level: u8) -> Result<(), PortError> {
        self.led_levels.push(level);
        Ok(())
    }

    fn trigger_reading(&mut self) -> Result<(), PortError> {
        self.triggers += 1;
        Ok(())
    }

    fn read_value(&mut self) -> Result<f32, PortError> {
        match self.script.pop_front() {
            Some(Some(v)) => {
                self.last = v;
                Ok(v)
            }
            Some(None) => Err(Box::new(std::io::Error::other("scripted read failure"))),
            None => Ok(self.last),
        }
    }
}
