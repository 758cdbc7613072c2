//! Sensor port assembly, acquisition runs and the self-check.

use pcr_config::Config;
use pcr_core::hw_error::{PortOp, map_port_error};
use pcr_core::{DocumentStore, RunReport, Session, run_acquisition};
use pcr_traits::SensorPort;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Env hook: make the simulated sensor fail initialization.
pub const ENV_SIM_INIT_FAIL: &str = "PCR_TEST_SIM_INIT_FAIL";
/// Env hook: make every Nth simulated reading fail.
pub const ENV_SIM_FAIL_EVERY: &str = "PCR_TEST_SIM_FAIL_EVERY";

/// Hardware port when built with `--features hardware`, simulation otherwise.
pub fn make_port(cfg: &Config) -> Box<dyn SensorPort> {
    #[cfg(feature = "hardware")]
    {
        let h = &cfg.hardware;
        Box::new(pcr_hardware::HardwareSensor::new(
            h.i2c_bus,
            h.sensor_addr,
            h.led_pwm_channel,
            h.led_pwm_frequency_hz,
            h.led_max_level,
        ))
    }
    #[cfg(not(feature = "hardware"))]
    {
        let _ = cfg;
        Box::new(simulated_from_env())
    }
}

#[cfg(not(feature = "hardware"))]
fn simulated_from_env() -> pcr_hardware::SimulatedSensor {
    let mut sim = pcr_hardware::SimulatedSensor::new();
    if std::env::var(ENV_SIM_INIT_FAIL).is_ok_and(|v| v == "1") {
        sim = sim.with_init_failure();
    }
    if let Some(n) = std::env::var(ENV_SIM_FAIL_EVERY)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
    {
        sim = sim.with_read_failure_every(n);
    }
    tracing::debug!("using simulated light sensor");
    sim
}

/// Run the current experiment until the cycle cap or Ctrl-C.
pub fn run<D, P>(session: &mut Session<D, P>) -> eyre::Result<RunReport>
where
    D: DocumentStore,
    P: SensorPort,
{
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "Ctrl-C handler not installed; run can only end at the cycle cap");
        }
    }
    let report = run_acquisition(session, Some(&shutdown))?;
    Ok(report)
}

/// One trigger/settle/read exchange with the LED at `led_level`, then LED off.
pub fn self_check(port: &mut dyn SensorPort, settle: Duration, led_level: u8) -> eyre::Result<f32> {
    port.initialize()
        .map_err(|e| map_port_error(PortOp::Initialize, &*e))?;
    port.set_actuator_level(led_level)
        .map_err(|e| map_port_error(PortOp::Actuator, &*e))?;
    let reading = port
        .trigger_reading()
        .map_err(|e| map_port_error(PortOp::Trigger, &*e))
        .and_then(|()| {
            std::thread::sleep(settle);
            port.read_value()
                .map_err(|e| map_port_error(PortOp::Read, &*e))
        });
    if let Err(e) = port.set_actuator_level(0) {
        tracing::warn!(error = %e, "could not switch LED off after self-check");
    }
    Ok(reading?)
}
