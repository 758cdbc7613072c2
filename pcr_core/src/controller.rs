//! Acquisition state machine: `Idle -> Running -> Idle`.
//!
//! The controller drives the [`SensorPort`] and writes into whichever
//! [`ExperimentRecord`] the caller passes in; [`crate::Session`] always passes
//! the store's current record. Ticks are delivered from outside (see
//! [`crate::runner`]), so the controller itself never waits except for the
//! sensor settle delay.
use crate::config::AcquisitionCfg;
use crate::curve::Reliability;
use crate::error::{PcrError, Result};
use crate::events::{Event, EventBus};
use crate::experiment::ExperimentRecord;
use crate::hw_error::{PortOp, map_port_error};
use crate::status::{ControllerState, TickOutcome};
use pcr_traits::{Clock, SensorPort};
use std::sync::Arc;
use std::time::Duration;

pub struct AcquisitionController<P: SensorPort> {
    port: P,
    clock: Arc<dyn Clock + Send + Sync>,
    cfg: AcquisitionCfg,
    events: EventBus,
    state: ControllerState,
    /// Ticks seen in the current run, including skipped ones.
    cycle: u32,
    /// Cycle cap captured from the record at `start()`.
    cap: u32,
    samples: u32,
    last_reliability: Option<Reliability>,
}

impl<P: SensorPort> std::fmt::Debug for AcquisitionController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquisitionController")
            .field("cfg", &self.cfg)
            .field("state", &self.state)
            .field("cycle", &self.cycle)
            .field("cap", &self.cap)
            .field("samples", &self.samples)
            .finish_non_exhaustive()
    }
}

impl<P: SensorPort> AcquisitionController<P> {
    pub fn new(
        port: P,
        clock: Arc<dyn Clock + Send + Sync>,
        cfg: AcquisitionCfg,
        events: EventBus,
    ) -> Result<Self> {
        if !cfg.is_consistent() {
            return Err(PcrError::Config(format!(
                "settle delay ({} ms) must be shorter than the tick period ({} ms)",
                cfg.settle_ms, cfg.tick_ms
            )));
        }
        Ok(Self {
            port,
            clock,
            cfg,
            events,
            state: ControllerState::Idle,
            cycle: 0,
            cap: 0,
            samples: 0,
            last_reliability: None,
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ControllerState::Running
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Successful readings stored in the current (or last) run.
    pub fn samples_taken(&self) -> u32 {
        self.samples
    }

    /// Curve classification from the most recent finalized run.
    pub fn last_reliability(&self) -> Option<Reliability> {
        self.last_reliability
    }

    pub fn cfg(&self) -> &AcquisitionCfg {
        &self.cfg
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.cfg.tick_ms)
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Begin a run on `rec`.
    ///
    /// Clears the record's samples, initializes the port and applies the
    /// record's LED level. Any port failure here is an `InitializationFailure`
    /// and the controller stays `Idle`.
    pub fn start(&mut self, rec: &mut ExperimentRecord) -> Result<()> {
        if self.is_running() {
            return Err(PcrError::State("acquisition already running".into()));
        }
        rec.samples_mut().reset();

        if let Err(e) = self.port.initialize() {
            let err = map_port_error(PortOp::Initialize, &*e);
            tracing::error!(experiment = %rec.name(), error = %err, "sensor initialization failed");
            return Err(err);
        }
        if let Err(e) = self.port.set_actuator_level(rec.led_intensity_level()) {
            let err = map_port_error(PortOp::Actuator, &*e);
            tracing::error!(experiment = %rec.name(), error = %err, "LED setup failed");
            return Err(err);
        }

        self.state = ControllerState::Running;
        self.cycle = 0;
        self.samples = 0;
        self.cap = rec.max_cycle();
        tracing::info!(
            experiment = %rec.name(),
            max_cycle = self.cap,
            tick_ms = self.cfg.tick_ms,
            led = rec.led_intensity_level(),
            "acquisition started"
        );
        self.events.publish(Event::RunStarted {
            experiment: rec.name().to_string(),
        });
        Ok(())
    }

    /// One scheduled cycle.
    ///
    /// Past the cap the run finalizes on its own. A failed reading is logged,
    /// published as `ReadFailed` and skipped; it never ends the run.
    pub fn tick(&mut self, rec: &mut ExperimentRecord) -> Result<TickOutcome> {
        if !self.is_running() {
            return Ok(TickOutcome::Idle);
        }
        self.cycle += 1;
        if self.cycle > self.cap {
            tracing::debug!(cycle = self.cycle, cap = self.cap, "cycle cap reached");
            self.finish(rec);
            return Ok(TickOutcome::Finished);
        }

        match self.read_once() {
            Ok(value) => {
                let index = rec.samples_mut().append(value)?;
                self.samples += 1;
                tracing::debug!(cycle = self.cycle, index, value, "sample");
                Ok(TickOutcome::Sampled { index, value })
            }
            Err(e) => {
                tracing::warn!(cycle = self.cycle, error = %e, "reading skipped");
                self.events.publish(Event::ReadFailed {
                    cycle: self.cycle,
                    message: e.to_string(),
                });
                Ok(TickOutcome::Skipped { cycle: self.cycle })
            }
        }
    }

    /// Manual end of a run. Finalizes the record like an automatic stop.
    pub fn stop(&mut self, rec: &mut ExperimentRecord) -> Result<Reliability> {
        if !self.is_running() {
            return Err(PcrError::State("acquisition is not running".into()));
        }
        tracing::info!(cycle = self.cycle, "acquisition stopped");
        Ok(self.finish(rec))
    }

    /// Trigger, wait the settle delay, read.
    fn read_once(&mut self) -> Result<f32> {
        self.port
            .trigger_reading()
            .map_err(|e| map_port_error(PortOp::Trigger, &*e))?;
        self.clock.sleep(Duration::from_millis(self.cfg.settle_ms));
        let v = self
            .port
            .read_value()
            .map_err(|e| map_port_error(PortOp::Read, &*e))?;
        if !v.is_finite() || v < 0.0 {
            return Err(PcrError::ReadError(format!("implausible intensity {v}")));
        }
        Ok(v)
    }

    fn finish(&mut self, rec: &mut ExperimentRecord) -> Reliability {
        self.state = ControllerState::Idle;
        let reliability = rec.finalize();
        self.last_reliability = Some(reliability);
        if let Err(e) = self.port.set_actuator_level(0) {
            tracing::warn!(error = %map_port_error(PortOp::Actuator, &*e), "could not switch LED off");
        }
        tracing::info!(
            experiment = %rec.name(),
            samples = self.samples,
            cycle_threshold = rec.cycle_threshold(),
            r_squared = rec.r_squared(),
            %reliability,
            "acquisition finished"
        );
        self.events.publish(Event::RunFinished {
            experiment: rec.name().to_string(),
            samples: self.samples,
            cycle_threshold: rec.cycle_threshold(),
        });
        reliability
    }
}
