use crate::curve::Reliability;
use crate::document_store::DocumentStore;
use crate::error::Result;
use crate::session::Session;
use crate::status::TickOutcome;
use pcr_traits::SensorPort;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Longest single sleep between shutdown checks.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Outcome of one [`run_acquisition`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub experiment: String,
    pub samples: u32,
    pub skipped: u32,
    /// 0 when no sample crossed the intensity threshold.
    pub cycle_threshold: u32,
    pub reliability: Reliability,
    /// Ended by the shutdown flag rather than the cycle cap.
    pub interrupted: bool,
}

/// Run the current experiment to completion.
///
/// Starts the controller, then ticks once per period until the cycle cap ends
/// the run. Setting `shutdown` stops the run at the next poll and finalizes
/// it like a manual `stop()`. Saving is left to the caller.
pub fn run_acquisition<D, P>(
    session: &mut Session<D, P>,
    shutdown: Option<&AtomicBool>,
) -> Result<RunReport>
where
    D: DocumentStore,
    P: SensorPort,
{
    let clock = session.clock();
    let period = session.controller().tick_period();
    let requested = || shutdown.is_some_and(|f| f.load(Ordering::Relaxed));

    session.start()?;
    let mut skipped = 0u32;
    let mut interrupted = false;

    'run: loop {
        let mut remaining = period;
        while !remaining.is_zero() {
            if requested() {
                interrupted = true;
                break 'run;
            }
            let step = remaining.min(SHUTDOWN_POLL);
            clock.sleep(step);
            remaining -= step;
        }
        match session.tick() {
            Ok(TickOutcome::Sampled { .. }) => {}
            Ok(TickOutcome::Skipped { .. }) => skipped += 1,
            Ok(TickOutcome::Finished | TickOutcome::Idle) => break,
            Err(e) => {
                // leave the controller Idle so the store stays editable
                if let Err(stop) = session.stop() {
                    tracing::warn!(error = %stop, "could not stop after failed tick");
                }
                tracing::error!(error = %e, "acquisition aborted");
                return Err(e);
            }
        }
    }

    let reliability = if interrupted {
        tracing::warn!("shutdown requested; stopping acquisition");
        session.stop()?
    } else {
        session
            .controller()
            .last_reliability()
            .unwrap_or(Reliability::Insufficient)
    };

    let rec = session.current()?;
    Ok(RunReport {
        experiment: rec.name().to_string(),
        samples: session.controller().samples_taken(),
        skipped,
        cycle_threshold: rec.cycle_threshold(),
        reliability,
        interrupted,
    })
}
