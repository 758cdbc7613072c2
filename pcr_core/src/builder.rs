//! Builder for [`Session`].
//!
//! The document store and the sensor port are required up front; clock,
//! acquisition timing and event bus default to wall-clock, 2000/180 ms and a
//! fresh bus.

use std::sync::Arc;

use pcr_traits::SensorPort;
use pcr_traits::clock::{Clock, MonotonicClock};

use crate::config::AcquisitionCfg;
use crate::controller::AcquisitionController;
use crate::document_store::DocumentStore;
use crate::error::Result;
use crate::events::EventBus;
use crate::session::Session;
use crate::store::ExperimentStore;

pub struct SessionBuilder<D, P> {
    documents: D,
    port: P,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    acquisition: Option<AcquisitionCfg>,
    events: Option<EventBus>,
    select: Option<String>,
}

impl<D: DocumentStore, P: SensorPort> SessionBuilder<D, P> {
    pub(crate) fn new(documents: D, port: P) -> Self {
        Self {
            documents,
            port,
            clock: None,
            acquisition: None,
            events: None,
            select: None,
        }
    }

    /// Inject a clock (tests use `TestClock`).
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_acquisition(mut self, cfg: AcquisitionCfg) -> Self {
        self.acquisition = Some(cfg);
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Make `name` current after loading, if it exists. Unknown names are
    /// logged and ignored.
    pub fn select(mut self, name: impl Into<String>) -> Self {
        self.select = Some(name.into());
        self
    }

    /// Load the store and wire the controller to it.
    pub fn build(self) -> Result<Session<D, P>> {
        let events = self.events.unwrap_or_default();
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };
        let controller = AcquisitionController::new(
            self.port,
            clock.clone(),
            self.acquisition.unwrap_or_default(),
            events.clone(),
        )?;
        let mut store = ExperimentStore::open(self.documents, events.clone())?;
        if let Some(name) = self.select {
            if store.contains(&name) {
                store.switch_current(&name)?;
            } else {
                tracing::warn!(experiment = %name, "selected experiment not found; keeping {}", store.current_name());
            }
        }
        Ok(Session::from_parts(store, controller, clock, events))
    }
}
