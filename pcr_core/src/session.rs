//! The store and the controller behind one handle.
//!
//! The controller always acts on the store's current record. Store changes
//! that would move or rewrite records (create, remove, switch, save, edits)
//! are refused with `PcrError::State` while a run is in progress.
use crate::builder::SessionBuilder;
use crate::controller::AcquisitionController;
use crate::curve::{CurveAnalysis, Reliability};
use crate::document_store::DocumentStore;
use crate::error::{PcrError, Result};
use crate::events::{Event, EventBus};
use crate::experiment::ExperimentRecord;
use crate::status::{ControllerState, TickOutcome};
use crate::store::ExperimentStore;
use pcr_traits::{Clock, SensorPort};
use std::sync::Arc;

pub struct Session<D: DocumentStore, P: SensorPort> {
    store: ExperimentStore<D>,
    controller: AcquisitionController<P>,
    clock: Arc<dyn Clock + Send + Sync>,
    events: EventBus,
}

impl<D: DocumentStore, P: SensorPort> std::fmt::Debug for Session<D, P>
where
    D: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl<D: DocumentStore, P: SensorPort> Session<D, P> {
    pub fn builder(documents: D, port: P) -> SessionBuilder<D, P> {
        SessionBuilder::new(documents, port)
    }

    pub(crate) fn from_parts(
        store: ExperimentStore<D>,
        controller: AcquisitionController<P>,
        clock: Arc<dyn Clock + Send + Sync>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            controller,
            clock,
            events,
        }
    }

    pub fn store(&self) -> &ExperimentStore<D> {
        &self.store
    }

    pub fn controller(&self) -> &AcquisitionController<P> {
        &self.controller
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> crossbeam_channel::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn current(&self) -> Result<&ExperimentRecord> {
        self.store.current()
    }

    pub fn get(&self, name: &str) -> Result<&ExperimentRecord> {
        self.store.get(name)
    }

    fn ensure_idle(&self, what: &str) -> Result<()> {
        if self.controller.is_running() {
            return Err(PcrError::State(format!(
                "cannot {what} while acquisition is running"
            )));
        }
        Ok(())
    }

    pub fn create(&mut self, name: &str) -> Result<&ExperimentRecord> {
        self.ensure_idle("create an experiment")?;
        self.store.create(name)
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.ensure_idle("remove an experiment")?;
        self.store.remove(name)
    }

    pub fn switch_current(&mut self, name: &str) -> Result<&ExperimentRecord> {
        self.ensure_idle("switch experiments")?;
        self.store.switch_current(name)
    }

    pub fn save(&mut self, name: &str) -> Result<()> {
        self.ensure_idle("save")?;
        self.store.save(name)
    }

    pub fn save_current(&mut self) -> Result<()> {
        let name = self.store.current_name().to_string();
        self.save(&name)
    }

    /// Apply an edit to a named record.
    pub fn update<T>(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut ExperimentRecord) -> Result<T>,
    ) -> Result<T> {
        self.ensure_idle("edit an experiment")?;
        edit(self.store.get_mut(name)?)
    }

    /// Refit the named record's standard curve without acquiring.
    pub fn analyze(&mut self, name: &str) -> Result<CurveAnalysis> {
        self.update(name, |rec| Ok(rec.recompute_standard_curve()))
    }

    pub fn start(&mut self) -> Result<()> {
        let rec = self.store.current_mut()?;
        self.controller.start(rec)
    }

    pub fn tick(&mut self) -> Result<TickOutcome> {
        let rec = self.store.current_mut()?;
        self.controller.tick(rec)
    }

    pub fn stop(&mut self) -> Result<Reliability> {
        let rec = self.store.current_mut()?;
        self.controller.stop(rec)
    }
}
