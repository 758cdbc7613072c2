//! Named experiments with a single current selection.
//!
//! The store is never empty: opening an empty resource directory, or removing
//! the last experiment, creates a fresh record from the template.
use crate::document_store::{DocumentStore, TEMPLATE_STEM};
use crate::error::{PcrError, Result};
use crate::events::{Event, EventBus};
use crate::experiment::ExperimentRecord;
use crate::util::saved_stamp_now;
use std::collections::HashMap;

/// Base name for experiments the store creates on its own.
pub const DEFAULT_NAME: &str = "untitled";

/// Reject names that cannot be used as a document file stem. The template
/// stem is reserved: a document stored under it is never listed as an experiment.
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.trim().is_empty()
        || name.trim() != name
        || name.starts_with('.')
        || name == TEMPLATE_STEM
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(PcrError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug)]
pub struct ExperimentStore<D: DocumentStore> {
    documents: D,
    records: HashMap<String, ExperimentRecord>,
    /// Display order.
    names: Vec<String>,
    current: String,
    events: EventBus,
}

impl<D: DocumentStore> ExperimentStore<D> {
    /// Load every stored experiment. Documents that fail validation are logged
    /// and left on disk untouched; the first name in sorted order becomes current.
    pub fn open(documents: D, events: EventBus) -> Result<Self> {
        let mut records = HashMap::new();
        for (name, doc) in documents.load_all()? {
            match ExperimentRecord::from_document(&name, &doc) {
                Ok(mut rec) => {
                    rec.attach_events(events.clone());
                    records.insert(name, rec);
                }
                Err(e) => tracing::error!(experiment = %name, error = %e, "experiment not loaded"),
            }
        }
        let mut names: Vec<String> = records.keys().cloned().collect();
        names.sort();
        let current = names.first().cloned().unwrap_or_default();
        let mut store = Self {
            documents,
            records,
            names,
            current,
            events,
        };
        if store.names.is_empty() {
            tracing::info!("no experiments found; creating one from the template");
            store.create_default()?;
        }
        tracing::info!(
            count = store.names.len(),
            current = %store.current,
            "experiment store opened"
        );
        Ok(store)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn get(&self, name: &str) -> Result<&ExperimentRecord> {
        self.records
            .get(name)
            .ok_or_else(|| PcrError::NotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut ExperimentRecord> {
        self.records
            .get_mut(name)
            .ok_or_else(|| PcrError::NotFound(name.to_string()))
    }

    pub fn current(&self) -> Result<&ExperimentRecord> {
        self.get(&self.current)
    }

    pub fn current_mut(&mut self) -> Result<&mut ExperimentRecord> {
        let name = self.current.clone();
        self.get_mut(&name)
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    /// New record from the template, persisted and made current.
    pub fn create(&mut self, name: &str) -> Result<&ExperimentRecord> {
        if self.records.contains_key(name) {
            return Err(PcrError::DuplicateName(name.to_string()));
        }
        let rec = self.build_from_template(name)?;
        self.documents.write(name, &rec.to_document())?;
        self.insert(rec);
        tracing::info!(experiment = %name, "experiment created");
        self.set_current(name.to_string());
        self.get(name)
    }

    /// Delete the record and its stored document. The adjacent record at the
    /// same position becomes current; if none remain a default one is created.
    ///
    /// Removing the last record only succeeds once its replacement is built and
    /// persisted; on any failure the store is left as it was.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let Some(pos) = self.names.iter().position(|n| n == name) else {
            return Err(PcrError::NotFound(name.to_string()));
        };
        let replacement = if self.names.len() == 1 {
            let fresh = self.unique_name(DEFAULT_NAME, Some(name));
            Some(self.build_from_template(&fresh)?)
        } else {
            None
        };

        self.documents.delete(name)?;
        if let Some(rec) = &replacement
            && let Err(e) = self.documents.write(rec.name(), &rec.to_document())
        {
            if let Some(old) = self.records.get(name)
                && let Err(restore) = self.documents.write(name, &old.to_document())
            {
                tracing::error!(experiment = %name, error = %restore, "could not restore removed experiment");
            }
            return Err(e);
        }

        self.records.remove(name);
        self.names.remove(pos);
        tracing::info!(experiment = %name, "experiment removed");

        if let Some(rec) = replacement {
            let fresh = rec.name().to_string();
            self.insert(rec);
            tracing::info!(experiment = %fresh, "experiment created");
            self.set_current(fresh);
        } else if self.current == name {
            let next = self.names[pos.min(self.names.len() - 1)].clone();
            self.set_current(next);
        }
        Ok(())
    }

    pub fn switch_current(&mut self, name: &str) -> Result<&ExperimentRecord> {
        if !self.records.contains_key(name) {
            return Err(PcrError::NotFound(name.to_string()));
        }
        if self.current != name {
            self.set_current(name.to_string());
        }
        self.get(name)
    }

    /// Stamp and persist the full record.
    pub fn save(&mut self, name: &str) -> Result<()> {
        let rec = self
            .records
            .get_mut(name)
            .ok_or_else(|| PcrError::NotFound(name.to_string()))?;
        rec.stamp_saved(saved_stamp_now());
        let doc = rec.to_document();
        self.documents.write(name, &doc)?;
        tracing::info!(experiment = %name, last_saved = %doc.last_saved, "experiment saved");
        Ok(())
    }

    fn set_current(&mut self, name: String) {
        self.current = name;
        self.events.publish(Event::CurrentChanged {
            experiment: self.current.clone(),
        });
    }

    /// Validated record built from the template; nothing is stored yet.
    fn build_from_template(&self, name: &str) -> Result<ExperimentRecord> {
        validate_name(name)?;
        let template = self.documents.load_template()?;
        let mut rec = ExperimentRecord::from_document(name, &template)?;
        rec.attach_events(self.events.clone());
        Ok(rec)
    }

    fn insert(&mut self, rec: ExperimentRecord) {
        let name = rec.name().to_string();
        self.records.insert(name.clone(), rec);
        self.names.push(name);
    }

    fn create_default(&mut self) -> Result<()> {
        let name = self.unique_name(DEFAULT_NAME, None);
        self.create(&name).map(|_| ())
    }

    /// `base`, or `base-N` when taken. `freed` counts as available.
    fn unique_name(&self, base: &str, freed: Option<&str>) -> String {
        let taken = |n: &str| Some(n) != freed && self.records.contains_key(n);
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|i| format!("{base}-{i}"))
            .find(|n| !taken(n))
            .unwrap_or_else(|| base.to_string())
    }
}
