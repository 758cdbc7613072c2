//! Persistence of experiment documents.
//!
//! [`FsDocumentStore`] keeps one `<name>.yml` file per experiment in a resource
//! directory chosen at construction. [`MemoryDocumentStore`] is the in-process
//! equivalent used by tests and dry runs.
use crate::error::{PcrError, Result};
use pcr_config::{ExperimentDocument, parse_document, to_yaml};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of experiment documents.
pub const DOCUMENT_EXT: &str = "yml";
/// Stem of the optional template document in the resource directory.
pub const TEMPLATE_STEM: &str = "template";

pub trait DocumentStore {
    /// Every stored document keyed by experiment name.
    fn load_all(&self) -> Result<BTreeMap<String, ExperimentDocument>>;
    /// Document new experiments are created from.
    fn load_template(&self) -> Result<ExperimentDocument>;
    fn write(&mut self, name: &str, doc: &ExperimentDocument) -> Result<()>;
    /// Deleting a name that was never written is not an error.
    fn delete(&mut self, name: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    dir: PathBuf,
    template: Option<PathBuf>,
    fallback: ExperimentDocument,
}

impl FsDocumentStore {
    /// `template` overrides `<dir>/template.yml`; without either the built-in template is used.
    pub fn new(dir: impl Into<PathBuf>, template: Option<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            template,
            fallback: ExperimentDocument::template(),
        }
    }

    /// Replace the built-in template used when no template file exists.
    #[must_use]
    pub fn with_fallback_template(mut self, doc: ExperimentDocument) -> Self {
        self.fallback = doc;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{DOCUMENT_EXT}"))
    }

    fn read_doc(path: &Path) -> Result<ExperimentDocument> {
        let text = fs::read_to_string(path)
            .map_err(|e| PcrError::Io(format!("read {}: {e}", path.display())))?;
        parse_document(&text)
            .map_err(|e| PcrError::Document(format!("{}: {e}", path.display())))
    }
}

impl DocumentStore for FsDocumentStore {
    fn load_all(&self) -> Result<BTreeMap<String, ExperimentDocument>> {
        let mut out = BTreeMap::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %self.dir.display(), "resource directory missing; no experiments");
                return Ok(out);
            }
            Err(e) => {
                return Err(PcrError::Io(format!(
                    "list {}: {e}",
                    self.dir.display()
                )));
            }
        };
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem == TEMPLATE_STEM || stem.starts_with('.') {
                continue;
            }
            match Self::read_doc(&path) {
                Ok(doc) => {
                    out.insert(stem.to_string(), doc);
                }
                Err(e) => tracing::error!(file = %path.display(), error = %e, "skipping unreadable experiment"),
            }
        }
        Ok(out)
    }

    fn load_template(&self) -> Result<ExperimentDocument> {
        if let Some(p) = &self.template {
            return Self::read_doc(p);
        }
        let local = self.path_for(TEMPLATE_STEM);
        if local.is_file() {
            return Self::read_doc(&local);
        }
        Ok(self.fallback.clone())
    }

    fn write(&mut self, name: &str, doc: &ExperimentDocument) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| PcrError::Io(format!("create {}: {e}", self.dir.display())))?;
        let yaml = to_yaml(doc).map_err(|e| PcrError::Document(format!("{name}: {e}")))?;
        let path = self.path_for(name);
        // same-directory rename replaces the old file atomically
        let tmp = self.dir.join(format!(".{name}.{DOCUMENT_EXT}.tmp"));
        fs::write(&tmp, yaml).map_err(|e| PcrError::Io(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| PcrError::Io(format!("rename to {}: {e}", path.display())))?;
        tracing::debug!(file = %path.display(), "experiment written");
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PcrError::Io(format!("delete {}: {e}", path.display()))),
        }
    }
}

/// Documents held in memory.
#[derive(Debug, Clone)]
pub struct MemoryDocumentStore {
    docs: BTreeMap<String, ExperimentDocument>,
    template: ExperimentDocument,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self {
            docs: BTreeMap::new(),
            template: ExperimentDocument::template(),
        }
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(docs: impl IntoIterator<Item = (String, ExperimentDocument)>) -> Self {
        Self {
            docs: docs.into_iter().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: ExperimentDocument) -> Self {
        self.template = template;
        self
    }

    pub fn documents(&self) -> &BTreeMap<String, ExperimentDocument> {
        &self.docs
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load_all(&self) -> Result<BTreeMap<String, ExperimentDocument>> {
        Ok(self.docs.clone())
    }

    fn load_template(&self) -> Result<ExperimentDocument> {
        Ok(self.template.clone())
    }

    fn write(&mut self, name: &str, doc: &ExperimentDocument) -> Result<()> {
        self.docs.insert(name.to_string(), doc.clone());
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        self.docs.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_store_skips_template_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("template.yml"), "max_cycle: 12\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("run-a.yml"), "intensity_threshold: 4.5\n").unwrap();

        let store = FsDocumentStore::new(dir.path(), None);
        let all = store.load_all().unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["run-a"]);
        assert_eq!(all["run-a"].intensity_threshold, 4.5);
        assert_eq!(store.load_template().unwrap().max_cycle, 12);
    }

    #[test]
    fn fs_store_write_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsDocumentStore::new(dir.path().join("nested"), None);
        let doc = ExperimentDocument::template();
        store.write("a", &doc).unwrap();
        assert!(store.path_for("a").is_file());
        assert_eq!(store.load_all().unwrap()["a"], doc);
        store.delete("a").unwrap();
        store.delete("a").unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_empty_and_builtin_template_applies() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path().join("nope"), None);
        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.load_template().unwrap(), ExperimentDocument::template());

        let mut short = ExperimentDocument::template();
        short.max_cycle = 12;
        let store = store.with_fallback_template(short.clone());
        assert_eq!(store.load_template().unwrap(), short);
    }

    #[test]
    fn broken_yaml_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yml"), "max_cycle: [unterminated\n").unwrap();
        fs::write(dir.path().join("good.yml"), "").unwrap();
        let all = FsDocumentStore::new(dir.path(), None).load_all().unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["good"]);
    }
}
