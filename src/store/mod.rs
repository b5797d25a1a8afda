//! Durable storage of trained models.
//!
//! Each model lives in `<root>/<key>.vtl` (see [`format`] for the layout).
//! Every save writes a uniquely named temporary file in the same directory,
//! fsyncs it and renames it over the target. Readers never observe a
//! half-written artifact, and concurrent saves of one key never share a file.

pub mod format;

use crate::error::{Result, VitalisError};
use crate::trainer::TrainedModel;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// File extension of model artifacts.
pub const EXTENSION: &str = "vtl";

/// Directory-backed model store.
///
/// # Example
///
/// ```no_run
/// use vitalis::store::ModelStore;
///
/// let store = ModelStore::new("models");
/// match store.load("health_model") {
///     Ok(model) => println!("labels: {:?}", model.labels().labels()),
///     Err(e) if e.is_not_found() => println!("train first"),
///     Err(e) => eprintln!("Error: {e}"),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    /// Creates a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the artifact for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::ValidationError`] for an empty key or one that
    /// could escape the root (path separators, `..`).
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }

    /// True if an artifact exists for `key`.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_ok_and(|p| p.is_file())
    }

    /// Writes `model` under `key`, replacing any previous artifact.
    ///
    /// # Errors
    ///
    /// Returns [`VitalisError::ValidationError`] for a bad key and
    /// [`VitalisError::Io`] if the file cannot be written.
    pub fn save(&self, model: &TrainedModel, key: &str) -> Result<PathBuf> {
        let path = self.path_for(key)?;
        let bytes = format::encode(model)?;

        fs::create_dir_all(&self.root)?;
        // Dropped on any early return, which removes the temporary file.
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        info!(key, path = %path.display(), bytes = bytes.len(), "model saved");
        Ok(path)
    }

    /// Reads the model stored under `key`.
    ///
    /// # Errors
    ///
    /// - [`VitalisError::NotFound`] if no artifact exists for `key`
    /// - [`VitalisError::CorruptModel`] if the artifact fails verification
    /// - [`VitalisError::ValidationError`] for a bad key
    pub fn load(&self, key: &str) -> Result<TrainedModel> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Err(VitalisError::NotFound {
                what: "model",
                path,
            });
        }

        let bytes = fs::read(&path)?;
        let model = format::decode(key, &bytes)?;
        debug!(key, path = %path.display(), bytes = bytes.len(), "model loaded");
        Ok(model)
    }
}

fn validate_key(key: &str) -> Result<()> {
    let problem = if key.is_empty() {
        Some("must not be empty")
    } else if key.contains(['/', '\\', '\0']) {
        Some("must not contain path separators")
    } else if key == "." || key.contains("..") {
        Some("must not contain '..'")
    } else {
        None
    };
    match problem {
        Some(msg) => Err(VitalisError::validation("key", format!("'{key}' {msg}"))),
        None => Ok(()),
    }
}
