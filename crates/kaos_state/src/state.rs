//! Provisioning state persistence.
//!
//! State is stored in the project checkout under:
//! `.kaos/state.toml`
//!
//! File structure:
//! ```text
//! [BACKEND]
//! url = "http://10.0.0.4:8080/api"
//! token = "5f0c..."
//!
//! [INFRASTRUCTURE]
//! kubeconfig = "..."
//! ```
//!
//! Alongside it, Terraform leaves generated artifacts in the project root
//! (`config.json`, `terraform.tfstate`, `terraform.tfstate.backup` and the
//! `.terraform/` working tree). [`StateService::remove_build_files`] clears
//! all of them together.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{StateError, StateResult};

/// Section holding the backend connection.
pub const BACKEND: &str = "BACKEND";
/// Section holding cluster access.
pub const INFRASTRUCTURE: &str = "INFRASTRUCTURE";

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Fixed locations of the state file and generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    /// Sectioned state file
    pub state_file: PathBuf,
    /// Output artifact written by the IaC templates
    pub output_json: PathBuf,
    /// Terraform local state
    pub tf_state: PathBuf,
    /// Terraform local state backup
    pub tf_state_backup: PathBuf,
    /// Terraform working tree (providers, modules)
    pub tf_dir: PathBuf,
}

impl StatePaths {
    /// Default layout relative to a project root.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            state_file: root.join(".kaos").join("state.toml"),
            output_json: root.join("config.json"),
            tf_state: root.join("terraform.tfstate"),
            tf_state_backup: root.join("terraform.tfstate.backup"),
            tf_dir: root.join(".terraform"),
        }
    }

    /// Place the state file in a different directory.
    pub fn with_state_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.state_file = dir.as_ref().join("state.toml");
        self
    }

    /// Generated files removed on teardown (the state file excluded).
    pub fn artifact_files(&self) -> [&Path; 3] {
        [&self.tf_state, &self.output_json, &self.tf_state_backup]
    }

    /// What Terraform leaves in the directory its commands run in.
    pub fn engine_artifacts(work_dir: &Path) -> [PathBuf; 4] {
        [
            work_dir.join(".terraform"),
            work_dir.join("terraform.tfstate"),
            work_dir.join("terraform.tfstate.backup"),
            work_dir.join("terraform.tfstate.d"),
        ]
    }
}

type Failures = Vec<(PathBuf, std::io::Error)>;

fn remove_path(path: &Path, failures: &mut Failures) {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(_) => return,
    };
    if let Err(e) = result {
        warn!("Failed to remove {:?}: {}", path, e);
        failures.push((path.to_path_buf(), e));
    }
}

/// Sectioned key/value store for provisioning state.
///
/// Reads are served from memory; nothing reaches disk until [`write`](Self::write).
#[derive(Debug, Clone)]
pub struct StateService {
    paths: StatePaths,
    sections: Sections,
}

impl StateService {
    /// Open the state at `paths`, loading the file if it exists.
    pub fn load(paths: StatePaths) -> StateResult<Self> {
        let sections: Sections = if paths.state_file.is_file() {
            let content = fs::read_to_string(&paths.state_file)?;
            toml::from_str(&content).map_err(|source| StateError::Parse {
                path: paths.state_file.display().to_string(),
                source,
            })?
        } else {
            Sections::new()
        };

        debug!("Loaded state from {:?} ({} sections)", paths.state_file, sections.len());
        Ok(Self { paths, sections })
    }

    /// Get the configured paths.
    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    /// Whether the state file exists on disk.
    pub fn is_created(&self) -> bool {
        self.paths.state_file.is_file()
    }

    /// Create an empty state file (and its directory).
    pub fn create(&mut self) -> StateResult<()> {
        info!("Creating state at {:?}", self.paths.state_file);
        self.sections.clear();
        self.write()
    }

    /// Delete the state file and forget all sections.
    pub fn delete(&mut self) -> StateResult<()> {
        self.sections.clear();
        if self.paths.state_file.exists() {
            fs::remove_file(&self.paths.state_file)?;
            info!("Deleted state at {:?}", self.paths.state_file);
        }
        if let Some(dir) = self.paths.state_file.parent() {
            // Only succeeds when nothing else lives there.
            let _ = fs::remove_dir(dir);
        }
        Ok(())
    }

    /// Persist all sections atomically.
    pub fn write(&self) -> StateResult<()> {
        let dir = self
            .paths
            .state_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let content = toml::to_string(&self.sections)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&self.paths.state_file)
            .map_err(|e| StateError::Io(e.error))?;

        debug!("Wrote state to {:?}", self.paths.state_file);
        Ok(())
    }

    /// Whether a section is present.
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Read a value.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|values| values.get(key))
            .map(String::as_str)
    }

    /// Set one or more values in a section, creating it if needed.
    pub fn set<I, K, V>(&mut self, section: &str, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entry = self.sections.entry(section.to_string()).or_default();
        for (key, value) in values {
            entry.insert(key.into(), value.into());
        }
    }

    /// Fail unless the state file exists.
    pub fn require_created(&self) -> StateResult<()> {
        if self.is_created() {
            Ok(())
        } else {
            Err(StateError::NotCreated(self.paths.state_file.display().to_string()))
        }
    }

    /// Remove the state file and every generated artifact in the project root.
    ///
    /// Best effort: each path is attempted, failures are logged and returned.
    pub fn remove_build_files(&mut self) -> Failures {
        let mut failures = Vec::new();

        if let Err(e) = self.delete() {
            let path = self.paths.state_file.clone();
            warn!("Failed to remove {:?}: {}", path, e);
            failures.push((path, std::io::Error::new(std::io::ErrorKind::Other, e.to_string())));
        }

        remove_path(&self.paths.tf_dir, &mut failures);
        for file in self.paths.artifact_files() {
            remove_path(file, &mut failures);
        }

        info!("Removed build files");
        failures
    }

    /// Remove Terraform's working tree and local state from `work_dir`.
    ///
    /// Templates and anything else in the directory are left alone.
    pub fn remove_engine_files(&self, work_dir: &Path) -> Failures {
        let mut failures = Vec::new();
        for path in StatePaths::engine_artifacts(work_dir) {
            remove_path(&path, &mut failures);
        }
        debug!("Removed engine files from {:?}", work_dir);
        failures
    }
}
