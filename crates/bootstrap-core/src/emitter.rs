//! Writer for the environment-style peers file read by the etcd unit.
//!
//! ```text
//! ETCD_INITIAL_CLUSTER_STATE=new
//! ETCD_NAME=i-1
//! ETCD_INITIAL_CLUSTER="i-1=http://10.0.0.1:2380,i-2=http://10.0.0.2:2380"
//! ETCD_PROXY=off
//! ```

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::types::ReconciliationDecision;

/// The peers file could not be written.
#[derive(Debug, Error)]
#[error("failed to write {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Serialises a decision into the peers file, replacing any previous content.
#[derive(Debug, Clone)]
pub struct ConfigEmitter {
    path: PathBuf,
}

impl ConfigEmitter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renders the file content for `name`.
    #[must_use]
    pub fn render(decision: &ReconciliationDecision, name: &str) -> String {
        format!(
            "ETCD_INITIAL_CLUSTER_STATE={}\nETCD_NAME={}\nETCD_INITIAL_CLUSTER=\"{}\"\nETCD_PROXY={}\n",
            decision.cluster_state,
            name,
            decision.initial_cluster(),
            decision.proxy,
        )
    }

    /// Writes the rendered file through a uniquely named sibling temporary file and a
    /// rename, so concurrent writers never share a temporary file.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if the parent directory cannot be created or the file cannot
    /// be written or renamed into place.
    pub fn write(&self, decision: &ReconciliationDecision, name: &str) -> Result<(), WriteError> {
        let content = Self::render(decision, name);
        let wrap = |source| WriteError { path: self.path.clone(), source };

        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(wrap)?;
                parent
            }
            None => Path::new("."),
        };

        // Dropping the temporary file on any error removes it.
        let mut tmp = NamedTempFile::new_in(parent).map_err(wrap)?;
        tmp.write_all(content.as_bytes()).map_err(wrap)?;
        tmp.as_file().sync_all().map_err(wrap)?;
        tmp.persist(&self.path).map_err(|e| wrap(e.error))?;

        info!(
            path = %self.path.display(),
            cluster_state = %decision.cluster_state,
            peers_count = decision.final_peer_list.len(),
            "peers file written"
        );
        Ok(())
    }
}
