//! Session snapshot file.

use crate::types::SessionSnapshot;
use crate::{SessionError, SessionResult};
use std::fs;
use std::path::{Path, PathBuf};

/// A single JSON snapshot file.
///
/// `save` and `restore` are best-effort: failures are logged and reported as
/// "nothing saved" / "nothing to restore" so the simulation never stops on
/// disk trouble. The `try_*` variants surface the error.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, path: &Path) -> impl FnOnce(std::io::Error) -> SessionError {
        let path = path.to_path_buf();
        move |source| SessionError::Io { path, source }
    }

    /// Write the snapshot, replacing any previous file atomically.
    pub fn try_save(&self, snapshot: &SessionSnapshot) -> SessionResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(self.io_err(dir))?;
        }
        let json = serde_json::to_vec(snapshot).map_err(|source| SessionError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(self.io_err(&tmp))?;
        fs::rename(&tmp, &self.path).map_err(self.io_err(&self.path))?;
        Ok(())
    }

    /// Best-effort save. Returns whether the snapshot was written.
    pub fn save(&self, snapshot: &SessionSnapshot) -> bool {
        match self.try_save(snapshot) {
            Ok(()) => {
                tracing::debug!(
                    path = %self.path.display(),
                    readings = snapshot.readings.len(),
                    "session saved"
                );
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping session save");
                false
            }
        }
    }

    /// Read the snapshot. A missing file is `Ok(None)`.
    pub fn try_load(&self) -> SessionResult<Option<SessionSnapshot>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(&self.path)(e)),
        };
        let snapshot = serde_json::from_slice(&content).map_err(|source| SessionError::Json {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    /// Startup restore. Missing or unreadable files mean no prior session.
    pub fn restore(&self) -> Option<SessionSnapshot> {
        match self.try_load() {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    path = %self.path.display(),
                    readings = snapshot.readings.len(),
                    "restored session"
                );
                Some(snapshot)
            }
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "no session to restore, starting fresh");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session file, starting fresh");
                None
            }
        }
    }

    /// Remove the snapshot file if present.
    pub fn try_delete(&self) -> SessionResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(&self.path)(e)),
        }
    }

    pub fn delete(&self) {
        if let Err(e) = self.try_delete() {
            tracing::warn!(error = %e, "could not delete session file");
        }
    }
}
