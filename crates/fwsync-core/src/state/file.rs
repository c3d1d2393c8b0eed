// # File State Store
//
// File-based implementation of StateStore.
//
// ## File Format
//
// A bare JSON array holding the last observed addresses in resolver order:
//
// ```json
// ["203.0.113.7", "2001:db8::7"]
// ```
//
// ## Crash Safety
//
// - Atomic writes: new state is written to a `.tmp` sibling, flushed, then
//   renamed over the record
// - A missing file means "no previous run" and loads as an empty set
// - A file that exists but does not parse is reported, never silently reset

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::model::AddressSet;
use crate::traits::state_store::StateStore;

/// Default location of the address record, relative to the working directory
pub const DEFAULT_STATE_FILE: &str = "old_ips.json";

/// File-based state store
///
/// # Example
///
/// ```rust,no_run
/// use fwsync_core::state::FileStateStore;
/// use fwsync_core::traits::StateStore;
/// use fwsync_core::AddressSet;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/fwsync/old_ips.json");
///
///     let current = AddressSet::from_lookups(Some("1.2.3.4".into()), None);
///     store.save(&current).await?;
///
///     assert_eq!(store.load().await?, current);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a store backed by `path`
    ///
    /// Nothing is read or created until the first `load()` or `save()`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the address record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    async fn write_atomically(&self, json: &[u8]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::state_save(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_save(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json).await.map_err(|e| {
                Error::state_save(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::state_save(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_save(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })
    }
}

impl Default for FileStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_FILE)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<AddressSet, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "No previous address record at {}, new installation?",
                    self.path.display()
                );
                return Ok(AddressSet::new());
            }
            Err(e) => {
                return Err(Error::state_load(format!(
                    "Failed to read state file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let addresses: AddressSet = serde_json::from_str(&content).map_err(|e| {
            Error::state_load(format!(
                "Failed to parse state file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(
            "Loaded previous addresses {} from {}",
            addresses,
            self.path.display()
        );
        Ok(addresses)
    }

    async fn save(&self, addresses: &AddressSet) -> Result<(), Error> {
        let json = serde_json::to_vec(addresses)
            .map_err(|e| Error::state_save(format!("Failed to serialize addresses: {}", e)))?;

        self.write_atomically(&json).await?;

        tracing::trace!("Addresses written to {}", self.path.display());
        Ok(())
    }
}
