//! File-based session state implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::registry::RxAddress;

use super::{LoadResult, SessionError, SessionStore};

/// Current session file format version.
///
/// Increment this when making breaking changes to the format.
const SESSION_FILE_VERSION: u32 = 1;

/// On-disk session file format.
///
/// Uses JSON for readability and debugging. The `version` field allows
/// future format migrations, though the current policy is to treat
/// incompatible versions as corrupted (no backward compatibility).
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    /// Format version for future compatibility.
    version: u32,

    /// Unix timestamp when the state was saved.
    /// For debugging purposes only; not used in logic.
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_at: Option<String>,

    /// The saved receiver addresses, in display order.
    receivers: Vec<RxAddress>,
}

impl SessionFile {
    fn new(addresses: &[RxAddress]) -> Self {
        Self {
            version: SESSION_FILE_VERSION,
            saved_at: Some(unix_timestamp_now()),
            receivers: addresses.to_vec(),
        }
    }
}

/// Returns the current Unix timestamp as a string.
fn unix_timestamp_now() -> String {
    use std::time::SystemTime;

    let now = SystemTime::now();
    let duration = now
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", duration.as_secs())
}

/// File-based implementation of [`SessionStore`].
///
/// Stores the receiver list as a JSON file with atomic write semantics.
///
/// # Atomic Writes
///
/// Uses write-to-temp-then-rename pattern to prevent corruption:
/// 1. Write to `{path}.tmp`
/// 2. Rename `{path}.tmp` to `{path}`
///
/// This ensures the file is either fully written or not written at all.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a new file-based session store at the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the session state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Performs the blocking save operation.
    ///
    /// Separated out so it can be wrapped in `spawn_blocking`.
    fn save_blocking(path: &Path, state: &SessionFile) -> Result<(), SessionError> {
        let content = serde_json::to_string_pretty(state).map_err(SessionError::Serialize)?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(SessionError::Write)?;
            }
        }

        // Append .tmp instead of replacing extension to avoid conflicts
        // (e.g., session.json -> session.json.tmp, not session.tmp)
        let temp_path = PathBuf::from(format!("{}.tmp", path.display()));

        std::fs::write(&temp_path, content).map_err(SessionError::Write)?;

        // Atomic rename (on most filesystems)
        std::fs::rename(&temp_path, path).map_err(SessionError::Write)?;

        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> LoadResult {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return LoadResult::NotFound,
            Err(e) => {
                return LoadResult::Corrupted {
                    reason: format!("Failed to read file: {e}"),
                };
            }
        };

        match serde_json::from_str::<SessionFile>(&content) {
            Ok(state) => {
                if state.version != SESSION_FILE_VERSION {
                    return LoadResult::Corrupted {
                        reason: format!(
                            "Incompatible version: expected {SESSION_FILE_VERSION}, got {}",
                            state.version
                        ),
                    };
                }
                LoadResult::Loaded(state.receivers)
            }
            Err(e) => LoadResult::Corrupted {
                reason: format!("Invalid JSON: {e}"),
            },
        }
    }

    async fn save(&self, addresses: &[RxAddress]) -> Result<(), SessionError> {
        let path = self.path.clone();
        let state = SessionFile::new(addresses);

        // Use spawn_blocking to avoid blocking the async runtime
        tokio::task::spawn_blocking(move || Self::save_blocking(&path, &state))
            .await
            .expect("spawn_blocking task panicked")
    }
}
