//! Local session store.
//!
//! One string key maps to one opaque session-id value. The id is read once
//! at startup and written once if absent.

use crate::error::ChartyError;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

const SESSION_PREFIX: &str = "session_";
const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Persistent key-value slot.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ChartyError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), ChartyError>;
}

/// Stores values in a JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, ChartyError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(ChartyError::Session(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_slice(&data) {
            Ok(values) => Ok(values),
            Err(e) => {
                // A corrupt store is replaced rather than blocking startup
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Session store is not valid JSON, starting fresh"
                );
                Ok(BTreeMap::new())
            }
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ChartyError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ChartyError> {
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());

        let json = serde_json::to_vec_pretty(&values)
            .map_err(|e| ChartyError::Session(format!("cannot serialize session store: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ChartyError::Session(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }

        // Write to temp file, then rename into place
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &json)
            .await
            .map_err(|e| ChartyError::Session(format!("cannot write {}: {}", temp_path.display(), e)))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| ChartyError::Session(format!("cannot replace {}: {}", self.path.display(), e)))?;

        Ok(())
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ChartyError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ChartyError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Generate `session_<unix-millis>_<9 base36 chars>`.
pub fn generate_session_id() -> String {
    let mut entropy = uuid::Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(SESSION_SUFFIX_LEN);
    for _ in 0..SESSION_SUFFIX_LEN {
        suffix.push(BASE36[(entropy % 36) as usize] as char);
        entropy /= 36;
    }
    format!(
        "{}{}_{}",
        SESSION_PREFIX,
        Utc::now().timestamp_millis(),
        suffix
    )
}

/// Identifier of this client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// The id was generated during this startup
    pub created: bool,
}

impl Session {
    /// Read the id under `key`, generating and persisting one if absent.
    ///
    /// A store that cannot be written still yields a usable session; only
    /// the id's persistence is lost.
    pub async fn load_or_create(store: &dyn SessionStore, key: &str) -> Result<Self, ChartyError> {
        if let Some(id) = store.get(key).await?.filter(|id| !id.trim().is_empty()) {
            tracing::debug!(session_id = %id, "Restored session");
            return Ok(Self { id, created: false });
        }

        let id = generate_session_id();
        if let Err(e) = store.set(key, &id).await {
            tracing::warn!(error = %e, "Failed to persist session id");
        }
        tracing::info!(session_id = %id, "Created session");
        Ok(Self { id, created: true })
    }
}
