//! Session persistence
//!
//! A [`SessionStore`] keeps two documents per session id: the history list and
//! the session record. Both are read and written whole.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::history::HistoryEntry;
use crate::session::Session;

const MAX_SESSION_ID_LEN: usize = 128;

/// Session ids are 1 to 128 characters of `[A-Za-z0-9_-]`.
pub fn validate_session_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidSessionId(id.to_string()))
    }
}

/// Storage for per-session documents.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Newest-first history; empty when nothing was saved yet.
    async fn load_history(&self, id: &str) -> Result<Vec<HistoryEntry>>;

    /// Replace the stored history.
    async fn save_history(&self, id: &str, entries: &[HistoryEntry]) -> Result<()>;

    /// Session record, if one was saved.
    async fn load_session(&self, id: &str) -> Result<Option<Session>>;

    /// Replace the stored session record.
    async fn save_session(&self, id: &str, session: &Session) -> Result<()>;
}

/// Process-lifetime store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    histories: RwLock<HashMap<String, Vec<HistoryEntry>>>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load_history(&self, id: &str) -> Result<Vec<HistoryEntry>> {
        validate_session_id(id)?;
        Ok(self
            .histories
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_history(&self, id: &str, entries: &[HistoryEntry]) -> Result<()> {
        validate_session_id(id)?;
        self.histories
            .write()
            .await
            .insert(id.to_string(), entries.to_vec());
        Ok(())
    }

    async fn load_session(&self, id: &str) -> Result<Option<Session>> {
        validate_session_id(id)?;
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save_session(&self, id: &str, session: &Session) -> Result<()> {
        validate_session_id(id)?;
        self.sessions
            .write()
            .await
            .insert(id.to_string(), session.clone());
        Ok(())
    }
}

/// JSON documents in a directory: `<id>.history.json` and `<id>.session.json`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never sees a half-written document.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store rooted at `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn history_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.history.json", id))
    }

    pub fn session_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.session.json", id))
    }

    async fn read_document(path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "store document written");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load_history(&self, id: &str) -> Result<Vec<HistoryEntry>> {
        validate_session_id(id)?;
        match Self::read_document(&self.history_path(id)).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_history(&self, id: &str, entries: &[HistoryEntry]) -> Result<()> {
        validate_session_id(id)?;
        let bytes = serde_json::to_vec_pretty(entries)?;
        self.write_document(&self.history_path(id), &bytes).await
    }

    async fn load_session(&self, id: &str) -> Result<Option<Session>> {
        validate_session_id(id)?;
        match Self::read_document(&self.session_path(id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save_session(&self, id: &str, session: &Session) -> Result<()> {
        validate_session_id(id)?;
        let bytes = serde_json::to_vec_pretty(session)?;
        self.write_document(&self.session_path(id), &bytes).await
    }
}
