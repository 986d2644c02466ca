use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::gradebook::Gradebook;
use crate::session::SessionRegistry;
use crate::store::{MemoryStore, SqliteStore, StateStore};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything one sidecar process owns. The gradebook is authoritative;
/// the store is only written after a command changed it.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<Box<dyn StateStore>>,
    pub book: Gradebook,
    pub sessions: SessionRegistry,
    pub user_id: String,
    changed: bool,
}

impl AppState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            workspace: None,
            store: Some(Box::new(MemoryStore::default())),
            book: Gradebook::default(),
            sessions: SessionRegistry::default(),
            user_id: user_id.into(),
            changed: false,
        }
    }

    /// Opens the workspace store and replaces the in-memory state with the
    /// user's stored gradebook.
    pub fn open_workspace(&mut self, path: &Path, user_id: &str) -> anyhow::Result<()> {
        let store = SqliteStore::open(path, user_id)?;
        self.book = store.load();
        tracing::info!(
            store = %store.describe(),
            courses = self.book.courses.len(),
            "workspace opened"
        );
        self.store = Some(Box::new(store));
        self.workspace = Some(path.to_path_buf());
        self.user_id = user_id.to_string();
        self.sessions.clear();
        self.changed = false;
        Ok(())
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// Saves the gradebook if a command changed it. A failed save leaves the
    /// in-memory state as is and is reported to the caller.
    pub fn persist_if_changed(&mut self) -> Option<anyhow::Result<()>> {
        if !std::mem::take(&mut self.changed) {
            return None;
        }
        let store = self.store.as_ref()?;
        let res = store.save(&self.book);
        if let Err(e) = &res {
            tracing::warn!(store = %store.describe(), "failed to save gradebook: {e:#}");
        }
        Some(res)
    }
}
