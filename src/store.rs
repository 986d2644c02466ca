use crate::db;
use crate::gradebook::Gradebook;
use anyhow::Context;
use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;

const LAST_USER_KEY: &str = "session.lastUserId";

/// Where the gradebook document lives between runs.
///
/// `load` never fails: a missing or unreadable document yields an empty
/// gradebook. `save` writes the whole document; the caller keeps its
/// in-memory state whether or not the write succeeds.
pub trait StateStore {
    fn load(&self) -> Gradebook;
    fn save(&self, book: &Gradebook) -> anyhow::Result<()>;
    fn describe(&self) -> String;
}

/// Document store backed by the workspace SQLite database, one document per
/// user id.
pub struct SqliteStore {
    conn: Connection,
    user_id: String,
    label: String,
}

impl SqliteStore {
    pub fn open(workspace: &Path, user_id: &str) -> anyhow::Result<Self> {
        let conn = db::open_db(workspace)
            .with_context(|| format!("failed to open store in {}", workspace.to_string_lossy()))?;
        let last_user = db::settings_get_json(&conn, LAST_USER_KEY)
            .context("failed to read last user")?;
        if let Some(prev) = last_user.as_ref().and_then(|v| v.as_str()) {
            if prev != user_id {
                tracing::info!(previous = prev, user_id, "switching workspace user");
            }
        }
        db::settings_set_json(&conn, LAST_USER_KEY, &serde_json::json!(user_id))
            .context("failed to record last user")?;
        Ok(Self {
            conn,
            user_id: user_id.to_string(),
            label: format!("sqlite:{}#{}", workspace.to_string_lossy(), user_id),
        })
    }
}

impl StateStore for SqliteStore {
    fn load(&self) -> Gradebook {
        let body = match db::document_get(&self.conn, &self.user_id) {
            Ok(Some(body)) => body,
            Ok(None) => return Gradebook::default(),
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, "failed to read gradebook: {e:#}");
                return Gradebook::default();
            }
        };
        match Gradebook::from_json(&body) {
            Ok(book) => book,
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, "stored gradebook is corrupt, starting empty: {e}");
                Gradebook::default()
            }
        }
    }

    fn save(&self, book: &Gradebook) -> anyhow::Result<()> {
        let body = serde_json::to_string(book).context("failed to serialize gradebook")?;
        db::document_put(&self.conn, &self.user_id, &body).context("failed to write gradebook")?;
        tracing::debug!(user_id = %self.user_id, bytes = body.len(), "gradebook saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Keeps the serialized document in memory. Used by tests and when no
/// workspace is open.
#[derive(Default)]
pub struct MemoryStore {
    body: RefCell<Option<String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: RefCell::new(Some(body.into())),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Gradebook {
        self.body
            .borrow()
            .as_deref()
            .and_then(|b| Gradebook::from_json(b).ok())
            .unwrap_or_default()
    }

    fn save(&self, book: &Gradebook) -> anyhow::Result<()> {
        let body = serde_json::to_string(book).context("failed to serialize gradebook")?;
        *self.body.borrow_mut() = Some(body);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
