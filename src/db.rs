use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "rollbook.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS state_documents(
            user_id TEXT PRIMARY KEY,
            body TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    // Workspaces created before updated_at existed.
    ensure_state_documents_updated_at(&conn)?;

    Ok(conn)
}

pub fn document_get(conn: &Connection, user_id: &str) -> anyhow::Result<Option<String>> {
    let body = conn
        .query_row(
            "SELECT body FROM state_documents WHERE user_id = ?",
            [user_id],
            |r| r.get::<_, String>(0),
        )
        .optional()?;
    Ok(body)
}

pub fn document_put(conn: &Connection, user_id: &str, body: &str) -> anyhow::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO state_documents(user_id, body, updated_at)
         VALUES(?, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
           body = excluded.body,
           updated_at = excluded.updated_at",
        (user_id, body, &now),
    )?;
    Ok(())
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get::<_, String>(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, value.to_string()),
    )?;
    Ok(())
}

fn ensure_state_documents_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "state_documents", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE state_documents ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
