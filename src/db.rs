use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "clasfy.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    tracing::debug!(path = %db_path.display(), "workspace database ready");
    Ok(conn)
}

/// Raw stored text for `key`. Callers decode it, so a corrupt value surfaces
/// as their parse error instead of reading as absent.
pub fn settings_get_text(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value_json FROM settings WHERE key = ?",
        [key],
        |r| r.get(0),
    )
    .optional()
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json, updated_at)
         VALUES(?, ?, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET
           value_json = excluded.value_json,
           updated_at = excluded.updated_at",
        (key, value.to_string()),
    )?;
    Ok(())
}

pub fn settings_delete(conn: &Connection, key: &str) -> rusqlite::Result<bool> {
    let n = conn.execute("DELETE FROM settings WHERE key = ?", [key])?;
    Ok(n > 0)
}
