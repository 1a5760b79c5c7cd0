use rusqlite::Connection;

/// SQL schema for the opus store
const SCHEMA: &str = r#"
-- Fixed type vocabulary
CREATE TABLE IF NOT EXISTS opus_types (
    key TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    icon TEXT NOT NULL,
    color TEXT NOT NULL,
    text_color TEXT NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0
);

-- Opuses
CREATE TABLE IF NOT EXISTS opuses (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    raison_detre TEXT NOT NULL DEFAULT '',
    opus_type TEXT NOT NULL,
    is_strategic INTEGER NOT NULL DEFAULT 0,
    is_dynamic INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    last_commit_hash TEXT,
    last_commit_at INTEGER,
    last_push_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_opuses_type ON opuses(opus_type);
CREATE INDEX IF NOT EXISTS idx_opuses_created ON opuses(created_at);

-- Items attached to an opus (only counted here)
CREATE TABLE IF NOT EXISTS opus_items (
    id TEXT PRIMARY KEY,
    opus_id TEXT NOT NULL REFERENCES opuses(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_opus_items_opus_id ON opus_items(opus_id);

-- Sessions issued by the auth provider
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT,
    email TEXT,
    expires_at INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);

-- Default vocabulary
INSERT OR IGNORE INTO opus_types (key, label, icon, color, text_color, sort_order) VALUES
    ('project', 'Project', 'FolderKanban', 'bg-sky-100', 'text-sky-700', 0),
    ('task', 'Task', 'ListChecks', 'bg-emerald-100', 'text-emerald-700', 1),
    ('vision', 'Vision', 'Compass', 'bg-violet-100', 'text-violet-700', 2),
    ('knowledge', 'Knowledge', 'BookOpen', 'bg-amber-100', 'text-amber-700', 3);
"#;

/// Create tables and seed the default type vocabulary. Safe to run on every
/// start.
pub fn init_database(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_and_seeds_types() {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        init_database(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM opus_types", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 4);
    }
}
