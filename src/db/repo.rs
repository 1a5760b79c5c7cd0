use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::icons::UnknownIcon;
use crate::types::{ItemCount, Opus, OpusTypeConfig};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("opus {0} not found")]
    OpusNotFound(String),

    #[error("opus type '{key}' is invalid: {source}")]
    InvalidIcon {
        key: String,
        #[source]
        source: UnknownIcon,
    },
}

/// Fields needed to create an opus.
#[derive(Debug, Clone, Default)]
pub struct NewOpus {
    pub name: String,
    pub content: String,
    pub raison_detre: String,
    pub opus_type: String,
    pub is_strategic: bool,
    pub is_dynamic: bool,
}

/// Session information
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub token: String,
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

const OPUS_COLUMNS: &str = "o.id, o.name, o.content, o.raison_detre, o.opus_type, \
     o.is_strategic, o.is_dynamic, o.created_at, o.updated_at, \
     (SELECT COUNT(*) FROM opus_items i WHERE i.opus_id = o.id), \
     o.last_commit_hash, o.last_commit_at, o.last_push_at";

/// Opus repository for database operations
#[derive(Clone)]
pub struct OpusRepo {
    conn: Arc<Mutex<Connection>>,
}

impl OpusRepo {
    /// Create a new OpusRepo with the given connection
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    // ===== Opus operations =====

    /// List opuses, newest first, optionally restricted to one type
    pub fn list_opuses(&self, opus_type: Option<&str>) -> Result<Vec<Opus>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {OPUS_COLUMNS} FROM opuses o \
             WHERE (?1 IS NULL OR o.opus_type = ?1) \
             ORDER BY o.created_at DESC, o.rowid DESC"
        ))?;
        let opuses = stmt
            .query_map(params![opus_type], opus_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(opuses)
    }

    pub fn get_opus(&self, opus_id: &str) -> Result<Option<Opus>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let opus = conn
            .query_row(
                &format!("SELECT {OPUS_COLUMNS} FROM opuses o WHERE o.id = ?"),
                [opus_id],
                opus_from_row,
            )
            .optional()?;
        Ok(opus)
    }

    pub fn create_opus(&self, new: &NewOpus) -> Result<Opus, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();
        {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO opuses (id, name, content, raison_detre, opus_type, is_strategic, is_dynamic, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    new.name,
                    new.content,
                    new.raison_detre,
                    new.opus_type,
                    new.is_strategic,
                    new.is_dynamic,
                    now,
                    now
                ],
            )?;
        }
        self.get_opus(&id)?.ok_or(StoreError::OpusNotFound(id))
    }

    /// Store the outcome of a git sync on the opus. `pushed_at` is only
    /// written when present; an earlier push time is kept otherwise.
    pub fn record_commit(
        &self,
        opus_id: &str,
        commit_hash: &str,
        committed_at: DateTime<Utc>,
        pushed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE opuses SET last_commit_hash = ?, last_commit_at = ?, \
             last_push_at = COALESCE(?, last_push_at) WHERE id = ?",
            params![
                commit_hash,
                committed_at.timestamp(),
                pushed_at.map(|t| t.timestamp()),
                opus_id
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::OpusNotFound(opus_id.to_string()));
        }
        Ok(())
    }

    // ===== Type vocabulary =====

    /// All type configurations in display order. An unknown icon name is an
    /// error, not a fallback.
    pub fn list_type_configs(&self) -> Result<Vec<OpusTypeConfig>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT key, label, icon, color, text_color FROM opus_types ORDER BY sort_order, key",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(key, label, icon, color, text_color)| {
                let icon = icon
                    .parse()
                    .map_err(|source| StoreError::InvalidIcon {
                        key: key.clone(),
                        source,
                    })?;
                Ok(OpusTypeConfig {
                    key,
                    label,
                    icon,
                    color,
                    text_color,
                })
            })
            .collect()
    }

    // ===== Session operations =====

    /// Create a session (returns token)
    pub fn create_session(
        &self,
        user_id: &str,
        name: Option<&str>,
        email: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let token = uuid::Uuid::new_v4().to_string();
        self.insert_session(&token, user_id, name, email, expires_at)?;
        Ok(token)
    }

    /// Insert or replace a session with a caller-chosen token
    pub fn insert_session(
        &self,
        token: &str,
        user_id: &str,
        name: Option<&str>,
        email: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO sessions (token, user_id, name, email, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                token,
                user_id,
                name,
                email,
                expires_at.timestamp(),
                Utc::now().timestamp()
            ],
        )?;
        Ok(())
    }

    /// Look up an unexpired session by token
    pub fn find_session(&self, token: &str) -> Result<Option<SessionInfo>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let session = conn
            .query_row(
                "SELECT token, user_id, name, email, expires_at FROM sessions \
                 WHERE token = ? AND expires_at > ?",
                params![token, Utc::now().timestamp()],
                |row| {
                    Ok(SessionInfo {
                        token: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        email: row.get(3)?,
                        expires_at: timestamp_to_datetime(row.get(4)?),
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    /// Delete sessions past their expiry; returns how many were removed
    pub fn cleanup_expired_sessions(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM sessions WHERE expires_at < ?",
            [Utc::now().timestamp()],
        )?;
        Ok(deleted)
    }
}

fn opus_from_row(row: &Row<'_>) -> rusqlite::Result<Opus> {
    Ok(Opus {
        id: row.get(0)?,
        name: row.get(1)?,
        content: row.get(2)?,
        raison_detre: row.get(3)?,
        opus_type: row.get(4)?,
        is_strategic: row.get(5)?,
        is_dynamic: row.get(6)?,
        created_at: timestamp_to_datetime(row.get(7)?),
        updated_at: timestamp_to_datetime(row.get(8)?),
        count: ItemCount {
            items: row.get(9)?,
        },
        last_commit_hash: row.get(10)?,
        last_commit_at: row.get::<_, Option<i64>>(11)?.map(timestamp_to_datetime),
        last_push_at: row.get::<_, Option<i64>>(12)?.map(timestamp_to_datetime),
    })
}

fn timestamp_to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now)
}
