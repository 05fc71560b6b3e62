use anyhow::Result;
use chrono::{DateTime, Utc};

use super::OptionalExt;
use crate::Database;
use crate::models::SessionRow;

impl Database {
    /// Inserts the session or replaces every field of an existing one.
    pub fn upsert_session(&self, session: &SessionRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, token, pending_email, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    user_id = excluded.user_id,
                    token = excluded.token,
                    pending_email = excluded.pending_email,
                    expires_at = excluded.expires_at",
                rusqlite::params![
                    session.id,
                    session.user_id,
                    session.token,
                    session.pending_email,
                    session.created_at,
                    session.expires_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Returns the session only while it is unexpired at `now`.
    pub fn get_session(&self, id: &str, now: DateTime<Utc>) -> Result<Option<SessionRow>> {
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, token, pending_email, created_at, expires_at
                 FROM sessions WHERE id = ?1",
                [id],
                |row| {
                    Ok(SessionRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        token: row.get(2)?,
                        pending_email: row.get(3)?,
                        created_at: row.get(4)?,
                        expires_at: row.get(5)?,
                    })
                },
            )
            .optional()
        })?;

        Ok(row.filter(|s| s.expires_at > now))
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Removes every session that expired at or before `now`.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", [now])?;
            Ok(n)
        })
    }
}
