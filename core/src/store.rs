//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The ledger calls store methods — it never executes SQL directly.

use crate::audit::AuditRecord;
use crate::error::{DeskError, DeskResult};
use crate::types::AuditId;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::str::FromStr;

pub struct DeskStore {
    conn: Connection,
}

impl DeskStore {
    /// Open (or create) the desk database at `path`.
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: audit reads proceed concurrently with writes.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_audit.sql"))?;
        log::info!("store: schema migrations applied");
        Ok(())
    }

    // ── Audit ledger ───────────────────────────────────────────

    /// Insert one audit row inside an explicit transaction and return
    /// the assigned identifier. Commit-or-rollback on every exit path:
    /// the transaction rolls back on drop unless committed.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_audit(
        &mut self,
        action: &str,
        user_id: Option<i64>,
        user_email: Option<&str>,
        resource_type: Option<&str>,
        resource_id: Option<&str>,
        description: Option<&str>,
        payload: Option<&str>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        created_at: &str,
    ) -> DeskResult<AuditId> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO audit (
                action, user_id, user_email, resource_type, resource_id,
                description, payload, ip_address, user_agent, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                action,
                user_id,
                user_email,
                resource_type,
                resource_id,
                description,
                payload,
                ip_address,
                user_agent,
                created_at,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    /// The newest `limit` audit rows: created_at descending, ties
    /// broken by the most recently assigned identifier first.
    pub fn recent_audits(&self, limit: usize) -> DeskResult<Vec<AuditRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, action, user_id, user_email, resource_type, resource_id,
                    description, payload, ip_address, user_agent, created_at
             FROM audit
             ORDER BY created_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(AuditRow {
                    id: row.get(0)?,
                    action: row.get(1)?,
                    user_id: row.get(2)?,
                    user_email: row.get(3)?,
                    resource_type: row.get(4)?,
                    resource_id: row.get(5)?,
                    description: row.get(6)?,
                    payload: row.get(7)?,
                    ip_address: row.get(8)?,
                    user_agent: row.get(9)?,
                    created_at: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(AuditRow::into_record).collect()
    }

    pub fn audit_count(&self) -> DeskResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM audit", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

/// Raw audit row as stored; converted into the typed record outside
/// the rusqlite row mapper so parse failures surface as desk errors.
struct AuditRow {
    id: AuditId,
    action: String,
    user_id: Option<i64>,
    user_email: Option<String>,
    resource_type: Option<String>,
    resource_id: Option<String>,
    description: Option<String>,
    payload: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: String,
}

impl AuditRow {
    fn into_record(self) -> DeskResult<AuditRecord> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| {
                DeskError::Validation(format!(
                    "audit #{}: bad created_at '{}': {e}",
                    self.id, self.created_at
                ))
            })?
            .with_timezone(&Utc);
        let payload = self
            .payload
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(AuditRecord {
            id: self.id,
            action: crate::audit::AuditAction::from_str(&self.action)?,
            user_id: self.user_id,
            user_email: self.user_email,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            description: self.description,
            payload,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at,
        })
    }
}
