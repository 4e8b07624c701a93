//! The audit ledger — the system of record for "who did what, when".
//!
//! RULES:
//!   - Append-only: a committed record is never mutated or deleted.
//!   - Every append is one atomic transaction; a failed commit surfaces
//!     to the operation that requested the audit.
//!   - Known-sensitive payload keys are stripped before persisting.
//!     Password material never reaches the store.

use crate::access::Principal;
use crate::error::{DeskError, DeskResult};
use crate::store::DeskStore;
use crate::types::AuditId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Every privileged action kind the ledger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Login,
    Logout,
    Upload,
    ForecastRun,
    RateOptimize,
    UserCreate,
    UserUpdate,
    UserDelete,
    DataExport,
    SystemConfig,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::Upload => "upload",
            AuditAction::ForecastRun => "forecast_run",
            AuditAction::RateOptimize => "rate_optimize",
            AuditAction::UserCreate => "user_create",
            AuditAction::UserUpdate => "user_update",
            AuditAction::UserDelete => "user_delete",
            AuditAction::DataExport => "data_export",
            AuditAction::SystemConfig => "system_config",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(AuditAction::Login),
            "logout" => Ok(AuditAction::Logout),
            "upload" => Ok(AuditAction::Upload),
            "forecast_run" => Ok(AuditAction::ForecastRun),
            "rate_optimize" => Ok(AuditAction::RateOptimize),
            "user_create" => Ok(AuditAction::UserCreate),
            "user_update" => Ok(AuditAction::UserUpdate),
            "user_delete" => Ok(AuditAction::UserDelete),
            "data_export" => Ok(AuditAction::DataExport),
            "system_config" => Ok(AuditAction::SystemConfig),
            other => Err(DeskError::Validation(format!(
                "unknown audit action '{other}'"
            ))),
        }
    }
}

/// Caller-facing origin metadata: where the request came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Origin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Origin {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            user_agent: Some(user_agent.into()),
        }
    }
}

/// An audit record as submitted by a caller, before the store assigns
/// its identifier and timestamp.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub description: Option<String>,
    pub payload: Option<Value>,
    pub origin: Origin,
}

impl NewAuditEntry {
    /// A system-initiated event: no acting principal.
    pub fn system(action: AuditAction) -> Self {
        Self {
            action,
            user_id: None,
            user_email: None,
            resource_type: None,
            resource_id: None,
            description: None,
            payload: None,
            origin: Origin::default(),
        }
    }

    pub fn by(action: AuditAction, principal: &Principal) -> Self {
        let mut entry = Self::system(action);
        entry.user_id = Some(principal.id);
        entry.user_email = Some(principal.email.clone());
        entry
    }

    pub fn resource(mut self, resource_type: impl Into<String>, resource_id: impl ToString) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.to_string());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }
}

/// One committed, immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub id: AuditId,
    pub action: AuditAction,
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub description: Option<String>,
    pub payload: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The wire shape exposed to the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditSummary {
    pub id: AuditId,
    pub action: AuditAction,
    pub resource: Option<String>,
    pub user_email: String,
    pub timestamp: String,
    pub description: Option<String>,
    pub ip_address: Option<String>,
}

impl AuditRecord {
    pub fn summary(&self) -> AuditSummary {
        let resource = match (&self.resource_type, &self.resource_id) {
            (Some(t), Some(i)) => Some(format!("{t}:{i}")),
            _ => None,
        };
        AuditSummary {
            id: self.id,
            action: self.action,
            resource,
            user_email: self
                .user_email
                .clone()
                .unwrap_or_else(|| "System".to_string()),
            timestamp: self.created_at.to_rfc3339(),
            description: self.description.clone(),
            ip_address: self.ip_address.clone(),
        }
    }
}

/// Payload keys that must never be persisted, matched as lowercase
/// substrings of the key name.
const SENSITIVE_KEYS: [&str; 5] = ["password", "secret", "token", "api_key", "credential"];

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

/// Strip known-sensitive keys from a payload, recursively through
/// nested objects and arrays.
pub fn scrub_payload(payload: Value) -> Value {
    match payload {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !is_sensitive(key))
                .map(|(key, value)| (key, scrub_payload(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(scrub_payload).collect()),
        other => other,
    }
}

/// The append-only ledger over the SQLite store.
pub struct AuditLedger {
    store: DeskStore,
}

impl AuditLedger {
    pub fn new(store: DeskStore) -> Self {
        Self { store }
    }

    /// Commit one audit record. Assigns the next identifier and the
    /// creation timestamp; scrubs the payload first. The write is one
    /// atomic transaction — a failed commit propagates as a
    /// persistence error and the triggering action must not be
    /// reported as fully succeeded.
    pub fn append(&mut self, entry: NewAuditEntry) -> DeskResult<AuditRecord> {
        let payload = match entry.payload {
            Some(value) => {
                let scrubbed = scrub_payload(value);
                Some(serde_json::to_string(&scrubbed)?)
            }
            None => None,
        };
        let created_at = Utc::now();

        let id = self.store.insert_audit(
            entry.action.as_str(),
            entry.user_id,
            entry.user_email.as_deref(),
            entry.resource_type.as_deref(),
            entry.resource_id.as_deref(),
            entry.description.as_deref(),
            payload.as_deref(),
            entry.origin.ip_address.as_deref(),
            entry.origin.user_agent.as_deref(),
            &created_at.to_rfc3339(),
        )?;

        log::debug!(
            "audit: appended #{id} action={} user={}",
            entry.action,
            entry.user_email.as_deref().unwrap_or("System")
        );

        Ok(AuditRecord {
            id,
            action: entry.action,
            user_id: entry.user_id,
            user_email: entry.user_email,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            description: entry.description,
            payload: payload.map(|p| serde_json::from_str(&p)).transpose()?,
            ip_address: entry.origin.ip_address,
            user_agent: entry.origin.user_agent,
            created_at,
        })
    }

    /// The newest `limit` records, most recent first. Ties on the
    /// creation timestamp order the most recently assigned identifier
    /// first. Read-only; safe for concurrent callers.
    pub fn recent(&self, limit: usize) -> DeskResult<Vec<AuditRecord>> {
        self.store.recent_audits(limit)
    }

    pub fn count(&self) -> DeskResult<i64> {
        self.store.audit_count()
    }
}
