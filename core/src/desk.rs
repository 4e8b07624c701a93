//! The rate desk — the privileged-operation facade the transport layer
//! calls into.
//!
//! RULES:
//!   - Every operation authorizes first, acts second, audits last.
//!   - The audit record is written regardless of the authorization
//!     outcome: denials are audit-worthy.
//!   - A failed audit commit fails the whole operation, even when the
//!     computation itself succeeded.

use crate::access::{self, Principal, Role};
use crate::audit::{AuditAction, AuditLedger, AuditRecord, NewAuditEntry, Origin};
use crate::bill::{BillRecord, CustomerClass};
use crate::error::{DeskError, DeskResult};
use crate::impact::{self, ClassImpact};
use crate::kpi::{self, KpiSnapshot, PeriodDeltas};
use crate::store::DeskStore;
use crate::tariff::RateStructure;
use serde_json::json;
use std::collections::BTreeMap;

pub struct RateDesk {
    ledger: AuditLedger,
}

impl RateDesk {
    pub fn new(store: DeskStore) -> Self {
        Self {
            ledger: AuditLedger::new(store),
        }
    }

    /// Open (or create) a desk over a file-backed database, applying
    /// migrations.
    pub fn open(path: &str) -> DeskResult<Self> {
        let store = DeskStore::open(path)?;
        store.migrate()?;
        Ok(Self::new(store))
    }

    /// A desk over an in-memory database (used in tests and demos).
    pub fn in_memory() -> DeskResult<Self> {
        let store = DeskStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(store))
    }

    /// Compute one bill under a rate structure. Requires analyst.
    pub fn compute_bill(
        &mut self,
        principal: &Principal,
        structure: &RateStructure,
        consumption: f64,
        origin: Origin,
    ) -> DeskResult<f64> {
        let allowed = access::authorize(principal.role, Role::Analyst);
        let outcome = allowed.then(|| structure.bill_for(consumption));

        let entry = NewAuditEntry::by(AuditAction::RateOptimize, principal)
            .description(format!("computed bill for {consumption} consumption units"))
            .payload(json!({
                "authorized": allowed,
                "succeeded": matches!(outcome, Some(Ok(_))),
                "consumption": consumption,
                "structure": structure.summary(),
            }))
            .origin(origin);
        self.ledger.append(entry)?;

        self.resolve(principal, Role::Analyst, outcome)
    }

    /// Model the impact of a proposed structure on a bill set.
    /// Requires analyst.
    pub fn model_impacts(
        &mut self,
        principal: &Principal,
        bills: &[BillRecord],
        proposed: &RateStructure,
        origin: Origin,
    ) -> DeskResult<BTreeMap<CustomerClass, ClassImpact>> {
        let allowed = access::authorize(principal.role, Role::Analyst);
        let outcome = allowed.then(|| impact::model_impacts(bills, proposed));

        let entry = NewAuditEntry::by(AuditAction::RateOptimize, principal)
            .description(format!("modeled bill impacts across {} bills", bills.len()))
            .payload(json!({
                "authorized": allowed,
                "succeeded": matches!(outcome, Some(Ok(_))),
                "bill_count": bills.len(),
                "structure": proposed.summary(),
            }))
            .origin(origin);
        self.ledger.append(entry)?;

        self.resolve(principal, Role::Analyst, outcome)
    }

    /// Aggregate the current bill set into a KPI snapshot. Requires
    /// viewer.
    pub fn refresh_kpis(
        &mut self,
        principal: &Principal,
        bills: &[BillRecord],
        coverage_ratio: f64,
        deltas: PeriodDeltas,
        origin: Origin,
    ) -> DeskResult<KpiSnapshot> {
        let allowed = access::authorize(principal.role, Role::Viewer);
        let outcome = allowed.then(|| kpi::aggregate(bills, coverage_ratio, deltas));

        let entry = NewAuditEntry::by(AuditAction::DataExport, principal)
            .description(format!("aggregated portfolio KPIs over {} bills", bills.len()))
            .payload(json!({
                "authorized": allowed,
                "succeeded": matches!(outcome, Some(Ok(_))),
                "bill_count": bills.len(),
            }))
            .origin(origin);
        self.ledger.append(entry)?;

        self.resolve(principal, Role::Viewer, outcome)
    }

    /// Read the newest `limit` audit records. Requires admin, and the
    /// read itself is audited.
    pub fn audit_trail(
        &mut self,
        principal: &Principal,
        limit: usize,
        origin: Origin,
    ) -> DeskResult<Vec<AuditRecord>> {
        let allowed = access::authorize(principal.role, Role::Admin);
        let outcome = allowed.then(|| self.ledger.recent(limit));

        let entry = NewAuditEntry::by(AuditAction::DataExport, principal)
            .resource("audit", "trail")
            .description(format!("read audit trail (limit {limit})"))
            .payload(json!({ "authorized": allowed, "limit": limit }))
            .origin(origin);
        self.ledger.append(entry)?;

        self.resolve(principal, Role::Admin, outcome)
    }

    /// Record a successful login. No role gate — authentication
    /// happened upstream.
    pub fn record_login(&mut self, principal: &Principal, origin: Origin) -> DeskResult<AuditRecord> {
        self.ledger.append(
            NewAuditEntry::by(AuditAction::Login, principal)
                .description("user logged in")
                .origin(origin),
        )
    }

    pub fn record_logout(
        &mut self,
        principal: &Principal,
        origin: Origin,
    ) -> DeskResult<AuditRecord> {
        self.ledger.append(
            NewAuditEntry::by(AuditAction::Logout, principal)
                .description("user logged out")
                .origin(origin),
        )
    }

    /// Append an arbitrary audit entry on behalf of the surrounding
    /// layers (uploads, user management, system configuration).
    pub fn record(&mut self, entry: NewAuditEntry) -> DeskResult<AuditRecord> {
        self.ledger.append(entry)
    }

    pub fn audit_count(&self) -> DeskResult<i64> {
        self.ledger.count()
    }

    /// Collapse the authorize/act pair: a missing outcome means the
    /// principal was denied.
    fn resolve<T>(
        &self,
        principal: &Principal,
        required: Role,
        outcome: Option<DeskResult<T>>,
    ) -> DeskResult<T> {
        match outcome {
            Some(result) => result,
            None => {
                log::warn!(
                    "desk: denied {} (role {}, requires {})",
                    principal.email,
                    principal.role,
                    required
                );
                Err(DeskError::Authorization {
                    role: principal.role.to_string(),
                    required: required.to_string(),
                })
            }
        }
    }
}
