//! Shared primitive types used across the entire crate.

/// A customer account identifier, as it appears on the bill.
pub type AccountId = String;

/// A billing period label, e.g. "2024-01" or "FY2024".
pub type PeriodLabel = String;

/// The store-assigned identifier of an audit record.
pub type AuditId = i64;
