//! Portfolio KPI aggregation.
//!
//! This module is REACTIVE. It does not select bills or perform I/O —
//! the caller supplies the already-selected bill set (typically the
//! active dataset) together with the externally computed coverage
//! ratio and period-over-period deltas, and gets back one snapshot.

use crate::bill::BillRecord;
use crate::error::DeskResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Period-over-period deltas, supplied by the caller from historical
/// data and merely passed through into the snapshot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PeriodDeltas {
    pub revenue_change: f64,
    pub collection_change: f64,
    pub customer_change: f64,
    pub coverage_change: f64,
}

/// One portfolio snapshot, regenerated on demand from the current bill
/// set. Never stored by the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiSnapshot {
    pub total_revenue: f64,
    /// Percentage of revenue collected, 0–100, one decimal place.
    pub collection_rate: f64,
    /// Distinct account identifiers across the input.
    pub customer_count: i64,
    pub coverage_ratio: f64,
    pub revenue_change: f64,
    pub collection_change: f64,
    pub customer_change: f64,
    pub coverage_change: f64,
}

/// Reduce a bill set into one snapshot.
///
/// Every record is validated before any sum is taken — a single bad
/// record fails the whole aggregation with no partial result. The
/// output depends only on the multiset of records, not their order.
/// Empty input yields the defined zero snapshot.
pub fn aggregate(
    bills: &[BillRecord],
    coverage_ratio: f64,
    deltas: PeriodDeltas,
) -> DeskResult<KpiSnapshot> {
    for bill in bills {
        bill.validate()?;
    }

    let total_revenue: f64 = bills.iter().map(|b| b.amount).sum();
    let total_paid: f64 = bills.iter().filter(|b| b.paid).map(|b| b.amount).sum();
    let customer_count = bills
        .iter()
        .map(|b| b.account_id.as_str())
        .collect::<HashSet<_>>()
        .len() as i64;

    // Defined as 0 when there is no revenue: never divide by zero.
    let collection_rate = if total_revenue > 0.0 {
        round1(total_paid / total_revenue * 100.0)
    } else {
        0.0
    };

    Ok(KpiSnapshot {
        total_revenue,
        collection_rate,
        customer_count,
        coverage_ratio,
        revenue_change: deltas.revenue_change,
        collection_change: deltas.collection_change,
        customer_change: deltas.customer_change,
        coverage_change: deltas.coverage_change,
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
