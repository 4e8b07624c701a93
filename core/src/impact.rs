//! Bill impact modeling — what a proposed tariff would do to the
//! historical bill set, broken down by customer class.

use crate::bill::{BillRecord, CustomerClass};
use crate::error::DeskResult;
use crate::tariff::RateStructure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Impact of a proposed structure on one customer class, in percent
/// change from the recorded amount to the recomputed amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClassImpact {
    pub avg_increase: f64,
    pub max_increase: f64,
    pub bill_count: usize,
}

/// Recompute every bill under `proposed` and aggregate the percentage
/// change per customer class.
///
/// Bills with a zero recorded amount carry no percentage baseline and
/// are excluded. Classes absent from the input (or with no qualifying
/// bills) are absent from the result. Validation and configuration
/// errors fail the whole model — no partial maps.
pub fn model_impacts(
    bills: &[BillRecord],
    proposed: &RateStructure,
) -> DeskResult<BTreeMap<CustomerClass, ClassImpact>> {
    proposed.validate()?;
    for bill in bills {
        bill.validate()?;
    }

    let mut per_class: BTreeMap<CustomerClass, Vec<f64>> = BTreeMap::new();
    for bill in bills {
        if bill.amount == 0.0 {
            continue;
        }
        let recomputed = proposed.bill_for(bill.consumption)?;
        let increase = (recomputed - bill.amount) / bill.amount * 100.0;
        per_class.entry(bill.customer_class).or_default().push(increase);
    }

    Ok(per_class
        .into_iter()
        .map(|(class, increases)| {
            let avg = increases.iter().sum::<f64>() / increases.len() as f64;
            let max = increases.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (
                class,
                ClassImpact {
                    avg_increase: round1(avg),
                    max_increase: round1(max),
                    bill_count: increases.len(),
                },
            )
        })
        .collect())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
