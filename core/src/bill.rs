//! Historical bill records — the read-only input to aggregation and
//! impact modeling. The core never mutates a bill.

use crate::error::{DeskError, DeskResult};
use crate::types::{AccountId, PeriodLabel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerClass {
    Residential,
    Commercial,
    Industrial,
}

impl CustomerClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerClass::Residential => "residential",
            CustomerClass::Commercial => "commercial",
            CustomerClass::Industrial => "industrial",
        }
    }

    pub const ALL: [CustomerClass; 3] = [
        CustomerClass::Residential,
        CustomerClass::Commercial,
        CustomerClass::Industrial,
    ];
}

impl fmt::Display for CustomerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerClass {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "residential" => Ok(CustomerClass::Residential),
            "commercial" => Ok(CustomerClass::Commercial),
            "industrial" => Ok(CustomerClass::Industrial),
            other => Err(DeskError::Validation(format!(
                "unknown customer class '{other}'"
            ))),
        }
    }
}

/// One historical bill, as handed over by the ingestion layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillRecord {
    pub account_id: AccountId,
    pub bill_period: PeriodLabel,
    pub customer_class: CustomerClass,
    pub consumption: f64,
    pub amount: f64,
    pub paid: bool,
}

impl BillRecord {
    /// Boundary check: negative quantities are rejected, not coerced.
    pub fn validate(&self) -> DeskResult<()> {
        if !self.consumption.is_finite() || self.consumption < 0.0 {
            return Err(DeskError::Validation(format!(
                "bill for account '{}': consumption must be non-negative, got {}",
                self.account_id, self.consumption
            )));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(DeskError::Validation(format!(
                "bill for account '{}': amount must be non-negative, got {}",
                self.account_id, self.amount
            )));
        }
        Ok(())
    }

    /// Payment is a boolean fact on the record: the rate is 1 or 0,
    /// never fractional.
    pub fn payment_rate(&self) -> f64 {
        if self.paid {
            1.0
        } else {
            0.0
        }
    }
}
