//! Tiered tariff structures and the bill calculator.
//!
//! A tariff is a fixed charge plus an ordered sequence of consumption
//! tiers. Each tier covers cumulative consumption up to its bound; the
//! optional final tier is unbounded and absorbs everything beyond the
//! last finite bound.
//!
//! RULE: a structure is validated before any bill is computed from it.
//! A structure that fails validation is a configuration error, never a
//! silently-tolerated input.

use crate::error::{DeskError, DeskResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Upper bound of the cumulative consumption a tier covers.
///
/// Wire form: a JSON number, or the string `"unbounded"` for the final
/// catch-all tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TierBound {
    Finite(f64),
    Unbounded,
}

impl Serialize for TierBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TierBound::Finite(v) => serializer.serialize_f64(*v),
            TierBound::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for TierBound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(TierBound::Finite(v)),
            Raw::Text(s) if s == "unbounded" => Ok(TierBound::Unbounded),
            Raw::Text(s) => Err(D::Error::custom(format!(
                "invalid tier bound '{s}': expected a number or \"unbounded\""
            ))),
        }
    }
}

/// One consumption band priced at a single unit rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RateTier {
    pub up_to: TierBound,
    pub price: f64,
}

/// A complete rate structure: flat fixed charge plus ordered tiers.
///
/// Immutable once referenced by a computed bill; recomputation uses a
/// new version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RateStructure {
    pub fixed_charge: f64,
    pub tiers: Vec<RateTier>,
}

/// Digest of a structure, for listings and audit payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureSummary {
    pub fixed_charge: f64,
    pub tier_count: usize,
    pub has_unbounded_tier: bool,
}

impl RateStructure {
    /// Check the tier invariants. Called by every computation entry
    /// point before touching the numbers.
    ///
    /// Invariants:
    /// - fixed charge and all prices are finite and non-negative
    /// - finite bounds are positive and strictly increasing
    /// - at most one unbounded tier, and it must be last
    pub fn validate(&self) -> DeskResult<()> {
        if !self.fixed_charge.is_finite() || self.fixed_charge < 0.0 {
            return Err(DeskError::Configuration(format!(
                "fixed charge must be a non-negative number, got {}",
                self.fixed_charge
            )));
        }

        let mut prev_bound: Option<f64> = None;
        for (i, tier) in self.tiers.iter().enumerate() {
            if !tier.price.is_finite() || tier.price < 0.0 {
                return Err(DeskError::Configuration(format!(
                    "tier {i}: price must be a non-negative number, got {}",
                    tier.price
                )));
            }
            match tier.up_to {
                TierBound::Finite(bound) => {
                    if !bound.is_finite() || bound <= 0.0 {
                        return Err(DeskError::Configuration(format!(
                            "tier {i}: bound must be a positive number, got {bound}"
                        )));
                    }
                    if let Some(prev) = prev_bound {
                        if bound <= prev {
                            return Err(DeskError::Configuration(format!(
                                "tier {i}: bound {bound} does not increase past {prev}"
                            )));
                        }
                    }
                    prev_bound = Some(bound);
                }
                TierBound::Unbounded => {
                    if i + 1 != self.tiers.len() {
                        return Err(DeskError::Configuration(format!(
                            "tier {i}: unbounded tier must be the last tier"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Compute the bill amount for `consumption` units.
    ///
    /// Pure function of the structure and the consumption value; safe to
    /// call concurrently. Zero consumption bills exactly the fixed
    /// charge, as does an empty tier list.
    pub fn bill_for(&self, consumption: f64) -> DeskResult<f64> {
        self.validate()?;
        if !consumption.is_finite() || consumption < 0.0 {
            return Err(DeskError::Validation(format!(
                "consumption must be a non-negative number, got {consumption}"
            )));
        }

        let mut total = self.fixed_charge;
        let mut remaining = consumption;
        let mut covered = 0.0;

        for tier in &self.tiers {
            if remaining <= 0.0 {
                break;
            }
            let span = match tier.up_to {
                TierBound::Finite(bound) => bound - covered,
                TierBound::Unbounded => f64::INFINITY,
            };
            let charged = remaining.min(span);
            total += charged * tier.price;
            remaining -= charged;
            if let TierBound::Finite(bound) = tier.up_to {
                covered = bound;
            }
        }

        Ok(total)
    }

    pub fn summary(&self) -> StructureSummary {
        StructureSummary {
            fixed_charge: self.fixed_charge,
            tier_count: self.tiers.len(),
            has_unbounded_tier: self
                .tiers
                .last()
                .is_some_and(|t| t.up_to == TierBound::Unbounded),
        }
    }

    /// Parse and validate a structure from its JSON wire form.
    /// Unknown keys and malformed bounds are configuration errors.
    pub fn from_json(raw: &str) -> DeskResult<Self> {
        let structure: RateStructure = serde_json::from_str(raw)
            .map_err(|e| DeskError::Configuration(format!("malformed rate structure: {e}")))?;
        structure.validate()?;
        Ok(structure)
    }
}
