use ratedesk_core::error::DeskError;
use ratedesk_core::tariff::{RateStructure, RateTier, TierBound};

fn two_tier_structure() -> RateStructure {
    RateStructure {
        fixed_charge: 25.0,
        tiers: vec![
            RateTier {
                up_to: TierBound::Finite(5000.0),
                price: 0.0085,
            },
            RateTier {
                up_to: TierBound::Unbounded,
                price: 0.0105,
            },
        ],
    }
}

#[test]
fn worked_example_bills_99() {
    // 25 + 5000 * 0.0085 + 3000 * 0.0105 = 99.00
    let bill = two_tier_structure().bill_for(8000.0).unwrap();
    assert!((bill - 99.0).abs() < 1e-9, "expected 99.00, got {bill}");
}

#[test]
fn zero_consumption_bills_exactly_the_fixed_charge() {
    let structure = two_tier_structure();
    assert_eq!(structure.bill_for(0.0).unwrap(), 25.0);
}

#[test]
fn empty_tier_list_bills_exactly_the_fixed_charge() {
    let structure = RateStructure {
        fixed_charge: 12.5,
        tiers: vec![],
    };
    assert_eq!(structure.bill_for(4000.0).unwrap(), 12.5);
}

#[test]
fn bill_never_falls_below_the_fixed_charge() {
    let structure = two_tier_structure();
    for consumption in [0.0, 1.0, 500.0, 5000.0, 8000.0, 1_000_000.0] {
        let bill = structure.bill_for(consumption).unwrap();
        assert!(
            bill >= structure.fixed_charge,
            "bill {bill} below fixed charge at consumption {consumption}"
        );
    }
}

#[test]
fn bills_are_monotone_in_consumption() {
    let structure = two_tier_structure();
    let mut previous = 0.0;
    for step in 0..100 {
        let consumption = step as f64 * 250.0;
        let bill = structure.bill_for(consumption).unwrap();
        assert!(
            bill >= previous,
            "bill decreased at consumption {consumption}: {previous} -> {bill}"
        );
        previous = bill;
    }
}

#[test]
fn unbounded_tier_absorbs_everything_past_the_last_finite_bound() {
    let structure = two_tier_structure();
    // Everything past 5000 lands on the unbounded tier price.
    let at_bound = structure.bill_for(5000.0).unwrap();
    let past_bound = structure.bill_for(5001.0).unwrap();
    assert!((past_bound - at_bound - 0.0105).abs() < 1e-9);

    let huge = structure.bill_for(1e9).unwrap();
    let expected = 25.0 + 5000.0 * 0.0085 + (1e9 - 5000.0) * 0.0105;
    assert!((huge - expected).abs() < 1e-3, "expected {expected}, got {huge}");
}

#[test]
fn middle_tier_spans_are_cumulative_not_per_tier() {
    // Tiers bound cumulative consumption: [0..5000], (5000..15000], rest.
    let structure = RateStructure {
        fixed_charge: 0.0,
        tiers: vec![
            RateTier {
                up_to: TierBound::Finite(5000.0),
                price: 1.0,
            },
            RateTier {
                up_to: TierBound::Finite(15000.0),
                price: 2.0,
            },
            RateTier {
                up_to: TierBound::Unbounded,
                price: 3.0,
            },
        ],
    };
    // 5000*1 + 10000*2 + 5000*3 = 40000
    let bill = structure.bill_for(20000.0).unwrap();
    assert!((bill - 40000.0).abs() < 1e-9, "expected 40000, got {bill}");
}

#[test]
fn negative_consumption_is_a_validation_error() {
    let err = two_tier_structure().bill_for(-1.0).unwrap_err();
    assert!(matches!(err, DeskError::Validation(_)), "got {err:?}");
}

#[test]
fn non_increasing_bounds_are_a_configuration_error() {
    let structure = RateStructure {
        fixed_charge: 10.0,
        tiers: vec![
            RateTier {
                up_to: TierBound::Finite(5000.0),
                price: 0.01,
            },
            RateTier {
                up_to: TierBound::Finite(5000.0),
                price: 0.02,
            },
        ],
    };
    let err = structure.bill_for(100.0).unwrap_err();
    assert!(matches!(err, DeskError::Configuration(_)), "got {err:?}");
}

#[test]
fn unbounded_tier_not_last_is_a_configuration_error() {
    let structure = RateStructure {
        fixed_charge: 10.0,
        tiers: vec![
            RateTier {
                up_to: TierBound::Unbounded,
                price: 0.01,
            },
            RateTier {
                up_to: TierBound::Finite(5000.0),
                price: 0.02,
            },
        ],
    };
    assert!(matches!(
        structure.validate().unwrap_err(),
        DeskError::Configuration(_)
    ));
}

#[test]
fn multiple_unbounded_tiers_are_a_configuration_error() {
    let structure = RateStructure {
        fixed_charge: 10.0,
        tiers: vec![
            RateTier {
                up_to: TierBound::Unbounded,
                price: 0.01,
            },
            RateTier {
                up_to: TierBound::Unbounded,
                price: 0.02,
            },
        ],
    };
    assert!(matches!(
        structure.validate().unwrap_err(),
        DeskError::Configuration(_)
    ));
}

#[test]
fn negative_fixed_charge_and_price_are_configuration_errors() {
    let negative_fixed = RateStructure {
        fixed_charge: -1.0,
        tiers: vec![],
    };
    assert!(matches!(
        negative_fixed.validate().unwrap_err(),
        DeskError::Configuration(_)
    ));

    let negative_price = RateStructure {
        fixed_charge: 1.0,
        tiers: vec![RateTier {
            up_to: TierBound::Unbounded,
            price: -0.5,
        }],
    };
    assert!(matches!(
        negative_price.validate().unwrap_err(),
        DeskError::Configuration(_)
    ));
}

#[test]
fn wire_form_parses_numbers_and_the_unbounded_marker() {
    let raw = r#"{
        "fixed_charge": 25.0,
        "tiers": [
            { "up_to": 5000, "price": 0.0085 },
            { "up_to": "unbounded", "price": 0.0105 }
        ]
    }"#;
    let structure = RateStructure::from_json(raw).unwrap();
    assert_eq!(structure, two_tier_structure());

    let summary = structure.summary();
    assert_eq!(summary.tier_count, 2);
    assert!(summary.has_unbounded_tier);
}

#[test]
fn wire_form_rejects_unknown_keys_and_bad_bounds() {
    let unknown_key = r#"{ "fixed_charge": 25.0, "tiers": [], "base_rate": 0.1 }"#;
    assert!(matches!(
        RateStructure::from_json(unknown_key).unwrap_err(),
        DeskError::Configuration(_)
    ));

    let bad_bound = r#"{
        "fixed_charge": 25.0,
        "tiers": [ { "up_to": "infinite", "price": 0.01 } ]
    }"#;
    assert!(matches!(
        RateStructure::from_json(bad_bound).unwrap_err(),
        DeskError::Configuration(_)
    ));
}

#[test]
fn serialization_round_trips_the_unbounded_marker() {
    let json = serde_json::to_string(&two_tier_structure()).unwrap();
    assert!(json.contains("\"unbounded\""));
    let back: RateStructure = serde_json::from_str(&json).unwrap();
    assert_eq!(back, two_tier_structure());
}
