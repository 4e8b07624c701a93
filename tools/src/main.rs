//! rate-runner: headless driver for the rate desk core.
//!
//! Usage:
//!   rate-runner --structure tariff.json --consumption 8000
//!   rate-runner --structure tariff.json --bills bills.json --db desk.db
//!   rate-runner --bills bills.json --coverage 1.15

use anyhow::{Context, Result};
use ratedesk_core::access::{Principal, Role};
use ratedesk_core::audit::Origin;
use ratedesk_core::bill::BillRecord;
use ratedesk_core::desk::RateDesk;
use ratedesk_core::kpi::PeriodDeltas;
use ratedesk_core::tariff::RateStructure;
use std::env;
use std::fs;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let structure_path = str_arg(&args, "--structure");
    let bills_path = str_arg(&args, "--bills");
    let consumption = parse_arg(&args, "--consumption", 0.0f64);
    let coverage = parse_arg(&args, "--coverage", 1.0f64);
    let limit = parse_arg(&args, "--limit", 10usize);

    println!("rate-runner — rate desk driver");
    println!("  db:        {db}");
    println!();

    let mut desk = if db == ":memory:" {
        RateDesk::in_memory()?
    } else {
        RateDesk::open(db)?
    };

    // The runner acts as a local admin operator.
    let operator = Principal::new(0, "operator@desk.local", Role::Admin);
    let origin = || Origin::new("127.0.0.1", "rate-runner");
    desk.record_login(&operator, origin())?;

    let structure = structure_path
        .map(|path| -> Result<RateStructure> {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading rate structure from {path}"))?;
            Ok(RateStructure::from_json(&raw)?)
        })
        .transpose()?;

    let bills = bills_path
        .map(|path| -> Result<Vec<BillRecord>> {
            let raw =
                fs::read_to_string(path).with_context(|| format!("reading bills from {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing bills from {path}"))
        })
        .transpose()?;

    if let Some(structure) = &structure {
        let summary = structure.summary();
        println!("structure: fixed charge ${:.2}, {} tiers", summary.fixed_charge, summary.tier_count);
        let amount = desk.compute_bill(&operator, structure, consumption, origin())?;
        println!("bill for {consumption} units: ${amount:.2}");
        println!();
    }

    if let Some(bills) = &bills {
        let snapshot = desk.refresh_kpis(&operator, bills, coverage, PeriodDeltas::default(), origin())?;
        println!("portfolio KPIs over {} bills:", bills.len());
        println!("  total revenue:   ${:.2}", snapshot.total_revenue);
        println!("  collection rate: {:.1}%", snapshot.collection_rate);
        println!("  customers:       {}", snapshot.customer_count);
        println!("  coverage ratio:  {:.2}", snapshot.coverage_ratio);
        println!();

        if let Some(structure) = &structure {
            let impacts = desk.model_impacts(&operator, bills, structure, origin())?;
            println!("bill impacts under the proposed structure:");
            for (class, impact) in &impacts {
                println!(
                    "  {class:<12} avg {:+.1}%  max {:+.1}%  ({} bills)",
                    impact.avg_increase, impact.max_increase, impact.bill_count
                );
            }
            println!();
        }
    }

    let trail = desk.audit_trail(&operator, limit, origin())?;
    println!("audit trail (newest first):");
    for record in &trail {
        let summary = record.summary();
        println!(
            "  #{:<4} {:<14} {:<24} {}",
            summary.id,
            summary.action,
            summary.user_email,
            summary.description.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    str_arg(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
