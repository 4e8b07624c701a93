use ratedesk_core::access::{Principal, Role};
use ratedesk_core::audit::{
    scrub_payload, AuditAction, AuditLedger, NewAuditEntry, Origin,
};
use ratedesk_core::store::DeskStore;
use serde_json::json;

fn ledger() -> AuditLedger {
    let store = DeskStore::in_memory().unwrap();
    store.migrate().unwrap();
    AuditLedger::new(store)
}

fn analyst() -> Principal {
    Principal::new(7, "analyst@waterworks.example", Role::Analyst)
}

#[test]
fn sequential_appends_assign_strictly_increasing_ids() {
    let mut ledger = ledger();
    let first = ledger
        .append(NewAuditEntry::by(AuditAction::Login, &analyst()))
        .unwrap();
    let second = ledger
        .append(NewAuditEntry::by(AuditAction::Logout, &analyst()))
        .unwrap();
    assert!(
        second.id > first.id,
        "ids must increase: {} then {}",
        first.id,
        second.id
    );
}

#[test]
fn recent_returns_newest_first_and_respects_the_limit() {
    let mut ledger = ledger();
    for i in 0..5 {
        ledger
            .append(
                NewAuditEntry::by(AuditAction::Upload, &analyst())
                    .description(format!("upload {i}")),
            )
            .unwrap();
    }

    let recent = ledger.recent(3).unwrap();
    assert_eq!(recent.len(), 3, "limit must cap the result");
    assert_eq!(recent[0].description.as_deref(), Some("upload 4"));
    assert_eq!(recent[1].description.as_deref(), Some("upload 3"));
    assert_eq!(recent[2].description.as_deref(), Some("upload 2"));
    // Most recently assigned first, even on timestamp ties.
    assert!(recent[0].id > recent[1].id && recent[1].id > recent[2].id);
}

#[test]
fn recent_with_a_large_limit_returns_everything() {
    let mut ledger = ledger();
    ledger
        .append(NewAuditEntry::system(AuditAction::SystemConfig))
        .unwrap();
    assert_eq!(ledger.recent(100).unwrap().len(), 1);
    assert_eq!(ledger.count().unwrap(), 1);
}

#[test]
fn system_events_carry_no_principal_and_summarize_as_system() {
    let mut ledger = ledger();
    let record = ledger
        .append(
            NewAuditEntry::system(AuditAction::SystemConfig)
                .description("retention window changed"),
        )
        .unwrap();
    assert_eq!(record.user_id, None);
    assert_eq!(record.user_email, None);

    let summary = record.summary();
    assert_eq!(summary.user_email, "System");
    assert_eq!(summary.action, AuditAction::SystemConfig);
}

#[test]
fn summary_joins_resource_type_and_id() {
    let mut ledger = ledger();
    let record = ledger
        .append(
            NewAuditEntry::by(AuditAction::RateOptimize, &analyst())
                .resource("rate_structure", 42)
                .origin(Origin::new("10.1.2.3", "desk-web")),
        )
        .unwrap();
    let summary = record.summary();
    assert_eq!(summary.resource.as_deref(), Some("rate_structure:42"));
    assert_eq!(summary.user_email, "analyst@waterworks.example");
    assert_eq!(summary.ip_address.as_deref(), Some("10.1.2.3"));
    // RFC 3339 timestamp.
    assert!(summary.timestamp.contains('T'), "got {}", summary.timestamp);
}

#[test]
fn appended_records_survive_a_round_trip_through_the_store() {
    let mut ledger = ledger();
    let written = ledger
        .append(
            NewAuditEntry::by(AuditAction::DataExport, &analyst())
                .resource("dataset", "ds-9")
                .description("exported bills")
                .payload(json!({ "rows": 1200 }))
                .origin(Origin::new("192.0.2.7", "cli")),
        )
        .unwrap();

    let read = ledger.recent(1).unwrap().remove(0);
    assert_eq!(read, written);
    assert_eq!(read.payload, Some(json!({ "rows": 1200 })));
}

#[test]
fn sensitive_payload_keys_never_reach_the_store() {
    let mut ledger = ledger();
    let record = ledger
        .append(
            NewAuditEntry::by(AuditAction::UserUpdate, &analyst()).payload(json!({
                "email": "new@waterworks.example",
                "password": "hunter2",
                "password_hash": "$2b$12$abcdef",
                "nested": { "api_key": "k-123", "note": "kept" },
                "tokens": [ { "refresh_token": "r-1", "kind": "refresh" } ]
            })),
        )
        .unwrap();

    let payload = record.payload.unwrap();
    assert_eq!(payload["email"], "new@waterworks.example");
    assert!(payload.get("password").is_none());
    assert!(payload.get("password_hash").is_none());
    assert!(payload["nested"].get("api_key").is_none());
    assert_eq!(payload["nested"]["note"], "kept");
    assert!(payload["tokens"][0].get("refresh_token").is_none());
    assert_eq!(payload["tokens"][0]["kind"], "refresh");

    // The stored row is scrubbed too, not just the returned record.
    let read = ledger.recent(1).unwrap().remove(0);
    let stored = read.payload.unwrap();
    assert!(stored.get("password").is_none());
}

#[test]
fn scrub_is_case_insensitive_and_matches_substrings() {
    let scrubbed = scrub_payload(json!({
        "Password": "x",
        "API_KEY": "y",
        "client_secret": "z",
        "plain": 1
    }));
    assert!(scrubbed.get("Password").is_none());
    assert!(scrubbed.get("API_KEY").is_none());
    assert!(scrubbed.get("client_secret").is_none());
    assert_eq!(scrubbed["plain"], 1);
}

#[test]
fn action_names_round_trip_over_the_wire() {
    use std::str::FromStr;
    for action in [
        AuditAction::Login,
        AuditAction::Logout,
        AuditAction::Upload,
        AuditAction::ForecastRun,
        AuditAction::RateOptimize,
        AuditAction::UserCreate,
        AuditAction::UserUpdate,
        AuditAction::UserDelete,
        AuditAction::DataExport,
        AuditAction::SystemConfig,
    ] {
        assert_eq!(AuditAction::from_str(action.as_str()).unwrap(), action);
    }
    assert!(AuditAction::from_str("drop_tables").is_err());
}
