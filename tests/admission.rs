//! End-to-end admission pipeline tests.
//!
//! These run the full correlate → propagate → filter → persist flow against
//! the in-memory backend and assert the pipeline's contract: linking
//! quality, uniqueness, filter short-circuit, degradation under store
//! trouble, and release-exactly-once resource safety.

use std::sync::Arc;

use incident_intake::filter::FilterFn;
use incident_intake::store::memory::InMemoryStore;
use incident_intake::{
    AcceptAll, AdmissionError, CaseRecord, Incident, IncidentAdmitter, IncidentRecord,
    IncidentStatus, StatusPolicy,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn make_incident(id: &str) -> Incident {
    Incident::new(
        id,
        "AC1",
        Some("CR1".to_string()),
        "2025-03-23T10:00:00Z".parse().unwrap(),
    )
}

fn make_admitter(store: &InMemoryStore) -> IncidentAdmitter<InMemoryStore, AcceptAll> {
    IncidentAdmitter::new(Arc::new(store.clone()), StatusPolicy::default(), AcceptAll)
}

/// Store with one open and one closed case sharing the incident's customer.
fn seed_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.add_case(CaseRecord::new("AC2", "CR1", "Open"));
    store.add_case(CaseRecord::new("AC3", "CR1", "Close"));
    store
}

fn linked_nums(record: &IncidentRecord) -> Vec<&str> {
    record
        .link_accounts
        .iter()
        .map(|a| a.account_num.as_str())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// LINKING SCENARIOS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admitted_incident_links_open_accounts_only() {
    init_tracing();
    let store = seed_store();
    let admitter = make_admitter(&store);

    admitter.admit(make_incident("INC100")).await.unwrap();

    let persisted = store.get_incident("INC100").unwrap();
    // AC2 has an open case for CR1; AC3's case is terminal and excluded.
    assert_eq!(linked_nums(&persisted), vec!["AC2"]);
}

#[tokio::test]
async fn incident_without_customer_ref_links_nothing() {
    init_tracing();
    let store = seed_store();
    let admitter = make_admitter(&store);

    let incident = Incident::new("INC101", "AC1", None, "2025-03-23T10:00:00Z".parse().unwrap());
    admitter.admit(incident).await.unwrap();

    let persisted = store.get_incident("INC101").unwrap();
    assert!(persisted.link_accounts.is_empty());
}

#[tokio::test]
async fn correlation_trouble_degrades_linking_but_not_admission() {
    init_tracing();
    let store = seed_store();
    let admitter = make_admitter(&store);

    // Only the case-collection reads fail; the incident path is healthy.
    store.fail_case_queries(true);
    let receipt = admitter.admit(make_incident("INC102")).await.unwrap();
    assert_eq!(receipt.incident_id, "INC102");

    let persisted = store.get_incident("INC102").unwrap();
    assert!(persisted.link_accounts.is_empty());
}

#[tokio::test]
async fn store_fault_on_the_persistence_path_is_terminal() {
    init_tracing();
    let store = seed_store();
    let admitter = make_admitter(&store);

    // Correlation degrades, then the index-ensure step surfaces the fault.
    store.fail_queries(true);
    let err = admitter.admit(make_incident("INC102")).await.unwrap_err();
    assert!(matches!(err, AdmissionError::Persistence(_)));
    assert_eq!(store.incident_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// UNIQUENESS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_admission_with_same_id_is_a_duplicate() {
    init_tracing();
    let store = seed_store();
    let admitter = make_admitter(&store);

    let receipt = admitter.admit(make_incident("INC100")).await.unwrap();
    assert_eq!(receipt.incident_id, "INC100");

    let err = admitter.admit(make_incident("INC100")).await.unwrap_err();
    assert!(matches!(err, AdmissionError::DuplicateIncidentId(ref id) if id == "INC100"));

    // No mutation beyond the first insert.
    assert_eq!(store.incident_count(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// FILTER GATE
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn filter_rejection_inserts_nothing() {
    init_tracing();
    let store = seed_store();
    let admitter = IncidentAdmitter::new(
        Arc::new(store.clone()),
        StatusPolicy::default(),
        FilterFn::new(|record: IncidentRecord| record.reject("missing mandatory segment")),
    );

    let err = admitter.admit(make_incident("INC100")).await.unwrap_err();
    assert!(
        matches!(err, AdmissionError::RejectedByFilter(ref d) if d == "missing mandatory segment")
    );
    assert_eq!(store.incident_count(), 0);
}

#[tokio::test]
async fn filter_transform_is_what_gets_persisted() {
    init_tracing();
    let store = seed_store();
    let admitter = IncidentAdmitter::new(
        Arc::new(store.clone()),
        StatusPolicy::default(),
        FilterFn::new(|mut record: IncidentRecord| {
            record.incident_status = IncidentStatus::Pending;
            record
        }),
    );

    admitter.admit(make_incident("INC100")).await.unwrap();
    let persisted = store.get_incident("INC100").unwrap();
    assert_eq!(persisted.incident_status, IncidentStatus::Pending);
    // Enrichment happened before the filter saw the record.
    assert_eq!(linked_nums(&persisted), vec!["AC2"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// FAILURE MODES
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_store_fails_with_connection_error() {
    init_tracing();
    let store = seed_store();
    store.fail_connections(true);
    let admitter = make_admitter(&store);

    let err = admitter.admit(make_incident("INC100")).await.unwrap_err();
    assert!(matches!(err, AdmissionError::Connection(_)));
    assert_eq!(store.incident_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// RESOURCE SAFETY
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_path_releases_sessions_exactly_once() {
    init_tracing();

    // Success path.
    let store = seed_store();
    make_admitter(&store).admit(make_incident("INC100")).await.unwrap();
    assert!(store.sessions_opened() > 0);
    assert_eq!(store.sessions_opened(), store.sessions_released());

    // Duplicate path.
    let _ = make_admitter(&store).admit(make_incident("INC100")).await;
    assert_eq!(store.sessions_opened(), store.sessions_released());

    // Rejection path.
    let store = seed_store();
    let rejecting = IncidentAdmitter::new(
        Arc::new(store.clone()),
        StatusPolicy::default(),
        FilterFn::new(|record: IncidentRecord| record.reject("no")),
    );
    let _ = rejecting.admit(make_incident("INC1")).await;
    assert!(store.sessions_opened() > 0);
    assert_eq!(store.sessions_opened(), store.sessions_released());

    // Persistence-failure path.
    let store = seed_store();
    store.fail_queries(true);
    let _ = make_admitter(&store).admit(make_incident("INC1")).await;
    assert_eq!(store.sessions_opened(), store.sessions_released());

    // Connection-failure path hands out no session at all.
    let store = seed_store();
    store.fail_connections(true);
    let _ = make_admitter(&store).admit(make_incident("INC1")).await;
    assert_eq!(store.sessions_opened(), 0);
    assert_eq!(store.sessions_released(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// READ-BACK
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_round_trips_the_persisted_document() {
    init_tracing();
    let store = seed_store();
    let admitter = make_admitter(&store);

    admitter.admit(make_incident("INC100")).await.unwrap();

    let fetched = admitter.fetch("INC100").await.unwrap().unwrap();
    assert_eq!(fetched.incident_id, "INC100");
    assert_eq!(fetched.incident_status, IncidentStatus::Success);
    assert!(fetched.updated_at.is_some());
    assert_eq!(linked_nums(&fetched), vec!["AC2"]);

    assert!(admitter.fetch("INC999").await.unwrap().is_none());
    assert_eq!(store.sessions_opened(), store.sessions_released());
}
