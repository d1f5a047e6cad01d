//! In-memory store for testing.
//!
//! Besides implementing the gateway/session traits, this backend keeps
//! acquire/release counters and fault-injection switches so tests can assert
//! the two properties that matter most to the pipeline: every session is
//! released exactly once, and store trouble surfaces where the design says
//! it should (connect vs. query vs. insert).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::{CaseRecord, IncidentRecord};

use super::{InsertOutcome, StoreGateway, StoreSession};

/// Error type for the in-memory store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InMemoryError {
    /// Connection refused by fault injection.
    #[error("store unreachable")]
    Unreachable,
    /// Query refused by fault injection.
    #[error("query failed")]
    QueryFailed,
}

#[derive(Debug, Default)]
struct State {
    cases: Vec<CaseRecord>,
    incidents: BTreeMap<String, IncidentRecord>,
    unique_index_ensured: bool,
}

#[derive(Debug, Default)]
struct Faults {
    fail_connect: AtomicBool,
    fail_queries: AtomicBool,
    fail_case_queries: AtomicBool,
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    released: AtomicUsize,
}

/// In-memory document store.
///
/// Cheap to clone; clones share state. Incidents are keyed by `Incident_Id`
/// in a `BTreeMap`, which doubles as the unique-index enforcement.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    faults: Arc<Faults>,
    counters: Arc<Counters>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a case document.
    pub fn add_case(&self, case: CaseRecord) {
        self.state.lock().cases.push(case);
    }

    /// Number of persisted incidents.
    pub fn incident_count(&self) -> usize {
        self.state.lock().incidents.len()
    }

    /// Fetch a persisted incident directly (test introspection).
    pub fn get_incident(&self, incident_id: &str) -> Option<IncidentRecord> {
        self.state.lock().incidents.get(incident_id).cloned()
    }

    /// Whether `ensure_unique_incident_index` has been called.
    pub fn unique_index_ensured(&self) -> bool {
        self.state.lock().unique_index_ensured
    }

    /// Sessions handed out so far.
    pub fn sessions_opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Sessions released (dropped) so far.
    pub fn sessions_released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Make subsequent `connect` calls fail.
    pub fn fail_connections(&self, fail: bool) {
        self.faults.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent session operations fail.
    pub fn fail_queries(&self, fail: bool) {
        self.faults.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Make only the case-collection reads fail (the correlation paths),
    /// leaving the incident collection healthy.
    pub fn fail_case_queries(&self, fail: bool) {
        self.faults.fail_case_queries.store(fail, Ordering::SeqCst);
    }
}

/// Scoped session over the shared in-memory state.
///
/// Dropping the session records the release; the drop counter is what the
/// resource-safety tests assert against.
#[derive(Debug)]
pub struct InMemorySession {
    state: Arc<Mutex<State>>,
    faults: Arc<Faults>,
    counters: Arc<Counters>,
}

impl InMemorySession {
    fn check(&self) -> Result<(), InMemoryError> {
        if self.faults.fail_queries.load(Ordering::SeqCst) {
            return Err(InMemoryError::QueryFailed);
        }
        Ok(())
    }

    fn check_case_read(&self) -> Result<(), InMemoryError> {
        self.check()?;
        if self.faults.fail_case_queries.load(Ordering::SeqCst) {
            return Err(InMemoryError::QueryFailed);
        }
        Ok(())
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreGateway for InMemoryStore {
    type Error = InMemoryError;
    type Session = InMemorySession;

    async fn connect(&self) -> Result<Self::Session, Self::Error> {
        // The fault check stands in for the liveness round-trip.
        if self.faults.fail_connect.load(Ordering::SeqCst) {
            return Err(InMemoryError::Unreachable);
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(InMemorySession {
            state: Arc::clone(&self.state),
            faults: Arc::clone(&self.faults),
            counters: Arc::clone(&self.counters),
        })
    }
}

#[async_trait]
impl StoreSession for InMemorySession {
    type Error = InMemoryError;

    async fn find_cases_by_account(
        &self,
        account_num: &str,
    ) -> Result<Vec<CaseRecord>, Self::Error> {
        self.check_case_read()?;
        Ok(self
            .state
            .lock()
            .cases
            .iter()
            .filter(|c| c.account_num.as_deref() == Some(account_num))
            .cloned()
            .collect())
    }

    async fn find_cases_by_customer(
        &self,
        customer_ref: &str,
    ) -> Result<Vec<CaseRecord>, Self::Error> {
        self.check_case_read()?;
        Ok(self
            .state
            .lock()
            .cases
            .iter()
            .filter(|c| c.customer_ref.as_deref() == Some(customer_ref))
            .cloned()
            .collect())
    }

    async fn find_incident(
        &self,
        incident_id: &str,
    ) -> Result<Option<IncidentRecord>, Self::Error> {
        self.check()?;
        Ok(self.state.lock().incidents.get(incident_id).cloned())
    }

    async fn ensure_unique_incident_index(&self) -> Result<(), Self::Error> {
        self.check()?;
        self.state.lock().unique_index_ensured = true;
        Ok(())
    }

    async fn insert_incident(
        &self,
        record: &IncidentRecord,
    ) -> Result<InsertOutcome, Self::Error> {
        self.check()?;
        let mut state = self.state.lock();
        if state.incidents.contains_key(&record.incident_id) {
            return Ok(InsertOutcome::DuplicateKey);
        }
        state
            .incidents
            .insert(record.incident_id.clone(), record.clone());
        Ok(InsertOutcome::Inserted)
    }
}
