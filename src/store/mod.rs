//! Document-store backends.
//!
//! The pipeline is written against two traits: [`StoreGateway`] hands out
//! scoped sessions, [`StoreSession`] exposes the query/insert/index
//! operations the pipeline needs. A session is released when it is dropped,
//! so every exit path of an admission attempt, success or any error,
//! releases the connection exactly once.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

use crate::types::{CaseRecord, IncidentRecord};

/// Outcome of an insert against the uniquely-indexed incident collection.
///
/// Uniqueness violations are an expected, typed outcome (a caller bug, not a
/// store fault) and must not be folded into the backend error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Document was written.
    Inserted,
    /// A document with the same `Incident_Id` already exists; nothing written.
    DuplicateKey,
}

/// Trait for store backends that hand out scoped sessions.
///
/// `connect` verifies liveness with an explicit round-trip before returning
/// a usable session; on failure no session exists and no further operations
/// are attempted against the backend.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Scoped session type, released on drop.
    type Session: StoreSession<Error = Self::Error>;

    /// Acquire a scoped session after a successful liveness check.
    async fn connect(&self) -> Result<Self::Session, Self::Error>;
}

/// Operations available on a scoped store session.
///
/// No operation silently swallows a store-level error; each surfaces a typed
/// failure to its caller.
#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// All cases opened against an account, regardless of status.
    async fn find_cases_by_account(
        &self,
        account_num: &str,
    ) -> Result<Vec<CaseRecord>, Self::Error>;

    /// All cases sharing a customer reference, regardless of status.
    async fn find_cases_by_customer(
        &self,
        customer_ref: &str,
    ) -> Result<Vec<CaseRecord>, Self::Error>;

    /// Look up a persisted incident by identifier.
    async fn find_incident(
        &self,
        incident_id: &str,
    ) -> Result<Option<IncidentRecord>, Self::Error>;

    /// Ensure the unique index on `Incident_Id` exists. Idempotent; safe to
    /// call on every admission.
    async fn ensure_unique_incident_index(&self) -> Result<(), Self::Error>;

    /// Insert one incident document, reporting uniqueness violations as a
    /// typed outcome.
    async fn insert_incident(
        &self,
        record: &IncidentRecord,
    ) -> Result<InsertOutcome, Self::Error>;
}

pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
