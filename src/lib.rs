//! # incident-intake
//!
//! Incident admission pipeline for a case-management platform.
//!
//! The crate answers one question per inbound incident:
//!
//! > Given a new incident, what is it linked to, does it pass the business
//! > rules, and can it be persisted under its unique identifier?
//!
//! ## Architecture
//!
//! ```text
//! Incident → CaseCorrelator → propagator → AdmissionFilter → insert
//!                  ↓                                           ↓
//!             StoreGateway (Postgres or Memory)  ← scoped session
//! ```
//!
//! ## Contract
//!
//! 1. Correlation failures degrade (empty linking), they never block admission
//! 2. The filtered record is the persisted record; the filter may rewrite it
//! 3. `Incident_Id` is unique, enforced by the store's unique index
//! 4. Every admission attempt releases its store session exactly once
//! 5. No retries; every failure is terminal for the attempt and reported
//!    to the caller as a structured value

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod admitter;
pub mod config;
pub mod correlator;
pub mod filter;
pub mod propagator;
pub mod store;
pub mod types;

// Re-exports
pub use admitter::{AdmissionError, AdmissionReceipt, IncidentAdmitter};
pub use config::StoreConfig;
pub use correlator::CaseCorrelator;
pub use filter::{AcceptAll, AdmissionFilter, FilterFn};
pub use propagator::merge_linked_accounts;
pub use store::{InMemoryStore, InsertOutcome, StoreGateway, StoreSession};
#[cfg(feature = "postgres")]
pub use store::PostgresStore;
pub use types::{
    CaseRecord, CustomerDetails, Incident, IncidentRecord, IncidentStatus, LinkedAccount,
    StatusPolicy,
};

/// Schema version for the persisted incident document shape.
/// Increment on breaking changes to [`IncidentRecord`].
pub const INCIDENT_SCHEMA_VERSION: &str = "1.0.0";
