//! Incident admission orchestration.
//!
//! ## Algorithm
//!
//! 1. Correlate linked accounts and propagate them into the incident
//!    (degrades on correlation trouble, never aborts)
//! 2. Acquire the scoped persistence session (liveness-checked)
//! 3. Convert to the canonical record and apply the admission filter;
//!    a filter rejection stops before any write
//! 4. Ensure the unique index on the incident identifier (idempotent)
//! 5. Stamp `updatedAt` and insert the **filtered** record
//!
//! Every failure is terminal for the current admission attempt; the caller
//! owns retry policy. The session is released exactly once on every exit
//! path by virtue of being dropped at the end of scope.

use std::sync::Arc;

use chrono::Utc;

use crate::correlator::CaseCorrelator;
use crate::filter::AdmissionFilter;
use crate::propagator;
use crate::store::{InsertOutcome, StoreGateway, StoreSession};
use crate::types::{Incident, IncidentRecord, IncidentStatus, StatusPolicy};

/// Error type for admission attempts.
///
/// All persistence-path failures surface here as structured values; nothing
/// is thrown past the admitter boundary.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    /// Store unreachable or authentication failed; no partial work done.
    #[error("store connection failed: {0}")]
    Connection(String),
    /// Business-rule rejection: a normal negative outcome, not a system fault.
    #[error("rejected by admission filter: {0}")]
    RejectedByFilter(String),
    /// An incident with this identifier is already persisted. Reported
    /// verbatim, never retried.
    #[error("duplicate incident id: {0}")]
    DuplicateIncidentId(String),
    /// Unexpected store fault during index-ensure or insert.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl AdmissionError {
    /// Wrap a store error from the connect path.
    fn from_connect<E: std::error::Error>(e: E) -> Self {
        Self::Connection(e.to_string())
    }

    /// Wrap a store error from the persistence path.
    fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Persistence(e.to_string())
    }
}

/// Successful admission outcome.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AdmissionReceipt {
    /// Identifier of the persisted incident. The admission filter may
    /// rewrite the identifier, so this is the post-filter value.
    pub incident_id: String,
}

/// Orchestrates correlation, filtering and persistence for one incident.
pub struct IncidentAdmitter<G: StoreGateway, F: AdmissionFilter> {
    gateway: Arc<G>,
    correlator: CaseCorrelator<G>,
    filter: F,
}

impl<G, F> IncidentAdmitter<G, F>
where
    G: StoreGateway + 'static,
    F: AdmissionFilter,
{
    /// Create an admitter over a store gateway.
    ///
    /// The correlator shares the gateway and applies `policy`; the filter is
    /// the external business-rule collaborator.
    pub fn new(gateway: Arc<G>, policy: StatusPolicy, filter: F) -> Self {
        let correlator = CaseCorrelator::new(Arc::clone(&gateway), policy);
        Self {
            gateway,
            correlator,
            filter,
        }
    }

    /// The correlator used for enrichment.
    pub fn correlator(&self) -> &CaseCorrelator<G> {
        &self.correlator
    }

    /// Admit one incident: correlate, filter, persist.
    pub async fn admit(&self, mut incident: Incident) -> Result<AdmissionReceipt, AdmissionError> {
        let candidates = self
            .correlator
            .find_linked_accounts(incident.customer_ref())
            .await;
        propagator::merge_linked_accounts(&mut incident, &candidates);

        let session = self.gateway.connect().await.map_err(|e| {
            tracing::error!(
                incident_id = %incident.incident_id,
                error = %e,
                "store connection failed"
            );
            AdmissionError::from_connect(e)
        })?;

        // The filtered record is authoritative from here on, including its
        // identifier.
        let record = self.filter.apply(incident.into_record());
        if record.incident_status == IncidentStatus::Error {
            let description = record
                .status_description
                .clone()
                .unwrap_or_else(|| "rejected by admission filter".to_string());
            tracing::warn!(
                incident_id = %record.incident_id,
                %description,
                "incident rejected by filter"
            );
            return Err(AdmissionError::RejectedByFilter(description));
        }

        session
            .ensure_unique_incident_index()
            .await
            .map_err(AdmissionError::from_store)?;

        let mut record = record;
        record.updated_at = Some(Utc::now());

        match session
            .insert_incident(&record)
            .await
            .map_err(AdmissionError::from_store)?
        {
            InsertOutcome::Inserted => {
                tracing::info!(
                    incident_id = %record.incident_id,
                    linked_accounts = record.link_accounts.len(),
                    "incident admitted"
                );
                Ok(AdmissionReceipt {
                    incident_id: record.incident_id,
                })
            }
            InsertOutcome::DuplicateKey => {
                tracing::error!(incident_id = %record.incident_id, "duplicate incident id");
                Err(AdmissionError::DuplicateIncidentId(record.incident_id))
            }
        }
    }

    /// Read back a persisted incident by identifier.
    pub async fn fetch(&self, incident_id: &str) -> Result<Option<IncidentRecord>, AdmissionError> {
        let session = self
            .gateway
            .connect()
            .await
            .map_err(AdmissionError::from_connect)?;
        session
            .find_incident(incident_id)
            .await
            .map_err(AdmissionError::from_store)
    }
}
