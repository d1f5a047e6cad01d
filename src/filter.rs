//! Admission filter contract.
//!
//! The business-rule filter is an external collaborator; this crate owns
//! only its contract. The filter receives the enriched record and returns
//! the record to persist, possibly rewritten, including the incident
//! identifier. A returned status of [`IncidentStatus::Error`] means
//! rejection, with `status_description` carrying the reason; the admitter
//! never persists a rejected or pre-filter record.
//!
//! [`IncidentStatus::Error`]: crate::types::IncidentStatus::Error

use crate::types::IncidentRecord;

/// Business-rule filter applied to the enriched incident before persistence.
pub trait AdmissionFilter: Send + Sync {
    /// Evaluate business rules; the returned record is authoritative.
    fn apply(&self, record: IncidentRecord) -> IncidentRecord;
}

/// Filter that accepts every record unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl AdmissionFilter for AcceptAll {
    fn apply(&self, record: IncidentRecord) -> IncidentRecord {
        record
    }
}

/// Adapter turning a plain function or closure into an [`AdmissionFilter`].
pub struct FilterFn<F>(F);

impl<F> FilterFn<F>
where
    F: Fn(IncidentRecord) -> IncidentRecord + Send + Sync,
{
    /// Wrap a function as a filter.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> AdmissionFilter for FilterFn<F>
where
    F: Fn(IncidentRecord) -> IncidentRecord + Send + Sync,
{
    fn apply(&self, record: IncidentRecord) -> IncidentRecord {
        (self.0)(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Incident, IncidentStatus};

    fn make_record() -> IncidentRecord {
        Incident::new(
            "INC100",
            "AC1",
            None,
            "2025-03-23T10:00:00Z".parse().unwrap(),
        )
        .into_record()
    }

    #[test]
    fn accept_all_is_identity() {
        let record = make_record();
        let filtered = AcceptAll.apply(record.clone());
        assert_eq!(filtered, record);
    }

    #[test]
    fn closures_are_filters() {
        let rejecting = FilterFn::new(|record: IncidentRecord| record.reject("amount out of range"));
        let filtered = rejecting.apply(make_record());
        assert_eq!(filtered.incident_status, IncidentStatus::Error);
        assert_eq!(
            filtered.status_description.as_deref(),
            Some("amount out of range")
        );
    }

    #[test]
    fn filters_may_rewrite_the_record() {
        let rewriting = FilterFn::new(|mut record: IncidentRecord| {
            record.incident_id = format!("{}-F1", record.incident_id);
            record
        });
        let filtered = rewriting.apply(make_record());
        assert_eq!(filtered.incident_id, "INC100-F1");
        assert_eq!(filtered.incident_status, IncidentStatus::Success);
    }
}
