//! Core types for the admission pipeline.

pub mod case;
pub mod incident;

pub use case::{CaseRecord, StatusPolicy};
pub use incident::{
    CustomerDetails, Incident, IncidentRecord, IncidentStatus, LinkedAccount,
};
