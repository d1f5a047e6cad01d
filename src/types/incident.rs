//! Incident types for the admission pipeline.
//!
//! Field names serialize to the external document schema (`Incident_Id`,
//! `Account_Num`, `Link_Accounts`, ...) so a persisted record is readable by
//! the other consumers of the `Incidents` collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an incident record.
///
/// The pre-filter default is `Success`; the admission filter may downgrade
/// it to `Error` (rejection) or rewrite it to anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    /// Accepted but not yet processed downstream.
    Pending,
    /// Accepted for persistence.
    Success,
    /// Rejected by the admission filter; `status_description` carries the reason.
    Error,
}

impl IncidentStatus {
    /// Parse a status from its document-schema spelling.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl Default for IncidentStatus {
    fn default() -> Self {
        Self::Success
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Success => write!(f, "Success"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// One entry in an incident's linked-accounts list.
///
/// `Link_Accounts` has set semantics keyed by `account_num`; the propagator
/// never appends a second entry with the same account number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    /// Account number of the linked account.
    #[serde(rename = "Account_Num")]
    pub account_num: String,
}

impl LinkedAccount {
    /// Create a linked-account entry.
    pub fn new(account_num: impl Into<String>) -> Self {
        Self {
            account_num: account_num.into(),
        }
    }
}

/// Customer details nested under the incident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    /// Customer reference shared across that customer's accounts.
    #[serde(rename = "customer_ref", default)]
    pub customer_ref: Option<String>,
}

/// An inbound incident as submitted by the upstream caller.
///
/// Field-level validation happens upstream; this type is the already
/// well-typed shape the pipeline owns during admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Globally unique incident identifier.
    #[serde(rename = "Incident_Id")]
    pub incident_id: String,
    /// Account the incident was raised against.
    #[serde(rename = "Account_Num")]
    pub account_num: String,
    /// Nested customer details.
    #[serde(rename = "Customer_Details", default)]
    pub customer_details: CustomerDetails,
    /// Accounts linked to this incident via shared open cases.
    #[serde(rename = "Link_Accounts", default)]
    pub link_accounts: Vec<LinkedAccount>,
    /// Creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Incident {
    /// Create a fresh incident with no linked accounts.
    pub fn new(
        incident_id: impl Into<String>,
        account_num: impl Into<String>,
        customer_ref: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            incident_id: incident_id.into(),
            account_num: account_num.into(),
            customer_details: CustomerDetails { customer_ref },
            link_accounts: Vec::new(),
            created_at,
        }
    }

    /// Customer reference, if the incident carries one.
    pub fn customer_ref(&self) -> Option<&str> {
        self.customer_details.customer_ref.as_deref()
    }

    /// Whether an account number already appears in `link_accounts`.
    pub fn has_linked_account(&self, account_num: &str) -> bool {
        self.link_accounts
            .iter()
            .any(|acc| acc.account_num == account_num)
    }

    /// Convert to the canonical record shape with the pre-filter default status.
    pub fn into_record(self) -> IncidentRecord {
        IncidentRecord {
            incident_id: self.incident_id,
            account_num: self.account_num,
            customer_details: self.customer_details,
            link_accounts: self.link_accounts,
            incident_status: IncidentStatus::Success,
            status_description: None,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

/// Canonical persisted shape of an incident document.
///
/// This is what the admission filter sees and what the store receives.
/// Ownership transfers to the store once inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Globally unique incident identifier (unique index at the store layer).
    #[serde(rename = "Incident_Id")]
    pub incident_id: String,
    /// Account the incident was raised against.
    #[serde(rename = "Account_Num")]
    pub account_num: String,
    /// Nested customer details.
    #[serde(rename = "Customer_Details", default)]
    pub customer_details: CustomerDetails,
    /// Accounts linked via shared open cases (deduplicated by account number).
    #[serde(rename = "Link_Accounts", default)]
    pub link_accounts: Vec<LinkedAccount>,
    /// Admission status.
    #[serde(rename = "Incident_Status", default)]
    pub incident_status: IncidentStatus,
    /// Rejection reason, present when `incident_status` is `Error`.
    #[serde(
        rename = "Status_Description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_description: Option<String>,
    /// Creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Stamped immediately before insertion.
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl IncidentRecord {
    /// Mark the record rejected with a reason.
    pub fn reject(mut self, description: impl Into<String>) -> Self {
        self.incident_status = IncidentStatus::Error;
        self.status_description = Some(description.into());
        self
    }
}
