//! Case types read by the correlator.
//!
//! Cases live in the external `Case_details` collection and are read-only
//! from this crate's perspective. Status values are free-form strings
//! maintained by another system; classification into open/terminal happens
//! here through [`StatusPolicy`].

use serde::{Deserialize, Serialize};

/// A case document as stored in `Case_details`.
///
/// The external collection carries the account number under two spellings
/// (`account_no` and `Account_Num`); both deserialize into `account_num`.
/// Every field is optional because the collection predates this pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Account number the case was opened against.
    #[serde(rename = "Account_Num", alias = "account_no", default)]
    pub account_num: Option<String>,
    /// Customer reference shared across that customer's accounts.
    #[serde(rename = "customer_ref", default)]
    pub customer_ref: Option<String>,
    /// Free-form current status, e.g. `"Open"`, `"Case Close"`.
    #[serde(rename = "case_current_status", default)]
    pub case_current_status: Option<String>,
}

impl CaseRecord {
    /// Build a case record (primarily for seeding test stores).
    pub fn new(
        account_num: impl Into<String>,
        customer_ref: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            account_num: Some(account_num.into()),
            customer_ref: Some(customer_ref.into()),
            case_current_status: Some(status.into()),
        }
    }
}

/// Canonical terminal-status taxonomy.
///
/// A case whose status is in the terminal set is finished and never treated
/// as open. Comparison is whitespace-trimmed and case-insensitive; a case
/// with no status at all counts as open (it exists and nothing says it is
/// finished).
///
/// Both correlation operations apply the same policy. The default set is the
/// union of the two exclusion lists used historically for account-level and
/// customer-linking checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPolicy {
    /// Terminal status values, stored lowercased.
    terminal: Vec<String>,
}

impl StatusPolicy {
    /// Build a policy from an explicit terminal-status set.
    pub fn new<I, S>(terminal: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terminal: terminal
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Whether a status value marks a case as finished.
    pub fn is_terminal(&self, status: &str) -> bool {
        let normalized = status.trim().to_lowercase();
        self.terminal.iter().any(|t| *t == normalized)
    }

    /// Whether a case counts as open under this policy.
    pub fn is_open(&self, case: &CaseRecord) -> bool {
        match case.case_current_status.as_deref() {
            Some(status) => !self.is_terminal(status),
            None => true,
        }
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::new(["Case Close", "Close", "Write-Off", "Abandoned", "Withdraw"])
    }
}
