//! Case correlation: open-case detection and cross-account linking.
//!
//! Correlation failure must never block creation of an incident, only
//! degrade linking quality. Both operations therefore recover from every
//! store fault locally: the failure is logged and the caller sees the empty
//! answer (`false` / no linked accounts).

use std::sync::Arc;

use crate::store::{StoreGateway, StoreSession};
use crate::types::StatusPolicy;

/// Answers correlation questions against the `Case_details` collection.
///
/// Holds its own gateway handle and acquires a scoped session per operation.
pub struct CaseCorrelator<G: StoreGateway> {
    gateway: Arc<G>,
    policy: StatusPolicy,
}

impl<G: StoreGateway + 'static> CaseCorrelator<G> {
    /// Create a correlator over a store gateway with a status policy.
    pub fn new(gateway: Arc<G>, policy: StatusPolicy) -> Self {
        Self { gateway, policy }
    }

    /// The terminal-status policy in effect.
    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    /// Whether at least one open case exists for the account.
    ///
    /// Returns `false` for accounts with no cases, accounts whose cases are
    /// all terminal, and on any store failure.
    pub async fn has_open_case(&self, account_num: &str) -> bool {
        let session = match self.gateway.connect().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    account_num,
                    error = %e,
                    "open-case lookup skipped: store connection failed"
                );
                return false;
            }
        };

        match session.find_cases_by_account(account_num).await {
            Ok(cases) => cases.iter().any(|case| self.policy.is_open(case)),
            Err(e) => {
                tracing::warn!(
                    account_num,
                    error = %e,
                    "open-case lookup failed; treating account as having no open case"
                );
                false
            }
        }
    }

    /// Distinct account numbers appearing on open cases that share the
    /// customer reference.
    ///
    /// Returns immediately (no query issued) when the incident carries no
    /// customer reference. Cases without an account number are skipped.
    /// Ordering follows store iteration order, first occurrence wins.
    pub async fn find_linked_accounts(&self, customer_ref: Option<&str>) -> Vec<String> {
        let Some(customer_ref) = customer_ref else {
            return Vec::new();
        };

        let session = match self.gateway.connect().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    customer_ref,
                    error = %e,
                    "linked-account lookup skipped: store connection failed"
                );
                return Vec::new();
            }
        };

        let cases = match session.find_cases_by_customer(customer_ref).await {
            Ok(cases) => cases,
            Err(e) => {
                tracing::warn!(
                    customer_ref,
                    error = %e,
                    "linked-account lookup failed; linking nothing"
                );
                return Vec::new();
            }
        };

        let mut accounts: Vec<String> = Vec::new();
        for case in &cases {
            if !self.policy.is_open(case) {
                continue;
            }
            let Some(account_num) = case.account_num.as_deref() else {
                continue;
            };
            if account_num.is_empty() || accounts.iter().any(|a| a == account_num) {
                continue;
            }
            accounts.push(account_num.to_string());
        }

        if accounts.is_empty() {
            tracing::info!(customer_ref, "no open linked accounts found");
        }
        accounts
    }
}
