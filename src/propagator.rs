//! Link propagation: merging correlator results into an incident.
//!
//! Purely in-memory; this step cannot fail. `Link_Accounts` keeps set
//! semantics keyed by account number, appends follow candidate order.

use crate::types::{Incident, LinkedAccount};

/// Merge candidate account numbers into the incident's linked-accounts list.
///
/// Candidates already present are skipped, everything else is appended in
/// the order given. Returns how many entries were added. Calling this twice
/// with the same candidates is a no-op the second time.
pub fn merge_linked_accounts(incident: &mut Incident, candidates: &[String]) -> usize {
    let mut added = 0;
    for candidate in candidates {
        if incident.has_linked_account(candidate) {
            tracing::debug!(account_num = %candidate, "account already linked, skipping");
            continue;
        }
        incident
            .link_accounts
            .push(LinkedAccount::new(candidate.clone()));
        tracing::info!(account_num = %candidate, "linked account added");
        added += 1;
    }
    added
}
