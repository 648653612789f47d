//! Row screening and de-duplication.
//!
//! Checks run in removal-priority order, so a row dropped early never reaches
//! the name resolver.

use std::collections::HashSet;

use crate::constants::ACCOUNTS_RECEIVABLE;
use crate::normalize::email::clean_email;
use crate::types::{ContactRecord, NameResult, RemovalReason};

/// True when the salesperson is the accounts-receivable placeholder.
pub fn is_accounts_receivable(salesperson: &str) -> bool {
    let collapsed = salesperson.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.eq_ignore_ascii_case(ACCOUNTS_RECEIVABLE)
}

/// Checks that need no name: returns the cleaned email of a row worth resolving.
pub fn screen(record: &ContactRecord) -> Result<String, RemovalReason> {
    if is_accounts_receivable(&record.salesperson) {
        return Err(RemovalReason::AccountsReceivableSalesperson);
    }
    let contact = Some(record.contact_name.as_str()).filter(|c| !c.trim().is_empty());
    clean_email(&record.email, contact).ok_or(RemovalReason::InvalidEmail)
}

/// Checks that run once the name is known.
#[derive(Debug, Default)]
pub struct RowFilter {
    seen_emails: HashSet<String>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A row without any name is dropped; otherwise the first row per email wins.
    pub fn admit(&mut self, email: &str, name: &NameResult) -> Result<(), RemovalReason> {
        if !name.has_any_name() {
            return Err(RemovalReason::MissingValidPersonNames);
        }
        if !self.seen_emails.insert(email.trim().to_lowercase()) {
            return Err(RemovalReason::DuplicateEmail);
        }
        Ok(())
    }

    pub fn unique_emails(&self) -> usize {
        self.seen_emails.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolutionMethod;

    fn record(salesperson: &str, contact: &str, email: &str) -> ContactRecord {
        ContactRecord {
            salesperson: salesperson.to_string(),
            contact_name: contact.to_string(),
            email: email.to_string(),
            ..ContactRecord::default()
        }
    }

    fn named(first: &str) -> NameResult {
        NameResult::from_tier(Some(first.to_string()), None, ResolutionMethod::RuleBased)
    }

    #[test]
    fn test_accounts_receivable_match_is_loose() {
        assert!(is_accounts_receivable("ACCOUNTS RECEIVABLE"));
        assert!(is_accounts_receivable("  Accounts   Receivable "));
        assert!(!is_accounts_receivable("Mark Pringle"));
        assert!(!is_accounts_receivable(""));
    }

    #[test]
    fn test_screen_priority() {
        let ar_with_bad_email = record("ACCOUNTS RECEIVABLE", "", "not-an-email");
        assert_eq!(screen(&ar_with_bad_email), Err(RemovalReason::AccountsReceivableSalesperson));

        assert_eq!(screen(&record("Mark Pringle", "", "nan")), Err(RemovalReason::InvalidEmail));
        assert_eq!(
            screen(&record("Mark Pringle", "", " AP@CATEREDTOO.COM ")),
            Ok("AP@CATEREDTOO.COM".to_string())
        );
    }

    #[test]
    fn test_screen_prefers_contact_email() {
        let row = record("", "JANE DOE", "orders@abc.com; jane.doe@abc.com");
        assert_eq!(screen(&row), Ok("jane.doe@abc.com".to_string()));
    }

    #[test]
    fn test_dedupe_is_case_insensitive_and_first_wins() {
        let mut filter = RowFilter::new();
        assert_eq!(filter.admit("A@x.com", &named("Ann")), Ok(()));
        assert_eq!(filter.admit("a@x.com", &named("Bob")), Err(RemovalReason::DuplicateEmail));
        assert_eq!(filter.unique_emails(), 1);
    }

    #[test]
    fn test_nameless_rows_do_not_claim_their_email() {
        let mut filter = RowFilter::new();
        assert_eq!(
            filter.admit("b@x.com", &NameResult::failed()),
            Err(RemovalReason::MissingValidPersonNames)
        );
        assert_eq!(filter.admit("b@x.com", &named("Bea")), Ok(()));
    }
}
