//! Normalized matching keys.
//!
//! Identity sets exist only to reconcile the two exports. They are never part
//! of a serialized report.

use std::collections::BTreeSet;

/// Lower-cased, trimmed name; `None` when blank.
pub fn normalize_name(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_lowercase())
}

/// Lower-cased, trimmed email; `None` unless it contains `@`.
pub fn normalize_email(raw: &str) -> Option<String> {
    normalize_name(raw).filter(|value| value.contains('@'))
}

/// Trimmed constituent ID. IDs come from a single CRM and compare verbatim.
pub fn normalize_constituent_id(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySets {
    pub names: BTreeSet<String>,
    pub emails: BTreeSet<String>,
    pub constituent_ids: BTreeSet<String>,
}

impl IdentitySets {
    /// Records whichever of the three keys are present in one row.
    pub fn record(&mut self, name: &str, email: &str, constituent_id: &str) {
        if let Some(name) = normalize_name(name) {
            self.names.insert(name);
        }
        if let Some(email) = normalize_email(email) {
            self.emails.insert(email);
        }
        if let Some(id) = normalize_constituent_id(constituent_id) {
            self.constituent_ids.insert(id);
        }
    }
}

/// Per-registrant keys kept for combined matching and gap analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchKey {
    /// Lower-cased and trimmed; may be empty or lack `@`.
    pub email: String,
    pub constituent_id: String,
    pub affiliation: String,
}

pub const DEFAULT_AFFILIATION: &str = "Other";

impl MatchKey {
    pub fn new(email: &str, constituent_id: &str, affiliation: &str) -> Self {
        let affiliation = if affiliation.trim().is_empty() {
            DEFAULT_AFFILIATION.to_string()
        } else {
            affiliation.to_string()
        };
        Self {
            email: email.trim().to_lowercase(),
            constituent_id: constituent_id.trim().to_string(),
            affiliation,
        }
    }

    /// True when this registrant's email or ID is known to `donors`.
    pub fn matches(&self, donors: &IdentitySets) -> bool {
        (!self.email.is_empty() && donors.emails.contains(&self.email))
            || (!self.constituent_id.is_empty()
                && donors.constituent_ids.contains(&self.constituent_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_require_at_sign() {
        assert_eq!(normalize_email(" Jane@X.edu "), Some("jane@x.edu".into()));
        assert_eq!(normalize_email("jane.x.edu"), None);
        assert_eq!(normalize_email("   "), None);
    }

    #[test]
    fn constituent_ids_keep_case() {
        assert_eq!(normalize_constituent_id(" Ab12 "), Some("Ab12".into()));
    }

    #[test]
    fn match_key_defaults_affiliation() {
        let key = MatchKey::new(" A@X.EDU", " 7 ", "  ");
        assert_eq!(key.email, "a@x.edu");
        assert_eq!(key.constituent_id, "7");
        assert_eq!(key.affiliation, DEFAULT_AFFILIATION);
    }

    #[test]
    fn match_key_matches_by_email_or_id() {
        let mut donors = IdentitySets::default();
        donors.record("Jane", "jane@x.edu", "42");
        assert!(MatchKey::new("jane@x.edu", "", "Alumni").matches(&donors));
        assert!(MatchKey::new("", "42", "Alumni").matches(&donors));
        assert!(!MatchKey::new("", "", "Alumni").matches(&donors));
        assert!(!MatchKey::new("bob@x.edu", "43", "Alumni").matches(&donors));
    }
}
