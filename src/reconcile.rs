//! Cross-source reconciliation of donor and registration aggregates.
//!
//! Neither export carries a shared primary key, so matching is set
//! intersection over normalized names, emails and constituent IDs. Categorical
//! fields are folded into common vocabularies (five constituency buckets, full
//! state names, fixed wealth bands) before they are compared side by side.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::Serialize;

use crate::{
    donor::DonorAnalysis, frequency::FrequencyTable, registration::RegistrationAnalysis,
};

pub const GEOGRAPHY_TOP: usize = 12;

pub const CANONICAL_CONSTITUENCIES: [&str; 5] =
    ["Alumni", "Parent", "Student", "Friend", "Faculty/Staff"];
const OTHER_CONSTITUENCY: &str = "Other";

/// Postal abbreviations seen in the CRM export, mapped to the full names the
/// registration platform records.
pub const STATE_NAMES: &[(&str, &str)] = &[
    ("OH", "Ohio"),
    ("NY", "New York"),
    ("PA", "Pennsylvania"),
    ("IL", "Illinois"),
    ("MI", "Michigan"),
    ("CT", "Connecticut"),
    ("IN", "Indiana"),
    ("TX", "Texas"),
    ("CA", "California"),
    ("FL", "Florida"),
    ("CO", "Colorado"),
    ("MA", "Massachusetts"),
    ("MD", "Maryland"),
    ("VT", "Vermont"),
    ("TN", "Tennessee"),
    ("KY", "Kentucky"),
    ("GA", "Georgia"),
    ("ME", "Maine"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NC", "North Carolina"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WI", "Wisconsin"),
    ("AZ", "Arizona"),
    ("MN", "Minnesota"),
    ("MO", "Missouri"),
    ("SC", "South Carolina"),
    ("DC", "District of Columbia"),
];

/// Wealth screening bands as `(CRM range label, short label)`, lowest first.
pub const WEALTH_BANDS: [(&str, &str); 12] = [
    ("$1-$2,499", "$1-2.5K"),
    ("$2,500-$4,999", "$2.5-5K"),
    ("$5,000-$9,999", "$5-10K"),
    ("$10,000-$14,999", "$10-15K"),
    ("$15,000-$24,999", "$15-25K"),
    ("$25,000-$49,999", "$25-50K"),
    ("$50,000-$99,999", "$50-100K"),
    ("$100,000-$249,999", "$100-250K"),
    ("$250,000-$499,999", "$250-500K"),
    ("$500,000-$999,999", "$500K-1M"),
    ("$1,000,000-$4,999,999", "$1-5M"),
    ("$5,000,000+", "$5M+"),
];

/// Full state name for an abbreviation; anything else comes back trimmed.
pub fn state_full_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let upper = trimmed.to_uppercase();
    STATE_NAMES
        .iter()
        .find(|(abbr, _)| *abbr == upper)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Buckets a free-text registration affiliation.
pub fn registration_constituency(affiliation: &str) -> &'static str {
    let lower = affiliation.to_lowercase();
    if lower.contains("alumni") {
        "Alumni"
    } else if lower.contains("parent") && !lower.contains("past") {
        "Parent"
    } else if lower.contains("student") {
        "Student"
    } else if lower.contains("friend") {
        "Friend"
    } else if lower.contains("faculty") || lower.contains("staff") {
        "Faculty/Staff"
    } else {
        OTHER_CONSTITUENCY
    }
}

/// Buckets a CRM constituency code. CRM codes come from a fixed pick list.
pub fn donor_constituency(code: &str) -> &'static str {
    if code.contains("Alumni") {
        return "Alumni";
    }
    CANONICAL_CONSTITUENCIES
        .into_iter()
        .find(|canonical| *canonical == code)
        .unwrap_or(OTHER_CONSTITUENCY)
}

fn bucket_constituencies(table: &FrequencyTable, bucket: fn(&str) -> &'static str) -> FrequencyTable {
    let mut buckets = FrequencyTable::new();
    for (key, count) in table.iter() {
        buckets.add_n(bucket(key), count);
    }
    buckets
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub matched: usize,
    pub donor_only: usize,
    pub registration_only: usize,
}

impl MatchSummary {
    pub fn between(donor: &BTreeSet<String>, registration: &BTreeSet<String>) -> Self {
        let matched = donor.intersection(registration).count();
        Self {
            matched,
            donor_only: donor.len() - matched,
            registration_only: registration.len() - matched,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationGap {
    pub by_affiliation: FrequencyTable,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstituencyShift {
    pub label: String,
    pub donor: usize,
    pub registration: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateComparison {
    pub state: String,
    pub donor: usize,
    pub registration: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecadeComparison {
    pub decade: String,
    pub donor: usize,
    pub registration: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WealthCapacity {
    pub range: String,
    pub wealth_estimate: usize,
    pub gift_capacity: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossStats {
    /// Name-based overlap.
    pub retention: MatchSummary,
    pub match_by_email: MatchSummary,
    pub match_by_constituent_id: MatchSummary,
    /// Registrants matched by email or constituent ID, each counted once.
    pub matched_registrants: usize,
    /// Registrants matched by neither key.
    pub registration_gap: RegistrationGap,
    /// Donor emails with no registration counterpart.
    pub donor_email_gap_count: usize,
    pub constituency_shifts: Vec<ConstituencyShift>,
    pub geography_comparison: Vec<StateComparison>,
    pub class_decades: Vec<DecadeComparison>,
    pub wealth_capacity: Vec<WealthCapacity>,
}

impl CrossStats {
    pub fn reconcile(donor: &DonorAnalysis, registration: &RegistrationAnalysis) -> Self {
        let donor_ids = &donor.identities;
        let registration_ids = &registration.identities;

        let retention = MatchSummary::between(&donor_ids.names, &registration_ids.names);
        let match_by_email = MatchSummary::between(&donor_ids.emails, &registration_ids.emails);
        let match_by_constituent_id =
            MatchSummary::between(&donor_ids.constituent_ids, &registration_ids.constituent_ids);

        let (matched, unmatched): (Vec<_>, Vec<_>) = registration
            .match_keys
            .iter()
            .partition(|key| key.matches(donor_ids));
        let registration_gap = RegistrationGap {
            by_affiliation: unmatched
                .iter()
                .map(|key| key.affiliation.as_str())
                .collect(),
            count: unmatched.len(),
        };
        let donor_email_gap_count = donor_ids
            .emails
            .difference(&registration_ids.emails)
            .count();

        debug!(
            "Reconciled {} registrant(s): {} matched, {} by email, {} by ID",
            registration.match_keys.len(),
            matched.len(),
            match_by_email.matched,
            match_by_constituent_id.matched
        );

        Self {
            retention,
            match_by_email,
            match_by_constituent_id,
            matched_registrants: matched.len(),
            registration_gap,
            donor_email_gap_count,
            constituency_shifts: constituency_shifts(donor, registration),
            geography_comparison: geography_comparison(donor, registration),
            class_decades: class_decades(donor, registration),
            wealth_capacity: wealth_capacity(donor),
        }
    }
}

fn constituency_shifts(
    donor: &DonorAnalysis,
    registration: &RegistrationAnalysis,
) -> Vec<ConstituencyShift> {
    let donor_buckets = bucket_constituencies(&donor.stats.constituency, donor_constituency);
    let registration_buckets =
        bucket_constituencies(&registration.stats.constituency, registration_constituency);
    CANONICAL_CONSTITUENCIES
        .into_iter()
        .map(|label| ConstituencyShift {
            label: label.to_string(),
            donor: donor_buckets.get(label),
            registration: registration_buckets.get(label),
        })
        .collect()
}

fn geography_comparison(
    donor: &DonorAnalysis,
    registration: &RegistrationAnalysis,
) -> Vec<StateComparison> {
    let mut registration_states = BTreeMap::<String, usize>::new();
    for (state, count) in registration.stats.states.iter() {
        *registration_states
            .entry(state_full_name(state).to_lowercase())
            .or_insert(0) += count;
    }
    donor
        .stats
        .states
        .top(GEOGRAPHY_TOP)
        .into_iter()
        .map(|(state, count)| {
            let lookup = state_full_name(&state).to_lowercase();
            StateComparison {
                registration: registration_states.get(&lookup).copied().unwrap_or(0),
                donor: count,
                state,
            }
        })
        .collect()
}

fn class_decades(
    donor: &DonorAnalysis,
    registration: &RegistrationAnalysis,
) -> Vec<DecadeComparison> {
    let donor_decades = &donor.stats.class_decades;
    let registration_decades = &registration.stats.class_decades;
    donor_decades
        .keys()
        .chain(registration_decades.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|decade| DecadeComparison {
            decade: decade.to_string(),
            donor: donor_decades.get(decade),
            registration: registration_decades.get(decade),
        })
        .collect()
}

fn wealth_capacity(donor: &DonorAnalysis) -> Vec<WealthCapacity> {
    WEALTH_BANDS
        .into_iter()
        .map(|(range, short)| WealthCapacity {
            range: short.to_string(),
            wealth_estimate: donor.stats.wealth_estimate.get(range),
            gift_capacity: donor.stats.gift_capacity.get(range),
        })
        .filter(|band| band.wealth_estimate > 0 || band.gift_capacity > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn match_summary_counts_each_side() {
        let summary = MatchSummary::between(
            &set(&["a@x.edu", "b@x.edu"]),
            &set(&["a@x.edu", "c@x.edu"]),
        );
        assert_eq!(
            summary,
            MatchSummary {
                matched: 1,
                donor_only: 1,
                registration_only: 1
            }
        );
    }

    #[test]
    fn registration_affiliations_bucket_by_substring() {
        assert_eq!(registration_constituency("Alumni, Parent"), "Alumni");
        assert_eq!(registration_constituency("Current Parent"), "Parent");
        assert_eq!(registration_constituency("Past Parent"), "Other");
        assert_eq!(registration_constituency("STUDENT"), "Student");
        assert_eq!(registration_constituency("Friend of the University"), "Friend");
        assert_eq!(registration_constituency("Emeriti Faculty"), "Faculty/Staff");
        assert_eq!(registration_constituency("Trustee"), "Other");
    }

    #[test]
    fn donor_codes_bucket_exactly() {
        assert_eq!(donor_constituency("Alumni - Non Degreed"), "Alumni");
        assert_eq!(donor_constituency("Parent"), "Parent");
        assert_eq!(donor_constituency("parent"), "Other");
        assert_eq!(donor_constituency("Faculty/Staff"), "Faculty/Staff");
    }

    #[test]
    fn state_names_expand_abbreviations() {
        assert_eq!(state_full_name(" oh "), "Ohio");
        assert_eq!(state_full_name("DC"), "District of Columbia");
        assert_eq!(state_full_name("Ontario"), "Ontario");
    }
}
