mod common;

use std::collections::BTreeSet;

use event_insights::{
    donor::DonorAnalysis,
    loader::{LoadOptions, load_rows},
    reconcile::{CrossStats, MatchSummary},
    registration::RegistrationAnalysis,
};
use proptest::prelude::*;

use common::{donor_csv, registration_csv};

fn fixture_cross() -> CrossStats {
    let donor_rows = load_rows(donor_csv().as_bytes(), &LoadOptions::default()).expect("donor rows");
    let registration_rows =
        load_rows(registration_csv().as_bytes(), &LoadOptions::default()).expect("registration rows");
    CrossStats::reconcile(
        &DonorAnalysis::from_rows(&donor_rows),
        &RegistrationAnalysis::from_rows(&registration_rows),
    )
}

fn emails(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn email_overlap_counts_each_side() {
    let summary = MatchSummary::between(
        &emails(&["a@x.edu", "b@x.edu"]),
        &emails(&["a@x.edu", "c@x.edu"]),
    );
    assert_eq!(
        summary,
        MatchSummary {
            matched: 1,
            donor_only: 1,
            registration_only: 1,
        }
    );
}

#[test]
fn fixture_match_summaries() {
    let cross = fixture_cross();
    assert_eq!(cross.match_by_email.matched, 1);
    assert_eq!(cross.match_by_email.donor_only, 4);
    assert_eq!(cross.match_by_email.registration_only, 2);
    assert_eq!(cross.match_by_constituent_id.matched, 1);
    assert_eq!(cross.match_by_constituent_id.registration_only, 0);
    assert_eq!(cross.retention.matched, 2);
    assert_eq!(cross.donor_email_gap_count, 4);
}

#[test]
fn registrants_matched_by_either_key_leave_the_gap() {
    let cross = fixture_cross();
    assert_eq!(cross.matched_registrants, 2);
    assert_eq!(cross.registration_gap.count, 2);
    assert_eq!(cross.registration_gap.by_affiliation.get("Other"), 1);
    assert_eq!(cross.registration_gap.by_affiliation.get("Parent"), 1);
}

#[test]
fn constituency_shifts_cover_canonical_labels() {
    let cross = fixture_cross();
    let shifts = cross
        .constituency_shifts
        .iter()
        .map(|s| (s.label.as_str(), s.donor, s.registration))
        .collect::<Vec<_>>();
    assert_eq!(
        shifts,
        vec![
            ("Alumni", 3, 2),
            ("Parent", 1, 1),
            ("Student", 0, 0),
            ("Friend", 1, 0),
            ("Faculty/Staff", 0, 0),
        ]
    );
}

#[test]
fn geography_maps_postal_codes_to_registration_names() {
    let cross = fixture_cross();
    let ohio = cross
        .geography_comparison
        .iter()
        .find(|row| row.state == "OH")
        .expect("OH row");
    assert_eq!(ohio.donor, 3);
    assert_eq!(ohio.registration, 3);
    let indiana = cross
        .geography_comparison
        .iter()
        .find(|row| row.state == "IN")
        .expect("IN row");
    assert_eq!(indiana.registration, 1);
}

#[test]
fn decades_union_both_sides() {
    let cross = fixture_cross();
    let decades = cross
        .class_decades
        .iter()
        .map(|d| (d.decade.as_str(), d.donor, d.registration))
        .collect::<Vec<_>>();
    assert_eq!(decades, vec![("1990s", 2, 2), ("2020s", 1, 0)]);
}

#[test]
fn wealth_bands_follow_band_order_and_skip_empty_bands() {
    let cross = fixture_cross();
    let bands = cross
        .wealth_capacity
        .iter()
        .map(|band| (band.range.as_str(), band.wealth_estimate, band.gift_capacity))
        .collect::<Vec<_>>();
    assert_eq!(bands, vec![("$1-2.5K", 2, 1), ("$5M+", 1, 0)]);

    let json = serde_json::to_value(&cross.wealth_capacity).expect("serialize bands");
    assert_eq!(
        json[1],
        serde_json::json!({"range": "$5M+", "wealthEstimate": 1, "giftCapacity": 0})
    );
}

fn email_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-e]@x\\.edu", 0..6)
}

proptest! {
    #[test]
    fn match_summary_is_consistent(donor in email_set(), registration in email_set()) {
        let summary = MatchSummary::between(&donor, &registration);
        prop_assert_eq!(summary.matched + summary.registration_only, registration.len());
        prop_assert_eq!(summary.matched + summary.donor_only, donor.len());
    }
}
