//! Rule-based findings for the report viewer.
//!
//! Rules run in a fixed order, which is also the display order. Each rule
//! checks its own preconditions and contributes nothing when they fail, so the
//! generator never errors.

use serde::Serialize;

use crate::{
    donor::DonorStats,
    reconcile::{ConstituencyShift, CrossStats},
    registration::RegistrationStats,
    stats,
};

const OHIO_CONCENTRATION_PCT: f64 = 60.0;
const NON_DONOR_PCT: i64 = 30;
const GREEK_SHARE: f64 = 0.3;
const LOW_MATCH_SHARE: f64 = 0.2;
const LARGE_GAP: usize = 50;
/// Class years at or after this are too recent to be a giving cohort.
const COHORT_BEFORE: u32 = 2020;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn color(&self) -> &'static str {
        match self {
            Priority::High => "#e05252",
            Priority::Medium => "#fb923c",
            Priority::Low => "#4ade80",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub icon: String,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub color: String,
}

impl Insight {
    fn new(icon: &str, title: impl Into<String>, body: impl Into<String>, priority: Priority) -> Self {
        Self {
            icon: icon.to_string(),
            title: title.into(),
            body: body.into(),
            priority,
            color: priority.color().to_string(),
        }
    }

    fn with_color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }
}

pub fn generate_insights(
    donor: &DonorStats,
    registration: &RegistrationStats,
    cross: &CrossStats,
) -> Vec<Insight> {
    if donor.total == 0 {
        return registration_only_insights(registration);
    }

    [
        parent_alumni_shift(cross),
        friend_segment(cross),
        non_donors(donor),
        strong_class_year(donor, registration),
        greek_share(donor),
        anchor_event(registration),
        annual_fund_growth(donor),
        ohio_concentration(donor, registration),
        email_match_summary(registration, cross),
        Some(platform_mismatch()),
        low_cross_match(donor, registration, cross),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn registration_only_insights(registration: &RegistrationStats) -> Vec<Insight> {
    let mut insights = vec![
        Insight::new(
            "📋",
            "Registration Data Only",
            "No donor CRM export was uploaded. Giving, Greek affiliation, majors, and wealth data are unavailable. Upload a CRM constituent export to enable full analysis.",
            Priority::High,
        )
        .with_color(Priority::Medium.color()),
    ];
    if let Some(top) = registration.sub_events.first() {
        insights.push(Insight::new(
            "🎪",
            format!("{} Is the Top Event", top.name),
            format!(
                "With {} attendees. Plan capacity around anchor events.",
                top.count
            ),
            Priority::Medium,
        ));
    }
    if registration.ohio_pct > OHIO_CONCENTRATION_PCT {
        insights.push(Insight::new(
            "🗺️",
            format!("~{}% from Ohio", registration.ohio_pct.round()),
            "Geographic concentration in Ohio. Consider regional outreach for expansion.",
            Priority::Low,
        ));
    }
    insights
}

fn shift<'a>(cross: &'a CrossStats, label: &str) -> Option<&'a ConstituencyShift> {
    cross.constituency_shifts.iter().find(|s| s.label == label)
}

fn parent_alumni_shift(cross: &CrossStats) -> Option<Insight> {
    let alumni = shift(cross, "Alumni")?;
    let parents = shift(cross, "Parent")?;
    (alumni.registration < alumni.donor).then(|| {
        Insight::new(
            "📈",
            "Parents Outnumber Alumni in Registration",
            format!(
                "The donor CRM has {} alumni vs {} parents. In registration: {} alumni vs {} parents. Parents may be over-represented in registration; consider alumni-specific outreach.",
                alumni.donor, parents.donor, alumni.registration, parents.registration
            ),
            Priority::High,
        )
    })
}

fn friend_segment(cross: &CrossStats) -> Option<Insight> {
    let friends = shift(cross, "Friend")?;
    (friends.registration > friends.donor && friends.donor > 0).then(|| {
        Insight::new(
            "🌟",
            "Friends Segment Notable in Registration",
            format!(
                "\"Friend\" category: {} in the donor CRM, {} in registration. Worth investigating who these friends are and whether they can be converted to donors.",
                friends.donor, friends.registration
            ),
            Priority::Medium,
        )
    })
}

fn non_donors(donor: &DonorStats) -> Option<Insight> {
    let pct = stats::percent_rounded(donor.giving.non_donors, donor.total);
    (pct > NON_DONOR_PCT).then(|| {
        Insight::new(
            "💰",
            format!("{pct}% of Event Attendees Have Never Given"),
            format!(
                "{} of {} registrants have no recent gift on record. They are engaged enough to attend but haven't been converted. Cross-reference with wealth estimates; some have significant capacity. This is your highest-ROI cultivation list.",
                donor.giving.non_donors, donor.total
            ),
            Priority::High,
        )
    })
}

fn cohort_years(top: &[(String, usize)]) -> impl Iterator<Item = &str> {
    top.iter()
        .map(|(year, _)| year.as_str())
        .filter(|year| year.parse::<u32>().is_ok_and(|y| y < COHORT_BEFORE))
}

fn strong_class_year(donor: &DonorStats, registration: &RegistrationStats) -> Option<Insight> {
    let year = cohort_years(&donor.class_year_top)
        .find(|year| cohort_years(&registration.class_year_top).any(|other| other == *year))?;
    let short = year.get(2..).unwrap_or(year);
    Some(Insight::new(
        "🎓",
        format!("Class of {year} Shows Strong Representation"),
        format!(
            "The class of '{short} appears in both the donor CRM and registration data. This cohort should be cultivated for major gifts and legacy planning."
        ),
        Priority::Medium,
    ))
}

fn greek_share(donor: &DonorStats) -> Option<Insight> {
    (donor.greek_total as f64 > donor.total as f64 * GREEK_SHARE).then(|| {
        Insight::new(
            "🏛️",
            "Greek Life Drives Significant Attendance",
            format!(
                "{}% of registrants had Greek affiliations ({} of {}). Greek reunion programming is a proven attendance driver.",
                stats::percent_rounded(donor.greek_total, donor.total),
                donor.greek_total,
                donor.total
            ),
            Priority::Low,
        )
    })
}

fn anchor_event(registration: &RegistrationStats) -> Option<Insight> {
    let top = registration.sub_events.first()?;
    Some(Insight::new(
        "🎪",
        format!("{} Is the Anchor Event", top.name),
        format!(
            "With {} attendees, it far outpaces other events. Most niche events draw 10-40 people. Plan capacity and budget around these anchor events.",
            top.count
        ),
        Priority::Medium,
    ))
}

fn annual_fund_growth(donor: &DonorStats) -> Option<Insight> {
    if donor.fy_giving.len() < 2 {
        return None;
    }
    let first = donor.fy_giving.first()?.amount;
    let last = donor.fy_giving.last()?.amount;
    if first <= 0.0 || last <= first {
        return None;
    }
    let growth = ((last - first) / first * 100.0).round();
    Some(Insight::new(
        "📊",
        format!("Annual Fund Giving Grew {growth}% Among Attendees"),
        format!(
            "Annual Fund giving from event attendees grew from ${:.0}K to ${:.0}K over the tracked period. Events correlate with giving growth.",
            first / 1000.0,
            last / 1000.0
        ),
        Priority::High,
    ))
}

fn ohio_concentration(donor: &DonorStats, registration: &RegistrationStats) -> Option<Insight> {
    if donor.ohio_pct <= OHIO_CONCENTRATION_PCT && registration.ohio_pct <= OHIO_CONCENTRATION_PCT {
        return None;
    }
    Some(Insight::new(
        "🗺️",
        format!(
            "~{}% Ohio: Geographic Expansion Opportunity",
            ((donor.ohio_pct + registration.ohio_pct) / 2.0).round()
        ),
        format!(
            "Ohio accounts for the vast majority of attendees. The remaining span {}+ states. Consider regional pre-event meetups or travel stipends.",
            donor.unique_states.max(registration.unique_states)
        ),
        Priority::Low,
    ))
}

fn email_match_summary(registration: &RegistrationStats, cross: &CrossStats) -> Option<Insight> {
    let gap = cross.registration_gap.count;
    if gap == 0 {
        return None;
    }
    let matched = cross.match_by_email.matched;
    let priority = if gap > LARGE_GAP {
        Priority::High
    } else {
        Priority::Medium
    };
    Some(Insight::new(
        "🔗",
        format!("{matched} Matched by Email · {gap} Need CRM Records"),
        format!(
            "{matched} guests matched across registration and the donor CRM by email. {gap} of {} registered guests could not be matched; consider adding them to the CRM for complete constituent coverage.",
            registration.total
        ),
        priority,
    ))
}

fn platform_mismatch() -> Insight {
    Insight::new(
        "⚠️",
        "Data Platform Mismatch Limits Analysis",
        "The two files come from different platforms and schemas. The donor CRM has giving data but no event details. The registration platform has rich event data but no giving history. Matching by email and constituent ID enables cross-system analysis.",
        Priority::High,
    )
}

fn low_cross_match(
    donor: &DonorStats,
    registration: &RegistrationStats,
    cross: &CrossStats,
) -> Option<Insight> {
    let matched = cross.match_by_email.matched;
    let smaller = donor.total.min(registration.total);
    if smaller == 0 || matched as f64 >= smaller as f64 * LOW_MATCH_SHARE {
        return None;
    }
    Some(Insight::new(
        "🔄",
        format!("Low Cross-Source Match ({matched} by email)"),
        format!(
            "Only {matched} people matched across the donor CRM and registration. Many appear in one system only. Email matching is most reliable; name matching can miss due to formatting differences."
        ),
        Priority::Medium,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{SubEvent, SubEventCategory};

    fn sub_event(name: &str, count: usize) -> SubEvent {
        SubEvent {
            name: name.to_string(),
            full_name: name.to_string(),
            count,
            category: SubEventCategory::General,
        }
    }

    #[test]
    fn registration_only_emits_reduced_rules() {
        let registration = RegistrationStats {
            total: 10,
            ohio_pct: 75.0,
            sub_events: vec![sub_event("Tailgate", 8)],
            ..Default::default()
        };
        let insights = generate_insights(
            &DonorStats::default(),
            &registration,
            &CrossStats::default(),
        );
        let titles = insights.iter().map(|i| i.title.as_str()).collect::<Vec<_>>();
        assert_eq!(
            titles,
            vec!["Registration Data Only", "Tailgate Is the Top Event", "~75% from Ohio"]
        );
        assert_eq!(insights[0].color, "#fb923c");
        assert_eq!(insights[0].priority, Priority::High);
    }

    #[test]
    fn platform_mismatch_is_always_present_with_donor_data() {
        let donor = DonorStats {
            total: 5,
            ..Default::default()
        };
        let insights = generate_insights(&donor, &RegistrationStats::default(), &CrossStats::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Data Platform Mismatch Limits Analysis");
    }

    #[test]
    fn annual_fund_growth_needs_two_buckets_and_growth() {
        use crate::donor::FiscalYearGiving;
        let mut donor = DonorStats {
            total: 1,
            fy_giving: vec![FiscalYearGiving {
                year: "FY14".into(),
                amount: 1000.0,
            }],
            ..Default::default()
        };
        assert!(annual_fund_growth(&donor).is_none());
        donor.fy_giving.push(FiscalYearGiving {
            year: "FY15".into(),
            amount: 1500.0,
        });
        let insight = annual_fund_growth(&donor).expect("growth insight");
        assert_eq!(insight.title, "Annual Fund Giving Grew 50% Among Attendees");
        assert!(insight.body.contains("$1K to $2K"));
    }

    #[test]
    fn strong_class_year_skips_recent_classes() {
        let donor = DonorStats {
            total: 3,
            class_year_top: vec![("2021".into(), 5), ("1995".into(), 2)],
            ..Default::default()
        };
        let registration = RegistrationStats {
            class_year_top: vec![("2021".into(), 4), ("1995".into(), 1)],
            ..Default::default()
        };
        let insight = strong_class_year(&donor, &registration).expect("insight");
        assert_eq!(insight.title, "Class of 1995 Shows Strong Representation");
        assert!(insight.body.contains("'95"));
    }

    #[test]
    fn email_gap_priority_scales_with_gap() {
        let mut cross = CrossStats::default();
        cross.registration_gap.count = 51;
        let registration = RegistrationStats {
            total: 60,
            ..Default::default()
        };
        let insight = email_match_summary(&registration, &cross).expect("insight");
        assert_eq!(insight.priority, Priority::High);
        cross.registration_gap.count = 3;
        let insight = email_match_summary(&registration, &cross).expect("insight");
        assert_eq!(insight.priority, Priority::Medium);
        assert_eq!(insight.color, "#fb923c");
    }
}
