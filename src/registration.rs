//! Event registration aggregation.
//!
//! Registration exports name several columns loosely, so every column is
//! resolved once through [`RegistrationColumns`] before the single pass over
//! the rows. Sub-event columns are found by their values rather than their
//! names; see [`detect_sub_events`].

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::LazyLock,
};

use chrono::Month;
use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::{
    columns::{Column, ColumnResolver, cell},
    frequency::FrequencyTable,
    identity::{IdentitySets, MatchKey},
    loader::RowSet,
    stats,
};

pub const CLASS_YEAR_TOP: usize = 15;
pub const ATTENDING: &str = "Attending";
pub const NOT_ATTENDING: &str = "Not Attending";
pub const DISCOUNT_PLACEHOLDER: &str = "Discount Code Applied";
pub const REGISTRATION_DATE_COLUMN: &str = "Registration Date Time";

/// Names longer than this go through [`SUB_EVENT_SHORTENINGS`].
const SHORTEN_ABOVE: usize = 35;
const TRUNCATE_ABOVE: usize = 40;
const TRUNCATE_TO: usize = 37;

/// Ordered phrase substitutions for long sub-event names. Each applies to the
/// first occurrence only, in list order.
pub const SUB_EVENT_SHORTENINGS: &[(&str, &str)] = &[
    ("2015-2025 Young Alumni - ", "YA - "),
    (" Reception and Lunch", ""),
    (" and Affinity Huddles", ""),
    (" Induction Ceremony", ""),
    (" and Information Fair", ""),
    (" Sisterhood event and Open House", " Sisterhood"),
    (" Sisterhood event", " Sisterhood"),
    (" Service Project", " Service"),
    (" Saturday Program", ""),
    (" - Invite Only", ""),
    ("Battling Bishops Tailgate", "Tailgate & Huddles"),
    (" Meet and Reception", ""),
    (
        "Women's Volleyball game and Celebration of '94 and '96 teams",
        "Volleyball Reunion",
    ),
    (
        "David Hamilton Smith Sorority & Fraternity Reception and Awards",
        "Sorority & Frat Awards",
    ),
    (" Reception at the Ross Art Museum", " @ Ross"),
];

const DIETARY_NONE: [&str; 7] = ["no", "none", "n/a", "na", "na/a", "nope", "no."];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubEventCategory {
    Greek,
    Athletics,
    Academic,
    Family,
    #[serde(rename = "Invite-Only")]
    InviteOnly,
    General,
}

impl SubEventCategory {
    pub fn label(&self) -> &'static str {
        match self {
            SubEventCategory::Greek => "Greek",
            SubEventCategory::Athletics => "Athletics",
            SubEventCategory::Academic => "Academic",
            SubEventCategory::Family => "Family",
            SubEventCategory::InviteOnly => "Invite-Only",
            SubEventCategory::General => "General",
        }
    }
}

/// Category rules in priority order; the first pattern that matches the
/// lower-cased column name wins.
const CATEGORY_RULES: &[(SubEventCategory, &str)] = &[
    (
        SubEventCategory::Greek,
        r"kappa|delta|phi|sigma|alpha|sorority|fraternity|greek",
    ),
    (
        SubEventCategory::Athletics,
        r#"swim|soccer|volleyball|captain|hall of fame|"w"|association"#,
    ),
    (
        SubEventCategory::Academic,
        r"pints|observatory|performing|prof",
    ),
    (SubEventCategory::Family, r"family|mixer"),
    (SubEventCategory::InviteOnly, r"invite"),
];

static CATEGORY_PATTERNS: LazyLock<Vec<(SubEventCategory, Regex)>> = LazyLock::new(|| {
    CATEGORY_RULES
        .iter()
        .map(|(category, pattern)| {
            (
                *category,
                Regex::new(pattern).expect("valid sub-event category pattern"),
            )
        })
        .collect()
});

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})").expect("valid date prefix pattern"));

pub fn categorize_sub_event(column_name: &str) -> SubEventCategory {
    let lowered = column_name.to_lowercase();
    CATEGORY_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&lowered))
        .map(|(category, _)| *category)
        .unwrap_or(SubEventCategory::General)
}

pub fn shorten_event_name(column_name: &str) -> String {
    if column_name.chars().count() <= SHORTEN_ABOVE {
        return column_name.to_string();
    }
    let mut short = column_name.to_string();
    for (from, to) in SUB_EVENT_SHORTENINGS {
        short = short.replacen(from, to, 1);
    }
    if short.chars().count() > TRUNCATE_ABOVE {
        short = short.chars().take(TRUNCATE_TO).collect::<String>() + "...";
    }
    short
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubEvent {
    pub name: String,
    pub full_name: String,
    pub count: usize,
    pub category: SubEventCategory,
}

/// Columns whose values are mostly `Attending` / `Not Attending`.
///
/// A column qualifies when those two values together fill more than half of
/// the rows and at least one row is attending. Results are ordered by
/// attending count, descending.
pub fn detect_sub_events(rows: &RowSet) -> Vec<SubEvent> {
    let row_count = rows.len();
    let mut events = rows
        .headers()
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| {
            let (attending, not_attending) =
                rows.rows()
                    .iter()
                    .fold((0usize, 0usize), |(yes, no), row| match row[idx].as_str() {
                        ATTENDING => (yes + 1, no),
                        NOT_ATTENDING => (yes, no + 1),
                        _ => (yes, no),
                    });
            ((attending + not_attending) * 2 > row_count && attending > 0).then(|| SubEvent {
                name: shorten_event_name(header),
                full_name: header.clone(),
                count: attending,
                category: categorize_sub_event(header),
            })
        })
        .collect::<Vec<_>>();
    events.sort_by(|a, b| b.count.cmp(&a.count));
    events
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: String,
    pub count: usize,
}

/// `(year, month)` from a leading `YYYY-MM`, if the month is real.
fn registration_month(raw: &str) -> Option<(i32, u8)> {
    let captures = DATE_PREFIX.captures(raw)?;
    let year = captures.get(1)?.as_str().parse::<i32>().ok()?;
    let month = captures.get(2)?.as_str().parse::<u8>().ok()?;
    Month::try_from(month).ok()?;
    Some((year, month))
}

fn month_label(year: i32, month: u8) -> String {
    let name = Month::try_from(month)
        .map(|m| m.name())
        .unwrap_or_default();
    format!("{name} {year}")
}

/// Column positions for one registration export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationColumns {
    pub registration_id: Column,
    pub guest_type: Column,
    pub status: Column,
    pub rsvp: Column,
    pub first_time: Column,
    pub affiliation: Column,
    pub class_year: Column,
    pub state: Column,
    pub registration_date: Column,
    pub discount_code: Column,
    pub dietary: Column,
    pub check_in: Column,
    pub name: Column,
    pub email: Column,
    pub constituent_id: Column,
}

impl RegistrationColumns {
    pub fn resolve(headers: &[String]) -> Self {
        let resolver = ColumnResolver::new(headers);
        Self {
            registration_id: resolver.exact("Registration ID"),
            guest_type: resolver.exact("Guest Type"),
            status: resolver.exact("Registration Status"),
            rsvp: resolver.exact("RSVP"),
            first_time: resolver.partial("first time"),
            affiliation: resolver.partial("affiliations"),
            class_year: resolver.partial("class year, n/a"),
            state: resolver.exact_last("State"),
            registration_date: resolver.exact(REGISTRATION_DATE_COLUMN),
            discount_code: resolver.partial("discount code"),
            dietary: resolver.partial("dietary"),
            check_in: resolver.exact("Check-In"),
            name: resolver.partial("guest full name"),
            email: resolver
                .partial("guest email")
                .or_else(|| resolver.partial("email")),
            constituent_id: resolver.partial("constituent id"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStats {
    pub total: usize,
    pub unique_registrations: usize,
    pub primary_guests: usize,
    pub accompanying_guests: usize,
    pub statuses: FrequencyTable,
    pub successful: usize,
    pub pending: usize,
    pub cancelled: usize,
    pub rsvp_yes: usize,
    pub rsvp_no: usize,
    pub first_timers: usize,
    pub returning: usize,
    pub constituency: FrequencyTable,
    pub total_alumni: usize,
    pub class_year_counts: FrequencyTable,
    pub class_decades: FrequencyTable,
    pub class_year_top: Vec<(String, usize)>,
    pub states: FrequencyTable,
    pub unique_states: usize,
    pub ohio_count: usize,
    pub ohio_pct: f64,
    pub sub_events: Vec<SubEvent>,
    pub registration_months: Vec<MonthCount>,
    pub discount_codes: FrequencyTable,
    pub dietary_count: usize,
    pub checked_in: usize,
}

/// Registration statistics plus the keys needed for reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationAnalysis {
    pub stats: RegistrationStats,
    pub identities: IdentitySets,
    pub match_keys: Vec<MatchKey>,
}

/// Serializable registration statistics; identity data reduced to a name count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReport {
    #[serde(flatten)]
    pub stats: RegistrationStats,
    pub names_count: usize,
}

impl RegistrationAnalysis {
    pub fn from_rows(rows: &RowSet) -> Self {
        let columns = RegistrationColumns::resolve(rows.headers());
        let total = rows.len();

        let mut registration_ids = BTreeSet::new();
        let mut primary_guests = 0usize;
        let mut accompanying_guests = 0usize;
        let mut statuses = FrequencyTable::new();
        let mut rsvp_yes = 0usize;
        let mut rsvp_no = 0usize;
        let mut first_timers = 0usize;
        let mut returning = 0usize;
        let mut constituency = FrequencyTable::new();
        let mut total_alumni = 0usize;
        let mut class_year_counts = FrequencyTable::new();
        let mut class_decades = FrequencyTable::new();
        let mut states = FrequencyTable::new();
        let mut ohio_key = None;
        let mut months = BTreeMap::<(i32, u8), usize>::new();
        let mut discount_codes = FrequencyTable::new();
        let mut dietary_count = 0usize;
        let mut checked_in = 0usize;
        let mut identities = IdentitySets::default();
        let mut match_keys = Vec::with_capacity(total);

        for row in rows.rows() {
            let registration_id = cell(row, columns.registration_id);
            if !registration_id.is_empty() {
                registration_ids.insert(registration_id);
            }
            match cell(row, columns.guest_type) {
                "Primary Guest" => primary_guests += 1,
                "Accompanying Guest" => accompanying_guests += 1,
                _ => {}
            }
            statuses.add(cell(row, columns.status));
            match cell(row, columns.rsvp) {
                "Yes" => rsvp_yes += 1,
                "No" => rsvp_no += 1,
                _ => {}
            }
            match cell(row, columns.first_time) {
                "Yes" => first_timers += 1,
                "No" => returning += 1,
                _ => {}
            }

            let affiliation = cell(row, columns.affiliation);
            constituency.add(affiliation);
            if affiliation.to_lowercase().contains("alumni") {
                total_alumni += 1;
            }

            if let Some(year) = stats::class_year(cell(row, columns.class_year)) {
                class_year_counts.add(&stats::year_key(year));
                class_decades.add(&stats::decade_of(year));
            }

            let state = cell(row, columns.state);
            if ohio_key.is_none()
                && !state.trim().is_empty()
                && state.to_lowercase().contains("ohio")
            {
                ohio_key = Some(state);
            }
            states.add(state);

            if let Some(month) = registration_month(cell(row, columns.registration_date)) {
                *months.entry(month).or_insert(0) += 1;
            }

            let discount = cell(row, columns.discount_code);
            if discount != DISCOUNT_PLACEHOLDER {
                discount_codes.add(discount);
            }

            let dietary = cell(row, columns.dietary).trim();
            if !dietary.is_empty() && !DIETARY_NONE.contains(&dietary.to_lowercase().as_str()) {
                dietary_count += 1;
            }

            if cell(row, columns.check_in) == "Yes" {
                checked_in += 1;
            }

            let email = cell(row, columns.email);
            let constituent_id = cell(row, columns.constituent_id);
            identities.record(cell(row, columns.name), email, constituent_id);
            match_keys.push(MatchKey::new(email, constituent_id, affiliation));
        }

        let ohio_count = ohio_key.map(|key| states.get(key)).unwrap_or(0);

        let sub_events = detect_sub_events(rows);
        let registration_months = months
            .into_iter()
            .map(|((year, month), count)| MonthCount {
                month: month_label(year, month),
                count,
            })
            .collect();

        debug!(
            "Aggregated {total} registration row(s): {} sub-event(s), {} email key(s), {} ID key(s)",
            sub_events.len(),
            identities.emails.len(),
            identities.constituent_ids.len()
        );

        let stats = RegistrationStats {
            total,
            unique_registrations: registration_ids.len(),
            primary_guests,
            accompanying_guests,
            successful: statuses.get("Registration Successful"),
            pending: statuses.get("Pending Payment"),
            cancelled: statuses.get("Registration Cancelled"),
            statuses,
            rsvp_yes,
            rsvp_no,
            first_timers,
            returning,
            constituency,
            total_alumni,
            class_year_top: class_year_counts.top(CLASS_YEAR_TOP),
            class_year_counts,
            class_decades,
            unique_states: states.len(),
            ohio_count,
            ohio_pct: stats::percent_one_decimal(ohio_count, states.total()),
            states,
            sub_events,
            registration_months,
            discount_codes,
            dietary_count,
            checked_in,
        };
        Self {
            stats,
            identities,
            match_keys,
        }
    }

    pub fn into_report(self) -> RegistrationReport {
        RegistrationReport {
            names_count: self.identities.names.len(),
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_priority_order() {
        assert_eq!(
            categorize_sub_event("Kappa Alpha Theta Sisterhood event"),
            SubEventCategory::Greek
        );
        assert_eq!(
            categorize_sub_event("Men's Soccer Alumni Game"),
            SubEventCategory::Athletics
        );
        assert_eq!(
            categorize_sub_event("Perkins Observatory Open House"),
            SubEventCategory::Academic
        );
        assert_eq!(
            categorize_sub_event("Family Fun Zone"),
            SubEventCategory::Family
        );
        assert_eq!(
            categorize_sub_event("President's Dinner - Invite Only"),
            SubEventCategory::InviteOnly
        );
        assert_eq!(categorize_sub_event("Campus Tour"), SubEventCategory::General);
        // "delta" outranks "family"
        assert_eq!(
            categorize_sub_event("Delta Gamma Family Brunch"),
            SubEventCategory::Greek
        );
    }

    #[test]
    fn short_names_are_left_alone() {
        assert_eq!(shorten_event_name("Campus Tour"), "Campus Tour");
    }

    #[test]
    fn long_names_use_substitutions() {
        assert_eq!(
            shorten_event_name("2015-2025 Young Alumni - Reception and Lunch"),
            "YA -"
        );
        assert_eq!(
            shorten_event_name("Alumni Awards Reception at the Ross Art Museum"),
            "Alumni Awards @ Ross"
        );
    }

    #[test]
    fn long_names_without_substitutions_are_truncated() {
        let name = "An Extremely Long Sub Event Title That Goes On And On";
        let short = shorten_event_name(name);
        assert_eq!(short.chars().count(), 40);
        assert!(short.ends_with("..."));
        assert!(name.starts_with(short.trim_end_matches("...")));
    }

    #[test]
    fn registration_month_requires_real_month() {
        assert_eq!(registration_month("2025-09-14 10:22"), Some((2025, 9)));
        assert_eq!(registration_month("2025-13-01"), None);
        assert_eq!(registration_month("09/14/2025"), None);
        assert_eq!(month_label(2025, 9), "September 2025");
    }

    #[test]
    fn email_column_falls_back_to_plain_email() {
        let headers = ["Email", "Constituent ID", "State", "Guest Full Name", "State"]
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();
        let columns = RegistrationColumns::resolve(&headers);
        assert_eq!(columns.email, Some(0));
        assert_eq!(columns.constituent_id, Some(1));
        assert_eq!(columns.state, Some(4));
        assert_eq!(columns.name, Some(3));
        assert_eq!(columns.affiliation, None);
    }
}
