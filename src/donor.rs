//! Donor CRM aggregation.
//!
//! [`DonorAnalysis::from_rows`] makes a single pass over a classified donor
//! export and returns the finished statistics together with the identity sets
//! used for matching. [`DonorAnalysis::into_report`] drops the identity sets
//! for serialization.

use std::{collections::BTreeMap, sync::LazyLock};

use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::{
    columns::{Column, ColumnResolver, cell},
    frequency::FrequencyTable,
    identity::IdentitySets,
    loader::RowSet,
    stats::{self, ValueSample},
};

/// Sentinel the CRM uses for "no major assigned".
pub const NO_MAJOR: &str = "MAUNDE";
pub const CLASS_YEAR_TOP: usize = 15;
/// Exact spellings counted as Ohio. The first one seen in row order is used.
const OHIO_KEYS: [&str; 2] = ["OH", "Ohio"];

static ANNUAL_FUND_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*AF\s*(\d{2}|\d{4})\s*-\s*Gifts\s*$").expect("valid annual fund pattern")
});

/// Lifetime giving bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GivingTier {
    #[serde(rename = "$0")]
    Zero,
    #[serde(rename = "$1-99")]
    UnderHundred,
    #[serde(rename = "$100-999")]
    Hundreds,
    #[serde(rename = "$1K-9.9K")]
    Thousands,
    #[serde(rename = "$10K-99K")]
    TenThousands,
    #[serde(rename = "$100K+")]
    HundredThousandPlus,
}

impl GivingTier {
    pub const ALL: [GivingTier; 6] = [
        GivingTier::Zero,
        GivingTier::UnderHundred,
        GivingTier::Hundreds,
        GivingTier::Thousands,
        GivingTier::TenThousands,
        GivingTier::HundredThousandPlus,
    ];

    /// Band for a lifetime giving amount. Negative adjustments count as `$0`.
    pub fn for_amount(amount: f64) -> Self {
        if amount <= 0.0 {
            GivingTier::Zero
        } else if amount < 100.0 {
            GivingTier::UnderHundred
        } else if amount < 1_000.0 {
            GivingTier::Hundreds
        } else if amount < 10_000.0 {
            GivingTier::Thousands
        } else if amount < 100_000.0 {
            GivingTier::TenThousands
        } else {
            GivingTier::HundredThousandPlus
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GivingTier::Zero => "$0",
            GivingTier::UnderHundred => "$1-99",
            GivingTier::Hundreds => "$100-999",
            GivingTier::Thousands => "$1K-9.9K",
            GivingTier::TenThousands => "$10K-99K",
            GivingTier::HundredThousandPlus => "$100K+",
        }
    }
}

/// Counts every lifetime giving value into exactly one band. All six bands are
/// present in the result, zero or not.
pub fn tier_histogram(values: &[f64]) -> BTreeMap<GivingTier, usize> {
    let mut tiers = GivingTier::ALL
        .into_iter()
        .map(|tier| (tier, 0))
        .collect::<BTreeMap<_, _>>();
    for value in values {
        *tiers.entry(GivingTier::for_amount(*value)).or_insert(0) += 1;
    }
    tiers
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GivingSummary {
    pub lifetime_total: f64,
    pub lifetime_mean: f64,
    pub lifetime_median: f64,
    pub lifetime_max: f64,
    pub last_gift_mean: f64,
    pub last_gift_median: f64,
    pub donors_count: usize,
    pub non_donors: usize,
    pub tiers: BTreeMap<GivingTier, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiscalYearGiving {
    pub year: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorStats {
    pub total: usize,
    pub constituency: FrequencyTable,
    pub class_year_counts: FrequencyTable,
    pub class_decades: FrequencyTable,
    pub class_year_top: Vec<(String, usize)>,
    pub states: FrequencyTable,
    pub unique_states: usize,
    pub ohio_count: usize,
    pub ohio_pct: f64,
    pub greek_total: usize,
    pub greek_none: usize,
    pub greek: FrequencyTable,
    pub majors: FrequencyTable,
    pub giving: GivingSummary,
    pub fy_giving: Vec<FiscalYearGiving>,
    pub wealth_estimate: FrequencyTable,
    pub gift_capacity: FrequencyTable,
    pub eng_score_mean: f64,
    pub eng_score_median: f64,
    pub employers: FrequencyTable,
    pub positions: FrequencyTable,
    pub spouse_count: usize,
    pub spouse_alumni: usize,
}

/// Donor statistics plus the identity sets needed for reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonorAnalysis {
    pub stats: DonorStats,
    pub identities: IdentitySets,
}

/// Serializable donor statistics; identity sets reduced to a name count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorReport {
    #[serde(flatten)]
    pub stats: DonorStats,
    pub names_count: usize,
}

struct AnnualFundColumn {
    label: String,
    sort_year: u32,
    index: usize,
}

struct DonorColumns {
    id: Column,
    name: Column,
    email: Column,
    constituency: Column,
    class_year: Column,
    state: Column,
    greek: Column,
    major: Column,
    lifetime_giving: Column,
    last_gift: Column,
    wealth_estimate: Column,
    gift_capacity: Column,
    engagement: Column,
    employer: Column,
    position: Column,
    spouse_name: Column,
    spouse_class_year: Column,
    annual_fund: Vec<AnnualFundColumn>,
}

impl DonorColumns {
    fn resolve(headers: &[String]) -> Self {
        let resolver = ColumnResolver::new(headers);
        let mut annual_fund = headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                let captures = ANNUAL_FUND_HEADER.captures(header)?;
                let digits = captures.get(1)?.as_str();
                let year = digits.parse::<u32>().ok()?;
                Some(AnnualFundColumn {
                    label: format!("FY{digits}"),
                    sort_year: if digits.len() == 2 { 2000 + year } else { year },
                    index,
                })
            })
            .collect::<Vec<_>>();
        annual_fund.sort_by_key(|column| column.sort_year);

        Self {
            id: resolver.exact("ID"),
            name: resolver.exact("Name"),
            email: resolver.exact("Email"),
            constituency: resolver.exact("Constituency Code"),
            class_year: resolver.exact("CL YR"),
            state: resolver.exact("State"),
            greek: resolver.exact("Greek Affiliation"),
            major: resolver.exact("Major"),
            lifetime_giving: resolver.exact("LT Giving"),
            last_gift: resolver.exact("Last Gift Amount"),
            wealth_estimate: resolver.exact("WE Range"),
            gift_capacity: resolver.exact("Internal Gift Capacity"),
            engagement: resolver.exact("Eng Score"),
            employer: resolver.exact("CnPrBs_Org_Name"),
            position: resolver.exact("CnPrBs_Position"),
            spouse_name: resolver.exact("SP Name"),
            spouse_class_year: resolver.exact("SP CL YR"),
            annual_fund,
        }
    }
}

impl DonorAnalysis {
    pub fn from_rows(rows: &RowSet) -> Self {
        let columns = DonorColumns::resolve(rows.headers());
        let total = rows.len();

        let mut constituency = FrequencyTable::new();
        let mut class_year_counts = FrequencyTable::new();
        let mut class_decades = FrequencyTable::new();
        let mut states = FrequencyTable::new();
        let mut ohio_key = None;
        let mut greek = FrequencyTable::new();
        let mut greek_total = 0usize;
        let mut majors = FrequencyTable::new();
        let mut lifetime = ValueSample::default();
        let mut last_gifts = ValueSample::default();
        let mut annual_fund_sums = vec![0.0f64; columns.annual_fund.len()];
        let mut wealth_estimate = FrequencyTable::new();
        let mut gift_capacity = FrequencyTable::new();
        let mut engagement = ValueSample::default();
        let mut employers = FrequencyTable::new();
        let mut positions = FrequencyTable::new();
        let mut spouse_count = 0usize;
        let mut spouse_alumni = 0usize;
        let mut identities = IdentitySets::default();

        for row in rows.rows() {
            constituency.add(cell(row, columns.constituency));

            if let Some(year) = stats::class_year(cell(row, columns.class_year)) {
                class_year_counts.add(&stats::year_key(year));
                class_decades.add(&stats::decade_of(year));
            }

            let state = cell(row, columns.state);
            if ohio_key.is_none() && OHIO_KEYS.contains(&state) {
                ohio_key = Some(state);
            }
            states.add(state);

            let affiliation = cell(row, columns.greek);
            if !affiliation.trim().is_empty() {
                greek_total += 1;
                greek.add(affiliation);
            }

            let major = cell(row, columns.major);
            if major != NO_MAJOR {
                majors.add(major);
            }

            if let Some(amount) = stats::to_number(cell(row, columns.lifetime_giving)) {
                lifetime.push(amount);
            }
            if let Some(amount) = stats::to_number(cell(row, columns.last_gift))
                && amount > 0.0
            {
                last_gifts.push(amount);
            }
            for (sum, column) in annual_fund_sums.iter_mut().zip(&columns.annual_fund) {
                *sum += stats::to_number(cell(row, Some(column.index))).unwrap_or(0.0);
            }

            wealth_estimate.add(cell(row, columns.wealth_estimate));
            gift_capacity.add(cell(row, columns.gift_capacity));
            if let Some(score) = stats::to_number(cell(row, columns.engagement)) {
                engagement.push(score);
            }
            employers.add(cell(row, columns.employer));
            positions.add(cell(row, columns.position));

            if !cell(row, columns.spouse_name).trim().is_empty() {
                spouse_count += 1;
            }
            if !cell(row, columns.spouse_class_year).trim().is_empty() {
                spouse_alumni += 1;
            }

            identities.record(
                cell(row, columns.name),
                cell(row, columns.email),
                cell(row, columns.id),
            );
        }

        let ohio_count = ohio_key.map(|key| states.get(key)).unwrap_or(0);

        let giving = GivingSummary {
            lifetime_total: lifetime.sum(),
            lifetime_mean: lifetime.mean(),
            lifetime_median: lifetime.median(),
            lifetime_max: lifetime.max_or_zero(),
            last_gift_mean: last_gifts.mean(),
            last_gift_median: last_gifts.median(),
            donors_count: last_gifts.count(),
            non_donors: total - last_gifts.count(),
            tiers: tier_histogram(lifetime.values()),
        };

        let fy_giving = columns
            .annual_fund
            .iter()
            .zip(annual_fund_sums)
            .map(|(column, sum)| FiscalYearGiving {
                year: column.label.clone(),
                amount: sum.round(),
            })
            .collect();

        debug!(
            "Aggregated {total} donor row(s): {} donor(s), {} email key(s), {} ID key(s)",
            giving.donors_count,
            identities.emails.len(),
            identities.constituent_ids.len()
        );

        let stats = DonorStats {
            total,
            constituency,
            class_year_top: class_year_counts.top(CLASS_YEAR_TOP),
            class_year_counts,
            class_decades,
            unique_states: states.len(),
            ohio_count,
            ohio_pct: stats::percent_one_decimal(ohio_count, total),
            states,
            greek_total,
            greek_none: total - greek_total,
            greek,
            majors,
            giving,
            fy_giving,
            wealth_estimate,
            gift_capacity,
            eng_score_mean: stats::round_one_decimal(engagement.mean()),
            eng_score_median: engagement.median(),
            employers,
            positions,
            spouse_count,
            spouse_alumni,
        };
        Self { stats, identities }
    }

    pub fn has_data(&self) -> bool {
        self.stats.total > 0
    }

    pub fn into_report(self) -> DonorReport {
        DonorReport {
            names_count: self.identities.names.len(),
            stats: self.stats,
        }
    }
}
