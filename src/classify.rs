//! Header-based role detection for uploaded exports.
//!
//! Each role is recognised by a static table of `(signal, predicate)` pairs run
//! against lower-cased, trimmed header names. A file matches a role when any
//! signal for that role fires on any header. Adding a heuristic means adding a
//! row to the table.

use itertools::Itertools;
use log::{debug, warn};
use serde::Serialize;

use crate::error::{AnalysisError, FileSlot};

type HeaderPredicate = fn(&str) -> bool;

const DONOR_SIGNALS: &[(&str, HeaderPredicate)] = &[
    ("lt giving", |h| h.contains("lt giving")),
    ("lifetime giving", |h| h.contains("lifetime giving")),
    ("constituency code", |h| h.contains("constituency code")),
    ("constituency", |h| h.contains("constituency")),
    ("cl yr", |h| h == "cl yr"),
    ("class year", |h| h.contains("class year") && !h.contains("n/a")),
    ("internal gift capacity", |h| h.contains("internal gift capacity")),
    ("we range", |h| h.contains("we range")),
    ("wealth engine", |h| h.contains("wealth engine")),
    ("last gift amount", |h| h.contains("last gift amount")),
    ("annual fund", |h| h.contains("annual fund")),
];

const REGISTRATION_SIGNALS: &[(&str, HeaderPredicate)] = &[
    ("registration id", |h| h.contains("registration id")),
    ("guest type", |h| h.contains("guest type")),
    ("guest full name", |h| h.contains("guest full name")),
    ("guest first name", |h| h.contains("guest first name")),
    ("guest last name", |h| h.contains("guest last name")),
    ("registration status", |h| h.contains("registration status")),
    ("registration date", |h| h.contains("registration date")),
];

const DONOR_HINT: &str = "Donor CRM exports need: LT Giving, Constituency Code, CL YR, or Internal Gift Capacity.";
const REGISTRATION_HINT: &str = "Registration exports need: Registration ID, Guest Type, Guest Full Name, or Registration Status.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub donor: bool,
    pub registration: bool,
}

impl Classification {
    pub fn is_unrecognized(&self) -> bool {
        !self.donor && !self.registration
    }
}

/// Names of every signal from `table` that fires on at least one header.
fn fired_signals(table: &[(&'static str, HeaderPredicate)], headers: &[String]) -> Vec<&'static str> {
    let lowered = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect::<Vec<_>>();
    table
        .iter()
        .filter(|(_, predicate)| lowered.iter().any(|h| predicate(h)))
        .map(|(name, _)| *name)
        .collect()
}

pub fn donor_signals(headers: &[String]) -> Vec<&'static str> {
    fired_signals(DONOR_SIGNALS, headers)
}

pub fn registration_signals(headers: &[String]) -> Vec<&'static str> {
    fired_signals(REGISTRATION_SIGNALS, headers)
}

pub fn classify_headers(headers: &[String]) -> Classification {
    let classification = Classification {
        donor: !donor_signals(headers).is_empty(),
        registration: !registration_signals(headers).is_empty(),
    };
    debug!("Classified {} header(s) as {classification:?}", headers.len());
    classification
}

/// Joins the first `limit` headers, marking truncation with `...`.
pub fn header_sample(headers: &[String], limit: usize) -> String {
    let sample = headers.iter().take(limit).join(", ");
    if headers.len() > limit {
        format!("{sample}...")
    } else {
        sample
    }
}

/// A file awaiting role assignment.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub headers: &'a [String],
    pub classification: Classification,
}

impl<'a> Candidate<'a> {
    pub fn new(headers: &'a [String]) -> Self {
        Self {
            headers,
            classification: classify_headers(headers),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleAssignment {
    pub donor: FileSlot,
    pub registration: FileSlot,
    /// Both files carried the same signals; the default order was assumed.
    pub ambiguous: bool,
}

pub fn assign_roles(
    first: &Candidate<'_>,
    second: &Candidate<'_>,
) -> Result<RoleAssignment, AnalysisError> {
    let (a, b) = (first.classification, second.classification);
    if a.registration && b.donor {
        return Ok(RoleAssignment {
            donor: FileSlot::Second,
            registration: FileSlot::First,
            ambiguous: false,
        });
    }
    if a.donor && b.registration {
        return Ok(RoleAssignment {
            donor: FileSlot::First,
            registration: FileSlot::Second,
            ambiguous: false,
        });
    }
    match (a.is_unrecognized(), b.is_unrecognized()) {
        (true, true) => Err(AnalysisError::FormatMismatch(format!(
            "Neither file matches the expected format. {} columns: {}... {} columns: {}... {DONOR_HINT} {REGISTRATION_HINT}",
            FileSlot::First,
            first.headers.iter().take(6).join(", "),
            FileSlot::Second,
            second.headers.iter().take(6).join(", "),
        ))),
        (true, false) => Err(unrecognized_file(FileSlot::First, first.headers)),
        (false, true) => Err(unrecognized_file(FileSlot::Second, second.headers)),
        (false, false) => {
            warn!(
                "Both files carry the same role signals ({a:?}); assuming {} is donor data and {} is registration data",
                FileSlot::First,
                FileSlot::Second
            );
            Ok(RoleAssignment {
                donor: FileSlot::First,
                registration: FileSlot::Second,
                ambiguous: true,
            })
        }
    }
}

fn unrecognized_file(file: FileSlot, headers: &[String]) -> AnalysisError {
    AnalysisError::FormatMismatch(format!(
        "{file} does not match expected format. Found columns: {}. {DONOR_HINT} {REGISTRATION_HINT}",
        header_sample(headers, 8)
    ))
}

/// Single-file mode only accepts a registration export.
pub fn require_registration(candidate: &Candidate<'_>) -> Result<(), AnalysisError> {
    if candidate.classification.registration {
        return Ok(());
    }
    let looks_like = if candidate.classification.donor {
        String::from("a donor CRM export")
    } else {
        format!(
            "neither export (columns: {})",
            header_sample(candidate.headers, 8)
        )
    };
    Err(AnalysisError::FormatMismatch(format!(
        "Single-file mode requires event registration data. {} looks like {looks_like}; upload it together with a registration export for full analysis. {REGISTRATION_HINT}",
        FileSlot::Only,
    )))
}
