//! End-to-end pipeline: load, normalize, classify, aggregate, reconcile and
//! derive insights for one or two uploaded exports.

use clap::ValueEnum;
use log::{debug, info};
use serde::Serialize;

use crate::{
    classify::{self, Candidate, Classification},
    donor::{DonorAnalysis, DonorReport},
    error::{AnalysisError, FileSlot},
    header,
    insights::{self, Insight},
    loader::{self, LoadOptions, RowSet, SourceFormat},
    reconcile::CrossStats,
    registration::{RegistrationAnalysis, RegistrationReport},
};

/// Event kind the uploads describe. Carried through to the report untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum EventType {
    #[default]
    Homecoming,
    Reunion,
    NearYou,
}

impl EventType {
    /// The command-line and report spelling of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Homecoming => "homecoming",
            EventType::Reunion => "reunion",
            EventType::NearYou => "near-you",
        }
    }
}

/// One uploaded file plus how to read it.
#[derive(Debug, Clone)]
pub struct SourceInput<'a> {
    pub bytes: &'a [u8],
    pub options: LoadOptions,
}

impl<'a> SourceInput<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            options: LoadOptions::default(),
        }
    }

    pub fn with_options(bytes: &'a [u8], options: LoadOptions) -> Self {
        Self { bytes, options }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub event_type: EventType,
    /// True when a donor CRM export with at least one row took part.
    #[serde(rename = "hasRE")]
    pub has_re: bool,
    #[serde(rename = "stats2024")]
    pub donor: DonorReport,
    #[serde(rename = "stats2025")]
    pub registration: RegistrationReport,
    pub cross: CrossStats,
    pub insights: Vec<Insight>,
    pub warnings: Vec<String>,
}

/// Runs the pipeline with default load options and event type.
pub fn analyze(buffer1: &[u8], buffer2: Option<&[u8]>) -> Result<AnalysisReport, AnalysisError> {
    analyze_sources(
        SourceInput::new(buffer1),
        buffer2.map(SourceInput::new),
        EventType::default(),
    )
}

pub fn analyze_sources(
    first: SourceInput<'_>,
    second: Option<SourceInput<'_>>,
    event_type: EventType,
) -> Result<AnalysisReport, AnalysisError> {
    let mut warnings = Vec::new();
    let (donor, registration) = match second {
        Some(second) => {
            let first_rows = prepare(&first, FileSlot::First)?;
            let second_rows = prepare(&second, FileSlot::Second)?;
            let roles = classify::assign_roles(
                &Candidate::new(first_rows.headers()),
                &Candidate::new(second_rows.headers()),
            )?;
            if roles.ambiguous {
                warnings.push(format!(
                    "Both files carry the same column signals; treated {} as donor data and {} as registration data.",
                    roles.donor, roles.registration
                ));
            }
            let (donor_rows, registration_rows) = if roles.donor == FileSlot::First {
                (first_rows, second_rows)
            } else {
                (second_rows, first_rows)
            };
            info!(
                "{} is donor data ({} row(s)); {} is registration data ({} row(s))",
                roles.donor,
                donor_rows.len(),
                roles.registration,
                registration_rows.len()
            );
            (
                DonorAnalysis::from_rows(&donor_rows),
                RegistrationAnalysis::from_rows(&registration_rows),
            )
        }
        None => {
            let rows = prepare(&first, FileSlot::Only)?;
            classify::require_registration(&Candidate::new(rows.headers()))?;
            info!("Single registration export with {} row(s)", rows.len());
            (
                DonorAnalysis::default(),
                RegistrationAnalysis::from_rows(&rows),
            )
        }
    };

    let cross = CrossStats::reconcile(&donor, &registration);
    let insights = insights::generate_insights(&donor.stats, &registration.stats, &cross);
    debug!("Generated {} insight(s)", insights.len());

    Ok(AnalysisReport {
        event_type,
        has_re: donor.has_data(),
        donor: donor.into_report(),
        registration: registration.into_report(),
        cross,
        insights,
        warnings,
    })
}

/// Loads one upload and promotes a category banner row if present.
fn prepare(source: &SourceInput<'_>, file: FileSlot) -> Result<RowSet, AnalysisError> {
    let mut rows = loader::load_rows(source.bytes, &source.options)
        .map_err(|source| AnalysisError::Parse { file, source })?;
    if header::has_category_row(&rows) {
        debug!("{file}: promoting first data row to header");
        rows = header::collapse_category_header(rows);
    }
    if rows.is_empty() {
        return Err(AnalysisError::EmptyFile { file });
    }
    Ok(rows)
}

/// What the pipeline would make of a single upload, without aggregating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub format: SourceFormat,
    pub rows: usize,
    pub columns: usize,
    pub category_row: bool,
    pub classification: Classification,
    pub donor_signals: Vec<&'static str>,
    pub registration_signals: Vec<&'static str>,
}

pub fn inspect(source: &SourceInput<'_>, file: FileSlot) -> Result<SourceSummary, AnalysisError> {
    let format = loader::detect_format(source.bytes);
    let raw = loader::load_rows(source.bytes, &source.options)
        .map_err(|source| AnalysisError::Parse { file, source })?;
    let category_row = header::has_category_row(&raw);
    let rows = if category_row {
        header::collapse_category_header(raw)
    } else {
        raw
    };
    let headers = rows.headers();
    Ok(SourceSummary {
        format,
        rows: rows.len(),
        columns: rows.column_count(),
        category_row,
        classification: classify::classify_headers(headers),
        donor_signals: classify::donor_signals(headers),
        registration_signals: classify::registration_signals(headers),
    })
}
