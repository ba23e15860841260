//! Human-readable rendering of an [`AnalysisReport`].

use std::fmt::Write as _;

use crate::{analysis::AnalysisReport, stats, table::render_table};

const BODY_WIDTH: usize = 96;
const TOP_EVENTS: usize = 10;

pub fn render_summary(report: &AnalysisReport) -> String {
    let donor = &report.donor.stats;
    let registration = &report.registration.stats;
    let cross = &report.cross;

    let mut output = String::new();
    for warning in &report.warnings {
        let _ = writeln!(output, "warning: {warning}");
    }

    let mut headline = vec![
        metric("Registrants", registration.total),
        metric("Unique registrations", registration.unique_registrations),
        metric("Primary guests", registration.primary_guests),
        metric("Accompanying guests", registration.accompanying_guests),
        metric("First-time attendees", registration.first_timers),
        metric("Checked in", registration.checked_in),
        vec![
            "Ohio share".to_string(),
            format!("{}%", registration.ohio_pct),
        ],
    ];
    if report.has_re {
        headline.extend([
            metric("Donor CRM records", donor.total),
            metric("Donors", donor.giving.donors_count),
            metric("Non-donors", donor.giving.non_donors),
            vec![
                "Lifetime giving".to_string(),
                format!("${}", stats::format_number(donor.giving.lifetime_total)),
            ],
            metric("Matched by email", cross.match_by_email.matched),
            metric("Matched by constituent ID", cross.match_by_constituent_id.matched),
            metric("Registrants missing from CRM", cross.registration_gap.count),
        ]);
    }
    let _ = writeln!(output, "Event: {}", report.event_type.as_str());
    output.push('\n');
    output.push_str(&render_table(&["Metric", "Value"], &headline, BODY_WIDTH));

    if !registration.sub_events.is_empty() {
        let rows = registration
            .sub_events
            .iter()
            .take(TOP_EVENTS)
            .map(|event| {
                vec![
                    event.name.clone(),
                    event.count.to_string(),
                    event.category.label().to_string(),
                ]
            })
            .collect::<Vec<_>>();
        output.push('\n');
        output.push_str(&render_table(&["Event", "Attending", "Category"], &rows, BODY_WIDTH));
    }

    if !report.insights.is_empty() {
        let rows = report
            .insights
            .iter()
            .map(|insight| {
                vec![
                    format!("{:?}", insight.priority),
                    insight.title.clone(),
                    insight.body.clone(),
                ]
            })
            .collect::<Vec<_>>();
        output.push('\n');
        output.push_str(&render_table(&["Priority", "Insight", "Detail"], &rows, BODY_WIDTH));
    }
    output
}

fn metric(label: &str, value: usize) -> Vec<String> {
    vec![label.to_string(), value.to_string()]
}
