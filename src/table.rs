//! Plain-text tables for the `summary` output format and `detect`.

use std::borrow::Cow;
use std::fmt::Write as _;

const ELLIPSIS: &str = "...";

/// Column-aligned rendering of `rows` under `headers`.
///
/// Cells wider than `max_cell_width` are cut and suffixed with `...`. Cells
/// beyond the header count are ignored.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], max_cell_width: usize) -> String {
    let max_cell_width = max_cell_width.max(ELLIPSIS.len() + 1);
    let headers = headers
        .iter()
        .map(|h| fit_cell(h, max_cell_width))
        .collect::<Vec<_>>();
    let rows = rows
        .iter()
        .map(|row| {
            row.iter()
                .take(headers.len())
                .map(|cell| fit_cell(cell, max_cell_width))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(&headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, &width)| format!("{value:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn fit_cell(value: &str, max_width: usize) -> String {
    let sanitized = sanitize_cell(value);
    if sanitized.chars().count() <= max_width {
        return sanitized.into_owned();
    }
    let mut cut = sanitized
        .chars()
        .take(max_width - ELLIPSIS.len())
        .collect::<String>();
    cut.push_str(ELLIPSIS);
    cut
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(
            value
                .chars()
                .map(|ch| match ch {
                    '\n' | '\r' | '\t' => ' ',
                    other => other,
                })
                .collect(),
        )
    } else {
        Cow::Borrowed(value)
    }
}
