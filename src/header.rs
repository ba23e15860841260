//! Two-row header collapsing.
//!
//! Some registration exports put a category banner ("Guest Form Data",
//! "Sub Events Attending", ...) above the real header row. Loaded naively, the
//! banner becomes the header and the real names become the first data row.

use log::debug;

use crate::loader::RowSet;

pub const CATEGORY_MARKERS: [&str; 4] = [
    "Guest Form Data",
    "Profile Data",
    "Sub Events Attending",
    "UTM Parameters",
];

fn is_category_marker(value: &str) -> bool {
    CATEGORY_MARKERS.contains(&value.trim())
}

/// Returns true when the header or the first data row carries a category marker.
pub fn has_category_row(rows: &RowSet) -> bool {
    let Some(first) = rows.rows().first() else {
        return false;
    };
    rows.headers().iter().any(|h| is_category_marker(h))
        || first.iter().any(|v| is_category_marker(v))
}

/// Promotes the first data row to the header when a category row is detected.
///
/// Each position takes the first row's trimmed value, falling back to the
/// original header where that value is blank. The promoted row is consumed;
/// every other row keeps its values by position.
pub fn collapse_category_header(rows: RowSet) -> RowSet {
    if !has_category_row(&rows) {
        return rows;
    }
    let (headers, mut records) = rows.into_parts();
    let promoted = records.remove(0);
    let headers = headers
        .into_iter()
        .zip(promoted)
        .map(|(original, value)| {
            let value = value.trim();
            if value.is_empty() {
                original
            } else {
                value.to_string()
            }
        })
        .collect::<Vec<_>>();
    debug!(
        "Collapsed two-row header into {} column(s); {} data row(s) remain",
        headers.len(),
        records.len()
    );
    RowSet::new(headers, records)
}
