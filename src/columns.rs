//! Resolve-once column lookup.
//!
//! Export headers drift between files ("Guest Email" vs "Email", "Constituent
//! Id" vs "Constituent ID"), so the aggregators never search headers per row.
//! They build a [`ColumnResolver`] over the header list once, resolve every
//! column they need to an index up front, and read cells through [`cell`].

/// Index of a resolved column, or `None` when the export lacks it.
pub type Column = Option<usize>;

pub struct ColumnResolver<'a> {
    headers: &'a [String],
    lowered: Vec<String>,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(headers: &'a [String]) -> Self {
        Self {
            headers,
            lowered: headers.iter().map(|h| h.to_lowercase()).collect(),
        }
    }

    /// First header that case-insensitively contains `fragment`.
    pub fn partial(&self, fragment: &str) -> Column {
        let needle = fragment.to_lowercase();
        self.lowered.iter().position(|h| h.contains(&needle))
    }

    /// First header equal to `name`.
    pub fn exact(&self, name: &str) -> Column {
        self.headers.iter().position(|h| h == name)
    }

    /// Last header equal to `name`; later duplicates win.
    pub fn exact_last(&self, name: &str) -> Column {
        self.headers.iter().rposition(|h| h == name)
    }

    pub fn name(&self, column: Column) -> Option<&'a str> {
        column.and_then(|idx| self.headers.get(idx)).map(String::as_str)
    }
}

/// Cell text for `column`, or `""` when the column is absent.
pub fn cell(row: &[String], column: Column) -> &str {
    column
        .and_then(|idx| row.get(idx))
        .map(String::as_str)
        .unwrap_or("")
}
