#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_ref())
            .expect("write temp file contents");
        path
    }
}

/// Comma-separated text with a trailing newline per record.
pub fn csv_text(headers: &[&str], rows: &[&[&str]]) -> String {
    let mut text = csv_line(headers);
    for row in rows {
        text.push_str(&csv_line(row));
    }
    text
}

fn csv_line(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|field| {
            if field.contains([',', '"']) {
                format!("\"{}\"", field.replace('"', "\"\""))
            } else {
                field.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// An `.xlsx` workbook with a single sheet holding `headers` then `rows`.
/// Cells that parse as numbers are written as numbers.
pub fn xlsx_bytes(headers: &[&str], rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string(0, col as u16, *header)
            .expect("write header");
    }
    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(number) => sheet.write_number(row_num, col as u16, number),
                Err(_) => sheet.write_string(row_num, col as u16, *value),
            }
            .expect("write cell");
        }
    }
    workbook.save_to_buffer().expect("xlsx buffer")
}

pub const DONOR_HEADERS: &[&str] = &[
    "ID",
    "Name",
    "Email",
    "Constituency Code",
    "CL YR",
    "State",
    "Greek Affiliation",
    "Major",
    "LT Giving",
    "Last Gift Amount",
    "WE Range",
    "Internal Gift Capacity",
    "AF14 - Gifts",
    "AF15 - Gifts",
];

/// Five donor CRM records: three alumni, a parent and a friend.
pub fn donor_csv() -> String {
    csv_text(
        DONOR_HEADERS,
        &[
            &["1", "Jane Doe", "jane@x.edu", "Alumni", "1990", "OH", "Kappa Delta", "Biology", "$1,500", "100", "$1-$2,499", "$1-$2,499", "200", "400"],
            &["2", "Sam Roe", "sam@x.edu", "Alumni", "1995", "OH", "", "MAUNDE", "0", "", "$1-$2,499", "", "0", "100"],
            &["3", "Pat Lee", "pat@x.edu", "Parent", "", "Ohio", "", "", "50", "50", "", "", "", ""],
            &["4", "Kim Park", "kim@x.edu", "Alumni", "2021", "IN", "Sigma Chi", "History", "", "", "", "", "", ""],
            &["5", "Lou Fox", "lou@x.edu", "Friend", "", "OH", "", "", "12000", "5000", "$5,000,000+", "", "", ""],
        ],
    )
}

pub const REGISTRATION_HEADERS: &[&str] = &[
    "Registration ID",
    "Guest Type",
    "Guest Full Name",
    "Guest Email",
    "Registration Status",
    "RSVP",
    "Constituent ID",
    "Affiliations",
    "Class Year, N/A if not applicable",
    "State",
    "Registration Date Time",
    "Dietary Restrictions",
    "Check-In",
    "Homecoming Tailgate",
];

/// Four registrants: two match donor records (one by email, one by ID).
pub fn registration_csv() -> String {
    csv_text(
        REGISTRATION_HEADERS,
        &[
            &["R1", "Primary Guest", "Jane Doe", "JANE@x.edu", "Registration Successful", "Yes", "", "Alumni", "1990", "Ohio", "2025-08-03 10:00", "None", "Yes", "Attending"],
            &["R1", "Accompanying Guest", "Chris Doe", "", "Registration Successful", "Yes", "", "", "", "Ohio", "2025-08-03 10:00", "vegan", "", "Attending"],
            &["R2", "Primary Guest", "Sam Roe", "sam.new@y.com", "Pending Payment", "No", "2", "Alumni", "1995", "Indiana", "2025-09-12 08:15", "", "", "Not Attending"],
            &["R3", "Primary Guest", "Ana Gray", "ana@z.org", "Registration Successful", "Yes", "", "Parent", "", "Ohio", "2025-09-20 17:45", "", "Yes", "Attending"],
        ],
    )
}
