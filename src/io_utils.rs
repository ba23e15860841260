//! I/O utilities for reading uploads and writing reports.
//!
//! All byte-level file access in event-insights flows through this module:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8 with
//!   BOM sniffing.
//! - **Reader construction**: `open_csv_reader` builds a header-aware,
//!   flexible-width reader over decoded text.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    borrow::Cow,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};
use log::warn;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Reads an entire upload into memory, honouring the `-` stdin convention.
pub fn read_input_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if is_dash(path) {
        io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .context("Reading input from stdin")?;
    } else {
        File::open(path)
            .with_context(|| format!("Opening input file {path:?}"))?
            .read_to_end(&mut buffer)
            .with_context(|| format!("Reading input file {path:?}"))?;
    }
    Ok(buffer)
}

pub fn open_output_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    };
    Ok(writer)
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

/// Decodes an upload to text. A leading BOM overrides `encoding`; malformed
/// sequences become U+FFFD rather than failing the whole file.
pub fn decode_bytes<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Cow<'a, str> {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            "Input contained byte sequences invalid for {}; replaced with U+FFFD",
            used.name()
        );
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn tsv_extension_selects_tab() {
        let path = PathBuf::from("export.TSV");
        assert_eq!(resolve_input_delimiter(&path, None), b'\t');
        assert_eq!(resolve_input_delimiter(&path, Some(b';')), b';');
        assert_eq!(
            resolve_input_delimiter(Path::new("export.csv"), None),
            b','
        );
    }

    #[test]
    fn decode_strips_utf8_bom() {
        let bytes = b"\xEF\xBB\xBFID,Name";
        assert_eq!(decode_bytes(bytes, UTF_8), "ID,Name");
    }

    #[test]
    fn decode_honours_latin1_label() {
        let encoding = resolve_encoding(Some("latin1")).expect("known label");
        assert_eq!(decode_bytes(b"Caf\xE9", encoding), "Café");
        assert!(resolve_encoding(Some("klingon")).is_err());
    }
}
