//! CSV input/output helpers.
//!
//! - **Delimiter resolution**: `.tsv` inputs default to tab, everything else
//!   to comma, unless a delimiter is given explicitly.
//! - **Encoding**: input cells are decoded with `encoding_rs`, defaulting to
//!   UTF-8.
//! - **stdin/stdout**: the `-` path reads standard input; a missing output
//!   path writes to standard output.
//!
//! Input files are read completely into a [`RawTable`] before any row is
//! processed.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Header titles plus every data row, as decoded text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

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

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut builder = csv::WriterBuilder::new();
    builder.delimiter(delimiter);
    Ok(builder.from_writer(writer))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn read_table<R>(reader: &mut csv::Reader<R>, encoding: &'static Encoding) -> Result<RawTable>
where
    R: Read,
{
    let header = reader.byte_headers().context("Reading header row")?.clone();
    let header = decode_record(&header, encoding).context("Decoding header row")?;
    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        let decoded =
            decode_record(&record, encoding).with_context(|| format!("Decoding row {}", idx + 2))?;
        rows.push(decoded);
    }
    Ok(RawTable { header, rows })
}

pub fn read_table_from_path(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<RawTable> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    read_table(&mut reader, encoding).with_context(|| format!("Reading CSV file {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn tsv_extension_defaults_to_tab() {
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), Some(b';')), b';');
    }

    #[test]
    fn unknown_encoding_label_is_an_error() {
        assert!(resolve_encoding(Some("not-an-encoding")).is_err());
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
    }

    #[test]
    fn read_table_splits_header_from_rows() {
        let data = "name,locality\nSpringfield Elementary,Springfield\n\"Shelbyville, High\",Shelbyville\n";
        let mut reader = open_csv_reader(data.as_bytes(), b',');
        let table = read_table(&mut reader, UTF_8).unwrap();
        assert_eq!(table.header, vec!["name", "locality"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][0], "Shelbyville, High");
    }

    #[test]
    fn read_table_rejects_ragged_rows() {
        let data = "name,locality\nSpringfield\n";
        let mut reader = open_csv_reader(data.as_bytes(), b',');
        assert!(read_table(&mut reader, UTF_8).is_err());
    }

    #[test]
    fn read_table_decodes_legacy_encodings() {
        let data: &[u8] = b"name\nCaf\xe9 High\n";
        let mut reader = open_csv_reader(data, b',');
        let table = read_table(&mut reader, WINDOWS_1252).unwrap();
        assert_eq!(table.rows[0][0], "Caf\u{e9} High");
    }
}
