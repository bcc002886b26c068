//! Loads a distribution URL into a `DataFrame`, picking the reader from the file extension.

use crate::dataset::error::DatasetError;
use crate::utils::download;
use log::{error, info, warn};
use polars::prelude::*;
use reqwest::Client;
use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;
use tokio::task;

/// File types the resolver knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// Guesses the format from whatever follows the last `.` of the URL.
    pub fn from_url(url: &str) -> Option<Self> {
        match url.rsplit('.').next()? {
            "csv" => Some(FileFormat::Csv),
            "parquet" => Some(FileFormat::Parquet),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Parquet => write!(f, "parquet"),
        }
    }
}

/// Downloads `url` and reads it as CSV or parquet.
///
/// Returns `Ok(None)` without touching the network when the extension is
/// neither `csv` nor `parquet`. CSV files are read with `,` first and with `;`
/// if that produced at most one column. When both guesses give a single
/// column the table is returned as-is and a warning is logged; callers have
/// to check the width themselves.
pub async fn load_dataset(client: &Client, url: &str) -> Result<Option<DataFrame>, DatasetError> {
    let Some(format) = FileFormat::from_url(url) else {
        error!(
            "Cannot load data from {}! Please provide an url with csv or parquet extension.",
            url
        );
        return Ok(None);
    };

    let bytes = download::<DatasetError>(client, url, &[]).await?;
    info!("Downloaded {} bytes of {} data from {}", bytes.len(), format, url);

    let url_owned = url.to_string();
    let frame = task::spawn_blocking(move || match format {
        FileFormat::Csv => read_csv_with_fallback(&bytes, &url_owned),
        FileFormat::Parquet => read_parquet(bytes, &url_owned),
    })
    .await??;

    Ok(Some(frame))
}

fn read_csv_with_fallback(bytes: &[u8], url: &str) -> Result<DataFrame, DatasetError> {
    let (frame, skipped) = read_csv(bytes, b',', url)?;
    if frame.width() > 1 {
        report_skipped_rows(&skipped, url);
        return Ok(frame);
    }

    info!("Only {} column(s) with ',' separator, retrying {} with ';'", frame.width(), url);
    let (frame, skipped) = read_csv(bytes, b';', url)?;
    report_skipped_rows(&skipped, url);
    if frame.width() <= 1 {
        warn!(
            "The data from {} wasn't imported properly, the separator couldn't be determined. \
             Please check the dataset manually.",
            url
        );
    }
    Ok(frame)
}

/// Reads `bytes` with the given separator. Rows with more fields than the
/// header are left out and returned alongside the table; invalid UTF-8 is
/// replaced. Neither is fatal.
fn read_csv(
    bytes: &[u8],
    separator: u8,
    url: &str,
) -> Result<(DataFrame, Vec<SkippedRow>), DatasetError> {
    let (kept, skipped) = drop_overlong_rows(bytes, separator);
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_ignore_errors(true)
        .with_infer_schema_length(None)
        .map_parse_options(|options| {
            options
                .with_separator(separator)
                .with_truncate_ragged_lines(true)
                .with_encoding(CsvEncoding::LossyUtf8)
        })
        .into_reader_with_file_handle(Cursor::new(kept.as_ref()))
        .finish()
        .map_err(|source| DatasetError::CsvRead {
            url: url.to_string(),
            source,
        })?;
    Ok((frame, skipped))
}

/// A CSV row left out because it has more fields than the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SkippedRow {
    /// 1-based line the row starts on.
    line: usize,
    expected: usize,
    found: usize,
}

fn report_skipped_rows(skipped: &[SkippedRow], url: &str) {
    for row in skipped {
        warn!(
            "Skipping line {} of {}: expected {} fields, saw {}",
            row.line, url, row.expected, row.found
        );
    }
}

/// Splits `bytes` into records, honouring quoted fields, and drops every
/// record with more fields than the first one.
fn drop_overlong_rows(bytes: &[u8], separator: u8) -> (Cow<'_, [u8]>, Vec<SkippedRow>) {
    struct Record {
        start: usize,
        end: usize,
        fields: usize,
        line: usize,
    }

    let mut records = Vec::new();
    let mut start = 0;
    let mut fields = 1;
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;

    for (i, &byte) in bytes.iter().enumerate() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == b'\n' {
            line += 1;
            if !in_quotes {
                records.push(Record {
                    start,
                    end: i + 1,
                    fields,
                    line: record_line,
                });
                start = i + 1;
                fields = 1;
                record_line = line;
            }
        } else if byte == separator && !in_quotes {
            fields += 1;
        }
    }
    if start < bytes.len() {
        records.push(Record {
            start,
            end: bytes.len(),
            fields,
            line: record_line,
        });
    }

    let Some(expected) = records.first().map(|header| header.fields) else {
        return (Cow::Borrowed(bytes), Vec::new());
    };
    let skipped: Vec<SkippedRow> = records
        .iter()
        .filter(|record| record.fields > expected)
        .map(|record| SkippedRow {
            line: record.line,
            expected,
            found: record.fields,
        })
        .collect();
    if skipped.is_empty() {
        return (Cow::Borrowed(bytes), skipped);
    }

    let kept = records
        .iter()
        .filter(|record| record.fields <= expected)
        .flat_map(|record| &bytes[record.start..record.end])
        .copied()
        .collect();
    (Cow::Owned(kept), skipped)
}

fn read_parquet(bytes: Vec<u8>, url: &str) -> Result<DataFrame, DatasetError> {
    ParquetReader::new(Cursor::new(bytes))
        .finish()
        .map_err(|source| DatasetError::ParquetRead {
            url: url.to_string(),
            source,
        })
}
