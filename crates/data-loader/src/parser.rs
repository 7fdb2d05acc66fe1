//! Parser for the rating log.
//!
//! Format, one rating per line:
//! - `userId::movieId::rating::timestamp`
//!
//! A malformed line never aborts a load. It is reported as a
//! [`DataLoadError`] by [`parse_rating_line`], and [`parse_ratings`]
//! counts it and keeps going.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Separator between the fields of a log line
pub const FIELD_DELIMITER: &str = "::";

const FIELD_COUNT: usize = 4;

/// Ratings parsed from a log, plus how many lines were dropped
#[derive(Debug, Clone, Default)]
pub struct ParsedRatings {
    pub records: Vec<RatingRecord>,
    pub report: LoadReport,
}

/// Helper function to read a file with ISO-8859-1 encoding (Latin-1)
///
/// MovieLens dumps are Latin-1, not UTF-8. Each byte maps directly
/// to the Unicode code point of the same value.
fn read_latin1(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    Ok(bytes.iter().map(|&b| b as char).collect())
}

/// Parse the rating log at `path`.
///
/// Fails only when the file itself cannot be read.
pub fn parse_ratings(path: &Path) -> Result<ParsedRatings> {
    let content = read_latin1(path)?;
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(parse_ratings_str(&content, &file))
}

/// Parse rating log content already held in memory.
///
/// `file` only labels the skipped-line diagnostics.
pub fn parse_ratings_str(content: &str, file: &str) -> ParsedRatings {
    let mut parsed = ParsedRatings::default();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        match parse_rating_line(line, file, line_no) {
            Ok(record) => {
                parsed.records.push(record);
                parsed.report.parsed += 1;
            }
            Err(err) => {
                debug!(file, line = line_no, error = %err, "Skipping malformed rating");
                parsed.report.skipped += 1;
            }
        }
    }

    if parsed.report.skipped > 0 {
        warn!(
            "Skipped {} malformed lines in {} ({} ratings parsed)",
            parsed.report.skipped, file, parsed.report.parsed
        );
    }
    parsed
}

/// Parse one `userId::movieId::rating::timestamp` line
///
/// `file` and `line_no` only label the error.
pub fn parse_rating_line(line: &str, file: &str, line_no: usize) -> Result<RatingRecord> {
    let parts: Vec<&str> = line.trim().split(FIELD_DELIMITER).collect();
    if parts.len() != FIELD_COUNT {
        return Err(DataLoadError::FieldCountMismatch {
            expected: FIELD_COUNT,
            found: parts.len(),
            line: line_no,
        });
    }

    let user_id: UserId = parse_field(parts[0], "userId", file, line_no)?;
    let movie_id: MovieId = parse_field(parts[1], "movieId", file, line_no)?;
    let value: u8 = parse_field(parts[2], "rating", file, line_no)?;
    let timestamp: i64 = parse_field(parts[3], "timestamp", file, line_no)?;

    if !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(DataLoadError::InvalidValue {
            field: "rating".to_string(),
            value: value.to_string(),
        });
    }

    Ok(RatingRecord {
        user_id,
        movie_id,
        rating: Rating::new(value, timestamp),
    })
}

fn parse_field<T>(raw: &str, field: &str, file: &str, line_no: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line: line_no,
        reason: format!("Invalid {}: {}", field, e),
    })
}
