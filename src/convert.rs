use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexSet;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::batch::{ConversionOutcome, ConversionStatus};
use crate::decompression::LogReader;
use crate::error::ConvertError;
use crate::event::ParsedLog;
use crate::parser;

/// Convert one source log into one CSV file.
///
/// Never returns an error: every failure is folded into the returned outcome
/// so a batch keeps going past broken files. With `overwrite` false an
/// existing destination short-circuits before the source is even opened.
pub fn convert_file(
    source: &Path,
    dest: &Path,
    overwrite: bool,
    dry_run: bool,
) -> ConversionOutcome {
    if dest.exists() && !overwrite {
        debug!(source = %source.display(), "destination exists, skipping");
        return ConversionOutcome::new(source, dest, ConversionStatus::SkippedExists);
    }
    if dry_run {
        return ConversionOutcome::new(source, dest, ConversionStatus::DryRun);
    }

    match convert_inner(source, dest) {
        Ok(log) => {
            debug!(
                source = %source.display(),
                events = log.events.len(),
                malformed = log.malformed_lines,
                "converted"
            );
            ConversionOutcome::new(
                source,
                dest,
                ConversionStatus::Converted {
                    events: log.events.len(),
                    malformed_lines: log.malformed_lines,
                },
            )
        }
        Err(err) => {
            warn!(source = %source.display(), error = %err, "conversion failed");
            ConversionOutcome::new(
                source,
                dest,
                ConversionStatus::Failed {
                    error: err.describe(),
                },
            )
        }
    }
}

fn convert_inner(source: &Path, dest: &Path) -> Result<ParsedLog, ConvertError> {
    let reader = LogReader::open(source)?;
    let log = parser::parse_log(reader, source)?;
    write_csv(&log, dest)?;
    Ok(log)
}

/// Serialize a parsed log as CSV at `dest`.
///
/// The schema is per file, computed in a first pass over the events: the
/// fixed columns `timestamp, category, payload`, then the union of extracted
/// field keys in first-seen order, then the session stamp columns when the
/// filename carried one. Fields missing on an event are empty cells; no row
/// is ever dropped for schema reasons.
///
/// Rows are staged in a temp file next to the destination and renamed into
/// place only after a clean finish, so a failure partway through never
/// leaves a half-written CSV that a later non-overwrite run would trust.
fn write_csv(log: &ParsedLog, dest: &Path) -> Result<(), ConvertError> {
    let write_err = |source: io::Error| ConvertError::WriteFailure {
        path: dest.to_path_buf(),
        source,
    };
    let csv_err = |e: csv::Error| write_err(io::Error::new(io::ErrorKind::Other, e));

    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_err)?;

    let mut field_keys: IndexSet<&str> = IndexSet::new();
    for event in &log.events {
        for key in event.fields.keys() {
            field_keys.insert(key.as_str());
        }
    }

    let tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    let mut writer = csv::Writer::from_writer(tmp);

    let mut header: Vec<&str> = vec!["timestamp", "category", "payload"];
    header.extend(field_keys.iter().copied());
    if log.session.is_some() {
        header.push("session_date");
        header.push("session_time");
    }
    writer.write_record(&header).map_err(csv_err)?;

    for event in &log.events {
        let mut row: Vec<String> = Vec::with_capacity(header.len());
        row.push(event.timestamp.to_string());
        row.push(event.category.clone());
        row.push(event.payload.clone());
        for key in &field_keys {
            row.push(event.fields.get(*key).cloned().unwrap_or_default());
        }
        if let Some(session) = &log.session {
            row.push(session.date.clone());
            row.push(session.time.clone());
        }
        writer.write_record(&row).map_err(csv_err)?;
    }

    let tmp = writer
        .into_inner()
        .map_err(|e| write_err(e.into_error()))?;
    tmp.persist(dest).map_err(|e| write_err(e.error))?;
    Ok(())
}
