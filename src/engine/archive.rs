use chrono::{DateTime, SecondsFormat, Utc};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::EngineError;
use crate::constants::DATABASE_EXPORT_ENTRY;
use crate::models::{ArtifactKind, ObjectDescriptor, TableExport};

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// ISO-8601 instant with `:` and `.` swapped for `-`, e.g. `2026-10-17T03-00-00-000Z`
pub fn file_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

pub fn artifact_file_name(customer_name: &str, now: DateTime<Utc>, kind: ArtifactKind) -> String {
    let extension = match kind {
        ArtifactKind::Json => "json",
        ArtifactKind::Binary => "zip",
    };
    format!(
        "{}_backup_{}.{}",
        sanitize_name(customer_name),
        file_timestamp(now),
        extension
    )
}

/// Indented UTF-8 JSON of the table export
pub fn export_json(export: &TableExport) -> Result<Vec<u8>, EngineError> {
    Ok(serde_json::to_vec_pretty(export)?)
}

fn member_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Deflate archive holding the table export and every staged object
pub fn build_archive(
    export: &TableExport,
    objects: &[ObjectDescriptor],
) -> Result<Vec<u8>, EngineError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    writer.start_file(DATABASE_EXPORT_ENTRY, member_options())?;
    writer.write_all(&export_json(export)?)?;

    for object in objects {
        writer.start_file(object.archive_path(), member_options())?;
        writer.write_all(&object.bytes)?;
    }

    let buffer = writer.finish()?.into_inner();
    tracing::debug!(
        "Archived {} object(s) into {} bytes",
        objects.len(),
        buffer.len()
    );

    Ok(buffer)
}
