use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::STORAGE_ARCHIVE_PREFIX;

/// A table row; schema-agnostic field mapping
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Table name -> rows, for every table that was read successfully.
/// Keys are ordered so serialized output is stable.
pub type TableExport = BTreeMap<String, Vec<Row>>;

/// Storage object discovered and downloaded within a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub bucket: String,
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ObjectDescriptor {
    /// Archive path `storage/<bucket>/<name>`; unique because names are unique per bucket
    pub fn archive_path(&self) -> String {
        format!("{}/{}/{}", STORAGE_ARCHIVE_PREFIX, self.bucket, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Json,
    Binary,
}

impl ArtifactKind {
    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::Json => "application/json",
            ArtifactKind::Binary => "application/zip",
        }
    }
}

/// Something a run could not read; the run carries on without it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SkippedItem {
    Table { name: String, reason: String },
    /// The bucket list itself could not be read, so no storage was exported
    Storage { reason: String },
    Bucket { name: String, reason: String },
    Object { bucket: String, name: String, reason: String },
}

/// Final output of one backup run
#[derive(Debug, Clone)]
pub struct BackupArtifact {
    pub buffer: Vec<u8>,
    pub file_name: String,
    pub kind: ArtifactKind,
    pub skipped: Vec<SkippedItem>,
}

impl BackupArtifact {
    pub fn size(&self) -> usize {
        self.buffer.len()
    }
}
