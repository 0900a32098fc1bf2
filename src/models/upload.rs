//! Upload session identity and committed chunk records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix under which every upload lands in the bucket.
pub const UPLOAD_KEY_PREFIX: &str = "uploads";

/// Object key a multipart session is bound to.
///
/// Derived as `uploads/<millis>-<filename>`. Two sessions created in the same
/// millisecond with the same filename share a key; the store keeps their
/// upload ids apart but the later completion overwrites the earlier object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn for_upload(filename: &str, created_at: DateTime<Utc>) -> Self {
        Self(format!(
            "{}/{}-{}",
            UPLOAD_KEY_PREFIX,
            created_at.timestamp_millis(),
            filename
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One committed part as the store reports it, or as a client names it in a
/// completion manifest.
///
/// Serialized with the S3 field names (`PartNumber`, `ETag`) because that is
/// the shape upload clients already speak.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Part number (1-based).
    #[serde(rename = "PartNumber", alias = "partNumber", alias = "chunkNumber")]
    pub part_number: i32,

    /// Store-assigned ETag, relayed verbatim (quotes included).
    #[serde(rename = "ETag", alias = "etag", alias = "integrityTag")]
    pub etag: String,
}

impl ChunkRecord {
    pub fn new(part_number: i32, etag: impl Into<String>) -> Self {
        Self {
            part_number,
            etag: etag.into(),
        }
    }
}

/// Sort committed parts ascending so a client can find gaps in one scan.
pub fn sort_by_part_number(parts: &mut [ChunkRecord]) {
    parts.sort_by_key(|p| p.part_number);
}
