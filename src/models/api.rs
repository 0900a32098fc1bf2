//! JSON request and response bodies for the upload routes.
//!
//! Field names follow the wire contract existing browser clients use
//! (`uploadId`, `key`, `partNumber`, ...). Requests also accept the longer
//! descriptive names as aliases.

use super::upload::ChunkRecord;
use serde::{Deserialize, Serialize};

/// Body of `POST /initiate-upload`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadReq {
    pub filename: String,
    /// MIME type forwarded to the store untouched.
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadResp {
    pub upload_id: String,
    pub key: String,
}

/// Body of `POST /get-part-url`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUrlReq {
    #[serde(alias = "sessionToken")]
    pub upload_id: String,
    #[serde(alias = "objectKey")]
    pub key: String,
    /// Requested part number; must be 1 or greater.
    #[serde(alias = "chunkNumber")]
    pub part_number: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PartUrlResp {
    pub url: String,
}

/// Body of `POST /list-uploaded-parts`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPartsReq {
    #[serde(alias = "sessionToken")]
    pub upload_id: String,
    #[serde(alias = "objectKey")]
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPartsResp {
    /// Ascending by part number.
    pub uploaded_parts: Vec<ChunkRecord>,
}

/// Body of `POST /complete-upload`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadReq {
    #[serde(alias = "sessionToken")]
    pub upload_id: String,
    #[serde(alias = "objectKey")]
    pub key: String,
    #[serde(alias = "manifest")]
    pub parts: Vec<ChunkRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteUploadResp {
    pub success: bool,
}
