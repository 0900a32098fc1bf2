//! UploadService: the multipart session protocol.
//!
//! Each method is one round trip to the store. The service keeps nothing
//! between requests: upload ids, keys and part inventories are always read
//! back from the store, which is the only authority on session state.
//! Store failures are logged with their tagged cause and surfaced to the
//! client as a single "upstream unavailable" error.

use crate::{
    config::DEFAULT_PART_URL_TTL_SECS,
    errors::AppError,
    models::upload::{ChunkRecord, ObjectKey, sort_by_part_number},
    store::{MultipartStore, StoreError},
};
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

/// A freshly opened multipart session.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub upload_id: String,
    pub key: ObjectKey,
}

/// Cheap to clone; handlers receive it as axum state.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn MultipartStore>,
    part_url_ttl: Duration,
}

impl UploadService {
    pub fn new(store: Arc<dyn MultipartStore>, part_url_ttl: Duration) -> Self {
        Self {
            store,
            part_url_ttl,
        }
    }

    /// Service with the default five minute part URL lifetime.
    pub fn with_default_ttl(store: Arc<dyn MultipartStore>) -> Self {
        Self::new(store, Duration::from_secs(DEFAULT_PART_URL_TTL_SECS))
    }

    /// Whether the store is usable, judged locally.
    pub fn store_readiness(&self) -> Result<(), String> {
        self.store.readiness()
    }

    /// Open a session for `filename` under `uploads/<millis>-<filename>`.
    pub async fn initiate_upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<UploadSession, AppError> {
        if filename.is_empty() {
            return Err(AppError::bad_request("filename must not be empty"));
        }

        let key = ObjectKey::for_upload(filename, Utc::now());
        let upload_id = self
            .store
            .create_multipart_upload(key.as_str(), content_type)
            .await
            .map_err(|err| upstream("initiate upload", key.as_str(), None, err))?;

        info!(key = %key, upload_id = %upload_id, "multipart upload initiated");
        Ok(UploadSession { upload_id, key })
    }

    /// Presign an upload URL for one part of an existing session.
    ///
    /// Neither the session nor the part number's range is checked here; the
    /// store rejects a bad upload when the client uses the URL.
    pub async fn authorize_part(
        &self,
        upload_id: &str,
        key: &str,
        part_number: i64,
    ) -> Result<String, AppError> {
        let part_number = i32::try_from(part_number)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| AppError::bad_request("partNumber must be a positive integer"))?;

        self.store
            .presign_upload_part(key, upload_id, part_number, self.part_url_ttl)
            .await
            .map_err(|err| upstream("get part URL", key, Some(upload_id), err))
    }

    /// Committed parts for a session, ascending by part number.
    pub async fn list_uploaded_parts(
        &self,
        upload_id: &str,
        key: &str,
    ) -> Result<Vec<ChunkRecord>, AppError> {
        let mut parts = self
            .store
            .list_parts(key, upload_id)
            .await
            .map_err(|err| upstream("list parts", key, Some(upload_id), err))?;
        sort_by_part_number(&mut parts);
        Ok(parts)
    }

    /// Ask the store to assemble the session from `parts`.
    ///
    /// The manifest is forwarded untouched: the store alone decides whether
    /// it matches what was committed. A rejection is final for this call.
    pub async fn complete_upload(
        &self,
        upload_id: &str,
        key: &str,
        parts: &[ChunkRecord],
    ) -> Result<(), AppError> {
        self.store
            .complete_multipart_upload(key, upload_id, parts)
            .await
            .map_err(|err| upstream("complete upload", key, Some(upload_id), err))?;

        info!(key = %key, upload_id = %upload_id, parts = parts.len(), "multipart upload completed");
        Ok(())
    }
}

/// Log the tagged store failure and collapse it into the client-facing error.
fn upstream(operation: &str, key: &str, upload_id: Option<&str>, err: StoreError) -> AppError {
    error!(
        operation,
        key,
        upload_id = upload_id.unwrap_or("-"),
        kind = err.kind(),
        error = %err,
        "store operation failed"
    );
    AppError::upstream_unavailable(format!("Failed to {}", operation))
}
