//! The object store collaborator.
//!
//! `MultipartStore` is the only seam between the HTTP layer and storage. The
//! store owns every piece of session state; implementations must not cache
//! upload ids, keys or part listings between calls.

pub mod error;
pub mod s3;

use crate::models::upload::ChunkRecord;
use async_trait::async_trait;
use std::time::Duration;

pub use error::{StoreError, StoreResult};
pub use s3::S3Store;

#[async_trait]
pub trait MultipartStore: Send + Sync {
    /// Local readiness check; must not contact the store.
    ///
    /// Returns a description of what is wrong when the store cannot be used.
    fn readiness(&self) -> Result<(), String> {
        Ok(())
    }

    /// Open a multipart upload for `key` and return the store's upload id.
    async fn create_multipart_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
    ) -> StoreResult<String>;

    /// Presign an `UploadPart` request for exactly one part.
    ///
    /// The URL must stop working `expires_in` after it is issued; the store
    /// enforces that, not the caller.
    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> StoreResult<String>;

    /// Every part the store has committed for the upload, in whatever order
    /// the store returns them. Implementations follow pagination to the end.
    async fn list_parts(&self, key: &str, upload_id: &str) -> StoreResult<Vec<ChunkRecord>>;

    /// Assemble the upload from `parts`, exactly as given.
    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[ChunkRecord],
    ) -> StoreResult<()>;
}
