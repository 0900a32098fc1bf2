//! In-memory stand-in for an S3-compatible store.
//!
//! Models the parts of multipart semantics the gateway relies on: opaque
//! upload ids, per-part ETags (quoted MD5, like S3), exact-manifest
//! completion and consumed sessions. Presigned URLs carry a random nonce so
//! two authorizations for the same part are never identical.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use upload_gateway::models::upload::ChunkRecord;
use upload_gateway::store::{MultipartStore, StoreError, StoreResult};
use uuid::Uuid;

#[derive(Debug)]
struct PendingUpload {
    key: String,
    content_type: Option<String>,
    parts: BTreeMap<i32, (String, Vec<u8>)>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    uploads: HashMap<String, PendingUpload>,
    objects: HashMap<String, StoredObject>,
}

#[allow(dead_code)]
pub struct MemoryStore {
    bucket: String,
    state: Mutex<State>,
    offline: AtomicBool,
    complete_calls: AtomicUsize,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            state: Mutex::new(State::default()),
            offline: AtomicBool::new(false),
            complete_calls: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent call fail with a network fault.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// How many completion requests reached the store.
    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    /// Act as the client: PUT `data` to a presigned part URL.
    /// Returns the ETag the store assigned.
    pub fn upload_via_url(&self, url: &str, data: &[u8]) -> StoreResult<String> {
        let query = url
            .split_once('?')
            .map(|(_, q)| q)
            .ok_or_else(|| StoreError::Other(format!("not a presigned URL: {url}")))?;
        let param = |name: &str| {
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        };
        let upload_id =
            param("uploadId").ok_or_else(|| StoreError::Other("missing uploadId".into()))?;
        let part_number = param("partNumber")
            .and_then(|n| n.parse::<i32>().ok())
            .ok_or_else(|| StoreError::Other("missing partNumber".into()))?;

        let etag = format!("\"{:x}\"", md5::compute(data));
        let mut state = self.state.lock().unwrap();
        let upload = state
            .uploads
            .get_mut(&upload_id)
            .ok_or_else(|| StoreError::NotFound(format!("NoSuchUpload {upload_id}")))?;
        upload
            .parts
            .insert(part_number, (etag.clone(), data.to_vec()));
        Ok(etag)
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.state.lock().unwrap().objects.get(key).cloned()
    }

    pub fn pending_uploads(&self) -> usize {
        self.state.lock().unwrap().uploads.len()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::NetworkFault("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MultipartStore for MemoryStore {
    async fn create_multipart_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
    ) -> StoreResult<String> {
        self.check_online()?;
        let upload_id = Uuid::new_v4().simple().to_string();
        self.state.lock().unwrap().uploads.insert(
            upload_id.clone(),
            PendingUpload {
                key: key.to_string(),
                content_type: content_type.map(str::to_owned),
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> StoreResult<String> {
        self.check_online()?;
        Ok(format!(
            "memory://{}/{}?partNumber={}&uploadId={}&X-Amz-Expires={}&X-Amz-Signature={}",
            self.bucket,
            key,
            part_number,
            upload_id,
            expires_in.as_secs(),
            Uuid::new_v4().simple()
        ))
    }

    async fn list_parts(&self, key: &str, upload_id: &str) -> StoreResult<Vec<ChunkRecord>> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        let upload = state
            .uploads
            .get(upload_id)
            .filter(|u| u.key == key)
            .ok_or_else(|| StoreError::NotFound(format!("NoSuchUpload {upload_id}")))?;
        // Newest first, so callers cannot rely on the store's order.
        Ok(upload
            .parts
            .iter()
            .rev()
            .map(|(n, (etag, _))| ChunkRecord::new(*n, etag.clone()))
            .collect())
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[ChunkRecord],
    ) -> StoreResult<()> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;

        let mut state = self.state.lock().unwrap();
        let upload = state
            .uploads
            .get(upload_id)
            .filter(|u| u.key == key)
            .ok_or_else(|| StoreError::NotFound(format!("NoSuchUpload {upload_id}")))?;

        if parts.is_empty() || parts.len() != upload.parts.len() {
            return Err(StoreError::ManifestMismatch(format!(
                "manifest names {} parts, store has {}",
                parts.len(),
                upload.parts.len()
            )));
        }
        for (given, (number, (etag, _))) in parts.iter().zip(upload.parts.iter()) {
            if given.part_number != *number {
                return Err(StoreError::ManifestMismatch(format!(
                    "InvalidPartOrder: expected part {number}, got {}",
                    given.part_number
                )));
            }
            if given.etag != *etag {
                return Err(StoreError::ManifestMismatch(format!(
                    "InvalidPart: ETag mismatch for part {number}"
                )));
            }
        }

        let upload = state
            .uploads
            .remove(upload_id)
            .ok_or_else(|| StoreError::NotFound(format!("NoSuchUpload {upload_id}")))?;
        let data = upload
            .parts
            .into_values()
            .flat_map(|(_, bytes)| bytes)
            .collect();
        state.objects.insert(
            upload.key,
            StoredObject {
                content_type: upload.content_type,
                data,
            },
        );
        Ok(())
    }
}
