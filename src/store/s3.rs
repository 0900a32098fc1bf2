//! S3-compatible store backed by the AWS SDK.
//!
//! Works against AWS S3, Cloudflare R2, MinIO and anything else that speaks
//! SigV4 multipart uploads. Client-side retries are disabled: a failed call is
//! reported once and the caller decides whether to try again.

use super::{MultipartStore, StoreError, StoreResult};
use crate::config::StoreConfig;
use crate::models::upload::ChunkRecord;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region, http::HttpResponse, retry::RetryConfig},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    presigning::PresigningConfig,
    types::{CompletedMultipartUpload, CompletedPart},
};
use aws_smithy_http_client::Builder as SmithyHttpClientBuilder;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Query parameter carrying a per-authorization nonce. It is added before
/// signing, so it is covered by the signature; stores ignore it otherwise.
const PRESIGN_NONCE_PARAM: &str = "x-upload-nonce";

/// Multipart store talking to a single bucket.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: Option<String>,
    endpoint: Option<String>,
    /// Environment variables that were absent when the store was built.
    /// Non-empty means every operation fails with `Misconfigured`.
    missing: Vec<&'static str>,
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("missing", &self.missing)
            .finish_non_exhaustive()
    }
}

impl S3Store {
    /// Build a client from whatever configuration is present.
    ///
    /// Never fails: incomplete configuration is remembered and reported on the
    /// first operation instead.
    pub fn new(cfg: &StoreConfig) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .retry_config(RetryConfig::disabled())
            .force_path_style(cfg.force_path_style);

        if let (Some(access_key), Some(secret_key)) = (&cfg.access_key, &cfg.secret_key) {
            builder = builder.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "upload-gateway-env",
            ));
        }

        let endpoint = cfg.endpoint.as_ref().map(|url| normalize_endpoint(url));
        if let Some(url) = &endpoint {
            builder = builder.endpoint_url(url);

            // Plain HTTP endpoints (local MinIO) skip TLS setup entirely.
            if url.to_ascii_lowercase().starts_with("http://") {
                builder = builder.http_client(SmithyHttpClientBuilder::new().build_http());
            }
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: cfg.bucket.clone(),
            endpoint,
            missing: cfg.missing(),
        }
    }

    /// The bucket name, or `Misconfigured` naming every absent variable.
    fn bucket(&self) -> StoreResult<&str> {
        if !self.missing.is_empty() {
            return Err(StoreError::Misconfigured(self.missing.join(", ")));
        }
        self.bucket
            .as_deref()
            .ok_or_else(|| StoreError::Misconfigured("R2_BUCKET".into()))
    }
}

/// Accept bare `host:port` endpoints by assuming plain HTTP.
fn normalize_endpoint(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", url.trim_end_matches('/'))
    }
}

/// Map an SDK failure onto the store error taxonomy.
fn map_sdk_error<E>(err: SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let detail = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            StoreError::NetworkFault(detail)
        }
        SdkError::ConstructionFailure(_) => StoreError::Other(detail),
        _ => {
            let status = err.raw_response().map(|resp| resp.status().as_u16());
            StoreError::classify(err.code(), status, detail)
        }
    }
}

#[async_trait]
impl MultipartStore for S3Store {
    fn readiness(&self) -> Result<(), String> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(format!("missing {}", self.missing.join(", ")))
        }
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn create_multipart_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
    ) -> StoreResult<String> {
        let bucket = self.bucket()?;
        let output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_owned))
            .send()
            .await
            .map_err(map_sdk_error)?;

        output
            .upload_id()
            .map(str::to_owned)
            .ok_or_else(|| StoreError::Other("store did not return an upload id".into()))
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> StoreResult<String> {
        let bucket = self.bucket()?;
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|err| StoreError::Other(format!("invalid presign expiry: {err}")))?;

        // SigV4 timestamps have one-second resolution; the nonce keeps two
        // authorizations for the same part distinct within that second.
        let nonce = Uuid::new_v4().simple().to_string();
        let request = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .customize()
            .mutate_request(move |req| {
                let separator = if req.uri().contains('?') { '&' } else { '?' };
                let uri = format!("{}{}{}={}", req.uri(), separator, PRESIGN_NONCE_PARAM, nonce);
                if let Err(err) = req.set_uri(uri) {
                    warn!(error = %err, "could not attach presign nonce");
                }
            })
            .presigned(presigning)
            .await
            .map_err(map_sdk_error)?;

        Ok(request.uri().to_string())
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn list_parts(&self, key: &str, upload_id: &str) -> StoreResult<Vec<ChunkRecord>> {
        let bucket = self.bucket()?;
        let mut parts = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_parts()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .set_part_number_marker(marker.clone())
                .send()
                .await
                .map_err(map_sdk_error)?;

            for part in output.parts() {
                match (part.part_number(), part.e_tag()) {
                    (Some(number), Some(etag)) => parts.push(ChunkRecord::new(number, etag)),
                    _ => warn!(?part, "store listed a part without number or ETag, skipping"),
                }
            }

            // A partial listing would tell the client the wrong parts are
            // missing, so an inconsistent page fails the whole call.
            let next = match (output.is_truncated(), output.next_part_number_marker()) {
                (Some(true), Some(next)) => next.to_string(),
                (Some(true), None) => {
                    return Err(StoreError::Other(
                        "part listing truncated without a next marker".into(),
                    ));
                }
                _ => break,
            };
            if marker.as_deref() == Some(next.as_str()) {
                return Err(StoreError::Other(format!(
                    "part listing marker did not advance past {next}"
                )));
            }
            debug!(marker = %next, fetched = parts.len(), "fetching next page of parts");
            marker = Some(next);
        }

        Ok(parts)
    }

    #[instrument(skip(self, parts), fields(backend = "s3", parts = parts.len()))]
    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[ChunkRecord],
    ) -> StoreResult<()> {
        let bucket = self.bucket()?;
        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(
                parts
                    .iter()
                    .map(|p| {
                        CompletedPart::builder()
                            .part_number(p.part_number)
                            .e_tag(&p.etag)
                            .build()
                    })
                    .collect(),
            ))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(())
    }
}
