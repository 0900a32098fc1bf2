//! Defines routes for the multipart upload protocol.
//!
//! ## Structure
//! - **Upload session endpoints** (JSON bodies, all `POST`)
//!   - `/initiate-upload`     open a session
//!   - `/get-part-url`        presigned URL for one part
//!   - `/list-uploaded-parts` committed parts, for resuming
//!   - `/complete-upload`     assemble the object
//!
//! - **Health checks**
//!   - `GET /healthz`, `GET /readyz`
//!
//! Anything else falls through to the static directory when one is configured.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::{complete_upload, get_part_url, initiate_upload, list_uploaded_parts},
    },
    services::upload_service::UploadService,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Build the router for the upload protocol and health checks.
///
/// The router carries shared state (`UploadService`) to all handlers.
pub fn routes() -> Router<UploadService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // upload session protocol
        .route("/initiate-upload", post(initiate_upload))
        .route("/get-part-url", post(get_part_url))
        .route("/list-uploaded-parts", post(list_uploaded_parts))
        .route("/complete-upload", post(complete_upload))
}

/// The complete application: routes, state, optional static files, CORS and
/// request tracing.
///
/// CORS is permissive because browsers upload from pages that may live on a
/// different origin; the API carries no credentials of its own.
pub fn app(service: UploadService, static_dir: Option<&Path>) -> Router {
    let mut router = routes().with_state(service);
    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }
    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
