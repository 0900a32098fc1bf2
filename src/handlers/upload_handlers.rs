//! HTTP handlers for the multipart session protocol.
//! Each handler unpacks JSON, delegates to `UploadService` and shapes the
//! response; no handler touches the store directly.

use crate::{
    errors::AppError,
    models::api::{
        CompleteUploadReq, CompleteUploadResp, InitiateUploadReq, InitiateUploadResp,
        ListPartsReq, ListPartsResp, PartUrlReq, PartUrlResp,
    },
    services::upload_service::UploadService,
};
use axum::{Json, extract::State, extract::rejection::JsonRejection};

/// `POST /initiate-upload`: open a multipart session.
pub async fn initiate_upload(
    State(service): State<UploadService>,
    payload: Result<Json<InitiateUploadReq>, JsonRejection>,
) -> Result<Json<InitiateUploadResp>, AppError> {
    let Json(req) = payload?;
    let session = service
        .initiate_upload(&req.filename, req.content_type.as_deref())
        .await?;

    Ok(Json(InitiateUploadResp {
        upload_id: session.upload_id,
        key: session.key.into_string(),
    }))
}

/// `POST /get-part-url`: presigned URL for one part.
pub async fn get_part_url(
    State(service): State<UploadService>,
    payload: Result<Json<PartUrlReq>, JsonRejection>,
) -> Result<Json<PartUrlResp>, AppError> {
    let Json(req) = payload?;
    let url = service
        .authorize_part(&req.upload_id, &req.key, req.part_number)
        .await?;
    Ok(Json(PartUrlResp { url }))
}

/// `POST /list-uploaded-parts`: what the store already has, for resuming.
pub async fn list_uploaded_parts(
    State(service): State<UploadService>,
    payload: Result<Json<ListPartsReq>, JsonRejection>,
) -> Result<Json<ListPartsResp>, AppError> {
    let Json(req) = payload?;
    let uploaded_parts = service.list_uploaded_parts(&req.upload_id, &req.key).await?;
    Ok(Json(ListPartsResp { uploaded_parts }))
}

/// `POST /complete-upload`: assemble the object from the client's manifest.
pub async fn complete_upload(
    State(service): State<UploadService>,
    payload: Result<Json<CompleteUploadReq>, JsonRejection>,
) -> Result<Json<CompleteUploadResp>, AppError> {
    let Json(req) = payload?;
    service
        .complete_upload(&req.upload_id, &req.key, &req.parts)
        .await?;
    Ok(Json(CompleteUploadResp { success: true }))
}
