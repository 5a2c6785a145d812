//! Scan verification handlers
//!
//! Thin wrappers: all business logic lives in the ScanProcessor service.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::models::{VerificationResponse, VerificationStatus, VerifyScanRequest};
use crate::{AppError, AppResult, AppState};

/// Primary endpoint for NFC/QR scans.
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyScanRequest>,
) -> AppResult<Response> {
    request.validate()?;

    let response = state.processor.process(&request).await?;
    Ok(respond(response))
}

/// Verify a product from an uploaded image. The vision collaborator
/// identifies the product; the coordinator then answers from the catalog
/// and journey alone, since an image carries no device location.
pub async fn verify_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::ValidationError(format!("failed to read upload: {}", e)))?;
            image = Some((bytes.to_vec(), content_type));
            break;
        }
    }

    let Some((bytes, content_type)) = image else {
        return Err(AppError::ValidationError(
            "missing 'file' upload field".to_string(),
        ));
    };
    if !content_type.starts_with("image/") {
        return Err(AppError::ValidationError(
            "invalid file type, expected an image".to_string(),
        ));
    }

    let identified = state.vision.identify(bytes, &content_type).await?;

    let Some(product_id) = identified.product_id else {
        return Ok(respond(VerificationResponse {
            status: VerificationStatus::Failed,
            message: format!(
                "Could not identify a valid product from the image. (Confidence: {:.2})",
                identified.confidence
            ),
            product: None,
            provenance: vec![],
            reward: None,
        }));
    };

    // Image scans carry no device location, so they take the
    // identification-based path: no movement classification, nothing
    // persisted.
    let response = state
        .processor
        .process_identified(&product_id, identified.confidence)
        .await?;
    Ok(respond(response))
}

/// An anomalous scan is a successful API call carrying a Failed status;
/// only an unknown product maps to a 404.
fn respond(response: VerificationResponse) -> Response {
    let status = match response.status {
        VerificationStatus::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };
    (status, Json(response)).into_response()
}
