//! Vision identifier gateway
//!
//! The image-to-product-identifier model runs in a separate service; this
//! gateway consumes it as an opaque `identify(image) -> {product_id?,
//! confidence}` call.

use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct IdentifyResult {
    pub product_id: Option<String>,
    pub confidence: f32,
}

#[derive(Clone)]
pub struct VisionGateway {
    client: reqwest::Client,
    base_url: String,
}

impl VisionGateway {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Submit an image for identification.
    pub async fn identify(&self, image: Vec<u8>, content_type: &str) -> AppResult<IdentifyResult> {
        let part = reqwest::multipart::Part::bytes(image)
            .file_name("scan")
            .mime_str(content_type)
            .map_err(|e| AppError::ValidationError(format!("invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/identify", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("vision service: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "vision service returned {}",
                response.status()
            )));
        }

        let result = response
            .json::<IdentifyResult>()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("vision service: {}", e)))?;

        tracing::debug!(
            "Vision identification: {:?} (confidence {:.2})",
            result.product_id,
            result.confidence
        );

        Ok(result)
    }
}
