//! Scan event model and verification request/response shapes

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

use crate::services::features::ScanPoint;
use crate::services::rewards::Reward;
use super::{ProductSummary, ProvenanceEntry};

/// One verification attempt, recorded exactly once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Scan {
    pub id: Uuid,
    pub product_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub is_authentic: bool,
    pub scan_order: i32,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyScanRequest {
    pub product_id: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerificationStatus {
    Verified,
    Failed,
    NotFound,
}

#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub status: VerificationStatus,
    pub message: String,
    pub product: Option<ProductSummary>,
    pub provenance: Vec<ProvenanceEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<Reward>,
}

impl Scan {
    /// Most recent authentic scan for a product. This is the comparison
    /// baseline for feature derivation and the source of `scan_order`.
    pub async fn latest_authentic<'e, E: PgExecutor<'e>>(
        ex: E,
        product_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Scan>(
            r#"
            SELECT * FROM scans
            WHERE product_id = $1 AND is_authentic = true
            ORDER BY timestamp DESC
            LIMIT 1
            "#
        )
        .bind(product_id)
        .fetch_optional(ex)
        .await
    }

    pub async fn insert<'e, E: PgExecutor<'e>>(
        ex: E,
        product_id: Uuid,
        latitude: f64,
        longitude: f64,
        is_authentic: bool,
        scan_order: i32,
        user_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Scan>(
            r#"
            INSERT INTO scans (product_id, latitude, longitude, is_authentic, scan_order, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#
        )
        .bind(product_id)
        .bind(latitude)
        .bind(longitude)
        .bind(is_authentic)
        .bind(scan_order)
        .bind(user_id)
        .fetch_one(ex)
        .await
    }

    pub fn point(&self) -> ScanPoint {
        ScanPoint {
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp: self.timestamp,
        }
    }
}
