//! Scan verification coordinator
//!
//! Orchestrates one verification request end to end: product lookup,
//! feature derivation, classification, transactional persistence, reward
//! granting, and post-commit alert fan-out.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::hub::Hub;
use crate::models::{
    Alert, Product, ProvenanceEntry, Scan, User, VerificationResponse, VerificationStatus,
    VerifyScanRequest,
};
use crate::services::classifier::{AnomalyClassifier, Classification, ClassifierError};
use crate::services::features::{self, ScanPoint};
use crate::services::rewards;

#[derive(Clone)]
pub struct ScanProcessor {
    pool: PgPool,
    classifier: Arc<dyn AnomalyClassifier>,
    hub: Arc<Hub>,
}

impl ScanProcessor {
    pub fn new(pool: PgPool, classifier: Arc<dyn AnomalyClassifier>, hub: Arc<Hub>) -> Self {
        Self {
            pool,
            classifier,
            hub,
        }
    }

    /// Process one verification request.
    ///
    /// The scan insert, the alert (when anomalous), and the reward (when
    /// authentic with a known user) share a single transaction. The alert
    /// broadcast happens only after commit and its failure never unwinds
    /// the persisted records.
    pub async fn process(&self, request: &VerifyScanRequest) -> AppResult<VerificationResponse> {
        let Some(product) = Product::find_by_sku(&self.pool, &request.product_id).await? else {
            tracing::warn!(
                "Scan attempt for non-existent product ID: {}",
                request.product_id
            );
            return Ok(VerificationResponse {
                status: VerificationStatus::NotFound,
                message: "Product ID not found.".to_string(),
                product: None,
                provenance: vec![],
                reward: None,
            });
        };

        let user = match &request.user_id {
            Some(customer_code) => {
                let user = User::find_by_customer_code(&self.pool, customer_code).await?;
                if user.is_none() {
                    tracing::warn!(
                        "Scan references unknown user ID: {}; reward skipped",
                        customer_code
                    );
                }
                user
            }
            None => None,
        };

        // Product rows are immutable here, so the summary can be assembled
        // outside the transaction.
        let product_summary = product.summary(&self.pool).await?;

        let mut tx = self.pool.begin().await?;

        // Serialize concurrent verifications of the same product so the
        // previous-scan read and the scan_order assignment cannot race.
        Product::lock(&mut *tx, product.id).await?;

        let previous = Scan::latest_authentic(&mut *tx, product.id).await?;
        let current = ScanPoint {
            latitude: request.latitude,
            longitude: request.longitude,
            timestamp: Utc::now(),
        };
        let feature_vector =
            features::compute(&current, previous.as_ref().map(|s| s.point()).as_ref());

        let is_anomaly = resolve_verdict(self.classifier.classify(&feature_vector));
        let scan_order = next_scan_order(previous.as_ref().map(|s| s.scan_order));

        let scan = Scan::insert(
            &mut *tx,
            product.id,
            request.latitude,
            request.longitude,
            !is_anomaly,
            scan_order,
            user.as_ref().map(|u| u.id),
        )
        .await?;

        if is_anomaly {
            let alert_type = Alert::kind_for_speed(feature_vector.speed_kmh);
            let risk_score = Alert::risk_score_for_speed(feature_vector.speed_kmh);
            let message = format!("{} anomaly detected for {}.", alert_type, product.name);

            let alert = Alert::insert(
                &mut *tx,
                product.id,
                scan.id,
                alert_type,
                &message,
                risk_score,
            )
            .await?;

            tx.commit().await?;
            tracing::info!(
                "Anomaly detected for product {}: alert {} ({}, risk {})",
                product.sku,
                alert.id,
                alert_type,
                risk_score
            );

            // Best-effort fan-out; the alert is already durable.
            self.hub.publish(&alert.broadcast_message(&product_summary));

            Ok(VerificationResponse {
                status: VerificationStatus::Failed,
                message,
                product: Some(product_summary),
                provenance: vec![],
                reward: None,
            })
        } else {
            let reward = match &user {
                Some(user) => Some(rewards::grant(&mut tx, user, scan.id).await?),
                None => None,
            };

            tx.commit().await?;
            tracing::info!(
                "Legitimate scan processed for product {} (order {})",
                product.sku,
                scan_order
            );

            let provenance = ProvenanceEntry::list_for_product(&self.pool, product.id).await?;

            Ok(VerificationResponse {
                status: VerificationStatus::Verified,
                message: "Product authenticity confirmed.".to_string(),
                product: Some(product_summary),
                provenance,
                reward,
            })
        }
    }

    /// Verify a product the vision collaborator identified from an image.
    ///
    /// Image scans carry no device location, so no movement features are
    /// derived and nothing is classified or persisted: the outcome is
    /// identification-based, with the product's journey attached.
    pub async fn process_identified(
        &self,
        product_id: &str,
        confidence: f32,
    ) -> AppResult<VerificationResponse> {
        let Some(product) = Product::find_by_sku(&self.pool, product_id).await? else {
            tracing::warn!(
                "Image scan identified product ID not in the catalog: {}",
                product_id
            );
            return Ok(identified_response(None, product_id, confidence));
        };

        let summary = product.summary(&self.pool).await?;
        let provenance = ProvenanceEntry::list_for_product(&self.pool, product.id).await?;

        tracing::info!(
            "Image verification for product {} (confidence {:.2})",
            product.sku,
            confidence
        );
        Ok(identified_response(
            Some((summary, provenance)),
            product_id,
            confidence,
        ))
    }
}

/// The per-product scan counter: one past the previous authentic scan's
/// order, or 1 for a product that has never been scanned authentically.
fn next_scan_order(previous_order: Option<i32>) -> i32 {
    previous_order.map(|order| order + 1).unwrap_or(1)
}

/// Outcome of an identification-based (image) verification.
fn identified_response(
    resolved: Option<(crate::models::ProductSummary, Vec<ProvenanceEntry>)>,
    product_id: &str,
    confidence: f32,
) -> VerificationResponse {
    match resolved {
        Some((product, provenance)) => VerificationResponse {
            status: VerificationStatus::Verified,
            message: format!(
                "Product verified via image recognition with {:.2} confidence.",
                confidence
            ),
            product: Some(product),
            provenance,
            reward: None,
        },
        None => VerificationResponse {
            status: VerificationStatus::NotFound,
            message: format!(
                "Product '{}' identified, but not found in the catalog.",
                product_id
            ),
            product: None,
            provenance: vec![],
            reward: None,
        },
    }
}

/// Fail-safe-closed: a classifier failure flags the scan rather than
/// letting it pass. A false alert is recoverable; a missed counterfeit
/// is not.
fn resolve_verdict(result: Result<Classification, ClassifierError>) -> bool {
    match result {
        Ok(classification) => classification.is_anomaly,
        Err(e) => {
            tracing::error!("Classifier unavailable, treating scan as anomalous: {}", e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductSummary;
    use crate::services::classifier::ThresholdModel;
    use chrono::Duration;

    #[test]
    fn test_classifier_verdict_passes_through() {
        assert!(resolve_verdict(Ok(Classification { is_anomaly: true })));
        assert!(!resolve_verdict(Ok(Classification { is_anomaly: false })));
    }

    #[test]
    fn test_classifier_failure_flags_the_scan() {
        let err = ClassifierError::Scoring("model went away".to_string());
        assert!(resolve_verdict(Err(err)));
    }

    #[test]
    fn test_scan_order_assignment() {
        assert_eq!(next_scan_order(None), 1);
        assert_eq!(next_scan_order(Some(1)), 2);
        assert_eq!(next_scan_order(Some(41)), 42);
    }

    fn summary(sku: &str) -> ProductSummary {
        ProductSummary {
            id: sku.to_string(),
            name: "Test Product".to_string(),
            category: None,
            supplier: None,
        }
    }

    #[test]
    fn test_identified_product_verifies_without_movement_check() {
        // An image scan of a product last seen far away must not be
        // flagged: no coordinates means no movement classification at all.
        let response = identified_response(Some((summary("SKU-9"), vec![])), "SKU-9", 0.93);

        assert_eq!(response.status, VerificationStatus::Verified);
        assert!(response.message.contains("0.93"));
        assert!(response.product.is_some());
        assert!(response.reward.is_none());
    }

    #[test]
    fn test_identified_unknown_product_is_not_found() {
        let response = identified_response(None, "SKU-MISSING", 0.51);

        assert_eq!(response.status, VerificationStatus::NotFound);
        assert!(response.message.contains("SKU-MISSING"));
        assert!(response.product.is_none());
        assert!(response.provenance.is_empty());
    }

    #[test]
    fn test_first_then_distant_scan_decision_chain() {
        // First scan of a fresh product at (10,10): baseline features,
        // authentic, order 1. Five minutes later at (10,40): an enormous
        // implied speed, a Velocity alert at the risk ceiling, order 2.
        let model = ThresholdModel {
            max_speed_kmh: 900.0,
            max_jump_km: 500.0,
            suspicious_window_seconds: 3600.0,
        };
        let now = Utc::now();

        let first_point = ScanPoint {
            latitude: 10.0,
            longitude: 10.0,
            timestamp: now,
        };
        let first = features::compute(&first_point, None);
        assert_eq!(first.speed_kmh, 0.0);
        assert!(!resolve_verdict(model.classify(&first)));
        assert_eq!(next_scan_order(None), 1);

        let second_point = ScanPoint {
            latitude: 10.0,
            longitude: 40.0,
            timestamp: now + Duration::minutes(5),
        };
        let second = features::compute(&second_point, Some(&first_point));
        assert!(second.speed_kmh > 900.0, "speed was {}", second.speed_kmh);
        assert!(resolve_verdict(model.classify(&second)));
        assert_eq!(Alert::kind_for_speed(second.speed_kmh), "Velocity");
        assert_eq!(Alert::risk_score_for_speed(second.speed_kmh), 99);
        assert_eq!(next_scan_order(Some(1)), 2);
    }
}
