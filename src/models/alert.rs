//! Alert model and alert construction rules

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use super::ProductSummary;

/// Speed above which an anomaly is attributed to impossible travel velocity
/// rather than a suspicious geographic jump.
const VELOCITY_THRESHOLD_KMH: f64 = 900.0;

/// Risk floor for anomalies that are not speed-driven.
const BASE_RISK_SCORE: i32 = 20;

pub const ALERT_STATUSES: &[&str] = &["new", "investigating", "resolved", "dismissed"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alert {
    pub id: Uuid,
    pub product_id: Uuid,
    pub scan_id: Uuid,
    pub alert_type: String,
    pub message: String,
    pub risk_score: i32,
    pub status: String,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAlertStatus {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AlertFilter {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Alert {
    /// Alert kind attribution from the implied travel speed.
    pub fn kind_for_speed(speed_kmh: f64) -> &'static str {
        if speed_kmh > VELOCITY_THRESHOLD_KMH {
            "Velocity"
        } else {
            "Geographic"
        }
    }

    /// Bounded 0-99 risk score. Speed-driven anomalies scale with how far
    /// past plausible travel they are; everything else gets the floor.
    pub fn risk_score_for_speed(speed_kmh: f64) -> i32 {
        if speed_kmh > 100.0 {
            ((speed_kmh / 1200.0 * 100.0).round() as i32).min(99)
        } else {
            BASE_RISK_SCORE
        }
    }

    pub async fn insert<'e, E: PgExecutor<'e>>(
        ex: E,
        product_id: Uuid,
        scan_id: Uuid,
        alert_type: &str,
        message: &str,
        risk_score: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Alert>(
            r#"
            INSERT INTO alerts (product_id, scan_id, alert_type, message, risk_score)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(product_id)
        .bind(scan_id)
        .bind(alert_type)
        .bind(message)
        .bind(risk_score)
        .fetch_one(ex)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Alert>("SELECT * FROM alerts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, filter: AlertFilter) -> Result<Vec<Self>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(50);
        let offset = filter.offset.unwrap_or(0);

        match filter.status {
            Some(status) => {
                sqlx::query_as::<_, Alert>(
                    r#"
                    SELECT * FROM alerts
                    WHERE status = $1
                    ORDER BY timestamp DESC
                    LIMIT $2 OFFSET $3
                    "#
                )
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Alert>(
                    "SELECT * FROM alerts ORDER BY timestamp DESC LIMIT $1 OFFSET $2"
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
            }
        }
    }

    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: &str,
        notes: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Alert>(
            r#"
            UPDATE alerts
            SET status = $2, notes = COALESCE($3, notes)
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(id)
        .bind(status)
        .bind(notes)
        .fetch_optional(pool)
        .await
    }

    /// Payload published to dashboard observers through the broadcast hub.
    pub fn broadcast_message(&self, product: &ProductSummary) -> serde_json::Value {
        serde_json::json!({
            "type": "new_alert",
            "payload": {
                "id": self.id,
                "timestamp": self.timestamp,
                "alert_type": self.alert_type,
                "message": self.message,
                "risk_score": self.risk_score,
                "status": self.status,
                "product": product,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_attribution() {
        assert_eq!(Alert::kind_for_speed(12000.0), "Velocity");
        assert_eq!(Alert::kind_for_speed(901.0), "Velocity");
        assert_eq!(Alert::kind_for_speed(900.0), "Geographic");
        assert_eq!(Alert::kind_for_speed(150.0), "Geographic");
        assert_eq!(Alert::kind_for_speed(0.0), "Geographic");
    }

    #[test]
    fn test_risk_score_scaling() {
        // Below the scaling cutoff the floor applies
        assert_eq!(Alert::risk_score_for_speed(0.0), 20);
        assert_eq!(Alert::risk_score_for_speed(100.0), 20);

        // min(99, round(speed / 1200 * 100))
        assert_eq!(Alert::risk_score_for_speed(600.0), 50);
        assert_eq!(Alert::risk_score_for_speed(1188.0), 99);
        assert_eq!(Alert::risk_score_for_speed(12000.0), 99);
    }

    #[test]
    fn test_risk_score_is_bounded() {
        for speed in [0.0, 101.0, 500.0, 1200.0, 100000.0] {
            let score = Alert::risk_score_for_speed(speed);
            assert!((0..=99).contains(&score), "score {} out of range", score);
        }
    }
}
