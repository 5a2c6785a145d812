//! User model - scanning customers with points and earned badges

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub customer_code: String,
    pub role: String,
    pub points: i32,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub customer_code: String,
}

/// Immutable audit row; one per rewarded scan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PointTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub scan_id: Uuid,
    pub points_awarded: i32,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct EarnedBadge {
    pub name: String,
    pub description: String,
    pub icon_url: Option<String>,
    pub awarded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub customer_code: String,
    pub points: i32,
    pub badges: Vec<EarnedBadge>,
}

impl User {
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (customer_code)
            VALUES ($1)
            RETURNING *
            "#
        )
        .bind(&data.customer_code)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_customer_code(
        pool: &PgPool,
        customer_code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE customer_code = $1")
            .bind(customer_code)
            .fetch_optional(pool)
            .await
    }

    /// Increment the cached points total, returning the new value.
    pub async fn add_points<'e, E: PgExecutor<'e>>(
        ex: E,
        user_id: Uuid,
        amount: i32,
    ) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            "UPDATE users SET points = points + $2 WHERE id = $1 RETURNING points"
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(ex)
        .await?;

        Ok(row.0)
    }

    /// Number of rewarded scans, taken from the audit trail.
    pub async fn rewarded_scan_count<'e, E: PgExecutor<'e>>(
        ex: E,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM point_transactions WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_one(ex)
        .await?;

        Ok(row.0)
    }

    pub async fn earned_badges(pool: &PgPool, user_id: Uuid) -> Result<Vec<EarnedBadge>, sqlx::Error> {
        sqlx::query_as::<_, EarnedBadge>(
            r#"
            SELECT b.name, b.description, b.icon_url, ub.awarded_at
            FROM user_badges ub
            JOIN badges b ON b.id = ub.badge_id
            WHERE ub.user_id = $1
            ORDER BY ub.awarded_at
            "#
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

impl PointTransaction {
    pub async fn insert<'e, E: PgExecutor<'e>>(
        ex: E,
        user_id: Uuid,
        scan_id: Uuid,
        points_awarded: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PointTransaction>(
            r#"
            INSERT INTO point_transactions (user_id, scan_id, points_awarded)
            VALUES ($1, $2, $3)
            RETURNING *
            "#
        )
        .bind(user_id)
        .bind(scan_id)
        .bind(points_awarded)
        .fetch_one(ex)
        .await
    }
}
