//! Badge catalog and the user/badge join

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon_url: Option<String>,
}

impl Badge {
    pub async fn find_by_name<'e, E: PgExecutor<'e>>(
        ex: E,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Badge>("SELECT * FROM badges WHERE name = $1")
            .bind(name)
            .fetch_optional(ex)
            .await
    }
}

pub struct UserBadge;

impl UserBadge {
    /// Create the join row. Callers pre-check held badges; this does not
    /// rely on the uniqueness constraint for idempotence.
    pub async fn award<'e, E: PgExecutor<'e>>(
        ex: E,
        user_id: Uuid,
        badge_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO user_badges (user_id, badge_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(badge_id)
            .execute(ex)
            .await?;
        Ok(())
    }

    /// Names of badges the user already holds, for the eligibility pre-check.
    pub async fn held_names<'e, E: PgExecutor<'e>>(
        ex: E,
        user_id: Uuid,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT b.name
            FROM user_badges ub
            JOIN badges b ON b.id = ub.badge_id
            WHERE ub.user_id = $1
            "#
        )
        .bind(user_id)
        .fetch_all(ex)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
