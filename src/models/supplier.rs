//! Supplier model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub risk_score: f32,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupplier {
    pub name: String,
    pub location: Option<String>,
}

impl Supplier {
    pub async fn create(pool: &PgPool, data: CreateSupplier) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, location)
            VALUES ($1, $2)
            RETURNING id, name, location, risk_score
            "#
        )
        .bind(&data.name)
        .bind(&data.location)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Supplier>(
            "SELECT id, name, location, risk_score FROM suppliers WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Supplier>(
            "SELECT id, name, location, risk_score FROM suppliers ORDER BY name"
        )
        .fetch_all(pool)
        .await
    }
}
