//! Product model
//!
//! Products carry both an internal UUID key (used for relations) and a
//! public-facing SKU string that scan requests refer to.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use super::Supplier;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Public shape of a product in API responses and alert broadcasts.
/// The internal UUID key stays server-side; `id` here is the SKU.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub supplier: Option<Supplier>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub supplier_id: Option<Uuid>,
}

impl Product {
    pub async fn create(pool: &PgPool, data: CreateProduct) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (sku, name, category, supplier_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#
        )
        .bind(&data.sku)
        .bind(&data.name)
        .bind(&data.category)
        .bind(data.supplier_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_sku(pool: &PgPool, sku: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = $1")
            .bind(sku)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products ORDER BY name LIMIT $1 OFFSET $2"
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Take a row-level lock on this product for the duration of the caller's
    /// transaction. Concurrent verifications of the same product serialize
    /// here, which keeps `scan_order` gapless and duplicate-free.
    pub async fn lock<'e, E: PgExecutor<'e>>(ex: E, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .execute(ex)
            .await?;
        Ok(())
    }

    /// Build the public summary, eagerly fetching the supplier relation.
    pub async fn summary(&self, pool: &PgPool) -> Result<ProductSummary, sqlx::Error> {
        let supplier = match self.supplier_id {
            Some(supplier_id) => Supplier::find_by_id(pool, supplier_id).await?,
            None => None,
        };

        Ok(ProductSummary {
            id: self.sku.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            supplier,
        })
    }
}
