//! Provenance entries - the product's "digital passport"

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProvenanceEntry {
    pub status: String,
    pub location: String,
    pub handler: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProvenanceEntry {
    /// Full journey for a product, oldest step first.
    pub async fn list_for_product(
        pool: &PgPool,
        product_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProvenanceEntry>(
            r#"
            SELECT status, location, handler, timestamp
            FROM provenance_entries
            WHERE product_id = $1
            ORDER BY timestamp ASC
            "#
        )
        .bind(product_id)
        .fetch_all(pool)
        .await
    }
}
