//! Product handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::models::{CreateProduct, Product, ProductSummary, ProvenanceEntry};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateProduct>,
) -> AppResult<Json<Product>> {
    if req.sku.trim().is_empty() || req.name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "sku and name must not be empty".to_string(),
        ));
    }

    if Product::find_by_sku(&state.pool, &req.sku).await?.is_some() {
        return Err(AppError::AlreadyExists(format!(
            "Product '{}' already exists",
            req.sku
        )));
    }

    let product = Product::create(&state.pool, req).await?;
    tracing::info!("Product registered: {} ({})", product.sku, product.id);
    Ok(Json(product))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Product>>> {
    let products = Product::list(
        &state.pool,
        params.limit.unwrap_or(100),
        params.offset.unwrap_or(0),
    )
    .await?;
    Ok(Json(products))
}

pub async fn get(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<Json<ProductSummary>> {
    let product = Product::find_by_sku(&state.pool, &sku)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product '{}' not found", sku)))?;

    Ok(Json(product.summary(&state.pool).await?))
}

/// The product's full provenance journey, the "digital passport".
pub async fn journey(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<Json<Vec<ProvenanceEntry>>> {
    let product = Product::find_by_sku(&state.pool, &sku)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product '{}' not found", sku)))?;

    let journey = ProvenanceEntry::list_for_product(&state.pool, product.id).await?;
    Ok(Json(journey))
}
