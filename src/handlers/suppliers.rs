//! Supplier handlers

use axum::{extract::State, Json};

use crate::models::{CreateSupplier, Supplier};
use crate::{AppError, AppResult, AppState};

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateSupplier>,
) -> AppResult<Json<Supplier>> {
    if req.name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "supplier name must not be empty".to_string(),
        ));
    }

    let supplier = Supplier::create(&state.pool, req).await?;
    Ok(Json(supplier))
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Supplier>>> {
    let suppliers = Supplier::list(&state.pool).await?;
    Ok(Json(suppliers))
}
