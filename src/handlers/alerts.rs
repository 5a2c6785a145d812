//! Alert handlers (dashboard investigation workflow)

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::models::{Alert, AlertFilter, UpdateAlertStatus, ALERT_STATUSES};
use crate::{AppError, AppResult, AppState};

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> AppResult<Json<Vec<Alert>>> {
    let alerts = Alert::list(&state.pool, filter).await?;
    Ok(Json(alerts))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Alert>> {
    let alert = Alert::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Alert not found".to_string()))?;

    Ok(Json(alert))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAlertStatus>,
) -> AppResult<Json<Alert>> {
    if !ALERT_STATUSES.contains(&req.status.as_str()) {
        return Err(AppError::ValidationError(format!(
            "invalid alert status '{}'",
            req.status
        )));
    }

    let alert = Alert::update_status(&state.pool, id, &req.status, req.notes.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound("Alert not found".to_string()))?;

    Ok(Json(alert))
}
