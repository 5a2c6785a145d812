//! User handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::models::{CreateUser, User, UserProfile};
use crate::{AppError, AppResult, AppState};

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateUser>,
) -> AppResult<Json<User>> {
    if req.customer_code.trim().is_empty() {
        return Err(AppError::ValidationError(
            "customer_code must not be empty".to_string(),
        ));
    }

    if User::find_by_customer_code(&state.pool, &req.customer_code)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists(format!(
            "User '{}' already exists",
            req.customer_code
        )));
    }

    let user = User::create(&state.pool, req).await?;
    Ok(Json(user))
}

/// Points total plus earned badges.
pub async fn profile(
    State(state): State<AppState>,
    Path(customer_code): Path<String>,
) -> AppResult<Json<UserProfile>> {
    let user = User::find_by_customer_code(&state.pool, &customer_code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", customer_code)))?;

    let badges = User::earned_badges(&state.pool, user.id).await?;

    Ok(Json(UserProfile {
        customer_code: user.customer_code,
        points: user.points,
        badges,
    }))
}
