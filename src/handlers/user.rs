//! 账户管理的 HTTP 处理器（仅管理员）

use crate::{
    auth::AuthContext,
    error::AppError,
    handlers::{IdPath, ValidatedJson, ValidatedQuery},
    middleware::AppState,
    models::user::{CreateUserRequest, UserListQuery},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 列出用户
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<UserListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = query.resolve();
    let users = state.auth_service.list_users(limit, offset).await?;

    Ok(Json(json!({
        "count": users.len(),
        "users": users
    })))
}

/// 创建用户，可创建管理员
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.create_user(req).await?;

    tracing::info!(
        created_by = auth_context.user_id,
        user_id = user.id,
        role = %user.role,
        "Account created by admin"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": user
        })),
    ))
}

/// 获取用户详情
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.get_user(id).await?;
    Ok(Json(json!({ "user": user })))
}
