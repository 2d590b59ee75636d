//! 认证相关的 HTTP 处理器

use crate::{
    auth::{AuthContext, Role},
    error::AppError,
    handlers::ValidatedJson,
    middleware::AppState,
    models::{
        auth::{LoginRequest, LoginResponse},
        user::{RegisterRequest, RoleRegisterRequest},
    },
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 通用注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user
        })),
    ))
}

/// 通用登录，角色取自账户
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = state.auth_service.login(req).await?;
    Ok(Json(response))
}

/// 角色注册，角色由路由决定
pub async fn register_as(
    role: Role,
    state: Arc<AppState>,
    req: RoleRegisterRequest,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.register(req.with_role(role)).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("{} registered successfully", capitalize(role.as_str())),
            "user": user
        })),
    ))
}

/// 角色登录，账户角色不符时返回 403
pub async fn login_as(
    role: Role,
    state: Arc<AppState>,
    req: LoginRequest,
) -> Result<Json<LoginResponse>, AppError> {
    let response = state.auth_service.login_as(role, req).await?;
    Ok(Json(response))
}

/// 当前登录用户
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.current_user(auth_context.user_id).await?;
    Ok(Json(json!({ "user": user })))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
