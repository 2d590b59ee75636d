//! JWT 认证中间件与角色校验中间件

use crate::{
    auth::{jwt::TokenService, Role},
    error::AppError,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::sync::Arc;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::MissingToken)
}

/// 请求认证网关：校验 Bearer 令牌并注入 AuthContext
#[derive(Clone)]
pub struct RequestGate {
    tokens: Arc<TokenService>,
}

impl RequestGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// 根据请求头得到认证上下文
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AppError> {
        let token = extract_token(headers).inspect_err(|_| {
            tracing::warn!("Missing or invalid Authorization header");
        })?;

        let claims = self.tokens.validate(token, Utc::now()).inspect_err(|e| {
            tracing::warn!(error = %e, "Invalid token");
        })?;

        Ok(AuthContext {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        })
    }

    pub async fn handle(&self, mut req: Request, next: Next) -> Result<Response, AppError> {
        let auth_context = self.authenticate(req.headers())?;

        tracing::debug!(
            user_id = auth_context.user_id,
            role = %auth_context.role,
            "Request authenticated"
        );

        // 附加到请求扩展
        req.extensions_mut().insert(auth_context);

        Ok(next.run(req).await)
    }
}

/// 角色网关：路由级别的角色白名单
#[derive(Clone)]
pub struct RoleGate {
    allowed: Arc<[Role]>,
}

impl RoleGate {
    pub fn new(allowed: &[Role]) -> Self {
        Self {
            allowed: Arc::from(allowed),
        }
    }

    /// 检查认证上下文中的角色是否在白名单中
    pub fn check(&self, auth_context: Option<&AuthContext>) -> Result<(), AppError> {
        // 没有上下文说明路由缺少 RequestGate
        let auth_context = auth_context.ok_or_else(|| {
            tracing::error!("Role gate reached without an authenticated context");
            AppError::Unauthorized
        })?;

        if self.allowed.contains(&auth_context.role) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = auth_context.user_id,
                role = %auth_context.role,
                allowed = ?self.allowed,
                "Role not permitted for route"
            );
            Err(AppError::Forbidden)
        }
    }

    pub async fn handle(&self, req: Request, next: Next) -> Result<Response, AppError> {
        self.check(req.extensions().get::<AuthContext>())?;
        Ok(next.run(req).await)
    }
}

/// JWT 认证中间件 - 必须认证
pub async fn request_gate(
    State(gate): State<RequestGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate.handle(req, next).await
}

/// 角色校验中间件，必须位于 request_gate 之后
pub async fn role_gate(
    State(gate): State<RoleGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate.handle(req, next).await
}
