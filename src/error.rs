//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::Role;

/// 登录失败时的统一提示，不区分邮箱不存在与密码错误
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid email or password";

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Authentication failed")]
    Authentication,

    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Account role does not match {0} endpoint")]
    ForbiddenRole(Role),

    #[error("Duplicate email: {0}")]
    DuplicateEmail(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authentication
            | AppError::MissingToken
            | AppError::InvalidToken(_)
            | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::ForbiddenRole(_) => StatusCode::FORBIDDEN,
            AppError::DuplicateEmail(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Database(_)
            | AppError::Config(_)
            | AppError::Hashing(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Authentication => INVALID_CREDENTIALS_MESSAGE.to_string(),
            AppError::MissingToken => "Authorization header is required".to_string(),
            AppError::InvalidToken(_) => "Invalid or expired token".to_string(),
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::Forbidden => "Access denied".to_string(),
            AppError::ForbiddenRole(role) => format!("Account is not registered as a {}", role),
            AppError::DuplicateEmail(_) => "user with this email already exists".to_string(),
            AppError::NotFound(resource) => format!("{} not found", resource),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Validation(_) => "Invalid input".to_string(),
            AppError::PayloadTooLarge(_) => "Request body too large".to_string(),
            AppError::UnsupportedMediaType(_) => {
                "Expected request with `Content-Type: application/json`".to_string()
            }
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Hashing(_) => "Failed to process credentials".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// 可以安全返回给调用方的补充信息
    pub fn details(&self) -> String {
        match self {
            AppError::Validation(details)
            | AppError::PayloadTooLarge(details)
            | AppError::UnsupportedMediaType(details) => details.clone(),
            AppError::DuplicateEmail(email) => email.clone(),
            _ => String::new(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    // 便捷方法
    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(resource.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        AppError::Validation(msg.to_string())
    }
}

/// 错误响应 DTO
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub details: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        ErrorResponse {
            error: ErrorDetail {
                message: err.user_message(),
                details: err.details(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = ErrorResponse::from(&self);

        // 记录错误日志：5xx 为 error，其余为 warn
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Application error");
        } else {
            tracing::warn!(code = self.code(), error = %self, "Request rejected");
        }

        (status, Json(error_response)).into_response()
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

/// 从 validator::ValidationErrors 转换
impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}
