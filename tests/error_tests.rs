//! 错误处理测试
//!
//! 状态码映射与统一错误信封

use axum::{http::StatusCode, response::IntoResponse};
use hospital_portal::{
    auth::Role,
    error::{AppError, ErrorResponse},
};
use http_body_util::BodyExt;

// ==================== 错误状态码测试 ====================

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Authentication.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        AppError::ForbiddenRole(Role::Receptionist).status_code(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        AppError::DuplicateEmail("a@x.com".to_string()).status_code(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        AppError::Validation("age: out of range".to_string()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::PayloadTooLarge("length limit exceeded".to_string()).status_code(),
        StatusCode::PAYLOAD_TOO_LARGE
    );
    assert_eq!(
        AppError::UnsupportedMediaType("missing content type".to_string()).status_code(),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );
    assert_eq!(
        AppError::Config("missing secret".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// ==================== 用户消息测试 ====================

#[test]
fn test_user_messages_hide_internals() {
    let config_error = AppError::Config("JWT secret is not configured".to_string());
    assert_eq!(config_error.user_message(), "Configuration error");
    assert!(config_error.details().is_empty());

    let hashing_error = AppError::Hashing("rng failure".to_string());
    assert_eq!(hashing_error.user_message(), "Failed to process credentials");

    let internal = AppError::Internal("task panicked".to_string());
    assert_eq!(internal.user_message(), "Internal server error");
    assert!(internal.details().is_empty());
}

#[test]
fn test_user_messages_for_client_errors() {
    assert_eq!(
        AppError::ForbiddenRole(Role::Doctor).user_message(),
        "Account is not registered as a doctor"
    );
    assert_eq!(AppError::not_found("Patient").user_message(), "Patient not found");
    assert_eq!(
        AppError::BadRequest("Name parameter is required".to_string()).user_message(),
        "Name parameter is required"
    );
}

// ==================== 响应信封测试 ====================

#[test]
fn test_error_response_serialization() {
    let error = AppError::validation("email: must be a valid email address");
    let json = serde_json::to_value(ErrorResponse::from(&error)).unwrap();

    assert_eq!(json["error"]["message"], "Invalid input");
    assert_eq!(json["error"]["details"], "email: must be a valid email address");
}

#[tokio::test]
async fn test_into_response_uses_envelope() {
    let response = AppError::DuplicateEmail("a@x.com".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["error"]["message"], "user with this email already exists");
    assert_eq!(json["error"]["details"], "a@x.com");
}

#[test]
fn test_from_validation_errors() {
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 3))]
        name: String,
    }

    let errors = Probe {
        name: "x".to_string(),
    }
    .validate()
    .unwrap_err();

    let error = AppError::from(errors);
    assert!(matches!(error, AppError::Validation(ref details) if details.contains("name")));
}
