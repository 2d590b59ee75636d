//! 健康检查处理器
//! 提供 /health、/ready 和欢迎页端点

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::{db, middleware::AppState};

/// 应用启动时刻，首次访问时初始化
static APP_START: Lazy<Instant> = Lazy::new(Instant::now);

/// 记录启动时刻（main 中尽早调用）
pub fn set_start_time() {
    Lazy::force(&APP_START);
}

/// 应用运行时间（秒）
pub fn get_uptime() -> u64 {
    APP_START.elapsed().as_secs()
}

/// 存活探针响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// 就绪探针响应
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<HealthCheck>,
}

/// 健康检查项
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 存活探针，不检查依赖
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: get_uptime(),
    })
}

/// 就绪探针；未配置数据库（内存存储）时跳过数据库检查
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut checks = Vec::new();

    if let Some(pool) = &state.db {
        let status = db::health_check(pool).await;
        checks.push(HealthCheck {
            name: "database".to_string(),
            status: status.label().to_string(),
            message: status.message(),
        });
        db::record_pool_metrics(pool);
    }

    let ready = checks.iter().all(|c| c.status == "healthy");
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(ReadinessResponse { ready, checks }))
}

/// 欢迎页，列出可用端点
pub async fn welcome() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to Hospital Portal API",
        "version": env!("CARGO_PKG_VERSION"),
        "ui": ["/admin - Admin dashboard"],
        "endpoints": {
            "general": [
                "POST /api/login - General user login",
                "POST /api/register - General user registration",
                "GET /health - Liveness probe",
                "GET /ready - Readiness probe"
            ],
            "doctor": [
                "POST /api/auth/doctor/login - Doctor login",
                "POST /api/auth/doctor/register - Doctor registration"
            ],
            "receptionist": [
                "POST /api/auth/receptionist/login - Receptionist login",
                "POST /api/auth/receptionist/register - Receptionist registration"
            ],
            "patient": [
                "POST /api/auth/patient/login - Patient login",
                "POST /api/auth/patient/register - Patient registration"
            ],
            "protected": [
                "GET /api/v1/auth/me - Current account",
                "/api/v1/patients - Patient management (requires authentication)",
                "/api/v1/users - Account management (admin only)"
            ]
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_reports_version() {
        set_start_time();
        let Json(body) = health_check().await;

        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
