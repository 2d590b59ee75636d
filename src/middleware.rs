//! HTTP 中间件与应用状态
//! 请求追踪（trace_id / request_id、日志、指标）

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    auth::{PasswordHasher, TokenService},
    config::AppConfig,
    error::AppError,
    repository::{PatientStore, UserStore},
    services::{AuthService, PatientService},
};

/// 应用状态
///
/// 所有字段只读，克隆只复制 Arc 指针
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// 使用内存存储时为 None
    pub db: Option<sqlx::PgPool>,
    pub token_service: Arc<TokenService>,
    pub auth_service: Arc<AuthService>,
    pub patient_service: Arc<PatientService>,
}

impl AppState {
    /// 组装服务；令牌服务与密码哈希参数由配置显式构造
    pub fn new(
        config: AppConfig,
        db: Option<sqlx::PgPool>,
        users: Arc<dyn UserStore>,
        patients: Arc<dyn PatientStore>,
    ) -> Result<Self, AppError> {
        let token_service = Arc::new(TokenService::from_config(&config.security)?);
        let hasher = PasswordHasher::from_config(&config.security)?;

        let auth_service = Arc::new(AuthService::new(
            users,
            hasher,
            token_service.clone(),
            config.security.clone(),
        ));
        let patient_service = Arc::new(PatientService::new(patients));

        Ok(Self {
            config: Arc::new(config),
            db,
            token_service,
            auth_service,
            patient_service,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().path().to_string();
    // 指标使用路由模板，避免 ID 造成标签基数爆炸
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status();

        metrics::counter!(
            "http_requests_total",
            "method" => method.to_string(),
            "route" => route.clone(),
            "status" => status.as_u16().to_string()
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds", "route" => route)
            .record(elapsed.as_secs_f64());

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Request failed"
            );
        } else {
            tracing::info!(
                status = status.as_u16(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Request completed"
            );
        }

        // 在响应头中回传追踪 ID
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
