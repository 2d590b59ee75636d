//! 路由注册
//! 创建所有 API 路由并按顺序挂载中间件：
//! 请求追踪 → 认证网关 → 角色网关 → 处理器

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
};

use crate::{
    auth::{request_gate, role_gate, RequestGate, Role, RoleGate},
    handlers::{self, ValidatedJson},
    middleware::AppState,
    models::{auth::LoginRequest, user::RoleRegisterRequest},
};

/// 为单个方法路由挂载角色白名单
fn gated(route: MethodRouter<Arc<AppState>>, allowed: &[Role]) -> MethodRouter<Arc<AppState>> {
    route.route_layer(from_fn_with_state(RoleGate::new(allowed), role_gate))
}

/// 角色专属的注册与登录端点
fn role_auth_routes(role: Role) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/register",
            post(
                move |State(state): State<Arc<AppState>>,
                      ValidatedJson(req): ValidatedJson<RoleRegisterRequest>| {
                    handlers::auth::register_as(role, state, req)
                },
            ),
        )
        .route(
            "/login",
            post(
                move |State(state): State<Arc<AppState>>,
                      ValidatedJson(req): ValidatedJson<LoginRequest>| {
                    handlers::auth::login_as(role, state, req)
                },
            ),
        )
}

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点
    let public_routes = Router::new()
        .route("/", get(handlers::health::welcome))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 认证路由（无需认证）
    let auth_routes = Router::new()
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .nest("/api/auth/doctor", role_auth_routes(Role::Doctor))
        .nest("/api/auth/receptionist", role_auth_routes(Role::Receptionist))
        .nest("/api/auth/patient", role_auth_routes(Role::Patient));

    // 需要认证的路由；角色网关在内层，认证网关在外层
    let authenticated_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::me))
        // 患者：读取对员工开放，更新仅医生，创建与删除仅前台
        .route(
            "/api/v1/patients",
            gated(get(handlers::patient::list_patients), &Role::STAFF)
                .merge(gated(post(handlers::patient::create_patient), &[Role::Receptionist])),
        )
        .route(
            "/api/v1/patients/search",
            gated(get(handlers::patient::search_patient), &Role::STAFF),
        )
        .route(
            "/api/v1/patients/{id}",
            gated(get(handlers::patient::get_patient), &Role::STAFF)
                .merge(gated(put(handlers::patient::update_patient), &[Role::Doctor]))
                .merge(gated(delete(handlers::patient::delete_patient), &[Role::Receptionist])),
        )
        // 账户管理：仅管理员
        .route(
            "/api/v1/users",
            gated(
                get(handlers::user::list_users).post(handlers::user::create_user),
                &[Role::Admin],
            ),
        )
        .route(
            "/api/v1/users/{id}",
            gated(get(handlers::user::get_user), &[Role::Admin]),
        )
        .route_layer(from_fn_with_state(
            RequestGate::new(state.token_service.clone()),
            request_gate,
        ));

    // 静态资源（管理后台）
    let static_dir = std::path::Path::new(&state.config.server.static_dir);
    let static_routes = Router::new()
        .route_service("/admin", ServeFile::new(static_dir.join("admin.html")))
        .nest_service("/css", ServeDir::new(static_dir.join("css")))
        .nest_service("/js", ServeDir::new(static_dir.join("js")))
        .nest_service("/img", ServeDir::new(static_dir.join("img")));

    let mut router = Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .merge(static_routes)
        .layer(axum::middleware::from_fn(
            crate::middleware::request_tracking_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .layer(CompressionLayer::new());

    if let Some(cors) = cors_layer(&state.config.server.cors_allowed_origins) {
        router = router.layer(cors);
    }

    router.with_state(state)
}

/// 根据配置构建 CORS 层；未配置来源时不启用
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}
