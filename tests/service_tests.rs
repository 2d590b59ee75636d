//! 认证服务测试
//!
//! 直接针对 AuthService 与内存存储

use chrono::Utc;
use hospital_portal::{
    auth::{PasswordHasher, Role, TokenService},
    config::SecurityConfig,
    error::AppError,
    models::{LoginRequest, RegisterRequest},
    repository::{MemoryUserStore, UserStore},
    services::AuthService,
};
use std::sync::Arc;

mod common;
use common::{create_test_config_with_admin, create_test_security_config, ADMIN_EMAIL};

fn build_service(store: Arc<MemoryUserStore>) -> (AuthService, Arc<TokenService>) {
    build_service_with(store, create_test_security_config())
}

fn build_service_with(
    store: Arc<MemoryUserStore>,
    security: SecurityConfig,
) -> (AuthService, Arc<TokenService>) {
    let tokens = Arc::new(TokenService::from_config(&security).unwrap());
    let hasher = PasswordHasher::from_config(&security).unwrap();
    (
        AuthService::new(store, hasher, tokens.clone(), security),
        tokens,
    )
}

fn register_request(email: &str, role: Role) -> RegisterRequest {
    RegisterRequest {
        name: "Test User".to_string(),
        email: email.to_string(),
        password: "secret1".to_string(),
        role,
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_register_then_login() {
    let store = Arc::new(MemoryUserStore::new());
    let (service, tokens) = build_service(store.clone());

    let user = service
        .register(register_request("a@x.com", Role::Doctor))
        .await
        .unwrap();
    assert_eq!(user.role, Role::Doctor);

    // 存储的是哈希而不是明文
    let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "secret1");
    assert!(stored.password_hash.starts_with("$argon2id$"));

    let login = service.login(login_request("a@x.com", "secret1")).await.unwrap();
    assert_eq!(login.user.id, user.id);

    let claims = tokens.validate(&login.token, Utc::now()).unwrap();
    assert_eq!(claims.user_id, user.id);
    assert_eq!(claims.role, Role::Doctor);
}

#[tokio::test]
async fn test_login_failures_are_generic() {
    let (service, _) = build_service(Arc::new(MemoryUserStore::new()));
    service
        .register(register_request("a@x.com", Role::Patient))
        .await
        .unwrap();

    let wrong_password = service.login(login_request("a@x.com", "secret2")).await;
    let unknown_email = service.login(login_request("b@x.com", "secret1")).await;

    assert!(matches!(wrong_password, Err(AppError::Authentication)));
    assert!(matches!(unknown_email, Err(AppError::Authentication)));
}

#[tokio::test]
async fn test_login_as_role_mismatch() {
    let (service, _) = build_service(Arc::new(MemoryUserStore::new()));
    service
        .register(register_request("doc@x.com", Role::Doctor))
        .await
        .unwrap();

    let result = service
        .login_as(Role::Patient, login_request("doc@x.com", "secret1"))
        .await;
    assert!(matches!(result, Err(AppError::ForbiddenRole(Role::Patient))));

    let ok = service
        .login_as(Role::Doctor, login_request("doc@x.com", "secret1"))
        .await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn test_duplicate_registration() {
    let store = Arc::new(MemoryUserStore::new());
    let (service, _) = build_service(store.clone());

    service
        .register(register_request("a@x.com", Role::Doctor))
        .await
        .unwrap();
    let second = service
        .register(register_request("a@x.com", Role::Receptionist))
        .await;

    assert!(matches!(second, Err(AppError::DuplicateEmail(_))));
    assert_eq!(store.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_creates_one_account() {
    let store = Arc::new(MemoryUserStore::new());
    let (service, _) = build_service(store.clone());
    let service = Arc::new(service);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .register(register_request("race@x.com", Role::Patient))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::DuplicateEmail(_)) => duplicates += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_admin_role_not_self_registrable() {
    let store = Arc::new(MemoryUserStore::new());
    let (service, _) = build_service(store.clone());

    let result = service.register(register_request("root@x.com", Role::Admin)).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(store.is_empty());

    let created = service
        .create_user(register_request("root@x.com", Role::Admin))
        .await
        .unwrap();
    assert_eq!(created.role, Role::Admin);
}

#[tokio::test]
async fn test_password_policy_enforced_by_service() {
    let mut security = create_test_security_config();
    security.password_min_length = 10;
    let (service, _) = build_service_with(Arc::new(MemoryUserStore::new()), security);

    let result = service.register(register_request("a@x.com", Role::Doctor)).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_ensure_admin_is_idempotent() {
    let store = Arc::new(MemoryUserStore::new());
    let security = create_test_config_with_admin().security;
    let (service, _) = build_service_with(store.clone(), security);

    let first = service.ensure_admin().await.unwrap().unwrap();
    let second = service.ensure_admin().await.unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.email, ADMIN_EMAIL);
    assert_eq!(first.role, Role::Admin);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_ensure_admin_fails_when_email_taken_by_non_admin() {
    let store = Arc::new(MemoryUserStore::new());
    let security = create_test_config_with_admin().security;
    let (service, _) = build_service_with(store.clone(), security);

    service
        .register(register_request(ADMIN_EMAIL, Role::Doctor))
        .await
        .unwrap();

    let result = service.ensure_admin().await;
    assert!(matches!(result, Err(AppError::Config(_))));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_ensure_admin_without_config_is_noop() {
    let store = Arc::new(MemoryUserStore::new());
    let (service, _) = build_service(store.clone());

    assert!(service.ensure_admin().await.unwrap().is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_current_user_not_found() {
    let (service, _) = build_service(Arc::new(MemoryUserStore::new()));

    assert!(matches!(
        service.current_user(42).await,
        Err(AppError::NotFound(_))
    ));
}
