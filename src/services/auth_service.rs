//! 认证服务：注册、登录、角色登录与管理员初始化

use crate::{
    auth::{PasswordHasher, Role, TokenService},
    config::SecurityConfig,
    error::AppError,
    models::{
        auth::{LoginRequest, LoginResponse},
        user::{NewUser, RegisterRequest, User, UserResponse},
    },
    repository::UserStore,
};
use chrono::Utc;
use secrecy::ExposeSecret;
use std::sync::Arc;

pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            security,
        }
    }

    /// 公开注册，管理员角色不可自助注册
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        if !req.role.is_self_registrable() {
            return Err(AppError::BadRequest(format!(
                "Role '{}' cannot be self-registered",
                req.role
            )));
        }

        self.create_account(req).await
    }

    /// 管理员创建账户，允许任意角色
    pub async fn create_user(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        self.create_account(req).await
    }

    async fn create_account(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        PasswordHasher::validate_password_policy(&req.password, &self.security)?;

        let password_hash = self.hash_password(req.password).await?;

        let user = self
            .users
            .create(&NewUser {
                name: req.name.trim().to_string(),
                email: req.email,
                password_hash,
                role: req.role,
            })
            .await
            .inspect_err(|e| {
                if let AppError::DuplicateEmail(email) = e {
                    tracing::info!(email = %email, "Registration rejected: email already exists");
                }
            })?;

        tracing::info!(user_id = user.id, role = %user.role, "User registered");

        Ok(user.into())
    }

    /// 用户登录，角色取自存储的账户
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = self.authenticate(&req).await?;
        self.issue_login(user)
    }

    /// 角色登录：凭证校验通过后，账户角色必须与端点角色一致
    pub async fn login_as(&self, role: Role, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = self.authenticate(&req).await?;

        if user.role != role {
            tracing::warn!(
                user_id = user.id,
                account_role = %user.role,
                endpoint_role = %role,
                "Role-scoped login rejected"
            );
            return Err(AppError::ForbiddenRole(role));
        }

        self.issue_login(user)
    }

    /// 当前请求身份对应的账户
    pub async fn current_user(&self, user_id: i64) -> Result<UserResponse, AppError> {
        self.get_user(user_id).await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<UserResponse, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserResponse>, AppError> {
        let users = self.users.list(limit, offset).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// 启动时确保管理员账户存在；已存在则保持原样
    pub async fn ensure_admin(&self) -> Result<Option<UserResponse>, AppError> {
        let Some(admin) = self.security.bootstrap_admin.clone() else {
            return Ok(None);
        };

        if let Some(existing) = self.users.find_by_email(&admin.email).await? {
            if existing.role != Role::Admin {
                tracing::error!(
                    user_id = existing.id,
                    role = %existing.role,
                    "Bootstrap admin email belongs to a non-admin account"
                );
                return Err(AppError::Config(format!(
                    "bootstrap admin email {} is registered with role {}",
                    admin.email, existing.role
                )));
            }
            return Ok(Some(existing.into()));
        }

        let created = self
            .create_account(RegisterRequest {
                name: admin.name,
                email: admin.email.clone(),
                password: admin.password.expose_secret().clone(),
                role: Role::Admin,
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Bootstrap admin created");
                Ok(Some(user))
            }
            // 并发启动的另一个实例已创建
            Err(AppError::DuplicateEmail(_)) => Ok(self
                .users
                .find_by_email(&admin.email)
                .await?
                .map(UserResponse::from)),
            Err(e) => Err(e),
        }
    }

    async fn authenticate(&self, req: &LoginRequest) -> Result<User, AppError> {
        let Some(user) = self.users.find_by_email(&req.email).await? else {
            tracing::info!("Login failed: unknown email");
            return Err(AppError::Authentication);
        };

        if !self
            .verify_password(req.password.clone(), user.password_hash.clone())
            .await?
        {
            tracing::info!(user_id = user.id, "Login failed: wrong password");
            return Err(AppError::Authentication);
        }

        Ok(user)
    }

    fn issue_login(&self, user: User) -> Result<LoginResponse, AppError> {
        let issued = self.tokens.issue(user.id, &user.email, user.role, Utc::now())?;

        tracing::info!(user_id = user.id, role = %user.role, "User logged in");

        Ok(LoginResponse {
            token: issued.token,
            token_type: issued.token_type,
            expires_in: issued.expires_in,
            user: user.into(),
        })
    }

    // Argon2 是 CPU 密集型操作，放到阻塞线程池执行
    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))
    }
}
