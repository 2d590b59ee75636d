//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// 环境变量前缀，例如 HOSPITAL_SECURITY__JWT_SECRET
pub const ENV_PREFIX: &str = "HOSPITAL";

/// JWT 密钥最小长度（HS256）
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:8000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// 静态资源目录（管理后台页面）
    pub static_dir: String,
    /// 允许跨域的来源（为空则不启用 CORS）
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    /// 请求体大小上限（字节）
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Secret<String>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 签名密钥，没有默认值，缺失时启动失败
    pub jwt_secret: Secret<String>,
    /// 令牌有效期（秒），默认 24 小时
    pub token_ttl_secs: u64,
    /// 密码最小长度
    pub password_min_length: usize,
    /// Argon2 内存开销（KiB）
    pub argon2_memory_kib: u32,
    /// Argon2 迭代次数
    pub argon2_iterations: u32,
    /// Argon2 并行度
    pub argon2_parallelism: u32,
    /// 启动时创建的管理员账户（可选）
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdminConfig {
    pub name: String,
    pub email: String,
    pub password: Secret<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置（jwt_secret 与 database.url 没有默认值）
        settings = settings
            .set_default("server.addr", "0.0.0.0:8000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("server.static_dir", "./public")?
            .set_default("server.max_body_bytes", 1024 * 1024)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.token_ttl_secs", 86400)?
            .set_default("security.password_min_length", 6)?
            .set_default("security.argon2_memory_kib", argon2::Params::DEFAULT_M_COST)?
            .set_default("security.argon2_iterations", argon2::Params::DEFAULT_T_COST)?
            .set_default("security.argon2_parallelism", argon2::Params::DEFAULT_P_COST)?;

        // 从环境变量加载配置（前缀为 HOSPITAL_）
        settings = settings.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_allowed_origins")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证数据库连接池配置
        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        self.security.validate()
    }
}

impl SecurityConfig {
    /// 验证安全配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(ConfigError::Message("JWT secret is not configured".to_string()));
        }

        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            )));
        }

        // 验证令牌有效期：1 分钟到 30 天
        if self.token_ttl_secs < 60 || self.token_ttl_secs > 30 * 86400 {
            return Err(ConfigError::Message(
                "token_ttl_secs must be between 60 and 2592000 (1 minute to 30 days)".to_string(),
            ));
        }

        if self.password_min_length < 6 || self.password_min_length > 128 {
            return Err(ConfigError::Message(
                "password_min_length must be between 6 and 128".to_string(),
            ));
        }

        if let Some(admin) = &self.bootstrap_admin {
            if admin.password.expose_secret().len() < self.password_min_length {
                return Err(ConfigError::Message(
                    "bootstrap admin password is shorter than password_min_length".to_string(),
                ));
            }
        }

        Ok(())
    }
}
