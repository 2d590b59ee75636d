//! 医院门户主入口

use hospital_portal::{
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    repository::{PgPatientStore, PgUserStore},
    routes, telemetry,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("hospital-portal {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境），生产环境直接设置环境变量
    if let Ok(env) = std::env::var("HOSPITAL_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置（缺少 JWT 密钥时在此失败）
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Hospital portal starting...");

    // 3. 数据库连接池 + 迁移
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    // 4. 构建应用状态
    let addr = config.server.addr.clone();
    let shutdown_timeout = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);

    let app_state = Arc::new(AppState::new(
        config,
        Some(db_pool.clone()),
        Arc::new(PgUserStore::new(db_pool.clone())),
        Arc::new(PgPatientStore::new(db_pool)),
    )?);

    // 5. 初始化管理员账户（如已配置）
    app_state.auth_service.ensure_admin().await?;

    // 6. 构建路由
    let app = routes::create_router(app_state);

    // 7. 启动服务器
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    // 8. 优雅关闭：收到信号后等待进行中的请求，超时则强制退出
    let (signalled_tx, signalled_rx) = oneshot::channel();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    });

    tokio::select! {
        result = server.into_future() => result?,
        _ = async {
            if signalled_rx.await.is_ok() {
                tokio::time::sleep(shutdown_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("hospital-portal {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: hospital-portal [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过 HOSPITAL_ 前缀的环境变量完成");
    println!("  必填: HOSPITAL_DATABASE__URL, HOSPITAL_SECURITY__JWT_SECRET");
    println!("  可用选项请参考 .env.example");
}
