use std::env;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llm_gateway::handlers::{self, AppState};
use llm_gateway::{AppConfig, LlmService, Provider, ProviderRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "llm_gateway=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. 加载配置（.env）
    let env_path = Path::new(".env");
    if env_path.exists() {
        match dotenvy::from_path(env_path) {
            Ok(_) => tracing::info!("Loaded .env file successfully"),
            Err(e) => tracing::error!("Failed to load .env file: {}", e),
        }
    } else {
        tracing::warn!(".env file not found in current directory");
    }

    // 只打印各 API key 是否存在，不打印具体值
    for provider in Provider::ALL {
        let var = provider.api_key_var();
        let present = env::var(var).map(|v| !v.is_empty()).unwrap_or(false);
        tracing::info!("{} exists: {}", var, present);
    }

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(
        "Configuration loaded successfully (timeout {}s, default max_tokens {})",
        config.llm.request_timeout_secs,
        config.llm.default_max_tokens
    );

    // 3. 构建共享 HTTP 客户端与服务商注册表
    let client = reqwest::Client::builder().build()?;
    let registry = ProviderRegistry::from_config(client, &config.llm);
    let state = Arc::new(AppState::new(config.clone(), LlmService::new(registry)));

    // 4. 构建路由
    let app = handlers::router(state);

    // 5. 启动服务器
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let display_ip = if addr.ip().is_unspecified() {
        "127.0.0.1".to_string()
    } else {
        addr.ip().to_string()
    };

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!(
        "Chat endpoint available at http://{}:{}{}",
        display_ip,
        addr.port(),
        handlers::chat_path(&config.server.api_base_path)
    );

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
