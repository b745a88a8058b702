use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::GatewayError;
use crate::middleware;
use crate::service::LlmService;
use crate::types::{ChatRequest, ChatResponse, Provider};

/// 进程内的请求统计
#[derive(Debug, Default)]
pub struct RequestStats {
    total_requests: AtomicU64,
    failed_requests: AtomicU64,
}

/// 各 handler 共享的状态
#[derive(Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: LlmService,
    pub started_at: Instant,
    pub stats: RequestStats,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, service: LlmService) -> Self {
        Self {
            config,
            service,
            started_at: Instant::now(),
            stats: RequestStats::default(),
        }
    }
}

/// 系统状态信息
#[derive(Serialize)]
pub struct SystemStatus {
    version: &'static str,
    uptime_seconds: u64,
    server_port: u16,
    configured_providers: Vec<Provider>,
    stats: SystemStats,
}

#[derive(Serialize)]
pub struct SystemStats {
    total_requests: u64,
    failed_requests: u64,
}

/// 聊天接口路径，例如 /api/v1/llm/chat
pub fn chat_path(api_base_path: &str) -> String {
    if api_base_path.is_empty() {
        "/v1/llm/chat".to_string()
    } else {
        format!("/{}/v1/llm/chat", api_base_path)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let chat_route = chat_path(&state.config.server.api_base_path);

    Router::new()
        .route(&chat_route, post(chat_completion))
        .route("/health", get(|| async { "OK" }))
        .route("/status", get(get_status))
        .layer(tower::ServiceBuilder::new().layer(axum::middleware::from_fn(
            middleware::request_tracing,
        )))
        .with_state(state)
}

/// 状态页面接口
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let llm = &state.config.llm;
    let configured_providers = [
        (Provider::OpenAi, &llm.openai),
        (Provider::Anthropic, &llm.anthropic),
        (Provider::DeepSeek, &llm.deepseek),
        (Provider::OpenRouter, &llm.openrouter),
    ]
    .into_iter()
    .filter(|(_, settings)| settings.api_key.is_some())
    .map(|(provider, _)| provider)
    .collect();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        server_port: state.config.server.port,
        configured_providers,
        stats: SystemStats {
            total_requests: state.stats.total_requests.load(Ordering::Relaxed),
            failed_requests: state.stats.failed_requests.load(Ordering::Relaxed),
        },
    })
}

/// 接收统一格式的聊天请求并转发到对应服务商
pub async fn chat_completion(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, GatewayError> {
    state.stats.total_requests.fetch_add(1, Ordering::Relaxed);

    let result = handle_chat(&state, payload).await;
    if let Err(e) = &result {
        state.stats.failed_requests.fetch_add(1, Ordering::Relaxed);
        tracing::error!("Chat request failed ({}): {}", e.kind(), e);
    }
    result.map(Json)
}

async fn handle_chat(
    state: &AppState,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<ChatResponse, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::InvalidInput(e.body_text()))?;
    request.validate()?;
    state.service.chat(&request).await
}
