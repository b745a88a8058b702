use async_trait::async_trait;

use super::openai_compat::{self, Dialect};
use super::{pass_through, Outbound, ProviderAdapter};
use crate::config::ProviderSettings;
use crate::error::GatewayError;
use crate::types::{ChatRequest, ChatResponse, Provider};

// base URL 默认已带 /api 前缀
const DIALECT: Dialect = Dialect {
    provider: Provider::OpenRouter,
    path: "/v1/chat/completions",
    map_status: pass_through,
};

/// OpenRouter，OpenAI 兼容格式，model 形如 "anthropic/claude-3-haiku"
#[derive(Debug, Clone)]
pub struct OpenRouterAdapter {
    outbound: Outbound,
    settings: ProviderSettings,
}

impl OpenRouterAdapter {
    pub fn new(outbound: Outbound, settings: ProviderSettings) -> Self {
        Self { outbound, settings }
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenRouter
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        openai_compat::chat(&DIALECT, &self.outbound, &self.settings, request).await
    }
}
