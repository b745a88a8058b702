use async_trait::async_trait;

use super::openai_compat::{self, Dialect};
use super::{pass_through, Outbound, ProviderAdapter};
use crate::config::ProviderSettings;
use crate::error::GatewayError;
use crate::types::{ChatRequest, ChatResponse, Provider};

const DIALECT: Dialect = Dialect {
    provider: Provider::OpenAi,
    path: "/v1/chat/completions",
    map_status: pass_through,
};

/// OpenAI Chat Completions
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    outbound: Outbound,
    settings: ProviderSettings,
}

impl OpenAiAdapter {
    pub fn new(outbound: Outbound, settings: ProviderSettings) -> Self {
        Self { outbound, settings }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        openai_compat::chat(&DIALECT, &self.outbound, &self.settings, request).await
    }
}
