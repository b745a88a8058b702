use crate::error::GatewayError;
use crate::providers::ProviderRegistry;
use crate::types::{ChatRequest, ChatResponse};

/// 网关服务：按 provider 选出适配器并原样返回其结果
#[derive(Debug, Clone)]
pub struct LlmService {
    registry: ProviderRegistry,
}

impl LlmService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        tracing::info!(
            "Dispatching chat request to {} (model {}, {} messages)",
            request.provider,
            request.model,
            request.messages.len()
        );
        let adapter = self.registry.adapter(request.provider);
        adapter.chat(request).await
    }
}
