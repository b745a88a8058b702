use std::sync::Arc;

use super::{
    AnthropicAdapter, DeepSeekAdapter, OpenAiAdapter, OpenRouterAdapter, Outbound,
    ProviderAdapter,
};
use crate::config::LlmConfig;
use crate::error::GatewayError;
use crate::types::Provider;

pub type SharedAdapter = Arc<dyn ProviderAdapter>;

/// 服务商标识到适配器实例的固定映射
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    openai: SharedAdapter,
    anthropic: SharedAdapter,
    deepseek: SharedAdapter,
    openrouter: SharedAdapter,
}

impl ProviderRegistry {
    pub fn new(
        openai: SharedAdapter,
        anthropic: SharedAdapter,
        deepseek: SharedAdapter,
        openrouter: SharedAdapter,
    ) -> Self {
        Self {
            openai,
            anthropic,
            deepseek,
            openrouter,
        }
    }

    /// 用同一个 HTTP 客户端构建四个适配器
    pub fn from_config(client: reqwest::Client, config: &LlmConfig) -> Self {
        let outbound = Outbound::new(client, config);
        Self::new(
            Arc::new(OpenAiAdapter::new(outbound.clone(), config.openai.clone())),
            Arc::new(AnthropicAdapter::new(
                outbound.clone(),
                config.anthropic.clone(),
                config.anthropic_api_version.clone(),
            )),
            Arc::new(DeepSeekAdapter::new(outbound.clone(), config.deepseek.clone())),
            Arc::new(OpenRouterAdapter::new(outbound, config.openrouter.clone())),
        )
    }

    pub fn adapter(&self, provider: Provider) -> &SharedAdapter {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
            Provider::DeepSeek => &self.deepseek,
            Provider::OpenRouter => &self.openrouter,
        }
    }

    /// 按字符串标识查找，未知标识返回 InvalidInput
    pub fn get(&self, provider: &str) -> Result<&SharedAdapter, GatewayError> {
        let provider: Provider = provider.parse()?;
        Ok(self.adapter(provider))
    }
}
