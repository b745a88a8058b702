//! 集成测试共用的配置与请求构造
#![allow(dead_code)]

use llm_gateway::{
    ChatMessage, ChatRequest, LlmConfig, LlmService, Provider, ProviderRegistry, ProviderSettings,
};

/// 四个服务商都指向同一个 stub 上游并配置好 key
pub fn llm_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        request_timeout_secs: 5,
        default_max_tokens: 1024,
        openai: ProviderSettings::new(Some("openai-key"), base_url),
        anthropic: ProviderSettings::new(Some("anthropic-key"), base_url),
        anthropic_api_version: "2023-06-01".to_string(),
        deepseek: ProviderSettings::new(Some("deepseek-key"), base_url),
        openrouter: ProviderSettings::new(Some("openrouter-key"), base_url),
    }
}

pub fn registry(config: &LlmConfig) -> ProviderRegistry {
    ProviderRegistry::from_config(reqwest::Client::new(), config)
}

pub fn service(config: &LlmConfig) -> LlmService {
    LlmService::new(registry(config))
}

pub fn hi(provider: Provider, model: &str) -> ChatRequest {
    ChatRequest::new(provider, model, vec![ChatMessage::user("Hi")])
}
