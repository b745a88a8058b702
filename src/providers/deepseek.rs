use async_trait::async_trait;

use super::openai_compat::{self, Dialect};
use super::{Outbound, ProviderAdapter};
use crate::config::ProviderSettings;
use crate::error::GatewayError;
use crate::types::{ChatRequest, ChatResponse, Provider};

const DIALECT: Dialect = Dialect {
    provider: Provider::DeepSeek,
    path: "/chat/completions",
    map_status,
};

/// DeepSeek 的失败状态码映射：5xx 视为网关错误，408 视为网关超时，其余原样透传
pub fn map_status(status: u16) -> u16 {
    match status {
        500..=599 => 502,
        408 => 504,
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct DeepSeekAdapter {
    outbound: Outbound,
    settings: ProviderSettings,
}

impl DeepSeekAdapter {
    pub fn new(outbound: Outbound, settings: ProviderSettings) -> Self {
        Self { outbound, settings }
    }
}

#[async_trait]
impl ProviderAdapter for DeepSeekAdapter {
    fn provider(&self) -> Provider {
        Provider::DeepSeek
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        openai_compat::chat(&DIALECT, &self.outbound, &self.settings, request).await
    }
}
