//! 上游服务商适配层
//!
//! 每个适配器负责一个服务商的线上格式：构造请求体、认证头、把响应归一化成
//! [`ChatResponse`]，以及把失败状态码映射成 [`GatewayError`]。适配器本身无
//! 请求级可变状态，可在并发请求间共享。

pub mod anthropic;
pub mod deepseek;
pub mod openai;
mod openai_compat;
pub mod openrouter;
pub mod registry;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{Map, Value};

use crate::config::{LlmConfig, ProviderSettings};
use crate::error::GatewayError;
use crate::http::{call_with_timeout, CallError};
use crate::types::{ChatRequest, ChatResponse, Provider};
use crate::utils::current_timestamp;

pub use anthropic::AnthropicAdapter;
pub use deepseek::DeepSeekAdapter;
pub use openai::OpenAiAdapter;
pub use openrouter::OpenRouterAdapter;
pub use registry::ProviderRegistry;

/// 所有服务商适配器的统一契约
#[async_trait]
pub trait ProviderAdapter: Send + Sync + fmt::Debug {
    fn provider(&self) -> Provider;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError>;
}

/// 所有适配器共享的出站设置
#[derive(Debug, Clone)]
pub struct Outbound {
    pub client: reqwest::Client,
    pub timeout: Duration,
    pub default_max_tokens: u32,
}

impl Outbound {
    pub fn new(client: reqwest::Client, config: &LlmConfig) -> Self {
        Self {
            client,
            timeout: config.request_timeout(),
            default_max_tokens: config.default_max_tokens,
        }
    }
}

/// 上游响应：状态码、尽力解析的 JSON，以及原始文本
#[derive(Debug)]
pub(crate) struct UpstreamReply {
    pub status: StatusCode,
    pub json: Option<Value>,
    pub raw: String,
}

impl UpstreamReply {
    /// 成功响应解析失败时按空对象处理
    pub fn json_or_empty(&self) -> Value {
        self.json
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// 错误信息优先取 error.message，其次原始文本，最后是通用提示
    pub fn error_message(&self, provider: Provider) -> String {
        self.json
            .as_ref()
            .and_then(|j| j.pointer("/error/message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| Some(self.raw.clone()).filter(|raw| !raw.is_empty()))
            .unwrap_or_else(|| format!("{} API error", provider.display_name()))
    }

    /// 非成功状态转为上游错误，`map_status` 决定对外状态码
    pub fn into_result(
        self,
        provider: Provider,
        map_status: fn(u16) -> u16,
    ) -> Result<Self, GatewayError> {
        if self.status.is_success() {
            return Ok(self);
        }
        let message = self.error_message(provider);
        let status = map_status(self.status.as_u16());
        tracing::warn!(
            "{} responded with {} (mapped to {}): {}",
            provider.display_name(),
            self.status.as_u16(),
            status,
            message
        );
        Err(GatewayError::Upstream {
            provider,
            status,
            message,
        })
    }
}

/// 原样透传上游状态码
pub(crate) fn pass_through(status: u16) -> u16 {
    status
}

/// 缺少 API key 时在发起任何网络调用前失败
pub(crate) fn require_api_key(
    provider: Provider,
    settings: &ProviderSettings,
) -> Result<&str, GatewayError> {
    settings
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            GatewayError::Configuration(format!("{} is not configured", provider.api_key_var()))
        })
}

/// providerOptions 浅合并到请求体，后写覆盖
pub(crate) fn merge_provider_options(body: &mut Map<String, Value>, request: &ChatRequest) {
    if let Some(options) = &request.provider_options {
        for (k, v) in options {
            body.insert(k.clone(), v.clone());
        }
    }
}

/// 发送 JSON 请求并把网络层失败分类为超时或不可达
pub(crate) async fn send_json(
    provider: Provider,
    request: RequestBuilder,
    body: &Map<String, Value>,
    timeout: Duration,
) -> Result<UpstreamReply, GatewayError> {
    let request = request.json(body);
    let reply = call_with_timeout(request, timeout).await.map_err(|e| {
        tracing::warn!("{} call failed: {}", provider.display_name(), e);
        match e {
            CallError::Timeout(timeout) => GatewayError::Timeout { provider, timeout },
            CallError::Network(err) => GatewayError::Unreachable {
                provider,
                message: err.to_string(),
            },
        }
    })?;

    let json = if reply.body.trim().is_empty() {
        Some(Value::Object(Map::new()))
    } else {
        match serde_json::from_str::<Value>(&reply.body) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!("{} returned non-JSON body: {}", provider.display_name(), e);
                None
            }
        }
    };

    Ok(UpstreamReply {
        status: reply.status,
        json,
        raw: reply.body,
    })
}

pub(crate) fn str_at(json: &Value, pointer: &str) -> Option<String> {
    json.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub(crate) fn u64_at(json: &Value, pointer: &str) -> Option<u64> {
    json.pointer(pointer).and_then(Value::as_u64)
}

/// 优先使用上游给出的 created，否则取当前时间
pub(crate) fn created_or_now(json: &Value) -> i64 {
    json.get("created")
        .and_then(Value::as_i64)
        .unwrap_or_else(current_timestamp)
}

pub(crate) fn model_or_requested(json: &Value, request: &ChatRequest) -> String {
    str_at(json, "/model").unwrap_or_else(|| request.model.clone())
}
