//! Anthropic Messages API 适配器
//!
//! 与 OpenAI 格式的主要差异：
//! - system 消息合并为顶层 `system` 字段，不出现在 `messages` 中
//! - 每条消息的 content 是 `[{"type": "text", "text": ...}]` 形式的块
//! - `max_tokens` 必填
//! - 认证使用 `x-api-key` + `anthropic-version` 头
//! - 响应文本在 `content[].text`，token 计数为 input/output_tokens

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{
    created_or_now, merge_provider_options, model_or_requested, pass_through, require_api_key,
    send_json, str_at, u64_at, Outbound, ProviderAdapter,
};
use crate::config::ProviderSettings;
use crate::error::GatewayError;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, Provider, Role, Usage};
use crate::utils::join_url;

const MESSAGES_PATH: &str = "/v1/messages";

#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    outbound: Outbound,
    settings: ProviderSettings,
    api_version: String,
}

impl AnthropicAdapter {
    pub fn new(
        outbound: Outbound,
        settings: ProviderSettings,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            outbound,
            settings,
            api_version: api_version.into(),
        }
    }
}

/// 拆出 system 消息（换行拼接），其余消息保持原顺序
fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<&ChatMessage>) {
    let (system, rest): (Vec<&ChatMessage>, Vec<&ChatMessage>) =
        messages.iter().partition(|m| m.role == Role::System);

    let system = if system.is_empty() {
        None
    } else {
        Some(
            system
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    };
    (system, rest)
}

pub(crate) fn build_body(request: &ChatRequest, default_max_tokens: u32) -> Map<String, Value> {
    let (system, rest) = split_system(&request.messages);

    let messages: Vec<Value> = rest
        .into_iter()
        .map(|m| {
            json!({
                "role": m.role.as_str(),
                "content": [{ "type": "text", "text": m.content }],
            })
        })
        .collect();

    let mut body = Map::new();
    body.insert("model".into(), json!(request.model));
    body.insert("messages".into(), Value::Array(messages));
    body.insert(
        "max_tokens".into(),
        json!(request.max_tokens.unwrap_or(default_max_tokens)),
    );
    if let Some(system) = system {
        body.insert("system".into(), Value::String(system));
    }
    if let Some(t) = request.temperature {
        body.insert("temperature".into(), json!(t));
    }
    if let Some(p) = request.top_p {
        body.insert("top_p".into(), json!(p));
    }

    merge_provider_options(&mut body, request);
    body
}

/// 拼接所有文本块；content 不是数组时退回第一个元素的 text
fn extract_text(json: &Value) -> String {
    match json.get("content") {
        Some(Value::Array(blocks)) => blocks
            .iter()
            .map(|b| b.get("text").and_then(Value::as_str).unwrap_or_default())
            .collect(),
        _ => str_at(json, "/content/0/text").unwrap_or_default(),
    }
}

pub(crate) fn normalize(json: &Value, request: &ChatRequest) -> ChatResponse {
    let usage = Usage::from_counts(
        u64_at(json, "/usage/input_tokens"),
        u64_at(json, "/usage/output_tokens"),
        None,
    );

    ChatResponse::single(
        Provider::Anthropic,
        str_at(json, "/id").unwrap_or_default(),
        created_or_now(json),
        model_or_requested(json, request),
        extract_text(json),
        str_at(json, "/stop_reason"),
        usage,
    )
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        let api_key = require_api_key(Provider::Anthropic, &self.settings)?;

        let body = build_body(request, self.outbound.default_max_tokens);
        let url = join_url(&self.settings.base_url, MESSAGES_PATH);
        tracing::debug!("POST {} (model {})", url, request.model);

        let builder = self
            .outbound
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.api_version);

        let reply = send_json(Provider::Anthropic, builder, &body, self.outbound.timeout)
            .await?
            .into_result(Provider::Anthropic, pass_through)?;

        Ok(normalize(&reply.json_or_empty(), request))
    }
}
