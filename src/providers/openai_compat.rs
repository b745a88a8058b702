//! OpenAI 兼容格式的公共实现，供 OpenAI / DeepSeek / OpenRouter 使用

use serde_json::{json, Map, Value};

use super::{
    created_or_now, merge_provider_options, model_or_requested, require_api_key, send_json,
    str_at, u64_at, Outbound,
};
use crate::config::ProviderSettings;
use crate::error::GatewayError;
use crate::types::{ChatRequest, ChatResponse, Provider, Usage};
use crate::utils::join_url;

/// 一个 OpenAI 兼容服务商的差异点
pub(crate) struct Dialect {
    pub provider: Provider,
    pub path: &'static str,
    pub map_status: fn(u16) -> u16,
}

pub(crate) fn build_body(request: &ChatRequest, default_max_tokens: u32) -> Map<String, Value> {
    let messages: Vec<Value> = request
        .messages
        .iter()
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();

    let mut body = Map::new();
    body.insert("model".into(), json!(request.model));
    body.insert("messages".into(), Value::Array(messages));
    if let Some(t) = request.temperature {
        body.insert("temperature".into(), json!(t));
    }
    if let Some(p) = request.top_p {
        body.insert("top_p".into(), json!(p));
    }
    body.insert(
        "max_tokens".into(),
        json!(request.max_tokens.unwrap_or(default_max_tokens)),
    );

    merge_provider_options(&mut body, request);
    body
}

pub(crate) fn normalize(provider: Provider, json: &Value, request: &ChatRequest) -> ChatResponse {
    let usage = Usage::from_counts(
        u64_at(json, "/usage/prompt_tokens"),
        u64_at(json, "/usage/completion_tokens"),
        u64_at(json, "/usage/total_tokens"),
    );

    ChatResponse::single(
        provider,
        str_at(json, "/id").unwrap_or_default(),
        created_or_now(json),
        model_or_requested(json, request),
        str_at(json, "/choices/0/message/content").unwrap_or_default(),
        str_at(json, "/choices/0/finish_reason"),
        usage,
    )
}

pub(crate) async fn chat(
    dialect: &Dialect,
    outbound: &Outbound,
    settings: &ProviderSettings,
    request: &ChatRequest,
) -> Result<ChatResponse, GatewayError> {
    let provider = dialect.provider;
    let api_key = require_api_key(provider, settings)?;

    let body = build_body(request, outbound.default_max_tokens);
    let url = join_url(&settings.base_url, dialect.path);
    tracing::debug!("POST {} (model {})", url, request.model);

    let builder = outbound.client.post(&url).bearer_auth(api_key);
    let reply = send_json(provider, builder, &body, outbound.timeout)
        .await?
        .into_result(provider, dialect.map_status)?;

    Ok(normalize(provider, &reply.json_or_empty(), request))
}
