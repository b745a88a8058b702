//! 注册表查找与网关服务的委派

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockito::Server;
use serde_json::json;

use llm_gateway::providers::registry::SharedAdapter;
use llm_gateway::{
    ChatRequest, ChatResponse, GatewayError, LlmService, Provider, ProviderAdapter,
    ProviderRegistry,
};

use common::{hi, llm_config, registry, service};

/// 记录调用、返回固定内容的假适配器
#[derive(Debug)]
struct FakeAdapter {
    provider: Provider,
    calls: AtomicUsize,
    seen_models: Mutex<Vec<String>>,
}

impl FakeAdapter {
    fn new(provider: Provider) -> Arc<Self> {
        Arc::new(Self {
            provider,
            calls: AtomicUsize::new(0),
            seen_models: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_models.lock().unwrap().push(request.model.clone());
        if request.model == "explode" {
            return Err(GatewayError::Upstream {
                provider: self.provider,
                status: 418,
                message: "teapot".into(),
            });
        }
        Ok(ChatResponse::single(
            request.provider,
            "id-1".into(),
            1,
            request.model.clone(),
            "ok".into(),
            Some("stop".into()),
            None,
        ))
    }
}

fn fake_registry() -> (ProviderRegistry, [Arc<FakeAdapter>; 4]) {
    let fakes = Provider::ALL.map(FakeAdapter::new);
    let shared: Vec<SharedAdapter> = fakes
        .iter()
        .map(|f| f.clone() as SharedAdapter)
        .collect();
    let registry = ProviderRegistry::new(
        shared[0].clone(),
        shared[1].clone(),
        shared[2].clone(),
        shared[3].clone(),
    );
    (registry, fakes)
}

#[test]
fn registry_returns_distinct_adapter_per_provider() {
    let (registry, fakes) = fake_registry();

    for (fake, id) in fakes.iter().zip(["openai", "anthropic", "deepseek", "openrouter"]) {
        let adapter = registry.get(id).unwrap();
        let expected: SharedAdapter = fake.clone();
        assert!(Arc::ptr_eq(adapter, &expected), "wrong adapter for {id}");
        assert_eq!(adapter.provider().as_str(), id);
    }
}

#[test]
fn registry_built_from_config_maps_each_provider() {
    let registry = registry(&llm_config("http://127.0.0.1:9"));
    for provider in Provider::ALL {
        assert_eq!(registry.adapter(provider).provider(), provider);
        assert_eq!(registry.get(provider.as_str()).unwrap().provider(), provider);
    }
}

#[test]
fn registry_rejects_unknown_identifier() {
    let registry = registry(&llm_config("http://127.0.0.1:9"));
    for id in ["unknown", "", "OpenAI", "gemini"] {
        let err = registry.get(id).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
        assert_eq!(err.status_code().as_u16(), 400);
    }
}

#[tokio::test]
async fn service_routes_to_requested_provider() {
    let (registry, fakes) = fake_registry();
    let service = LlmService::new(registry);

    let resp = service.chat(&hi(Provider::DeepSeek, "deepseek-chat")).await.unwrap();

    assert_eq!(resp.choices[0].message.content, "ok");
    assert_eq!(resp.provider, Provider::DeepSeek);
    assert_eq!(fakes[2].calls.load(Ordering::SeqCst), 1);
    assert_eq!(*fakes[2].seen_models.lock().unwrap(), vec!["deepseek-chat".to_string()]);
    for (i, fake) in fakes.iter().enumerate() {
        if i != 2 {
            assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
        }
    }
}

#[tokio::test]
async fn service_propagates_adapter_errors_unchanged() {
    let (registry, _fakes) = fake_registry();
    let service = LlmService::new(registry);

    let err = service.chat(&hi(Provider::OpenAi, "explode")).await.unwrap_err();
    match err {
        GatewayError::Upstream {
            provider,
            status,
            message,
        } => {
            assert_eq!(provider, Provider::OpenAi);
            assert_eq!(status, 418);
            assert_eq!(message, "teapot");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn identical_calls_yield_identical_responses_apart_from_created() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(
            json!({
                "id": "msg_1",
                "content": [{ "type": "text", "text": "same" }],
                "stop_reason": "end_turn",
                "usage": { "input_tokens": 1, "output_tokens": 1 }
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let service = service(&llm_config(&server.url()));
    let request = hi(Provider::Anthropic, "claude");

    let mut first = service.chat(&request).await.unwrap();
    let mut second = service.chat(&request).await.unwrap();
    mock.assert_async().await;

    first.created = 0;
    second.created = 0;
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
