//! 统一格式的 LLM 网关：接收一种聊天请求形状，转发给 OpenAI / Anthropic /
//! DeepSeek / OpenRouter，并把各家响应归一化为同一种 `chat.completion` 形状。

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod middleware;
pub mod providers;
pub mod service;
pub mod types;
pub mod utils;

pub use config::{AppConfig, LlmConfig, ProviderSettings};
pub use error::GatewayError;
pub use providers::{ProviderAdapter, ProviderRegistry};
pub use service::LlmService;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Provider, Role, Usage};
