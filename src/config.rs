use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";

#[derive(Debug, Clone)]
pub struct AppConfig {
    // 服务器设置
    pub server: ServerConfig,

    // 上游 LLM 设置
    pub llm: LlmConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// 不含首尾斜杠，例如 "api"
    pub api_base_path: String,
}

/// 单个上游服务商的连接信息
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl ProviderSettings {
    pub fn new(api_key: Option<&str>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()).map(str::to_string),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub request_timeout_secs: u64,
    pub default_max_tokens: u32,

    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub anthropic_api_version: String,
    pub deepseek: ProviderSettings,
    pub openrouter: ProviderSettings,
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            default_max_tokens: 1024,
            openai: ProviderSettings::new(None, DEFAULT_OPENAI_BASE_URL),
            anthropic: ProviderSettings::new(None, DEFAULT_ANTHROPIC_BASE_URL),
            anthropic_api_version: DEFAULT_ANTHROPIC_API_VERSION.to_string(),
            deepseek: ProviderSettings::new(None, DEFAULT_DEEPSEEK_BASE_URL),
            openrouter: ProviderSettings::new(None, DEFAULT_OPENROUTER_BASE_URL),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源解析配置，便于测试时注入
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // 服务器地址，默认 0.0.0.0:3000
        let host = parse_var(&lookup, "SERVER_HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_var(&lookup, "SERVER_PORT", 3000u16)?;
        let api_base_path = get_or("API_BASE_PATH", "api").trim_matches('/').to_string();

        let request_timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT_SEC", 60u64)?;
        ensure_range("REQUEST_TIMEOUT_SEC", request_timeout_secs, 1, 3600)?;

        let default_max_tokens = parse_var(&lookup, "LLM_MAX_TOKENS_DEFAULT", 1024u32)?;
        ensure_range("LLM_MAX_TOKENS_DEFAULT", default_max_tokens as u64, 1, 1_000_000)?;

        let llm = LlmConfig {
            request_timeout_secs,
            default_max_tokens,
            openai: ProviderSettings::new(
                lookup("OPENAI_API_KEY").as_deref(),
                get_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            ),
            anthropic: ProviderSettings::new(
                lookup("ANTHROPIC_API_KEY").as_deref(),
                get_or("ANTHROPIC_BASE_URL", DEFAULT_ANTHROPIC_BASE_URL),
            ),
            anthropic_api_version: get_or("ANTHROPIC_API_VERSION", DEFAULT_ANTHROPIC_API_VERSION),
            deepseek: ProviderSettings::new(
                lookup("DEEPSEEK_API_KEY").as_deref(),
                get_or("DEEPSEEK_BASE_URL", DEFAULT_DEEPSEEK_BASE_URL),
            ),
            openrouter: ProviderSettings::new(
                lookup("OPENROUTER_API_KEY").as_deref(),
                get_or("OPENROUTER_BASE_URL", DEFAULT_OPENROUTER_BASE_URL),
            ),
        };

        Ok(Self {
            server: ServerConfig {
                host,
                port,
                api_base_path,
            },
            llm,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

fn ensure_range(key: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        return Err(anyhow!("{key} must be between {min} and {max}, got {value}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.api_base_path, "api");
        assert_eq!(config.llm.request_timeout_secs, 60);
        assert_eq!(config.llm.default_max_tokens, 1024);
        assert_eq!(config.llm.openai.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.llm.openrouter.base_url, DEFAULT_OPENROUTER_BASE_URL);
        assert_eq!(config.llm.anthropic_api_version, "2023-06-01");
        assert!(config.llm.openai.api_key.is_none());
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let config = config_from(&[("OPENAI_API_KEY", ""), ("DEEPSEEK_API_KEY", "ds")]).unwrap();
        assert!(config.llm.openai.api_key.is_none());
        assert_eq!(config.llm.deepseek.api_key.as_deref(), Some("ds"));
    }

    #[test]
    fn timeout_out_of_bounds_is_rejected() {
        let err = config_from(&[("REQUEST_TIMEOUT_SEC", "0")]).unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT_SEC"));
        assert!(config_from(&[("REQUEST_TIMEOUT_SEC", "3601")]).is_err());
        assert!(config_from(&[("REQUEST_TIMEOUT_SEC", "3600")]).is_ok());
    }

    #[test]
    fn max_tokens_must_parse_and_stay_in_bounds() {
        assert!(config_from(&[("LLM_MAX_TOKENS_DEFAULT", "abc")]).is_err());
        assert!(config_from(&[("LLM_MAX_TOKENS_DEFAULT", "1000001")]).is_err());
        let config = config_from(&[("LLM_MAX_TOKENS_DEFAULT", "256")]).unwrap();
        assert_eq!(config.llm.default_max_tokens, 256);
    }

    #[test]
    fn api_base_path_is_trimmed() {
        let config = config_from(&[("API_BASE_PATH", "/gateway/")]).unwrap();
        assert_eq!(config.server.api_base_path, "gateway");
    }
}
