use serde::{Deserialize, Serialize};
use url::Url;

/// OpenAI-compatible chat-completions backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AiConfig {
    /// When false, feedback returns 503 and insights/recommendations fall back.
    pub enabled: bool,
    pub api_url: Url,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Optional outbound proxy (http/https/socks5).
    pub proxy: Option<Url>,
    /// Outbound rate limit shared by all AI calls.
    pub requests_per_second: u32,
    /// Retries after the first attempt for transport errors and 5xx.
    pub retry_max_times: usize,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: Url::parse("https://api.openai.com/v1/chat/completions")
                .expect("default ai.api_url must be a valid URL"),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            proxy: None,
            requests_per_second: 2,
            retry_max_times: 2,
            timeout_secs: 60,
            cache_ttl_secs: 3600,
            cache_capacity: 1024,
        }
    }
}
