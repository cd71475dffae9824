use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use learnify_schema::chat::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::AiConfig;
use crate::error::{AiError, IsRetryable};

/// Anything that turns a chat transcript into completion text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AiError>;
}

/// OpenAI-compatible `/chat/completions` over reqwest.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: Url,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    limiter: Arc<DefaultDirectRateLimiter>,
    retry: ExponentialBuilder,
}

impl OpenAiBackend {
    pub fn new(cfg: &AiConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)));

        if let Some(proxy_url) = &cfg.proxy {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .expect("invalid ai.proxy url for reqwest client");
            builder = builder.proxy(proxy);
        }

        let client = builder.build().expect("failed to build AI reqwest client");

        let rps = NonZeroU32::new(cfg.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));

        let retry = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(cfg.retry_max_times)
            .with_jitter();

        Self {
            client,
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            limiter,
            retry,
        }
    }

    async fn send_once(&self, body: &ChatCompletionRequest) -> Result<String, AiError> {
        self.limiter.until_ready().await;

        let resp = self
            .client
            .post(self.api_url.clone())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, model = %self.model, "AI upstream returned non-success status");
            return Err(AiError::UpstreamStatus(status));
        }

        let parsed: ChatCompletionResponse = resp.json().await?;
        parsed
            .first_content()
            .map(str::to_owned)
            .ok_or(AiError::EmptyCompletion)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AiError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let body = &body;

        (|| async move { self.send_once(body).await })
            .retry(self.retry)
            .when(AiError::is_retryable)
            .notify(|err: &AiError, after: Duration| {
                debug!(error = %err, retry_in_ms = after.as_millis(), "AI request failed, retrying");
            })
            .await
    }
}
