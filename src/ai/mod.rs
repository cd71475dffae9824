//! AI-assisted feedback, diagnostic insights and study recommendations.

mod backend;
mod fingerprint;
pub mod prompts;

pub use backend::{CompletionBackend, OpenAiBackend};

use learnify_rules::analytics::fallback_recommendations;
use learnify_schema::analytics::{PerformanceSummary, Recommendation};
use learnify_schema::chat::ChatMessage;
use learnify_schema::diagnostic::{DiagnosticScore, LearningInsights};
use learnify_schema::feedback::{Feedback, FeedbackRequest};
use moka::sync::Cache;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AiConfig;
use crate::error::AiError;

pub type FeedbackCache = Cache<u64, Feedback>;

/// Who the recommendations are for.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationContext<'a> {
    pub student: &'a str,
    pub grade_level: Option<&'a str>,
    pub subject: &'a str,
}

pub struct AiService {
    backend: Option<Arc<dyn CompletionBackend>>,
    model: String,
    feedback_cache: FeedbackCache,
}

impl AiService {
    pub fn from_config(cfg: &AiConfig) -> Self {
        if !cfg.enabled {
            info!("AI backend disabled; feedback returns 503 and recommendations fall back");
            return Self::disabled();
        }
        info!(model = %cfg.model, rps = cfg.requests_per_second, "AI backend enabled");
        Self::with_backend(
            Arc::new(OpenAiBackend::new(cfg)),
            &cfg.model,
            cfg.cache_ttl_secs,
            cfg.cache_capacity,
        )
    }

    pub fn with_backend(
        backend: Arc<dyn CompletionBackend>,
        model: &str,
        cache_ttl_secs: u64,
        cache_capacity: u64,
    ) -> Self {
        Self {
            backend: Some(backend),
            model: model.to_string(),
            feedback_cache: build_cache(cache_ttl_secs, cache_capacity),
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            model: String::new(),
            feedback_cache: build_cache(1, 1),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    async fn ask<T: DeserializeOwned>(&self, prompt: String) -> Result<T, AiError> {
        let backend = self.backend.as_ref().ok_or(AiError::Disabled)?;
        let messages = vec![ChatMessage::system(prompts::SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let text = backend.complete(messages).await?;
        Ok(prompts::parse_json_reply(&text)?)
    }

    pub async fn generate_feedback(&self, req: &FeedbackRequest) -> Result<Feedback, AiError> {
        if !self.is_enabled() {
            return Err(AiError::Disabled);
        }

        let key = fingerprint::feedback_key(&self.model, req);
        if let Some(hit) = key.and_then(|k| self.feedback_cache.get(&k)) {
            debug!("feedback cache hit");
            return Ok(hit);
        }

        let feedback: Feedback = self.ask(prompts::feedback_prompt(req)).await?;
        if let Some(k) = key {
            self.feedback_cache.insert(k, feedback.clone());
        }
        Ok(feedback)
    }

    /// `None` whenever the backend is off or misbehaves.
    pub async fn learning_insights(
        &self,
        subject: &str,
        topic: Option<&str>,
        score: &DiagnosticScore,
    ) -> Option<LearningInsights> {
        if !self.is_enabled() {
            return None;
        }
        match self.ask(prompts::insights_prompt(subject, topic, score)).await {
            Ok(insights) => Some(insights),
            Err(error) => {
                warn!(%error, "learning insights unavailable");
                None
            }
        }
    }

    pub async fn recommendations(
        &self,
        ctx: RecommendationContext<'_>,
        summary: &PerformanceSummary,
    ) -> Vec<Recommendation> {
        if !self.is_enabled() {
            return fallback_recommendations();
        }
        let prompt =
            prompts::recommendations_prompt(ctx.student, ctx.grade_level, ctx.subject, summary);
        match self.ask::<Vec<Recommendation>>(prompt).await {
            Ok(recs) if !recs.is_empty() => recs,
            Ok(_) => fallback_recommendations(),
            Err(error) => {
                warn!(%error, "recommendations fell back to defaults");
                fallback_recommendations()
            }
        }
    }
}

fn build_cache(ttl_secs: u64, capacity: u64) -> FeedbackCache {
    FeedbackCache::builder()
        .time_to_live(Duration::from_secs(ttl_secs.max(1)))
        .max_capacity(capacity.max(1))
        .build()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a canned reply and counts calls.
    pub(crate) struct CannedBackend {
        pub reply: Result<String, ()>,
        pub calls: AtomicUsize,
    }

    impl CannedBackend {
        pub(crate) fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        async fn complete(&self, _messages: Vec<ChatMessage>) -> Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|()| AiError::EmptyCompletion)
        }
    }

    fn request() -> FeedbackRequest {
        FeedbackRequest {
            student_response: "3/4 is bigger than 2/3".into(),
            question_context: "Compare 3/4 and 2/3".into(),
            subject_area: Some("Math".into()),
            learning_objectives: None,
            student_level: None,
        }
    }

    #[tokio::test]
    async fn feedback_is_parsed_and_cached() {
        let backend = CannedBackend::ok(
            "```json\n{\"overallFeedback\":\"Nice work\",\"strengthPoints\":[\"clear\"]}\n```",
        );
        let ai = AiService::with_backend(backend.clone(), "gpt-4o", 60, 16);

        let first = ai.generate_feedback(&request()).await.unwrap();
        assert_eq!(first.overall_feedback, "Nice work");
        assert_eq!(first.strength_points, vec!["clear".to_string()]);

        let second = ai.generate_feedback(&request()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_service_degrades() {
        let ai = AiService::disabled();
        assert!(matches!(
            ai.generate_feedback(&request()).await,
            Err(AiError::Disabled)
        ));
        let score = DiagnosticScore {
            evaluations: vec![],
            skills: vec![],
            overall_proficiency: 0,
            mastered_skills: vec![],
            in_progress_skills: vec![],
        };
        assert!(ai.learning_insights("Math", None, &score).await.is_none());
    }

    #[tokio::test]
    async fn recommendations_fall_back_on_garbage() {
        let ai = AiService::with_backend(CannedBackend::ok("not json"), "gpt-4o", 60, 16);
        let ctx = RecommendationContext {
            student: "Ada",
            grade_level: None,
            subject: "Math",
        };
        let recs = ai.recommendations(ctx, &PerformanceSummary::default()).await;
        assert_eq!(recs, fallback_recommendations());

        let ai = AiService::with_backend(CannedBackend::failing(), "gpt-4o", 60, 16);
        let recs = ai.recommendations(ctx, &PerformanceSummary::default()).await;
        assert_eq!(recs.len(), 3);
    }
}
