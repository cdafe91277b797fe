//! Retry-wrapped text generation and the official/non-official activity classifier.
//!
//! [`generate_text`] never fails: once its attempt budget is spent it returns an
//! empty string, which [`ActivityClassifier`] reads as "not official".

use crate::traits::{GenerateRequest, LlmClient, LlmError};
use futures::StreamExt;
use scout_common::{retry_bounded, RetryPolicy};
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "llama3.2:latest";
pub const DEFAULT_KEEP_ALIVE: &str = "30m";
pub const DEFAULT_ATTEMPTS: usize = 5;

/// Label the model answers with for a registered business.
pub const OFFICIAL_LABEL: &str = "officiel";

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"À partir de la description de commerce donnée, déterminer s'il s'agit d'un commerce officiel ou bien d'une initiative individuelle non-officielle (par exemple à domicile). Ne retourner que un seul mot: "officiel" s'il s'agit d'un commerce officiel, "non-officiel" s'il ne s'agit pas d'un commerce officiel."#;

/// Run one streamed generation and concatenate its pieces.
async fn collect_stream(client: &dyn LlmClient, request: &GenerateRequest) -> Result<String, LlmError> {
    let mut stream = client.generate_stream(request).await?;
    let mut response = String::new();
    while let Some(piece) = stream.next().await {
        let piece = piece?;
        tracing::debug!(target: "llm.stream", chunk = %piece);
        response.push_str(&piece);
    }
    Ok(response)
}

/// Generate a full response, retrying transient failures up to `policy.max_attempts`.
///
/// Returns the empty string when every attempt failed or a fatal error occurred.
pub async fn generate_text(
    client: &dyn LlmClient,
    policy: &RetryPolicy,
    request: &GenerateRequest,
) -> String {
    let outcome = retry_bounded(
        policy,
        "llm.generate",
        |_attempt| collect_stream(client, request),
        LlmError::is_retryable,
    )
    .await;

    match outcome {
        Ok(text) => {
            tracing::debug!(model = %request.model, response = %text, "llm.generate.done");
            text
        }
        Err(err) => {
            tracing::warn!(
                model = %request.model,
                attempts = err.attempts(),
                error = %err,
                "llm.generate.gave_up"
            );
            String::new()
        }
    }
}

/// Lowercase and trim a raw model answer.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Whether a normalized label designates an official business.
pub fn is_official(label: &str) -> bool {
    label == OFFICIAL_LABEL
}

/// Outcome of classifying one activity description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityClass {
    /// Normalized model answer; empty when no answer could be obtained.
    pub label: String,
    pub official: bool,
}

impl ActivityClass {
    pub fn from_response(raw: &str) -> Self {
        let label = normalize_label(raw);
        let official = is_official(&label);
        Self { label, official }
    }
}

/// Asks a text-generation model whether a business description is official.
#[derive(Clone)]
pub struct ActivityClassifier {
    llm: Arc<dyn LlmClient>,
    model: String,
    system_prompt: String,
    keep_alive: String,
    temperature: f32,
    policy: RetryPolicy,
}

impl ActivityClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            keep_alive: DEFAULT_KEEP_ALIVE.to_string(),
            temperature: 0.0,
            policy: RetryPolicy::default().with_max_attempts(DEFAULT_ATTEMPTS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = keep_alive.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_for(&self, description: &str) -> GenerateRequest {
        GenerateRequest::new(&self.model, description)
            .with_system(&self.system_prompt)
            .with_temperature(self.temperature)
            .with_keep_alive(&self.keep_alive)
    }

    pub async fn classify(&self, description: &str) -> ActivityClass {
        tracing::info!("Getting activity type for \"{}\"", description);
        let request = self.request_for(description);
        let raw = generate_text(self.llm.as_ref(), &self.policy, &request).await;
        let class = ActivityClass::from_response(&raw);
        if class.label.is_empty() {
            tracing::warn!("Could not get activity type for \"{}\"", description);
        }
        class
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_official_label_counts() {
        assert!(ActivityClass::from_response("  Officiel\n").official);
        assert!(!ActivityClass::from_response("non-officiel").official);
        assert!(!ActivityClass::from_response("officiel.").official);
        assert!(!ActivityClass::from_response("").official);
    }

    #[test]
    fn normalizes_label() {
        assert_eq!(normalize_label("  NON-OFFICIEL \n"), "non-officiel");
    }
}
