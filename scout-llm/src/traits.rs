use async_trait::async_trait;
use futures::stream::BoxStream;
use scout_http::HttpError;
use serde::{Deserialize, Serialize};

/// Incremental text produced by a generation call.
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;

/// One generation call: which model, which instruction, which input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    #[serde(default)]
    pub system: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// How long the server keeps the model loaded after the call (e.g. `"30m"`).
    #[serde(default)]
    pub keep_alive: Option<String>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            temperature: None,
            keep_alive: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Transport hiccups, interrupted streams and 429/5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_transient(),
            Self::Stream(_) | Self::Api(_) => true,
            Self::ModelNotAvailable(_) | Self::Config(_) => false,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Start a generation and stream the response pieces as they arrive.
    async fn generate_stream(&self, request: &GenerateRequest) -> Result<TextStream, LlmError>;
}
