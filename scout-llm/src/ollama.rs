use crate::traits::{GenerateRequest, LlmClient, LlmError, TextStream};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use scout_http::{HttpClient, RequestOpts};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

const PULL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Ollama client for local or remote model inference.
///
/// Expects a running Ollama server (see https://github.com/ollama/ollama).
#[derive(Clone)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
}

/// One NDJSON line of `/api/generate` with `stream: true`.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaClient {
    /// Create a client for the server at `base_url`. No request is made yet.
    pub fn new(base_url: &str) -> Result<Self, LlmError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(LlmError::Config("Ollama endpoint is empty".into()));
        }
        let http = HttpClient::new(&base_url)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Verify the server is reachable and `model` is present, pulling it if not.
    pub async fn ensure_ready(&self, model: &str) -> Result<(), LlmError> {
        let models = self.fetch_available_models().await?;

        if !models.iter().any(|m| m == model) {
            tracing::info!("Model {} not found locally, pulling...", model);
            self.pull_model(model).await?;
        }

        Ok(())
    }

    /// [`ensure_ready`](Self::ensure_ready) that only warns on failure.
    ///
    /// Returns whether the model is known to be available. A `false` here
    /// leaves later generations to fail and degrade on their own.
    pub async fn prepare(&self, model: &str) -> bool {
        match self.ensure_ready(model).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    endpoint = %self.base_url,
                    model,
                    error = %err,
                    "Ollama not ready, activity types will be empty if it stays unreachable"
                );
                false
            }
        }
    }

    async fn fetch_available_models(&self) -> Result<Vec<String>, LlmError> {
        let val: JsonValue = self
            .http
            .get_json(
                "api/tags",
                RequestOpts {
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e {
                scout_http::HttpError::Network(_) => {
                    LlmError::Config(OLLAMA_CONNECTION_ERROR.to_string())
                }
                other => LlmError::Http(other),
            })?;

        let models = val
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.get("name").and_then(|n| n.as_str()))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    async fn pull_model(&self, model: &str) -> Result<(), LlmError> {
        let payload = json!({
            "model": model,
            "stream": false
        });

        let val: JsonValue = self
            .http
            .post_json_opts(
                "api/pull",
                &payload,
                RequestOpts {
                    timeout: Some(PULL_TIMEOUT),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| LlmError::ModelNotAvailable(format!("{model}: {e}")))?;

        match val.get("status").and_then(|s| s.as_str()) {
            Some("success") => {
                tracing::info!("Successfully pulled model: {}", model);
                Ok(())
            }
            other => Err(LlmError::ModelNotAvailable(format!(
                "{model}: unexpected pull status {other:?}"
            ))),
        }
    }
}

/// Decode one NDJSON line into the text it carries, if any.
fn parse_line(line: &[u8]) -> Result<Option<String>, LlmError> {
    let trimmed = String::from_utf8_lossy(line);
    let trimmed = trimmed.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let chunk: GenerateChunk = serde_json::from_str(trimmed)
        .map_err(|e| LlmError::Stream(format!("bad chunk: {e}")))?;
    if let Some(err) = chunk.error {
        return Err(LlmError::Api(err));
    }
    if chunk.done && chunk.response.is_empty() {
        return Ok(None);
    }
    Ok(Some(chunk.response))
}

/// Split a streamed NDJSON body into the text pieces it carries.
fn ndjson_pieces(
    resp: reqwest::Response,
) -> impl Stream<Item = Result<String, LlmError>> + Send + 'static {
    try_stream! {
        let mut body = resp.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| LlmError::Stream(e.to_string()))?;
            buf.extend_from_slice(&chunk);

            while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                if let Some(piece) = parse_line(&line)? {
                    yield piece;
                }
            }
        }

        if let Some(piece) = parse_line(&buf)? {
            yield piece;
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate_stream(&self, request: &GenerateRequest) -> Result<TextStream, LlmError> {
        let mut options = serde_json::Map::new();
        if let Some(temp) = request.temperature {
            options.insert("temperature".to_string(), json!(temp));
        }

        let mut payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": true,
            "options": options
        });
        if let Some(system) = &request.system {
            payload["system"] = json!(system);
        }
        if let Some(keep_alive) = &request.keep_alive {
            payload["keep_alive"] = json!(keep_alive);
        }

        let resp = self
            .http
            .post_json_stream("api/generate", &payload, RequestOpts::default())
            .await?;

        Ok(Box::pin(ndjson_pieces(resp)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_regular_and_final_lines() {
        let piece = parse_line(br#"{"model":"m","response":"offi","done":false}"#).unwrap();
        assert_eq!(piece.as_deref(), Some("offi"));

        let done = parse_line(br#"{"model":"m","response":"","done":true}"#).unwrap();
        assert_eq!(done, None);

        assert_eq!(parse_line(b"   \n").unwrap(), None);
    }

    #[test]
    fn error_lines_become_api_errors() {
        let err = parse_line(br#"{"error":"model runner crashed"}"#).unwrap_err();
        assert!(matches!(err, LlmError::Api(ref m) if m == "model runner crashed"));
    }

    #[test]
    fn empty_endpoint_is_a_config_error() {
        assert!(matches!(
            OllamaClient::new("  "),
            Err(LlmError::Config(_))
        ));
    }
}
