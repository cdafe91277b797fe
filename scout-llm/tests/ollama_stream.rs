mod common;

use anyhow::Result;
use futures::StreamExt;
use scout_llm::{GenerateRequest, LlmClient, LlmError, OllamaClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ndjson(lines: &[serde_json::Value]) -> String {
    lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn streams_and_concatenates_chunks() -> Result<()> {
    common::init_test_tracing();
    let server = MockServer::start().await;

    let body = ndjson(&[
        json!({"model": "llama3.2:latest", "response": "Offi", "done": false}),
        json!({"model": "llama3.2:latest", "response": "ciel", "done": false}),
        json!({"model": "llama3.2:latest", "response": "", "done": true, "eval_count": 3}),
    ]);

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3.2:latest",
            "system": "classify",
            "prompt": "Boulangerie artisanale",
            "stream": true,
            "keep_alive": "30m",
            "options": {"temperature": 0.0}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri())?;
    let request = GenerateRequest::new("llama3.2:latest", "Boulangerie artisanale")
        .with_system("classify")
        .with_temperature(0.0)
        .with_keep_alive("30m");

    let pieces: Vec<String> = client
        .generate_stream(&request)
        .await?
        .map(|p| p.expect("piece"))
        .collect()
        .await;

    assert_eq!(pieces, vec!["Offi".to_string(), "ciel".to_string()]);
    Ok(())
}

#[tokio::test]
async fn error_line_mid_stream_surfaces_as_api_error() -> Result<()> {
    common::init_test_tracing();
    let server = MockServer::start().await;

    let body = ndjson(&[
        json!({"response": "off", "done": false}),
        json!({"error": "model runner has unexpectedly stopped"}),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri())?;
    let mut stream = client
        .generate_stream(&GenerateRequest::new("m", "p"))
        .await?;

    assert_eq!(stream.next().await.transpose()?, Some("off".to_string()));
    let err = stream.next().await.expect("error item").unwrap_err();
    assert!(matches!(err, LlmError::Api(_)));
    assert!(err.is_retryable());
    Ok(())
}

#[tokio::test]
async fn missing_model_is_a_fatal_http_error() -> Result<()> {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "model 'nope' not found"})),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri())?;
    let err = match client.generate_stream(&GenerateRequest::new("nope", "p")).await {
        Ok(_) => panic!("expected an error"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("model 'nope' not found"));
    assert!(!err.is_retryable());
    Ok(())
}

#[tokio::test]
async fn ensure_ready_pulls_missing_model() -> Result<()> {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"models": [{"name": "mistral:latest"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .and(body_partial_json(json!({"model": "llama3.2:latest", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri())?;
    client.ensure_ready("llama3.2:latest").await?;
    Ok(())
}

#[tokio::test]
async fn ensure_ready_skips_pull_when_present() -> Result<()> {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"models": [{"name": "llama3.2:latest"}]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri())?;
    client.ensure_ready("llama3.2:latest").await?;
    Ok(())
}

#[tokio::test]
async fn unreachable_server_degrades_instead_of_failing() -> Result<()> {
    common::init_test_tracing();
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let client = OllamaClient::new(&uri)?;

    assert!(!client.prepare("llama3.2:latest").await);

    let request = GenerateRequest::new("llama3.2:latest", "Boulangerie, pâtisserie");
    let text = scout_llm::generate_text(
        &client,
        &scout_common::RetryPolicy::immediate(2),
        &request,
    )
    .await;
    assert_eq!(text, "");
    Ok(())
}
