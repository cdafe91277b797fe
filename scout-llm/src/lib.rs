//! Text-generation integration for Scout.
//!
//! This crate exposes a common [`traits::LlmClient`] interface, the streaming
//! [`ollama::OllamaClient`], and the retry-wrapped classification helpers in
//! [`classify`].
//!
//! # Examples
//! ```no_run
//! use std::sync::Arc;
//! use scout_llm::{classify::ActivityClassifier, ollama::OllamaClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), scout_llm::traits::LlmError> {
//! let client = OllamaClient::new("http://localhost:11434")?;
//! client.ensure_ready("llama3.2:latest").await?;
//! let classifier = ActivityClassifier::new(Arc::new(client));
//! let class = classifier.classify("Exploitation d'une boulangerie").await;
//! println!("{} -> {}", class.label, class.official);
//! # Ok(())
//! # }
//! ```
pub mod classify;
pub mod ollama;
pub mod traits;

pub use classify::{generate_text, ActivityClass, ActivityClassifier};
pub use ollama::OllamaClient;
pub use traits::{GenerateRequest, LlmClient, LlmError, TextStream};
